//! SQLite-backed implementation of the relabel outbox port.
//!
//! Rows move through `pending` → `done`, with `abandoned` as the terminal
//! state for records the reconciler has given up on. Only pending rows ever
//! cross the port boundary.

use std::sync::Arc;

use async_trait::async_trait;
use careslot_core::RelabelOutbox;
use careslot_domain::{CareslotError, RelabelRecord, Result as DomainResult};
use rusqlite::{params, Row};
use tokio::task;
use tracing::{debug, instrument};

use super::manager::{DbManager, LedgerConnection};
use crate::errors::InfraError;

const STATUS_PENDING: &str = "pending";
const STATUS_DONE: &str = "done";
const STATUS_ABANDONED: &str = "abandoned";

/// SQLite implementation of the relabel outbox
pub struct SqliteRelabelOutbox {
    db: Arc<DbManager>,
}

impl SqliteRelabelOutbox {
    /// Create a new relabel outbox repository
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn insert_record(conn: &LedgerConnection, record: &RelabelRecord) -> DomainResult<()> {
        conn.execute(
            "INSERT INTO relabel_outbox (
                id, slot_ref, target_summary, status, attempts,
                next_attempt_at, last_error, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id,
                record.slot_ref,
                record.target_summary,
                STATUS_PENDING,
                record.attempts,
                record.next_attempt_at,
                record.last_error,
                record.created_at,
            ],
        )
        .map_err(InfraError::from)?;

        Ok(())
    }

    fn fetch_due(
        conn: &LedgerConnection,
        now: i64,
        limit: usize,
    ) -> DomainResult<Vec<RelabelRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = conn
            .prepare(
                "SELECT id, slot_ref, target_summary, attempts, next_attempt_at,
                        last_error, created_at
                 FROM relabel_outbox
                 WHERE status = ?1 AND next_attempt_at <= ?2
                 ORDER BY created_at ASC
                 LIMIT ?3",
            )
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(params![STATUS_PENDING, now, limit as i64], map_relabel_row)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        Ok(rows)
    }
}

#[async_trait]
impl RelabelOutbox for SqliteRelabelOutbox {
    #[instrument(skip(self, record), fields(slot_ref = %record.slot_ref))]
    async fn enqueue(&self, record: &RelabelRecord) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let to_insert = record.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            Self::insert_record(&conn, &to_insert)
        })
        .await
        .map_err(map_join_error)??;

        debug!("enqueued compensating relabel");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn due_batch(&self, now: i64, limit: usize) -> DomainResult<Vec<RelabelRecord>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<RelabelRecord>> {
            let conn = db.get_connection()?;
            Self::fetch_due(&conn, now, limit)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn mark_done(&self, id: &str) -> DomainResult<()> {
        self.set_status(id, STATUS_DONE, None, None).await
    }

    #[instrument(skip(self, error))]
    async fn mark_failed(&self, id: &str, error: &str, next_attempt_at: i64) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let error = error.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE relabel_outbox
                 SET attempts = attempts + 1, last_error = ?1, next_attempt_at = ?2
                 WHERE id = ?3",
                params![error, next_attempt_at, id],
            )
            .map_err(InfraError::from)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self, error))]
    async fn mark_abandoned(&self, id: &str, error: &str) -> DomainResult<()> {
        self.set_status(id, STATUS_ABANDONED, Some(error.to_string()), None).await
    }
}

impl SqliteRelabelOutbox {
    async fn set_status(
        &self,
        id: &str,
        status: &'static str,
        last_error: Option<String>,
        next_attempt_at: Option<i64>,
    ) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE relabel_outbox
                 SET status = ?1,
                     last_error = COALESCE(?2, last_error),
                     next_attempt_at = COALESCE(?3, next_attempt_at)
                 WHERE id = ?4",
                params![status, last_error, next_attempt_at, id],
            )
            .map_err(InfraError::from)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_relabel_row(row: &Row<'_>) -> rusqlite::Result<RelabelRecord> {
    Ok(RelabelRecord {
        id: row.get(0)?,
        slot_ref: row.get(1)?,
        target_summary: row.get(2)?,
        attempts: row.get(3)?,
        next_attempt_at: row.get(4)?,
        last_error: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_join_error(err: task::JoinError) -> CareslotError {
    CareslotError::Internal(format!("database task join error: {err}"))
}
