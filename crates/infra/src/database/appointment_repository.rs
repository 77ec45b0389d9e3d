//! SQLite-backed implementation of the AppointmentRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use careslot_core::AppointmentRepository;
use careslot_domain::{
    Appointment, AppointmentParams, AppointmentStatus, CareslotError, Result as DomainResult,
};
use chrono::Utc;
use rusqlite::{params, Row};
use tokio::task;
use tracing::{debug, instrument};

use super::manager::{DbManager, LedgerConnection};
use crate::errors::InfraError;

const APPOINTMENT_COLUMNS: &str = "id, start_ts, end_ts, status, slot_ref, patient_ref, created_at";

/// SQLite implementation of AppointmentRepository
pub struct SqliteAppointmentRepository {
    db: Arc<DbManager>,
}

impl SqliteAppointmentRepository {
    /// Create a new appointment repository
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn insert_row(conn: &LedgerConnection, params: &AppointmentParams) -> DomainResult<Appointment> {
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO appointments (start_ts, end_ts, status, slot_ref, patient_ref, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                params.start_ts,
                params.end_ts,
                AppointmentStatus::Booked.to_string(),
                params.slot_ref,
                params.patient_ref,
                now,
            ],
        )
        .map_err(InfraError::from)?;

        let id = conn.last_insert_rowid();

        let row = conn
            .query_row(
                &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
                params![id],
                map_appointment_row,
            )
            .map_err(InfraError::from)?;

        Ok(row)
    }

    fn booked_for_patient(
        conn: &LedgerConnection,
        patient_ref: &str,
    ) -> DomainResult<Vec<Appointment>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments
                 WHERE patient_ref = ?1 AND status = ?2
                 ORDER BY start_ts ASC"
            ))
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(
                params![patient_ref, AppointmentStatus::Booked.to_string()],
                map_appointment_row,
            )
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        Ok(rows)
    }

    fn cancel_rows(
        conn: &LedgerConnection,
        slot_ref: &str,
        patient_ref: &str,
    ) -> DomainResult<usize> {
        let changed = conn
            .execute(
                "UPDATE appointments SET status = ?1
                 WHERE slot_ref = ?2 AND patient_ref = ?3 AND status = ?4",
                params![
                    AppointmentStatus::Cancelled.to_string(),
                    slot_ref,
                    patient_ref,
                    AppointmentStatus::Booked.to_string(),
                ],
            )
            .map_err(InfraError::from)?;

        Ok(changed)
    }
}

#[async_trait]
impl AppointmentRepository for SqliteAppointmentRepository {
    #[instrument(skip(self, params), fields(slot_ref = %params.slot_ref))]
    async fn insert_booked(&self, params: AppointmentParams) -> DomainResult<Appointment> {
        let db = Arc::clone(&self.db);

        let row = task::spawn_blocking(move || -> DomainResult<Appointment> {
            let conn = db.get_connection()?;
            Self::insert_row(&conn, &params)
        })
        .await
        .map_err(map_join_error)??;

        debug!(appointment_id = row.id, "inserted booked appointment");

        Ok(row)
    }

    #[instrument(skip(self))]
    async fn find_booked_for_patient(&self, patient_ref: &str) -> DomainResult<Vec<Appointment>> {
        let db = Arc::clone(&self.db);
        let patient_ref = patient_ref.to_string();

        let rows = task::spawn_blocking(move || -> DomainResult<Vec<Appointment>> {
            let conn = db.get_connection()?;
            Self::booked_for_patient(&conn, &patient_ref)
        })
        .await
        .map_err(map_join_error)??;

        debug!(count = rows.len(), "retrieved booked appointments");

        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn cancel_booked(&self, slot_ref: &str, patient_ref: &str) -> DomainResult<usize> {
        let db = Arc::clone(&self.db);
        let slot_ref = slot_ref.to_string();
        let patient_ref = patient_ref.to_string();

        let cancelled = task::spawn_blocking(move || -> DomainResult<usize> {
            let conn = db.get_connection()?;
            Self::cancel_rows(&conn, &slot_ref, &patient_ref)
        })
        .await
        .map_err(map_join_error)??;

        debug!(cancelled, "cancelled booked appointments");

        Ok(cancelled)
    }
}

fn map_appointment_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    let status_raw: String = row.get(3)?;
    let status = status_raw.parse::<AppointmentStatus>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(err))
    })?;

    Ok(Appointment {
        id: row.get(0)?,
        start_ts: row.get(1)?,
        end_ts: row.get(2)?,
        status,
        slot_ref: row.get(4)?,
        patient_ref: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_join_error(err: task::JoinError) -> CareslotError {
    CareslotError::Internal(format!("database task join error: {err}"))
}
