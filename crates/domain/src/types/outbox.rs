//! Relabel outbox types
//!
//! When a booking mutates the calendar but the ledger write then fails, the
//! calendar is left relabeled with no corresponding row. The service records
//! a compensating relabel here; a background reconciler retries it until the
//! calendar matches the ledger again.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pending compensating relabel against a calendar slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelabelRecord {
    pub id: String,
    pub slot_ref: String,
    /// Summary the slot should be reset to.
    pub target_summary: String,
    pub attempts: i64,
    pub next_attempt_at: i64,
    pub last_error: Option<String>,
    pub created_at: i64,
}

impl RelabelRecord {
    /// New record due immediately.
    pub fn new(slot_ref: impl Into<String>, target_summary: impl Into<String>) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: Uuid::now_v7().to_string(),
            slot_ref: slot_ref.into(),
            target_summary: target_summary.into(),
            attempts: 0,
            next_attempt_at: now,
            last_error: None,
            created_at: now,
        }
    }
}
