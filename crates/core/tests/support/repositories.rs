//! In-memory mocks for the ledger and outbox ports.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use careslot_core::{AppointmentRepository, RelabelOutbox};
use careslot_domain::{
    Appointment, AppointmentParams, AppointmentStatus, CareslotError, RelabelRecord,
    Result as DomainResult,
};
use chrono::Utc;

/// In-memory mock for `AppointmentRepository`.
///
/// Enforces the same uniqueness invariant the real ledger carries: at most
/// one BOOKED row per slot reference.
#[derive(Default, Clone)]
pub struct MockAppointmentRepository {
    rows: Arc<Mutex<Vec<Appointment>>>,
    next_id: Arc<AtomicI64>,
    fail_inserts: Arc<AtomicBool>,
}

impl MockAppointmentRepository {
    /// Create an empty mock ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing row.
    pub fn with_row(self, row: Appointment) -> Self {
        self.next_id.fetch_max(row.id, Ordering::SeqCst);
        self.rows.lock().unwrap().push(row);
        self
    }

    /// Make every subsequent insert fail as a database error.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of all rows, for assertions.
    pub fn rows(&self) -> Vec<Appointment> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppointmentRepository for MockAppointmentRepository {
    async fn insert_booked(&self, params: AppointmentParams) -> DomainResult<Appointment> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(CareslotError::Database("ledger unavailable (simulated)".to_string()));
        }

        let mut rows = self.rows.lock().unwrap();
        let duplicate = rows.iter().any(|row| {
            row.status == AppointmentStatus::Booked
                && row.slot_ref.as_deref() == Some(params.slot_ref.as_str())
        });
        if duplicate {
            return Err(CareslotError::Conflict("unique constraint violation".to_string()));
        }

        let row = Appointment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            start_ts: params.start_ts,
            end_ts: params.end_ts,
            status: AppointmentStatus::Booked,
            slot_ref: Some(params.slot_ref),
            patient_ref: Some(params.patient_ref),
            created_at: Utc::now().timestamp(),
        };
        rows.push(row.clone());

        Ok(row)
    }

    async fn find_booked_for_patient(&self, patient_ref: &str) -> DomainResult<Vec<Appointment>> {
        let mut rows: Vec<Appointment> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| {
                row.status == AppointmentStatus::Booked
                    && row.patient_ref.as_deref() == Some(patient_ref)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.start_ts);

        Ok(rows)
    }

    async fn cancel_booked(&self, slot_ref: &str, patient_ref: &str) -> DomainResult<usize> {
        let mut cancelled = 0;
        for row in self.rows.lock().unwrap().iter_mut() {
            if row.status == AppointmentStatus::Booked
                && row.slot_ref.as_deref() == Some(slot_ref)
                && row.patient_ref.as_deref() == Some(patient_ref)
            {
                row.status = AppointmentStatus::Cancelled;
                cancelled += 1;
            }
        }

        Ok(cancelled)
    }
}

/// In-memory mock for `RelabelOutbox`.
#[derive(Default, Clone)]
pub struct MockRelabelOutbox {
    records: Arc<Mutex<Vec<RelabelRecord>>>,
}

impl MockRelabelOutbox {
    /// Create an empty mock outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of enqueued records, for assertions.
    pub fn records(&self) -> Vec<RelabelRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelabelOutbox for MockRelabelOutbox {
    async fn enqueue(&self, record: &RelabelRecord) -> DomainResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn due_batch(&self, now: i64, limit: usize) -> DomainResult<Vec<RelabelRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.next_attempt_at <= now)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_done(&self, id: &str) -> DomainResult<()> {
        self.records.lock().unwrap().retain(|record| record.id != id);
        Ok(())
    }

    async fn mark_failed(&self, id: &str, error: &str, next_attempt_at: i64) -> DomainResult<()> {
        for record in self.records.lock().unwrap().iter_mut() {
            if record.id == id {
                record.attempts += 1;
                record.last_error = Some(error.to_string());
                record.next_attempt_at = next_attempt_at;
            }
        }
        Ok(())
    }

    async fn mark_abandoned(&self, id: &str, _error: &str) -> DomainResult<()> {
        self.records.lock().unwrap().retain(|record| record.id != id);
        Ok(())
    }
}
