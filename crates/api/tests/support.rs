//! Shared test support for HTTP surface tests
//!
//! Builds a router over in-memory ports plus a real (temporary) ledger
//! database manager for the health probe.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use careslot_app::{router, AppContext};
use careslot_core::{
    AppointmentRepository, BookingService, CalendarPort, IdentityVerifier, RelabelOutbox,
    UpdateGuard,
};
use careslot_domain::{
    Appointment, AppointmentParams, AppointmentStatus, CareslotError, Config, RelabelRecord,
    Result as DomainResult, Slot, SlotTime, TimeWindow,
};
use careslot_infra::database::DbManager;
use chrono::{Duration, Utc};
use tempfile::TempDir;

/// In-memory calendar seeded per test.
#[derive(Default, Clone)]
pub struct MockCalendar {
    slots: Arc<Mutex<BTreeMap<String, Slot>>>,
}

impl MockCalendar {
    pub fn with_slot(self, slot: Slot) -> Self {
        self.slots.lock().unwrap().insert(slot.id.clone(), slot);
        self
    }

    pub fn slot(&self, id: &str) -> Option<Slot> {
        self.slots.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl CalendarPort for MockCalendar {
    async fn list_slots(&self, _window: TimeWindow) -> DomainResult<Vec<Slot>> {
        let mut slots: Vec<Slot> = self.slots.lock().unwrap().values().cloned().collect();
        slots.sort_by_key(|slot| slot.start.epoch_seconds());
        Ok(slots)
    }

    async fn get_slot(&self, slot_id: &str) -> DomainResult<Slot> {
        self.slots
            .lock()
            .unwrap()
            .get(slot_id)
            .cloned()
            .ok_or_else(|| CareslotError::NotFound(format!("slot not found: {slot_id}")))
    }

    async fn update_slot(&self, slot: &Slot, _guard: UpdateGuard) -> DomainResult<Slot> {
        self.slots.lock().unwrap().insert(slot.id.clone(), slot.clone());
        Ok(slot.clone())
    }
}

/// In-memory ledger enforcing the BOOKED uniqueness invariant.
#[derive(Default, Clone)]
pub struct MockLedger {
    rows: Arc<Mutex<Vec<Appointment>>>,
}

impl MockLedger {
    pub fn rows(&self) -> Vec<Appointment> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppointmentRepository for MockLedger {
    async fn insert_booked(&self, params: AppointmentParams) -> DomainResult<Appointment> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|row| {
            row.status == AppointmentStatus::Booked
                && row.slot_ref.as_deref() == Some(params.slot_ref.as_str())
        }) {
            return Err(CareslotError::Conflict("unique constraint violation".to_string()));
        }

        let row = Appointment {
            id: rows.len() as i64 + 1,
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

/// In-memory outbox; the HTTP tests only ever assert it stays empty.
#[derive(Default, Clone)]
pub struct MockOutbox {
    records: Arc<Mutex<Vec<RelabelRecord>>>,
}

#[async_trait]
impl RelabelOutbox for MockOutbox {
    async fn enqueue(&self, record: &RelabelRecord) -> DomainResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn due_batch(&self, _now: i64, _limit: usize) -> DomainResult<Vec<RelabelRecord>> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn mark_done(&self, _id: &str) -> DomainResult<()> {
        Ok(())
    }

    async fn mark_failed(&self, _id: &str, _error: &str, _next: i64) -> DomainResult<()> {
        Ok(())
    }

    async fn mark_abandoned(&self, _id: &str, _error: &str) -> DomainResult<()> {
        Ok(())
    }
}

/// Identity verifier with a fixed token → patient mapping.
pub struct StaticIdentityVerifier;

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, credential: &str) -> DomainResult<String> {
        match credential {
            "token-alice" => Ok("patient-alice".to_string()),
            "token-bob" => Ok("patient-bob".to_string()),
            _ => Err(CareslotError::Unauthenticated("unknown credential".to_string())),
        }
    }
}

/// A router wired over mock ports, plus handles for assertions.
pub struct TestApp {
    pub router: Router,
    pub calendar: MockCalendar,
    pub ledger: MockLedger,
    _temp: TempDir,
}

pub fn test_app(calendar: MockCalendar) -> TestApp {
    let temp = TempDir::new().unwrap();
    let db = Arc::new(DbManager::new(temp.path().join("ledger.db"), 2).unwrap());
    db.run_migrations().unwrap();

    let ledger = MockLedger::default();
    let outbox = MockOutbox::default();

    let booking = Arc::new(BookingService::new(
        Arc::new(calendar.clone()),
        Arc::new(ledger.clone()),
        Arc::new(outbox.clone()),
    ));

    let ctx = Arc::new(AppContext::from_parts(
        Config::default(),
        db,
        booking,
        Arc::new(StaticIdentityVerifier),
        Arc::new(calendar.clone()),
        Arc::new(outbox),
    ));

    TestApp { router: router(ctx), calendar, ledger, _temp: temp }
}

/// Build a timed slot starting `hours_from_now` and lasting 30 minutes.
pub fn timed_slot(id: &str, summary: &str, hours_from_now: i64) -> Slot {
    let start = Utc::now() + Duration::hours(hours_from_now);
    let end = start + Duration::minutes(30);
    Slot {
        id: id.to_string(),
        summary: summary.to_string(),
        start: SlotTime::Timed(start),
        end: SlotTime::Timed(end),
        etag: Some("\"1\"".to_string()),
        payload: serde_json::json!({ "id": id, "summary": summary }),
    }
}
