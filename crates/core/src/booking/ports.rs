//! Port interfaces for appointment booking
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use careslot_domain::{Appointment, AppointmentParams, RelabelRecord, Result, Slot, TimeWindow};

/// Guard applied to a slot update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateGuard {
    /// Apply only if the slot is unchanged since it was fetched (the slot's
    /// concurrency token must still match). A stale token is a `Conflict`.
    IfUnchanged,
    /// Apply regardless of intervening changes.
    Unconditional,
}

/// Trait for the remote calendar holding bookable slots
#[async_trait]
pub trait CalendarPort: Send + Sync {
    /// List slots overlapping the window, ordered by start time ascending,
    /// with recurring instances already expanded.
    async fn list_slots(&self, window: TimeWindow) -> Result<Vec<Slot>>;

    /// Fetch a single slot by id. Fails with `NotFound` when absent.
    async fn get_slot(&self, slot_id: &str) -> Result<Slot>;

    /// Overwrite the slot's full remote representation.
    async fn update_slot(&self, slot: &Slot, guard: UpdateGuard) -> Result<Slot>;
}

/// Trait for persisting booking ledger rows
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Insert a new BOOKED row. A second BOOKED row for the same slot
    /// reference violates the ledger uniqueness invariant and fails with
    /// `Conflict`.
    async fn insert_booked(&self, params: AppointmentParams) -> Result<Appointment>;

    /// All BOOKED rows for the patient, ordered by start time ascending.
    async fn find_booked_for_patient(&self, patient_ref: &str) -> Result<Vec<Appointment>>;

    /// Transition every (slot, patient, BOOKED) row to CANCELLED, returning
    /// how many rows changed. Zero is not an error.
    async fn cancel_booked(&self, slot_ref: &str, patient_ref: &str) -> Result<usize>;
}

/// Trait for the compensating-relabel outbox
#[async_trait]
pub trait RelabelOutbox: Send + Sync {
    /// Record a compensating relabel for asynchronous reconciliation.
    async fn enqueue(&self, record: &RelabelRecord) -> Result<()>;

    /// Records due at `now`, oldest first.
    async fn due_batch(&self, now: i64, limit: usize) -> Result<Vec<RelabelRecord>>;

    /// Mark a record applied.
    async fn mark_done(&self, id: &str) -> Result<()>;

    /// Record a failed attempt and reschedule.
    async fn mark_failed(&self, id: &str, error: &str, next_attempt_at: i64) -> Result<()>;

    /// Give up on a record permanently.
    async fn mark_abandoned(&self, id: &str, error: &str) -> Result<()>;
}

/// Trait for authenticating callers from an opaque credential
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Resolve a credential to a patient identifier, or fail with
    /// `Unauthenticated`.
    async fn verify(&self, credential: &str) -> Result<String>;
}
