//! Domain model types
//!
//! These types represent the two systems of record: remote calendar slots
//! and local ledger appointments, plus the relabel outbox used to reconcile
//! them after partial failures.

pub mod appointment;
pub mod outbox;
pub mod slot;

pub use appointment::{Appointment, AppointmentParams, AppointmentStatus};
pub use outbox::RelabelRecord;
pub use slot::{Slot, SlotTime, TimeWindow};
