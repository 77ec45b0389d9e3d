//! Appointment lifecycle synchronizer - core business logic
//!
//! Owns the protocol for listing, booking, and cancelling slots across two
//! systems of record (remote calendar, local ledger) and the invariants
//! keeping them consistent. The calendar is mutated through conditional
//! updates so concurrent bookings of the same slot serialize; the ledger
//! enforces at most one BOOKED row per slot; a failed ledger write after a
//! calendar mutation leaves a compensating relabel in the outbox.

use std::sync::Arc;

use careslot_domain::constants::DEFAULT_LOOKAHEAD_DAYS;
use careslot_domain::utils::availability;
use careslot_domain::{
    Appointment, AppointmentParams, CareslotError, RelabelRecord, Result, Slot, TimeWindow,
};
use tracing::{debug, error, info, warn};

use super::ports::{AppointmentRepository, CalendarPort, RelabelOutbox, UpdateGuard};

/// Appointment lifecycle synchronizer
pub struct BookingService {
    calendar: Arc<dyn CalendarPort>,
    ledger: Arc<dyn AppointmentRepository>,
    outbox: Arc<dyn RelabelOutbox>,
    lookahead_days: i64,
}

impl BookingService {
    /// Create a new booking service
    pub fn new(
        calendar: Arc<dyn CalendarPort>,
        ledger: Arc<dyn AppointmentRepository>,
        outbox: Arc<dyn RelabelOutbox>,
    ) -> Self {
        Self { calendar, ledger, outbox, lookahead_days: DEFAULT_LOOKAHEAD_DAYS }
    }

    /// Override the listing window length.
    pub fn with_lookahead_days(mut self, days: i64) -> Self {
        self.lookahead_days = days.max(1);
        self
    }

    /// List bookable slots in the configured window.
    ///
    /// Queries the calendar for `[now, now + lookahead)` and keeps the slots
    /// whose summary carries the availability token. Order is the calendar's
    /// (start time ascending). No side effects.
    pub async fn list_available(&self) -> Result<Vec<Slot>> {
        let window = TimeWindow::next_days(self.lookahead_days);
        let slots = self.calendar.list_slots(window).await?;

        let available: Vec<Slot> =
            slots.into_iter().filter(|slot| availability::is_available(&slot.summary)).collect();

        debug!(count = available.len(), lookahead_days = self.lookahead_days, "listed open slots");

        Ok(available)
    }

    /// Book a slot for a patient.
    ///
    /// The relabel is conditional on the slot being unchanged since it was
    /// fetched, so of two concurrent bookings one observes `Conflict`. The
    /// ledger insert runs after the calendar accepts the relabel; if it
    /// fails for anything other than the uniqueness invariant, the calendar
    /// mutation is queued for compensation before the error surfaces.
    pub async fn book(&self, slot_id: &str, patient_ref: &str) -> Result<Appointment> {
        let slot = self.calendar.get_slot(slot_id).await?;

        if !availability::is_available(&slot.summary) {
            return Err(CareslotError::Conflict("slot no longer available".to_string()));
        }

        let relabeled = slot.with_summary(availability::booked_summary());
        self.calendar.update_slot(&relabeled, UpdateGuard::IfUnchanged).await?;

        let params = AppointmentParams {
            slot_ref: slot.id.clone(),
            patient_ref: patient_ref.to_string(),
            start_ts: slot.start.epoch_seconds(),
            end_ts: slot.end.epoch_seconds(),
        };

        match self.ledger.insert_booked(params).await {
            Ok(appointment) => {
                info!(slot_id = %slot.id, appointment_id = appointment.id, "slot booked");
                Ok(appointment)
            }
            Err(err @ CareslotError::Conflict(_)) => {
                // Another BOOKED row already references this slot; the
                // calendar label agrees with it, so nothing to compensate.
                warn!(slot_id = %slot.id, "duplicate booking rejected by ledger");
                Err(err)
            }
            Err(err) => {
                error!(slot_id = %slot.id, error = %err, "ledger write failed after relabel");
                self.compensate_relabel(&slot.id).await;
                Err(err)
            }
        }
    }

    /// Cancel a patient's booking of a slot.
    ///
    /// The ledger transition runs first; the calendar is only relabeled
    /// AVAILABLE when the caller actually held a booking, so a cancel
    /// against a foreign or never-booked slot cannot free it. Zero matching
    /// rows is a no-op reported as success.
    pub async fn cancel(&self, slot_id: &str, patient_ref: &str) -> Result<()> {
        let slot = self.calendar.get_slot(slot_id).await?;

        let cancelled = self.ledger.cancel_booked(&slot.id, patient_ref).await?;
        if cancelled == 0 {
            warn!(slot_id = %slot.id, "cancel matched no booked rows; calendar left untouched");
            return Ok(());
        }

        let relabeled = slot.with_summary(availability::available_summary());
        if let Err(err) = self.calendar.update_slot(&relabeled, UpdateGuard::Unconditional).await {
            error!(slot_id = %slot.id, error = %err, "relabel failed after cancellation");
            self.compensate_relabel(&slot.id).await;
            return Err(err);
        }

        info!(slot_id = %slot.id, cancelled, "booking cancelled");

        Ok(())
    }

    /// All of the patient's BOOKED appointments, start time ascending.
    pub async fn list_mine(&self, patient_ref: &str) -> Result<Vec<Appointment>> {
        self.ledger.find_booked_for_patient(patient_ref).await
    }

    /// Queue a relabel back to AVAILABLE for asynchronous reconciliation.
    ///
    /// Enqueue failures are logged, not propagated: the caller is already
    /// surfacing the original error.
    async fn compensate_relabel(&self, slot_ref: &str) {
        let record = RelabelRecord::new(slot_ref, availability::available_summary());
        if let Err(err) = self.outbox.enqueue(&record).await {
            error!(slot_ref, error = %err, "failed to enqueue compensating relabel");
        }
    }
}
