//! In-memory mock for `CalendarPort`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use careslot_core::{CalendarPort, UpdateGuard};
use careslot_domain::{CareslotError, Result as DomainResult, Slot, TimeWindow};

/// In-memory calendar with etag-versioned slots.
///
/// `update_slot` honours the conditional guard the way a real calendar
/// backend would: a stale etag under `IfUnchanged` is rejected, and every
/// accepted write bumps the stored etag.
#[derive(Default, Clone)]
pub struct MockCalendar {
    slots: Arc<Mutex<BTreeMap<String, Slot>>>,
    fail_updates: Arc<AtomicBool>,
}

impl MockCalendar {
    /// Create an empty mock calendar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience helper for seeding a slot.
    pub fn with_slot(self, slot: Slot) -> Self {
        self.slots.lock().unwrap().insert(slot.id.clone(), slot);
        self
    }

    /// Current state of a slot, for assertions.
    pub fn slot(&self, id: &str) -> Option<Slot> {
        self.slots.lock().unwrap().get(id).cloned()
    }

    /// Make every subsequent update fail as upstream-unavailable.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Bump a slot's etag without changing its content, simulating a
    /// concurrent writer between a caller's fetch and update.
    pub fn touch(&self, id: &str) {
        let mut slots = self.slots.lock().unwrap();
        if let Some(slot) = slots.get_mut(id) {
            slot.etag = Some(next_etag(slot.etag.as_deref()));
        }
    }
}

#[async_trait]
impl CalendarPort for MockCalendar {
    async fn list_slots(&self, window: TimeWindow) -> DomainResult<Vec<Slot>> {
        let start_ts = window.start.timestamp();
        let end_ts = window.end.timestamp();

        let mut slots: Vec<Slot> = self
            .slots
            .lock()
            .unwrap()
            .values()
            .filter(|slot| {
                let ts = slot.start.epoch_seconds();
                ts >= start_ts && ts < end_ts
            })
            .cloned()
            .collect();
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

    async fn update_slot(&self, slot: &Slot, guard: UpdateGuard) -> DomainResult<Slot> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(CareslotError::Upstream("calendar unreachable (simulated)".to_string()));
        }

        let mut slots = self.slots.lock().unwrap();
        let stored = slots
            .get(&slot.id)
            .ok_or_else(|| CareslotError::NotFound(format!("slot not found: {}", slot.id)))?;

        if guard == UpdateGuard::IfUnchanged && stored.etag != slot.etag {
            return Err(CareslotError::Conflict("slot changed upstream".to_string()));
        }

        let mut updated = slot.clone();
        updated.etag = Some(next_etag(stored.etag.as_deref()));
        slots.insert(updated.id.clone(), updated.clone());

        Ok(updated)
    }
}

fn next_etag(current: Option<&str>) -> String {
    let version = current
        .map(|etag| etag.trim_matches('"'))
        .and_then(|etag| etag.parse::<u64>().ok())
        .unwrap_or(0);
    format!("\"{}\"", version + 1)
}
