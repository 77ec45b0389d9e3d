//! Calendar slot types
//!
//! A slot is a remote calendar event used as the unit of availability. The
//! calendar owns slots; this system only reads and relabels them, so a slot
//! carries the full remote representation (`payload`) to round-trip every
//! field it does not touch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A slot boundary: either a precise instant or an all-day date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotTime {
    /// Timed boundary (`dateTime` in the calendar representation).
    Timed(DateTime<Utc>),
    /// All-day boundary (`date` in the calendar representation).
    AllDay(NaiveDate),
}

impl SlotTime {
    /// Epoch seconds for the boundary; all-day dates resolve to UTC midnight.
    pub fn epoch_seconds(&self) -> i64 {
        match self {
            Self::Timed(dt) => dt.timestamp(),
            Self::AllDay(date) => {
                date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()).unwrap_or_default()
            }
        }
    }

    /// Whether the boundary is date-only.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }
}

/// Remote calendar event used as the unit of availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Opaque identifier assigned by the calendar.
    pub id: String,
    /// Free-text label carrying the availability sentinel.
    pub summary: String,
    pub start: SlotTime,
    pub end: SlotTime,
    /// Optimistic-concurrency token from the calendar, when provided.
    pub etag: Option<String>,
    /// Full remote representation. Relabel updates overwrite `summary` in
    /// this payload and send it back whole, leaving every other field as the
    /// calendar returned it.
    pub payload: serde_json::Value,
}

impl Slot {
    /// Copy of the slot with a replaced summary, for relabel updates.
    pub fn with_summary(&self, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        let mut payload = self.payload.clone();
        if let Some(object) = payload.as_object_mut() {
            object.insert("summary".to_string(), serde_json::Value::String(summary.clone()));
        }
        Self { summary, payload, ..self.clone() }
    }
}

/// Half-open time window `[start, end)` used for slot listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window starting now and extending `days` into the future.
    pub fn next_days(days: i64) -> Self {
        let start = Utc::now();
        Self { start, end: start + chrono::Duration::days(days) }
    }
}
