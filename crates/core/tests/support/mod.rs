//! Shared test support for core service tests

pub mod calendar;
pub mod repositories;

use careslot_domain::{Slot, SlotTime};
use chrono::{Duration, NaiveDate, Utc};

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
        payload: serde_json::json!({
            "id": id,
            "summary": summary,
            "description": "walk-in clinic",
        }),
    }
}

/// Build an all-day slot on the given date.
pub fn all_day_slot(id: &str, summary: &str, date: NaiveDate) -> Slot {
    Slot {
        id: id.to_string(),
        summary: summary.to_string(),
        start: SlotTime::AllDay(date),
        end: SlotTime::AllDay(date.succ_opt().unwrap()),
        etag: Some("\"1\"".to_string()),
        payload: serde_json::json!({ "id": id, "summary": summary }),
    }
}
