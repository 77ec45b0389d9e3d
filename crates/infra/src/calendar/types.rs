//! Calendar wire-format parsing.
//!
//! Events come back as JSON objects whose `start`/`end` carry either a
//! `dateTime` (timed) or a `date` (all-day) value. The full object is kept
//! as the slot payload so relabel updates can round-trip every field this
//! system does not touch.

use careslot_domain::{CareslotError, Result, Slot, SlotTime};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

/// One page of an events listing.
#[derive(Debug, Deserialize)]
pub(crate) struct EventsPage {
    #[serde(default)]
    pub items: Vec<Value>,
}

/// Parse a raw calendar event into a domain slot.
pub(crate) fn slot_from_event(event: Value) -> Result<Slot> {
    let object = event
        .as_object()
        .ok_or_else(|| CareslotError::InvalidInput("calendar event is not an object".into()))?;

    let id = object
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CareslotError::InvalidInput("calendar event missing id".into()))?
        .to_string();

    let summary =
        object.get("summary").and_then(Value::as_str).unwrap_or_default().to_string();
    let etag = object.get("etag").and_then(Value::as_str).map(str::to_string);

    let start = parse_boundary(object.get("start"), "start")?;
    let end = parse_boundary(object.get("end"), "end")?;

    Ok(Slot { id, summary, start, end, etag, payload: event })
}

fn parse_boundary(value: Option<&Value>, field: &str) -> Result<SlotTime> {
    let object = value.and_then(Value::as_object).ok_or_else(|| {
        CareslotError::InvalidInput(format!("calendar event missing {field} boundary"))
    })?;

    if let Some(date_time) = object.get("dateTime").and_then(Value::as_str) {
        return parse_event_timestamp(date_time, field);
    }

    if let Some(date) = object.get("date").and_then(Value::as_str) {
        let parsed = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|err| {
            CareslotError::InvalidInput(format!("invalid all-day {field} date '{date}': {err}"))
        })?;
        return Ok(SlotTime::AllDay(parsed));
    }

    Err(CareslotError::InvalidInput(format!(
        "calendar event {field} boundary carries neither dateTime nor date"
    )))
}

fn parse_event_timestamp(value: &str, field: &str) -> Result<SlotTime> {
    let trimmed = value.trim();
    let has_explicit_timezone = trimmed.ends_with('Z')
        || trimmed
            .rfind('T')
            .is_some_and(|idx| trimmed[idx + 1..].chars().any(|c| matches!(c, '+' | '-')));

    let candidate = if has_explicit_timezone { trimmed.to_string() } else { format!("{trimmed}Z") };

    chrono::DateTime::parse_from_rfc3339(&candidate)
        .map(|dt| SlotTime::Timed(dt.with_timezone(&Utc)))
        .map_err(|err| {
            CareslotError::InvalidInput(format!("invalid {field} timestamp '{value}': {err}"))
        })
}
