//! Ledger appointment types
//!
//! An appointment row is the local persisted record of a booking action.
//! Rows are created at booking time only, mutate only through the
//! BOOKED→CANCELLED transition, and are never physically deleted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CareslotError;

/// Lifecycle status of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Available,
    Booked,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Available => "AVAILABLE",
            Self::Booked => "BOOKED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

impl FromStr for AppointmentStatus {
    type Err = CareslotError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "AVAILABLE" => Ok(Self::Available),
            "BOOKED" => Ok(Self::Booked),
            "CANCELLED" => Ok(Self::Cancelled),
            other => {
                Err(CareslotError::InvalidInput(format!("unknown appointment status: {other}")))
            }
        }
    }
}

/// Ledger row for a booking action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub start_ts: i64,
    pub end_ts: i64,
    pub status: AppointmentStatus,
    /// External slot reference; immutable once set.
    pub slot_ref: Option<String>,
    /// Owning patient reference.
    pub patient_ref: Option<String>,
    pub created_at: i64,
}

impl Appointment {
    /// Get start time as `DateTime<Utc>`
    pub fn start_time_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.start_ts, 0)
    }

    /// Get end time as `DateTime<Utc>`
    pub fn end_time_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.end_ts, 0)
    }
}

/// Insert parameters for a new booking row.
#[derive(Debug, Clone)]
pub struct AppointmentParams {
    pub slot_ref: String,
    pub patient_ref: String,
    pub start_ts: i64,
    pub end_ts: i64,
}
