//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LOOKAHEAD_DAYS, DEFAULT_RECONCILE_INTERVAL_SECS};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub calendar: CalendarConfig,
    pub server: ServerConfig,
    pub booking: BookingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Calendar integration configuration
///
/// `refresh_token` is the durable credential obtained from the one-time
/// authorization handshake; without it every calendar operation fails as
/// upstream-unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub base_url: String,
    pub token_endpoint: String,
    pub calendar_id: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    /// Refresh the access token when it expires within this many seconds.
    pub refresh_threshold_seconds: i64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// Booking behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Listing window length, in days from now.
    pub lookahead_days: i64,
    /// Interval between relabel reconciliation passes, in seconds.
    pub reconcile_interval_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "careslot.db".to_string(), pool_size: 8 }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            calendar_id: "primary".to_string(),
            client_id: String::new(),
            client_secret: None,
            refresh_token: None,
            refresh_threshold_seconds: 300,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: "127.0.0.1:8080".to_string() }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            reconcile_interval_seconds: DEFAULT_RECONCILE_INTERVAL_SECS,
        }
    }
}
