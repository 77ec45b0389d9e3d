//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CARESLOT_DB_PATH`: Ledger database file path (required)
//! - `CARESLOT_DB_POOL_SIZE`: Connection pool size
//! - `CARESLOT_BIND_ADDR`: HTTP bind address
//! - `CARESLOT_CALENDAR_ID`: Calendar identifier (required)
//! - `CARESLOT_CALENDAR_CLIENT_ID`: OAuth client id (required)
//! - `CARESLOT_CALENDAR_CLIENT_SECRET`: OAuth client secret
//! - `CARESLOT_CALENDAR_REFRESH_TOKEN`: Durable calendar credential
//! - `CARESLOT_CALENDAR_BASE_URL`: Calendar API base URL
//! - `CARESLOT_CALENDAR_TOKEN_ENDPOINT`: Token exchange endpoint
//! - `CARESLOT_LOOKAHEAD_DAYS`: Slot listing window length
//! - `CARESLOT_RECONCILE_INTERVAL`: Reconciler poll interval in seconds
//!
//! ## File Locations
//! The loader probes `careslot.toml` / `careslot.json` in the current
//! working directory and its parent.

use std::path::{Path, PathBuf};

use careslot_domain::{CareslotError, Config, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `CareslotError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The required variables must be present; everything else falls back to
/// the documented defaults.
///
/// # Errors
/// Returns `CareslotError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.database.path = env_var("CARESLOT_DB_PATH")?;
    config.calendar.calendar_id = env_var("CARESLOT_CALENDAR_ID")?;
    config.calendar.client_id = env_var("CARESLOT_CALENDAR_CLIENT_ID")?;

    if let Some(pool_size) = optional_env("CARESLOT_DB_POOL_SIZE") {
        config.database.pool_size = pool_size
            .parse::<u32>()
            .map_err(|e| CareslotError::Config(format!("invalid pool size: {e}")))?;
    }
    if let Some(bind_addr) = optional_env("CARESLOT_BIND_ADDR") {
        config.server.bind_addr = bind_addr;
    }
    if let Some(base_url) = optional_env("CARESLOT_CALENDAR_BASE_URL") {
        config.calendar.base_url = base_url;
    }
    if let Some(token_endpoint) = optional_env("CARESLOT_CALENDAR_TOKEN_ENDPOINT") {
        config.calendar.token_endpoint = token_endpoint;
    }
    config.calendar.client_secret = optional_env("CARESLOT_CALENDAR_CLIENT_SECRET");
    config.calendar.refresh_token = optional_env("CARESLOT_CALENDAR_REFRESH_TOKEN");

    if let Some(lookahead) = optional_env("CARESLOT_LOOKAHEAD_DAYS") {
        config.booking.lookahead_days = lookahead
            .parse::<i64>()
            .map_err(|e| CareslotError::Config(format!("invalid lookahead days: {e}")))?;
    }
    if let Some(interval) = optional_env("CARESLOT_RECONCILE_INTERVAL") {
        config.booking.reconcile_interval_seconds = interval
            .parse::<u64>()
            .map_err(|e| CareslotError::Config(format!("invalid reconcile interval: {e}")))?;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the documented locations. The format is
/// detected by file extension (`.toml` or `.json`).
///
/// # Errors
/// Returns `CareslotError::Config` if the file is missing or malformed.
pub fn load_from_file(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => probe_config_paths().ok_or_else(|| {
            CareslotError::Config("no careslot.toml or careslot.json found".to_string())
        })?,
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        CareslotError::Config(format!("failed to read {}: {e}", path.display()))
    })?;

    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&contents)
            .map_err(|e| CareslotError::Config(format!("invalid TOML config: {e}")))?,
        Some("json") => serde_json::from_str(&contents)
            .map_err(|e| CareslotError::Config(format!("invalid JSON config: {e}")))?,
        other => {
            return Err(CareslotError::Config(format!(
                "unsupported config extension: {other:?}"
            )));
        }
    };

    tracing::info!(path = %path.display(), "configuration loaded from file");

    Ok(config)
}

fn probe_config_paths() -> Option<PathBuf> {
    const CANDIDATES: [&str; 4] =
        ["careslot.toml", "careslot.json", "../careslot.toml", "../careslot.json"];

    CANDIDATES.iter().map(PathBuf::from).find(|candidate| candidate.exists())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| CareslotError::Config(format!("missing environment variable: {name}")))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
