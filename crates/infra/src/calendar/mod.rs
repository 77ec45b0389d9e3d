//! Calendar integration module
//!
//! Provides the credential session and the HTTP client implementing the
//! `CalendarPort` against a Google-style events API.

pub mod auth;
pub mod client;
pub mod types;

pub use auth::{CalendarAuthSettings, CalendarAuthenticator, CalendarSession};
pub use client::CalendarClient;
