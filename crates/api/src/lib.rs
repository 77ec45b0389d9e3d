//! # Careslot API
//!
//! HTTP application layer - routes and main entry point.
//!
//! This crate contains:
//! - The axum router binding the booking operations
//! - Application context (dependency injection)
//! - Bearer-token authentication extraction
//! - Error to status-code mapping
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Exposes the REST surface for patients

pub mod auth;
pub mod context;
pub mod error;
pub mod routes;

// Re-export for convenience
pub use auth::AuthenticatedPatient;
pub use context::AppContext;
pub use error::ApiError;
pub use routes::router;
