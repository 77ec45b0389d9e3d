//! SQLite-backed ledger and outbox implementations

pub mod appointment_repository;
pub mod manager;
pub mod outbox_repository;

pub use appointment_repository::SqliteAppointmentRepository;
pub use manager::DbManager;
pub use outbox_repository::SqliteRelabelOutbox;
