//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use careslot_core::{
    AppointmentRepository, BookingService, CalendarPort, IdentityVerifier, RelabelOutbox,
};
use careslot_domain::{Config, Result};
use careslot_infra::calendar::{CalendarAuthSettings, CalendarAuthenticator, CalendarClient};
use careslot_infra::database::{DbManager, SqliteAppointmentRepository, SqliteRelabelOutbox};
use careslot_infra::identity::BearerIdentityVerifier;
use careslot_infra::sync::{ReconcilerConfig, RelabelReconciler};
use tracing::warn;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub booking: Arc<BookingService>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub calendar: Arc<dyn CalendarPort>,
    pub outbox: Arc<dyn RelabelOutbox>,
}

impl AppContext {
    /// Wire the production dependency graph from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let ledger: Arc<dyn AppointmentRepository> =
            Arc::new(SqliteAppointmentRepository::new(Arc::clone(&db)));
        let outbox: Arc<dyn RelabelOutbox> =
            Arc::new(SqliteRelabelOutbox::new(Arc::clone(&db)));

        let authenticator =
            Arc::new(CalendarAuthenticator::new(CalendarAuthSettings::from(&config.calendar)));
        if !authenticator.is_authorized() {
            warn!("calendar refresh token not configured; operations will fail until authorized");
        }
        let calendar: Arc<dyn CalendarPort> =
            Arc::new(CalendarClient::new(&config.calendar, authenticator)?);

        let booking = Arc::new(
            BookingService::new(Arc::clone(&calendar), ledger, Arc::clone(&outbox))
                .with_lookahead_days(config.booking.lookahead_days),
        );

        let identity: Arc<dyn IdentityVerifier> = Arc::new(BearerIdentityVerifier::default());

        Ok(Self { config, db, booking, identity, calendar, outbox })
    }

    /// Assemble a context from pre-built parts. Used by tests to substitute
    /// in-memory ports.
    pub fn from_parts(
        config: Config,
        db: Arc<DbManager>,
        booking: Arc<BookingService>,
        identity: Arc<dyn IdentityVerifier>,
        calendar: Arc<dyn CalendarPort>,
        outbox: Arc<dyn RelabelOutbox>,
    ) -> Self {
        Self { config, db, booking, identity, calendar, outbox }
    }

    /// Build the relabel reconciler over this context's ports.
    pub fn reconciler(&self) -> RelabelReconciler {
        let config = ReconcilerConfig {
            poll_interval: Duration::from_secs(self.config.booking.reconcile_interval_seconds),
            ..ReconcilerConfig::default()
        };
        RelabelReconciler::new(Arc::clone(&self.outbox), Arc::clone(&self.calendar), config)
    }
}
