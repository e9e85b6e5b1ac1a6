//! Application state wiring.
//!
//! Builds the concrete adapters once at startup and hands the services
//! around as cheap clones.

use std::sync::Arc;

use mentorbook_core::{AvailabilityService, BookingService, ConflictFilter, SlotGenerator};
use mentorbook_domain::{Config, Result};
use mentorbook_infra::{
    DbManager, HttpPaymentGateway, LoggingNotificationDispatcher, SchedulingClient,
    SqliteMentorDirectory, SqliteSessionRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingService,
    pub availability: AvailabilityService,
    pub directory: Arc<SqliteMentorDirectory>,
    pub db: Arc<DbManager>,
}

impl AppState {
    pub fn build(config: &Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let sessions = Arc::new(SqliteSessionRepository::new(Arc::clone(db.pool())));
        let directory = Arc::new(SqliteMentorDirectory::new(Arc::clone(db.pool())));
        let provider = Arc::new(SchedulingClient::new(&config.scheduling)?);
        let payments = Arc::new(HttpPaymentGateway::new(&config.payment)?);
        let currency = payments.currency().to_string();
        let notifications = Arc::new(LoggingNotificationDispatcher::new());

        let generator = SlotGenerator::new(config.booking.min_lead_time_minutes);
        let conflicts = ConflictFilter::new(sessions.clone());
        let availability =
            AvailabilityService::new(provider.clone(), generator, conflicts);

        let bookings = BookingService::new(
            sessions,
            directory.clone(),
            provider,
            payments,
            notifications,
            config.booking.clone(),
            currency,
        );

        Ok(Self { bookings, availability, directory, db })
    }
}
