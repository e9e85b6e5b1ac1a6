//! # MentorBook Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Database implementations (SQLite)
//! - HTTP client implementation with retry support
//! - External service integrations (scheduling service, payment gateway)
//! - Notification dispatch
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `mentorbook-core`
//! - Depends on `mentorbook-domain` and `mentorbook-core`
//! - Contains all "impure" code (I/O, network, storage)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod notifications;
pub mod payments;

// Re-export commonly used items
pub use database::{DbManager, SqliteMentorDirectory, SqliteSessionRepository};
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::scheduling::SchedulingClient;
pub use notifications::LoggingNotificationDispatcher;
pub use payments::HttpPaymentGateway;
