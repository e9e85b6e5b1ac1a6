//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for MentorBook
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Slot no longer available at commit time. The caller must re-fetch
    /// availability and retry with a different slot; never auto-retried.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payment error: {0}")]
    Payment(String),

    /// External scheduling service failure. Soft on create/cancel (the
    /// fallback path engages), hard on reschedule.
    #[error("Integration error: {0}")]
    Integration(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for MentorBook operations
pub type Result<T> = std::result::Result<T, BookingError>;
