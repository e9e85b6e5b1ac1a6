//! Configuration management
//!
//! Every knob has a built-in default and every struct deserializes with
//! `#[serde(default)]`, so a config file may set any subset of sections
//! and the rest layer over the defaults.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ACCEPTANCE_WINDOW_MINUTES, MIN_LEAD_TIME_MINUTES};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub scheduling: SchedulingConfig,
    pub payment: PaymentConfig,
    pub booking: BookingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "mentorbook.db".to_string(), pool_size: 8 }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: "127.0.0.1:8080".to_string() }
    }
}

/// External scheduling service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cal.com/v1".to_string(),
            api_key: None,
            enabled: false,
            timeout_secs: 15,
        }
    }
}

/// Payment gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub currency: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4242".to_string(),
            api_key: None,
            currency: "usd".to_string(),
        }
    }
}

/// Booking policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub min_lead_time_minutes: i64,
    pub acceptance_window_minutes: i64,
    /// When false, bookings are created directly in `Confirmed` (no mentor
    /// acceptance step).
    pub require_mentor_acceptance: bool,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            min_lead_time_minutes: MIN_LEAD_TIME_MINUTES,
            acceptance_window_minutes: DEFAULT_ACCEPTANCE_WINDOW_MINUTES,
            require_mentor_acceptance: true,
        }
    }
}
