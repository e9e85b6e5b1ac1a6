//! Clients for external services.

pub mod scheduling;

pub use scheduling::SchedulingClient;
