//! Availability resolution: remote scheduling service first, local slot
//! generation as the fallback.

pub mod ports;
pub mod service;

pub use service::{AvailabilityService, SlotResolution};
