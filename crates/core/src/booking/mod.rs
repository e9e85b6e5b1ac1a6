//! Booking lifecycle: creation, cancellation, rescheduling, mentor
//! acceptance, and the ports the lifecycle service drives.

pub mod ports;
pub mod service;

pub use service::{BookingService, CreateBookingRequest};
