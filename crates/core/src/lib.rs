//! # MentorBook Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Slot generation and conflict detection
//! - Availability resolution (remote scheduling service with local fallback)
//! - The booking lifecycle service
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `mentorbook-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod availability;
pub mod booking;
pub mod scheduling;

// Re-export specific items to avoid ambiguity
pub use availability::ports::{RemoteBooking, RemoteBookingRequest, SchedulingProvider};
pub use availability::{AvailabilityService, SlotResolution};
pub use booking::ports::{
    BookingListFilter, ChargeOutcome, MentorDirectory, NotificationDispatcher, PaymentGateway,
    RefundOutcome, SessionRepository,
};
pub use booking::{BookingService, CreateBookingRequest};
pub use scheduling::conflict::{overlaps, ConflictFilter};
pub use scheduling::generator::{derive_price, SlotGenerator};
