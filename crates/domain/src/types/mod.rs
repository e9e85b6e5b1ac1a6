//! Domain types and models

pub mod availability;
pub mod booking;
pub mod slot;

pub use availability::{AvailabilityWindow, DayAvailability, MentorProfile, SchedulingHandle, WeeklyAvailability};
pub use booking::{Actor, Booking, BookingStatus, MeetingProvider, RefundStatus};
pub use slot::{CandidateSlot, SessionType};
