//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Booking constraints
pub const MIN_LEAD_TIME_MINUTES: i64 = 120;
pub const DEFAULT_ACCEPTANCE_WINDOW_MINUTES: i64 = 24 * 60;

// Request validation bounds
pub const MIN_SUBJECT_LEN: usize = 3;
pub const MAX_SUBJECT_LEN: usize = 200;
pub const MAX_NOTES_LEN: usize = 1000;
pub const MAX_CANCEL_REASON_LEN: usize = 500;

// Default session durations (minutes) used when a mentor has none configured
pub const DEFAULT_SESSION_DURATIONS: [i64; 2] = [30, 60];

// Meeting link fallback when the scheduling integration cannot produce one
pub const FALLBACK_MEETING_BASE_URL: &str = "https://meet.mentorbook.app/session";

// Pagination defaults for booking listings
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;
