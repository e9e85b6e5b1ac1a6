//! Mentor availability types
//!
//! A mentor's recurring schedule is a fixed-size per-weekday record rather
//! than a map keyed by day name: "day missing" is unrepresentable, and
//! lookups go through [`chrono::Weekday`] instead of strings.

use chrono::Weekday;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single wall-clock interval within a weekday.
///
/// `start`/`end` are `"HH:MM"` strings in the mentor's timezone. They are
/// mentor input and may be malformed; the slot generator validates them and
/// skips bad windows individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: String,
    pub start: String,
    pub end: String,
}

impl AvailabilityWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4().to_string(), start: start.into(), end: end.into() }
    }
}

/// One weekday's worth of recurring availability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub available: bool,
    pub windows: Vec<AvailabilityWindow>,
}

/// A mentor's recurring weekly schedule, indexed Sunday..Saturday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAvailability {
    days: [DayAvailability; 7],
}

impl WeeklyAvailability {
    /// Borrow the entry for a weekday.
    pub fn day(&self, weekday: Weekday) -> &DayAvailability {
        &self.days[weekday.num_days_from_sunday() as usize]
    }

    /// Replace the entry for a weekday, returning self for chained setup.
    pub fn with_day(mut self, weekday: Weekday, day: DayAvailability) -> Self {
        self.days[weekday.num_days_from_sunday() as usize] = day;
        self
    }

    /// True when no weekday has a usable window.
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|d| !d.available || d.windows.is_empty())
    }
}

/// Link between a mentor and their account on the external scheduling
/// service. `event_type_id` is provisioned lazily on first availability
/// lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingHandle {
    pub remote_user_id: String,
    pub event_type_id: Option<i64>,
}

/// Mentor read-model consumed by the booking core.
///
/// Owned and edited by profile management; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorProfile {
    pub id: Uuid,
    pub display_name: String,
    pub timezone: Tz,
    pub hourly_rate_cents: i64,
    /// Supported session lengths in minutes.
    pub session_durations: Vec<i64>,
    pub weekly_availability: WeeklyAvailability,
    pub scheduling_handle: Option<SchedulingHandle>,
}
