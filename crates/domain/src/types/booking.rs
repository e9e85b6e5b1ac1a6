//! Booking (session) types - the durable record of a committed reservation

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking lifecycle state.
///
/// `Completed` and `Cancelled` are terminal; `Cancelled` is reachable from
/// any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingMentorAcceptance,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingMentorAcceptance => "pending_mentor_acceptance",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending_mentor_acceptance" => Some(Self::PendingMentorAcceptance),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Where the meeting link came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingProvider {
    ExternalCalendar,
    Manual,
    Fallback,
}

impl MeetingProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExternalCalendar => "external_calendar",
            Self::Manual => "manual",
            Self::Fallback => "fallback",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "external_calendar" => Some(Self::ExternalCalendar),
            "manual" => Some(Self::Manual),
            "fallback" => Some(Self::Fallback),
            _ => None,
        }
    }
}

/// Which party performed an action on a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Student,
    Mentor,
}

impl Actor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Mentor => "mentor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Self::Student),
            "mentor" => Some(Self::Mentor),
            _ => None,
        }
    }
}

/// Outcome of a refund attempt recorded on the booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Succeeded,
    Failed,
}

impl RefundStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A persisted, committed reservation of a slot by a student with a mentor.
///
/// Central invariant: for a fixed `mentor_id`, no two bookings with status
/// other than `Cancelled` may have overlapping
/// `[scheduled_time, scheduled_time + duration)` intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub student_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub subject: String,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub price_cents: i64,
    pub payment_id: Option<String>,
    pub meeting_url: Option<String>,
    pub meeting_provider: MeetingProvider,
    pub external_booking_id: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<Actor>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refund_id: Option<String>,
    pub refund_status: Option<RefundStatus>,
    pub student_rating: Option<u8>,
    pub mentor_rating: Option<u8>,
    /// Deadline for mentor acceptance while `PendingMentorAcceptance`.
    pub auto_decline_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// End of the booked interval (exclusive).
    pub fn end_time(&self) -> DateTime<Utc> {
        self.scheduled_time + Duration::minutes(self.duration_minutes)
    }

    /// True when `actor_id` is a party to this booking, and which side.
    pub fn party(&self, actor_id: Uuid) -> Option<Actor> {
        if actor_id == self.student_id {
            Some(Actor::Student)
        } else if actor_id == self.mentor_id {
            Some(Actor::Mentor)
        } else {
            None
        }
    }
}
