//! Port interfaces driven by the booking lifecycle service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mentorbook_domain::{Booking, MentorProfile, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status filter for booking listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingListFilter {
    /// Confirmed or pending bookings whose start lies in the future.
    Upcoming,
    Completed,
    Cancelled,
}

/// Durable store for bookings.
///
/// `insert_if_free` and `reschedule_if_free` carry the no-double-booking
/// guarantee: the conflict check and the write must be atomic with respect
/// to concurrent calls for the same mentor (storage-level serialization,
/// not an application-side re-query).
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist `booking` unless its interval overlaps an existing
    /// non-cancelled booking for the same mentor. Returns
    /// `BookingError::Conflict` when the slot is taken.
    async fn insert_if_free(&self, booking: &Booking) -> Result<()>;

    /// Move a booking to a new interval under the same atomicity guarantee,
    /// ignoring the booking's own current interval.
    async fn reschedule_if_free(
        &self,
        booking_id: Uuid,
        new_start: DateTime<Utc>,
        new_duration_minutes: i64,
    ) -> Result<Booking>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>>;

    /// Non-cancelled bookings for `mentor_id` overlapping `[start, end)`,
    /// optionally excluding one booking id (for reschedule).
    async fn find_overlapping(
        &self,
        mentor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Booking>>;

    /// Non-cancelled bookings for `mentor_id` overlapping `[start, end)`.
    /// Used by display-time conflict filtering.
    async fn find_for_range(
        &self,
        mentor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>>;

    /// Persist updated mutable fields of an existing booking.
    async fn update(&self, booking: &Booking) -> Result<()>;

    /// Bookings where `user_id` is the student or the mentor, newest first,
    /// paginated.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: BookingListFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Booking>>;
}

/// Read-only access to mentor and student records (owned by profile
/// management, outside this core).
#[async_trait]
pub trait MentorDirectory: Send + Sync {
    async fn get_mentor(&self, id: Uuid) -> Result<Option<MentorProfile>>;
    async fn student_exists(&self, id: Uuid) -> Result<bool>;
}

/// Result of a charge attempt. A gateway decline is a structured outcome,
/// not an `Err`; `Err` is reserved for transport-level failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeOutcome {
    pub success: bool,
    pub payment_id: Option<String>,
    pub error: Option<String>,
}

/// Result of a refund attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundOutcome {
    pub success: bool,
    pub refund_id: Option<String>,
    pub error: Option<String>,
}

/// Opaque payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(
        &self,
        amount_cents: i64,
        currency: &str,
        payment_method: &str,
    ) -> Result<ChargeOutcome>;

    async fn refund(&self, payment_id: &str, amount_cents: i64) -> Result<RefundOutcome>;
}

/// Fire-and-forget notification dispatch. Implementations swallow and log
/// their own failures; delivery never blocks a booking-state transition.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn booking_confirmed(&self, booking: &Booking);
    async fn booking_cancelled(&self, booking: &Booking);
    async fn booking_accepted(&self, booking: &Booking);
}
