//! Notification dispatch.
//!
//! Delivery channels (email, push) live in a separate service; this
//! adapter records the events and emits structured logs the delivery
//! pipeline tails. Dispatch never fails from the caller's point of view.

use async_trait::async_trait;
use mentorbook_core::NotificationDispatcher;
use mentorbook_domain::Booking;
use tracing::info;

#[derive(Default)]
pub struct LoggingNotificationDispatcher;

impl LoggingNotificationDispatcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationDispatcher for LoggingNotificationDispatcher {
    async fn booking_confirmed(&self, booking: &Booking) {
        info!(
            event = "booking_confirmed",
            booking_id = %booking.id,
            mentor_id = %booking.mentor_id,
            student_id = %booking.student_id,
            scheduled_time = %booking.scheduled_time,
            "notification dispatched"
        );
    }

    async fn booking_cancelled(&self, booking: &Booking) {
        info!(
            event = "booking_cancelled",
            booking_id = %booking.id,
            mentor_id = %booking.mentor_id,
            student_id = %booking.student_id,
            cancelled_by = ?booking.cancelled_by,
            "notification dispatched"
        );
    }

    async fn booking_accepted(&self, booking: &Booking) {
        info!(
            event = "booking_accepted",
            booking_id = %booking.id,
            mentor_id = %booking.mentor_id,
            student_id = %booking.student_id,
            "notification dispatched"
        );
    }
}
