//! Booking lifecycle service - create, cancel, reschedule, accept, decline.
//!
//! Failure policy, in one place:
//! - validation / authorization / not-found fail fast, nothing persisted
//! - payment failure aborts before any booking row exists
//! - scheduling-service and notification failures on create/cancel are
//!   soft: logged, local state still advances
//! - a scheduling-service failure on reschedule is hard: the local booking
//!   stays byte-identical, because a remote calendar out of sync with local
//!   state is worse than refusing the operation

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mentorbook_domain::constants::{
    DEFAULT_SESSION_DURATIONS, FALLBACK_MEETING_BASE_URL, MAX_CANCEL_REASON_LEN, MAX_NOTES_LEN,
    MAX_PAGE_LIMIT, MAX_SUBJECT_LEN, MIN_SUBJECT_LEN,
};
use mentorbook_domain::{
    Actor, Booking, BookingConfig, BookingError, BookingStatus, CandidateSlot, MeetingProvider,
    MentorProfile, RefundStatus, Result,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ports::{
    BookingListFilter, MentorDirectory, NotificationDispatcher, PaymentGateway, SessionRepository,
};
use crate::availability::ports::{RemoteBookingRequest, SchedulingProvider};

/// Everything needed to commit a booking for a slot the client was shown.
#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub mentor_id: Uuid,
    pub student_id: Uuid,
    pub slot: CandidateSlot,
    pub subject: String,
    pub notes: Option<String>,
    pub payment_method_id: String,
}

/// Orchestrates booking state transitions and their side effects.
#[derive(Clone)]
pub struct BookingService {
    sessions: Arc<dyn SessionRepository>,
    directory: Arc<dyn MentorDirectory>,
    provider: Arc<dyn SchedulingProvider>,
    payments: Arc<dyn PaymentGateway>,
    notifications: Arc<dyn NotificationDispatcher>,
    config: BookingConfig,
    currency: String,
}

impl BookingService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        directory: Arc<dyn MentorDirectory>,
        provider: Arc<dyn SchedulingProvider>,
        payments: Arc<dyn PaymentGateway>,
        notifications: Arc<dyn NotificationDispatcher>,
        config: BookingConfig,
        currency: String,
    ) -> Self {
        Self { sessions, directory, provider, payments, notifications, config, currency }
    }

    /// Create a booking: validate, charge, atomically reserve the slot,
    /// then attach remote-calendar and notification side effects.
    pub async fn create(&self, request: CreateBookingRequest, now: DateTime<Utc>) -> Result<Booking> {
        self.validate_create(&request, now)?;

        // Read-only lookups, safe to run concurrently
        let (mentor, student_exists) = tokio::join!(
            self.directory.get_mentor(request.mentor_id),
            self.directory.student_exists(request.student_id),
        );
        let mentor = mentor?
            .ok_or_else(|| BookingError::NotFound(format!("mentor {}", request.mentor_id)))?;
        if !student_exists? {
            return Err(BookingError::NotFound(format!("student {}", request.student_id)));
        }
        validate_duration(&mentor, request.slot.duration_minutes)?;

        let charge = self
            .payments
            .charge(request.slot.price_cents, &self.currency, &request.payment_method_id)
            .await
            .map_err(|err| BookingError::Payment(format!("payment gateway unavailable: {err}")))?;
        if !charge.success {
            return Err(BookingError::Payment(
                charge.error.unwrap_or_else(|| "payment was declined".to_string()),
            ));
        }

        let mut booking = self.new_booking(&request, charge.payment_id, now);

        if let Err(err) = self.sessions.insert_if_free(&booking).await {
            // The charge already went through; give it back before failing.
            self.refund_best_effort(&mut booking).await;
            return match err {
                BookingError::Conflict(_) => Err(BookingError::Conflict(
                    "this slot is no longer available, please pick another".to_string(),
                )),
                other => Err(other),
            };
        }

        self.attach_meeting(&mut booking, &mentor).await;
        if let Err(err) = self.sessions.update(&booking).await {
            // The row is reserved but the caller is about to see a
            // failure; release the slot rather than strand it.
            warn!(
                booking_id = %booking.id,
                error = %err,
                "persisting meeting details failed, releasing the reserved slot"
            );
            self.release_reserved_slot(&mut booking, now).await;
            return Err(err);
        }

        info!(
            booking_id = %booking.id,
            mentor_id = %booking.mentor_id,
            student_id = %booking.student_id,
            start = %booking.scheduled_time,
            provider = booking.meeting_provider.as_str(),
            "booking created"
        );
        self.notifications.booking_confirmed(&booking).await;
        Ok(booking)
    }

    /// Cancel a booking on behalf of either party.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        if let Some(reason) = &reason {
            if reason.chars().count() > MAX_CANCEL_REASON_LEN {
                return Err(BookingError::Validation(format!(
                    "cancellation reason must be at most {MAX_CANCEL_REASON_LEN} characters"
                )));
            }
        }

        let booking = self.get(booking_id).await?;
        let actor = booking
            .party(actor_id)
            .ok_or_else(|| BookingError::Authorization("not a party to this booking".into()))?;
        if booking.status.is_terminal() {
            return Err(BookingError::Conflict(format!(
                "booking is already {}",
                booking.status.as_str()
            )));
        }

        self.finalize_cancellation(booking, actor, reason, now).await
    }

    /// Move a booking to a new slot. The remote calendar move, when one
    /// exists, must succeed before any local state changes.
    pub async fn reschedule(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
        new_slot: CandidateSlot,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        validate_slot_shape(&new_slot)?;
        validate_lead_time(&new_slot, now, self.config.min_lead_time_minutes)?;

        let booking = self.get(booking_id).await?;
        booking
            .party(actor_id)
            .ok_or_else(|| BookingError::Authorization("not a party to this booking".into()))?;
        if booking.status.is_terminal() {
            return Err(BookingError::Conflict(format!(
                "booking is already {}",
                booking.status.as_str()
            )));
        }

        let overlapping = self
            .sessions
            .find_overlapping(
                booking.mentor_id,
                new_slot.start_time,
                new_slot.end_time,
                Some(booking.id),
            )
            .await?;
        if !overlapping.is_empty() {
            return Err(BookingError::Conflict(
                "the requested slot is no longer available".to_string(),
            ));
        }

        if let Some(external_id) = &booking.external_booking_id {
            let moved = self
                .provider
                .reschedule_booking(external_id, new_slot.start_time, new_slot.end_time)
                .await
                .map_err(|err| {
                    BookingError::Integration(format!("scheduling service move failed: {err}"))
                })?;
            if !moved {
                return Err(BookingError::Integration(
                    "scheduling service rejected the move".to_string(),
                ));
            }
        }

        let updated = self
            .sessions
            .reschedule_if_free(booking.id, new_slot.start_time, new_slot.duration_minutes)
            .await?;

        info!(
            booking_id = %updated.id,
            mentor_id = %updated.mentor_id,
            new_start = %updated.scheduled_time,
            "booking rescheduled"
        );
        Ok(updated)
    }

    /// Mentor accepts a pending booking. Requires a meeting URL and must
    /// happen before the auto-decline deadline.
    pub async fn accept(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
        meeting_url: String,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        if meeting_url.trim().is_empty() {
            return Err(BookingError::Validation(
                "a meeting URL is required to accept a booking".to_string(),
            ));
        }

        let mut booking = self.get(booking_id).await?;
        self.require_mentor(&booking, actor_id)?;
        if booking.status != BookingStatus::PendingMentorAcceptance {
            return Err(BookingError::Conflict(format!(
                "booking is not awaiting acceptance (status: {})",
                booking.status.as_str()
            )));
        }
        if let Some(deadline) = booking.auto_decline_at {
            if now > deadline {
                return Err(BookingError::Conflict(
                    "the acceptance window for this booking has expired".to_string(),
                ));
            }
        }

        booking.status = BookingStatus::Confirmed;
        booking.meeting_url = Some(meeting_url);
        booking.meeting_provider = MeetingProvider::Manual;
        booking.updated_at = now;
        self.sessions.update(&booking).await?;

        info!(booking_id = %booking.id, mentor_id = %booking.mentor_id, "booking accepted");
        self.notifications.booking_accepted(&booking).await;
        Ok(booking)
    }

    /// Mentor declines a pending booking; shares the cancellation path
    /// (refund + notification, both best-effort).
    pub async fn decline(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        let booking = self.get(booking_id).await?;
        self.require_mentor(&booking, actor_id)?;
        if booking.status != BookingStatus::PendingMentorAcceptance {
            return Err(BookingError::Conflict(format!(
                "booking is not awaiting acceptance (status: {})",
                booking.status.as_str()
            )));
        }

        self.finalize_cancellation(booking, Actor::Mentor, reason, now).await
    }

    /// Fetch a booking or fail with `NotFound`.
    pub async fn get(&self, booking_id: Uuid) -> Result<Booking> {
        self.sessions
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("booking {booking_id}")))
    }

    /// Paginated listing of a user's bookings (either side of the table).
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: BookingListFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Booking>> {
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        self.sessions.list_for_user(user_id, filter, page.max(1), limit).await
    }

    /* ------------------------------------------------------------------ */
    /* internals                                                          */
    /* ------------------------------------------------------------------ */

    fn validate_create(&self, request: &CreateBookingRequest, now: DateTime<Utc>) -> Result<()> {
        let subject_len = request.subject.trim().chars().count();
        if !(MIN_SUBJECT_LEN..=MAX_SUBJECT_LEN).contains(&subject_len) {
            return Err(BookingError::Validation(format!(
                "subject must be between {MIN_SUBJECT_LEN} and {MAX_SUBJECT_LEN} characters"
            )));
        }
        if let Some(notes) = &request.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(BookingError::Validation(format!(
                    "notes must be at most {MAX_NOTES_LEN} characters"
                )));
            }
        }
        if request.payment_method_id.trim().is_empty() {
            return Err(BookingError::Validation("a payment method is required".to_string()));
        }
        validate_slot_shape(&request.slot)?;
        validate_lead_time(&request.slot, now, self.config.min_lead_time_minutes)?;
        Ok(())
    }

    fn new_booking(
        &self,
        request: &CreateBookingRequest,
        payment_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Booking {
        let (status, auto_decline_at) = if self.config.require_mentor_acceptance {
            (
                BookingStatus::PendingMentorAcceptance,
                Some(now + Duration::minutes(self.config.acceptance_window_minutes)),
            )
        } else {
            (BookingStatus::Confirmed, None)
        };

        Booking {
            id: Uuid::now_v7(),
            mentor_id: request.mentor_id,
            student_id: request.student_id,
            scheduled_time: request.slot.start_time,
            duration_minutes: request.slot.duration_minutes,
            subject: request.subject.trim().to_string(),
            notes: request.notes.clone(),
            status,
            price_cents: request.slot.price_cents,
            payment_id,
            meeting_url: None,
            meeting_provider: MeetingProvider::Fallback,
            external_booking_id: None,
            cancellation_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            refund_id: None,
            refund_status: None,
            student_rating: None,
            mentor_rating: None,
            auto_decline_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Try to mirror the booking on the scheduling service; fall back to a
    /// locally generated meeting link when that fails. Never fails the
    /// overall booking.
    async fn attach_meeting(&self, booking: &mut Booking, mentor: &MentorProfile) {
        if self.provider.is_enabled() {
            if let Some(handle) = &mentor.scheduling_handle {
                let remote = self
                    .provider
                    .create_booking(&RemoteBookingRequest {
                        mentor_id: mentor.id,
                        remote_user_id: handle.remote_user_id.clone(),
                        event_type_id: handle.event_type_id,
                        title: booking.subject.clone(),
                        start: booking.scheduled_time,
                        end: booking.end_time(),
                    })
                    .await;

                if remote.success {
                    booking.external_booking_id = remote.external_booking_id;
                    booking.meeting_provider = MeetingProvider::ExternalCalendar;
                    booking.meeting_url =
                        remote.meeting_url.or_else(|| Some(fallback_meeting_link(booking.id)));
                    return;
                }
                warn!(
                    booking_id = %booking.id,
                    error = remote.error.as_deref().unwrap_or("unknown"),
                    "remote booking creation failed, using fallback meeting link"
                );
            }
        }

        booking.meeting_provider = MeetingProvider::Fallback;
        booking.meeting_url = Some(fallback_meeting_link(booking.id));
    }

    async fn finalize_cancellation(
        &self,
        mut booking: Booking,
        actor: Actor,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        if let Some(external_id) = &booking.external_booking_id {
            match self.provider.cancel_booking(external_id, reason.as_deref()).await {
                Ok(true) => debug!(booking_id = %booking.id, "remote booking cancelled"),
                Ok(false) => warn!(booking_id = %booking.id, "remote cancel was rejected"),
                Err(err) => {
                    warn!(booking_id = %booking.id, error = %err, "remote cancel failed");
                }
            }
        }

        booking.status = BookingStatus::Cancelled;
        booking.cancelled_by = Some(actor);
        booking.cancellation_reason = reason;
        booking.cancelled_at = Some(now);
        booking.updated_at = now;

        self.refund_best_effort(&mut booking).await;
        self.sessions.update(&booking).await?;

        info!(
            booking_id = %booking.id,
            cancelled_by = actor.as_str(),
            refund = booking.refund_status.map(RefundStatus::as_str).unwrap_or("none"),
            "booking cancelled"
        );
        self.notifications.booking_cancelled(&booking).await;
        Ok(booking)
    }

    /// Undo a reservation whose follow-up write failed: cancel any remote
    /// counterpart, refund the charge, and mark the row cancelled so the
    /// slot frees up. Everything here is best-effort.
    async fn release_reserved_slot(&self, booking: &mut Booking, now: DateTime<Utc>) {
        if let Some(external_id) = &booking.external_booking_id {
            if let Err(err) = self.provider.cancel_booking(external_id, None).await {
                warn!(booking_id = %booking.id, error = %err, "remote cancel failed during release");
            }
        }
        self.refund_best_effort(booking).await;

        booking.status = BookingStatus::Cancelled;
        booking.cancelled_at = Some(now);
        booking.updated_at = now;
        if let Err(err) = self.sessions.update(booking).await {
            warn!(
                booking_id = %booking.id,
                error = %err,
                "could not mark the released booking cancelled, slot stays reserved"
            );
        }
    }

    /// Refund the booking's charge if one exists. Failure is recorded in
    /// `refund_status`, never propagated.
    async fn refund_best_effort(&self, booking: &mut Booking) {
        let Some(payment_id) = booking.payment_id.clone() else {
            return;
        };

        booking.refund_status = Some(RefundStatus::Pending);
        match self.payments.refund(&payment_id, booking.price_cents).await {
            Ok(outcome) if outcome.success => {
                booking.refund_id = outcome.refund_id;
                booking.refund_status = Some(RefundStatus::Succeeded);
            }
            Ok(outcome) => {
                warn!(
                    booking_id = %booking.id,
                    error = outcome.error.as_deref().unwrap_or("unknown"),
                    "refund was declined"
                );
                booking.refund_status = Some(RefundStatus::Failed);
            }
            Err(err) => {
                warn!(booking_id = %booking.id, error = %err, "refund request failed");
                booking.refund_status = Some(RefundStatus::Failed);
            }
        }
    }

    fn require_mentor(&self, booking: &Booking, actor_id: Uuid) -> Result<()> {
        match booking.party(actor_id) {
            Some(Actor::Mentor) => Ok(()),
            _ => Err(BookingError::Authorization(
                "only the mentor on this booking may do that".into(),
            )),
        }
    }
}

fn validate_slot_shape(slot: &CandidateSlot) -> Result<()> {
    if slot.duration_minutes <= 0 {
        return Err(BookingError::Validation("slot duration must be positive".to_string()));
    }
    if slot.price_cents <= 0 {
        return Err(BookingError::Validation("slot price must be positive".to_string()));
    }
    if slot.end_time != slot.start_time + Duration::minutes(slot.duration_minutes) {
        return Err(BookingError::Validation(
            "slot end time does not match its start time and duration".to_string(),
        ));
    }
    Ok(())
}

fn validate_lead_time(slot: &CandidateSlot, now: DateTime<Utc>, lead_minutes: i64) -> Result<()> {
    if slot.start_time < now + Duration::minutes(lead_minutes) {
        return Err(BookingError::Validation(format!(
            "sessions must be booked at least {} hours in advance",
            lead_minutes / 60
        )));
    }
    Ok(())
}

fn validate_duration(mentor: &MentorProfile, duration_minutes: i64) -> Result<()> {
    let allowed: &[i64] = if mentor.session_durations.is_empty() {
        &DEFAULT_SESSION_DURATIONS
    } else {
        &mentor.session_durations
    };
    if !allowed.contains(&duration_minutes) {
        return Err(BookingError::Validation(format!(
            "{duration_minutes} minutes is not an offered session length"
        )));
    }
    Ok(())
}

fn fallback_meeting_link(booking_id: Uuid) -> String {
    format!("{FALLBACK_MEETING_BASE_URL}/{booking_id}")
}
