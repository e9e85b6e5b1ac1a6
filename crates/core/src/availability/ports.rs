//! Scheduling-service port interface.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mentorbook_domain::{CandidateSlot, MentorProfile, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to create a booking on the remote scheduling service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteBookingRequest {
    pub mentor_id: Uuid,
    pub remote_user_id: String,
    pub event_type_id: Option<i64>,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Structured outcome of a remote booking creation. Failures come back as
/// `success: false`, never as an `Err` - the lifecycle service falls back
/// to a locally generated meeting link in that case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteBooking {
    pub success: bool,
    pub external_booking_id: Option<String>,
    pub meeting_url: Option<String>,
    pub error: Option<String>,
}

impl RemoteBooking {
    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, error: Some(error.into()), ..Self::default() }
    }
}

/// Remote scheduling service (event types, availability, bookings).
///
/// All remote responses are normalized to [`CandidateSlot`] so downstream
/// filtering is integration-agnostic.
#[async_trait]
pub trait SchedulingProvider: Send + Sync {
    /// Whether the integration is configured at all. When false the
    /// availability service goes straight to local generation.
    fn is_enabled(&self) -> bool;

    /// Query remote availability for `mentor` on `date`. May lazily
    /// provision a remote event type and return an empty list on that
    /// first call. Errors trigger the local fallback in the caller.
    async fn get_available_slots(
        &self,
        mentor: &MentorProfile,
        date: NaiveDate,
    ) -> Result<Vec<CandidateSlot>>;

    async fn create_booking(&self, request: &RemoteBookingRequest) -> RemoteBooking;

    /// Best-effort cancel; `Ok(false)` means the remote rejected it.
    async fn cancel_booking(&self, external_id: &str, reason: Option<&str>) -> Result<bool>;

    /// Move a remote booking. Callers treat any failure as hard: local
    /// state must not be updated when the remote move fails.
    async fn reschedule_booking(
        &self,
        external_id: &str,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> Result<bool>;
}
