//! Availability service - resolves a mentor's bookable slots for a date.
//!
//! Resolution is a tagged outcome rather than nested error handling: the
//! remote scheduling service either answered (`Remote`), local generation
//! took over (`Fallback`), or the mentor simply has nothing bookable
//! (`Unavailable`). Remote failures never propagate to the caller; local
//! scheduling keeps working when the integration is degraded.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use mentorbook_domain::{CandidateSlot, MentorProfile, Result};
use tracing::{debug, warn};

use super::ports::SchedulingProvider;
use crate::scheduling::conflict::ConflictFilter;
use crate::scheduling::generator::SlotGenerator;

/// How a slot list was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotResolution {
    /// The remote scheduling service answered.
    Remote(Vec<CandidateSlot>),
    /// Local generation from the mentor's weekly availability.
    Fallback(Vec<CandidateSlot>),
    /// The mentor has no recurring availability to draw from.
    Unavailable,
}

impl SlotResolution {
    pub fn source(&self) -> &'static str {
        match self {
            Self::Remote(_) => "remote",
            Self::Fallback(_) => "fallback",
            Self::Unavailable => "unavailable",
        }
    }

    pub fn into_slots(self) -> Vec<CandidateSlot> {
        match self {
            Self::Remote(slots) | Self::Fallback(slots) => slots,
            Self::Unavailable => Vec::new(),
        }
    }
}

/// Resolves availability and filters out conflicting candidates.
#[derive(Clone)]
pub struct AvailabilityService {
    provider: Arc<dyn SchedulingProvider>,
    generator: SlotGenerator,
    conflicts: ConflictFilter,
}

impl AvailabilityService {
    pub fn new(
        provider: Arc<dyn SchedulingProvider>,
        generator: SlotGenerator,
        conflicts: ConflictFilter,
    ) -> Self {
        Self { provider, generator, conflicts }
    }

    /// Resolve raw candidates for `mentor` on `date`, before conflict
    /// filtering.
    pub async fn resolve(
        &self,
        mentor: &MentorProfile,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> SlotResolution {
        if self.provider.is_enabled() && mentor.scheduling_handle.is_some() {
            match self.provider.get_available_slots(mentor, date).await {
                Ok(slots) => {
                    // The lead-time floor holds for every served slot, so
                    // remote answers get the same cutoff the generator
                    // applies to its own output.
                    let cutoff = self.generator.lead_time_cutoff(now);
                    let total = slots.len();
                    let slots: Vec<CandidateSlot> =
                        slots.into_iter().filter(|s| s.start_time >= cutoff).collect();
                    debug!(
                        mentor_id = %mentor.id,
                        %date,
                        count = slots.len(),
                        dropped = total - slots.len(),
                        "remote availability"
                    );
                    return SlotResolution::Remote(slots);
                }
                Err(err) => {
                    warn!(
                        mentor_id = %mentor.id,
                        %date,
                        error = %err,
                        "scheduling service unavailable, falling back to local generation"
                    );
                }
            }
        }

        if mentor.weekly_availability.is_empty() {
            return SlotResolution::Unavailable;
        }
        SlotResolution::Fallback(self.generator.generate(mentor, date, now))
    }

    /// Full availability query: resolve, then drop candidates overlapping
    /// existing bookings. Returns the final slot list plus its source tag.
    pub async fn available_slots(
        &self,
        mentor: &MentorProfile,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(Vec<CandidateSlot>, &'static str)> {
        let resolution = self.resolve(mentor, date, now).await;
        let source = resolution.source();
        let slots = self.conflicts.filter_conflicts(resolution.into_slots(), mentor.id).await?;
        Ok((slots, source))
    }
}
