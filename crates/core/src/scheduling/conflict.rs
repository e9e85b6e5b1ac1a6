//! Conflict detection between candidate slots and existing bookings.
//!
//! The overlap test is closed-open: two intervals conflict iff
//! `a_start < b_end && b_start < a_end`. Touching endpoints never conflict,
//! so a slot ending exactly when a booking starts stays bookable.
//!
//! Filtering here is display-time advice only; the commit-time guarantee
//! lives in the session repository's atomic conflict-checked insert.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mentorbook_domain::{Booking, CandidateSlot, Result};
use tracing::debug;
use uuid::Uuid;

use crate::booking::ports::SessionRepository;

/// Closed-open interval overlap test.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// True when `slot` overlaps `booking`'s reserved interval.
pub fn slot_conflicts(slot: &CandidateSlot, booking: &Booking) -> bool {
    overlaps(slot.start_time, slot.end_time, booking.scheduled_time, booking.end_time())
}

/// Removes candidate slots that overlap a mentor's existing non-cancelled
/// bookings.
#[derive(Clone)]
pub struct ConflictFilter {
    sessions: Arc<dyn SessionRepository>,
}

impl ConflictFilter {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    /// Drop every candidate that overlaps any existing booking.
    ///
    /// A candidate conflicting with ANY booking is excluded; candidates at
    /// the same start with different durations are judged independently.
    pub async fn filter_conflicts(
        &self,
        slots: Vec<CandidateSlot>,
        mentor_id: Uuid,
    ) -> Result<Vec<CandidateSlot>> {
        let Some(range_start) = slots.iter().map(|s| s.start_time).min() else {
            return Ok(slots);
        };
        // max() exists whenever min() does
        let range_end = slots.iter().map(|s| s.end_time).max().unwrap_or(range_start);

        let bookings = self.sessions.find_for_range(mentor_id, range_start, range_end).await?;
        if bookings.is_empty() {
            return Ok(slots);
        }

        let before = slots.len();
        let remaining: Vec<CandidateSlot> = slots
            .into_iter()
            .filter(|slot| !bookings.iter().any(|b| slot_conflicts(slot, b)))
            .collect();

        debug!(
            %mentor_id,
            candidates = before,
            bookings = bookings.len(),
            remaining = remaining.len(),
            "filtered conflicting slots"
        );
        Ok(remaining)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn utc(h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, mi, 0).unwrap()
    }

    #[test]
    fn disjoint_intervals_do_not_overlap() {
        assert!(!overlaps(utc(9, 0), utc(9, 30), utc(10, 0), utc(10, 30)));
        assert!(!overlaps(utc(10, 0), utc(10, 30), utc(9, 0), utc(9, 30)));
    }

    #[test]
    fn touching_endpoints_do_not_overlap() {
        // [09:00, 09:30) then [09:30, 10:00) - adjacency is allowed
        assert!(!overlaps(utc(9, 0), utc(9, 30), utc(9, 30), utc(10, 0)));
        assert!(!overlaps(utc(9, 30), utc(10, 0), utc(9, 0), utc(9, 30)));
    }

    #[test]
    fn partial_and_contained_intervals_overlap() {
        assert!(overlaps(utc(9, 0), utc(10, 0), utc(9, 30), utc(10, 30)));
        assert!(overlaps(utc(9, 0), utc(10, 0), utc(9, 15), utc(9, 45)));
        assert!(overlaps(utc(9, 15), utc(9, 45), utc(9, 0), utc(10, 0)));
    }

    #[test]
    fn overlap_is_symmetric() {
        let cases = [
            (utc(9, 0), utc(9, 30), utc(9, 15), utc(9, 45)),
            (utc(9, 0), utc(9, 30), utc(9, 30), utc(10, 0)),
            (utc(9, 0), utc(12, 0), utc(10, 0), utc(10, 30)),
            (utc(9, 0), utc(9, 30), utc(11, 0), utc(11, 30)),
        ];
        for (a1, a2, b1, b2) in cases {
            assert_eq!(overlaps(a1, a2, b1, b2), overlaps(b1, b2, a1, a2));
        }
    }
}
