//! Candidate slot types
//!
//! A [`CandidateSlot`] is an ephemeral, computed bookable window. Slots are
//! produced fresh on every availability query and never persisted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session modality. A single modality is supported today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    Video,
}

/// A candidate bookable time window derived from availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSlot {
    /// Stable for a given (mentor, start, duration) triple so repeated
    /// queries hand the client the same identifier.
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub date: NaiveDate,
    pub duration_minutes: i64,
    pub price_cents: i64,
    pub session_type: SessionType,
    pub available: bool,
}

impl CandidateSlot {
    /// Derive the stable slot identifier.
    pub fn derive_id(mentor_id: Uuid, start: DateTime<Utc>, duration_minutes: i64) -> String {
        format!("{}-{}-{}", mentor_id.simple(), start.timestamp(), duration_minutes)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn slot_id_is_stable_for_identical_inputs() {
        let mentor = Uuid::from_u128(42);
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

        let a = CandidateSlot::derive_id(mentor, start, 30);
        let b = CandidateSlot::derive_id(mentor, start, 30);
        assert_eq!(a, b);

        // Different duration at the same start is a different candidate
        let c = CandidateSlot::derive_id(mentor, start, 60);
        assert_ne!(a, c);
    }
}
