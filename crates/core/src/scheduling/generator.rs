//! Slot generator - expands recurring weekly availability into concrete,
//! bookable candidate slots for a single calendar date.
//!
//! The generator is pure: given identical inputs (including `now`) it
//! produces identical, order-stable output. This is also the single place
//! where mentor wall-clock times are converted to UTC instants; everything
//! downstream works in UTC only.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use mentorbook_domain::constants::DEFAULT_SESSION_DURATIONS;
use mentorbook_domain::{AvailabilityWindow, CandidateSlot, MentorProfile, SessionType};
use tracing::{debug, warn};

/// Expands one day's recurring availability into candidate slots.
#[derive(Debug, Clone)]
pub struct SlotGenerator {
    min_lead_time: Duration,
}

impl SlotGenerator {
    /// Create a generator with the given minimum lead time in minutes.
    pub fn new(min_lead_time_minutes: i64) -> Self {
        Self { min_lead_time: Duration::minutes(min_lead_time_minutes) }
    }

    /// Earliest instant a slot may start, as seen from `now`. Every slot
    /// list served to clients honors this cutoff, whatever its source.
    pub fn lead_time_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.min_lead_time
    }

    /// Generate all candidate slots for `mentor` on `date`.
    ///
    /// "No availability" is a normal outcome, not an error: a past date, an
    /// unavailable weekday, or a day without windows all yield an empty
    /// list. Malformed windows are skipped individually so one bad entry
    /// cannot abort the rest of the day.
    pub fn generate(
        &self,
        mentor: &MentorProfile,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Vec<CandidateSlot> {
        let today = now.with_timezone(&mentor.timezone).date_naive();
        if date < today {
            debug!(mentor_id = %mentor.id, %date, "requested date is in the past, no slots");
            return Vec::new();
        }

        let day = mentor.weekly_availability.day(date.weekday());
        if !day.available || day.windows.is_empty() {
            return Vec::new();
        }

        let durations: &[i64] = if mentor.session_durations.is_empty() {
            &DEFAULT_SESSION_DURATIONS
        } else {
            &mentor.session_durations
        };

        let cutoff = self.lead_time_cutoff(now);
        let mut slots = Vec::new();

        for window in &day.windows {
            let Some((window_start, window_end)) = self.resolve_window(mentor, date, window) else {
                continue;
            };

            for &duration in durations {
                if duration <= 0 {
                    continue;
                }
                let step = Duration::minutes(duration);
                let price_cents = derive_price(mentor.hourly_rate_cents, duration);

                // Enumerate consecutive windows from the interval start;
                // slots are anchored there, never at the lead-time cutoff.
                let mut start = window_start;
                while start + step <= window_end {
                    if start >= cutoff {
                        slots.push(CandidateSlot {
                            id: CandidateSlot::derive_id(mentor.id, start, duration),
                            start_time: start,
                            end_time: start + step,
                            date,
                            duration_minutes: duration,
                            price_cents,
                            session_type: SessionType::Video,
                            available: true,
                        });
                    }
                    start += step;
                }
            }
        }

        slots.sort_by_key(|s| (s.start_time, s.duration_minutes));

        debug!(mentor_id = %mentor.id, %date, count = slots.len(), "generated candidate slots");
        slots
    }

    /// Parse a window's wall-clock bounds and anchor them to `date` in the
    /// mentor's timezone. Returns `None` (and logs) for malformed or
    /// DST-unresolvable windows.
    fn resolve_window(
        &self,
        mentor: &MentorProfile,
        date: NaiveDate,
        window: &AvailabilityWindow,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = parse_wall_clock(&window.start)?;
        let end = parse_wall_clock(&window.end)?;
        if start >= end {
            warn!(
                mentor_id = %mentor.id,
                window_id = %window.id,
                start = %window.start,
                end = %window.end,
                "availability window start is not before end, skipping"
            );
            return None;
        }

        let localize = |time: NaiveTime| {
            mentor.timezone.from_local_datetime(&date.and_time(time)).single()
        };
        match (localize(start), localize(end)) {
            (Some(s), Some(e)) => Some((s.with_timezone(&Utc), e.with_timezone(&Utc))),
            _ => {
                warn!(
                    mentor_id = %mentor.id,
                    window_id = %window.id,
                    %date,
                    "window does not resolve to an unambiguous local time, skipping"
                );
                None
            }
        }
    }
}

/// Price a slot: hourly rate prorated to the duration, rounded to the
/// nearest cent.
pub fn derive_price(hourly_rate_cents: i64, duration_minutes: i64) -> i64 {
    (hourly_rate_cents * duration_minutes + 30) / 60
}

fn parse_wall_clock(value: &str) -> Option<NaiveTime> {
    match NaiveTime::parse_from_str(value, "%H:%M") {
        Ok(time) => Some(time),
        Err(err) => {
            warn!(value, error = %err, "unparseable wall-clock time in availability window");
            None
        }
    }
}
