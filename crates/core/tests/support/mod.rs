//! Shared in-memory mocks and fixtures for core service tests.

#![allow(dead_code)]

pub mod integrations;
pub mod repositories;

use chrono::{DateTime, NaiveDate, TimeZone, Utc, Weekday};
use mentorbook_domain::{
    AvailabilityWindow, CandidateSlot, DayAvailability, MentorProfile, SessionType,
    WeeklyAvailability,
};
use uuid::Uuid;

pub const MENTOR_ID: Uuid = Uuid::from_u128(0xA1);
pub const STUDENT_ID: Uuid = Uuid::from_u128(0xB2);

/// 2026-03-02 is a Monday.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

/// A mentor available Mondays 09:00-12:00 UTC, 30/60-minute sessions at
/// 2000 cents per hour.
pub fn mentor() -> MentorProfile {
    MentorProfile {
        id: MENTOR_ID,
        display_name: "Grace".to_string(),
        timezone: chrono_tz::UTC,
        hourly_rate_cents: 2000,
        session_durations: vec![30, 60],
        weekly_availability: WeeklyAvailability::default().with_day(
            Weekday::Mon,
            DayAvailability {
                available: true,
                windows: vec![AvailabilityWindow::new("09:00", "12:00")],
            },
        ),
        scheduling_handle: None,
    }
}

/// A slot on the test Monday, shaped the way the generator would emit it.
pub fn slot_at(h: u32, mi: u32, duration_minutes: i64) -> CandidateSlot {
    let start = utc(2026, 3, 2, h, mi);
    let end = start + chrono::Duration::minutes(duration_minutes);
    CandidateSlot {
        id: CandidateSlot::derive_id(MENTOR_ID, start, duration_minutes),
        start_time: start,
        end_time: end,
        date: monday(),
        duration_minutes,
        price_cents: 2000 * duration_minutes / 60,
        session_type: SessionType::Video,
        available: true,
    }
}
