//! SQLite-backed mentor and student read model.
//!
//! Profiles are managed elsewhere; the booking flow only reads them. The
//! seeding helpers exist for tests and local bootstrap.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use mentorbook_core::MentorDirectory;
use mentorbook_domain::{MentorProfile, Result, SchedulingHandle, WeeklyAvailability};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tracing::instrument;
use uuid::Uuid;

use super::manager::SqlitePool;
use crate::errors::InfraError;

pub struct SqliteMentorDirectory {
    pool: Arc<SqlitePool>,
}

impl SqliteMentorDirectory {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Upsert a mentor profile. Availability and session durations are
    /// stored as JSON documents.
    pub fn insert_mentor(&self, mentor: &MentorProfile) -> Result<()> {
        let conn = self.pool.get().map_err(InfraError::from)?;
        conn.execute(
            "INSERT INTO mentors (id, display_name, timezone, hourly_rate_cents, \
                 session_durations, weekly_availability, remote_user_id, \
                 remote_event_type_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                 display_name = excluded.display_name,
                 timezone = excluded.timezone,
                 hourly_rate_cents = excluded.hourly_rate_cents,
                 session_durations = excluded.session_durations,
                 weekly_availability = excluded.weekly_availability,
                 remote_user_id = excluded.remote_user_id,
                 remote_event_type_id = excluded.remote_event_type_id",
            params![
                mentor.id.to_string(),
                mentor.display_name,
                mentor.timezone.name(),
                mentor.hourly_rate_cents,
                serde_json::to_string(&mentor.session_durations).map_err(InfraError::from)?,
                serde_json::to_string(&mentor.weekly_availability).map_err(InfraError::from)?,
                mentor.scheduling_handle.as_ref().map(|h| h.remote_user_id.clone()),
                mentor.scheduling_handle.as_ref().and_then(|h| h.event_type_id),
                Utc::now().timestamp(),
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    pub fn insert_student(&self, id: Uuid, display_name: &str) -> Result<()> {
        let conn = self.pool.get().map_err(InfraError::from)?;
        conn.execute(
            "INSERT OR IGNORE INTO students (id, display_name, email, created_at)
             VALUES (?1, ?2, NULL, ?3)",
            params![id.to_string(), display_name, Utc::now().timestamp()],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }
}

#[async_trait]
impl MentorDirectory for SqliteMentorDirectory {
    #[instrument(skip(self))]
    async fn get_mentor(&self, id: Uuid) -> Result<Option<MentorProfile>> {
        let conn = self.pool.get().map_err(InfraError::from)?;
        let mentor = conn
            .query_row(
                "SELECT id, display_name, timezone, hourly_rate_cents, session_durations, \
                     weekly_availability, remote_user_id, remote_event_type_id
                 FROM mentors WHERE id = ?1",
                params![id.to_string()],
                row_to_mentor,
            )
            .optional()
            .map_err(InfraError::from)?;
        Ok(mentor)
    }

    async fn student_exists(&self, id: Uuid) -> Result<bool> {
        let conn = self.pool.get().map_err(InfraError::from)?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM students WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(InfraError::from)?;
        Ok(found.is_some())
    }
}

fn row_to_mentor(row: &Row<'_>) -> rusqlite::Result<MentorProfile> {
    let id: String = row.get(0)?;
    let timezone: String = row.get(2)?;
    let durations_json: String = row.get(4)?;
    let availability_json: String = row.get(5)?;
    let remote_user_id: Option<String> = row.get(6)?;
    let event_type_id: Option<i64> = row.get(7)?;

    Ok(MentorProfile {
        id: Uuid::parse_str(&id).map_err(|e| column_error(0, format!("invalid uuid: {e}")))?,
        display_name: row.get(1)?,
        timezone: Tz::from_str(&timezone)
            .map_err(|e| column_error(2, format!("unknown timezone: {e}")))?,
        hourly_rate_cents: row.get(3)?,
        session_durations: serde_json::from_str(&durations_json)
            .map_err(|e| column_error(4, format!("bad session_durations json: {e}")))?,
        weekly_availability: serde_json::from_str::<WeeklyAvailability>(&availability_json)
            .map_err(|e| column_error(5, format!("bad weekly_availability json: {e}")))?,
        scheduling_handle: remote_user_id.map(|remote_user_id| SchedulingHandle {
            remote_user_id,
            event_type_id,
        }),
    })
}

fn column_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}
