//! SQLite implementation of the SessionRepository port.
//!
//! The no-double-booking invariant is enforced here: conflict check and
//! insert/update run inside a single IMMEDIATE transaction, so SQLite's
//! writer lock serializes competing booking attempts for the same mentor.
//! An application-side re-query alone would be racy.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use mentorbook_core::{BookingListFilter, SessionRepository};
use mentorbook_domain::{
    Actor, Booking, BookingError, BookingStatus, MeetingProvider, RefundStatus, Result,
};
use rusqlite::types::Type;
use rusqlite::{params, Row, Transaction, TransactionBehavior};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::manager::SqlitePool;
use crate::errors::InfraError;

const BOOKING_COLUMNS: &str = "id, mentor_id, student_id, start_ts, end_ts, duration_minutes, \
     subject, notes, status, price_cents, payment_id, meeting_url, meeting_provider, \
     external_booking_id, cancellation_reason, cancelled_by, cancelled_at, refund_id, \
     refund_status, student_rating, mentor_rating, auto_decline_at, created_at, updated_at";

/// SQLite implementation of [`SessionRepository`].
pub struct SqliteSessionRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteSessionRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Count non-cancelled bookings for `mentor_id` overlapping
    /// `[start, end)` within the current transaction.
    fn overlap_count(
        tx: &Transaction<'_>,
        mentor_id: Uuid,
        start: i64,
        end: i64,
        exclude: Option<Uuid>,
    ) -> rusqlite::Result<i64> {
        // Closed-open overlap test: start_ts < end AND start < end_ts.
        // Touching endpoints do not conflict.
        tx.query_row(
            "SELECT COUNT(*) FROM bookings
             WHERE mentor_id = ?1
               AND status != 'cancelled'
               AND start_ts < ?2
               AND ?3 < end_ts
               AND (?4 IS NULL OR id != ?4)",
            params![
                mentor_id.to_string(),
                end,
                start,
                exclude.map(|id| id.to_string())
            ],
            |row| row.get(0),
        )
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    #[instrument(skip(self, booking), fields(booking_id = %booking.id, mentor_id = %booking.mentor_id))]
    async fn insert_if_free(&self, booking: &Booking) -> Result<()> {
        let mut conn = self.pool.get().map_err(InfraError::from)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(InfraError::from)?;

        let start = booking.scheduled_time.timestamp();
        let end = booking.end_time().timestamp();

        let conflicts = Self::overlap_count(&tx, booking.mentor_id, start, end, None)
            .map_err(InfraError::from)?;
        if conflicts > 0 {
            debug!(conflicts, "slot already taken, rejecting insert");
            return Err(BookingError::Conflict("slot overlaps an existing booking".into()));
        }

        tx.execute(
            &format!("INSERT INTO bookings ({BOOKING_COLUMNS}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
                  ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)"),
            params![
                booking.id.to_string(),
                booking.mentor_id.to_string(),
                booking.student_id.to_string(),
                start,
                end,
                booking.duration_minutes,
                booking.subject,
                booking.notes,
                booking.status.as_str(),
                booking.price_cents,
                booking.payment_id,
                booking.meeting_url,
                booking.meeting_provider.as_str(),
                booking.external_booking_id,
                booking.cancellation_reason,
                booking.cancelled_by.map(Actor::as_str),
                booking.cancelled_at.map(|t| t.timestamp()),
                booking.refund_id,
                booking.refund_status.map(RefundStatus::as_str),
                booking.student_rating,
                booking.mentor_rating,
                booking.auto_decline_at.map(|t| t.timestamp()),
                booking.created_at.timestamp(),
                booking.updated_at.timestamp(),
            ],
        )
        .map_err(InfraError::from)?;

        tx.commit().map_err(InfraError::from)?;
        debug!("booking inserted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reschedule_if_free(
        &self,
        booking_id: Uuid,
        new_start: DateTime<Utc>,
        new_duration_minutes: i64,
    ) -> Result<Booking> {
        let mut conn = self.pool.get().map_err(InfraError::from)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(InfraError::from)?;

        let mentor_id: String = tx
            .query_row(
                "SELECT mentor_id FROM bookings WHERE id = ?1",
                params![booking_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    BookingError::NotFound(format!("booking {booking_id}"))
                }
                other => InfraError::from(other).into(),
            })?;
        let mentor_id = parse_uuid(&mentor_id)?;

        let start = new_start.timestamp();
        let end = (new_start + Duration::minutes(new_duration_minutes)).timestamp();

        let conflicts = Self::overlap_count(&tx, mentor_id, start, end, Some(booking_id))
            .map_err(InfraError::from)?;
        if conflicts > 0 {
            return Err(BookingError::Conflict(
                "new slot overlaps an existing booking".into(),
            ));
        }

        tx.execute(
            "UPDATE bookings
             SET start_ts = ?2, end_ts = ?3, duration_minutes = ?4,
                 updated_at = CAST(strftime('%s','now') AS INTEGER)
             WHERE id = ?1",
            params![booking_id.to_string(), start, end, new_duration_minutes],
        )
        .map_err(InfraError::from)?;

        let booking = tx
            .query_row(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
                params![booking_id.to_string()],
                row_to_booking,
            )
            .map_err(InfraError::from)?;

        tx.commit().map_err(InfraError::from)?;
        debug!(booking_id = %booking_id, new_start = start, "booking rescheduled");
        Ok(booking)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let conn = self.pool.get().map_err(InfraError::from)?;
        let result = conn.query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id.to_string()],
            row_to_booking,
        );

        match result {
            Ok(booking) => Ok(Some(booking)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(InfraError::from(other).into()),
        }
    }

    #[instrument(skip(self))]
    async fn find_overlapping(
        &self,
        mentor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Booking>> {
        let conn = self.pool.get().map_err(InfraError::from)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings
                 WHERE mentor_id = ?1
                   AND status != 'cancelled'
                   AND start_ts < ?2
                   AND ?3 < end_ts
                   AND (?4 IS NULL OR id != ?4)
                 ORDER BY start_ts ASC"
            ))
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(
                params![
                    mentor_id.to_string(),
                    end.timestamp(),
                    start.timestamp(),
                    exclude.map(|id| id.to_string())
                ],
                row_to_booking,
            )
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        debug!(%mentor_id, count = rows.len(), "found overlapping bookings");
        Ok(rows)
    }

    async fn find_for_range(
        &self,
        mentor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        self.find_overlapping(mentor_id, start, end, None).await
    }

    #[instrument(skip(self, booking), fields(booking_id = %booking.id))]
    async fn update(&self, booking: &Booking) -> Result<()> {
        let conn = self.pool.get().map_err(InfraError::from)?;
        let changed = conn
            .execute(
                "UPDATE bookings SET
                     start_ts = ?2, end_ts = ?3, duration_minutes = ?4, subject = ?5,
                     notes = ?6, status = ?7, price_cents = ?8, payment_id = ?9,
                     meeting_url = ?10, meeting_provider = ?11, external_booking_id = ?12,
                     cancellation_reason = ?13, cancelled_by = ?14, cancelled_at = ?15,
                     refund_id = ?16, refund_status = ?17, student_rating = ?18,
                     mentor_rating = ?19, auto_decline_at = ?20, updated_at = ?21
                 WHERE id = ?1",
                params![
                    booking.id.to_string(),
                    booking.scheduled_time.timestamp(),
                    booking.end_time().timestamp(),
                    booking.duration_minutes,
                    booking.subject,
                    booking.notes,
                    booking.status.as_str(),
                    booking.price_cents,
                    booking.payment_id,
                    booking.meeting_url,
                    booking.meeting_provider.as_str(),
                    booking.external_booking_id,
                    booking.cancellation_reason,
                    booking.cancelled_by.map(Actor::as_str),
                    booking.cancelled_at.map(|t| t.timestamp()),
                    booking.refund_id,
                    booking.refund_status.map(RefundStatus::as_str),
                    booking.student_rating,
                    booking.mentor_rating,
                    booking.auto_decline_at.map(|t| t.timestamp()),
                    booking.updated_at.timestamp(),
                ],
            )
            .map_err(InfraError::from)?;

        if changed == 0 {
            return Err(BookingError::NotFound(format!("booking {}", booking.id)));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: BookingListFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Booking>> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        let status_clause = match filter {
            BookingListFilter::Upcoming => {
                "status IN ('pending_mentor_acceptance', 'confirmed') \
                 AND start_ts > CAST(strftime('%s','now') AS INTEGER)"
            }
            BookingListFilter::Completed => "status = 'completed'",
            BookingListFilter::Cancelled => "status = 'cancelled'",
        };

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings
                 WHERE (student_id = ?1 OR mentor_id = ?1) AND {status_clause}
                 ORDER BY start_ts DESC
                 LIMIT ?2 OFFSET ?3"
            ))
            .map_err(InfraError::from)?;

        let offset = i64::from(page.max(1) - 1) * i64::from(limit);
        let rows = stmt
            .query_map(params![user_id.to_string(), limit, offset], row_to_booking)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        Ok(rows)
    }
}

fn row_to_booking(row: &Row<'_>) -> rusqlite::Result<Booking> {
    let start_ts: i64 = row.get(3)?;
    let duration_minutes: i64 = row.get(5)?;

    Ok(Booking {
        id: parse_uuid_col(row, 0)?,
        mentor_id: parse_uuid_col(row, 1)?,
        student_id: parse_uuid_col(row, 2)?,
        scheduled_time: timestamp_col(start_ts, 3)?,
        duration_minutes,
        subject: row.get(6)?,
        notes: row.get(7)?,
        status: parse_enum_col(row, 8, BookingStatus::parse)?,
        price_cents: row.get(9)?,
        payment_id: row.get(10)?,
        meeting_url: row.get(11)?,
        meeting_provider: parse_enum_col(row, 12, MeetingProvider::parse)?,
        external_booking_id: row.get(13)?,
        cancellation_reason: row.get(14)?,
        cancelled_by: parse_optional_enum_col(row, 15, Actor::parse)?,
        cancelled_at: optional_timestamp_col(row, 16)?,
        refund_id: row.get(17)?,
        refund_status: parse_optional_enum_col(row, 18, RefundStatus::parse)?,
        student_rating: row.get(19)?,
        mentor_rating: row.get(20)?,
        auto_decline_at: optional_timestamp_col(row, 21)?,
        created_at: timestamp_col(row.get(22)?, 22)?,
        updated_at: timestamp_col(row.get(23)?, 23)?,
    })
}

fn column_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn parse_uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let value: String = row.get(idx)?;
    Uuid::parse_str(&value).map_err(|e| column_error(idx, format!("invalid uuid: {e}")))
}

fn parse_enum_col<T>(
    row: &Row<'_>,
    idx: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let value: String = row.get(idx)?;
    parse(&value).ok_or_else(|| column_error(idx, format!("unknown enum value: {value}")))
}

fn parse_optional_enum_col<T>(
    row: &Row<'_>,
    idx: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<Option<T>> {
    let value: Option<String> = row.get(idx)?;
    match value {
        None => Ok(None),
        Some(value) => parse(&value)
            .map(Some)
            .ok_or_else(|| column_error(idx, format!("unknown enum value: {value}"))),
    }
}

fn timestamp_col(ts: i64, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .ok_or_else(|| column_error(idx, format!("timestamp out of range: {ts}")))
}

fn optional_timestamp_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let value: Option<i64> = row.get(idx)?;
    value.map(|ts| timestamp_col(ts, idx)).transpose()
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| BookingError::Database(format!("invalid uuid in database: {e}")))
}
