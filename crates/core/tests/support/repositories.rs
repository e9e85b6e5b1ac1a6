//! In-memory repository mocks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mentorbook_core::scheduling::conflict::overlaps;
use mentorbook_core::{BookingListFilter, MentorDirectory, SessionRepository};
use mentorbook_domain::{Booking, BookingError, BookingStatus, MentorProfile, Result};
use uuid::Uuid;

/// In-memory `SessionRepository`.
///
/// The mutex makes the check-then-insert in `insert_if_free` atomic, which
/// is exactly the serialization the SQLite implementation gets from its
/// IMMEDIATE transaction.
#[derive(Default, Clone)]
pub struct MockSessionRepository {
    bookings: Arc<Mutex<Vec<Booking>>>,
    failing_updates: Arc<Mutex<usize>>,
}

impl MockSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` calls to `update` fail with a database error.
    pub fn fail_next_updates(&self, n: usize) {
        *self.failing_updates.lock().unwrap() = n;
    }

    pub fn with_booking(self, booking: Booking) -> Self {
        self.bookings.lock().unwrap().push(booking);
        self
    }

    pub fn stored(&self, id: Uuid) -> Option<Booking> {
        self.bookings.lock().unwrap().iter().find(|b| b.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.bookings.lock().unwrap().len()
    }

    fn conflicts_locked(
        bookings: &[Booking],
        mentor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> bool {
        bookings.iter().any(|b| {
            b.mentor_id == mentor_id
                && b.status != BookingStatus::Cancelled
                && Some(b.id) != exclude
                && overlaps(start, end, b.scheduled_time, b.end_time())
        })
    }
}

#[async_trait]
impl SessionRepository for MockSessionRepository {
    async fn insert_if_free(&self, booking: &Booking) -> Result<()> {
        let mut bookings = self.bookings.lock().unwrap();
        if Self::conflicts_locked(
            &bookings,
            booking.mentor_id,
            booking.scheduled_time,
            booking.end_time(),
            None,
        ) {
            return Err(BookingError::Conflict("slot already booked".into()));
        }
        bookings.push(booking.clone());
        Ok(())
    }

    async fn reschedule_if_free(
        &self,
        booking_id: Uuid,
        new_start: DateTime<Utc>,
        new_duration_minutes: i64,
    ) -> Result<Booking> {
        let mut bookings = self.bookings.lock().unwrap();
        let new_end = new_start + Duration::minutes(new_duration_minutes);
        let mentor_id = bookings
            .iter()
            .find(|b| b.id == booking_id)
            .map(|b| b.mentor_id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {booking_id}")))?;

        if Self::conflicts_locked(&bookings, mentor_id, new_start, new_end, Some(booking_id)) {
            return Err(BookingError::Conflict("slot already booked".into()));
        }

        let booking = bookings.iter_mut().find(|b| b.id == booking_id).unwrap();
        booking.scheduled_time = new_start;
        booking.duration_minutes = new_duration_minutes;
        Ok(booking.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        Ok(self.bookings.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn find_overlapping(
        &self,
        mentor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Booking>> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| {
                b.mentor_id == mentor_id
                    && b.status != BookingStatus::Cancelled
                    && Some(b.id) != exclude
                    && overlaps(start, end, b.scheduled_time, b.end_time())
            })
            .cloned()
            .collect())
    }

    async fn find_for_range(
        &self,
        mentor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        self.find_overlapping(mentor_id, start, end, None).await
    }

    async fn update(&self, booking: &Booking) -> Result<()> {
        {
            let mut failing = self.failing_updates.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(BookingError::Database("simulated write failure".into()));
            }
        }
        let mut bookings = self.bookings.lock().unwrap();
        let stored = bookings
            .iter_mut()
            .find(|b| b.id == booking.id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", booking.id)))?;
        *stored = booking.clone();
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: BookingListFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Booking>> {
        let now = Utc::now();
        let mut matching: Vec<Booking> = self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.student_id == user_id || b.mentor_id == user_id)
            .filter(|b| match filter {
                BookingListFilter::Upcoming => {
                    !b.status.is_terminal() && b.scheduled_time > now
                }
                BookingListFilter::Completed => b.status == BookingStatus::Completed,
                BookingListFilter::Cancelled => b.status == BookingStatus::Cancelled,
            })
            .cloned()
            .collect();
        matching.sort_by_key(|b| std::cmp::Reverse(b.scheduled_time));

        let offset = ((page.max(1) - 1) * limit) as usize;
        Ok(matching.into_iter().skip(offset).take(limit as usize).collect())
    }
}

/// In-memory `MentorDirectory`.
#[derive(Default, Clone)]
pub struct MockMentorDirectory {
    mentors: Arc<Mutex<HashMap<Uuid, MentorProfile>>>,
    students: Arc<Mutex<Vec<Uuid>>>,
}

impl MockMentorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mentor(self, mentor: MentorProfile) -> Self {
        self.mentors.lock().unwrap().insert(mentor.id, mentor);
        self
    }

    pub fn with_student(self, id: Uuid) -> Self {
        self.students.lock().unwrap().push(id);
        self
    }
}

#[async_trait]
impl MentorDirectory for MockMentorDirectory {
    async fn get_mentor(&self, id: Uuid) -> Result<Option<MentorProfile>> {
        Ok(self.mentors.lock().unwrap().get(&id).cloned())
    }

    async fn student_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.students.lock().unwrap().contains(&id))
    }
}
