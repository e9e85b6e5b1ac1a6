//! REST adapter for the remote scheduling service.
//!
//! Implements the `SchedulingProvider` port. Every remote response is
//! normalized into domain [`CandidateSlot`]s here so the core never sees
//! wire types. Event types are provisioned lazily: mentors without a
//! remote event type get one created on their first availability query.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mentorbook_core::{derive_price, RemoteBooking, RemoteBookingRequest, SchedulingProvider};
use mentorbook_domain::{
    BookingError, CandidateSlot, MentorProfile, Result, SchedulingConfig, SchedulingHandle,
};
use reqwest::{Method, Response, StatusCode};
use serde_json::json;
use tracing::{debug, info, warn};

use super::types::{
    ApiErrorBody, CreateEventTypeRequest, CreateEventTypeResponse, CreateRemoteBookingBody,
    EventTypesResponse, RemoteBookingResponse, SlotsResponse,
};
use crate::http::HttpClient;

pub struct SchedulingClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
    enabled: bool,
    /// Event types provisioned during this process lifetime, keyed by the
    /// mentor's remote user id. The profile service persists the id out of
    /// band; this cache just avoids re-provisioning in the meantime.
    provisioned: Mutex<HashMap<String, i64>>,
}

impl SchedulingClient {
    pub fn new(config: &SchedulingConfig) -> Result<Self> {
        let http = HttpClient::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            enabled: config.enabled && config.api_key.is_some(),
            provisioned: Mutex::new(HashMap::new()),
        })
    }

    #[cfg(test)]
    fn for_tests(base_url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(Duration::from_secs(5)).unwrap(),
            base_url: base_url.into(),
            api_key: "test-key".to_string(),
            enabled: true,
            provisioned: Mutex::new(HashMap::new()),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http.request(method, self.endpoint(path)).bearer_auth(&self.api_key)
    }

    /// Resolve the remote event type for a mentor, provisioning one when
    /// none exists yet. Returns `None` when an event type was just created,
    /// in which case the current availability query reports no slots.
    async fn resolve_event_type(
        &self,
        mentor: &MentorProfile,
        handle: &SchedulingHandle,
    ) -> Result<Option<i64>> {
        if let Some(id) = handle.event_type_id {
            return Ok(Some(id));
        }
        if let Some(id) = self.provisioned.lock().expect("poisoned").get(&handle.remote_user_id) {
            return Ok(Some(*id));
        }

        let duration = mentor.session_durations.iter().copied().min().unwrap_or(60);

        // Reuse a matching remote event type when one already exists.
        let response = self
            .http
            .send(
                self.request(Method::GET, "/event-types")
                    .query(&[("username", handle.remote_user_id.as_str())]),
            )
            .await?;
        if response.status().is_success() {
            let listed: EventTypesResponse = response.json().await.map_err(decode_error)?;
            if let Some(existing) = listed.event_types.iter().find(|et| et.length == duration) {
                self.provisioned
                    .lock()
                    .expect("poisoned")
                    .insert(handle.remote_user_id.clone(), existing.id);
                return Ok(Some(existing.id));
            }
        }

        let created = self
            .http
            .send(self.request(Method::POST, "/event-types").json(&CreateEventTypeRequest {
                title: format!("Mentoring with {}", mentor.display_name),
                slug: format!("mentoring-{}min", duration),
                length: duration,
            }))
            .await?;
        let created = expect_success(created).await?;
        let created: CreateEventTypeResponse = created.json().await.map_err(decode_error)?;

        info!(
            mentor_id = %mentor.id,
            event_type_id = created.event_type.id,
            "provisioned remote event type"
        );
        self.provisioned
            .lock()
            .expect("poisoned")
            .insert(handle.remote_user_id.clone(), created.event_type.id);
        Ok(None)
    }
}

#[async_trait]
impl SchedulingProvider for SchedulingClient {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn get_available_slots(
        &self,
        mentor: &MentorProfile,
        date: NaiveDate,
    ) -> Result<Vec<CandidateSlot>> {
        let handle = mentor.scheduling_handle.as_ref().ok_or_else(|| {
            BookingError::Integration("mentor has no remote scheduling handle".into())
        })?;

        let Some(event_type_id) = self.resolve_event_type(mentor, handle).await? else {
            // Freshly provisioned event type has nothing bookable yet.
            return Ok(Vec::new());
        };

        let response = self
            .http
            .send(self.request(Method::GET, "/slots").query(&[
                ("eventTypeId", event_type_id.to_string()),
                ("dateFrom", date.to_string()),
                ("dateTo", date.to_string()),
            ]))
            .await?;
        let response = expect_success(response).await?;
        let body: SlotsResponse = response.json().await.map_err(decode_error)?;

        let mut slots: Vec<CandidateSlot> = body
            .slots
            .into_iter()
            .filter_map(|slot| {
                let duration = (slot.end - slot.start).num_minutes();
                if !mentor.session_durations.contains(&duration) {
                    debug!(
                        mentor_id = %mentor.id,
                        duration,
                        "remote slot length not offered by mentor, dropping"
                    );
                    return None;
                }
                Some(CandidateSlot {
                    id: CandidateSlot::derive_id(mentor.id, slot.start, duration),
                    start_time: slot.start,
                    end_time: slot.end,
                    date,
                    duration_minutes: duration,
                    price_cents: derive_price(mentor.hourly_rate_cents, duration),
                    session_type: Default::default(),
                    available: true,
                })
            })
            .collect();
        slots.sort_by_key(|slot| (slot.start_time, slot.duration_minutes));

        debug!(mentor_id = %mentor.id, %date, count = slots.len(), "remote slots fetched");
        Ok(slots)
    }

    async fn create_booking(&self, request: &RemoteBookingRequest) -> RemoteBooking {
        let Some(event_type_id) = request.event_type_id else {
            return RemoteBooking::failed("mentor has no provisioned event type");
        };

        let body = CreateRemoteBookingBody {
            event_type_id,
            start: request.start,
            end: request.end,
            title: request.title.clone(),
            attendee: request.remote_user_id.clone(),
        };

        let response =
            match self.http.send(self.request(Method::POST, "/bookings").json(&body)).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(mentor_id = %request.mentor_id, error = %err, "remote booking create failed");
                    return RemoteBooking::failed(err.to_string());
                }
            };

        if !response.status().is_success() {
            let status = response.status();
            let message = error_message(response).await;
            warn!(mentor_id = %request.mentor_id, %status, message, "remote rejected booking create");
            return RemoteBooking::failed(format!("remote returned {status}: {message}"));
        }

        match response.json::<RemoteBookingResponse>().await {
            Ok(booking) => RemoteBooking {
                success: true,
                external_booking_id: Some(booking.uid),
                meeting_url: booking.meeting_url,
                error: None,
            },
            Err(err) => RemoteBooking::failed(format!("unreadable booking response: {err}")),
        }
    }

    async fn cancel_booking(&self, external_id: &str, reason: Option<&str>) -> Result<bool> {
        let response = self
            .http
            .send(
                self.request(Method::DELETE, &format!("/bookings/{external_id}/cancel"))
                    .json(&json!({ "reason": reason })),
            )
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if status.is_client_error() {
            warn!(external_id, %status, "remote rejected booking cancel");
            return Ok(false);
        }
        Err(BookingError::Integration(format!("cancel failed with status {status}")))
    }

    async fn reschedule_booking(
        &self,
        external_id: &str,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> Result<bool> {
        let response = self
            .http
            .send(
                self.request(Method::PATCH, &format!("/bookings/{external_id}"))
                    .json(&json!({ "start": new_start, "end": new_end })),
            )
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if status.is_client_error() {
            warn!(external_id, %status, "remote rejected booking reschedule");
            return Ok(false);
        }
        Err(BookingError::Integration(format!("reschedule failed with status {status}")))
    }
}

async fn expect_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = error_message(response).await;
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(BookingError::Integration(format!("authentication rejected: {message}")));
    }
    Err(BookingError::Integration(format!("remote returned {status}: {message}")))
}

async fn error_message(response: Response) -> String {
    response
        .json::<ApiErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| "no error detail".to_string())
}

fn decode_error(err: reqwest::Error) -> BookingError {
    BookingError::Integration(format!("unreadable scheduling response: {err}"))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Weekday};
    use mentorbook_domain::{AvailabilityWindow, DayAvailability, WeeklyAvailability};
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn mentor(event_type_id: Option<i64>) -> MentorProfile {
        MentorProfile {
            id: Uuid::from_u128(0xA1),
            display_name: "Ada".to_string(),
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
            scheduling_handle: Some(SchedulingHandle {
                remote_user_id: "ada".to_string(),
                event_type_id,
            }),
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[tokio::test]
    async fn slots_are_normalized_with_price_and_stable_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slots"))
            .and(query_param("eventTypeId", "7"))
            .and(query_param("dateFrom", "2026-03-02"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "slots": [
                    { "start": "2026-03-02T10:00:00Z", "end": "2026-03-02T10:30:00Z" },
                    { "start": "2026-03-02T09:00:00Z", "end": "2026-03-02T10:00:00Z" },
                    // 45 minutes, not offered by this mentor
                    { "start": "2026-03-02T11:00:00Z", "end": "2026-03-02T11:45:00Z" }
                ]
            })))
            .mount(&server)
            .await;

        let client = SchedulingClient::for_tests(server.uri());
        let mentor = mentor(Some(7));
        let slots = client.get_available_slots(&mentor, monday()).await.unwrap();

        assert_eq!(slots.len(), 2);
        // Sorted by start time
        assert_eq!(slots[0].start_time, Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
        assert_eq!(slots[0].duration_minutes, 60);
        assert_eq!(slots[0].price_cents, 2000);
        assert_eq!(slots[1].duration_minutes, 30);
        assert_eq!(slots[1].price_cents, 1000);
        assert_eq!(
            slots[1].id,
            CandidateSlot::derive_id(mentor.id, slots[1].start_time, 30)
        );
    }

    #[tokio::test]
    async fn first_query_provisions_event_type_and_returns_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/event-types"))
            .and(query_param("username", "ada"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "eventTypes": [] })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/event-types"))
            .and(body_partial_json(json!({ "length": 30 })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "eventType": { "id": 99, "length": 30 }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slots"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "slots": [
                { "start": "2026-03-02T09:00:00Z", "end": "2026-03-02T09:30:00Z" }
            ] })))
            .mount(&server)
            .await;

        let client = SchedulingClient::for_tests(server.uri());
        let mentor = mentor(None);

        // First call provisions and reports nothing bookable
        let first = client.get_available_slots(&mentor, monday()).await.unwrap();
        assert!(first.is_empty());

        // Second call uses the cached event type
        let second = client.get_available_slots(&mentor, monday()).await.unwrap();
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn existing_remote_event_type_is_reused() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/event-types"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "eventTypes": [ { "id": 12, "length": 30 }, { "id": 13, "length": 60 } ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slots"))
            .and(query_param("eventTypeId", "12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "slots": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SchedulingClient::for_tests(server.uri());
        let slots = client.get_available_slots(&mentor(None), monday()).await.unwrap();
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn booking_create_success_carries_uid_and_meeting_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bookings"))
            .and(body_partial_json(json!({ "eventTypeId": 7 })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "uid": "bk_abc",
                "meetingUrl": "https://video.example/abc"
            })))
            .mount(&server)
            .await;

        let client = SchedulingClient::for_tests(server.uri());
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let outcome = client
            .create_booking(&RemoteBookingRequest {
                mentor_id: Uuid::from_u128(0xA1),
                remote_user_id: "ada".to_string(),
                event_type_id: Some(7),
                title: "Lifetime annotations".to_string(),
                start,
                end: start + chrono::Duration::minutes(60),
            })
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.external_booking_id.as_deref(), Some("bk_abc"));
        assert_eq!(outcome.meeting_url.as_deref(), Some("https://video.example/abc"));
    }

    #[tokio::test]
    async fn booking_create_rejection_is_a_structured_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bookings"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({ "message": "slot taken" })),
            )
            .mount(&server)
            .await;

        let client = SchedulingClient::for_tests(server.uri());
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let outcome = client
            .create_booking(&RemoteBookingRequest {
                mentor_id: Uuid::from_u128(0xA1),
                remote_user_id: "ada".to_string(),
                event_type_id: Some(7),
                title: "Lifetime annotations".to_string(),
                start,
                end: start + chrono::Duration::minutes(30),
            })
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("slot taken"));
    }

    #[tokio::test]
    async fn cancel_maps_client_rejection_to_false() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/bookings/bk_abc/cancel"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = SchedulingClient::for_tests(server.uri());
        let cancelled = client.cancel_booking("bk_abc", Some("illness")).await.unwrap();
        assert!(!cancelled);
    }

    #[tokio::test]
    async fn reschedule_success_returns_true() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/bookings/bk_abc"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = SchedulingClient::for_tests(server.uri());
        let start = Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap();
        let moved = client
            .reschedule_booking("bk_abc", start, start + chrono::Duration::minutes(30))
            .await
            .unwrap();
        assert!(moved);
    }
}
