//! Session (booking) HTTP handlers.
//!
//! All responses share the `{ success, message, data }` envelope. The
//! acting user arrives in the `x-user-id` header; authentication itself
//! is terminated upstream.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use mentorbook_core::{BookingListFilter, CreateBookingRequest, MentorDirectory};
use mentorbook_domain::constants::DEFAULT_PAGE_LIMIT;
use mentorbook_domain::{BookingError, CandidateSlot};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

type ApiResult = std::result::Result<Json<Value>, ApiError>;

fn envelope(message: &str, data: impl Serialize) -> Json<Value> {
    Json(json!({ "success": true, "message": message, "data": data }))
}

/// Pull the acting user out of the `x-user-id` header.
fn actor_id(headers: &HeaderMap) -> std::result::Result<Uuid, ApiError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| BookingError::Authorization("missing x-user-id header".to_string()))?;
    Uuid::parse_str(raw).map_err(|_| {
        ApiError(BookingError::Authorization("malformed x-user-id header".to_string()))
    })
}

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsRequest {
    pub mentor_id: Uuid,
    /// Calendar date in the mentor's timezone, `YYYY-MM-DD`.
    pub date: NaiveDate,
}

pub async fn available_slots(
    State(state): State<AppState>,
    Json(request): Json<AvailableSlotsRequest>,
) -> ApiResult {
    let mentor = state
        .directory
        .get_mentor(request.mentor_id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("mentor {}", request.mentor_id)))?;

    let (slots, source) =
        state.availability.available_slots(&mentor, request.date, Utc::now()).await?;
    Ok(envelope("available slots", json!({ "slots": slots, "source": source })))
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub mentor_id: Uuid,
    pub time_slot: CandidateSlot,
    pub subject: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub payment_method_id: String,
}

pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult {
    let student_id = actor_id(&headers)?;
    let booking = state
        .bookings
        .create(
            CreateBookingRequest {
                mentor_id: request.mentor_id,
                student_id,
                slot: request.time_slot,
                subject: request.subject,
                notes: request.notes,
                payment_method_id: request.payment_method_id,
            },
            Utc::now(),
        )
        .await?;
    Ok(envelope("booking created", booking))
}

pub async fn get_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let booking = state.bookings.get(id).await?;
    Ok(envelope("booking", booking))
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelSessionRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn cancel_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Option<Json<CancelSessionRequest>>,
) -> ApiResult {
    let actor = actor_id(&headers)?;
    let reason = body.and_then(|Json(request)| request.reason);
    let booking = state.bookings.cancel(id, actor, reason, Utc::now()).await?;
    Ok(envelope("booking cancelled", booking))
}

#[derive(Debug, Deserialize)]
pub struct RescheduleSessionRequest {
    pub new_time_slot: CandidateSlot,
}

pub async fn reschedule_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<RescheduleSessionRequest>,
) -> ApiResult {
    let actor = actor_id(&headers)?;
    let booking =
        state.bookings.reschedule(id, actor, request.new_time_slot, Utc::now()).await?;
    Ok(envelope("booking rescheduled", booking))
}

#[derive(Debug, Deserialize)]
pub struct AcceptSessionRequest {
    pub meeting_url: String,
}

pub async fn accept_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<AcceptSessionRequest>,
) -> ApiResult {
    let actor = actor_id(&headers)?;
    let booking = state.bookings.accept(id, actor, request.meeting_url, Utc::now()).await?;
    Ok(envelope("booking accepted", booking))
}

pub async fn decline_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Option<Json<CancelSessionRequest>>,
) -> ApiResult {
    let actor = actor_id(&headers)?;
    let reason = body.and_then(|Json(request)| request.reason);
    let booking = state.bookings.decline(id, actor, reason, Utc::now()).await?;
    Ok(envelope("booking declined", booking))
}

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    #[serde(default)]
    pub status: Option<BookingListFilter>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

pub async fn list_user_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<ListSessionsQuery>,
) -> ApiResult {
    let filter = query.status.unwrap_or(BookingListFilter::Upcoming);
    let bookings =
        state.bookings.list_for_user(user_id, filter, query.page, query.limit).await?;
    Ok(envelope(
        "bookings",
        json!({ "bookings": bookings, "page": query.page.max(1) }),
    ))
}
