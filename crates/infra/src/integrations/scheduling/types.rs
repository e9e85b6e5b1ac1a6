//! Wire types for the remote scheduling service API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct EventType {
    pub id: i64,
    /// Session length in minutes.
    pub length: i64,
}

#[derive(Debug, Deserialize)]
pub struct EventTypesResponse {
    #[serde(rename = "eventTypes", default)]
    pub event_types: Vec<EventType>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventTypeRequest {
    pub title: String,
    pub slug: String,
    pub length: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventTypeResponse {
    pub event_type: EventType,
}

/// One bookable window as reported by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SlotsResponse {
    #[serde(default)]
    pub slots: Vec<RemoteSlot>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRemoteBookingBody {
    pub event_type_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub attendee: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBookingResponse {
    pub uid: String,
    #[serde(default)]
    pub meeting_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
