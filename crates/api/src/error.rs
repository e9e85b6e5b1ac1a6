//! Error-to-response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mentorbook_domain::BookingError;
use serde_json::json;
use tracing::error;

/// Wraps [`BookingError`] so handlers can use `?` and get consistent
/// HTTP mapping. Client-caused errors keep their message; server-side
/// failures are logged and replaced with a generic one.
pub struct ApiError(pub BookingError);

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            BookingError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            BookingError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            BookingError::Authorization(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            BookingError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            BookingError::Payment(msg) => (StatusCode::PAYMENT_REQUIRED, msg.clone()),
            BookingError::Integration(msg) => {
                error!(error = %msg, "upstream integration failure");
                (StatusCode::BAD_GATEWAY, "upstream service unavailable".to_string())
            }
            BookingError::Network(msg) => {
                error!(error = %msg, "network failure");
                (StatusCode::BAD_GATEWAY, "upstream service unavailable".to_string())
            }
            BookingError::Database(msg)
            | BookingError::Config(msg)
            | BookingError::Internal(msg) => {
                error!(error = %msg, "internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };

        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_for(err: BookingError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(status_for(BookingError::Validation("bad".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(BookingError::NotFound("booking x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(BookingError::Authorization("no".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_for(BookingError::Conflict("taken".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_for(BookingError::Payment("declined".into())),
            StatusCode::PAYMENT_REQUIRED
        );
    }

    #[test]
    fn server_errors_hide_details() {
        assert_eq!(
            status_for(BookingError::Database("sqlite blew up".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(BookingError::Integration("remote 500".into())),
            StatusCode::BAD_GATEWAY
        );
    }
}
