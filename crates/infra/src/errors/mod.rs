//! Conversions from external infrastructure errors into domain errors.

use mentorbook_domain::BookingError;
use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can
/// be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub BookingError);

impl From<InfraError> for BookingError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<BookingError> for InfraError {
    fn from(value: BookingError) -> Self {
        InfraError(value)
    }
}

impl From<SqlError> for InfraError {
    fn from(err: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        let mapped = match err {
            RE::SqliteFailure(code, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match code.code {
                    ErrorCode::DatabaseBusy => BookingError::Database("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        BookingError::Database("database is locked".into())
                    }
                    ErrorCode::ConstraintViolation => BookingError::Database(format!(
                        "constraint violation (code {}): {}",
                        code.extended_code, message
                    )),
                    _ => BookingError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        code.code, code.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => BookingError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                BookingError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                BookingError::Database(format!("invalid column type: {ty}"))
            }
            other => BookingError::Database(other.to_string()),
        };
        InfraError(mapped)
    }
}

impl From<PoolError> for InfraError {
    fn from(err: PoolError) -> Self {
        InfraError(BookingError::Database(format!("connection pool error: {err}")))
    }
}

impl From<HttpError> for InfraError {
    fn from(err: HttpError) -> Self {
        let mapped = if err.is_timeout() {
            BookingError::Network(format!("request timed out: {err}"))
        } else if err.is_connect() {
            BookingError::Network(format!("connection failed: {err}"))
        } else if err.is_decode() {
            BookingError::Internal(format!("failed to decode response body: {err}"))
        } else {
            BookingError::Network(err.to_string())
        };
        InfraError(mapped)
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(err: serde_json::Error) -> Self {
        InfraError(BookingError::Internal(format!("serialization error: {err}")))
    }
}
