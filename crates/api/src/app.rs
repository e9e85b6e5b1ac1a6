use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::routes::sessions;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions/available-slots", post(sessions::available_slots))
        .route("/api/sessions", post(sessions::create_session))
        .route("/api/sessions/user/{user_id}", get(sessions::list_user_sessions))
        .route("/api/sessions/{id}", get(sessions::get_session))
        .route("/api/sessions/{id}/cancel", put(sessions::cancel_session))
        .route("/api/sessions/{id}/reschedule", put(sessions::reschedule_session))
        .route("/api/sessions/{id}/accept", put(sessions::accept_session))
        .route("/api/sessions/{id}/decline", put(sessions::decline_session))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match state.db.health_check() {
        Ok(()) => "healthy",
        Err(err) => {
            tracing::warn!(error = %err, "database health check failed");
            "unhealthy"
        }
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "services": { "database": database }
    }))
}
