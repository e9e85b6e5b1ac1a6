//! # MentorBook API
//!
//! HTTP surface over the booking core: availability queries and the
//! booking lifecycle, served by axum.

pub mod app;
pub mod error;
pub mod routes;
pub mod state;

pub use app::create_router;
pub use state::AppState;
