use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::EventId;

/// Failures of the HTML routes. Store failures never land here: the
/// planner turns them into notices.
#[derive(Debug)]
pub enum AppError {
    Template(askama::Error),
    Session(tower_sessions::session::Error),
    EventNotFound(EventId),
}

impl AppError {
    fn internal(kind: &str, cause: &dyn std::fmt::Display) -> Response {
        tracing::error!("{kind} error: {cause}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::EventNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("No event with id {id}")).into_response()
            }
            AppError::Template(e) => Self::internal("Template", &e),
            AppError::Session(e) => Self::internal("Session", &e),
        }
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Template(e)
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(e: tower_sessions::session::Error) -> Self {
        AppError::Session(e)
    }
}
