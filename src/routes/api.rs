//! JSON API over the stored collection: `/api/events`.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Display;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::models::{Event, EventId};
use crate::store::EventStore;
use crate::AppState;

const FETCH_FAILED: &str = "Failed to fetch events";
const CREATE_FAILED: &str = "Failed to create event";
const UPDATE_FAILED: &str = "Failed to update event";
const DELETE_FAILED: &str = "Failed to delete event";

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Answered as 500 with `{"error": ...}`. The cause is logged, not sent.
pub struct ApiError(&'static str);

impl ApiError {
    pub(crate) fn new(message: &'static str, cause: impl Display) -> Self {
        tracing::error!("{message}: {cause}");
        ApiError(message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": self.0 }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct DeleteParams {
    id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/events",
            get(list_events)
                .post(create_event)
                .put(update_event)
                .delete(delete_event)
                .options(preflight),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    let events = state
        .events
        .fetch()
        .await
        .map_err(|e| ApiError::new(FETCH_FAILED, e))?;
    Ok(Json(events))
}

async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<Event>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(event) = payload.map_err(|e| ApiError::new(CREATE_FAILED, e))?;
    state
        .events
        .create(&event)
        .await
        .map_err(|e| ApiError::new(CREATE_FAILED, e))?;
    tracing::info!(event_id = event.id, "event created");
    Ok(success())
}

async fn update_event(
    State(state): State<AppState>,
    payload: Result<Json<Event>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(event) = payload.map_err(|e| ApiError::new(UPDATE_FAILED, e))?;
    state
        .events
        .update(&event)
        .await
        .map_err(|e| ApiError::new(UPDATE_FAILED, e))?;
    Ok(success())
}

async fn delete_event(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, ApiError> {
    // An absent or non-numeric id matches nothing.
    let Some(id) = params.id.and_then(|raw| raw.trim().parse::<EventId>().ok()) else {
        return Ok(success());
    };
    state
        .events
        .delete(id)
        .await
        .map_err(|e| ApiError::new(DELETE_FAILED, e))?;
    tracing::info!(event_id = id, "event deleted");
    Ok(success())
}

async fn preflight() -> impl IntoResponse {
    [
        (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    ]
}
