use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::models::Event;
use crate::routes::api::ApiError;
use crate::AppState;

const EXPORT_FAILED: &str = "Failed to export events";

#[derive(Serialize)]
struct ExportData {
    exported_at: String,
    events: Vec<Event>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/export", get(export_events))
}

/// Download the whole collection as a JSON attachment. An unreadable
/// collection is a 500, never an empty export.
async fn export_events(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let events = state
        .events
        .fetch()
        .await
        .map_err(|e| ApiError::new(EXPORT_FAILED, e))?;

    let export = ExportData {
        exported_at: chrono::Utc::now().to_rfc3339(),
        events,
    };

    let filename = format!("yotei-export-{}.json", crate::today().format("%Y-%m-%d"));
    let content_disposition = format!("attachment; filename=\"{filename}\"");

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(value) = HeaderValue::from_str(&content_disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((headers, Json(export)))
}
