pub mod calendar;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod flash;
pub mod form;
pub mod models;
pub mod planner;
pub mod routes;
pub mod store;

pub const STATIC_HASH: &str = env!("STATIC_HASH");

use axum::http::{header, HeaderValue};
use axum::{routing::get, Router};
use chrono::{Local, NaiveDate};
use sqlx::SqlitePool;
use time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::Level;

use crate::planner::Busy;
use crate::store::KvEventStore;

#[derive(Clone)]
pub struct AppState {
    pub events: KvEventStore,
    /// Raised while any request is writing the collection.
    pub busy: Busy,
}

/// Local calendar date, the reference point for every horizon check.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full Axum application router.
///
/// Caller is responsible for running database migrations on `pool` beforehand.
/// This function sets up the session store used for flash notices (and
/// migrates its table), then assembles the API, calendar pages, middleware,
/// and state.
pub async fn build_app(pool: SqlitePool, secure_cookies: bool) -> Result<Router, sqlx::Error> {
    let session_store = SqliteStore::new(pool.clone());
    session_store.migrate().await?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)))
        .with_secure(secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax);

    let state = AppState {
        events: KvEventStore::new(pool),
        busy: Busy::default(),
    };

    Ok(Router::new()
        .route("/health", get(health))
        .merge(routes::api::router())
        .merge(routes::calendar::router())
        .merge(routes::events::router())
        .merge(routes::export::router())
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("public, max-age=86400"),
                ))
                .service(ServeDir::new("static")),
        )
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state))
}
