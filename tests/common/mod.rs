#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{Days, Local, NaiveDate};
use http_body_util::BodyExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use yotei::models::{Event, EventId};
use yotei::store::KvEventStore;

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let router = yotei::build_app(pool.clone(), false)
            .await
            .expect("Failed to build app");

        Self { router, db: pool }
    }

    pub fn store(&self) -> KvEventStore {
        KvEventStore::new(self.db.clone())
    }

    /// Overwrite the stored collection.
    pub async fn seed(&self, events: &[Event]) {
        self.store()
            .replace_all(events)
            .await
            .expect("Failed to seed events");
    }

    pub async fn stored(&self) -> Vec<Event> {
        self.store().fetch().await.expect("Failed to read events")
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Send a GET request with an optional session cookie.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a POST form request with an optional session cookie.
    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        self.request(req).await
    }

    /// Send a JSON body with the given method.
    pub async fn send_json(&self, method: &str, uri: &str, body: &str) -> Response {
        let req = Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(req).await
    }

    /// Send a bodiless request with the given method.
    pub async fn send(&self, method: &str, uri: &str) -> Response {
        let req = Request::builder()
            .uri(uri)
            .method(method)
            .body(Body::empty())
            .unwrap();
        self.request(req).await
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn days_from_today(days: u64) -> NaiveDate {
    today().checked_add_days(Days::new(days)).unwrap()
}

/// An event `days` days from today, 09:00 to 10:00.
pub fn event(id: EventId, name: &str, days: u64) -> Event {
    let raw = serde_json::json!({
        "id": id,
        "location": "Studio A",
        "name": name,
        "date": days_from_today(days).format("%Y-%m-%d").to_string(),
        "startTime": "09:00",
        "endTime": "10:00",
        "instructor": "Sato",
        "color": "#3b82f6",
    });
    serde_json::from_value(raw).unwrap()
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// The session cookie (`name=value`) set by a response.
pub fn session_cookie(resp: &Response) -> String {
    resp.headers()
        .get("set-cookie")
        .expect("Response should set a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

/// Assert that a response is a redirect to the given location.
pub fn assert_redirect(resp: &Response, expected_location: &str) {
    assert!(
        resp.status().is_redirection(),
        "Expected redirect, got {}",
        resp.status()
    );
    let location = resp
        .headers()
        .get("location")
        .expect("Redirect should have location header")
        .to_str()
        .unwrap();
    assert_eq!(location, expected_location);
}

pub fn assert_status(resp: &Response, expected: StatusCode) {
    assert_eq!(resp.status(), expected, "unexpected status");
}
