//! Persistence of the event collection.
//!
//! Every backend stores the whole collection as one JSON array and every
//! mutation rewrites it. There is no concurrency control: when two writers
//! race, the last successful write wins and the other change is lost.

pub mod kv;
pub mod local;
pub mod remote;

pub use kv::KvEventStore;
pub use local::LocalStore;
pub use remote::RemoteStore;

use std::fmt;
use std::future::Future;

use crate::models::{Event, EventId};

/// Result of reading the collection. `offline` is set when the primary
/// backend failed and the events came from a fallback copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loaded {
    pub events: Vec<Event>,
    pub offline: bool,
}

impl Loaded {
    pub fn online(events: Vec<Event>) -> Self {
        Self { events, offline: false }
    }

    pub fn offline(events: Vec<Event>) -> Self {
        Self { events, offline: true }
    }
}

pub trait EventStore: Send + Sync {
    /// Never fails: backends fall back to whatever copy they have.
    fn load(&self) -> impl Future<Output = Loaded> + Send;

    fn create(&self, event: &Event) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Replaces the event with the same id; unknown ids are a silent no-op.
    fn update(&self, event: &Event) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete(&self, id: EventId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Client-side storage chosen by configuration.
pub enum Storage {
    Remote(RemoteStore),
    Local(LocalStore),
}

impl EventStore for Storage {
    async fn load(&self) -> Loaded {
        match self {
            Storage::Remote(store) => store.load().await,
            Storage::Local(store) => store.load().await,
        }
    }

    async fn create(&self, event: &Event) -> Result<(), StoreError> {
        match self {
            Storage::Remote(store) => store.create(event).await,
            Storage::Local(store) => store.create(event).await,
        }
    }

    async fn update(&self, event: &Event) -> Result<(), StoreError> {
        match self {
            Storage::Remote(store) => store.update(event).await,
            Storage::Local(store) => store.update(event).await,
        }
    }

    async fn delete(&self, id: EventId) -> Result<(), StoreError> {
        match self {
            Storage::Remote(store) => store.delete(id).await,
            Storage::Local(store) => store.delete(id).await,
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    Http(reqwest::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
    Url(url::ParseError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "database error: {e}"),
            StoreError::Http(e) => write!(f, "http error: {e}"),
            StoreError::Io(e) => write!(f, "io error: {e}"),
            StoreError::Json(e) => write!(f, "malformed event data: {e}"),
            StoreError::Url(e) => write!(f, "invalid api url: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Http(e)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

impl From<url::ParseError> for StoreError {
    fn from(e: url::ParseError) -> Self {
        StoreError::Url(e)
    }
}
