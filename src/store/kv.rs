use chrono::Utc;
use sqlx::SqlitePool;

use super::{EventStore, Loaded, StoreError};
use crate::models::event::{remove, replace};
use crate::models::{Event, EventId};

/// Key holding the JSON-encoded collection.
pub const EVENTS_KEY: &str = "events";

/// Server-side backend: the collection lives as a single value in the `kv`
/// table.
#[derive(Clone)]
pub struct KvEventStore {
    db: SqlitePool,
}

impl KvEventStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Current collection; a missing record reads as empty.
    pub async fn fetch(&self) -> Result<Vec<Event>, StoreError> {
        match self.get(EVENTS_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Overwrite the stored collection.
    pub async fn replace_all(&self, events: &[Event]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(events)?;
        self.put(EVENTS_KEY, &raw).await?;
        Ok(())
    }

    async fn modify<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<Event>) + Send,
    {
        let mut events = self.fetch().await?;
        apply(&mut events);
        self.replace_all(&events).await
    }
}

impl EventStore for KvEventStore {
    async fn load(&self) -> Loaded {
        match self.fetch().await {
            Ok(events) => Loaded::online(events),
            Err(e) => {
                tracing::error!("Failed to read events: {e}");
                Loaded::offline(Vec::new())
            }
        }
    }

    async fn create(&self, event: &Event) -> Result<(), StoreError> {
        let event = event.clone();
        self.modify(move |events| events.push(event)).await
    }

    async fn update(&self, event: &Event) -> Result<(), StoreError> {
        let event = event.clone();
        self.modify(move |events| {
            replace(events, event);
        })
        .await
    }

    async fn delete(&self, id: EventId) -> Result<(), StoreError> {
        self.modify(move |events| {
            remove(events, id);
        })
        .await
    }
}
