use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{EventStore, Loaded, StoreError};
use crate::models::event::{remove, replace};
use crate::models::{Event, EventId};

/// The collection as a JSON file on local disk. Used on its own for offline
/// work and as the fallback copy behind [`super::RemoteStore`].
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Vec<Event>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    pub async fn write(&self, events: &[Event]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_vec_pretty(events)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }

    async fn modify<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<Event>) + Send,
    {
        let mut events = self.read().await?;
        apply(&mut events);
        self.write(&events).await
    }
}

impl EventStore for LocalStore {
    async fn load(&self) -> Loaded {
        match self.read().await {
            Ok(events) => Loaded::online(events),
            Err(e) => {
                tracing::error!(path = %self.path.display(), "Failed to read local events: {e}");
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
