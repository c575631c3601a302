use std::time::Duration;

use reqwest::RequestBuilder;
use url::Url;

use super::{EventStore, LocalStore, Loaded, StoreError};
use crate::models::{Event, EventId};

const EVENTS_PATH: &str = "api/events";

/// Client of the `/api/events` endpoint, keeping a local copy of the last
/// collection it saw.
///
/// Reads fall back to the local copy when the server cannot be reached.
/// Writes go to the server only; the local copy is brought in line after a
/// write the server accepted.
pub struct RemoteStore {
    client: reqwest::Client,
    endpoint: Url,
    cache: LocalStore,
}

impl RemoteStore {
    pub fn new(base_url: &str, timeout: Duration, cache: LocalStore) -> Result<Self, StoreError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(EVENTS_PATH)?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client, endpoint, cache })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn cache(&self) -> &LocalStore {
        &self.cache
    }

    async fn fetch(&self) -> Result<Vec<Event>, StoreError> {
        let events = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(events)
    }

    async fn send(&self, request: RequestBuilder) -> Result<(), StoreError> {
        request.send().await?.error_for_status()?;
        Ok(())
    }

    fn note_cache_failure(&self, result: Result<(), StoreError>) {
        if let Err(e) = result {
            tracing::warn!(path = %self.cache.path().display(), "Failed to refresh local copy: {e}");
        }
    }
}

impl EventStore for RemoteStore {
    async fn load(&self) -> Loaded {
        match self.fetch().await {
            Ok(events) => {
                self.note_cache_failure(self.cache.write(&events).await);
                Loaded::online(events)
            }
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint, "Remote load failed, using local copy: {e}");
                let events = self.cache.read().await.unwrap_or_else(|e| {
                    tracing::warn!("Local copy unreadable: {e}");
                    Vec::new()
                });
                Loaded::offline(events)
            }
        }
    }

    async fn create(&self, event: &Event) -> Result<(), StoreError> {
        self.send(self.client.post(self.endpoint.clone()).json(event)).await?;
        self.note_cache_failure(self.cache.create(event).await);
        Ok(())
    }

    async fn update(&self, event: &Event) -> Result<(), StoreError> {
        self.send(self.client.put(self.endpoint.clone()).json(event)).await?;
        self.note_cache_failure(self.cache.update(event).await);
        Ok(())
    }

    async fn delete(&self, id: EventId) -> Result<(), StoreError> {
        let request = self.client.delete(self.endpoint.clone()).query(&[("id", id)]);
        self.send(request).await?;
        self.note_cache_failure(self.cache.delete(id).await);
        Ok(())
    }
}
