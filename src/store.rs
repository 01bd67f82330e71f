//! Event persistence behind a pluggable async store port, with an
//! in-memory implementation for tests and a JSON file store for the CLI.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::event::{Event, EventPatch};

/// Store-side failures, mapped onto calendar errors by the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached or failed mid-request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The backend understood the request and refused it.
    #[error("Store rejected the request: {0}")]
    Rejected(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence port for calendar events.
///
/// Implementations scope every operation to an owner and return fetch
/// results ordered by start time.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All events owned by `owner_id`, earliest start first.
    async fn fetch_events(&self, owner_id: &str) -> StoreResult<Vec<Event>>;

    /// Persist a new event and return it with its assigned id.
    async fn insert_event(&self, event: Event) -> StoreResult<Event>;

    /// Apply `patch` to the event with `event_id` and return the result.
    async fn update_event(
        &self,
        owner_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> StoreResult<Event>;

    /// Remove the event with `event_id`. Deleting an id that is already
    /// gone succeeds.
    async fn delete_event(&self, owner_id: &str, event_id: &str) -> StoreResult<()>;
}

/// In-memory event store keyed by event id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: RwLock<HashMap<String, Event>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a batch of events, assigning ids to any that lack one.
    pub async fn seed(&self, events: Vec<Event>) {
        let mut stored = self.events.write().await;
        for mut event in events {
            let id = event
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            event.id = Some(id.clone());
            stored.insert(id, event);
        }
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Every stored event regardless of owner, earliest start first.
    pub async fn dump(&self) -> Vec<Event> {
        let events = self.events.read().await;
        let mut all: Vec<Event> = events.values().cloned().collect();
        all.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        all
    }

    /// Swap the whole collection for a previously captured one.
    async fn restore(&self, events: Vec<Event>) {
        let mut stored = self.events.write().await;
        stored.clear();
        for event in events {
            if let Some(id) = event.id.clone() {
                stored.insert(id, event);
            }
        }
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn fetch_events(&self, owner_id: &str) -> StoreResult<Vec<Event>> {
        let events = self.events.read().await;
        let mut owned: Vec<Event> = events
            .values()
            .filter(|event| event.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn insert_event(&self, mut event: Event) -> StoreResult<Event> {
        if event.end_time < event.start_time {
            return Err(StoreError::Rejected(
                "end time is before start time".to_string(),
            ));
        }
        let id = event
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        event.id = Some(id.clone());
        self.events.write().await.insert(id, event.clone());
        Ok(event)
    }

    async fn update_event(
        &self,
        owner_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> StoreResult<Event> {
        let mut events = self.events.write().await;
        match events.get_mut(event_id) {
            Some(current) if current.owner_id == owner_id => {
                let mut updated = current.clone();
                patch.apply(&mut updated);
                if updated.end_time < updated.start_time {
                    return Err(StoreError::Rejected(
                        "end time is before start time".to_string(),
                    ));
                }
                *current = updated.clone();
                Ok(updated)
            }
            Some(_) => Err(StoreError::Rejected(
                "event belongs to another owner".to_string(),
            )),
            None => Err(StoreError::Rejected(format!(
                "no event with id {}",
                event_id
            ))),
        }
    }

    async fn delete_event(&self, owner_id: &str, event_id: &str) -> StoreResult<()> {
        let mut events = self.events.write().await;
        match events.get(event_id) {
            Some(event) if event.owner_id != owner_id => Err(StoreError::Rejected(
                "event belongs to another owner".to_string(),
            )),
            Some(_) => {
                events.remove(event_id);
                Ok(())
            }
            // already gone
            None => Ok(()),
        }
    }
}

/// Event store persisted as a JSON file, for single-user local use.
///
/// The whole collection is rewritten after every confirmed write; a write
/// that cannot reach the file is rolled back in memory so the collection
/// matches what the file holds.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Open `path`, loading any events already stored there.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        let inner = MemoryStore::new();
        if path.exists() {
            let raw = tokio::fs::read_to_string(path)
                .await
                .map_err(|err| unavailable(path, "read", err))?;
            let events: Vec<Event> = serde_json::from_str(&raw)
                .map_err(|err| StoreError::Unavailable(format!("parse {}: {}", path.display(), err)))?;
            inner.seed(events).await;
        }
        Ok(JsonFileStore {
            path: path.to_path_buf(),
            inner,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self) -> StoreResult<()> {
        let events = self.inner.dump().await;
        let raw = serde_json::to_string_pretty(&events)
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| unavailable(parent, "create", err))?;
        }
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|err| unavailable(&self.path, "write", err))
    }
}

fn unavailable(path: &Path, action: &str, err: std::io::Error) -> StoreError {
    StoreError::Unavailable(format!("{} {}: {}", action, path.display(), err))
}

#[async_trait]
impl EventStore for JsonFileStore {
    async fn fetch_events(&self, owner_id: &str) -> StoreResult<Vec<Event>> {
        self.inner.fetch_events(owner_id).await
    }

    async fn insert_event(&self, event: Event) -> StoreResult<Event> {
        // capture the collection so a failed file write can be undone
        let before = self.inner.dump().await;
        let created = self.inner.insert_event(event).await?;
        if let Err(err) = self.persist().await {
            self.inner.restore(before).await;
            return Err(err);
        }
        Ok(created)
    }

    async fn update_event(
        &self,
        owner_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> StoreResult<Event> {
        let before = self.inner.dump().await;
        let updated = self.inner.update_event(owner_id, event_id, patch).await?;
        if let Err(err) = self.persist().await {
            self.inner.restore(before).await;
            return Err(err);
        }
        Ok(updated)
    }

    async fn delete_event(&self, owner_id: &str, event_id: &str) -> StoreResult<()> {
        let before = self.inner.dump().await;
        self.inner.delete_event(owner_id, event_id).await?;
        if let Err(err) = self.persist().await {
            self.inner.restore(before).await;
            return Err(err);
        }
        Ok(())
    }
}
