//! In-memory store.

use crate::error::StoreError;
use crate::traits::EventStore;
use rollcall_canonical::EventId;
use rollcall_core::Event;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Keeps events in a map. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: Mutex<BTreeMap<EventId, Event>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> Result<MutexGuard<'_, BTreeMap<EventId, Event>>, StoreError> {
        self.events.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl EventStore for MemoryStore {
    fn get(&self, id: &EventId) -> Result<Option<Event>, StoreError> {
        Ok(self.events()?.get(id).cloned())
    }

    fn put(&self, event: &Event) -> Result<(), StoreError> {
        self.events()?.insert(event.id.clone(), event.clone());
        Ok(())
    }

    fn insert(&self, event: &Event) -> Result<(), StoreError> {
        let mut events = self.events()?;
        if events.contains_key(&event.id) {
            return Err(StoreError::AlreadyExists(event.id.clone()));
        }
        events.insert(event.id.clone(), event.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<EventId>, StoreError> {
        Ok(self.events()?.keys().cloned().collect())
    }
}
