//! Persistence collaborator.

use crate::error::StoreError;
use rollcall_canonical::EventId;
use rollcall_core::Event;

/// CRUD-style persistence for event aggregates.
///
/// Implementations take `&self` so one store can back an
/// [`EventDesk`](crate::EventDesk) shared across threads. Serializing writes to
/// the same event is the desk's job, not the store's.
pub trait EventStore: Send + Sync {
    /// Loads an event, or `None` if it was never stored.
    fn get(&self, id: &EventId) -> Result<Option<Event>, StoreError>;

    /// Creates or replaces an event.
    fn put(&self, event: &Event) -> Result<(), StoreError>;

    /// Creates an event, failing with [`StoreError::AlreadyExists`] if present.
    fn insert(&self, event: &Event) -> Result<(), StoreError>;

    /// Ids of every stored event, sorted.
    fn list(&self) -> Result<Vec<EventId>, StoreError>;
}
