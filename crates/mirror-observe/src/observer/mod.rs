//! Database observers
//!
//! An observer watches the committed store through the commit feed and
//! delivers change events on an unbounded channel. Events describe the
//! transition (what changed and where), not just the new state. After
//! `stop_observing` returns, no further event is delivered.

mod entity_observer;
mod list_observer;

pub use entity_observer::EntityObserver;
pub use list_observer::ListObserver;

use tokio::sync::mpsc;

use mirror_core::{StoreError, StoreResult};

use crate::diff::ListDiff;

/// Event stream element of a list observer
#[derive(Debug, Clone)]
pub enum ListEvent<T> {
    /// The observed list transitioned; the diff describes how
    Changes(ListDiff<T>),
    /// Recomputing the list failed; the observer stays registered
    Failed(StoreError),
}

/// Event stream element of an entity observer
#[derive(Debug, Clone)]
pub enum EntityEvent<T> {
    /// The entity appeared in the store
    Created(T),
    /// The entity's record changed
    Updated(T),
    /// The entity was deleted; carries the last known record
    Removed(T),
}

/// Observer lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Active,
    Stopped,
}

/// Something that observes a list of items in the store
pub trait ListObserving<T> {
    /// Register with the commit feed and return the event stream
    fn start_observing(&self) -> StoreResult<mpsc::UnboundedReceiver<ListEvent<T>>>;

    /// Deregister; no event is delivered after this returns
    fn stop_observing(&self);

    /// Current items in the observed order
    ///
    /// Fails with `StoreError::Lifecycle` unless the observer is active.
    fn items(&self) -> StoreResult<Vec<T>>;
}

/// Something that observes a single entity in the store
pub trait EntityObserving<T> {
    /// Register with the commit feed and return the event stream
    fn start_observing(&self) -> StoreResult<mpsc::UnboundedReceiver<EntityEvent<T>>>;

    /// Deregister; no event is delivered after this returns
    fn stop_observing(&self);

    /// Current value of the observed entity
    ///
    /// Fails with `StoreError::Lifecycle` unless the observer is active.
    fn item(&self) -> StoreResult<Option<T>>;
}
