//! # mirror-observe
//!
//! Change observation on top of the storage engine:
//!
//! - List observers delivering diffed change sets (inserted, removed,
//!   updated, moved) per commit
//! - Entity observers delivering created/updated/removed transitions
//! - Ephemeral per-channel typing state with automatic expiry
//!
//! Observers register on the engine's commit feed; every commit is examined
//! exactly once, and events describe transitions rather than snapshots.

pub mod diff;
pub mod observer;
pub mod typing;

// Re-export commonly used types
pub use diff::{compute_list_diff, ListDiff, ListEntry};
pub use observer::{
    EntityEvent, EntityObserver, EntityObserving, ListEvent, ListObserver, ListObserving,
};
pub use typing::TypingState;
