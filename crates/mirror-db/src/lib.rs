//! # mirror-db
//!
//! Storage engine for the mirrored chat store. It provides:
//!
//! - In-process indexed tables with atomic, serialized commits
//! - Declarative fetch specifications (filter predicate tree + sort keys)
//! - Write sessions mapping normalized payloads onto entity records
//! - Channel-list queries with materialized query associations
//! - Optional on-disk snapshot persistence
//!
//! Readers never see a partially committed session: mutations are staged
//! privately and become visible in a single swap under the table lock.

pub mod engine;
pub mod query;
pub mod session;
pub mod spec;

// Re-export commonly used types
pub use engine::{Commit, StorageEngine};
pub use query::{ChannelListQuery, QueryRecord};
pub use session::WriteSession;
pub use spec::{
    ChannelField, ChannelSortKey, CompareOp, FetchScope, FetchSpec, FieldValue, Filter,
    SortDirection, Sorting,
};
