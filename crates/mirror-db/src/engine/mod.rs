//! Storage engine - tables, commits, and snapshot persistence

mod snapshot;
mod storage;
mod tables;

pub use storage::{Commit, StorageEngine};

pub(crate) use tables::Tables;
