//! Integration test utilities for the mirrored chat store
//!
//! This crate provides payload builders and helpers for exercising the
//! storage engine, write sessions, queries, and observers end to end.

pub mod fixtures;

pub use fixtures::*;
