//! Channel-list query - a named filter + sort over channels
//!
//! A query is identified by the canonical encoding of its filter. Channels
//! saved in the context of a query are linked to it through an association
//! row, so loading the query's result set reads the materialized association
//! instead of rescanning every channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::spec::{ChannelSortKey, FetchSpec, Filter, Sorting};

/// Declarative channel-list query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelListQuery {
    pub filter: Filter,
    pub sort: Vec<Sorting>,
}

impl ChannelListQuery {
    /// Query with the default sorting (most recent activity first)
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            sort: vec![Sorting::descending(ChannelSortKey::Default)],
        }
    }

    /// Query with explicit sorting
    pub fn with_sort(filter: Filter, sort: Vec<Sorting>) -> Self {
        Self { filter, sort }
    }

    /// Stable identity of the query: the canonical JSON encoding of its filter
    ///
    /// Two queries with the same filter share one association regardless of
    /// their sorting.
    pub fn filter_hash(&self) -> String {
        // Enum encoding is deterministic; field order is fixed by the types
        serde_json::to_string(&self.filter).unwrap_or_default()
    }

    /// Build the fetch specification reading this query's association
    pub fn fetch_spec(&self) -> FetchSpec {
        FetchSpec::for_query_hash(self.filter_hash(), self.sort.clone())
    }
}

/// Persisted row for a query that has been used to save channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub filter_hash: String,
    pub filter: Filter,
    pub created_at: DateTime<Utc>,
}

impl QueryRecord {
    pub fn new(query: &ChannelListQuery, at: DateTime<Utc>) -> Self {
        Self {
            filter_hash: query.filter_hash(),
            filter: query.filter.clone(),
            created_at: at,
        }
    }
}
