//! Fetch specifications - declarative filter + sort descriptors
//!
//! A [`FetchSpec`] is the only way to ask the engine for a result set. It
//! carries a scope (all channels, or one query's materialized association),
//! an optional filter predicate tree, and an ordered sort key list. Every
//! spec resolves ties by `cid` ascending, so repeated fetches of otherwise
//! equal rows return the same order.

mod filter;
mod sort;

pub use filter::{ChannelField, CompareOp, FieldValue, Filter};
pub use sort::{ChannelSortKey, SortDirection, Sorting};

use mirror_core::ChannelRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which rows a fetch considers before filtering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FetchScope {
    /// Scan all channel records
    #[default]
    All,
    /// Only channels materialized for the query with this filter hash
    Query(String),
}

/// Declarative fetch specification for channel records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FetchSpec {
    pub scope: FetchScope,
    pub filter: Option<Filter>,
    pub sort: Vec<Sorting>,
}

impl FetchSpec {
    /// Spec scanning all channels matching `filter`, sorted by `sort`
    pub fn new(filter: Filter, sort: Vec<Sorting>) -> Self {
        Self {
            scope: FetchScope::All,
            filter: Some(filter),
            sort,
        }
    }

    /// Spec returning every channel in the store, sorted by `sort`
    pub fn all(sort: Vec<Sorting>) -> Self {
        Self {
            scope: FetchScope::All,
            filter: None,
            sort,
        }
    }

    /// Spec reading one query's materialized association
    pub fn for_query_hash(hash: String, sort: Vec<Sorting>) -> Self {
        Self {
            scope: FetchScope::Query(hash),
            filter: None,
            sort,
        }
    }

    /// Check the filter against a record; an absent filter matches everything
    pub fn matches(&self, record: &ChannelRecord) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|filter| filter.matches(record))
    }

    /// Total order over records: requested keys first, then `cid` ascending
    pub fn order(&self, a: &ChannelRecord, b: &ChannelRecord) -> Ordering {
        for sorting in &self.sort {
            let ord = sorting.compare(a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.cid.cmp(&b.cid)
    }
}
