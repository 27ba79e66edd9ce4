//! Sort keys for channel result sets
//!
//! The key set is closed. `Default` compares the per-row fallback value
//! (last message time, or creation time when the channel has no messages),
//! not the raw nullable column.

use mirror_core::ChannelRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Closed set of channel sort keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSortKey {
    /// Composite channel identity
    Cid,
    /// Channel kind
    Kind,
    /// Creation time
    CreatedAt,
    /// Soft-delete time; channels without one sort first ascending
    DeletedAt,
    /// Last update time
    LastActiveAt,
    /// Last message time, falling back per-row to creation time
    Default,
}

impl ChannelSortKey {
    fn compare(self, a: &ChannelRecord, b: &ChannelRecord) -> Ordering {
        match self {
            Self::Cid => a.cid.cmp(&b.cid),
            Self::Kind => a.kind().cmp(b.kind()),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::DeletedAt => a.deleted_at.cmp(&b.deleted_at),
            Self::LastActiveAt => a.updated_at.cmp(&b.updated_at),
            Self::Default => a.default_sorting_date().cmp(&b.default_sorting_date()),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One sort key with its direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sorting {
    pub key: ChannelSortKey,
    pub direction: SortDirection,
}

impl Sorting {
    pub fn ascending(key: ChannelSortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(key: ChannelSortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Descending,
        }
    }

    /// Compare two records on this key, honoring direction
    pub fn compare(&self, a: &ChannelRecord, b: &ChannelRecord) -> Ordering {
        let ord = self.key.compare(a, b);
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}
