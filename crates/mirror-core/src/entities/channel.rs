//! Channel record - the mirrored server-side channel entity

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value_objects::{ChannelId, UserId};

bitflags! {
    /// Channel feature flags from the channel config payload
    ///
    /// Stored as a 32-bit integer bitfield, serialized as a number in JSON.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelFeatures: u32 {
        /// Emoji reactions on messages
        const REACTIONS       = 1 << 0;
        /// Typing start/stop signals
        const TYPING_EVENTS   = 1 << 1;
        /// Read-state tracking
        const READ_EVENTS     = 1 << 2;
        /// Member connect/disconnect signals
        const CONNECT_EVENTS  = 1 << 3;
        /// File and image uploads
        const UPLOADS         = 1 << 4;
        /// Threaded replies
        const REPLIES         = 1 << 5;
        /// Message search
        const SEARCH          = 1 << 6;
        /// Channel mutes
        const MUTES           = 1 << 7;
        /// Link preview enrichment
        const URL_ENRICHMENT  = 1 << 8;
    }
}

impl Serialize for ChannelFeatures {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for ChannelFeatures {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}

impl Default for ChannelFeatures {
    fn default() -> Self {
        Self::empty()
    }
}

/// Versioned channel configuration: feature flags plus limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub features: ChannelFeatures,
    pub max_message_length: Option<u32>,
    pub message_retention: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChannelConfig {
    /// Create an empty config stamped with the given time
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            features: ChannelFeatures::empty(),
            max_message_length: None,
            message_retention: None,
            created_at: at,
            updated_at: at,
        }
    }

    /// Check whether a feature is enabled
    #[inline]
    pub fn has(&self, feature: ChannelFeatures) -> bool {
        self.features.contains(feature)
    }
}

/// Channel record
///
/// Owns its member records for the channel's lifetime; deleting the channel
/// cascades member removal in the storage engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub cid: ChannelId,
    pub created_by: Option<UserId>,
    pub config: ChannelConfig,
    pub frozen: bool,
    pub member_count: u32,
    pub team: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Opaque server attributes, round-tripped byte-for-byte
    pub extra: serde_json::Value,
}

impl ChannelRecord {
    /// Channel kind, the `type` part of the composite identity
    #[inline]
    pub fn kind(&self) -> &str {
        self.cid.kind()
    }

    /// Check if the channel carries a soft-delete timestamp
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// The value the default sort key compares: last message time, falling
    /// back to creation time for channels without messages.
    #[inline]
    pub fn default_sorting_date(&self) -> DateTime<Utc> {
        self.last_message_at.unwrap_or(self.created_at)
    }

    /// Advance `last_message_at`, keeping it monotonic
    pub fn observe_message_at(&mut self, at: DateTime<Utc>) {
        if self.last_message_at.is_none_or(|current| current < at) {
            self.last_message_at = Some(at);
        }
    }
}
