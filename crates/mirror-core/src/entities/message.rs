//! Message record - a single channel message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ChannelId, MessageId, UserId};

/// Message record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: MessageId,
    pub cid: ChannelId,
    pub author: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Opaque server attributes, round-tripped byte-for-byte
    pub extra: serde_json::Value,
}
