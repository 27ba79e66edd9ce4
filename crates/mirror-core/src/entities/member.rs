//! Member record - junction between a channel and a user

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ChannelId, UserId};

/// Channel-scoped member role, distinct from the user's server-wide role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    #[default]
    Member,
    Moderator,
    Admin,
    Owner,
}

impl MemberRole {
    /// Parse from the wire's raw role string; unknown values fall back to `Member`
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "moderator" => Self::Moderator,
            "admin" => Self::Admin,
            "owner" => Self::Owner,
            _ => Self::Member,
        }
    }

    /// Check whether the role carries moderation rights in the channel
    #[inline]
    pub fn can_moderate(&self) -> bool {
        !matches!(self, Self::Member)
    }
}

/// Member record (junction between Channel and User)
///
/// Lifecycle is tied to the owning channel; membership timestamps are
/// distinct from the user's own record timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub cid: ChannelId,
    pub user_id: UserId,
    pub role: MemberRole,
    pub member_created_at: DateTime<Utc>,
    pub member_updated_at: DateTime<Utc>,
}
