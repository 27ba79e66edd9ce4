//! Normalized inbound payloads
//!
//! Payloads are the already-decoded entity shapes handed over by the network
//! layer. The write session is the only ingestion point; each payload is
//! validated before any record it describes is staged, so a malformed payload
//! can never commit a partial entity graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::entities::{ChannelConfig, MemberRole, UserRole};
use crate::value_objects::{ChannelId, MessageId, UserId};

/// Normalized user payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserPayload {
    #[validate(custom(function = validate_user_id))]
    pub id: UserId,
    pub role: UserRole,
    pub online: bool,
    pub invisible: bool,
    pub banned: bool,
    #[serde(default)]
    pub teams: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
    /// Opaque server attributes, stored as-is
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Normalized member payload; embeds the member's user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MemberPayload {
    #[validate(nested)]
    pub user: UserPayload,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Channel fields of a channel payload, without the membership list
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChannelDetailPayload {
    #[validate(custom(function = validate_channel_id))]
    pub cid: ChannelId,
    #[validate(nested)]
    pub created_by: Option<UserPayload>,
    pub config: ChannelConfig,
    pub frozen: bool,
    pub member_count: u32,
    pub team: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Opaque server attributes, stored as-is
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Normalized channel payload: channel fields plus an optional member list
///
/// An absent member list means "membership unchanged", not "no members".
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChannelPayload {
    #[validate(nested)]
    pub channel: ChannelDetailPayload,
    #[validate(nested)]
    pub members: Option<Vec<MemberPayload>>,
}

/// Normalized message payload; embeds the author
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MessagePayload {
    #[validate(custom(function = validate_message_id))]
    pub id: MessageId,
    #[validate(custom(function = validate_channel_id))]
    pub cid: ChannelId,
    #[validate(nested)]
    pub user: UserPayload,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Opaque server attributes, stored as-is
    #[serde(default)]
    pub extra: serde_json::Value,
}

fn validate_channel_id(cid: &ChannelId) -> Result<(), ValidationError> {
    if cid.is_valid() {
        Ok(())
    } else {
        Err(ValidationError::new("missing_channel_identity"))
    }
}

fn validate_user_id(id: &UserId) -> Result<(), ValidationError> {
    if id.is_empty() {
        Err(ValidationError::new("missing_user_identity"))
    } else {
        Ok(())
    }
}

fn validate_message_id(id: &MessageId) -> Result<(), ValidationError> {
    if id.is_empty() {
        Err(ValidationError::new("missing_message_identity"))
    } else {
        Ok(())
    }
}
