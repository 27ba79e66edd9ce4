//! Test fixtures and payload builders
//!
//! Provides reusable, valid payloads for integration tests. Builders return
//! owned values so tests can freely mutate individual fields.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use mirror_core::{
    ChannelConfig, ChannelDetailPayload, ChannelId, ChannelPayload, MemberPayload, MemberRole,
    MessageId, MessagePayload, UserId, UserPayload, UserRole,
};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A channel id no other test in the process has seen
pub fn unique_cid(kind: &str) -> ChannelId {
    ChannelId::new(kind, format!("chan-{}", unique_suffix()))
}

/// Valid user payload with the given id
pub fn user_payload(id: &str) -> UserPayload {
    let now = Utc::now();
    UserPayload {
        id: UserId::from(id),
        role: UserRole::User,
        online: false,
        invisible: false,
        banned: false,
        teams: vec![],
        created_at: now,
        updated_at: now,
        last_active_at: None,
        extra: serde_json::Value::Null,
    }
}

/// Member payload wrapping a valid user
pub fn member_payload(user_id: &str) -> MemberPayload {
    let now = Utc::now();
    MemberPayload {
        user: user_payload(user_id),
        role: MemberRole::Member,
        created_at: now,
        updated_at: now,
    }
}

/// Valid channel payload without members
pub fn channel_payload(cid: ChannelId) -> ChannelPayload {
    let now = Utc::now();
    ChannelPayload {
        channel: channel_detail(cid, now),
        members: None,
    }
}

/// Channel detail stamped at the given time
pub fn channel_detail(cid: ChannelId, at: DateTime<Utc>) -> ChannelDetailPayload {
    ChannelDetailPayload {
        cid,
        created_by: Some(user_payload("creator")),
        config: ChannelConfig::new(at),
        frozen: false,
        member_count: 0,
        team: None,
        last_message_at: None,
        created_at: at,
        updated_at: at,
        deleted_at: None,
        extra: serde_json::Value::Null,
    }
}

/// Message payload addressed to the given channel
pub fn message_payload(cid: ChannelId, author: &str) -> MessagePayload {
    let now = Utc::now();
    MessagePayload {
        id: MessageId::from(format!("msg-{}", unique_suffix())),
        cid,
        user: user_payload(author),
        text: "hello".to_string(),
        created_at: now,
        extra: serde_json::Value::Null,
    }
}
