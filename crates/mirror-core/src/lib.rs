//! # mirror-core
//!
//! Domain layer containing entity records, inbound payload types, value objects,
//! and the store error taxonomy. This crate has zero dependencies on
//! infrastructure (storage engine, async runtime, etc.).

pub mod entities;
pub mod error;
pub mod payloads;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    ChannelConfig, ChannelFeatures, ChannelRecord, MemberRecord, MemberRole, MessageRecord,
    UserRecord, UserRole,
};
pub use error::{StoreError, StoreResult};
pub use payloads::{
    ChannelDetailPayload, ChannelPayload, MemberPayload, MessagePayload, UserPayload,
};
pub use value_objects::{ChannelId, ChannelIdParseError, MessageId, UserId};
