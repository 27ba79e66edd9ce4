//! Entity records - persisted, identity-keyed data units
//!
//! Records are the stored form of server-owned entities. They are mutated
//! only through write sessions; the upsert rules live in `mirror-db`.

mod channel;
mod member;
mod message;
mod user;

pub use channel::{ChannelConfig, ChannelFeatures, ChannelRecord};
pub use member::{MemberRecord, MemberRole};
pub use message::MessageRecord;
pub use user::{UserRecord, UserRole};
