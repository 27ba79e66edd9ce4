//! Value objects - identity types shared by all entity records

mod channel_id;
mod ids;

pub use channel_id::{ChannelId, ChannelIdParseError};
pub use ids::{MessageId, UserId};
