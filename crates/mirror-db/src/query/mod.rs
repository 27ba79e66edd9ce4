//! Channel-list queries and their materialized associations

mod channel_list_query;

pub use channel_list_query::{ChannelListQuery, QueryRecord};
