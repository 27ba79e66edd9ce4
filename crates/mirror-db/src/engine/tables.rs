//! Committed table state
//!
//! One value of this type is the entire committed store. Commits replace it
//! wholesale under the table lock, so readers always see a consistent state.

use std::collections::{BTreeSet, HashMap};

use mirror_core::{ChannelId, ChannelRecord, MemberRecord, MessageId, MessageRecord, UserId, UserRecord};
use serde::{Deserialize, Serialize};

use crate::query::QueryRecord;
use crate::spec::{FetchScope, FetchSpec};

/// All persisted tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Tables {
    pub channels: HashMap<ChannelId, ChannelRecord>,
    pub users: HashMap<UserId, UserRecord>,
    /// Members indexed by owning channel, then user
    pub members: HashMap<ChannelId, HashMap<UserId, MemberRecord>>,
    pub messages: HashMap<MessageId, MessageRecord>,
    /// Query rows keyed by filter hash
    pub queries: HashMap<String, QueryRecord>,
    /// Materialized query-to-channel association sets
    pub associations: HashMap<String, BTreeSet<ChannelId>>,
}

impl Tables {
    /// Channel records matching a specification, in its total order
    pub fn fetch(&self, spec: &FetchSpec) -> Vec<ChannelRecord> {
        let mut rows: Vec<ChannelRecord> = match &spec.scope {
            FetchScope::All => self
                .channels
                .values()
                .filter(|record| spec.matches(record))
                .cloned()
                .collect(),
            FetchScope::Query(hash) => self
                .associations
                .get(hash)
                .map(|cids| {
                    cids.iter()
                        .filter_map(|cid| self.channels.get(cid))
                        .filter(|record| spec.matches(record))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
        };
        rows.sort_by(|a, b| spec.order(a, b));
        rows
    }

    /// Remove a channel and everything its lifetime owns
    pub fn remove_channel(&mut self, cid: &ChannelId) {
        self.channels.remove(cid);
        self.members.remove(cid);
        self.messages.retain(|_, message| message.cid != *cid);
        for set in self.associations.values_mut() {
            set.remove(cid);
        }
    }
}
