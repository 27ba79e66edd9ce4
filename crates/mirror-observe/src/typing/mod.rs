//! Ephemeral typing state
//!
//! Typing signals live outside the transactional store: they are never
//! persisted, never appear on the commit feed, and expire on their own when
//! the stop signal is lost.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

use mirror_core::{ChannelId, UserId};

/// A user lingering past this long without a fresh start signal is dropped
const DEFAULT_TYPING_TIMEOUT_SECS: i64 = 30;

/// Per-channel registry of who is currently typing
#[derive(Debug)]
pub struct TypingState {
    entries: DashMap<ChannelId, HashMap<UserId, DateTime<Utc>>>,
    timeout: TimeDelta,
}

impl Default for TypingState {
    fn default() -> Self {
        Self::new()
    }
}

impl TypingState {
    pub fn new() -> Self {
        Self::with_timeout(TimeDelta::seconds(DEFAULT_TYPING_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: TimeDelta) -> Self {
        Self {
            entries: DashMap::new(),
            timeout,
        }
    }

    /// Record a typing start; restamps an already typing user
    pub fn typing_started(&self, cid: &ChannelId, user_id: &UserId) {
        self.entries
            .entry(cid.clone())
            .or_default()
            .insert(user_id.clone(), Utc::now());
    }

    /// Record a typing stop; unknown users are a no-op
    pub fn typing_stopped(&self, cid: &ChannelId, user_id: &UserId) {
        if let Some(mut per_user) = self.entries.get_mut(cid) {
            per_user.remove(user_id);
        }
    }

    /// Users currently typing in a channel, expired entries pruned
    pub fn typing_users(&self, cid: &ChannelId) -> Vec<UserId> {
        self.typing_users_at(cid, Utc::now())
    }

    /// Like [`typing_users`](Self::typing_users) with an explicit clock
    pub fn typing_users_at(&self, cid: &ChannelId, now: DateTime<Utc>) -> Vec<UserId> {
        let Some(mut per_user) = self.entries.get_mut(cid) else {
            return Vec::new();
        };
        per_user.retain(|_, started_at| now - *started_at < self.timeout);

        let mut users: Vec<UserId> = per_user.keys().cloned().collect();
        users.sort();
        users
    }

    /// Drop all typing state of a channel
    pub fn clear_channel(&self, cid: &ChannelId) {
        self.entries.remove(cid);
    }
}
