//! Write session - stages validated payloads and commits them atomically
//!
//! A session buffers its mutations privately; nothing is visible to readers
//! or observers until `commit`. The first failed operation poisons the
//! session: later operations are refused and `commit` returns the original
//! error, so a malformed payload can never commit a partial entity graph.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use mirror_core::{
    payloads::{ChannelPayload, MemberPayload, MessagePayload, UserPayload},
    ChannelId, ChannelRecord, MemberRecord, MessageId, MessageRecord, StoreError, StoreResult,
    UserId, UserRecord,
};
use validator::Validate;

use crate::engine::{Commit, StorageEngine, Tables};
use crate::query::{ChannelListQuery, QueryRecord};
use crate::spec::FetchSpec;

/// Mutations staged by one session, applied to the tables in one commit
#[derive(Debug, Clone, Default)]
pub(crate) struct Staged {
    users: HashMap<UserId, UserRecord>,
    channels: HashMap<ChannelId, ChannelRecord>,
    members: HashMap<ChannelId, HashMap<UserId, MemberRecord>>,
    messages: HashMap<MessageId, MessageRecord>,
    queries: HashMap<String, QueryRecord>,
    associations: Vec<(String, ChannelId)>,
    deleted_channels: HashSet<ChannelId>,
}

impl Staged {
    /// Apply every staged mutation to a table state
    ///
    /// Upserts land first, deletions last, so a channel deleted in the same
    /// session wins over its earlier upsert.
    pub(crate) fn apply_to(&self, tables: &mut Tables) {
        for (id, user) in &self.users {
            tables.users.insert(id.clone(), user.clone());
        }
        for (cid, channel) in &self.channels {
            tables.channels.insert(cid.clone(), channel.clone());
        }
        for (cid, per_user) in &self.members {
            let slot = tables.members.entry(cid.clone()).or_default();
            for (user_id, member) in per_user {
                slot.insert(user_id.clone(), member.clone());
            }
        }
        for (id, message) in &self.messages {
            if let Some(channel) = tables.channels.get_mut(&message.cid) {
                channel.observe_message_at(message.created_at);
            }
            tables.messages.insert(id.clone(), message.clone());
        }
        for (hash, query) in &self.queries {
            tables
                .queries
                .entry(hash.clone())
                .or_insert_with(|| query.clone());
        }
        for (hash, cid) in &self.associations {
            tables
                .associations
                .entry(hash.clone())
                .or_default()
                .insert(cid.clone());
        }
        for cid in &self.deleted_channels {
            tables.remove_channel(cid);
        }
    }
}

/// A single transactional write against the store
///
/// Dropping an uncommitted session rolls it back.
pub struct WriteSession {
    engine: StorageEngine,
    staged: Staged,
    aborted: Option<StoreError>,
}

impl WriteSession {
    pub(crate) fn new(engine: StorageEngine) -> Self {
        Self {
            engine,
            staged: Staged::default(),
            aborted: None,
        }
    }

    /// Upsert a channel from a payload, optionally linking it to a query
    ///
    /// The creator and every listed member (with their users) are saved in
    /// the same session. An absent member list leaves existing membership
    /// untouched. Fields the payload carries overwrite the stored record;
    /// a stale embedded config does not roll back a newer stored one.
    /// Returns the merged record as it will commit.
    pub fn save_channel(
        &mut self,
        payload: &ChannelPayload,
        query: Option<&ChannelListQuery>,
    ) -> StoreResult<ChannelRecord> {
        self.check_open()?;
        self.validate(payload)?;

        let detail = &payload.channel;
        let cid = detail.cid.clone();

        if let Some(creator) = &detail.created_by {
            self.stage_user(creator);
        }

        let existing = self.read_channel(&cid);
        let mut record = ChannelRecord {
            cid: cid.clone(),
            created_by: detail
                .created_by
                .as_ref()
                .map(|u| u.id.clone())
                .or_else(|| existing.as_ref().and_then(|c| c.created_by.clone())),
            config: detail.config.clone(),
            frozen: detail.frozen,
            member_count: detail.member_count,
            team: detail.team.clone(),
            last_message_at: detail.last_message_at,
            created_at: detail.created_at,
            updated_at: detail.updated_at,
            deleted_at: detail.deleted_at,
            extra: detail.extra.clone(),
        };
        if let Some(existing) = &existing {
            // An older embedded config never regresses the stored one
            if existing.config.updated_at > record.config.updated_at {
                record.config = existing.config.clone();
            }
            if let Some(at) = existing.last_message_at {
                record.observe_message_at(at);
            }
        }

        self.staged.deleted_channels.remove(&cid);
        self.staged.channels.insert(cid.clone(), record.clone());

        if let Some(members) = &payload.members {
            for member in members {
                self.stage_member(&cid, member);
            }
        }

        if let Some(query) = query {
            let hash = query.filter_hash();
            self.staged
                .queries
                .entry(hash.clone())
                .or_insert_with(|| QueryRecord::new(query, Utc::now()));
            self.staged.associations.push((hash, cid));
        }

        Ok(record)
    }

    /// Upsert a user from a payload
    pub fn save_user(&mut self, payload: &UserPayload) -> StoreResult<()> {
        self.check_open()?;
        self.validate(payload)?;
        self.stage_user(payload);
        Ok(())
    }

    /// Upsert a membership row; the owning channel must already exist
    pub fn save_member(&mut self, cid: &ChannelId, payload: &MemberPayload) -> StoreResult<()> {
        self.check_open()?;
        self.validate(payload)?;

        if self.read_channel(cid).is_none() {
            let err = StoreError::Validation(format!(
                "cannot save member of unknown channel {cid}"
            ));
            self.aborted = Some(err.clone());
            return Err(err);
        }

        self.stage_member(cid, payload);
        Ok(())
    }

    /// Upsert a message; advances the channel's `last_message_at`
    pub fn save_message(&mut self, payload: &MessagePayload) -> StoreResult<()> {
        self.check_open()?;
        self.validate(payload)?;

        if self.read_channel(&payload.cid).is_none() {
            let err = StoreError::Validation(format!(
                "cannot save message for unknown channel {}",
                payload.cid
            ));
            self.aborted = Some(err.clone());
            return Err(err);
        }

        self.stage_user(&payload.user);
        let message = MessageRecord {
            id: payload.id.clone(),
            cid: payload.cid.clone(),
            author: payload.user.id.clone(),
            text: payload.text.clone(),
            created_at: payload.created_at,
            extra: payload.extra.clone(),
        };
        // Staged channels get their timestamp advanced here; committed ones
        // are advanced during apply
        if let Some(channel) = self.staged.channels.get_mut(&message.cid) {
            channel.observe_message_at(message.created_at);
        }
        self.staged.messages.insert(message.id.clone(), message);
        Ok(())
    }

    /// Stage a channel removal, cascading its members and messages
    pub fn delete_channel(&mut self, cid: &ChannelId) -> StoreResult<()> {
        self.check_open()?;
        self.staged.channels.remove(cid);
        self.staged.members.remove(cid);
        self.staged.messages.retain(|_, message| message.cid != *cid);
        self.staged.deleted_channels.insert(cid.clone());
        Ok(())
    }

    /// Read a channel with read-your-writes visibility
    pub fn channel(&self, cid: &ChannelId) -> Option<ChannelRecord> {
        self.read_channel(cid)
    }

    /// Fetch with read-your-writes visibility
    ///
    /// Evaluates the specification over the committed state with this
    /// session's staged mutations applied on top. Other sessions' uncommitted
    /// work is never visible.
    pub fn fetch(&self, spec: &FetchSpec) -> StoreResult<Vec<ChannelRecord>> {
        let mut tables = self.engine.tables_snapshot();
        self.staged.apply_to(&mut tables);
        Ok(tables.fetch(spec))
    }

    /// Commit the session, making all staged mutations visible atomically
    pub fn commit(mut self) -> StoreResult<Commit> {
        if let Some(err) = self.aborted.take() {
            tracing::warn!(error = %err, "Refusing to commit aborted session");
            return Err(err);
        }
        let staged = std::mem::take(&mut self.staged);
        self.engine.apply(staged)
    }

    /// Discard the session without committing
    pub fn rollback(self) {
        // Dropping discards the staged state
    }

    fn check_open(&self) -> StoreResult<()> {
        match &self.aborted {
            Some(err) => Err(StoreError::Lifecycle(format!(
                "session aborted by earlier error: {err}"
            ))),
            None => Ok(()),
        }
    }

    fn validate<T: Validate>(&mut self, payload: &T) -> StoreResult<()> {
        if let Err(errors) = payload.validate() {
            let err = StoreError::from(errors);
            self.aborted = Some(err.clone());
            return Err(err);
        }
        Ok(())
    }

    fn read_channel(&self, cid: &ChannelId) -> Option<ChannelRecord> {
        if self.staged.deleted_channels.contains(cid) {
            return None;
        }
        self.staged
            .channels
            .get(cid)
            .cloned()
            .or_else(|| self.engine.channel_for_merge(cid))
    }

    fn stage_user(&mut self, payload: &UserPayload) {
        let record = UserRecord {
            id: payload.id.clone(),
            role: payload.role,
            online: payload.online,
            invisible: payload.invisible,
            banned: payload.banned,
            teams: payload.teams.clone(),
            created_at: payload.created_at,
            updated_at: payload.updated_at,
            last_active_at: payload.last_active_at,
            extra: payload.extra.clone(),
        };
        self.staged.users.insert(record.id.clone(), record);
    }

    fn stage_member(&mut self, cid: &ChannelId, payload: &MemberPayload) {
        self.stage_user(&payload.user);
        let record = MemberRecord {
            cid: cid.clone(),
            user_id: payload.user.id.clone(),
            role: payload.role,
            member_created_at: payload.created_at,
            member_updated_at: payload.updated_at,
        };
        self.staged
            .members
            .entry(cid.clone())
            .or_default()
            .insert(record.user_id.clone(), record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ChannelField, Filter};
    use chrono::{TimeDelta, Utc};
    use mirror_core::{ChannelConfig, MemberRole, UserRole};

    fn user_payload(id: &str) -> UserPayload {
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

    fn member_payload(id: &str) -> MemberPayload {
        let now = Utc::now();
        MemberPayload {
            user: user_payload(id),
            role: MemberRole::Member,
            created_at: now,
            updated_at: now,
        }
    }

    fn channel_payload(cid: &str) -> ChannelPayload {
        let now = Utc::now();
        ChannelPayload {
            channel: mirror_core::payloads::ChannelDetailPayload {
                cid: ChannelId::parse(cid).unwrap(),
                created_by: Some(user_payload("creator")),
                config: ChannelConfig::new(now),
                frozen: false,
                member_count: 0,
                team: None,
                last_message_at: None,
                created_at: now,
                updated_at: now,
                deleted_at: None,
                extra: serde_json::Value::Null,
            },
            members: None,
        }
    }

    fn message_payload(id: &str, cid: &str, author: &str) -> MessagePayload {
        let now = Utc::now();
        MessagePayload {
            id: MessageId::from(id),
            cid: ChannelId::parse(cid).unwrap(),
            user: user_payload(author),
            text: "hello".into(),
            created_at: now,
            extra: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_channel_save_also_saves_creator() {
        let engine = StorageEngine::in_memory();
        let mut session = engine.begin();
        session.save_channel(&channel_payload("messaging:general"), None).unwrap();
        session.commit().unwrap();

        let user = engine.user(&UserId::from("creator")).unwrap();
        assert_eq!(user.id.as_str(), "creator");
        let channel = engine.channel(&ChannelId::new("messaging", "general")).unwrap();
        assert_eq!(channel.created_by, Some(UserId::from("creator")));
    }

    #[test]
    fn test_members_and_their_users_are_saved() {
        let engine = StorageEngine::in_memory();
        let mut payload = channel_payload("messaging:general");
        payload.members = Some(vec![member_payload("luke"), member_payload("leia")]);

        let mut session = engine.begin();
        session.save_channel(&payload, None).unwrap();
        session.commit().unwrap();

        let cid = ChannelId::new("messaging", "general");
        assert_eq!(engine.members_of(&cid).len(), 2);
        assert!(engine.user(&UserId::from("luke")).is_some());
        assert!(engine.user(&UserId::from("leia")).is_some());
    }

    #[test]
    fn test_absent_member_list_leaves_membership_untouched() {
        let engine = StorageEngine::in_memory();
        let cid = ChannelId::new("messaging", "general");

        let mut first = channel_payload("messaging:general");
        first.members = Some(vec![member_payload("luke")]);
        let mut session = engine.begin();
        session.save_channel(&first, None).unwrap();
        session.commit().unwrap();

        let mut second = channel_payload("messaging:general");
        second.channel.frozen = true;
        second.members = None;
        let mut session = engine.begin();
        session.save_channel(&second, None).unwrap();
        session.commit().unwrap();

        assert!(engine.channel(&cid).unwrap().frozen);
        assert_eq!(engine.members_of(&cid).len(), 1);
    }

    #[test]
    fn test_stale_embedded_config_does_not_regress() {
        let engine = StorageEngine::in_memory();
        let now = Utc::now();

        let mut fresh = channel_payload("messaging:general");
        fresh.channel.config = ChannelConfig {
            max_message_length: Some(5000),
            ..ChannelConfig::new(now)
        };
        let mut session = engine.begin();
        session.save_channel(&fresh, None).unwrap();
        session.commit().unwrap();

        let mut stale = channel_payload("messaging:general");
        stale.channel.config = ChannelConfig::new(now - TimeDelta::seconds(60));
        let mut session = engine.begin();
        session.save_channel(&stale, None).unwrap();
        session.commit().unwrap();

        let channel = engine.channel(&ChannelId::new("messaging", "general")).unwrap();
        assert_eq!(channel.config.max_message_length, Some(5000));
    }

    #[test]
    fn test_invalid_payload_poisons_session() {
        let engine = StorageEngine::in_memory();
        let mut session = engine.begin();

        let mut bad = channel_payload("messaging:general");
        bad.channel.cid = ChannelId::new("messaging", "");
        let err = session.save_channel(&bad, None).unwrap_err();
        assert!(err.is_validation());

        // Later operations are refused
        let err = session
            .save_channel(&channel_payload("messaging:general"), None)
            .unwrap_err();
        assert!(err.is_lifecycle());

        // Commit surfaces the original error and nothing lands
        let err = session.commit().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(engine.channel_count(), 0);
        assert_eq!(engine.user_count(), 0);
    }

    #[test]
    fn test_member_of_unknown_channel_is_rejected() {
        let engine = StorageEngine::in_memory();
        let mut session = engine.begin();
        let err = session
            .save_member(&ChannelId::new("messaging", "ghost"), &member_payload("luke"))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_message_advances_last_message_at() {
        let engine = StorageEngine::in_memory();
        let mut session = engine.begin();
        session.save_channel(&channel_payload("messaging:general"), None).unwrap();

        let mut message = message_payload("m1", "messaging:general", "luke");
        message.created_at = Utc::now() + TimeDelta::seconds(60);
        session.save_message(&message).unwrap();
        session.commit().unwrap();

        let channel = engine.channel(&ChannelId::new("messaging", "general")).unwrap();
        assert_eq!(channel.last_message_at, Some(message.created_at));
    }

    #[test]
    fn test_delete_channel_cascades() {
        let engine = StorageEngine::in_memory();
        let cid = ChannelId::new("messaging", "general");

        let mut payload = channel_payload("messaging:general");
        payload.members = Some(vec![member_payload("luke")]);
        let mut session = engine.begin();
        session.save_channel(&payload, None).unwrap();
        session.save_message(&message_payload("m1", "messaging:general", "luke")).unwrap();
        session.commit().unwrap();

        let mut session = engine.begin();
        session.delete_channel(&cid).unwrap();
        session.commit().unwrap();

        assert!(engine.channel(&cid).is_none());
        assert!(engine.members_of(&cid).is_empty());
        assert!(engine.message(&MessageId::from("m1")).is_none());
        // Users survive channel deletion
        assert!(engine.user(&UserId::from("luke")).is_some());
    }

    #[test]
    fn test_read_your_writes_within_session() {
        let engine = StorageEngine::in_memory();
        let mut session = engine.begin();
        let cid = ChannelId::new("messaging", "general");

        assert!(session.channel(&cid).is_none());
        session.save_channel(&channel_payload("messaging:general"), None).unwrap();
        assert!(session.channel(&cid).is_some());

        session.delete_channel(&cid).unwrap();
        assert!(session.channel(&cid).is_none());
    }

    #[test]
    fn test_session_fetch_sees_staged_writes() {
        let engine = StorageEngine::in_memory();
        let mut session = engine.begin();
        session.save_channel(&channel_payload("messaging:general"), None).unwrap();

        let spec = FetchSpec::all(vec![]);
        assert_eq!(session.fetch(&spec).unwrap().len(), 1);
        // Uncommitted staging stays invisible outside the session
        assert!(engine.fetch(&spec).unwrap().is_empty());
    }

    #[test]
    fn test_rollback_discards_staged_state() {
        let engine = StorageEngine::in_memory();
        let mut session = engine.begin();
        session.save_channel(&channel_payload("messaging:general"), None).unwrap();
        session.rollback();

        assert_eq!(engine.channel_count(), 0);
    }

    #[test]
    fn test_query_association_links_only_saved_channels() {
        let engine = StorageEngine::in_memory();
        let query = ChannelListQuery::new(Filter::equal(ChannelField::Kind, "messaging"));

        let mut session = engine.begin();
        session
            .save_channel(&channel_payload("messaging:general"), Some(&query))
            .unwrap();
        session.save_channel(&channel_payload("messaging:random"), None).unwrap();
        session.commit().unwrap();

        let rows = engine.fetch(&query.fetch_spec()).unwrap();
        let cids: Vec<String> = rows.iter().map(|r| r.cid.to_string()).collect();
        assert_eq!(cids, ["messaging:general"]);

        assert!(engine.query(&query.filter_hash()).is_some());
    }
}
