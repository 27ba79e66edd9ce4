//! The storage engine
//!
//! One engine value is shared (cheaply cloned) by every session and observer
//! in the process. Sessions stage mutations privately; `apply` serializes
//! commits, persists the snapshot for on-disk stores, swaps the table state,
//! and publishes exactly one commit notification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use mirror_common::StoreKind;
use mirror_core::{
    ChannelId, ChannelRecord, MemberRecord, MessageId, MessageRecord, StoreResult, UserId,
    UserRecord,
};

use crate::query::QueryRecord;
use crate::session::{Staged, WriteSession};
use crate::spec::FetchSpec;

use super::snapshot;
use super::tables::Tables;

const DEFAULT_COMMIT_FEED_BUFFER: usize = 256;

/// A committed transaction, as seen on the commit feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    /// Monotonic commit sequence number
    pub seq: u64,
}

/// Shared storage engine handle
#[derive(Clone)]
pub struct StorageEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    kind: StoreKind,
    tables: RwLock<Tables>,
    /// Serializes commits; held from apply start until the new state is visible
    commit_lock: Mutex<()>,
    commit_seq: AtomicU64,
    commit_tx: broadcast::Sender<Commit>,
}

impl StorageEngine {
    /// Open a store of the given kind
    ///
    /// On-disk stores load their snapshot here; a corrupt or unreadable
    /// snapshot surfaces as `StoreError::Storage` and nothing is opened.
    pub fn open(kind: StoreKind) -> StoreResult<Self> {
        Self::open_with_buffer(kind, DEFAULT_COMMIT_FEED_BUFFER)
    }

    /// Open a store with an explicit commit feed buffer size
    pub fn open_with_buffer(kind: StoreKind, commit_feed_buffer: usize) -> StoreResult<Self> {
        let tables = match kind.snapshot_path() {
            Some(path) => snapshot::load(path)?,
            None => Tables::default(),
        };

        let (commit_tx, _) = broadcast::channel(commit_feed_buffer);
        tracing::debug!(persistent = kind.is_persistent(), "Opened storage engine");

        Ok(Self {
            inner: Arc::new(EngineInner {
                kind,
                tables: RwLock::new(tables),
                commit_lock: Mutex::new(()),
                commit_seq: AtomicU64::new(0),
                commit_tx,
            }),
        })
    }

    /// Open a volatile in-memory store
    pub fn in_memory() -> Self {
        let (commit_tx, _) = broadcast::channel(DEFAULT_COMMIT_FEED_BUFFER);
        Self {
            inner: Arc::new(EngineInner {
                kind: StoreKind::InMemory,
                tables: RwLock::new(Tables::default()),
                commit_lock: Mutex::new(()),
                commit_seq: AtomicU64::new(0),
                commit_tx,
            }),
        }
    }

    /// Begin a write session
    pub fn begin(&self) -> WriteSession {
        WriteSession::new(self.clone())
    }

    /// Subscribe to the commit feed
    ///
    /// Every commit is published exactly once, after its state is visible.
    pub fn subscribe(&self) -> broadcast::Receiver<Commit> {
        self.inner.commit_tx.subscribe()
    }

    /// Fetch channel records matching a specification, in its total order
    pub fn fetch(&self, spec: &FetchSpec) -> StoreResult<Vec<ChannelRecord>> {
        Ok(self.inner.tables.read().fetch(spec))
    }

    /// Look up one channel by identity
    pub fn channel(&self, cid: &ChannelId) -> Option<ChannelRecord> {
        self.inner.tables.read().channels.get(cid).cloned()
    }

    /// Look up one user by identity
    pub fn user(&self, id: &UserId) -> Option<UserRecord> {
        self.inner.tables.read().users.get(id).cloned()
    }

    /// Look up one membership row
    pub fn member(&self, cid: &ChannelId, user_id: &UserId) -> Option<MemberRecord> {
        self.inner
            .tables
            .read()
            .members
            .get(cid)
            .and_then(|per_user| per_user.get(user_id))
            .cloned()
    }

    /// All members of a channel
    pub fn members_of(&self, cid: &ChannelId) -> Vec<MemberRecord> {
        self.inner
            .tables
            .read()
            .members
            .get(cid)
            .map(|per_user| per_user.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Look up one message by identity
    pub fn message(&self, id: &MessageId) -> Option<MessageRecord> {
        self.inner.tables.read().messages.get(id).cloned()
    }

    /// Look up a persisted query row by filter hash
    pub fn query(&self, filter_hash: &str) -> Option<QueryRecord> {
        self.inner.tables.read().queries.get(filter_hash).cloned()
    }

    /// Number of channel records
    pub fn channel_count(&self) -> usize {
        self.inner.tables.read().channels.len()
    }

    /// Number of user records
    pub fn user_count(&self) -> usize {
        self.inner.tables.read().users.len()
    }

    /// Committed channel the session merge logic reads through
    pub(crate) fn channel_for_merge(&self, cid: &ChannelId) -> Option<ChannelRecord> {
        self.channel(cid)
    }

    /// Clone of the committed table state, for session-local reads
    pub(crate) fn tables_snapshot(&self) -> Tables {
        self.inner.tables.read().clone()
    }

    /// Apply a staged session atomically
    ///
    /// For on-disk stores the snapshot is persisted before the state becomes
    /// visible; a persist failure leaves the committed state untouched.
    pub(crate) fn apply(&self, staged: Staged) -> StoreResult<Commit> {
        let _serialized = self.inner.commit_lock.lock();

        let mut next = self.inner.tables.read().clone();
        staged.apply_to(&mut next);

        if let Some(path) = self.inner.kind.snapshot_path() {
            snapshot::persist(path, &next)?;
        }

        *self.inner.tables.write() = next;

        let seq = self.inner.commit_seq.fetch_add(1, Ordering::AcqRel) + 1;
        let commit = Commit { seq };
        // No receivers is fine; observers come and go
        let _ = self.inner.commit_tx.send(commit);

        tracing::debug!(seq, "Committed write session");
        Ok(commit)
    }
}
