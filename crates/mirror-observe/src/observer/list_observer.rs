//! List observer - watches a fetch specification over the commit feed

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use mirror_core::{ChannelId, ChannelRecord, StoreError, StoreResult};
use mirror_db::{ChannelListQuery, Commit, FetchSpec, StorageEngine};

use crate::diff::compute_list_diff;

use super::{ListEvent, ListObserving, Phase};

type Mapper<T> = Arc<dyn Fn(ChannelRecord) -> T + Send + Sync>;
type Comparator<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Observes the channel list matching a fetch specification
///
/// Each commit is turned into at most one `ListEvent::Changes`; commits that
/// leave the observed list untouched (under the observer's comparator) are
/// absorbed silently.
pub struct ListObserver<T = ChannelRecord> {
    engine: StorageEngine,
    spec: FetchSpec,
    map: Mapper<T>,
    is_equal: Comparator<T>,
    shared: Arc<Mutex<Shared<T>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct Shared<T> {
    phase: Phase,
    snapshot: Vec<(ChannelId, T)>,
    tx: Option<mpsc::UnboundedSender<ListEvent<T>>>,
}

impl ListObserver<ChannelRecord> {
    /// Observe raw channel records, compared by full equality
    pub fn new(engine: StorageEngine, spec: FetchSpec) -> Self {
        Self::with_comparator(engine, spec, |a: &ChannelRecord, b: &ChannelRecord| a == b)
    }

    /// Observe a channel-list query's materialized result set
    pub fn for_query(engine: StorageEngine, query: &ChannelListQuery) -> Self {
        Self::new(engine, query.fetch_spec())
    }

    /// Observe raw channel records with a custom comparator
    ///
    /// Commits that only touch fields the comparator ignores produce no event.
    pub fn with_comparator<F>(engine: StorageEngine, spec: FetchSpec, is_equal: F) -> Self
    where
        F: Fn(&ChannelRecord, &ChannelRecord) -> bool + Send + Sync + 'static,
    {
        Self::with_mapper(engine, spec, |record| record, is_equal)
    }
}

impl<T> ListObserver<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Observe mapped items derived from channel records
    pub fn with_mapper<M, F>(engine: StorageEngine, spec: FetchSpec, map: M, is_equal: F) -> Self
    where
        M: Fn(ChannelRecord) -> T + Send + Sync + 'static,
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            engine,
            spec,
            map: Arc::new(map),
            is_equal: Arc::new(is_equal),
            shared: Arc::new(Mutex::new(Shared {
                phase: Phase::Idle,
                snapshot: Vec::new(),
                tx: None,
            })),
            task: Mutex::new(None),
        }
    }

    fn fetch_keyed(
        engine: &StorageEngine,
        spec: &FetchSpec,
        map: &Mapper<T>,
    ) -> StoreResult<Vec<(ChannelId, T)>> {
        let rows = engine.fetch(spec)?;
        Ok(rows
            .into_iter()
            .map(|record| (record.cid.clone(), map(record)))
            .collect())
    }

    /// Diff the freshly fetched list against the snapshot and deliver
    ///
    /// Runs under the shared lock, so `stop_observing` can guarantee that no
    /// event lands after it returns.
    fn refresh(
        engine: &StorageEngine,
        spec: &FetchSpec,
        map: &Mapper<T>,
        is_equal: &Comparator<T>,
        shared: &Mutex<Shared<T>>,
    ) {
        let fetched = Self::fetch_keyed(engine, spec, map);

        let mut state = shared.lock();
        if state.phase != Phase::Active {
            return;
        }
        let Some(tx) = state.tx.clone() else { return };

        match fetched {
            Ok(next) => {
                let diff = compute_list_diff(&state.snapshot, &next, |a, b| is_equal(a, b));
                if !diff.is_empty() {
                    // Receiver gone means the consumer hung up; keep the
                    // snapshot current anyway
                    let _ = tx.send(ListEvent::Changes(diff));
                }
                state.snapshot = next;
            }
            Err(err) => {
                tracing::warn!(error = %err, "List refresh failed");
                let _ = tx.send(ListEvent::Failed(err));
            }
        }
    }

    async fn observe_loop(
        mut feed: broadcast::Receiver<Commit>,
        engine: StorageEngine,
        spec: FetchSpec,
        map: Mapper<T>,
        is_equal: Comparator<T>,
        shared: Arc<Mutex<Shared<T>>>,
    ) {
        loop {
            match feed.recv().await {
                Ok(_) => {}
                // Missed commits collapse into one recomputation
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "Commit feed lagged, recomputing");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
            Self::refresh(&engine, &spec, &map, &is_equal, &shared);
        }
    }
}

impl<T> ListObserving<T> for ListObserver<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn start_observing(&self) -> StoreResult<mpsc::UnboundedReceiver<ListEvent<T>>> {
        let runtime = Handle::try_current().map_err(|_| {
            StoreError::Observation("observer requires a running async runtime".into())
        })?;

        // Subscribe before the initial fetch so no commit falls between them
        let feed = self.engine.subscribe();
        let initial = Self::fetch_keyed(&self.engine, &self.spec, &self.map)
            .map_err(|e| StoreError::Observation(format!("initial fetch failed: {e}")))?;

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut state = self.shared.lock();
            match state.phase {
                Phase::Idle => {}
                Phase::Active => {
                    return Err(StoreError::Lifecycle("observer is already active".into()))
                }
                Phase::Stopped => {
                    return Err(StoreError::Lifecycle(
                        "observer was stopped and cannot be restarted".into(),
                    ))
                }
            }
            state.phase = Phase::Active;
            state.snapshot = initial;
            state.tx = Some(tx);
        }

        let handle = runtime.spawn(Self::observe_loop(
            feed,
            self.engine.clone(),
            self.spec.clone(),
            Arc::clone(&self.map),
            Arc::clone(&self.is_equal),
            Arc::clone(&self.shared),
        ));
        *self.task.lock() = Some(handle);

        Ok(rx)
    }

    fn stop_observing(&self) {
        {
            let mut state = self.shared.lock();
            state.phase = Phase::Stopped;
            state.tx = None;
        }
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }

    fn items(&self) -> StoreResult<Vec<T>> {
        let state = self.shared.lock();
        match state.phase {
            Phase::Active => Ok(state.snapshot.iter().map(|(_, item)| item.clone()).collect()),
            Phase::Idle => Err(StoreError::Lifecycle(
                "observer has not been started".into(),
            )),
            Phase::Stopped => Err(StoreError::Lifecycle("observer was stopped".into())),
        }
    }
}

impl<T> Drop for ListObserver<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }
}
