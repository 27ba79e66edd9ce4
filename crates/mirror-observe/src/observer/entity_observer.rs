//! Entity observer - watches a single record over the commit feed

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use mirror_core::{ChannelId, ChannelRecord, StoreError, StoreResult, UserId, UserRecord};
use mirror_db::{Commit, StorageEngine};

use super::{EntityEvent, EntityObserving, Phase};

type Fetcher<T> = Arc<dyn Fn(&StorageEngine) -> Option<T> + Send + Sync>;

/// Observes one entity by identity
///
/// Each commit is classified against the previously seen value: appearance
/// is `Created`, a changed record is `Updated`, disappearance is `Removed`
/// carrying the last known record. Commits that leave the entity untouched
/// are absorbed silently.
pub struct EntityObserver<T> {
    engine: StorageEngine,
    fetch: Fetcher<T>,
    shared: Arc<Mutex<Shared<T>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct Shared<T> {
    phase: Phase,
    current: Option<T>,
    tx: Option<mpsc::UnboundedSender<EntityEvent<T>>>,
}

impl EntityObserver<ChannelRecord> {
    /// Observe one channel
    pub fn channel(engine: StorageEngine, cid: ChannelId) -> Self {
        Self::with_fetcher(engine, move |e| e.channel(&cid))
    }
}

impl EntityObserver<UserRecord> {
    /// Observe one user
    pub fn user(engine: StorageEngine, id: UserId) -> Self {
        Self::with_fetcher(engine, move |e| e.user(&id))
    }
}

impl<T> EntityObserver<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Observe whatever the fetcher reads from the engine
    pub fn with_fetcher<F>(engine: StorageEngine, fetch: F) -> Self
    where
        F: Fn(&StorageEngine) -> Option<T> + Send + Sync + 'static,
    {
        Self {
            engine,
            fetch: Arc::new(fetch),
            shared: Arc::new(Mutex::new(Shared {
                phase: Phase::Idle,
                current: None,
                tx: None,
            })),
            task: Mutex::new(None),
        }
    }

    fn refresh(engine: &StorageEngine, fetch: &Fetcher<T>, shared: &Mutex<Shared<T>>) {
        let next = fetch(engine);

        let mut state = shared.lock();
        if state.phase != Phase::Active {
            return;
        }
        let Some(tx) = state.tx.clone() else { return };

        let event = match (&state.current, &next) {
            (None, Some(value)) => Some(EntityEvent::Created(value.clone())),
            (Some(prev), Some(value)) if prev != value => {
                Some(EntityEvent::Updated(value.clone()))
            }
            (Some(prev), None) => Some(EntityEvent::Removed(prev.clone())),
            _ => None,
        };

        if let Some(event) = event {
            let _ = tx.send(event);
        }
        state.current = next;
    }

    async fn observe_loop(
        mut feed: broadcast::Receiver<Commit>,
        engine: StorageEngine,
        fetch: Fetcher<T>,
        shared: Arc<Mutex<Shared<T>>>,
    ) {
        loop {
            match feed.recv().await {
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "Commit feed lagged, recomputing");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
            Self::refresh(&engine, &fetch, &shared);
        }
    }
}

impl<T> EntityObserving<T> for EntityObserver<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn start_observing(&self) -> StoreResult<mpsc::UnboundedReceiver<EntityEvent<T>>> {
        let runtime = Handle::try_current().map_err(|_| {
            StoreError::Observation("observer requires a running async runtime".into())
        })?;

        // Subscribe before the initial read so no commit falls between them
        let feed = self.engine.subscribe();
        let initial = (self.fetch)(&self.engine);

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
            state.current = initial;
            state.tx = Some(tx);
        }

        let handle = runtime.spawn(Self::observe_loop(
            feed,
            self.engine.clone(),
            Arc::clone(&self.fetch),
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

    fn item(&self) -> StoreResult<Option<T>> {
        let state = self.shared.lock();
        match state.phase {
            Phase::Active => Ok(state.current.clone()),
            Phase::Idle => Err(StoreError::Lifecycle(
                "observer has not been started".into(),
            )),
            Phase::Stopped => Err(StoreError::Lifecycle("observer was stopped".into())),
        }
    }
}

impl<T> Drop for EntityObserver<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }
}
