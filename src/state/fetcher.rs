use crate::config::FetchConfig;
use crate::resource::Resource;
use crate::state::handle::EntityHandle;
use crate::state::snapshot::{KeyNotFound, Snapshot};
use crate::transport::{Transport, TransportError};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Snapshot and handle list, always replaced together.
pub(crate) struct FetcherState<R: Resource> {
    pub(crate) snapshot: Arc<Snapshot<R>>,
    pub(crate) handles: Vec<Arc<EntityHandle<R>>>,
}

impl<R: Resource> FetcherState<R> {
    /// Record for `key` in the current snapshot. `KeyNotFound` is how a
    /// handle learns it is unavailable.
    pub(crate) fn lookup(&self, key: &R::Key) -> Result<Arc<R>, KeyNotFound> {
        self.snapshot.lookup(key)
    }
}

pub(crate) type SharedState<R> = RwLock<FetcherState<R>>;

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Caching state fetcher for one kind of remote entity.
///
/// Owns the current snapshot and the ordered list of handles. `refresh`
/// pulls a new snapshot and reconciles the handles against it:
/// - a handle whose key is still present keeps its identity and gets the
///   new record as its cached copy
/// - a handle whose key disappeared stays in the list (unavailable) and
///   keeps serving its last record
/// - a key seen for the first time gets a new handle, appended after the
///   existing ones in response order
///
/// Refreshes are serialized; readers never block on the remote call and
/// never see the snapshot and handle list out of step.
pub struct StateFetcher<R: Resource> {
    transport: Arc<dyn Transport>,
    state: Arc<SharedState<R>>,
    refresh_gate: Mutex<()>,
    timeout: Option<Duration>,
}

impl<R: Resource> StateFetcher<R> {
    /// Create a fetcher bound to `transport`, with no state until the
    /// first refresh.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: Arc::new(RwLock::new(FetcherState {
                snapshot: Arc::new(Snapshot::empty()),
                handles: Vec::new(),
            })),
            refresh_gate: Mutex::new(()),
            timeout: None,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &FetchConfig) -> Self {
        let fetcher = Self::new(transport);
        match config.timeout() {
            Some(limit) => fetcher.with_timeout(limit),
            None => fetcher,
        }
    }

    /// Bound each remote call; expiry fails the refresh with `Timeout`.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Pull a new snapshot and reconcile handles against it.
    ///
    /// On error (including timeout, or the returned future being dropped
    /// before completion) the previous snapshot and handles are untouched.
    pub async fn refresh(&self) -> Result<Vec<Arc<EntityHandle<R>>>, TransportError> {
        let _gate = self.refresh_gate.lock().await;

        let records = match self.fetch().await {
            Ok(records) => records,
            Err(e) => {
                warn!(kind = R::KIND, error = %e, "Refresh failed, keeping previous state");
                return Err(e);
            }
        };

        Ok(self.apply(Snapshot::from_records(records)))
    }

    async fn fetch(&self) -> Result<Vec<R>, TransportError> {
        debug!(kind = R::KIND, method = R::QUERY_METHOD, "Fetching remote state");

        let fetch = R::fetch_all(self.transport.as_ref());
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| TransportError::Timeout)?,
            None => fetch.await,
        }
    }

    /// Swap in `snapshot` and reconcile, as one step under the write lock.
    fn apply(&self, snapshot: Snapshot<R>) -> Vec<Arc<EntityHandle<R>>> {
        let mut state = write_lock(&self.state);

        let mut retained = 0;
        for handle in &state.handles {
            if let Some(record) = snapshot.get(handle.key()) {
                handle.store(Arc::clone(record));
                retained += 1;
            }
        }
        let unavailable = state.handles.len() - retained;

        let added: Vec<Arc<EntityHandle<R>>> = {
            let tracked: HashSet<&R::Key> = state.handles.iter().map(|h| h.key()).collect();
            snapshot
                .iter()
                .filter(|(key, _)| !tracked.contains(key))
                .map(|(key, record)| {
                    Arc::new(EntityHandle::new(
                        key.clone(),
                        Arc::clone(record),
                        Arc::downgrade(&self.state),
                    ))
                })
                .collect()
        };

        info!(
            kind = R::KIND,
            entities = snapshot.len(),
            retained = retained,
            added = added.len(),
            unavailable = unavailable,
            "Reconciled remote state"
        );

        state.handles.extend(added);
        state.snapshot = Arc::new(snapshot);
        state.handles.clone()
    }

    /// Current handles, without contacting the remote host.
    pub fn handles(&self) -> Vec<Arc<EntityHandle<R>>> {
        read_lock(&self.state).handles.clone()
    }

    /// Tracked handle for `key`, available or not.
    pub fn get(&self, key: &R::Key) -> Option<Arc<EntityHandle<R>>> {
        read_lock(&self.state)
            .handles
            .iter()
            .find(|h| h.key() == key)
            .cloned()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot<R>> {
        Arc::clone(&read_lock(&self.state).snapshot)
    }

    /// Time of the last successful refresh, if any.
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        read_lock(&self.state).snapshot.fetched_at()
    }

    /// Stop tracking the handle for `key`.
    ///
    /// Callers holding the handle can keep reading from it. If the key shows
    /// up in a later snapshot it gets a new handle.
    pub fn release(&self, key: &R::Key) -> Option<Arc<EntityHandle<R>>> {
        let mut state = write_lock(&self.state);
        let index = state.handles.iter().position(|h| h.key() == key)?;
        Some(state.handles.remove(index))
    }

    /// Release every handle whose key is absent from the current snapshot.
    pub fn prune_unavailable(&self) -> usize {
        let mut state = write_lock(&self.state);
        let FetcherState { snapshot, handles } = &mut *state;

        let before = handles.len();
        handles.retain(|h| snapshot.contains(h.key()));
        let pruned = before - handles.len();

        if pruned > 0 {
            info!(kind = R::KIND, pruned = pruned, "Released unavailable handles");
        }
        pruned
    }
}
