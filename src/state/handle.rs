use crate::resource::Resource;
use crate::state::fetcher::{read_lock, write_lock, SharedState};
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

/// Stable view of one remote entity across refresh cycles.
///
/// A handle is created the first time its key shows up in a snapshot and is
/// kept by the fetcher afterwards, so callers can hold on to it across
/// refreshes. Reads never fail because the entity went away: while the key
/// is in the fetcher's current snapshot the live record is returned,
/// otherwise the last record this handle observed.
///
/// The handle does not keep its fetcher alive. Once the fetcher is dropped
/// every read falls back to the cached record.
pub struct EntityHandle<R: Resource> {
    key: R::Key,
    fetcher: Weak<SharedState<R>>,
    cached: RwLock<Arc<R>>,
}

impl<R: Resource> EntityHandle<R> {
    pub(crate) fn new(key: R::Key, record: Arc<R>, fetcher: Weak<SharedState<R>>) -> Self {
        Self {
            key,
            fetcher,
            cached: RwLock::new(record),
        }
    }

    /// Key this handle was created for; never changes.
    pub fn key(&self) -> &R::Key {
        &self.key
    }

    /// Whether the entity is present in the fetcher's current snapshot.
    pub fn is_available(&self) -> bool {
        self.live_record().is_some()
    }

    /// Latest known record: live when available, cached otherwise.
    ///
    /// The whole record comes from one source, so fields read from the
    /// returned value are never a mix of live and stale data.
    pub fn record(&self) -> Arc<R> {
        self.live_record().unwrap_or_else(|| self.cached_record())
    }

    /// Record from the current snapshot, if the entity is in it.
    pub fn live_record(&self) -> Option<Arc<R>> {
        let shared = self.fetcher.upgrade()?;
        let state = read_lock(&*shared);
        state.lookup(&self.key).ok()
    }

    /// Last record this handle observed while available.
    pub fn cached_record(&self) -> Arc<R> {
        Arc::clone(&read_lock(&self.cached))
    }

    /// Called by the fetcher, under its state lock, for every refresh that
    /// still contains this key.
    pub(crate) fn store(&self, record: Arc<R>) {
        *write_lock(&self.cached) = record;
    }
}

impl<R: Resource> fmt::Debug for EntityHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityHandle")
            .field("kind", &R::KIND)
            .field("key", &self.key)
            .field("available", &self.is_available())
            .finish()
    }
}
