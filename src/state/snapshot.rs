use crate::resource::Resource;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Key absent from the current snapshot.
///
/// Only used between the fetcher and its handles to pick live or cached
/// data; never returned to callers of the public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyNotFound;

/// Immutable view of every entity of one kind at one point in time.
///
/// Replaced wholesale on each successful refresh. Iteration follows the
/// order in which keys first appeared in the remote response.
pub struct Snapshot<R: Resource> {
    records: HashMap<R::Key, Arc<R>>,
    order: Vec<R::Key>,
    fetched_at: Option<DateTime<Utc>>,
}

impl<R: Resource> Snapshot<R> {
    /// Snapshot before the first refresh
    pub fn empty() -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
            fetched_at: None,
        }
    }

    /// Build a snapshot from a remote response.
    ///
    /// Duplicate keys are accepted: the last record wins, the key keeps the
    /// position of its first occurrence.
    pub fn from_records(records: Vec<R>) -> Self {
        let mut snapshot = Self {
            records: HashMap::with_capacity(records.len()),
            order: Vec::with_capacity(records.len()),
            fetched_at: Some(Utc::now()),
        };

        for record in records {
            let key = record.key().clone();
            if snapshot.records.insert(key.clone(), Arc::new(record)).is_some() {
                debug!(kind = R::KIND, key = %key, "Duplicate key in response, last record wins");
            } else {
                snapshot.order.push(key);
            }
        }

        snapshot
    }

    pub fn get(&self, key: &R::Key) -> Option<&Arc<R>> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &R::Key) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in response order
    pub fn keys(&self) -> impl Iterator<Item = &R::Key> {
        self.order.iter()
    }

    /// Records in response order
    pub fn iter(&self) -> impl Iterator<Item = (&R::Key, &Arc<R>)> {
        self.order
            .iter()
            .filter_map(move |key| self.records.get(key).map(|record| (key, record)))
    }

    /// When the response behind this snapshot was received
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub(crate) fn lookup(&self, key: &R::Key) -> Result<Arc<R>, KeyNotFound> {
        self.records.get(key).cloned().ok_or(KeyNotFound)
    }
}

impl<R: Resource> Default for Snapshot<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R: Resource> fmt::Debug for Snapshot<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("kind", &R::KIND)
            .field("keys", &self.order)
            .field("fetched_at", &self.fetched_at)
            .finish()
    }
}
