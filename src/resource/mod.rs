// Remote entity kinds observed by the state fetcher

mod disk;
mod pool;
mod status;
mod vm;

pub use disk::{DiskRecord, DiskType};
pub use pool::{CachingPool, PoolRecord, PoolStateFetcher, PoolStatus};
pub use status::{RawStatus, StatusEnum, UnknownStatus};
pub use vm::{VmRecord, VmState, VmStatus};

use crate::transport::{query, Transport, TransportError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// A kind of remote entity that can be fetched and reconciled.
///
/// Each record carries a key that the remote system keeps stable for the
/// entity's lifetime; the fetcher keys its snapshot and its handles on it.
#[async_trait]
pub trait Resource: DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    type Key: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static;

    /// Short name used in logs ("pool", "disk", "vm")
    const KIND: &'static str;

    /// Remote query method (e.g. "pool.query")
    const QUERY_METHOD: &'static str;

    /// Fields requested in the query's `select` option
    const FIELDS: &'static [&'static str];

    fn key(&self) -> &Self::Key;

    /// Fetch every entity of this kind.
    ///
    /// The default issues a single fetch-all query. Kinds that need
    /// follow-up calls to complete their records override this.
    async fn fetch_all(transport: &dyn Transport) -> Result<Vec<Self>, TransportError> {
        query(transport, Self::QUERY_METHOD, Self::FIELDS).await
    }
}
