// Transport seam to the remote host
pub mod transport;

// Remote entity kinds and status decoding
pub mod resource;

// Caching state fetcher and entity handles
pub mod state;

// Session over one remote host
pub mod machine;

// Configuration
pub mod config;

pub use machine::Machine;
pub use resource::{CachingPool, PoolStateFetcher};
pub use state::{EntityHandle, Snapshot, StateFetcher};
pub use transport::{Transport, TransportError};
