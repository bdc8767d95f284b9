// Caching state fetcher and stable entity handles

mod fetcher;
mod handle;
mod snapshot;

pub use fetcher::StateFetcher;
pub use handle::EntityHandle;
pub use snapshot::Snapshot;
