use crate::config::FetchConfig;
use crate::resource::{DiskRecord, PoolRecord, VmRecord};
use crate::state::{EntityHandle, StateFetcher};
use crate::transport::{Transport, TransportError};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;


/// One session with a remote host.
///
/// Holds the host's `system.info` and one caching fetcher per entity kind,
/// all sharing the same transport.
pub struct Machine {
    transport: Arc<dyn Transport>,
    info: Value,
    pools: StateFetcher<PoolRecord>,
    disks: StateFetcher<DiskRecord>,
    vms: StateFetcher<VmRecord>,
}

impl Machine {
    /// Start a session: read `system.info` and set up empty fetchers.
    pub async fn connect(
        transport: Arc<dyn Transport>,
        config: &FetchConfig,
    ) -> Result<Self, TransportError> {
        let info = transport.invoke("system.info", vec![]).await?;

        let hostname = info.get("hostname").and_then(|v| v.as_str()).unwrap_or("unknown");
        let version = info.get("version").and_then(|v| v.as_str()).unwrap_or("unknown");
        info!(hostname = %hostname, version = %version, "Connected to remote host");

        Ok(Self {
            pools: StateFetcher::from_config(Arc::clone(&transport), config),
            disks: StateFetcher::from_config(Arc::clone(&transport), config),
            vms: StateFetcher::from_config(Arc::clone(&transport), config),
            transport,
            info,
        })
    }

    /// Refresh disks, virtual machines and pools, in that order.
    ///
    /// Stops at the first failure; kinds refreshed before it keep their new
    /// state, the failing kind and the ones after it keep their old state.
    pub async fn refresh(&self) -> Result<(), TransportError> {
        self.refresh_disks().await?;
        self.refresh_vms().await?;
        self.refresh_pools().await?;
        Ok(())
    }

    /// Refresh pools only, leaving disks and virtual machines untouched.
    pub async fn refresh_pools(
        &self,
    ) -> Result<Vec<Arc<EntityHandle<PoolRecord>>>, TransportError> {
        self.pools.refresh().await
    }

    pub async fn refresh_disks(
        &self,
    ) -> Result<Vec<Arc<EntityHandle<DiskRecord>>>, TransportError> {
        self.disks.refresh().await
    }

    pub async fn refresh_vms(
        &self,
    ) -> Result<Vec<Arc<EntityHandle<VmRecord>>>, TransportError> {
        self.vms.refresh().await
    }

    /// Result of `system.info` at connect time
    pub fn info(&self) -> &Value {
        &self.info
    }

    pub fn pools(&self) -> Vec<Arc<EntityHandle<PoolRecord>>> {
        self.pools.handles()
    }

    pub fn disks(&self) -> Vec<Arc<EntityHandle<DiskRecord>>> {
        self.disks.handles()
    }

    pub fn vms(&self) -> Vec<Arc<EntityHandle<VmRecord>>> {
        self.vms.handles()
    }

    pub fn pool_fetcher(&self) -> &StateFetcher<PoolRecord> {
        &self.pools
    }

    pub fn disk_fetcher(&self) -> &StateFetcher<DiskRecord> {
        &self.disks
    }

    pub fn vm_fetcher(&self) -> &StateFetcher<VmRecord> {
        &self.vms
    }

    /// Pass one raw call through to the transport.
    pub async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        self.transport.invoke(method, args).await
    }
}
