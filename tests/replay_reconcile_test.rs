// Integration tests for reconciliation against a replay file edited between refreshes

use nas_state::config::FetchConfig;
use nas_state::resource::PoolStatus;
use nas_state::transport::ReplayTransport;
use nas_state::{Machine, Transport, TransportError};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

fn pool(guid: &str, name: &str, status: Value) -> Value {
    json!({
        "encrypt": false,
        "encryptkey": null,
        "guid": guid,
        "id": 1,
        "is_decrypted": true,
        "name": name,
        "status": status,
        "topology": { "data": [], "log": [], "cache": [], "spare": [] }
    })
}

fn write_host(path: &Path, pools: Value) {
    let host = json!({
        "system.info": { "hostname": "nas01", "version": "FreeNAS-11.3" },
        "disk.query": [],
        "vm.query": [],
        "pool.query": pools
    });
    std::fs::write(path, serde_json::to_vec_pretty(&host).unwrap()).unwrap();
}

async fn connect(path: &Path) -> Machine {
    let transport: Arc<dyn Transport> = Arc::new(ReplayTransport::new(path));
    Machine::connect(transport, &FetchConfig::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_pool_lifecycle_across_file_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("host.json");

    write_host(&path, json!([]));
    let machine = connect(&path).await;
    machine.refresh().await.unwrap();
    assert!(machine.pools().is_empty());

    // Pool imported
    write_host(&path, json!([pool("G1", "tank", json!("ONLINE"))]));
    machine.refresh().await.unwrap();
    let tank = machine.pools()[0].clone();
    assert_eq!(tank.guid(), "G1");
    assert!(tank.is_available());

    // Pool degrades
    write_host(&path, json!([pool("G1", "tank", json!(6))]));
    machine.refresh().await.unwrap();
    assert_eq!(tank.status(), Ok(PoolStatus::Degraded));

    // Pool exported; a second one shows up
    write_host(&path, json!([pool("G2", "backup", json!("ONLINE"))]));
    machine.refresh().await.unwrap();
    let pools = machine.pools();
    assert_eq!(pools.len(), 2);
    assert!(Arc::ptr_eq(&pools[0], &tank));
    assert!(!tank.is_available());
    assert_eq!(tank.name(), "tank");
    assert_eq!(tank.status(), Ok(PoolStatus::Degraded));
    assert_eq!(pools[1].name(), "backup");
}

#[tokio::test]
async fn test_unreadable_replay_keeps_last_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("host.json");

    write_host(&path, json!([pool("G1", "tank", json!("ONLINE"))]));
    let machine = connect(&path).await;
    machine.refresh().await.unwrap();

    std::fs::write(&path, "{ not json").unwrap();
    let err = machine.refresh().await.unwrap_err();

    assert!(matches!(err, TransportError::Malformed(_)));
    let pools = machine.pools();
    assert_eq!(pools.len(), 1);
    assert!(pools[0].is_available());
    assert_eq!(pools[0].name(), "tank");
}

#[tokio::test]
async fn test_pools_only_host_refreshes_pools() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("host.json");
    let host = json!({
        "system.info": { "hostname": "nas01" },
        "pool.query": [pool("G1", "tank", json!("ONLINE"))]
    });
    std::fs::write(&path, serde_json::to_vec_pretty(&host).unwrap()).unwrap();
    let machine = connect(&path).await;

    // The full refresh stops at the missing disk query
    assert!(matches!(
        machine.refresh().await,
        Err(TransportError::Remote { .. })
    ));
    assert!(machine.pools().is_empty());

    let pools = machine.refresh_pools().await.unwrap();
    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].guid(), "G1");
    assert_eq!(pools[0].status(), Ok(PoolStatus::Online));
}
