use super::{RawStatus, Resource, StatusEnum, UnknownStatus};
use crate::state::{EntityHandle, StateFetcher};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Storage pool as returned by `pool.query`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub guid: String,
    pub encrypt: bool,
    #[serde(default)]
    pub encryptkey: Option<String>,
    pub id: u64,
    pub is_decrypted: bool,
    pub name: String,
    pub status: RawStatus,
    /// Vdev layout (`data`, `log`, `cache`, `spare`, ...), kept as sent
    pub topology: Value,
}

impl Resource for PoolRecord {
    type Key = String;

    const KIND: &'static str = "pool";
    const QUERY_METHOD: &'static str = "pool.query";
    const FIELDS: &'static [&'static str] = &[
        "encrypt",
        "encryptkey",
        "guid",
        "id",
        "is_decrypted",
        "name",
        "status",
        "topology",
    ];

    fn key(&self) -> &String {
        &self.guid
    }
}

/// Pool health.
///
/// Numeric codes are the ZFS vdev states (`vdev_state_t`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolStatus {
    Online,
    Degraded,
    Faulted,
    Offline,
    Unavail,
    Removed,
}

impl StatusEnum for PoolStatus {
    const KIND: &'static str = "pool status";
    const VALUES: &'static [(Option<i64>, &'static str, Self)] = &[
        (Some(7), "ONLINE", PoolStatus::Online),
        (Some(6), "DEGRADED", PoolStatus::Degraded),
        (Some(5), "FAULTED", PoolStatus::Faulted),
        (Some(4), "UNAVAIL", PoolStatus::Unavail),
        (Some(3), "REMOVED", PoolStatus::Removed),
        (Some(2), "OFFLINE", PoolStatus::Offline),
    ];
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.remote_name())
    }
}

/// Read-only pool view that survives refreshes
pub type CachingPool = EntityHandle<PoolRecord>;

/// Fetcher for `pool.query`
pub type PoolStateFetcher = StateFetcher<PoolRecord>;

impl EntityHandle<PoolRecord> {
    pub fn guid(&self) -> &str {
        self.key()
    }

    pub fn encrypt(&self) -> bool {
        self.record().encrypt
    }

    pub fn encryptkey(&self) -> Option<String> {
        self.record().encryptkey.clone()
    }

    pub fn id(&self) -> u64 {
        self.record().id
    }

    pub fn is_decrypted(&self) -> bool {
        self.record().is_decrypted
    }

    pub fn name(&self) -> String {
        self.record().name.clone()
    }

    /// Decoded pool health. Fails only this getter on an unknown value.
    pub fn status(&self) -> Result<PoolStatus, UnknownStatus> {
        PoolStatus::decode(&self.record().status)
    }

    pub fn topology(&self) -> Value {
        self.record().topology.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_by_name() {
        assert_eq!(PoolStatus::decode(&"ONLINE".into()), Ok(PoolStatus::Online));
        assert_eq!(PoolStatus::decode(&"DEGRADED".into()), Ok(PoolStatus::Degraded));
        assert_eq!(PoolStatus::decode(&"UNAVAIL".into()), Ok(PoolStatus::Unavail));
    }

    #[test]
    fn test_status_by_vdev_state_code() {
        assert_eq!(PoolStatus::decode(&7.into()), Ok(PoolStatus::Online));
        assert_eq!(PoolStatus::decode(&5.into()), Ok(PoolStatus::Faulted));
        assert_eq!(PoolStatus::decode(&2.into()), Ok(PoolStatus::Offline));

        // VDEV_STATE_UNKNOWN and VDEV_STATE_CLOSED are not pool states
        assert!(PoolStatus::decode(&0.into()).is_err());
        assert!(PoolStatus::decode(&1.into()).is_err());
        assert!(PoolStatus::decode(&42.into()).is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PoolStatus::Removed.to_string(), "REMOVED");
    }

    #[test]
    fn test_record_without_encryptkey() {
        let record: PoolRecord = serde_json::from_value(json!({
            "guid": "1234",
            "encrypt": false,
            "id": 1,
            "is_decrypted": true,
            "name": "tank",
            "status": "ONLINE",
            "topology": { "data": [] }
        }))
        .unwrap();

        assert_eq!(record.encryptkey, None);
        assert_eq!(record.key(), "1234");
    }

    #[test]
    fn test_record_requires_guid() {
        let result = serde_json::from_value::<PoolRecord>(json!({
            "encrypt": false,
            "id": 1,
            "is_decrypted": true,
            "name": "tank",
            "status": "ONLINE",
            "topology": {}
        }));
        assert!(result.is_err());
    }
}
