use super::{RawStatus, Resource, StatusEnum, UnknownStatus};
use crate::state::EntityHandle;
use crate::transport::{query, Transport, TransportError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::fmt;

/// Disk as returned by `disk.query`, plus its temperature
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiskRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(rename = "type")]
    pub disk_type: RawStatus,
    /// Filled from `disk.temperatures`; not part of the query selection
    #[serde(default)]
    pub temperature: Option<f64>,
}

#[async_trait]
impl Resource for DiskRecord {
    type Key = String;

    const KIND: &'static str = "disk";
    const QUERY_METHOD: &'static str = "disk.query";
    const FIELDS: &'static [&'static str] =
        &["description", "model", "name", "serial", "size", "type"];

    fn key(&self) -> &String {
        &self.name
    }

    /// Query disks, then merge in temperatures with a second call.
    async fn fetch_all(transport: &dyn Transport) -> Result<Vec<Self>, TransportError> {
        let mut disks: Vec<DiskRecord> =
            query(transport, Self::QUERY_METHOD, Self::FIELDS).await?;
        if disks.is_empty() {
            return Ok(disks);
        }

        let names: Vec<String> = disks.iter().map(|d| d.name.clone()).collect();
        let result = transport
            .invoke("disk.temperatures", vec![json!(names)])
            .await?;
        let temperatures: HashMap<String, Option<f64>> = serde_json::from_value(result)
            .map_err(|e| TransportError::Malformed(format!("disk.temperatures result: {}", e)))?;

        for disk in &mut disks {
            if let Some(temperature) = temperatures.get(&disk.name) {
                disk.temperature = *temperature;
            }
        }

        Ok(disks)
    }
}

/// Disk medium
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiskType {
    Hdd,
    Ssd,
}

impl StatusEnum for DiskType {
    const KIND: &'static str = "disk type";
    const VALUES: &'static [(Option<i64>, &'static str, Self)] =
        &[(None, "HDD", DiskType::Hdd), (None, "SSD", DiskType::Ssd)];
}

impl fmt::Display for DiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.remote_name())
    }
}

impl EntityHandle<DiskRecord> {
    pub fn name(&self) -> &str {
        self.key()
    }

    pub fn description(&self) -> String {
        self.record().description.clone()
    }

    pub fn model(&self) -> Option<String> {
        self.record().model.clone()
    }

    pub fn serial(&self) -> Option<String> {
        self.record().serial.clone()
    }

    /// Size in bytes
    pub fn size(&self) -> Option<u64> {
        self.record().size
    }

    pub fn disk_type(&self) -> Result<DiskType, UnknownStatus> {
        DiskType::decode(&self.record().disk_type)
    }

    /// Celsius, when the host reports one
    pub fn temperature(&self) -> Option<f64> {
        self.record().temperature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::StubTransport;
    use serde_json::Value;

    fn disk(name: &str) -> Value {
        json!({
            "description": "",
            "model": "WDC WD40EFRX",
            "name": name,
            "serial": format!("WD-{}", name),
            "size": 4000787030016u64,
            "type": "HDD"
        })
    }

    #[tokio::test]
    async fn test_fetch_merges_temperatures() {
        let stub = StubTransport::new();
        stub.respond("disk.query", json!([disk("ada0"), disk("ada1")]));
        stub.register("disk.temperatures", |args| {
            assert_eq!(args, &[json!(["ada0", "ada1"])]);
            Ok(json!({ "ada0": 34.0, "ada1": null }))
        });

        let disks = DiskRecord::fetch_all(&stub).await.unwrap();

        assert_eq!(disks.len(), 2);
        assert_eq!(disks[0].temperature, Some(34.0));
        assert_eq!(disks[1].temperature, None);
    }

    #[tokio::test]
    async fn test_fetch_skips_temperatures_without_disks() {
        let stub = StubTransport::new();
        stub.respond("disk.query", json!([]));

        let disks = DiskRecord::fetch_all(&stub).await.unwrap();

        assert!(disks.is_empty());
        assert_eq!(stub.call_count("disk.temperatures"), 0);
    }

    #[tokio::test]
    async fn test_temperature_failure_fails_fetch() {
        let stub = StubTransport::new();
        stub.respond("disk.query", json!([disk("ada0")]));

        let err = DiskRecord::fetch_all(&stub).await.unwrap_err();
        assert!(matches!(err, TransportError::Remote { .. }));
    }

    #[test]
    fn test_disk_type_decoding() {
        assert_eq!(DiskType::decode(&"SSD".into()), Ok(DiskType::Ssd));
        assert!(DiskType::decode(&"NVME".into()).is_err());
    }
}
