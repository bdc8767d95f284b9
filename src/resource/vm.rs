use super::{RawStatus, Resource, StatusEnum, UnknownStatus};
use crate::state::EntityHandle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Virtual machine as returned by `vm.query`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VmRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: VmStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VmStatus {
    #[serde(default)]
    pub pid: Option<u32>,
    pub state: RawStatus,
}

impl Resource for VmRecord {
    type Key = u64;

    const KIND: &'static str = "vm";
    const QUERY_METHOD: &'static str = "vm.query";
    const FIELDS: &'static [&'static str] = &["id", "name", "description", "status"];

    fn key(&self) -> &u64 {
        &self.id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VmState {
    Running,
    Stopped,
    Suspended,
}

impl StatusEnum for VmState {
    const KIND: &'static str = "vm state";
    const VALUES: &'static [(Option<i64>, &'static str, Self)] = &[
        (None, "RUNNING", VmState::Running),
        (None, "STOPPED", VmState::Stopped),
        (None, "SUSPENDED", VmState::Suspended),
    ];
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.remote_name())
    }
}

impl EntityHandle<VmRecord> {
    pub fn id(&self) -> u64 {
        *self.key()
    }

    pub fn name(&self) -> String {
        self.record().name.clone()
    }

    pub fn description(&self) -> String {
        self.record().description.clone()
    }

    /// Run state, only while the VM exists on the host.
    ///
    /// Unlike the descriptive fields this is not served from cache: a VM
    /// that is gone has no run state.
    pub fn state(&self) -> Result<Option<VmState>, UnknownStatus> {
        self.live_record()
            .map(|record| VmState::decode(&record.status.state))
            .transpose()
    }

    /// Process id of a running VM, only while the VM exists on the host.
    pub fn pid(&self) -> Option<u32> {
        self.live_record().and_then(|record| record.status.pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stopped_vm_has_no_pid() {
        let record: VmRecord = serde_json::from_value(json!({
            "description": "",
            "id": 3,
            "name": "vm02",
            "status": { "pid": null, "state": "STOPPED" }
        }))
        .unwrap();

        assert_eq!(record.status.pid, None);
        assert_eq!(VmState::decode(&record.status.state), Ok(VmState::Stopped));
    }

    #[test]
    fn test_unknown_vm_state() {
        let err = VmState::decode(&"PAUSED".into()).unwrap_err();
        assert_eq!(err.kind, "vm state");
    }
}
