//! Recording mock implementation of the chassis client.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chassis_client::{ChassisClient, ClientError, ClientResult, Interface, Server, System};

/// Identifies one capability of the device client, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceOp {
    ListSystems,
    AddSegment,
    RemoveSegment,
    ListInterfaces,
    AddTaggedVlan,
    RemoveTaggedVlan,
    GetServer,
    SetTaggedVlan,
    UnsetTaggedVlan,
}

impl DeviceOp {
    fn name(&self) -> &'static str {
        match self {
            DeviceOp::ListSystems => "list_systems",
            DeviceOp::AddSegment => "add_segment",
            DeviceOp::RemoveSegment => "remove_segment",
            DeviceOp::ListInterfaces => "list_interfaces",
            DeviceOp::AddTaggedVlan => "add_tagged_vlan",
            DeviceOp::RemoveTaggedVlan => "remove_tagged_vlan",
            DeviceOp::GetServer => "get_server",
            DeviceOp::SetTaggedVlan => "set_tagged_vlan",
            DeviceOp::UnsetTaggedVlan => "unset_tagged_vlan",
        }
    }
}

/// One recorded device call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    ListSystems,
    AddSegment {
        system_id: String,
        vlan_id: String,
    },
    RemoveSegment {
        system_id: String,
        vlan_id: String,
    },
    ListInterfaces,
    AddTaggedVlan {
        interface_id: String,
        vlan_id: String,
    },
    RemoveTaggedVlan {
        interface_id: String,
        vlan_id: String,
    },
    GetServer {
        server_id: String,
    },
    SetTaggedVlan {
        server_id: String,
        vlan_id: String,
        nics: Vec<String>,
    },
    UnsetTaggedVlan {
        server_id: String,
        vlan_id: String,
        nics: Vec<String>,
    },
}

impl DeviceCall {
    /// Returns true for calls that mutate device state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            DeviceCall::ListSystems | DeviceCall::ListInterfaces | DeviceCall::GetServer { .. }
        )
    }
}

/// In-memory chassis client that records calls and injects failures.
///
/// Seed the device view with `with_*` builders, script failures with
/// [`fail_on`](MockChassisClient::fail_on), then assert against
/// [`calls`](MockChassisClient::calls) after driving the code under test.
#[derive(Debug)]
pub struct MockChassisClient {
    systems: Vec<System>,
    interfaces: Vec<Interface>,
    servers: HashMap<String, Server>,
    calls: Mutex<Vec<DeviceCall>>,
    failures: Mutex<HashSet<DeviceOp>>,
}

impl Default for MockChassisClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChassisClient {
    /// Creates a mock with a single system `sys-0` and no interfaces or
    /// servers.
    pub fn new() -> Self {
        Self {
            systems: vec![System {
                id: "sys-0".to_string(),
            }],
            interfaces: Vec::new(),
            servers: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashSet::new()),
        }
    }

    /// Replaces the seeded systems.
    pub fn with_systems(mut self, ids: &[&str]) -> Self {
        self.systems = ids
            .iter()
            .map(|id| System { id: id.to_string() })
            .collect();
        self
    }

    /// Replaces the seeded uplink interfaces.
    pub fn with_interfaces(mut self, ids: &[&str]) -> Self {
        self.interfaces = ids
            .iter()
            .map(|id| Interface { id: id.to_string() })
            .collect();
        self
    }

    /// Adds a server card with the given NICs.
    pub fn with_server(mut self, id: &str, nics: &[&str]) -> Self {
        self.servers.insert(
            id.to_string(),
            Server {
                id: id.to_string(),
                nics: nics.iter().map(|n| n.to_string()).collect(),
            },
        );
        self
    }

    /// Scripts the given operation to fail with a device rejection.
    pub fn fail_on(self, op: DeviceOp) -> Self {
        self.failures.lock().unwrap().insert(op);
        self
    }

    /// Scripts or clears a failure after construction.
    pub fn set_failure(&self, op: DeviceOp, failing: bool) {
        let mut failures = self.failures.lock().unwrap();
        if failing {
            failures.insert(op);
        } else {
            failures.remove(&op);
        }
    }

    /// Returns every call recorded so far, in invocation order.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns only the recorded mutating calls.
    pub fn mutations(&self) -> Vec<DeviceCall> {
        self.calls()
            .into_iter()
            .filter(DeviceCall::is_mutation)
            .collect()
    }

    /// Clears the recorded calls.
    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: DeviceCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: DeviceOp) -> ClientResult<()> {
        if self.failures.lock().unwrap().contains(&op) {
            return Err(ClientError::Rejected {
                operation: op.name().to_string(),
                status: 500,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChassisClient for MockChassisClient {
    async fn list_systems(&self) -> ClientResult<Vec<System>> {
        self.record(DeviceCall::ListSystems);
        self.check(DeviceOp::ListSystems)?;
        Ok(self.systems.clone())
    }

    async fn add_segment(&self, system_id: &str, vlan_id: &str) -> ClientResult<()> {
        self.record(DeviceCall::AddSegment {
            system_id: system_id.to_string(),
            vlan_id: vlan_id.to_string(),
        });
        self.check(DeviceOp::AddSegment)
    }

    async fn remove_segment(&self, system_id: &str, vlan_id: &str) -> ClientResult<()> {
        self.record(DeviceCall::RemoveSegment {
            system_id: system_id.to_string(),
            vlan_id: vlan_id.to_string(),
        });
        self.check(DeviceOp::RemoveSegment)
    }

    async fn list_interfaces(&self) -> ClientResult<Vec<Interface>> {
        self.record(DeviceCall::ListInterfaces);
        self.check(DeviceOp::ListInterfaces)?;
        Ok(self.interfaces.clone())
    }

    async fn add_tagged_vlan(&self, interface_id: &str, vlan_id: &str) -> ClientResult<()> {
        self.record(DeviceCall::AddTaggedVlan {
            interface_id: interface_id.to_string(),
            vlan_id: vlan_id.to_string(),
        });
        self.check(DeviceOp::AddTaggedVlan)
    }

    async fn remove_tagged_vlan(&self, interface_id: &str, vlan_id: &str) -> ClientResult<()> {
        self.record(DeviceCall::RemoveTaggedVlan {
            interface_id: interface_id.to_string(),
            vlan_id: vlan_id.to_string(),
        });
        self.check(DeviceOp::RemoveTaggedVlan)
    }

    async fn get_server(&self, server_id: &str) -> ClientResult<Server> {
        self.record(DeviceCall::GetServer {
            server_id: server_id.to_string(),
        });
        self.check(DeviceOp::GetServer)?;
        self.servers
            .get(server_id)
            .cloned()
            .ok_or_else(|| ClientError::not_found("server", server_id))
    }

    async fn set_tagged_vlan(
        &self,
        server_id: &str,
        vlan_id: &str,
        nics: &[String],
    ) -> ClientResult<()> {
        self.record(DeviceCall::SetTaggedVlan {
            server_id: server_id.to_string(),
            vlan_id: vlan_id.to_string(),
            nics: nics.to_vec(),
        });
        self.check(DeviceOp::SetTaggedVlan)
    }

    async fn unset_tagged_vlan(
        &self,
        server_id: &str,
        vlan_id: &str,
        nics: &[String],
    ) -> ClientResult<()> {
        self.record(DeviceCall::UnsetTaggedVlan {
            server_id: server_id.to_string(),
            vlan_id: vlan_id.to_string(),
            nics: nics.to_vec(),
        });
        self.check(DeviceOp::UnsetTaggedVlan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let mock = MockChassisClient::new().with_interfaces(&["intf-1"]);

        mock.list_systems().await.unwrap();
        mock.add_segment("sys-0", "42").await.unwrap();
        mock.add_tagged_vlan("intf-1", "42").await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], DeviceCall::ListSystems);
        assert_eq!(
            calls[1],
            DeviceCall::AddSegment {
                system_id: "sys-0".to_string(),
                vlan_id: "42".to_string(),
            }
        );
        assert_eq!(mock.mutations().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let mock = MockChassisClient::new().fail_on(DeviceOp::AddSegment);

        let err = mock.add_segment("sys-0", "42").await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected { status: 500, .. }));

        // The failed call is still recorded.
        assert_eq!(mock.calls().len(), 1);

        mock.set_failure(DeviceOp::AddSegment, false);
        mock.add_segment("sys-0", "42").await.unwrap();
    }

    #[tokio::test]
    async fn test_get_server_not_found() {
        let mock = MockChassisClient::new().with_server("srv-7", &["eth0", "eth1"]);

        let server = mock.get_server("srv-7").await.unwrap();
        assert_eq!(server.nics, vec!["eth0", "eth1"]);

        let err = mock.get_server("srv-9").await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound { .. }));
    }
}
