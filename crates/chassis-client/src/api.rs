//! Capability trait for chassis switch clients.

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::types::{Interface, Server, System};

/// The fixed capability set the provisioning driver needs from a chassis
/// switch, implemented by concrete adapter types per device family.
///
/// Implementations are stateless proxies: one instance per switch, shared
/// across concurrent invocations. The remote device is the point of
/// serialization. Mutating calls are not retried here.
#[async_trait]
pub trait ChassisClient: Send + Sync {
    /// Lists the chassis systems. Segment registration targets the first.
    async fn list_systems(&self) -> ClientResult<Vec<System>>;

    /// Registers a VLAN segment on a chassis system.
    async fn add_segment(&self, system_id: &str, vlan_id: &str) -> ClientResult<()>;

    /// Removes a VLAN segment from a chassis system.
    async fn remove_segment(&self, system_id: &str, vlan_id: &str) -> ClientResult<()>;

    /// Lists every uplink interface on the switch.
    async fn list_interfaces(&self) -> ClientResult<Vec<Interface>>;

    /// Allows tagged traffic for a VLAN on an uplink interface.
    async fn add_tagged_vlan(&self, interface_id: &str, vlan_id: &str) -> ClientResult<()>;

    /// Stops tagged traffic for a VLAN on an uplink interface.
    async fn remove_tagged_vlan(&self, interface_id: &str, vlan_id: &str) -> ClientResult<()>;

    /// Looks up a server card by identifier.
    async fn get_server(&self, server_id: &str) -> ClientResult<Server>;

    /// Tags a VLAN on a server's NICs.
    ///
    /// An empty `nics` slice applies the tag to every NIC of the server.
    async fn set_tagged_vlan(
        &self,
        server_id: &str,
        vlan_id: &str,
        nics: &[String],
    ) -> ClientResult<()>;

    /// Untags a VLAN from a server's NICs.
    ///
    /// An empty `nics` slice removes the tag from every NIC of the server.
    async fn unset_tagged_vlan(
        &self,
        server_id: &str,
        vlan_id: &str,
        nics: &[String],
    ) -> ClientResult<()>;
}
