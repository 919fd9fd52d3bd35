//! Record types for the mirror store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network segmentation type.
///
/// Only VLAN segmentation is supported; parsing any other value fails and
/// the provisioning driver rejects the network up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// 802.1Q VLAN segmentation
    Vlan,
}

impl NetworkType {
    /// Returns the type name as stored in network records.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Vlan => "vlan",
        }
    }
}

impl FromStr for NetworkType {
    type Err = UnsupportedNetworkType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vlan" => Ok(NetworkType::Vlan),
            other => Err(UnsupportedNetworkType {
                network_type: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown network type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported network type '{network_type}', only 'vlan' is supported")]
pub struct UnsupportedNetworkType {
    /// The rejected type name.
    pub network_type: String,
}

/// A provisioned tenant network.
///
/// One record per logical network ID. The record is created by the network
/// precommit phase, re-read by postcommit (so postcommit can be replayed
/// from the store alone), and deleted on teardown or as compensation after
/// a failed device mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Logical network ID, assigned by the caller.
    pub id: String,
    /// String-encoded VLAN tag.
    pub vlan: String,
    /// Provider segment identifier.
    pub segment_id: String,
    /// Segmentation type.
    pub network_type: NetworkType,
    /// Owning tenant.
    pub tenant_id: String,
}

impl NetworkRecord {
    /// Creates a new VLAN network record.
    pub fn new(
        id: impl Into<String>,
        vlan: impl Into<String>,
        segment_id: impl Into<String>,
        network_type: NetworkType,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            vlan: vlan.into(),
            segment_id: segment_id.into(),
            network_type,
            tenant_id: tenant_id.into(),
        }
    }
}

/// A provisioned logical port.
///
/// `vlan_id` is a denormalized copy of the owning network's VLAN captured
/// at port-create time; it is never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRecord {
    /// Logical port ID.
    pub id: String,
    /// Owning network ID.
    pub network_id: String,
    /// VLAN tag copied from the owning network at creation.
    pub vlan_id: String,
    /// Owning tenant.
    pub tenant_id: String,
}

impl PortRecord {
    /// Creates a new port record.
    pub fn new(
        id: impl Into<String>,
        network_id: impl Into<String>,
        vlan_id: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            network_id: network_id.into(),
            vlan_id: vlan_id.into(),
            tenant_id: tenant_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_type_from_str() {
        assert_eq!("vlan".parse::<NetworkType>().unwrap(), NetworkType::Vlan);

        let err = "vxlan".parse::<NetworkType>().unwrap_err();
        assert_eq!(err.network_type, "vxlan");
        assert!(err.to_string().contains("vxlan"));
    }

    #[test]
    fn test_network_type_round_trip() {
        assert_eq!(NetworkType::Vlan.as_str(), "vlan");
        assert_eq!(NetworkType::Vlan.to_string(), "vlan");
    }

    #[test]
    fn test_network_record_new() {
        let net = NetworkRecord::new("net-1", "42", "seg-1", NetworkType::Vlan, "t1");
        assert_eq!(net.id, "net-1");
        assert_eq!(net.vlan, "42");
        assert_eq!(net.segment_id, "seg-1");
        assert_eq!(net.network_type, NetworkType::Vlan);
        assert_eq!(net.tenant_id, "t1");
    }

    #[test]
    fn test_port_record_new() {
        let port = PortRecord::new("p-1", "net-1", "42", "t1");
        assert_eq!(port.id, "p-1");
        assert_eq!(port.network_id, "net-1");
        assert_eq!(port.vlan_id, "42");
        assert_eq!(port.tenant_id, "t1");
    }
}
