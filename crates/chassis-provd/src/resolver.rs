//! Host-to-switch resolution.
//!
//! Maps a compute host identifier to the switch it is attached to, the
//! server card behind that switch, and the NIC set to tag. Resolution
//! scans switches in configured order and the first switch whose host map
//! contains the host wins.

use std::collections::HashMap;
use tracing::warn;

use crate::config::DriverConfig;

/// Where a compute host attaches to the fabric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAttachment {
    /// Management address of the switch the host hangs off.
    pub switch_address: String,
    /// Server card identifier on that switch.
    pub server_id: String,
    /// NICs to tag; empty means every NIC of the server.
    pub nics: Vec<String>,
}

/// Resolves compute hosts to their switch attachment.
#[derive(Debug, Clone)]
pub struct HostResolver {
    // Configured switch order, which makes first-match deterministic.
    switches: Vec<(String, HashMap<String, String>)>,
}

impl HostResolver {
    /// Builds a resolver from the driver configuration.
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            switches: config
                .switches
                .iter()
                .map(|s| (s.address.clone(), s.hosts.clone()))
                .collect(),
        }
    }

    /// Resolves a host to its attachment, or `None` when no switch maps it.
    ///
    /// An unmapped host is a legitimate outcome, not an error: the caller
    /// skips device configuration for it.
    pub fn resolve(&self, host_id: &str) -> Option<HostAttachment> {
        for (address, hosts) in &self.switches {
            if let Some(mapping) = hosts.get(host_id) {
                return Self::parse_mapping(address, host_id, mapping);
            }
        }
        None
    }

    /// Parses a "serverId[,nic...]" mapping value.
    fn parse_mapping(address: &str, host_id: &str, mapping: &str) -> Option<HostAttachment> {
        let mut tokens = mapping.split(',').map(str::trim);

        let server_id = match tokens.next() {
            Some(server) if !server.is_empty() => server.to_string(),
            _ => {
                warn!(
                    "Ignoring malformed host mapping '{}' for host '{}' on switch {}",
                    mapping, host_id, address
                );
                return None;
            }
        };

        let nics = tokens
            .filter(|nic| !nic.is_empty())
            .map(str::to_string)
            .collect();

        Some(HostAttachment {
            switch_address: address.to_string(),
            server_id,
            nics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SwitchConfig;

    fn resolver() -> HostResolver {
        HostResolver::new(&DriverConfig::new(vec![
            SwitchConfig::new("10.0.0.5", "admin", "secret", "2")
                .with_host("h-1", "srv-7,eth0,eth1")
                .with_host("h-2", "srv-8"),
            SwitchConfig::new("10.0.0.6", "admin", "secret", "2")
                .with_host("h-1", "srv-3")
                .with_host("h-3", "srv-9, eth2"),
        ]))
    }

    #[test]
    fn test_resolve_with_nic_restriction() {
        let attachment = resolver().resolve("h-1").unwrap();
        assert_eq!(attachment.switch_address, "10.0.0.5");
        assert_eq!(attachment.server_id, "srv-7");
        assert_eq!(attachment.nics, vec!["eth0", "eth1"]);
    }

    #[test]
    fn test_resolve_without_nic_restriction() {
        let attachment = resolver().resolve("h-2").unwrap();
        assert_eq!(attachment.server_id, "srv-8");
        assert!(attachment.nics.is_empty());
    }

    #[test]
    fn test_resolve_trims_whitespace() {
        let attachment = resolver().resolve("h-3").unwrap();
        assert_eq!(attachment.server_id, "srv-9");
        assert_eq!(attachment.nics, vec!["eth2"]);
    }

    #[test]
    fn test_resolve_unknown_host() {
        assert!(resolver().resolve("h-404").is_none());
    }

    #[test]
    fn test_first_configured_switch_wins() {
        // h-1 appears on both switches; the first configured one wins.
        let attachment = resolver().resolve("h-1").unwrap();
        assert_eq!(attachment.switch_address, "10.0.0.5");
        assert_eq!(attachment.server_id, "srv-7");
    }

    #[test]
    fn test_malformed_mapping_is_unresolved() {
        let resolver = HostResolver::new(&DriverConfig::new(vec![SwitchConfig::new(
            "10.0.0.5",
            "admin",
            "secret",
            "2",
        )
        .with_host("h-bad", ",eth0")]));

        assert!(resolver.resolve("h-bad").is_none());
    }
}
