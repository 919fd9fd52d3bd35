//! Driver configuration.
//!
//! Configuration is a static list of switches, each with credentials, an
//! API version and a host map. The list order is significant: postcommit
//! device calls and host resolution both iterate switches in configured
//! order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use crate::error::{DriverError, DriverResult};

/// Connection and host-mapping configuration for one chassis switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// Switch management address.
    pub address: String,
    /// API username.
    pub username: String,
    /// API password.
    pub password: String,
    /// Device API version.
    pub api_version: String,
    /// Compute host ID -> "serverId[,nic...]". An empty NIC remainder
    /// means the whole server is tagged.
    #[serde(default)]
    pub hosts: HashMap<String, String>,
}

impl SwitchConfig {
    /// Creates a switch entry with an empty host map.
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            password: password.into(),
            api_version: api_version.into(),
            hosts: HashMap::new(),
        }
    }

    /// Adds a host mapping entry.
    pub fn with_host(mut self, host_id: impl Into<String>, mapping: impl Into<String>) -> Self {
        self.hosts.insert(host_id.into(), mapping.into());
        self
    }
}

/// Static configuration for the provisioning driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Switches in iteration order.
    #[serde(default)]
    pub switches: Vec<SwitchConfig>,
}

impl DriverConfig {
    /// Creates a configuration from a list of switches.
    pub fn new(switches: Vec<SwitchConfig>) -> Self {
        Self { switches }
    }

    /// Parses a configuration from YAML text.
    pub fn from_yaml(text: &str) -> DriverResult<Self> {
        serde_yaml::from_str(text).map_err(|e| DriverError::config(e.to_string()))
    }

    /// Loads a configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> DriverResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DriverError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    /// Returns host IDs that appear in more than one switch's host map.
    ///
    /// Duplicates are tolerated at resolution time (first configured switch
    /// wins) but almost certainly indicate a configuration mistake.
    pub fn duplicate_hosts(&self) -> Vec<String> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for switch in &self.switches {
            for host in switch.hosts.keys() {
                *seen.entry(host.as_str()).or_default() += 1;
            }
        }
        let mut duplicates: Vec<String> = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(host, _)| host.to_string())
            .collect();
        duplicates.sort();
        duplicates
    }

    /// Logs a warning for every host mapped by more than one switch.
    pub fn log_duplicate_hosts(&self) {
        for host in self.duplicate_hosts() {
            warn!(
                "Host '{}' is mapped by multiple switches, first configured switch wins",
                host
            );
        }
    }
}
