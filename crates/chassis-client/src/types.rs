//! Resource and configuration types for the device client.

use serde::{Deserialize, Serialize};

/// Connection parameters for one chassis switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Switch management address (host or host:port).
    pub address: String,
    /// API username.
    pub username: String,
    /// API password.
    pub password: String,
    /// API version, negotiated at client construction.
    pub api_version: String,
}

impl ClientConfig {
    /// Creates a new client configuration.
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
        }
    }

    /// Returns the versioned API endpoint for this switch.
    pub fn api_endpoint(&self) -> String {
        format!("http://{}/v{}.0", self.address, self.api_version)
    }
}

/// A chassis system - the top-level device object segments are added to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    /// Device-assigned system identifier.
    pub id: String,
}

/// An uplink interface on the chassis switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// Device-assigned interface identifier.
    pub id: String,
}

/// A server card attached to the chassis fabric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Device-assigned server identifier.
    pub id: String,
    /// NIC identifiers present on the server.
    #[serde(default)]
    pub nics: Vec<String>,
}
