//! Error types for the provisioning driver.

use chassis_client::ClientError;
use chassis_mirror::StoreError;
use thiserror::Error;

/// Result type alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// The single failure signal surfaced to the lifecycle caller.
///
/// Every variant is fatal for the event that produced it; nothing is
/// retried inside the driver. The original cause is preserved as a source
/// and logged at the failure site.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The request content is unsupported or incomplete.
    #[error("Validation failed: {message}")]
    Validation {
        /// What was rejected.
        message: String,
    },

    /// The local mirror store failed.
    #[error("Mirror store operation failed")]
    Persistence {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// A required network record is absent from the mirror store.
    #[error("Network '{id}' not found in mirror store")]
    NetworkNotFound {
        /// The missing network ID.
        id: String,
    },

    /// A device call on one switch failed.
    #[error("Switch '{switch}' request failed")]
    Device {
        /// Management address of the failing switch.
        switch: String,
        /// The underlying client error.
        #[source]
        source: ClientError,
    },

    /// The driver configuration is unusable.
    #[error("Invalid driver configuration: {message}")]
    Config {
        /// What is wrong with the configuration.
        message: String,
    },
}

impl DriverError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a network-not-found error.
    pub fn network_not_found(id: impl Into<String>) -> Self {
        Self::NetworkNotFound { id: id.into() }
    }

    /// Creates a device failure error for one switch.
    pub fn device(switch: impl Into<String>, source: ClientError) -> Self {
        Self::Device {
            switch: switch.into(),
            source,
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
