//! Error types for device client operations.

use thiserror::Error;

/// Result type alias for device client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors from a chassis switch client.
///
/// `UnsupportedVersion` is raised once, at client construction, and is
/// fatal to that switch for the lifetime of the driver. Every other
/// variant covers a single remote call: connectivity loss, authentication
/// failure, or device-side rejection.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The requested API version is not recognized.
    #[error("API version '{requested}' is not supported (supported: {supported})")]
    UnsupportedVersion {
        /// The version asked for at construction.
        requested: String,
        /// Comma-separated list of versions this client speaks.
        supported: String,
    },

    /// The request never completed (connection, DNS, timeout).
    #[error("Request to '{url}' failed: {source}")]
    Transport {
        /// The URL of the failed request.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The device rejected the supplied credentials.
    #[error("Authentication with '{endpoint}' failed")]
    AuthFailed {
        /// The API endpoint that rejected the credentials.
        endpoint: String,
    },

    /// The device rejected the request.
    #[error("Device rejected {operation} (status {status}): {message}")]
    Rejected {
        /// The operation that was rejected.
        operation: String,
        /// HTTP status code returned by the device.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// A referenced resource does not exist on the device.
    #[error("{kind} '{id}' not found on device")]
    NotFound {
        /// Resource kind ("system", "interface", "server").
        kind: String,
        /// The resource identifier.
        id: String,
    },

    /// The device returned a payload the client could not decode.
    #[error("Invalid response from '{url}': {message}")]
    InvalidResponse {
        /// The URL the payload came from.
        url: String,
        /// Decode failure detail.
        message: String,
    },
}

impl ClientError {
    /// Creates an unsupported-version error.
    pub fn unsupported_version(requested: impl Into<String>, supported: &[&str]) -> Self {
        Self::UnsupportedVersion {
            requested: requested.into(),
            supported: supported.join(", "),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            message: message.into(),
        }
    }
}
