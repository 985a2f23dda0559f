//! Error types for smoke_core operations.

use thiserror::Error;

/// Core error type for smoke_core operations.
#[derive(Error, Debug)]
pub enum SmokeError {
    /// A host/path pair could not be turned into a URL.
    #[error("invalid URL for host {host:?} and path {path:?}: {reason}")]
    InvalidUrl {
        /// Host as supplied by the operator
        host: String,
        /// Path that was being joined
        path: String,
        /// Parser message
        reason: String,
    },

    /// Network failure talking to a remote service.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The token-info endpoint did not accept the user token.
    #[error("user token is no longer valid (HTTP {status}); generate a new token and try again: {body}")]
    TokenRejected {
        /// Status returned by the token-info endpoint
        status: u16,
        /// Response body returned by the token-info endpoint
        body: String,
    },

    /// A provisioning call returned a status other than the one expected.
    #[error("{context} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        /// Which call was being made
        context: String,
        /// Status returned
        status: u16,
        /// Response body returned
        body: String,
    },

    /// A response body could not be decoded.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration error (missing variables, unreadable or invalid file).
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error reading local resources.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A provisioned app never became ready.
    #[error("{app} app in workspace {workspace_id} not ready after {waited_secs}s")]
    NotReady {
        /// App name (`wds` or `cbas`)
        app: String,
        /// Workspace the app belongs to
        workspace_id: String,
        /// Seconds spent waiting
        waited_secs: u64,
    },
}

impl SmokeError {
    /// Returns a user-friendly recovery suggestion for the error, if available.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::TokenRejected { .. } => {
                Some("Generate a fresh token (e.g. 'gcloud auth print-access-token') and rerun.")
            }
            Self::InvalidUrl { .. } => {
                Some("Pass the host as 'example.com', 'example.com:8080' or 'https://example.com'.")
            }
            Self::Http(_) => Some("Check that the host is reachable from this machine."),
            Self::Config(_) => {
                Some("Set AZURE_TOKEN, BEE_NAME and BILLING_PROJECT_NAME before running the load test.")
            }
            Self::NotReady { .. } => {
                Some("Raise [readiness].timeout_secs in the load-test config if apps start slowly.")
            }
            _ => None,
        }
    }
}

/// Convenience Result type for smoke_core operations.
pub type Result<T> = std::result::Result<T, SmokeError>;
