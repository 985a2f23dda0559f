//! User token validation against a token-info endpoint.

use crate::error::{Result, SmokeError};
use crate::http::Transport;
use reqwest::Url;
use tracing::debug;

/// Checks a bearer token once at startup.
pub struct TokenValidator<'t> {
    transport: &'t dyn Transport,
    endpoint: String,
}

impl<'t> TokenValidator<'t> {
    /// Creates a validator that queries `endpoint` through `transport`.
    pub fn new(transport: &'t dyn Transport, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    /// Returns `Ok(())` if the endpoint accepts `token`.
    ///
    /// The token travels as the `access_token` query parameter, not as an
    /// Authorization header.
    pub fn validate(&self, token: &str) -> Result<()> {
        let url = Url::parse_with_params(&self.endpoint, &[("access_token", token)]).map_err(
            |e| SmokeError::InvalidUrl {
                host: self.endpoint.clone(),
                path: String::new(),
                reason: e.to_string(),
            },
        )?;

        let response = self.transport.get(&url, None)?;
        debug!(status = response.status, "token-info response");

        if response.is_success() {
            Ok(())
        } else {
            Err(SmokeError::TokenRejected {
                status: response.status,
                body: response.body,
            })
        }
    }
}
