//! URL construction for operator-supplied hosts.
//!
//! Hosts arrive from the command line either bare (`cwds.example.com:8080`) or
//! with a scheme (`http://localhost:8080`). Every component that talks HTTP
//! goes through [`build_url`] so the two spellings behave the same.

use crate::error::{Result, SmokeError};
use reqwest::Url;

const SCHEMES: [&str; 2] = ["http://", "https://"];

/// Returns true if `host` already starts with `http://` or `https://`.
///
/// Matching is case-insensitive and ignores leading whitespace.
pub fn has_http_scheme(host: &str) -> bool {
    let trimmed = host.trim_start();
    SCHEMES.iter().any(|scheme| {
        trimmed
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Builds a fully qualified URL from a host and a path.
///
/// Hosts without a scheme get `https://`. The path is resolved against the
/// host the way a browser resolves a link, so an absolute path replaces
/// whatever path the host carried and a query string is kept.
pub fn build_url(host: &str, path: &str) -> Result<Url> {
    let trimmed = host.trim();
    let base = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let invalid = |reason: String| SmokeError::InvalidUrl {
        host: host.to_string(),
        path: path.to_string(),
        reason,
    };

    let base = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
    base.join(path).map_err(|e| invalid(e.to_string()))
}
