//! Waiting for provisioned apps to come up.
//!
//! Apps are polled with exponential backoff instead of sleeping for a fixed
//! amount of time up front.

use crate::config::ReadinessConfig;
use crate::error::{Result, SmokeError};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Apps the load run cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKind {
    /// Workspace data service.
    Wds,
    /// Workflow submission service, deployed as a CROMWELL app.
    Cbas,
}

impl AppKind {
    /// Key under `proxyUrls` in the app listing.
    pub fn proxy_key(self) -> &'static str {
        match self {
            Self::Wds => "wds",
            Self::Cbas => "cbas",
        }
    }

    /// `appType` in the app listing.
    pub fn app_type(self) -> &'static str {
        match self {
            Self::Wds => "WDS",
            Self::Cbas => "CROMWELL",
        }
    }
}

/// What the app listing says about one app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Running and reachable at the given proxy URL.
    Ready(String),
    /// Listed but still provisioning.
    Provisioning,
    /// Not listed (yet).
    Missing,
}

/// Finds `kind` in a Leonardo app listing.
pub fn find_app(apps: &Value, kind: AppKind) -> AppState {
    let Some(apps) = apps.as_array() else {
        return AppState::Missing;
    };

    for app in apps {
        if app.get("appType").and_then(Value::as_str) != Some(kind.app_type()) {
            continue;
        }
        let Some(url) = app
            .get("proxyUrls")
            .and_then(|urls| urls.get(kind.proxy_key()))
            .and_then(Value::as_str)
        else {
            continue;
        };

        if app.get("status").and_then(Value::as_str) == Some("PROVISIONING") {
            return AppState::Provisioning;
        }
        return AppState::Ready(url.to_string());
    }

    AppState::Missing
}

/// Blocks the current thread. Swapped out in tests.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeper backed by `std::thread::sleep`.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Polls until `poll` reports the app ready or the timeout is used up.
///
/// Waiting time is accounted as the sum of the backoff delays, so the
/// timeout bounds the time spent sleeping rather than time spent in calls.
pub fn wait_for_app(
    app: AppKind,
    workspace_id: &str,
    readiness: &ReadinessConfig,
    sleeper: &dyn Sleeper,
    mut poll: impl FnMut() -> Result<AppState>,
) -> Result<String> {
    let mut waited = Duration::ZERO;
    let mut attempt = 0u32;

    loop {
        let state = poll()?;
        debug!(app = app.proxy_key(), workspace_id, ?state, attempt, "app state");
        if let AppState::Ready(url) = state {
            return Ok(url);
        }

        if waited >= readiness.timeout() {
            return Err(SmokeError::NotReady {
                app: app.proxy_key().to_string(),
                workspace_id: workspace_id.to_string(),
                waited_secs: waited.as_secs(),
            });
        }

        let delay = readiness
            .delay_for(attempt)
            .min(readiness.timeout() - waited);
        sleeper.sleep(delay);
        waited += delay;
        attempt += 1;
    }
}
