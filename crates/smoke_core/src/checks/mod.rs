//! Smoke checks and the groups they belong to.
//!
//! A check makes one HTTP call through the run's [`MemoizedCaller`] and
//! asserts on the status code and/or body shape. Checks never depend on each
//! other's side effects and can run in any order.

mod jobs;
mod orchestration;
mod status;

use crate::config::{OrchestrationTarget, RunConfig};
use crate::error::SmokeError;
use crate::http::{HttpResponse, MemoizedCaller};
use crate::url::build_url;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

pub use jobs::AUTHENTICATED;
pub use orchestration::ORCHESTRATION;
pub use status::UNAUTHENTICATED;

/// Why a check did not pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// The service answered, but not the way it should have.
    Failure(String),
    /// The check could not be carried out (network, undecodable body, bad URL).
    Error(String),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failure(msg) | Self::Error(msg) => f.write_str(msg),
        }
    }
}

impl From<SmokeError> for CheckError {
    fn from(err: SmokeError) -> Self {
        Self::Error(err.to_string())
    }
}

/// Result type returned by check functions.
pub type CheckResult<T = ()> = std::result::Result<T, CheckError>;

/// A single named check.
#[derive(Clone, Copy)]
pub struct SmokeCheck {
    /// Identifier shown in failure details.
    pub name: &'static str,
    /// One-line description shown in verbose reports.
    pub description: &'static str,
    /// The check itself.
    pub run: fn(&CheckContext<'_>) -> CheckResult,
}

impl fmt::Debug for SmokeCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmokeCheck")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Which credentials a group needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// Always runs.
    Unauthenticated,
    /// Needs a user token and a workspace id.
    Authenticated,
    /// Needs an orchestration host, namespace, name and user token.
    Orchestration,
}

/// A fixed set of checks that share a credential requirement.
#[derive(Debug, Clone, Copy)]
pub struct CheckGroup {
    /// Credential requirement.
    pub kind: GroupKind,
    /// Group name shown in reports.
    pub name: &'static str,
    /// Checks in declaration order.
    pub checks: &'static [SmokeCheck],
}

impl CheckGroup {
    /// Number of checks in the group.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// True for a group without checks.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// Everything a check needs: the run configuration and the shared caller.
pub struct CheckContext<'a> {
    /// Run configuration.
    pub config: &'a RunConfig,
    /// Memoized GET helper shared by every check in the run.
    pub caller: &'a MemoizedCaller<'a>,
}

impl<'a> CheckContext<'a> {
    pub fn new(config: &'a RunConfig, caller: &'a MemoizedCaller<'a>) -> Self {
        Self { config, caller }
    }

    /// GETs `path` on the cWDS host, optionally with the user token.
    pub fn cwds_get(&self, path: &str, authenticated: bool) -> CheckResult<Rc<HttpResponse>> {
        let url = build_url(&self.config.host, path)?;
        let token = if authenticated {
            Some(self.user_token()?)
        } else {
            None
        };
        Ok(self.caller.get_or_fetch(&url, token)?)
    }

    /// GETs `path` on the orchestration host with the user token.
    pub fn orchestration_get(&self, path: &str) -> CheckResult<Rc<HttpResponse>> {
        let target = self.orchestration()?;
        let url = build_url(target.host, path)?;
        Ok(self.caller.get_or_fetch(&url, Some(target.user_token))?)
    }

    pub fn user_token(&self) -> CheckResult<&'a str> {
        self.config
            .token()
            .ok_or_else(|| CheckError::Error("user token not configured".to_string()))
    }

    pub fn workspace_id(&self) -> CheckResult<&'a str> {
        self.config
            .workspace()
            .ok_or_else(|| CheckError::Error("workspace id not configured".to_string()))
    }

    pub fn orchestration(&self) -> CheckResult<OrchestrationTarget<'a>> {
        self.config.orchestration_target().ok_or_else(|| {
            CheckError::Error("orchestration host, namespace or name not configured".to_string())
        })
    }
}

/// Fails unless `response` has `expected` status.
pub(crate) fn expect_status(response: &HttpResponse, expected: u16, label: &str) -> CheckResult {
    if response.status == expected {
        Ok(())
    } else {
        Err(CheckError::Failure(format!(
            "{} HTTP status is {} not {}: {}",
            label, response.status, expected, response.body
        )))
    }
}

/// Fails with `message` unless `condition` holds.
pub(crate) fn ensure(condition: bool, message: impl FnOnce() -> String) -> CheckResult {
    if condition {
        Ok(())
    } else {
        Err(CheckError::Failure(message()))
    }
}

/// Decodes the body as JSON; an undecodable body is an error, not a failure.
pub(crate) fn json_body(response: &HttpResponse) -> CheckResult<Value> {
    Ok(response.json()?)
}

/// Every group in the order the runner executes them.
pub fn all_groups() -> [CheckGroup; 3] {
    [UNAUTHENTICATED, AUTHENTICATED, ORCHESTRATION]
}
