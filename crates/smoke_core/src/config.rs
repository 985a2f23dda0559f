//! Configuration types for smoke and load runs.

use crate::error::{Result, SmokeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Token introspection endpoint used to validate user tokens.
pub const DEFAULT_TOKEN_INFO_URL: &str = "https://www.googleapis.com/oauth2/v1/tokeninfo";

/// How much the runner prints while checks execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Only the final summary.
    Quiet,
    /// One character per check, then the summary.
    #[default]
    Minimal,
    /// One line per check with its description.
    Verbose,
}

impl TryFrom<u8> for Verbosity {
    type Error = SmokeError;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            0 => Ok(Self::Quiet),
            1 => Ok(Self::Minimal),
            2 => Ok(Self::Verbose),
            other => Err(SmokeError::Config(format!(
                "verbosity must be 0, 1 or 2, got {}",
                other
            ))),
        }
    }
}

/// Orchestration-side arguments. All three plus a user token are needed
/// before orchestration checks run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrchestrationArgs {
    /// Orchestration host, with or without scheme.
    pub host: Option<String>,
    /// Workspace namespace (billing project).
    pub namespace: Option<String>,
    /// Workspace name.
    pub name: Option<String>,
}

/// Fully resolved orchestration target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestrationTarget<'a> {
    /// Orchestration host.
    pub host: &'a str,
    /// Workspace namespace.
    pub namespace: &'a str,
    /// Workspace name.
    pub name: &'a str,
    /// User token for orchestration calls.
    pub user_token: &'a str,
}

/// Settings for one smoke run. Built once from the command line and then
/// only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// cWDS host, with or without scheme.
    pub host: String,
    /// Workspace (collection) id for authenticated checks.
    pub workspace_id: Option<String>,
    /// Bearer token for authenticated checks.
    pub user_token: Option<String>,
    /// Orchestration-side arguments.
    pub orchestration: OrchestrationArgs,
    /// Report verbosity.
    pub verbosity: Verbosity,
    /// Endpoint used to validate `user_token` before the suite runs.
    pub token_info_url: String,
}

impl RunConfig {
    /// Creates a configuration for `host` with nothing else supplied.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            workspace_id: None,
            user_token: None,
            orchestration: OrchestrationArgs::default(),
            verbosity: Verbosity::default(),
            token_info_url: DEFAULT_TOKEN_INFO_URL.to_string(),
        }
    }

    pub fn with_workspace_id(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    pub fn with_user_token(mut self, token: impl Into<String>) -> Self {
        self.user_token = Some(token.into());
        self
    }

    pub fn with_orchestration(
        mut self,
        host: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.orchestration = OrchestrationArgs {
            host: Some(host.into()),
            namespace: Some(namespace.into()),
            name: Some(name.into()),
        };
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_token_info_url(mut self, url: impl Into<String>) -> Self {
        self.token_info_url = url.into();
        self
    }

    /// The user token, treating an empty string as absent.
    pub fn token(&self) -> Option<&str> {
        present(&self.user_token)
    }

    /// The workspace id, treating an empty string as absent.
    pub fn workspace(&self) -> Option<&str> {
        present(&self.workspace_id)
    }

    /// True when both a token and a workspace id were supplied.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some() && self.workspace().is_some()
    }

    /// True when an orchestration host was supplied, regardless of the rest.
    pub fn wants_orchestration(&self) -> bool {
        present(&self.orchestration.host).is_some()
    }

    /// The orchestration target, if every required field is present.
    pub fn orchestration_target(&self) -> Option<OrchestrationTarget<'_>> {
        Some(OrchestrationTarget {
            host: present(&self.orchestration.host)?,
            namespace: present(&self.orchestration.namespace)?,
            name: present(&self.orchestration.name)?,
            user_token: self.token()?,
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Knobs for the load-generation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoadConfig {
    /// Number of workspaces to create (default: 1).
    pub workspace_count: u32,

    /// Request a CROMWELL app in every new workspace (default: false).
    pub enable_cbas: bool,

    /// Upload `upload_tsv` into each workspace's WDS (default: true).
    pub wds_upload: bool,

    /// Upload `workflow_tsv` and submit `workflow_request` (default: false).
    pub cbas_submit_workflow: bool,

    /// TSV uploaded to every workspace.
    pub upload_tsv: PathBuf,

    /// Record type for `upload_tsv`.
    pub upload_record_type: String,

    /// TSV uploaded before submitting the workflow.
    pub workflow_tsv: PathBuf,

    /// Record type for `workflow_tsv`.
    pub workflow_record_type: String,

    /// JSON body posted to the CBAS run-sets endpoint.
    pub workflow_request: PathBuf,

    /// Write a typed probe record and verify it reads back (default: false).
    pub record_roundtrip: bool,

    /// How to wait for provisioned apps.
    pub readiness: ReadinessConfig,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            workspace_count: 1,
            enable_cbas: false,
            wds_upload: true,
            cbas_submit_workflow: false,
            upload_tsv: PathBuf::from("resources/test.tsv"),
            upload_record_type: "test".to_string(),
            workflow_tsv: PathBuf::from("resources/sraloadtest.tsv"),
            workflow_record_type: "sraloadtest".to_string(),
            workflow_request: PathBuf::from("resources/assemble_refbased.json"),
            record_roundtrip: false,
            readiness: ReadinessConfig::default(),
        }
    }
}

impl LoadConfig {
    /// Loads configuration from a TOML file, or defaults when `path` is None.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|e| {
            SmokeError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            SmokeError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.readiness.validate()?;
        Ok(config)
    }
}

/// Poll-with-backoff settings for app readiness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReadinessConfig {
    /// First delay between polls in seconds (default: 10).
    pub initial_delay_secs: u64,

    /// Delay cap in seconds; delays double up to this (default: 60).
    pub max_delay_secs: u64,

    /// Give up on a workspace after this many seconds (default: 600).
    pub timeout_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: 10,
            max_delay_secs: 60,
            timeout_secs: 600,
        }
    }
}

impl ReadinessConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_delay_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before poll number `attempt` (0-based): doubles from the
    /// initial delay and is capped at the maximum. Never below one second.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let secs = self.initial_delay_secs.saturating_mul(factor);
        Duration::from_secs(secs.min(self.max_delay_secs).max(1))
    }

    /// Rejects zero delays.
    pub fn validate(&self) -> Result<()> {
        if self.initial_delay_secs == 0 || self.max_delay_secs == 0 {
            return Err(SmokeError::Config(format!(
                "readiness delays must be at least one second (initial_delay_secs = {}, max_delay_secs = {})",
                self.initial_delay_secs, self.max_delay_secs
            )));
        }
        Ok(())
    }
}

/// Credentials for the load run, read from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct LoadCredentials {
    /// Bearer token for every provisioning call (`AZURE_TOKEN`).
    pub azure_token: String,
    /// BEE environment name (`BEE_NAME`).
    pub bee_name: String,
    /// Billing project used as the workspace namespace (`BILLING_PROJECT_NAME`).
    pub billing_project: String,
}

impl std::fmt::Debug for LoadCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadCredentials")
            .field("azure_token", &"<redacted>")
            .field("bee_name", &self.bee_name)
            .field("billing_project", &self.billing_project)
            .finish()
    }
}

impl LoadCredentials {
    /// Reads `AZURE_TOKEN`, `BEE_NAME` and `BILLING_PROJECT_NAME`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the three variables through `lookup`. Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut missing = Vec::new();
        let mut read = |key: &'static str| match lookup(key).filter(|v| !v.is_empty()) {
            Some(value) => value,
            None => {
                missing.push(key);
                String::new()
            }
        };

        let credentials = Self {
            azure_token: read("AZURE_TOKEN"),
            bee_name: read("BEE_NAME"),
            billing_project: read("BILLING_PROJECT_NAME"),
        };

        if missing.is_empty() {
            Ok(credentials)
        } else {
            Err(SmokeError::Config(format!(
                "missing environment variables: {}",
                missing.join(", ")
            )))
        }
    }
}
