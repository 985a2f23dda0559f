//! Smoke Core Library
//!
//! Post-deployment checks for a cWDS (Cloud Workspace Data Service) instance:
//! - Endpoint URL construction
//! - Token validation against an OAuth token-info endpoint
//! - Check groups selected from the supplied arguments
//! - A memoizing HTTP layer so each endpoint is fetched once per run
//! - A load generator that provisions workspaces and pushes data through WDS
//!
//! # Quick Start
//!
//! ```
//! use smoke_core::build_url;
//!
//! let url = build_url("wds.example.com", "/status").unwrap();
//! assert_eq!(url.as_str(), "https://wds.example.com/status");
//! ```
//!
//! # Running a suite
//!
//! ```no_run
//! use smoke_core::{run_smoke, HttpTransport, RunConfig, RunEvent};
//!
//! let config = RunConfig::new("wds.example.com");
//! let transport = HttpTransport::new().unwrap();
//! let outcome = run_smoke(&config, &transport, &mut |event: RunEvent<'_>| {
//!     if let RunEvent::CheckFinished(result) = event {
//!         println!("{} ... {}", result.description, result.label());
//!     }
//! })
//! .unwrap();
//! std::process::exit(outcome.exit_code().into());
//! ```

mod checks;
mod config;
mod error;
mod http;
mod load;
mod records;
mod runner;
mod suite;
mod token;
mod url;

pub use checks::{
    all_groups, CheckContext, CheckError, CheckGroup, CheckResult, GroupKind, SmokeCheck,
    AUTHENTICATED, ORCHESTRATION, UNAUTHENTICATED,
};
pub use config::{
    LoadConfig, LoadCredentials, OrchestrationArgs, OrchestrationTarget, ReadinessConfig,
    RunConfig, Verbosity, DEFAULT_TOKEN_INFO_URL,
};
pub use error::{Result, SmokeError};
pub use http::{HttpResponse, HttpTransport, MemoizedCaller, Transport};
pub use load::{
    find_app, wait_for_app, workspace_name, AppKind, AppState, LoadClient, LoadEvent, LoadReport,
    LoadRun, ServiceUrls, Sleeper, StepOutcome, ThreadSleeper, WorkspaceReport,
};
pub use records::{compare_record, values_match, AttributeMismatch, AttributeValue, Record};
pub use runner::{run_smoke, CheckOutcome, CheckStatus, RunEvent, SuiteOutcome, SuiteRunner};
pub use suite::{assemble, SuitePlan};
pub use token::TokenValidator;
pub use url::{build_url, has_http_scheme};

/// Re-exported so callers can name the URL type returned by [`build_url`].
pub use reqwest::Url;
