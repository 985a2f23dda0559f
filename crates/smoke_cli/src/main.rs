//! cwds-smoke - post-deployment smoke checks for a cWDS instance.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use smoke_core::{
    run_smoke, HttpTransport, OrchestrationArgs, RunConfig, RunEvent, SmokeError, Verbosity,
    DEFAULT_TOKEN_INFO_URL,
};
use std::io;
use std::process::ExitCode;
use tracing::debug;

mod report;

use report::Reporter;

#[derive(Parser)]
#[command(name = "cwds-smoke")]
#[command(about = "Smoke test a deployed cWDS instance", long_about = None)]
#[command(version)]
struct Cli {
    /// cWDS host, e.g. wds.example.com or https://wds.example.com
    host: String,
    /// Workspace (instance) id for authenticated checks
    workspace_id: Option<String>,
    /// User access token for authenticated checks
    user_token: Option<String>,
    /// Orchestration host for import-job checks
    #[arg(long)]
    orchestration_host: Option<String>,
    /// Workspace namespace for orchestration checks
    #[arg(long)]
    workspace_namespace: Option<String>,
    /// Workspace name for orchestration checks
    #[arg(long)]
    workspace_name: Option<String>,
    /// Output verbosity (0 quiet, 1 dots, 2 one line per check)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=2))]
    verbosity: u8,
    /// Token-info endpoint used to validate the user token
    #[arg(long, hide = true, default_value = DEFAULT_TOKEN_INFO_URL)]
    token_info_url: String,
}

impl Cli {
    fn into_config(self) -> Result<RunConfig> {
        let verbosity = Verbosity::try_from(self.verbosity)?;
        let mut config = RunConfig::new(self.host)
            .with_verbosity(verbosity)
            .with_token_info_url(self.token_info_url);
        config.workspace_id = self.workspace_id;
        config.user_token = self.user_token;
        config.orchestration = OrchestrationArgs {
            host: self.orchestration_host,
            namespace: self.workspace_namespace,
            name: self.workspace_name,
        };
        Ok(config)
    }
}

fn main() -> ExitCode {
    // Respects RUST_LOG (e.g. RUST_LOG=smoke_core=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", style("×").red(), err);
            if let Some(hint) = err
                .downcast_ref::<SmokeError>()
                .and_then(SmokeError::recovery_suggestion)
            {
                eprintln!("{} {}", style("→").cyan(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.into_config()?;
    debug!(host = %config.host, verbosity = ?config.verbosity, "smoke run configured");
    let transport = HttpTransport::new().context("Failed to build HTTP client")?;

    let mut reporter = Reporter::new(io::stdout().lock(), config.verbosity);
    let mut write_error = None;
    let outcome = run_smoke(&config, &transport, &mut |event: RunEvent<'_>| {
        let written = match event {
            RunEvent::Planned(plan) => reporter.planned(plan),
            RunEvent::CheckFinished(result) => reporter.check_finished(result),
        };
        if let Err(e) = written {
            write_error.get_or_insert(e);
        }
    })?;

    if let Some(e) = write_error {
        return Err(e).context("Failed to write report");
    }
    reporter
        .finish(&outcome)
        .context("Failed to write report")?;

    Ok(ExitCode::from(outcome.exit_code()))
}
