//! cwds-load - provisions workspaces in a BEE and pushes data through WDS.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use smoke_core::{
    LoadClient, LoadConfig, LoadCredentials, LoadEvent, LoadReport, LoadRun, ServiceUrls,
    SmokeError, ThreadSleeper,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;

#[derive(Parser)]
#[command(name = "cwds-load")]
#[command(about = "Generate load against WDS in a BEE environment", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML file with load-test settings (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
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
        Ok(report) if report.succeeded() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
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

fn run(cli: Cli) -> Result<LoadReport> {
    let credentials = LoadCredentials::from_env()?;
    let config = LoadConfig::load(cli.config.as_deref())?;
    debug!(?config, bee = %credentials.bee_name, "load run configured");
    let urls = ServiceUrls::for_bee(&credentials.bee_name);
    let client = LoadClient::new(urls, credentials.azure_token.clone())
        .context("Failed to build HTTP client")?;

    println!(
        "Creating {} workspace(s) in {} on {}",
        style(config.workspace_count).cyan(),
        style(&credentials.billing_project).cyan(),
        style(&client.urls().rawls).cyan()
    );

    let mut spinner: Option<ProgressBar> = None;
    let report = LoadRun::new(&client, &config, &credentials, &ThreadSleeper).run(
        &mut |event: LoadEvent<'_>| match event {
            LoadEvent::WorkspaceCreated(id) => {
                println!("{} Created workspace {}", style("✓").green(), id);
            }
            LoadEvent::Waiting { workspace_id, app } => {
                let pb = ProgressBar::new_spinner();
                if let Ok(template) =
                    ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
                {
                    pb.set_style(template);
                }
                pb.set_message(format!(
                    "Waiting for {} in {}...",
                    app.proxy_key(),
                    workspace_id
                ));
                pb.enable_steady_tick(Duration::from_millis(100));
                spinner = Some(pb);
            }
            LoadEvent::StepFinished {
                workspace_id,
                outcome,
            } => {
                if let Some(pb) = spinner.take() {
                    pb.finish_and_clear();
                }
                match &outcome.result {
                    Ok(_) => println!(
                        "{} {} {}",
                        style("✓").green(),
                        workspace_id,
                        outcome.step
                    ),
                    Err(e) => println!(
                        "{} {} {}: {}",
                        style("×").red(),
                        workspace_id,
                        outcome.step,
                        e
                    ),
                }
            }
        },
    );
    if let Some(pb) = spinner.take() {
        pb.finish_and_clear();
    }

    print_summary(&report);
    Ok(report)
}

fn print_summary(report: &LoadReport) {
    println!();
    println!("{}", style("LOAD TEST COMPLETE.").bold());

    match report.probe_status {
        Some(status) => println!("  Workspace Manager probe: {}", style(status).cyan()),
        None => println!("  Workspace Manager probe: {}", style("unreachable").yellow()),
    }
    for failure in &report.creation_failures {
        println!("  {} workspace creation: {}", style("×").red(), failure);
    }
    for workspace in &report.workspaces {
        let mark = if workspace.succeeded() {
            style("✓").green()
        } else {
            style("×").red()
        };
        let passed = workspace.steps.iter().filter(|s| s.succeeded()).count();
        println!(
            "  {} {} ({}/{} steps)",
            mark,
            workspace.workspace_id,
            passed,
            workspace.steps.len()
        );
    }
}
