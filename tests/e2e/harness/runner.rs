use super::assertions::Assertion;
use super::mock_service::{hit_counts, MockService, Route};
use super::steps::{LoadArgs, ScenarioStep, SmokeArgs};
use anyhow::{anyhow, bail, ensure, Context, Result};
use smoke_core::{
    run_smoke, CheckStatus, HttpTransport, LoadClient, LoadConfig, LoadCredentials, LoadReport,
    LoadEvent, LoadRun, OrchestrationArgs, ReadinessConfig, RunConfig, RunEvent, ServiceUrls, Sleeper,
    SmokeError, SuiteOutcome,
};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

/// Readiness waits in scenarios never actually sleep.
struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

/// What the last run left behind, for assertions.
#[derive(Default)]
pub struct RunState {
    pub smoke: Option<std::result::Result<SuiteOutcome, SmokeError>>,
    pub notes: Vec<String>,
    pub groups: Vec<&'static str>,
    pub events: usize,
    pub load: Option<LoadReport>,
    /// Load progress as `created ws`, `waiting wds ws`, `step tsv upload ws`.
    pub load_events: Vec<String>,
}

impl RunState {
    pub fn outcome(&self) -> Result<&SuiteOutcome> {
        match &self.smoke {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(e)) => bail!("smoke run failed before checks: {}", e),
            None => bail!("no smoke run yet"),
        }
    }

    pub fn load_report(&self) -> Result<&LoadReport> {
        self.load.as_ref().ok_or_else(|| anyhow!("no load run yet"))
    }

    /// Exit code the CLI would return.
    pub fn exit_code(&self) -> Result<u8> {
        match &self.smoke {
            Some(Ok(outcome)) => Ok(outcome.exit_code()),
            Some(Err(_)) => Ok(1),
            None => bail!("no smoke run yet"),
        }
    }
}

/// Executes scenarios against a mock cWDS service
pub struct ScenarioRunner {
    service: MockService,
    files: TempDir,
    state: RunState,
    current_step: usize,
}

impl ScenarioRunner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            service: MockService::start()?,
            files: TempDir::new()?,
            state: RunState::default(),
            current_step: 0,
        })
    }

    /// Get current step number
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Execute all steps in sequence
    pub fn execute(&mut self, steps: &[ScenarioStep]) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            self.current_step = i;
            self.execute_step(step)
                .with_context(|| format!("Step {}: {:?}", i, step))?;
        }
        Ok(())
    }

    fn execute_step(&mut self, step: &ScenarioStep) -> Result<()> {
        match step {
            ScenarioStep::Serve {
                method,
                prefix,
                status,
                body,
            } => {
                self.service.add_route(Route {
                    method: method.clone(),
                    prefix: prefix.clone(),
                    status: *status,
                    body: body.clone(),
                });
                Ok(())
            }
            ScenarioStep::RunSmoke(args) => self.handle_smoke(args),
            ScenarioStep::RunLoad(args) => self.handle_load(args),
            ScenarioStep::Assert { assertion } => self.handle_assertion(assertion),
        }
    }

    // ===== Run handlers =====

    fn handle_smoke(&mut self, args: &SmokeArgs) -> Result<()> {
        let base = self.service.base_url();
        let host = args.host.clone().unwrap_or_else(|| base.clone());
        let token_info_url = args
            .token_info_url
            .clone()
            .unwrap_or_else(|| format!("{}/oauth2/v1/tokeninfo", base));
        let mut config = RunConfig::new(host).with_token_info_url(token_info_url);
        config.workspace_id = args.workspace_id.clone();
        config.user_token = args.user_token.clone();
        if args.orchestration {
            config.orchestration = OrchestrationArgs {
                host: Some(base),
                namespace: args.namespace.clone(),
                name: args.name.clone(),
            };
        }

        let transport = HttpTransport::new()?;
        let mut notes = Vec::new();
        let mut groups = Vec::new();
        let mut events = 0;
        let result = run_smoke(&config, &transport, &mut |event: RunEvent<'_>| {
            events += 1;
            if let RunEvent::Planned(plan) = event {
                notes = plan.notes.clone();
                groups = plan.groups.iter().map(|g| g.name).collect();
            }
        });

        self.state.smoke = Some(result);
        self.state.notes = notes;
        self.state.groups = groups;
        self.state.events = events;
        Ok(())
    }

    fn handle_load(&mut self, args: &LoadArgs) -> Result<()> {
        let dir = self.files.path();
        let upload_tsv = dir.join("test.tsv");
        let workflow_tsv = dir.join("sraloadtest.tsv");
        let workflow_request = dir.join("assemble_refbased.json");
        fs::write(&upload_tsv, "sys_name\tvalue\nrow1\t1\nrow2\t2\n")?;
        fs::write(&workflow_tsv, "sys_name\tsample\nsra1\tSRR000001\n")?;
        fs::write(&workflow_request, r#"{"workflow_url":"https://example.com/wf.wdl"}"#)?;

        let config = LoadConfig {
            workspace_count: args.workspace_count,
            enable_cbas: args.enable_cbas,
            wds_upload: args.wds_upload,
            cbas_submit_workflow: args.cbas_submit_workflow,
            record_roundtrip: args.record_roundtrip,
            upload_tsv,
            workflow_tsv,
            workflow_request,
            readiness: ReadinessConfig {
                initial_delay_secs: 1,
                max_delay_secs: 2,
                timeout_secs: 3,
            },
            ..LoadConfig::default()
        };
        let credentials = LoadCredentials {
            azure_token: "load-token".to_string(),
            bee_name: "mock".to_string(),
            billing_project: "billing".to_string(),
        };
        let base = self.service.base_url();
        let urls = ServiceUrls {
            workspace_manager: base.clone(),
            rawls: base.clone(),
            leonardo: base,
        };
        let client = LoadClient::new(urls, credentials.azure_token.clone())?;

        let mut events = Vec::new();
        let report = LoadRun::new(&client, &config, &credentials, &NoSleep).run(
            &mut |event: LoadEvent<'_>| {
                events.push(match event {
                    LoadEvent::WorkspaceCreated(id) => format!("created {}", id),
                    LoadEvent::Waiting { workspace_id, app } => {
                        format!("waiting {} {}", app.proxy_key(), workspace_id)
                    }
                    LoadEvent::StepFinished {
                        workspace_id,
                        outcome,
                    } => format!("step {} {}", outcome.step, workspace_id),
                })
            },
        );
        self.state.load = Some(report);
        self.state.load_events = events;
        Ok(())
    }

    // ===== Assertion handler =====

    fn handle_assertion(&self, assertion: &Assertion) -> Result<()> {
        let state = &self.state;
        match assertion {
            Assertion::Successful => {
                let outcome = state.outcome()?;
                ensure!(
                    outcome.was_successful(),
                    "Expected success, got {} with problems {:?}",
                    outcome.summary(),
                    outcome.problems().collect::<Vec<_>>()
                );
            }
            Assertion::Unsuccessful => {
                ensure!(!state.outcome()?.was_successful(), "Expected the run to fail");
            }
            Assertion::ChecksRun(n) => {
                let run = state.outcome()?.tests_run();
                ensure!(run == *n, "Expected {} checks to run, got {}", n, run);
            }
            Assertion::Failures(n) => {
                let got = state.outcome()?.failures();
                ensure!(got == *n, "Expected {} failures, got {}", n, got);
            }
            Assertion::Errors(n) => {
                let got = state.outcome()?.errors();
                ensure!(got == *n, "Expected {} errors, got {}", n, got);
            }
            Assertion::ExitCode(code) => {
                let got = state.exit_code()?;
                ensure!(got == *code, "Expected exit code {}, got {}", code, got);
            }
            Assertion::CheckPassed(name) => {
                let status = check_status(state, name)?;
                ensure!(
                    *status == CheckStatus::Passed,
                    "Expected {} to pass, got {:?}",
                    name,
                    status
                );
            }
            Assertion::CheckFailedWith { name, contains } => match check_status(state, name)? {
                CheckStatus::Failed(msg) if msg.contains(contains.as_str()) => {}
                other => bail!("Expected {} to fail with {:?}, got {:?}", name, contains, other),
            },
            Assertion::CheckErrored(name) => {
                let status = check_status(state, name)?;
                ensure!(
                    matches!(status, CheckStatus::Errored(_)),
                    "Expected {} to error, got {:?}",
                    name,
                    status
                );
            }
            Assertion::GroupRan(name) => {
                ensure!(
                    state.groups.contains(&name.as_str()),
                    "Expected group {} in {:?}",
                    name,
                    state.groups
                );
            }
            Assertion::GroupSkipped(name) => {
                ensure!(
                    !state.groups.contains(&name.as_str()),
                    "Expected group {} to be skipped, planned {:?}",
                    name,
                    state.groups
                );
            }
            Assertion::NoteContains(text) => {
                ensure!(
                    state.notes.iter().any(|n| n.contains(text.as_str())),
                    "No note contains {:?}: {:?}",
                    text,
                    state.notes
                );
            }
            Assertion::AbortedBeforeChecks => {
                ensure!(
                    matches!(state.smoke, Some(Err(_))),
                    "Expected the run to abort, got {:?}",
                    state.smoke.as_ref().map(|r| r.as_ref().map(SuiteOutcome::summary))
                );
                ensure!(state.events == 0, "Expected no events, got {}", state.events);
            }
            Assertion::TokenRejected => {
                ensure!(
                    matches!(state.smoke, Some(Err(SmokeError::TokenRejected { .. }))),
                    "Expected the token to be rejected"
                );
                ensure!(state.events == 0, "Expected no events, got {}", state.events);
            }
            Assertion::Hits {
                method,
                prefix,
                count,
            } => {
                let received = self.service.received(method, prefix);
                ensure!(
                    received.len() == *count,
                    "Expected {} {} {} time(s), got {} ({:?})",
                    method,
                    prefix,
                    count,
                    received.len(),
                    hit_counts(&self.service.all_received())
                );
            }
            Assertion::BearerSent { prefix, token } => {
                let expected = format!("Bearer {}", token);
                let received = self.service.received("GET", prefix);
                ensure!(!received.is_empty(), "No GET requests to {}", prefix);
                for request in received {
                    ensure!(
                        request.authorization.as_deref() == Some(expected.as_str()),
                        "Request to {} carried {:?}",
                        request.url,
                        request.authorization
                    );
                }
            }
            Assertion::NoAuthorization { prefix } => {
                for request in self.service.received("GET", prefix) {
                    ensure!(
                        request.authorization.is_none(),
                        "Request to {} unexpectedly carried {:?}",
                        request.url,
                        request.authorization
                    );
                }
            }
            Assertion::RequestBodyContains {
                method,
                prefix,
                text,
            } => {
                let received = self.service.received(method, prefix);
                ensure!(
                    received.iter().any(|r| r.body.contains(text.as_str())),
                    "No {} {} body contains {:?}",
                    method,
                    prefix,
                    text
                );
            }
            Assertion::LoadSucceeded(ok) => {
                let report = state.load_report()?;
                ensure!(
                    report.succeeded() == *ok,
                    "Expected load success = {}, report {:?}",
                    ok,
                    report
                );
            }
            Assertion::WorkspacesExercised(n) => {
                let got = state.load_report()?.workspaces.len();
                ensure!(got == *n, "Expected {} workspaces, got {}", n, got);
            }
            Assertion::LoadStep { step, ok } => {
                let report = state.load_report()?;
                let outcome = report
                    .workspaces
                    .iter()
                    .flat_map(|w| w.steps.iter())
                    .find(|s| s.step == step)
                    .ok_or_else(|| anyhow!("Step {:?} never ran: {:?}", step, report))?;
                ensure!(
                    outcome.succeeded() == *ok,
                    "Expected step {:?} ok = {}, got {:?}",
                    step,
                    ok,
                    outcome.result
                );
            }
            Assertion::LoadEvents(expected) => {
                ensure!(
                    state.load_events == *expected,
                    "Expected load events {:?}, got {:?}",
                    expected,
                    state.load_events
                );
            }
            Assertion::CreationFailures(n) => {
                let got = state.load_report()?.creation_failures.len();
                ensure!(got == *n, "Expected {} creation failures, got {}", n, got);
            }
            Assertion::Custom(check) => check(state)?,
        }
        Ok(())
    }
}

fn check_status<'s>(state: &'s RunState, name: &str) -> Result<&'s CheckStatus> {
    state
        .outcome()?
        .results
        .iter()
        .find(|r| r.name == name)
        .map(|r| &r.status)
        .ok_or_else(|| anyhow!("Check {} did not run", name))
}
