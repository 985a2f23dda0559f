//! Load generation: provision workspaces and push data through them.
//!
//! A run creates the configured number of workspaces, waits for their apps,
//! uploads TSV data to WDS and optionally verifies a typed record round trip
//! and submits a workflow to CBAS. Steps run sequentially; a failing step
//! for one workspace does not stop the others.

mod client;
mod readiness;

pub use client::{workspace_name, LoadClient, ServiceUrls};
pub use readiness::{find_app, wait_for_app, AppKind, AppState, Sleeper, ThreadSleeper};

use crate::config::{LoadConfig, LoadCredentials};
use crate::error::{Result, SmokeError};
use crate::records::{compare_record, Record};
use tracing::warn;
use uuid::Uuid;

/// Outcome of one step for one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Step name.
    pub step: &'static str,
    /// Detail on success, error message on failure.
    pub result: std::result::Result<String, String>,
}

impl StepOutcome {
    fn from_result(step: &'static str, result: Result<String>) -> Self {
        Self {
            step,
            result: result.map_err(|e| e.to_string()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything that happened to one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceReport {
    pub workspace_id: String,
    pub steps: Vec<StepOutcome>,
}

impl WorkspaceReport {
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(StepOutcome::succeeded)
    }
}

/// Summary of a load run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Status code of the Workspace Manager probe.
    pub probe_status: Option<u16>,
    /// Workspaces that could not be created, as error messages.
    pub creation_failures: Vec<String>,
    /// Per-workspace outcomes.
    pub workspaces: Vec<WorkspaceReport>,
}

impl LoadReport {
    pub fn succeeded(&self) -> bool {
        self.creation_failures.is_empty() && self.workspaces.iter().all(WorkspaceReport::succeeded)
    }
}

/// Progress notifications from [`LoadRun::run`].
#[derive(Debug)]
pub enum LoadEvent<'e> {
    /// A workspace was created.
    WorkspaceCreated(&'e str),
    /// Waiting for an app in a workspace.
    Waiting { workspace_id: &'e str, app: AppKind },
    /// A step finished.
    StepFinished {
        workspace_id: &'e str,
        outcome: &'e StepOutcome,
    },
}

/// One configured load run.
pub struct LoadRun<'a> {
    client: &'a LoadClient,
    config: &'a LoadConfig,
    credentials: &'a LoadCredentials,
    sleeper: &'a dyn Sleeper,
}

impl<'a> LoadRun<'a> {
    pub fn new(
        client: &'a LoadClient,
        config: &'a LoadConfig,
        credentials: &'a LoadCredentials,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            client,
            config,
            credentials,
            sleeper,
        }
    }

    /// Executes the run, reporting progress through `on_event`.
    pub fn run(&self, on_event: &mut dyn FnMut(LoadEvent<'_>)) -> LoadReport {
        let mut report = LoadReport::default();

        match self.client.probe_workspace_manager() {
            Ok(status) => report.probe_status = Some(status),
            Err(e) => warn!(error = %e, "workspace manager probe failed"),
        }

        let mut created = Vec::new();
        for _ in 0..self.config.workspace_count {
            match self
                .client
                .create_workspace(&self.credentials.billing_project)
            {
                Ok(workspace_id) => {
                    on_event(LoadEvent::WorkspaceCreated(&workspace_id));
                    let mut steps = Vec::new();
                    if self.config.enable_cbas {
                        let result = self
                            .client
                            .request_cbas(&workspace_id)
                            .map(|()| "requested".to_string());
                        let outcome = StepOutcome::from_result("cbas request", result);
                        push_step(&mut steps, outcome, &workspace_id, on_event);
                    }
                    created.push(WorkspaceReport {
                        workspace_id,
                        steps,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "workspace creation failed");
                    report.creation_failures.push(e.to_string());
                }
            }
        }

        for mut workspace in created {
            self.exercise_workspace(&workspace.workspace_id, &mut workspace.steps, on_event);
            report.workspaces.push(workspace);
        }

        report
    }

    fn exercise_workspace(
        &self,
        workspace_id: &str,
        steps: &mut Vec<StepOutcome>,
        on_event: &mut dyn FnMut(LoadEvent<'_>),
    ) {
        let needs_wds = self.config.wds_upload
            || self.config.record_roundtrip
            || self.config.cbas_submit_workflow;
        if !needs_wds {
            return;
        }

        on_event(LoadEvent::Waiting {
            workspace_id,
            app: AppKind::Wds,
        });
        let wds_url = match self.wait_for(workspace_id, AppKind::Wds) {
            Ok(url) => url,
            Err(e) => {
                warn!(workspace_id, error = %e, "wds not ready, skipping workspace");
                let outcome = StepOutcome::from_result("wds ready", Err(e));
                push_step(steps, outcome, workspace_id, on_event);
                return;
            }
        };

        if self.config.wds_upload {
            let result = self
                .client
                .upload_tsv(
                    &wds_url,
                    workspace_id,
                    &self.config.upload_record_type,
                    &self.config.upload_tsv,
                )
                .map(|body| body.to_string());
            let outcome = StepOutcome::from_result("tsv upload", result);
            push_step(steps, outcome, workspace_id, on_event);
        }

        if self.config.record_roundtrip {
            let result = self.record_roundtrip(&wds_url, workspace_id);
            let outcome = StepOutcome::from_result("record round trip", result);
            push_step(steps, outcome, workspace_id, on_event);
        }

        if self.config.cbas_submit_workflow {
            let result = self.submit_workflow(&wds_url, workspace_id, on_event);
            let outcome = StepOutcome::from_result("workflow submission", result);
            push_step(steps, outcome, workspace_id, on_event);
        }
    }

    fn wait_for(&self, workspace_id: &str, app: AppKind) -> Result<String> {
        wait_for_app(app, workspace_id, &self.config.readiness, self.sleeper, || {
            self.client.app_state(workspace_id, app)
        })
    }

    fn record_roundtrip(&self, wds_url: &str, workspace_id: &str) -> Result<String> {
        let record = Record::probe("smoke_probe", Uuid::new_v4().to_string());
        self.client.put_record(wds_url, workspace_id, &record)?;
        let retrieved = self.client.get_record(wds_url, workspace_id, &record)?;

        let mismatches = compare_record(&record, &retrieved);
        if mismatches.is_empty() {
            Ok(format!("{} attributes matched", record.attributes.len()))
        } else {
            let detail: Vec<String> = mismatches.iter().map(ToString::to_string).collect();
            Err(SmokeError::UnexpectedStatus {
                context: "record round trip".to_string(),
                status: 200,
                body: detail.join("; "),
            })
        }
    }

    fn submit_workflow(
        &self,
        wds_url: &str,
        workspace_id: &str,
        on_event: &mut dyn FnMut(LoadEvent<'_>),
    ) -> Result<String> {
        self.client.upload_tsv(
            wds_url,
            workspace_id,
            &self.config.workflow_record_type,
            &self.config.workflow_tsv,
        )?;
        on_event(LoadEvent::Waiting {
            workspace_id,
            app: AppKind::Cbas,
        });
        let cbas_url = self.wait_for(workspace_id, AppKind::Cbas)?;
        let submitted = self
            .client
            .submit_workflow(&cbas_url, &self.config.workflow_request)?;
        Ok(submitted
            .get("run_set_id")
            .and_then(|id| id.as_str())
            .map_or_else(|| submitted.to_string(), str::to_string))
    }
}

fn push_step(
    steps: &mut Vec<StepOutcome>,
    outcome: StepOutcome,
    workspace_id: &str,
    on_event: &mut dyn FnMut(LoadEvent<'_>),
) {
    on_event(LoadEvent::StepFinished {
        workspace_id,
        outcome: &outcome,
    });
    steps.push(outcome);
}
