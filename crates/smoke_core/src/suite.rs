//! Suite assembly: which check groups a run is eligible for.

use crate::checks::{CheckGroup, SmokeCheck, AUTHENTICATED, ORCHESTRATION, UNAUTHENTICATED};
use crate::config::RunConfig;
use tracing::info;

/// The groups selected for a run, plus the human-readable reasons.
#[derive(Debug, Clone)]
pub struct SuitePlan {
    /// Groups to run, in order.
    pub groups: Vec<CheckGroup>,
    /// Informational notes about included and skipped groups.
    pub notes: Vec<String>,
}

impl SuitePlan {
    /// Total number of checks across all groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(CheckGroup::len).sum()
    }

    /// True if no checks were selected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every check paired with its group, in execution order.
    pub fn checks(&self) -> impl Iterator<Item = (&CheckGroup, &SmokeCheck)> {
        self.groups
            .iter()
            .flat_map(|group| group.checks.iter().map(move |check| (group, check)))
    }

    /// Returns true if a group with this name was selected.
    pub fn includes(&self, group_name: &str) -> bool {
        self.groups.iter().any(|g| g.name == group_name)
    }
}

/// Builds the suite for `config`.
///
/// Unauthenticated checks always run. Authenticated checks need a token and a
/// workspace id. Orchestration checks need an orchestration host, namespace,
/// name and token. Missing credentials skip a group; they never fail the run.
pub fn assemble(config: &RunConfig) -> SuitePlan {
    let mut groups = vec![UNAUTHENTICATED];
    let mut notes = Vec::new();

    if config.is_authenticated() {
        notes.push(
            "user_token and workspace_id both provided.  Running additional authenticated tests."
                .to_string(),
        );
        groups.push(AUTHENTICATED);
    } else {
        notes.push(
            "user_token and/or workspace_id not provided.  Skipping authenticated tests.".to_string(),
        );
    }

    if config.wants_orchestration() {
        if config.orchestration_target().is_some() {
            notes.push("Running orchestration tests.".to_string());
            groups.push(ORCHESTRATION);
        } else {
            notes.push(
                "user_token, workspace_namespace, or workspace_name are missing.  Skipping orchestration tests."
                    .to_string(),
            );
        }
    }

    let plan = SuitePlan { groups, notes };
    info!(
        groups = ?plan.groups.iter().map(|g| g.name).collect::<Vec<_>>(),
        checks = plan.len(),
        "assembled smoke suite"
    );
    plan
}
