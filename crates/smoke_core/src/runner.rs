//! Sequential suite execution and the overall smoke-run flow.

use crate::checks::{CheckContext, CheckError};
use crate::config::RunConfig;
use crate::error::Result;
use crate::http::{MemoizedCaller, Transport};
use crate::suite::{assemble, SuitePlan};
use crate::token::TokenValidator;
use std::time::{Duration, Instant};
use tracing::debug;

/// How a single check ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// All assertions held.
    Passed,
    /// An assertion did not hold.
    Failed(String),
    /// The check could not be carried out.
    Errored(String),
}

/// Result of one check.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Group the check belongs to.
    pub group: &'static str,
    /// Check name.
    pub name: &'static str,
    /// Check description.
    pub description: &'static str,
    /// Outcome.
    pub status: CheckStatus,
    /// Wall time spent in the check.
    pub elapsed: Duration,
}

impl CheckOutcome {
    /// `.`, `F` or `E`.
    pub fn symbol(&self) -> char {
        match self.status {
            CheckStatus::Passed => '.',
            CheckStatus::Failed(_) => 'F',
            CheckStatus::Errored(_) => 'E',
        }
    }

    /// `ok`, `FAIL` or `ERROR`.
    pub fn label(&self) -> &'static str {
        match self.status {
            CheckStatus::Passed => "ok",
            CheckStatus::Failed(_) => "FAIL",
            CheckStatus::Errored(_) => "ERROR",
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}

/// Aggregated results of a suite run.
#[derive(Debug, Clone, Default)]
pub struct SuiteOutcome {
    /// Per-check results in execution order.
    pub results: Vec<CheckOutcome>,
    /// Wall time for the whole suite.
    pub duration: Duration,
}

impl SuiteOutcome {
    pub fn tests_run(&self) -> usize {
        self.results.len()
    }

    pub fn failures(&self) -> usize {
        self.count(|s| matches!(s, CheckStatus::Failed(_)))
    }

    pub fn errors(&self) -> usize {
        self.count(|s| matches!(s, CheckStatus::Errored(_)))
    }

    pub fn passed(&self) -> usize {
        self.count(|s| *s == CheckStatus::Passed)
    }

    /// True when nothing failed or errored.
    pub fn was_successful(&self) -> bool {
        self.failures() == 0 && self.errors() == 0
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> u8 {
        if self.was_successful() {
            0
        } else {
            1
        }
    }

    /// Results that did not pass, in execution order.
    pub fn problems(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.results.iter().filter(|r| !r.passed())
    }

    /// `OK` or `FAILED (failures=N, errors=M)`, omitting zero counts.
    pub fn summary(&self) -> String {
        if self.was_successful() {
            return "OK".to_string();
        }
        let mut parts = Vec::new();
        if self.failures() > 0 {
            parts.push(format!("failures={}", self.failures()));
        }
        if self.errors() > 0 {
            parts.push(format!("errors={}", self.errors()));
        }
        format!("FAILED ({})", parts.join(", "))
    }

    fn count(&self, predicate: impl Fn(&CheckStatus) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.status)).count()
    }
}

/// Runs the checks of a plan one after another.
pub struct SuiteRunner<'a> {
    ctx: CheckContext<'a>,
}

impl<'a> SuiteRunner<'a> {
    pub fn new(ctx: CheckContext<'a>) -> Self {
        Self { ctx }
    }

    /// Executes every check in `plan`, calling `on_result` after each one.
    pub fn run(
        &self,
        plan: &SuitePlan,
        on_result: &mut dyn FnMut(&CheckOutcome),
    ) -> SuiteOutcome {
        let started = Instant::now();
        let mut outcome = SuiteOutcome::default();

        for (group, check) in plan.checks() {
            let check_started = Instant::now();
            let status = match (check.run)(&self.ctx) {
                Ok(()) => CheckStatus::Passed,
                Err(CheckError::Failure(msg)) => CheckStatus::Failed(msg),
                Err(CheckError::Error(msg)) => CheckStatus::Errored(msg),
            };
            let result = CheckOutcome {
                group: group.name,
                name: check.name,
                description: check.description,
                status,
                elapsed: check_started.elapsed(),
            };
            debug!(
                group = result.group,
                check = result.name,
                outcome = result.label(),
                "check finished"
            );

            on_result(&result);
            outcome.results.push(result);
        }

        outcome.duration = started.elapsed();
        outcome
    }
}

/// Progress notifications from [`run_smoke`].
#[derive(Debug)]
pub enum RunEvent<'e> {
    /// The suite was assembled and is about to run.
    Planned(&'e SuitePlan),
    /// A check finished.
    CheckFinished(&'e CheckOutcome),
}

/// Full smoke run: validate the token, assemble the suite, run it.
///
/// A rejected token returns [`SmokeError::TokenRejected`](crate::SmokeError::TokenRejected)
/// before any check executes.
pub fn run_smoke(
    config: &RunConfig,
    transport: &dyn Transport,
    on_event: &mut dyn FnMut(RunEvent<'_>),
) -> Result<SuiteOutcome> {
    if let Some(token) = config.token() {
        TokenValidator::new(transport, config.token_info_url.as_str()).validate(token)?;
    }

    let plan = assemble(config);
    on_event(RunEvent::Planned(&plan));

    let caller = MemoizedCaller::new(transport);
    let runner = SuiteRunner::new(CheckContext::new(config, &caller));
    Ok(runner.run(&plan, &mut |result: &CheckOutcome| {
        on_event(RunEvent::CheckFinished(result))
    }))
}
