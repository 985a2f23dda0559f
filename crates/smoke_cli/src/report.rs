//! Console rendering of a smoke run.

use console::style;
use smoke_core::{CheckOutcome, CheckStatus, SuiteOutcome, SuitePlan, Verbosity};
use std::io::{self, Write};

const HEAVY_RULE: &str =
    "======================================================================";
const LIGHT_RULE: &str =
    "----------------------------------------------------------------------";

/// Writes plan notes, live progress and the final summary.
pub struct Reporter<W: Write> {
    out: W,
    verbosity: Verbosity,
    progress_written: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, verbosity: Verbosity) -> Self {
        Self {
            out,
            verbosity,
            progress_written: false,
        }
    }

    /// Prints the assembler's notes, one per line.
    pub fn planned(&mut self, plan: &SuitePlan) -> io::Result<()> {
        for note in &plan.notes {
            writeln!(self.out, "{}", note)?;
        }
        Ok(())
    }

    /// Live progress for one finished check.
    pub fn check_finished(&mut self, result: &CheckOutcome) -> io::Result<()> {
        match self.verbosity {
            Verbosity::Quiet => return Ok(()),
            Verbosity::Minimal => {
                let symbol = match result.status {
                    CheckStatus::Passed => style(result.symbol()).green(),
                    CheckStatus::Failed(_) => style(result.symbol()).red(),
                    CheckStatus::Errored(_) => style(result.symbol()).yellow(),
                };
                write!(self.out, "{}", symbol)?;
            }
            Verbosity::Verbose => {
                let label = match result.status {
                    CheckStatus::Passed => style(result.label()).green(),
                    CheckStatus::Failed(_) => style(result.label()).red(),
                    CheckStatus::Errored(_) => style(result.label()).yellow(),
                };
                writeln!(self.out, "{} ... {}", result.description, label)?;
            }
        }
        self.progress_written = true;
        self.out.flush()
    }

    /// Problem details (unless quiet) followed by the summary.
    pub fn finish(&mut self, outcome: &SuiteOutcome) -> io::Result<()> {
        if self.verbosity == Verbosity::Minimal && self.progress_written {
            writeln!(self.out)?;
        }

        if self.verbosity != Verbosity::Quiet {
            for problem in outcome.problems() {
                self.details(problem)?;
            }
        }

        let tests = outcome.tests_run();
        writeln!(self.out, "{}", LIGHT_RULE)?;
        writeln!(
            self.out,
            "Ran {} test{} in {:.3}s",
            tests,
            if tests == 1 { "" } else { "s" },
            outcome.duration.as_secs_f64()
        )?;
        writeln!(self.out)?;

        let summary = outcome.summary();
        if outcome.was_successful() {
            writeln!(self.out, "{}", style(summary).green().bold())?;
        } else {
            writeln!(self.out, "{}", style(summary).red().bold())?;
        }
        self.out.flush()
    }

    fn details(&mut self, result: &CheckOutcome) -> io::Result<()> {
        let message = match &result.status {
            CheckStatus::Failed(msg) | CheckStatus::Errored(msg) => msg.as_str(),
            CheckStatus::Passed => return Ok(()),
        };
        writeln!(self.out, "{}", HEAVY_RULE)?;
        writeln!(self.out, "{}: {} ({})", result.label(), result.name, result.group)?;
        writeln!(self.out, "{}", result.description)?;
        writeln!(self.out, "{}", LIGHT_RULE)?;
        writeln!(self.out, "{}", message)?;
        writeln!(self.out)
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
