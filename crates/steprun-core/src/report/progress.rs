//! Character-per-step progress view.
//!
//! Steps are drawn in rows of [`ROW_WIDTH`] symbols, each row closed by the
//! cumulative step count. The row a step lands in depends only on how many
//! steps came before it, so row boundaries are the same for every worker
//! count.

use super::{snippets, Formatter, Node, Output, StepEvent};
use crate::outcome::{Outcome, RunSummary, StepFailure};
use std::io::{self, Write};

pub const ROW_WIDTH: usize = 70;

pub struct Progress {
    out: Output,
    steps: usize,
}

pub(crate) fn build(_suite: &str, out: Output) -> Box<dyn Formatter> {
    Box::new(Progress::new(out))
}

pub fn symbol(outcome: Outcome) -> char {
    match outcome {
        Outcome::Passed => '.',
        Outcome::Skipped => '-',
        Outcome::Failed => 'F',
        Outcome::Undefined => 'U',
        Outcome::Pending => 'P',
    }
}

impl Progress {
    pub fn new(out: Output) -> Self {
        Self { out, steps: 0 }
    }

    fn write_failures(&mut self, title: &str, failures: &[&StepFailure]) -> io::Result<()> {
        if failures.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "--- {title}:")?;
        writeln!(self.out)?;
        for f in failures {
            writeln!(self.out, "  Scenario: {} # {}", f.scenario, f.scenario_location)?;
            writeln!(self.out, "    Step: {} # {}", f.step, f.step_location)?;
            writeln!(self.out, "      Error: {}", f.error)?;
            writeln!(self.out)?;
        }
        writeln!(self.out)
    }
}

impl Formatter for Progress {
    fn on_node(&mut self, _node: &Node) -> io::Result<()> {
        Ok(())
    }

    fn on_step(&mut self, event: &StepEvent) -> io::Result<()> {
        write!(self.out, "{}", symbol(event.outcome))?;
        self.steps += 1;
        if self.steps % ROW_WIDTH == 0 {
            writeln!(self.out, " {}", self.steps)?;
        }
        Ok(())
    }

    fn on_run_complete(&mut self, summary: &RunSummary) -> io::Result<()> {
        let rest = self.steps % ROW_WIDTH;
        if rest != 0 {
            let pad = ROW_WIDTH - rest;
            writeln!(self.out, "{:pad$} {}", "", self.steps, pad = pad)?;
        }
        write!(self.out, "\n\n")?;

        let failed: Vec<_> = summary
            .failures
            .iter()
            .filter(|f| f.outcome == Outcome::Failed)
            .collect();
        let pending: Vec<_> = summary
            .failures
            .iter()
            .filter(|f| f.outcome == Outcome::Pending)
            .collect();
        self.write_failures("Failed steps", &failed)?;
        self.write_failures("Pending steps", &pending)?;

        writeln!(self.out, "{}", summary.scenarios_line())?;
        writeln!(self.out, "{}", summary.steps_line())?;
        writeln!(self.out, "{}", summary.duration_line())?;
        write!(self.out, "{}", snippets::snippet_block(&summary.undefined))?;
        self.out.flush()
    }
}
