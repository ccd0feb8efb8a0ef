//! Human-readable, incremental feature listing. Only meaningful when
//! features run one after the other.

use super::{snippets, Formatter, Node, Output, StepEvent};
use crate::model::StepArgument;
use crate::outcome::{Outcome, RunSummary};
use std::io::{self, Write};

pub struct Pretty {
    out: Output,
    /// A background is printed once per feature even when it re-runs.
    background_shown: bool,
    /// Skip repeated background steps while this is set.
    in_repeated_background: bool,
}

pub(crate) fn build(_suite: &str, out: Output) -> Box<dyn Formatter> {
    Box::new(Pretty::new(out))
}

impl Pretty {
    pub fn new(out: Output) -> Self {
        Self {
            out,
            background_shown: false,
            in_repeated_background: false,
        }
    }

    fn write_argument(&mut self, argument: &StepArgument) -> io::Result<()> {
        match argument {
            StepArgument::DocString(text) => {
                writeln!(self.out, "      \"\"\"")?;
                for line in text.lines() {
                    writeln!(self.out, "      {line}")?;
                }
                writeln!(self.out, "      \"\"\"")
            }
            StepArgument::Table(rows) => {
                let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
                let widths: Vec<usize> = (0..columns)
                    .map(|c| {
                        rows.iter()
                            .filter_map(|r| r.get(c))
                            .map(|cell| cell.chars().count())
                            .max()
                            .unwrap_or(0)
                    })
                    .collect();
                for row in rows {
                    write!(self.out, "      |")?;
                    for (c, width) in widths.iter().enumerate() {
                        let cell = row.get(c).map(String::as_str).unwrap_or("");
                        write!(self.out, " {cell:<width$} |")?;
                    }
                    writeln!(self.out)?;
                }
                Ok(())
            }
        }
    }
}

impl Formatter for Pretty {
    fn on_node(&mut self, node: &Node) -> io::Result<()> {
        match node {
            Node::Feature {
                name, description, ..
            } => {
                self.background_shown = false;
                self.in_repeated_background = false;
                writeln!(self.out, "Feature: {name}")?;
                for line in description.lines() {
                    writeln!(self.out, "  {}", line.trim())?;
                }
            }
            Node::Background { name, .. } => {
                if self.background_shown {
                    self.in_repeated_background = true;
                } else {
                    self.background_shown = true;
                    writeln!(self.out)?;
                    writeln!(self.out, "  Background: {name}")?;
                }
            }
            Node::Scenario { name, location } => {
                self.in_repeated_background = false;
                writeln!(self.out)?;
                writeln!(self.out, "  Scenario: {name} # {location}")?;
            }
        }
        Ok(())
    }

    fn on_step(&mut self, event: &StepEvent) -> io::Result<()> {
        // failures inside a repeated background still need to be visible
        if self.in_repeated_background && !event.outcome.halts_scenario() {
            return Ok(());
        }
        let keyword = event.keyword.trim();
        match &event.definition {
            Some(def) => writeln!(
                self.out,
                "    {keyword} {} # {} [{}]",
                event.text, def.name, event.outcome
            )?,
            None => writeln!(self.out, "    {keyword} {} [{}]", event.text, event.outcome)?,
        }
        if let Some(argument) = &event.argument {
            self.write_argument(argument)?;
        }
        if event.outcome == Outcome::Failed {
            if let Some(error) = &event.error {
                writeln!(self.out, "    Error: {error}")?;
            }
        }
        Ok(())
    }

    fn on_run_complete(&mut self, summary: &RunSummary) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", summary.scenarios_line())?;
        writeln!(self.out, "{}", summary.steps_line())?;
        writeln!(self.out, "{}", summary.duration_line())?;
        write!(self.out, "{}", snippets::snippet_block(&summary.undefined))?;
        self.out.flush()
    }

    fn supports_concurrency(&self) -> bool {
        false
    }
}
