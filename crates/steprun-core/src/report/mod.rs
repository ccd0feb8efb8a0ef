//! Formatter protocol.
//!
//! The engine reports every structural node (feature, background, scenario)
//! and every step outcome to a [`Formatter`]. Concrete formatters differ only
//! in rendering and buffering; they all consume the same event sequence and
//! receive the aggregated [`RunSummary`] once the run completes.

pub mod events;
pub mod junit;
pub mod pretty;
pub mod progress;
pub mod recorder;
pub mod snippets;
pub mod tally;

use crate::model::{Location, StepArgument};
use crate::outcome::{Outcome, RunSummary};
use serde::Serialize;
use std::io::{self, Write};

pub use recorder::Recorder;
pub(crate) use tally::Tally;

/// Output sink handed to a formatter.
pub type Output = Box<dyn Write + Send>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Feature {
        name: String,
        description: String,
        location: Location,
    },
    Background {
        name: String,
        location: Location,
    },
    Scenario {
        name: String,
        location: Location,
    },
}

/// Definition that handled a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionRef {
    pub index: usize,
    pub pattern: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepEvent {
    pub keyword: String,
    pub text: String,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument: Option<StepArgument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<DefinitionRef>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Event sink driven by the engine.
pub trait Formatter: Send {
    /// Called once per feature, background and scenario header.
    fn on_node(&mut self, node: &Node) -> io::Result<()>;

    /// Called exactly once per step with its final outcome.
    fn on_step(&mut self, event: &StepEvent) -> io::Result<()>;

    /// Called once after every feature has finished.
    fn on_run_complete(&mut self, summary: &RunSummary) -> io::Result<()>;

    /// Whether output stays meaningful when features run on several workers.
    fn supports_concurrency(&self) -> bool {
        true
    }
}

/// Registered formatter: name, capability and constructor.
pub struct FormatterSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub concurrent: bool,
    build: fn(&str, Output) -> Box<dyn Formatter>,
}

impl FormatterSpec {
    /// Instantiate the formatter for the named suite.
    pub fn build(&self, suite: &str, output: Output) -> Box<dyn Formatter> {
        (self.build)(suite, output)
    }
}

impl std::fmt::Debug for FormatterSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterSpec")
            .field("name", &self.name)
            .field("concurrent", &self.concurrent)
            .finish()
    }
}

/// Formatters selectable by name, sorted by name.
pub static FORMATTERS: &[FormatterSpec] = &[
    FormatterSpec {
        name: "events",
        description: "Produces JSON event stream, based on spec: 0.1.0.",
        concurrent: true,
        build: events::build,
    },
    FormatterSpec {
        name: "junit",
        description: "Prints junit compatible xml to stdout",
        concurrent: true,
        build: junit::build,
    },
    FormatterSpec {
        name: "pretty",
        description: "Prints every feature with runtime statuses.",
        concurrent: false,
        build: pretty::build,
    },
    FormatterSpec {
        name: "progress",
        description: "Prints a character per step.",
        concurrent: true,
        build: progress::build,
    },
];

pub fn find_formatter(name: &str) -> Option<&'static FormatterSpec> {
    FORMATTERS.iter().find(|f| f.name == name)
}

/// Comma separated list of registered formatter names.
pub fn available_formatters() -> String {
    FORMATTERS
        .iter()
        .map(|f| f.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Escape text for XML attribute and element content.
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
