//! Line-delimited JSON event stream, one object per line.

use super::{snippets, Formatter, Node, Output, StepEvent};
use crate::model::Location;
use crate::outcome::{Outcome, RunSummary};
use serde_json::{json, Value};
use std::io::{self, Write};

pub const EVENTS_VERSION: &str = "0.1.0";

pub struct Events {
    out: Output,
    suite: String,
    started: bool,
    case: Option<Case>,
}

/// Scenario being streamed. Background steps arrive before the scenario
/// header, so they are held until its location is known.
struct Case {
    location: Option<Location>,
    status: Outcome,
    held: Vec<Value>,
}

pub(crate) fn build(suite: &str, out: Output) -> Box<dyn Formatter> {
    Box::new(Events::new(suite, out))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl Events {
    pub fn new(suite: impl Into<String>, out: Output) -> Self {
        Self {
            out,
            suite: suite.into(),
            started: false,
            case: None,
        }
    }

    fn emit(&mut self, value: &Value) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        writeln!(self.out)
    }

    fn start_run(&mut self) -> io::Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        let event = json!({
            "event": "TestRunStarted",
            "version": EVENTS_VERSION,
            "timestamp": now_ms(),
            "suite": self.suite,
        });
        self.emit(&event)
    }

    fn close_case(&mut self) -> io::Result<()> {
        let Some(case) = self.case.take() else {
            return Ok(());
        };
        let location = case.location.map(|l| l.to_string()).unwrap_or_default();
        for held in &case.held {
            self.emit(held)?;
        }
        self.emit(&json!({
            "event": "TestCaseFinished",
            "location": location,
            "timestamp": now_ms(),
            "status": case.status,
        }))
    }

    fn case(&mut self) -> &mut Case {
        self.case.get_or_insert_with(|| Case {
            location: None,
            status: Outcome::Passed,
            held: Vec::new(),
        })
    }
}

impl Formatter for Events {
    fn on_node(&mut self, node: &Node) -> io::Result<()> {
        self.start_run()?;
        match node {
            Node::Feature { name, location, .. } => {
                self.close_case()?;
                self.emit(&json!({
                    "event": "TestSource",
                    "location": location.to_string(),
                    "source": name,
                }))
            }
            Node::Background { .. } => {
                self.close_case()?;
                self.case();
                Ok(())
            }
            Node::Scenario { location, .. } => {
                if self.case.as_ref().is_some_and(|c| c.location.is_some()) {
                    self.close_case()?;
                }
                let case = self.case();
                case.location = Some(location.clone());
                let held = std::mem::take(&mut case.held);
                self.emit(&json!({
                    "event": "TestCaseStarted",
                    "location": location.to_string(),
                    "timestamp": now_ms(),
                }))?;
                for event in &held {
                    self.emit(event)?;
                }
                Ok(())
            }
        }
    }

    fn on_step(&mut self, event: &StepEvent) -> io::Result<()> {
        self.start_run()?;
        let mut lines = Vec::with_capacity(2);
        if let Some(def) = &event.definition {
            lines.push(json!({
                "event": "StepDefinitionFound",
                "location": event.location.to_string(),
                "definition_id": def.index,
                "pattern": def.pattern,
            }));
        }
        let mut finished = json!({
            "event": "TestStepFinished",
            "location": event.location.to_string(),
            "timestamp": now_ms(),
            "status": event.outcome,
        });
        if let Some(error) = &event.error {
            finished["summary"] = Value::String(error.clone());
        }
        lines.push(finished);

        let case = self.case();
        case.status = case.status.worst(event.outcome);
        if case.location.is_none() {
            case.held.extend(lines);
            return Ok(());
        }
        for line in &lines {
            self.emit(line)?;
        }
        Ok(())
    }

    fn on_run_complete(&mut self, summary: &RunSummary) -> io::Result<()> {
        self.start_run()?;
        self.close_case()?;
        let status = if summary.steps.failed > 0 {
            Outcome::Failed
        } else {
            Outcome::Passed
        };
        self.emit(&json!({
            "event": "TestRunFinished",
            "status": status,
            "timestamp": now_ms(),
            "snippets": snippets::snippet_block(&summary.undefined),
            "scenarios": summary.scenarios,
            "steps": summary.steps,
        }))?;
        self.out.flush()
    }
}
