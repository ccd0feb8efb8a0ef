//! Aggregate counting in front of the configured formatter.
//!
//! Every event reaching the formatter passes through a [`Tally`], both when
//! features run sequentially and when worker buffers are flushed after a
//! concurrent run, so totals never depend on the worker count.

use super::{Formatter, Node, StepEvent};
use crate::model::Location;
use crate::outcome::{FeatureCounts, Outcome, RunSummary, StepFailure};
use std::io;
use std::time::Duration;

struct OpenScenario {
    name: String,
    location: Location,
    outcome: Outcome,
    /// False while only the background of this scenario run has been seen.
    named: bool,
    failures: Vec<StepFailure>,
}

pub(crate) struct Tally<'a> {
    inner: &'a mut dyn Formatter,
    summary: RunSummary,
    feature: String,
    open: Option<OpenScenario>,
}

impl<'a> Tally<'a> {
    pub(crate) fn new(inner: &'a mut dyn Formatter) -> Self {
        Self {
            inner,
            summary: RunSummary::default(),
            feature: String::new(),
            open: None,
        }
    }

    fn close_scenario(&mut self) {
        if let Some(open) = self.open.take() {
            self.summary.scenarios.record(open.outcome);
            if let Some(current) = self.summary.per_feature.last_mut() {
                current.scenarios.record(open.outcome);
            }
            for mut failure in open.failures {
                failure.scenario.clone_from(&open.name);
                failure.scenario_location = open.location.clone();
                self.summary.failures.push(failure);
            }
        }
    }

    fn open_scenario(&mut self, name: &str, location: &Location, named: bool) {
        self.close_scenario();
        self.open = Some(OpenScenario {
            name: name.to_string(),
            location: location.clone(),
            outcome: Outcome::Passed,
            named,
            failures: Vec::new(),
        });
    }

    /// Close the last scenario and hand out the summary.
    pub(crate) fn finish(mut self, duration: Duration) -> RunSummary {
        self.close_scenario();
        self.summary.duration = duration;
        self.summary
    }
}

impl Formatter for Tally<'_> {
    fn on_node(&mut self, node: &Node) -> io::Result<()> {
        match node {
            Node::Feature { name, location, .. } => {
                self.close_scenario();
                self.summary.features += 1;
                self.summary.per_feature.push(FeatureCounts {
                    name: name.clone(),
                    path: location.path.clone(),
                    ..FeatureCounts::default()
                });
                self.feature.clone_from(name);
            }
            Node::Background { name, location } => self.open_scenario(name, location, false),
            Node::Scenario { name, location } => {
                match self.open.as_mut().filter(|open| !open.named) {
                    Some(open) => {
                        open.name.clone_from(name);
                        open.location = location.clone();
                        open.named = true;
                    }
                    None => self.open_scenario(name, location, true),
                }
            }
        }
        self.inner.on_node(node)
    }

    fn on_step(&mut self, event: &StepEvent) -> io::Result<()> {
        self.summary.steps.record(event.outcome);
        if let Some(current) = self.summary.per_feature.last_mut() {
            current.steps.record(event.outcome);
        }
        match event.outcome {
            Outcome::Failed | Outcome::Pending => {
                let failure = StepFailure {
                    outcome: event.outcome,
                    feature: self.feature.clone(),
                    scenario: String::new(),
                    scenario_location: event.location.clone(),
                    step: event.text.clone(),
                    step_location: event.location.clone(),
                    error: event.error.clone().unwrap_or_default(),
                };
                match self.open.as_mut() {
                    Some(open) => open.failures.push(failure),
                    None => self.summary.failures.push(failure),
                }
            }
            Outcome::Undefined => {
                if !self.summary.undefined.contains(&event.text) {
                    self.summary.undefined.push(event.text.clone());
                }
            }
            Outcome::Passed | Outcome::Skipped => {}
        }
        if let Some(open) = self.open.as_mut() {
            open.outcome = open.outcome.worst(event.outcome);
        }
        self.inner.on_step(event)
    }

    fn on_run_complete(&mut self, summary: &RunSummary) -> io::Result<()> {
        self.inner.on_run_complete(summary)
    }

    fn supports_concurrency(&self) -> bool {
        self.inner.supports_concurrency()
    }
}
