//! JUnit XML report, written in one piece when the run completes.

use super::{escape_xml, Formatter, Node, Output, StepEvent};
use crate::outcome::{Outcome, RunSummary};
use std::io::{self, Write};

pub struct Junit {
    out: Output,
    suite: String,
    features: Vec<SuiteNode>,
    /// Set by a background header until the following scenario names the case.
    unnamed: bool,
}

struct SuiteNode {
    name: String,
    cases: Vec<CaseNode>,
}

struct CaseNode {
    name: String,
    status: Outcome,
    /// First step that decided a non-passing status.
    problem: Option<(String, Option<String>)>,
}

pub(crate) fn build(suite: &str, out: Output) -> Box<dyn Formatter> {
    Box::new(Junit::new(suite, out))
}

impl CaseNode {
    fn new(name: String) -> Self {
        Self {
            name,
            status: Outcome::Passed,
            problem: None,
        }
    }

    fn write(&self, out: &mut dyn Write) -> io::Result<()> {
        let name = escape_xml(&self.name);
        let status = self.status;
        let (step, error) = match &self.problem {
            Some((step, error)) => (escape_xml(step), error.as_deref().map(escape_xml)),
            None => (String::new(), None),
        };
        match status {
            Outcome::Passed => writeln!(out, r#"    <testcase name="{name}" status="{status}"></testcase>"#),
            Outcome::Skipped => {
                writeln!(out, r#"    <testcase name="{name}" status="{status}">"#)?;
                writeln!(out, r#"      <skipped message="Step {step}"></skipped>"#)?;
                writeln!(out, "    </testcase>")
            }
            Outcome::Failed => {
                let error = error.unwrap_or_default();
                writeln!(out, r#"    <testcase name="{name}" status="{status}">"#)?;
                writeln!(out, r#"      <failure message="Step {step}: {error}"></failure>"#)?;
                writeln!(out, "    </testcase>")
            }
            Outcome::Pending | Outcome::Undefined => {
                writeln!(out, r#"    <testcase name="{name}" status="{status}">"#)?;
                writeln!(out, r#"      <error message="Step {step}" type="{status}"></error>"#)?;
                writeln!(out, "    </testcase>")
            }
        }
    }
}

impl Junit {
    pub fn new(suite: impl Into<String>, out: Output) -> Self {
        Self {
            out,
            suite: suite.into(),
            features: Vec::new(),
            unnamed: false,
        }
    }

    fn cases(&mut self) -> &mut Vec<CaseNode> {
        if self.features.is_empty() {
            self.features.push(SuiteNode {
                name: String::new(),
                cases: Vec::new(),
            });
        }
        let last = self.features.len() - 1;
        &mut self.features[last].cases
    }
}

fn count(cases: &[CaseNode], outcomes: &[Outcome]) -> usize {
    cases.iter().filter(|c| outcomes.contains(&c.status)).count()
}

impl Formatter for Junit {
    fn on_node(&mut self, node: &Node) -> io::Result<()> {
        match node {
            Node::Feature { name, .. } => {
                self.unnamed = false;
                self.features.push(SuiteNode {
                    name: name.clone(),
                    cases: Vec::new(),
                });
            }
            Node::Background { .. } => {
                self.unnamed = true;
                self.cases().push(CaseNode::new(String::new()));
            }
            Node::Scenario { name, .. } => {
                if std::mem::take(&mut self.unnamed) {
                    if let Some(case) = self.cases().last_mut() {
                        case.name = name.clone();
                    }
                } else {
                    self.cases().push(CaseNode::new(name.clone()));
                }
            }
        }
        Ok(())
    }

    fn on_step(&mut self, event: &StepEvent) -> io::Result<()> {
        let cases = self.cases();
        if cases.is_empty() {
            cases.push(CaseNode::new(String::new()));
        }
        if let Some(case) = cases.last_mut() {
            let worse = case.status.worst(event.outcome);
            if worse != case.status {
                case.status = worse;
                case.problem = Some((event.text.clone(), event.error.clone()));
            }
        }
        Ok(())
    }

    fn on_run_complete(&mut self, summary: &RunSummary) -> io::Result<()> {
        let all: Vec<&CaseNode> = self.features.iter().flat_map(|f| &f.cases).collect();
        let tally = |outcomes: &[Outcome]| all.iter().filter(|c| outcomes.contains(&c.status)).count();
        let (tests, skipped, failures, errors) = (
            all.len(),
            tally(&[Outcome::Skipped]),
            tally(&[Outcome::Failed]),
            tally(&[Outcome::Pending, Outcome::Undefined]),
        );
        let time = summary.duration.as_secs_f64();

        writeln!(self.out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            self.out,
            r#"<testsuites name="{}" tests="{tests}" skipped="{skipped}" failures="{failures}" errors="{errors}" time="{time:.3}">"#,
            escape_xml(&self.suite)
        )?;
        for feature in &self.features {
            writeln!(
                self.out,
                r#"  <testsuite name="{}" tests="{}" skipped="{}" failures="{}" errors="{}">"#,
                escape_xml(&feature.name),
                feature.cases.len(),
                count(&feature.cases, &[Outcome::Skipped]),
                count(&feature.cases, &[Outcome::Failed]),
                count(&feature.cases, &[Outcome::Pending, Outcome::Undefined]),
            )?;
            for case in &feature.cases {
                case.write(&mut self.out)?;
            }
            writeln!(self.out, "  </testsuite>")?;
        }
        writeln!(self.out, "</testsuites>")?;
        self.out.flush()
    }
}
