//! Materialized feature tree.
//!
//! Documents are produced by an external parser and handed to the engine
//! already structurally valid. The types deserialize from JSON or YAML so a
//! parsed tree can be stored next to the test suite.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Source document path, filled in by the loader.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub background: Option<Background>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default = "default_keyword")]
    pub keyword: String,
    pub text: String,
    #[serde(default)]
    pub line: u32,
    /// Written as a one-key map (`table:` or `doc_string:`) in both JSON
    /// and YAML documents.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_yaml::with::singleton_map"
    )]
    pub argument: Option<StepArgument>,
}

fn default_keyword() -> String {
    "*".into()
}

/// Structured argument attached to a step below its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepArgument {
    DocString(String),
    Table(Vec<Vec<String>>),
}

/// `path:line` of a node, used by formatters to point back at the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    pub line: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line)
    }
}

impl Feature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            path: String::new(),
            line: 1,
            background: None,
            scenarios: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    pub fn location(&self) -> Location {
        self.location_at(self.line)
    }

    pub fn location_at(&self, line: u32) -> Location {
        Location {
            path: self.path.clone(),
            line,
        }
    }

    /// Number of steps a run reports for this feature, counting the
    /// background once per scenario. A background that fails under
    /// [`crate::BackgroundScope::Feature`] is not re-run, so such a run
    /// reports fewer.
    pub fn step_count(&self) -> usize {
        let background = self.background.as_ref().map_or(0, |b| b.steps.len());
        self.scenarios
            .iter()
            .map(|s| s.steps.len() + background)
            .sum()
    }
}

impl Background {
    pub fn new<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Step>,
    {
        Self {
            name: String::new(),
            line: 0,
            steps: steps.into_iter().map(Into::into).collect(),
        }
    }
}

impl Scenario {
    pub fn new<I, S>(name: impl Into<String>, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Step>,
    {
        Self {
            name: name.into(),
            line: 0,
            steps: steps.into_iter().map(Into::into).collect(),
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }
}

impl Step {
    pub fn new(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            text: text.into(),
            line: 0,
            argument: None,
        }
    }

    pub fn with_argument(mut self, argument: StepArgument) -> Self {
        self.argument = Some(argument);
        self
    }
}

impl From<&str> for Step {
    fn from(text: &str) -> Self {
        Step::new(default_keyword(), text)
    }
}
