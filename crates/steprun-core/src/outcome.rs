use crate::model::Location;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
    Pending,
    Undefined,
}

impl Outcome {
    /// Display order used by every summary line.
    pub const ALL: [Outcome; 5] = [
        Outcome::Passed,
        Outcome::Failed,
        Outcome::Skipped,
        Outcome::Undefined,
        Outcome::Pending,
    ];

    /// Whether this outcome stops the rest of the scenario.
    pub fn halts_scenario(self) -> bool {
        matches!(self, Outcome::Failed | Outcome::Pending | Outcome::Undefined)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
            Outcome::Skipped => "skipped",
            Outcome::Pending => "pending",
            Outcome::Undefined => "undefined",
        }
    }

    /// Precedence when folding step outcomes into a scenario outcome.
    fn severity(self) -> u8 {
        match self {
            Outcome::Passed => 0,
            Outcome::Skipped => 1,
            Outcome::Pending => 2,
            Outcome::Undefined => 3,
            Outcome::Failed => 4,
        }
    }

    /// Fold two outcomes, keeping the more severe one.
    pub fn worst(self, other: Outcome) -> Outcome {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-outcome totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pending: usize,
    pub undefined: usize,
}

impl Counts {
    pub fn record(&mut self, outcome: Outcome) {
        *self.slot(outcome) += 1;
    }

    pub fn get(&self, outcome: Outcome) -> usize {
        match outcome {
            Outcome::Passed => self.passed,
            Outcome::Failed => self.failed,
            Outcome::Skipped => self.skipped,
            Outcome::Pending => self.pending,
            Outcome::Undefined => self.undefined,
        }
    }

    fn slot(&mut self, outcome: Outcome) -> &mut usize {
        match outcome {
            Outcome::Passed => &mut self.passed,
            Outcome::Failed => &mut self.failed,
            Outcome::Skipped => &mut self.skipped,
            Outcome::Pending => &mut self.pending,
            Outcome::Undefined => &mut self.undefined,
        }
    }

    pub fn merge(&mut self, other: &Counts) {
        for outcome in Outcome::ALL {
            *self.slot(outcome) += other.get(outcome);
        }
    }

    pub fn total(&self) -> usize {
        Outcome::ALL.iter().map(|o| self.get(*o)).sum()
    }

    /// `"3 passed, 1 failed"`, omitting zero counts.
    pub fn breakdown(&self) -> String {
        Outcome::ALL
            .iter()
            .filter(|o| self.get(**o) > 0)
            .map(|o| format!("{} {}", self.get(*o), o))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A failed or pending step, with enough context to locate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub outcome: Outcome,
    pub feature: String,
    pub scenario: String,
    pub scenario_location: Location,
    pub step: String,
    pub step_location: Location,
    pub error: String,
}

/// Totals of one feature, keyed by its name and source document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCounts {
    pub name: String,
    pub path: String,
    pub scenarios: Counts,
    pub steps: Counts,
}

/// Aggregate report, finalized after every feature has run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub features: usize,
    pub scenarios: Counts,
    pub steps: Counts,
    /// One entry per feature, in the order the features were given.
    #[serde(default)]
    pub per_feature: Vec<FeatureCounts>,
    pub failures: Vec<StepFailure>,
    /// Distinct undefined step texts in first-seen order.
    pub undefined: Vec<String>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl RunSummary {
    pub fn scenarios_line(&self) -> String {
        summary_line(self.scenarios.total(), "scenario", &self.scenarios)
    }

    pub fn steps_line(&self) -> String {
        summary_line(self.steps.total(), "step", &self.steps)
    }

    /// Elapsed time, truncated to milliseconds.
    pub fn duration_line(&self) -> String {
        let ms = u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX);
        humantime::format_duration(Duration::from_millis(ms)).to_string()
    }
}

fn summary_line(total: usize, noun: &str, counts: &Counts) -> String {
    match total {
        0 => format!("No {noun}s"),
        1 => format!("1 {noun} ({})", counts.breakdown()),
        n => format!("{n} {noun}s ({})", counts.breakdown()),
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
