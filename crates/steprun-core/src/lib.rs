//! Execution engine for behaviour-driven feature documents.
//!
//! Features made of scenarios and steps are matched against a registry of
//! step handlers, executed, and reported through a pluggable formatter
//! protocol. Multiple features can run on a bounded pool of workers while the
//! report stays ordered per feature.

pub mod arg;
pub mod config;
pub mod engine;
pub mod errors;
pub mod guard;
pub mod model;
pub mod outcome;
pub mod registry;
pub mod report;
pub mod runner;
pub mod status;
pub mod suite;

pub use arg::{Arg, ArgError};
pub use config::{BackgroundScope, RunOptions};
pub use engine::Engine;
pub use errors::{ConfigError, RunError, StepError, StepResult};
pub use model::{Background, Feature, Scenario, Step, StepArgument};
pub use outcome::{Counts, FeatureCounts, Outcome, RunSummary};
pub use registry::{StepHandler, StepMatch, StepRegistry};
pub use report::Formatter;
pub use runner::Runner;
pub use status::ExitStatus;
pub use suite::{RunOutcome, Suite};

/// Shorthand for a handler that has not been implemented yet.
///
/// ```
/// use steprun_core::{pending, StepError};
/// assert!(matches!(pending(), Err(StepError::Pending)));
/// ```
pub fn pending() -> StepResult {
    Err(StepError::Pending)
}
