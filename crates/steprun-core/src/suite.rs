//! Named test suite: step registration plus a one-call run entry point.

use crate::arg::Arg;
use crate::config::RunOptions;
use crate::errors::{RegistryError, RunError, StepResult};
use crate::model::Feature;
use crate::outcome::RunSummary;
use crate::registry::StepRegistry;
use crate::report::Output;
use crate::runner::Runner;
use crate::status::ExitStatus;

pub struct Suite {
    name: String,
    registry: StepRegistry,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub status: ExitStatus,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: StepRegistry::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a step definition. Chainable:
    ///
    /// ```
    /// # use steprun_core::Suite;
    /// let mut suite = Suite::new("godogs");
    /// suite
    ///     .step(r"^there are (\d+) godogs$", |_| Ok(()))?
    ///     .step(r"^I eat (\d+)$", |_| steprun_core::pending())?;
    /// assert_eq!(suite.registry().len(), 2);
    /// # Ok::<(), steprun_core::errors::RegistryError>(())
    /// ```
    pub fn step<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&[Arg]) -> StepResult + Send + Sync + 'static,
    {
        self.registry.register(pattern, handler)?;
        Ok(self)
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Validate `options`, run `features` and report to `output` with the
    /// selected formatter. Option errors are returned before anything runs.
    pub async fn run(
        self,
        features: Vec<Feature>,
        options: &RunOptions,
        output: Output,
    ) -> Result<RunOutcome, RunError> {
        let spec = options.validate()?;
        let mut formatter = spec.build(&self.name, output);
        let runner = Runner::new(self.registry, options.clone());
        let summary = runner.run(features, formatter.as_mut()).await?;
        let status = ExitStatus::from_counts(&summary.steps, options.strict);
        tracing::debug!(suite = %self.name, status = ?status, "suite finished");
        Ok(RunOutcome { summary, status })
    }
}
