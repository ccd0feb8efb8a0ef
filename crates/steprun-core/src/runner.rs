//! Concurrency coordinator.
//!
//! With one worker, features stream straight into the formatter. With more,
//! each feature runs on a bounded pool of blocking workers and records its
//! events into a private [`Recorder`]; buffers are flushed in original
//! feature order once every worker has joined, so a feature's events are
//! never interleaved with another's.

use crate::config::RunOptions;
use crate::engine::Engine;
use crate::errors::{ConfigError, RunError};
use crate::model::Feature;
use crate::outcome::RunSummary;
use crate::registry::StepRegistry;
use crate::report::{Formatter, Recorder, Tally};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub struct Runner {
    registry: Arc<StepRegistry>,
    options: RunOptions,
}

impl Runner {
    /// Take ownership of the registry and seal it; it is shared read-only by
    /// every worker from here on.
    pub fn new(mut registry: StepRegistry, options: RunOptions) -> Self {
        registry.seal();
        Self {
            registry: Arc::new(registry),
            options,
        }
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub async fn run(
        &self,
        features: Vec<Feature>,
        formatter: &mut dyn Formatter,
    ) -> Result<RunSummary, RunError> {
        let workers = self.options.concurrency;
        if workers == 0 {
            return Err(ConfigError::InvalidConcurrency(workers).into());
        }
        if workers > 1 && !formatter.supports_concurrency() {
            return Err(ConfigError::ConcurrencyUnsupported {
                format: self.options.format.clone(),
            }
            .into());
        }

        tracing::info!(
            features = features.len(),
            workers,
            definitions = self.registry.len(),
            steps = features.iter().map(Feature::step_count).sum::<usize>(),
            format = %self.options.format,
            "starting run"
        );
        let started = Instant::now();
        let mut tally = Tally::new(formatter);
        if workers == 1 {
            let engine = Engine::new(&self.registry, self.options.background_scope);
            for feature in &features {
                engine.run_feature(feature, &mut tally)?;
            }
        } else {
            self.run_concurrent(features, &mut tally).await?;
        }
        let summary = tally.finish(started.elapsed());
        formatter.on_run_complete(&summary)?;

        tracing::info!(
            scenarios = summary.scenarios.total(),
            steps = summary.steps.total(),
            failed = summary.steps.failed,
            elapsed_ms = u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
            "run finished"
        );
        Ok(summary)
    }

    async fn run_concurrent(
        &self,
        features: Vec<Feature>,
        tally: &mut Tally<'_>,
    ) -> Result<(), RunError> {
        let total = features.len();
        let sem = Arc::new(Semaphore::new(self.options.concurrency));
        let mut join_set = JoinSet::new();

        for (index, feature) in features.into_iter().enumerate() {
            let permit = sem
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| RunError::Worker(e.to_string()))?;
            let registry = Arc::clone(&self.registry);
            let scope = self.options.background_scope;
            join_set.spawn_blocking(move || {
                let _permit = permit;
                let mut buffer = Recorder::new();
                Engine::new(&registry, scope)
                    .run_feature(&feature, &mut buffer)
                    .map(|_| (index, buffer))
            });
        }

        let mut buffers = Vec::with_capacity(total);
        while let Some(res) = join_set.join_next().await {
            let (index, buffer) = res.map_err(|e| RunError::Worker(e.to_string()))??;
            buffers.push((index, buffer));
        }

        // Deterministic flush order: original feature position.
        buffers.sort_by_key(|(index, _)| *index);
        for (_, buffer) in &buffers {
            buffer.replay(tally)?;
        }
        Ok(())
    }
}
