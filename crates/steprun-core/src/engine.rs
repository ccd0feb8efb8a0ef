//! Per-feature execution.
//!
//! An [`Engine`] drives one feature at a time through its background and
//! scenarios. Once a step fails, is pending or is undefined, every later step
//! of the same scenario is reported as skipped and its handler never runs.

use crate::config::BackgroundScope;
use crate::errors::StepError;
use crate::guard::guarded;
use crate::model::{Feature, Step};
use crate::outcome::{Counts, Outcome};
use crate::registry::StepRegistry;
use crate::report::{DefinitionRef, Formatter, Node, StepEvent};
use std::io;

pub struct Engine<'r> {
    registry: &'r StepRegistry,
    scope: BackgroundScope,
}

/// Steps of a run whose outcome has been decided.
struct Pass<'f, 's> {
    feature: &'f Feature,
    sink: &'s mut dyn Formatter,
    counts: Counts,
}

impl<'r> Engine<'r> {
    pub fn new(registry: &'r StepRegistry, scope: BackgroundScope) -> Self {
        Self { registry, scope }
    }

    /// Run a single feature, reporting to `sink`. The failure flag lives only
    /// for this call, so nothing carries over to the next feature.
    pub fn run_feature(&self, feature: &Feature, sink: &mut dyn Formatter) -> io::Result<Counts> {
        let mut pass = Pass {
            feature,
            sink,
            counts: Counts::default(),
        };
        pass.sink.on_node(&Node::Feature {
            name: feature.name.clone(),
            description: feature.description.clone(),
            location: feature.location(),
        })?;

        // Set once the background fails under `BackgroundScope::Feature`.
        let mut background_failed = false;

        for scenario in &feature.scenarios {
            let mut failed = false;
            if let Some(background) = &feature.background {
                if background_failed {
                    failed = true;
                } else {
                    pass.sink.on_node(&Node::Background {
                        name: background.name.clone(),
                        location: feature.location_at(background.line),
                    })?;
                    failed = self.run_steps(&mut pass, &background.steps, false)?;
                    background_failed = failed && matches!(self.scope, BackgroundScope::Feature);
                }
            }

            pass.sink.on_node(&Node::Scenario {
                name: scenario.name.clone(),
                location: feature.location_at(scenario.line),
            })?;
            self.run_steps(&mut pass, &scenario.steps, failed)?;
        }

        tracing::debug!(
            feature = %feature.name,
            passed = pass.counts.passed,
            failed = pass.counts.failed,
            skipped = pass.counts.skipped,
            pending = pass.counts.pending,
            undefined = pass.counts.undefined,
            "feature finished"
        );
        Ok(pass.counts)
    }

    /// Run `steps` in order; returns whether any of them halted the
    /// scenario. With `failed` already set every step is skipped.
    fn run_steps(&self, pass: &mut Pass<'_, '_>, steps: &[Step], mut failed: bool) -> io::Result<bool> {
        for step in steps {
            let event = if failed {
                self.event(pass.feature, step, None, Outcome::Skipped, None)
            } else {
                let event = self.run_step(pass.feature, step);
                failed = event.outcome.halts_scenario();
                event
            };
            pass.counts.record(event.outcome);
            pass.sink.on_step(&event)?;
        }
        Ok(failed)
    }

    fn run_step(&self, feature: &Feature, step: &Step) -> StepEvent {
        let Some(found) = self.registry.resolve(step) else {
            tracing::debug!(step = %step.text, "no step definition matched");
            return self.event(feature, step, None, Outcome::Undefined, None);
        };
        let definition = DefinitionRef {
            index: found.definition.index,
            pattern: found.definition.pattern.as_str().to_string(),
            name: found.definition.name.clone(),
        };
        let handler = found.definition.handler();
        let args = found.args;
        match guarded(|| handler.handle(&args)) {
            Ok(()) => self.event(feature, step, Some(definition), Outcome::Passed, None),
            Err(StepError::Pending) => self.event(
                feature,
                step,
                Some(definition),
                Outcome::Pending,
                Some(StepError::Pending.to_string()),
            ),
            Err(e) => self.event(
                feature,
                step,
                Some(definition),
                Outcome::Failed,
                Some(e.to_string()),
            ),
        }
    }

    fn event(
        &self,
        feature: &Feature,
        step: &Step,
        definition: Option<DefinitionRef>,
        outcome: Outcome,
        error: Option<String>,
    ) -> StepEvent {
        StepEvent {
            keyword: step.keyword.clone(),
            text: step.text.clone(),
            location: feature.location_at(step.line),
            argument: step.argument.clone(),
            definition,
            outcome,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::Arg;
    use crate::model::{Background, Scenario};
    use crate::report::Recorder;
    use crate::StepResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn outcomes(rec: &Recorder) -> Vec<(String, Outcome)> {
        rec.steps().map(|s| (s.text.clone(), s.outcome)).collect()
    }

    fn counting(calls: &Arc<AtomicUsize>, result: fn() -> StepResult) -> impl Fn(&[Arg]) -> StepResult {
        let calls = Arc::clone(calls);
        move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            result()
        }
    }

    fn run(reg: &StepRegistry, scope: BackgroundScope, feature: &Feature) -> Recorder {
        let mut rec = Recorder::new();
        Engine::new(reg, scope).run_feature(feature, &mut rec).unwrap();
        rec
    }

    #[test]
    fn undefined_step_halts_scenario() {
        let mut reg = StepRegistry::new();
        reg.register("^one$", |_| Ok(())).unwrap();
        let feature = Feature::new("f").with_scenario(Scenario::new("s", ["one", "two", "three"]));

        let rec = run(&reg, BackgroundScope::Scenario, &feature);
        assert_eq!(
            outcomes(&rec),
            vec![
                ("one".into(), Outcome::Passed),
                ("two".into(), Outcome::Undefined),
                ("three".into(), Outcome::Skipped),
            ]
        );
    }

    #[test]
    fn pending_step_skips_rest_without_invoking_handlers() {
        let after = Arc::new(AtomicUsize::new(0));
        let mut reg = StepRegistry::new();
        reg.register("^one$", |_| Ok(())).unwrap();
        reg.register("^two$", |_| crate::pending()).unwrap();
        reg.register("^three$", counting(&after, || Ok(()))).unwrap();
        let feature = Feature::new("f").with_scenario(Scenario::new("s", ["one", "two", "three"]));

        let rec = run(&reg, BackgroundScope::Scenario, &feature);
        assert_eq!(
            outcomes(&rec),
            vec![
                ("one".into(), Outcome::Passed),
                ("two".into(), Outcome::Pending),
                ("three".into(), Outcome::Skipped),
            ]
        );
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failure_carries_error_and_definition() {
        let mut reg = StepRegistry::new();
        reg.register("^one$", |_| Ok(())).unwrap();
        reg.register(r"^two (\d+)$", |args| {
            let n = args[0].as_i64()?;
            Err(StepError::failed(format!("got {n}")))
        })
        .unwrap();
        let feature = Feature::new("f").with_scenario(Scenario::new("s", ["one", "two 7"]));

        let rec = run(&reg, BackgroundScope::Scenario, &feature);
        let failed: Vec<_> = rec.steps().filter(|s| s.outcome == Outcome::Failed).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].error.as_deref(), Some("got 7"));
        assert_eq!(failed[0].definition.as_ref().map(|d| d.index), Some(1));
    }

    #[test]
    fn conversion_error_and_panic_fail_the_step_only() {
        let mut reg = StepRegistry::new();
        reg.register(r"^number (\w+)$", |args| args[0].as_i64().map(|_| ()).map_err(Into::into))
            .unwrap();
        reg.register("^explode$", |_| panic!("kaboom")).unwrap();
        reg.register("^ok$", |_| Ok(())).unwrap();
        let feature = Feature::new("f")
            .with_scenario(Scenario::new("a", ["number ten", "ok"]))
            .with_scenario(Scenario::new("b", ["explode", "ok"]))
            .with_scenario(Scenario::new("c", ["number 10", "ok"]));

        let rec = run(&reg, BackgroundScope::Scenario, &feature);
        let got: Vec<_> = rec.steps().map(|s| s.outcome).collect();
        assert_eq!(
            got,
            vec![
                Outcome::Failed,
                Outcome::Skipped,
                Outcome::Failed,
                Outcome::Skipped,
                Outcome::Passed,
                Outcome::Passed,
            ]
        );
        let errors: Vec<_> = rec.steps().filter_map(|s| s.error.clone()).collect();
        assert!(errors[0].contains("cannot convert \"ten\" to i64"));
        assert_eq!(errors[1], "step panicked: kaboom");
    }

    #[test]
    fn scenario_scoped_background_reruns_for_each_scenario() {
        let bg_calls = Arc::new(AtomicUsize::new(0));
        let mut reg = StepRegistry::new();
        reg.register("^setup$", counting(&bg_calls, || Ok(()))).unwrap();
        reg.register("^ok$", |_| Ok(())).unwrap();
        reg.register("^bad$", |_| Err(StepError::failed("bad"))).unwrap();
        let feature = Feature::new("f")
            .with_background(Background::new(["setup"]))
            .with_scenario(Scenario::new("a", ["bad", "ok"]))
            .with_scenario(Scenario::new("b", ["ok"]));

        let rec = run(&reg, BackgroundScope::Scenario, &feature);
        assert_eq!(bg_calls.load(Ordering::SeqCst), 2);
        let backgrounds = rec
            .events()
            .iter()
            .filter(|e| matches!(e, crate::report::recorder::Event::Node(Node::Background { .. })))
            .count();
        assert_eq!(backgrounds, 2);
        // failure in scenario "a" does not leak into "b"
        assert_eq!(rec.steps().last().map(|s| s.outcome), Some(Outcome::Passed));
    }

    #[test]
    fn failed_background_skips_only_its_scenario() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut reg = StepRegistry::new();
        // fails the first time only
        let a = Arc::clone(&attempts);
        reg.register("^flaky setup$", move |_| {
            if a.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(StepError::failed("first time"))
            } else {
                Ok(())
            }
        })
        .unwrap();
        reg.register("^ok$", |_| Ok(())).unwrap();
        let feature = Feature::new("f")
            .with_background(Background::new(["flaky setup"]))
            .with_scenario(Scenario::new("a", ["ok"]))
            .with_scenario(Scenario::new("b", ["ok"]));

        let rec = run(&reg, BackgroundScope::Scenario, &feature);
        let got: Vec<_> = rec.steps().map(|s| s.outcome).collect();
        assert_eq!(
            got,
            vec![
                Outcome::Failed,
                Outcome::Skipped,
                Outcome::Passed,
                Outcome::Passed
            ]
        );
    }

    #[test]
    fn feature_scoped_background_failure_skips_every_scenario() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut reg = StepRegistry::new();
        reg.register("^setup$", |_| Err(StepError::failed("no db"))).unwrap();
        reg.register("^ok$", counting(&calls, || Ok(()))).unwrap();
        let feature = Feature::new("f")
            .with_background(Background::new(["setup"]))
            .with_scenario(Scenario::new("a", ["ok", "ok"]))
            .with_scenario(Scenario::new("b", ["ok"]));

        let rec = run(&reg, BackgroundScope::Feature, &feature);
        let got: Vec<_> = rec.steps().map(|s| s.outcome).collect();
        assert_eq!(
            got,
            vec![
                Outcome::Failed,
                Outcome::Skipped,
                Outcome::Skipped,
                Outcome::Skipped
            ]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    fn background_nodes(rec: &Recorder) -> usize {
        use crate::report::recorder::Event;
        rec.events()
            .iter()
            .filter(|e| matches!(e, Event::Node(Node::Background { .. })))
            .count()
    }

    #[test]
    fn feature_scoped_background_reruns_before_each_scenario_while_passing() {
        let setups = Arc::new(AtomicUsize::new(0));
        let mut reg = StepRegistry::new();
        reg.register("^setup$", counting(&setups, || Ok(()))).unwrap();
        reg.register("^ok$", |_| Ok(())).unwrap();
        let feature = Feature::new("f")
            .with_background(Background::new(["setup"]))
            .with_scenario(Scenario::new("a", ["ok"]))
            .with_scenario(Scenario::new("b", ["ok"]));

        let rec = run(&reg, BackgroundScope::Feature, &feature);
        assert_eq!(setups.load(Ordering::SeqCst), 2);
        assert_eq!(background_nodes(&rec), 2);
        assert!(rec.steps().all(|s| s.outcome == Outcome::Passed));
    }

    #[test]
    fn feature_scoped_background_stops_after_its_first_failure() {
        let setups = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&setups);
        let mut reg = StepRegistry::new();
        reg.register("^setup$", move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(())
            } else {
                Err(StepError::failed("db gone"))
            }
        })
        .unwrap();
        reg.register("^ok$", |_| Ok(())).unwrap();
        let feature = Feature::new("f")
            .with_background(Background::new(["setup"]))
            .with_scenario(Scenario::new("a", ["ok"]))
            .with_scenario(Scenario::new("b", ["ok"]))
            .with_scenario(Scenario::new("c", ["ok"]));

        let rec = run(&reg, BackgroundScope::Feature, &feature);
        let got: Vec<_> = rec.steps().map(|s| s.outcome).collect();
        assert_eq!(
            got,
            vec![
                Outcome::Passed,
                Outcome::Passed,
                Outcome::Failed,
                Outcome::Skipped,
                Outcome::Skipped
            ]
        );
        assert_eq!(setups.load(Ordering::SeqCst), 2);
        assert_eq!(background_nodes(&rec), 2);

        // per-scenario scope keeps retrying the background
        setups.store(0, Ordering::SeqCst);
        let rec = run(&reg, BackgroundScope::Scenario, &feature);
        assert_eq!(setups.load(Ordering::SeqCst), 3);
        assert_eq!(background_nodes(&rec), 3);
    }

    #[test]
    fn failure_flag_does_not_cross_features() {
        let mut reg = StepRegistry::new();
        reg.register("^setup$", |_| Err(StepError::failed("no"))).unwrap();
        reg.register("^ok$", |_| Ok(())).unwrap();
        let broken = Feature::new("broken")
            .with_background(Background::new(["setup"]))
            .with_scenario(Scenario::new("a", ["ok"]));
        let fine = Feature::new("fine").with_scenario(Scenario::new("b", ["ok"]));

        let engine = Engine::new(&reg, BackgroundScope::Feature);
        let mut rec = Recorder::new();
        engine.run_feature(&broken, &mut rec).unwrap();
        let counts = engine.run_feature(&fine, &mut rec).unwrap();
        assert_eq!(counts.passed, 1);
        assert_eq!(counts.skipped, 0);
    }

    #[test]
    fn events_are_structural_node_then_steps() {
        let mut reg = StepRegistry::new();
        reg.register(".*", |_| Ok(())).unwrap();
        let feature = Feature::new("f")
            .with_path("f.json")
            .with_scenario(Scenario::new("a", ["x"]).at_line(3));

        let rec = run(&reg, BackgroundScope::Scenario, &feature);
        use crate::report::recorder::Event;
        let kinds: Vec<&str> = rec
            .events()
            .iter()
            .map(|e| match e {
                Event::Node(Node::Feature { .. }) => "feature",
                Event::Node(Node::Background { .. }) => "background",
                Event::Node(Node::Scenario { .. }) => "scenario",
                Event::Step(_) => "step",
            })
            .collect();
        assert_eq!(kinds, vec!["feature", "scenario", "step"]);
        match &rec.events()[1] {
            Event::Node(Node::Scenario { location, .. }) => {
                assert_eq!(location.to_string(), "f.json:3")
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
