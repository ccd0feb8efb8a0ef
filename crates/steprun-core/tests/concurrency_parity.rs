use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use steprun_core::{
    Background, Counts, ExitStatus, Feature, RunOptions, RunSummary, Scenario, StepError, Suite,
};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

fn suite() -> Suite {
    let mut suite = Suite::new("parity");
    suite
        .step(r"^pass (\d+)$", |args| {
            args[0].as_i64()?;
            Ok(())
        })
        .unwrap()
        .step("^fail$", |_| Err(StepError::failed("expected failure")))
        .unwrap()
        .step("^todo$", |_| steprun_core::pending())
        .unwrap();
    suite
}

/// 79 scenarios with 306 steps in total, all passing.
fn passing_features() -> Vec<Feature> {
    let scenarios: Vec<Scenario> = (0..79)
        .map(|j| {
            let steps = if j < 69 { 4 } else { 3 };
            let texts: Vec<String> = (0..steps).map(|k| format!("pass {k}")).collect();
            Scenario::new(format!("scenario {j}"), texts.iter().map(String::as_str))
                .at_line(j as u32 + 2)
        })
        .collect();
    scenarios
        .chunks(8)
        .enumerate()
        .map(|(i, chunk)| {
            chunk.iter().cloned().fold(
                Feature::new(format!("feature {i}")).with_path(format!("features/{i}.json")),
                Feature::with_scenario,
            )
        })
        .collect()
}

fn mixed_features() -> Vec<Feature> {
    (0..12)
        .map(|i| {
            let mut feature = Feature::new(format!("mixed {i}"))
                .with_path(format!("mixed/{i}.json"))
                .with_scenario(Scenario::new("passes", ["pass 1", "pass 2"]).at_line(3));
            if i % 3 == 0 {
                feature = feature.with_background(Background::new(["pass 0"]));
            }
            match i % 4 {
                0 => feature.with_scenario(Scenario::new("fails", ["pass 1", "fail", "pass 2"]).at_line(7)),
                1 => feature.with_scenario(Scenario::new("pends", ["todo", "pass 2"]).at_line(7)),
                2 => feature.with_scenario(Scenario::new("undefined", ["nobody knows", "pass 2"]).at_line(7)),
                _ => feature,
            }
        })
        .collect()
}

async fn run(format: &str, concurrency: usize, features: Vec<Feature>) -> (ExitStatus, String) {
    let buf = SharedBuf::default();
    let options = RunOptions {
        format: format.into(),
        concurrency,
        ..Default::default()
    };
    let outcome = suite()
        .run(features, &options, Box::new(buf.clone()))
        .await
        .expect("run completes");
    (outcome.status, buf.text())
}

async fn summary(concurrency: usize, features: Vec<Feature>) -> RunSummary {
    let options = RunOptions {
        concurrency,
        ..Default::default()
    };
    suite()
        .run(features, &options, Box::new(io::sink()))
        .await
        .expect("run completes")
        .summary
}

struct ProgressOutput {
    symbols: BTreeMap<char, usize>,
    steps_per_row: Vec<usize>,
    bottom_rows: Vec<String>,
}

fn parse_progress(output: &str) -> ProgressOutput {
    let (top, bottom) = output.split_once("\n\n\n").expect("progress layout");
    let mut symbols = BTreeMap::new();
    let mut steps_per_row = Vec::new();
    for row in top.lines() {
        let (marks, _count) = row.rsplit_once(' ').expect("row count");
        let marks = marks.trim_end();
        for c in marks.chars() {
            *symbols.entry(c).or_default() += 1;
        }
        steps_per_row.push(marks.chars().count());
    }
    let mut bottom_rows: Vec<String> = bottom
        .lines()
        // elapsed time is the only line allowed to differ
        .filter(|l| humantime::parse_duration(l).is_err())
        .map(str::to_string)
        .collect();
    bottom_rows.sort();
    ProgressOutput {
        symbols,
        steps_per_row,
        bottom_rows,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn all_features_run_with_ten_workers() {
    let (status, output) = run("progress", 10, passing_features()).await;
    assert_eq!(status, ExitStatus::Success);

    let dots = ".".repeat(70);
    let expected = format!(
        "{dots} 70\n{dots} 140\n{dots} 210\n{dots} 280\n{}{} 306\n\n\n79 scenarios (79 passed)\n306 steps (306 passed)\n",
        ".".repeat(26),
        " ".repeat(44)
    );
    assert!(output.starts_with(&expected), "unexpected output:\n{output}");
    let duration = output[expected.len()..].trim_end();
    assert!(duration.ends_with('s'), "duration line: {duration}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn passing_totals_match_at_one_and_ten_workers() {
    let single = summary(1, passing_features()).await;
    let concurrent = summary(10, passing_features()).await;

    assert_eq!(single.steps.passed, 306);
    assert_eq!(single.steps.total(), 306);
    assert_eq!(single.scenarios.passed, 79);
    assert_eq!(single.steps, concurrent.steps);
    assert_eq!(single.scenarios, concurrent.scenarios);
    assert_eq!(single.per_feature, concurrent.per_feature);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn per_feature_counts_keep_feature_order() {
    let single = summary(1, mixed_features()).await;
    let concurrent = summary(10, mixed_features()).await;
    assert_eq!(single.per_feature, concurrent.per_feature);

    let names: Vec<String> = concurrent.per_feature.iter().map(|f| f.name.clone()).collect();
    let expected: Vec<String> = (0..12).map(|i| format!("mixed {i}")).collect();
    assert_eq!(names, expected);

    // "mixed 0": background, one passing and one failing scenario
    let first = &concurrent.per_feature[0];
    assert_eq!(first.path, "mixed/0.json");
    assert_eq!(first.scenarios.passed, 1);
    assert_eq!(first.scenarios.failed, 1);
    assert_eq!(first.steps.failed, 1);
    assert_eq!(first.steps.skipped, 1);
    assert_eq!(first.steps.passed, 5);

    let mut steps = Counts::default();
    let mut scenarios = Counts::default();
    for feature in &concurrent.per_feature {
        steps.merge(&feature.steps);
        scenarios.merge(&feature.scenarios);
    }
    assert_eq!(steps, concurrent.steps);
    assert_eq!(scenarios, concurrent.scenarios);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn progress_output_is_stable_across_worker_counts() {
    let (single_status, single) = run("progress", 1, mixed_features()).await;
    let (status, concurrent) = run("progress", 10, mixed_features()).await;
    assert_eq!(single_status, status);
    assert_eq!(status, ExitStatus::Failure);

    let single = parse_progress(&single);
    let concurrent = parse_progress(&concurrent);
    assert_eq!(single.symbols, concurrent.symbols);
    assert_eq!(single.steps_per_row, concurrent.steps_per_row);
    assert_eq!(single.bottom_rows, concurrent.bottom_rows);
    assert_eq!(single.symbols.get(&'F'), Some(&3));
    assert_eq!(single.symbols.get(&'P'), Some(&3));
    assert_eq!(single.symbols.get(&'U'), Some(&3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn junit_rows_match_across_worker_counts() {
    let (single_status, single) = run("junit", 1, mixed_features()).await;
    let (status, concurrent) = run("junit", 10, mixed_features()).await;
    assert_eq!(single_status, status);

    let rows = |xml: &str| {
        let mut rows: Vec<String> = xml
            .lines()
            .filter(|l| !l.starts_with("<testsuites"))
            .map(str::to_string)
            .collect();
        rows.sort();
        rows
    };
    assert_eq!(rows(&single), rows(&concurrent));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pretty_refuses_concurrency_before_running() {
    let options = RunOptions {
        format: "pretty".into(),
        concurrency: 2,
        ..Default::default()
    };
    let buf = SharedBuf::default();
    let err = suite()
        .run(mixed_features(), &options, Box::new(buf.clone()))
        .await
        .unwrap_err();
    assert_eq!(err.exit_status(), ExitStatus::OptionError);
    assert_eq!(
        err.to_string(),
        "format \"pretty\" does not support concurrent execution"
    );
    assert!(buf.text().is_empty());
}
