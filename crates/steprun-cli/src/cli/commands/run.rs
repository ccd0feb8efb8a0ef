use super::super::args::RunArgs;
use crate::{demo, exit_codes, features};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use steprun_core::report::Output;
use steprun_core::{ConfigError, RunOptions};

/// Layer defaults, the optional config file and command-line flags, in
/// increasing precedence.
pub(crate) fn resolve_options(args: &RunArgs) -> Result<RunOptions, ConfigError> {
    let mut options = match &args.config {
        Some(path) => RunOptions::load(path)?,
        None => RunOptions::default(),
    };
    if let Some(format) = &args.format {
        options.format.clone_from(format);
    }
    if let Some(concurrency) = args.concurrency {
        options.concurrency = concurrency;
    }
    if args.strict {
        options.strict = true;
    }
    if let Some(scope) = args.background_scope {
        options.background_scope = scope.into();
    }
    if !args.paths.is_empty() {
        options.paths.clone_from(&args.paths);
    }
    Ok(options)
}

fn option_error(e: &ConfigError) -> i32 {
    eprintln!("{e}");
    exit_codes::EXIT_OPTION_ERROR
}

/// Report sink: the `--output` file, or stdout when none is given.
fn open_output(path: Option<&Path>) -> Result<Output, ConfigError> {
    let output: Output = match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| ConfigError::OutputUnavailable {
                path: path.display().to_string(),
                detail: e.to_string(),
            })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout()),
    };
    Ok(output)
}

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let options = match resolve_options(&args) {
        Ok(options) => options,
        Err(e) => return Ok(option_error(&e)),
    };
    // option errors must surface before any document is read
    if let Err(e) = options.validate() {
        return Ok(option_error(&e));
    }
    let features = match features::load_features(&options.paths) {
        Ok(features) => features,
        Err(e) => return Ok(option_error(&e)),
    };

    let output = match open_output(args.output.as_deref()) {
        Ok(output) => output,
        Err(e) => return Ok(option_error(&e)),
    };
    let suite = demo::suite(&args.suite)?;
    match suite.run(features, &options, output).await {
        Ok(outcome) => {
            tracing::info!(status = ?outcome.status, "run complete");
            Ok(exit_codes::from_status(outcome.status))
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(exit_codes::from_status(e.exit_status()))
        }
    }
}
