use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use steprun_core::BackgroundScope;

#[derive(Parser)]
#[command(
    name = "steprun",
    version,
    about = "Run behaviour-driven feature documents against registered step definitions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute feature documents and report the outcome
    Run(RunArgs),
    /// Print every registered step definition
    Definitions,
    /// List available formatters
    Formats,
    Version,
}

#[derive(Parser, Clone, Debug)]
pub struct RunArgs {
    /// Feature documents or directories, optionally suffixed with `:line`
    pub paths: Vec<String>,

    /// Formatter name (events, junit, pretty, progress)
    #[arg(long, short = 'f', env = "STEPRUN_FORMAT")]
    pub format: Option<String>,

    /// Number of features run in parallel
    #[arg(long, short = 'c', env = "STEPRUN_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Fail on pending or undefined steps
    #[arg(long, env = "STEPRUN_STRICT")]
    pub strict: bool,

    #[arg(long, value_enum)]
    pub background_scope: Option<ScopeArg>,

    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// YAML file with run options; flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Suite name shown by the events and junit formatters
    #[arg(long, default_value = "steprun")]
    pub suite: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeArg {
    Scenario,
    Feature,
}

impl From<ScopeArg> for BackgroundScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Scenario => BackgroundScope::Scenario,
            ScopeArg::Feature => BackgroundScope::Feature,
        }
    }
}
