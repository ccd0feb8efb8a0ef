use crate::arg::ArgError;
use crate::status::ExitStatus;

/// Result returned by every step handler.
pub type StepResult = Result<(), StepError>;

/// Step-local failure. Always recovered into an outcome, never propagated
/// past the step that raised it.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Sentinel for a handler that is not implemented yet.
    #[error("pending step")]
    Pending,

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Arg(#[from] ArgError),

    #[error("step panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StepError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid step pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cannot register `{pattern}`: the step registry is sealed once execution starts")]
    Sealed { pattern: String },
}

/// Problems detected before any feature runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unregistered formatter name: \"{name}\", use one of: {available}")]
    UnknownFormatter { name: String, available: String },

    #[error("format \"{format}\" does not support concurrent execution")]
    ConcurrencyUnsupported { format: String },

    #[error("concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),

    #[error("feature path \"{path}\" is not available")]
    FeaturePathUnavailable { path: String },

    #[error("failed to parse feature file \"{path}\": {detail}")]
    FeatureParse { path: String, detail: String },

    #[error("failed to read config file \"{path}\": {detail}")]
    ConfigFile { path: String, detail: String },

    #[error("output \"{path}\" is not available: {detail}")]
    OutputUnavailable { path: String, detail: String },
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),

    #[error("worker failed: {0}")]
    Worker(String),
}

impl RunError {
    /// Exit status for the binary. Configuration problems never share a
    /// status with test failures.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Self::Config(_) => ExitStatus::OptionError,
            Self::Output(_) | Self::Worker(_) => ExitStatus::Failure,
        }
    }
}
