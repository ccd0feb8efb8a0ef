use crate::errors::ConfigError;
use crate::report::{available_formatters, find_formatter, FormatterSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How far a failing background reaches.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundScope {
    /// Re-run the background before every scenario; a failure skips only
    /// that scenario.
    #[default]
    Scenario,
    /// Run the background before each scenario until it fails once; from
    /// then on every remaining scenario of the feature is skipped.
    Feature,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RunOptions {
    /// Formatter name, see [`crate::report::FORMATTERS`].
    pub format: String,

    /// Number of features executed in parallel. 1 runs sequentially.
    pub concurrency: usize,

    /// Treat pending and undefined steps as failures.
    pub strict: bool,

    pub background_scope: BackgroundScope,

    /// Feature documents or directories, optionally suffixed with `:line`.
    pub paths: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            format: "progress".to_string(),
            concurrency: 1,
            strict: false,
            background_scope: BackgroundScope::default(),
            paths: vec!["features".to_string()],
        }
    }
}

impl RunOptions {
    /// Check the options before anything is loaded or executed and return
    /// the selected formatter.
    pub fn validate(&self) -> Result<&'static FormatterSpec, ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(self.concurrency));
        }
        let spec = find_formatter(&self.format).ok_or_else(|| ConfigError::UnknownFormatter {
            name: self.format.clone(),
            available: available_formatters(),
        })?;
        if self.concurrency > 1 && !spec.concurrent {
            return Err(ConfigError::ConcurrencyUnsupported {
                format: self.format.clone(),
            });
        }
        Ok(spec)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config_error = |detail: String| ConfigError::ConfigFile {
            path: path.display().to_string(),
            detail,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        Self::from_yaml_str(&raw).map_err(|e| config_error(e.to_string()))
    }
}
