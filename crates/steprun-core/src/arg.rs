//! Arguments passed to step handlers.
//!
//! Captures from the matching pattern come first, in group order. A doc
//! string or data table attached to the step follows as the last argument.

use crate::model::StepArgument;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Text captured by a pattern group. Groups that did not participate in
    /// the match capture an empty string.
    Text(String),
    DocString(String),
    Table(Vec<Vec<String>>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    #[error("cannot convert \"{value}\" to f64: {reason}")]
    Float { value: String, reason: String },

    #[error("cannot convert \"{value}\" to i64: {reason}")]
    Int { value: String, reason: String },

    #[error("expected {expected} argument, got {found}")]
    Kind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("step has no argument at position {0}")]
    Missing(usize),
}

impl Arg {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Text(_) => "text",
            Arg::DocString(_) => "doc string",
            Arg::Table(_) => "table",
        }
    }

    /// Textual content of a capture or doc string.
    pub fn as_str(&self) -> Result<&str, ArgError> {
        match self {
            Arg::Text(s) | Arg::DocString(s) => Ok(s),
            Arg::Table(_) => Err(ArgError::Kind {
                expected: "text",
                found: self.kind(),
            }),
        }
    }

    pub fn as_f64(&self) -> Result<f64, ArgError> {
        let value = self.as_str()?;
        value.trim().parse::<f64>().map_err(|e| ArgError::Float {
            value: value.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn as_i64(&self) -> Result<i64, ArgError> {
        let value = self.as_str()?;
        value.trim().parse::<i64>().map_err(|e| ArgError::Int {
            value: value.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn as_table(&self) -> Result<&[Vec<String>], ArgError> {
        match self {
            Arg::Table(rows) => Ok(rows),
            _ => Err(ArgError::Kind {
                expected: "table",
                found: self.kind(),
            }),
        }
    }
}

impl From<&StepArgument> for Arg {
    fn from(argument: &StepArgument) -> Self {
        match argument {
            StepArgument::DocString(s) => Arg::DocString(s.clone()),
            StepArgument::Table(rows) => Arg::Table(rows.clone()),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Text(s) | Arg::DocString(s) => f.write_str(s),
            Arg::Table(rows) => {
                for row in rows {
                    writeln!(f, "| {} |", row.join(" | "))?;
                }
                Ok(())
            }
        }
    }
}

/// Positional access that reports a missing argument instead of panicking.
pub trait ArgsExt {
    fn arg(&self, index: usize) -> Result<&Arg, ArgError>;
}

impl ArgsExt for [Arg] {
    fn arg(&self, index: usize) -> Result<&Arg, ArgError> {
        self.get(index).ok_or(ArgError::Missing(index))
    }
}
