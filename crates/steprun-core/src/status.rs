//! Strict-mode reduction of aggregate counts into success and exit status.

use crate::outcome::Counts;

/// Process exit status. The three values never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    /// Invalid options or unreadable input, detected before any feature ran.
    OptionError,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
            ExitStatus::OptionError => 2,
        }
    }

    /// Decide the status of a finished run from its step totals.
    pub fn from_counts(steps: &Counts, strict: bool) -> Self {
        if is_success(steps, strict) {
            ExitStatus::Success
        } else {
            ExitStatus::Failure
        }
    }
}

/// `failed == 0`, and in strict mode also no pending or undefined steps.
pub fn is_success(steps: &Counts, strict: bool) -> bool {
    steps.failed == 0 && (!strict || (steps.pending == 0 && steps.undefined == 0))
}
