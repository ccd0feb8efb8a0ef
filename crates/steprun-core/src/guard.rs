//! Guarded execution of step handlers.
//!
//! [`guarded`] turns a panicking handler into a typed [`StepError::Panicked`]
//! so one faulty step never takes down the worker running it.

use crate::errors::{StepError, StepResult};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Formats a panic payload when logged or displayed.
///
/// The payload is downcast to `String` or `&'static str` if possible and
/// falls back to `Debug` formatting otherwise.
#[derive(Debug)]
#[must_use]
pub struct PanicMessage(Box<dyn Any + Send>);

impl fmt::Display for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.0.downcast_ref::<String>() {
            f.write_str(s)
        } else if let Some(s) = self.0.downcast_ref::<&'static str>() {
            f.write_str(s)
        } else {
            write!(f, "{:?}", self.0)
        }
    }
}

/// Run `f`, converting a panic into [`StepError::Panicked`].
///
/// Handlers are shared read-only across workers, so observing their state
/// after an unwind cannot break an invariant this crate relies on.
pub fn guarded<F>(f: F) -> StepResult
where
    F: FnOnce() -> StepResult,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = PanicMessage(payload).to_string();
            tracing::warn!(panic = %message, "step handler panicked");
            Err(StepError::Panicked(message))
        }
    }
}
