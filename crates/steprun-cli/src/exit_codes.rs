//! Process exit codes. Part of the public contract of the `steprun` binary.

use steprun_core::ExitStatus;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1; // failed step, or pending/undefined in strict mode
pub const EXIT_OPTION_ERROR: i32 = 2; // invalid options or unreadable feature documents

pub fn from_status(status: ExitStatus) -> i32 {
    match status {
        ExitStatus::Success => EXIT_SUCCESS,
        ExitStatus::Failure => EXIT_FAILURE,
        ExitStatus::OptionError => EXIT_OPTION_ERROR,
    }
}
