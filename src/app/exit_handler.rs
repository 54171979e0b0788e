//! Exit code logic for the cookie-presets process.
//!
//! Single responsibility: map applied/failed cookie counts to the process exit outcome.

use cookie_presets::ApplyResult;

use crate::ProcessExit;

/// Determines the process exit outcome from applied and failed cookie counts.
pub(crate) fn determine_exit_outcome(applied: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if applied > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

pub(crate) fn exit_outcome_for(result: &ApplyResult) -> ProcessExit {
    determine_exit_outcome(result.applied_count, result.failed_count)
}
