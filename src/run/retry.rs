//! Flaky-failure retry control

use std::thread;

use crate::run::lifecycle;
use crate::run::params::RunParams;
use crate::run::record::{AttemptOutcome, RunRecord, TestCase, TestStatus};
use crate::run::runtime::TestRuntime;

/// Run `case` once, then re-run it while it keeps failing, up to
/// `max_retries` extra attempts, stopping at the first non-failed outcome.
///
/// Each failed attempt's messages are appended to the run-level message
/// log before the error list is cleared, so flaky-failure history stays
/// visible even when the test eventually passes. The case's final status
/// is whatever the last attempt produced.
#[tracing::instrument(skip_all, fields(test = %case.name))]
pub(crate) fn run_with_retry(
    case: &mut TestCase,
    runtime: &mut dyn TestRuntime,
    params: &RunParams,
    record: &mut RunRecord,
) -> AttemptOutcome {
    let mut outcome = lifecycle::run_once(case, runtime, params);

    while outcome == AttemptOutcome::Completed(TestStatus::Failed)
        && params.retries_enabled()
        && case.retries < params.max_retries
    {
        record.message(format!(
            "{} failed on attempt {}, retrying:",
            case.id,
            case.retries + 1
        ));
        for err in &case.errors {
            record.message(format!("  {}", err.render()));
        }
        tracing::debug!(test = %case.name, attempt = case.retries + 1, "re-running failed test");

        case.retries += 1;
        case.errors.clear();
        thread::sleep(params.retry_delay);
        outcome = lifecycle::run_once(case, runtime, params);
    }

    outcome
}
