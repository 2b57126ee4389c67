//! Single-attempt test lifecycle

use std::env;
use std::path::PathBuf;

use crate::discovery::TEST_PREFIX;
use crate::run::params::RunParams;
use crate::run::record::{AttemptOutcome, TestCase, TestFailure};
use crate::run::runtime::{CancelToken, TestOutcome, TestRuntime};
use crate::run::timeout::TimeoutGuard;

/// Global setup hook name, invoked before every test body
const GLOBAL_SETUP: &str = "SetUp";
/// Global teardown hook name, invoked after every test body
const GLOBAL_TEARDOWN: &str = "TearDown";

/// Bound on window-closing rounds. A host that keeps reporting progress
/// cannot hold up the run past this; the buffer wipe runs either way.
const MAX_CLEANUP_ROUNDS: usize = 32;

fn hook_suffix(test_name: &str) -> &str {
    test_name.strip_prefix(TEST_PREFIX).unwrap_or(test_name)
}

/// Test-specific setup hook name: `Test_foo` -> `SetUp_foo`
pub(crate) fn setup_hook_name(test_name: &str) -> String {
    format!("{}_{}", GLOBAL_SETUP, hook_suffix(test_name))
}

/// Test-specific teardown hook name: `Test_foo` -> `TearDown_foo`
pub(crate) fn teardown_hook_name(test_name: &str) -> String {
    format!("{}_{}", GLOBAL_TEARDOWN, hook_suffix(test_name))
}

/// Invoke a hook if the host defines it, fault-isolated: failures land in
/// the case's error list and later steps still run. A skip raised by a
/// hook is ignored; only the body can skip. Returns the exit code if the
/// host died under the hook.
fn run_hook(case: &mut TestCase, runtime: &mut dyn TestRuntime, hook: &str) -> Option<i32> {
    if !runtime.has_proc(hook) {
        return None;
    }
    let cancel = CancelToken::new();
    match runtime.invoke(hook, &cancel) {
        TestOutcome::Passed | TestOutcome::Skipped(_) => None,
        TestOutcome::Failed(errors) => {
            for mut err in errors {
                if err.location.is_none() {
                    err.location = Some(hook.to_string());
                }
                case.fail(err);
            }
            None
        }
        TestOutcome::HostExited(code) => Some(code),
    }
}

fn restore_dir(saved: Option<PathBuf>, case: &mut TestCase) {
    if let Some(dir) = saved {
        if let Err(err) = env::set_current_dir(&dir) {
            case.fail(TestFailure::new(format!(
                "cannot restore working directory {}: {}",
                dir.display(),
                err
            )));
        }
    }
}

/// Execute one full lifecycle attempt for `case`.
///
/// Every step is independently fault-isolated: an error in one step is
/// recorded and does not prevent later cleanup steps from running. Only a
/// host exit cuts the sequence short — there is nothing left to clean.
#[tracing::instrument(skip_all, fields(test = %case.name, attempt = case.retries + 1))]
pub(crate) fn run_once(
    case: &mut TestCase,
    runtime: &mut dyn TestRuntime,
    params: &RunParams,
) -> AttemptOutcome {
    case.begin_attempt();
    let saved_dir = env::current_dir().ok();

    if let Err(err) = runtime.reset_isolation() {
        case.fail(err);
    }

    let specific_setup = setup_hook_name(&case.name);
    if let Some(code) = run_hook(case, runtime, &specific_setup) {
        restore_dir(saved_dir, case);
        return AttemptOutcome::HostExited(code);
    }
    if let Some(code) = run_hook(case, runtime, GLOBAL_SETUP) {
        restore_dir(saved_dir, case);
        return AttemptOutcome::HostExited(code);
    }

    let cancel = CancelToken::new();
    let guard = TimeoutGuard::arm(
        params.timeout,
        cancel.clone(),
        runtime.supports_cancellation(),
        params.timeout_grace,
    );
    let body_name = case.name.clone();
    let outcome = runtime.invoke(&body_name, &cancel);
    guard.disarm();

    match outcome {
        TestOutcome::Passed => {}
        TestOutcome::Failed(errors) => {
            for mut err in errors {
                if err.location.is_none() {
                    err.location = Some(body_name.clone());
                }
                case.fail(err);
            }
        }
        TestOutcome::Skipped(reason) => {
            // A skip discards whatever the hooks recorded.
            case.errors.clear();
            case.skip_reason = Some(reason);
        }
        TestOutcome::HostExited(code) => {
            restore_dir(saved_dir, case);
            return AttemptOutcome::HostExited(code);
        }
    }

    if cancel.is_cancelled() && case.skip_reason.is_none() {
        case.fail(TestFailure::at(
            format!("test did not complete within {:?}", params.timeout),
            body_name.clone(),
        ));
    }

    // Output hygiene: a completed body must leave no diagnostic output
    // behind unless it cleared it. A skip drains silently so nothing
    // leaks into the next test.
    match runtime.pending_output() {
        Some(output) if case.skip_reason.is_none() => {
            case.fail(TestFailure::at(
                format!("unconsumed diagnostic output: {}", output.trim_end()),
                body_name.clone(),
            ));
        }
        _ => {}
    }

    if let Some(code) = run_hook(case, runtime, GLOBAL_TEARDOWN) {
        restore_dir(saved_dir, case);
        return AttemptOutcome::HostExited(code);
    }
    let specific_teardown = teardown_hook_name(&case.name);
    if let Some(code) = run_hook(case, runtime, &specific_teardown) {
        restore_dir(saved_dir, case);
        return AttemptOutcome::HostExited(code);
    }

    let mut rounds = 0;
    while runtime.close_extra_windows() {
        rounds += 1;
        if rounds >= MAX_CLEANUP_ROUNDS {
            tracing::warn!(test = %case.name, "window cleanup did not converge, forcing buffer wipe");
            break;
        }
    }
    if let Err(err) = runtime.wipe_buffers() {
        case.fail(err);
    }

    restore_dir(saved_dir, case);
    AttemptOutcome::Completed(case.settle())
}
