//! Test execution module

pub mod host;
pub mod lifecycle;
pub mod params;
pub mod record;
pub mod retry;
pub mod runtime;
pub mod suite;
pub mod timeout;

// Re-export public types
pub use host::{HostState, ProcFn, ScriptHost};
pub use params::{Profiler, RunParams, SetupFn};
pub use record::{
    AttemptOutcome, FailureEntry, RunRecord, SkipEntry, TestCase, TestFailure, TestStatus,
};
pub use runtime::{skip_reason, CancelToken, LogDump, TestOutcome, TestRuntime, SKIP_MARKER};
pub use suite::RunSummary;
pub use timeout::TimeoutGuard;

use crate::error::Result;
use std::path::Path;

/// Run a single test script with default parameters
pub fn run_suite(script_path: &Path, runtime: &mut dyn TestRuntime) -> Result<RunSummary> {
    let mut params = RunParams::new();
    suite::run_suite_impl(script_path, runtime, &mut params)
}

/// Run a single test script with the given parameters
pub fn run_suite_with(
    script_path: &Path,
    runtime: &mut dyn TestRuntime,
    params: &mut RunParams,
) -> Result<RunSummary> {
    suite::run_suite_impl(script_path, runtime, params)
}
