//! # testrun-rs
//!
//! A Rust crate for running scripted test procedures: discovery by naming
//! convention, per-test lifecycle management (isolation, setup/teardown
//! hooks, timeout, retry, cleanup), and durable flat-file reporting.
//!
//! The host that executes the test code is pluggable behind the
//! [`TestRuntime`] trait; [`ScriptHost`] is the in-process implementation
//! backed by registered Rust closures.

pub mod discovery;
pub mod error;
pub mod report;
pub mod run;

pub use discovery::{discover, TEST_PREFIX};
pub use error::{Error, Result};
pub use report::{Reporter, FAILURE_LOG, MESSAGE_LOG};
pub use run::{
    skip_reason, CancelToken, HostState, LogDump, Profiler, RunParams, RunRecord, RunSummary,
    ScriptHost, TestCase, TestFailure, TestOutcome, TestRuntime, TestStatus,
};

// Re-export for advanced users who need direct access
pub use run::{run_suite, run_suite_with};

/// Process exit code when every test passed
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code when at least one test failed
pub const EXIT_FAILURE: i32 = 1;

/// Process exit code used by the timeout abort path
pub const EXIT_TIMEOUT: i32 = 124;

// Internal function used by the Builder - not part of public API
fn run_all(
    source: &std::path::Path,
    runtime: &mut dyn TestRuntime,
    params: &mut RunParams,
) -> Result<RunSummary> {
    use walkdir::WalkDir;

    if source.is_file() {
        return run::suite::run_suite_impl(source, runtime, params);
    }

    // Directory mode: every regular file named test_* directly under the
    // directory, sorted, run sequentially against the same runtime.
    let mut scripts = Vec::new();
    for entry in WalkDir::new(source).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(file_name) = entry.file_name().to_str() {
            if file_name.starts_with("test_") {
                scripts.push(entry.path().to_path_buf());
            }
        }
    }
    scripts.sort();

    if scripts.is_empty() {
        return Err(Error::Generic(format!(
            "No test scripts found under: {}",
            source.display()
        )));
    }

    let mut summary = RunSummary::empty();
    for script in scripts {
        let one = run::suite::run_suite_impl(&script, runtime, params)?;
        summary.absorb(one);
        if summary.aborted {
            break;
        }
    }
    Ok(summary)
}

/// Builder for configuring and running a test harness invocation
///
/// # Examples
///
/// ```no_run
/// use testrun_rs::{harness, ScriptHost, TestOutcome};
///
/// let mut host = ScriptHost::new()
///     .register("Test_ok", |_state, _cancel| TestOutcome::Passed);
///
/// let summary = harness::run("testdata/test_basic.vim")
///     .filter("ok")
///     .max_retries(3)
///     .execute(&mut host)
///     .unwrap();
/// std::process::exit(summary.exit_code);
/// ```
pub struct Builder {
    source: std::path::PathBuf,
    params: RunParams,
}

impl Builder {
    /// Create a new builder for the given test script or directory
    fn new(source: impl Into<std::path::PathBuf>) -> Self {
        Self {
            source: source.into(),
            params: RunParams::new(),
        }
    }

    /// Keep only test names matching the pattern (regex, or substring when
    /// the pattern is not a valid regex)
    pub fn filter(mut self, pattern: &str) -> Self {
        self.params = self.params.filter(pattern);
        self
    }

    /// Set the per-test deadline
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.params = self.params.timeout(timeout);
        self
    }

    /// Set the grace window between cooperative cancellation and the
    /// process abort
    pub fn timeout_grace(mut self, grace: std::time::Duration) -> Self {
        self.params = self.params.timeout_grace(grace);
        self
    }

    /// Set the number of extra attempts granted to a failing test
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.params = self.params.max_retries(retries);
        self
    }

    /// Set the pause between attempts
    pub fn retry_delay(mut self, delay: std::time::Duration) -> Self {
        self.params = self.params.retry_delay(delay);
        self
    }

    /// Disable or re-enable retries regardless of `TEST_NO_RETRY`
    pub fn no_retry(mut self, value: bool) -> Self {
        self.params = self.params.no_retry(value);
        self
    }

    /// Add a setup function that runs once after the source is loaded
    pub fn setup<F>(mut self, func: F) -> Self
    where
        F: Fn(&mut dyn TestRuntime) -> Result<()> + 'static,
    {
        self.params = self.params.setup(func);
        self
    }

    /// Attach a coverage/profiling side-channel, started when `COVERAGE`
    /// is set
    pub fn profiler(mut self, profiler: Box<dyn Profiler>) -> Self {
        self.params = self.params.profiler(profiler);
        self
    }

    /// Set the directory receiving report artifacts
    pub fn out_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.params = self.params.out_dir(dir);
        self
    }

    /// Execute the configured run against the given runtime
    ///
    /// # Returns
    /// The aggregated [`RunSummary`]; inspect `exit_code` for the process
    /// status expected by external tooling.
    pub fn execute(mut self, runtime: &mut dyn TestRuntime) -> Result<RunSummary> {
        run_all(&self.source, runtime, &mut self.params)
    }
}

/// Create a new harness builder for the given script or directory
///
/// This is the main entry point for running tests.
///
/// # Examples
///
/// ```no_run
/// use testrun_rs::{harness, ScriptHost};
///
/// let mut host = ScriptHost::new();
/// harness::run("testdata/test_basic.vim").execute(&mut host).unwrap();
/// ```
pub mod harness {
    use super::*;

    /// Create a new harness builder for the given script or directory
    pub fn run(source: impl Into<std::path::PathBuf>) -> Builder {
        Builder::new(source)
    }
}
