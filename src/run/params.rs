//! Configuration parameters for a harness run

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::run::runtime::TestRuntime;

/// Type alias for the suite-level setup function, run once after the test
/// source is loaded
pub type SetupFn = Box<dyn Fn(&mut dyn TestRuntime) -> Result<()>>;

/// Optional coverage/profiling side-channel, started and stopped around a
/// run when the `COVERAGE` toggle is set
pub trait Profiler {
    /// Begin collection
    fn start(&mut self) -> Result<()>;
    /// Stop collection and persist whatever was gathered
    fn stop(&mut self) -> Result<()>;
}

/// Configuration for running a test suite
pub struct RunParams {
    /// Keep only test names matching this pattern
    pub filter: Option<String>,
    /// Per-test deadline
    pub timeout: Duration,
    /// Grace window between cooperative cancellation and process abort
    pub timeout_grace: Duration,
    /// Extra attempts granted to a failing test
    pub max_retries: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
    /// Unconditionally disable retries (`TEST_NO_RETRY`)
    pub no_retry: bool,
    /// Whether the coverage side-channel was requested (`COVERAGE`)
    pub coverage: bool,
    /// Suite-level setup hook
    pub setup: Option<SetupFn>,
    /// Coverage/profiling side-channel
    pub profiler: Option<Box<dyn Profiler>>,
    /// Directory receiving report artifacts
    pub out_dir: PathBuf,
}

impl RunParams {
    /// Create params with default settings, resolving environment toggles
    /// once
    pub fn new() -> Self {
        let no_retry = retry_disabled(std::env::var("TEST_NO_RETRY").ok().as_deref());
        let coverage = std::env::var_os("COVERAGE").is_some();

        RunParams {
            filter: None,
            timeout: Duration::from_secs(60),
            timeout_grace: Duration::from_secs(5),
            max_retries: 10,
            retry_delay: Duration::from_secs(2),
            no_retry,
            coverage,
            setup: None,
            profiler: None,
            out_dir: PathBuf::from("."),
        }
    }

    /// Keep only test names matching `pattern` (regex, or substring when
    /// the pattern is not a valid regex)
    pub fn filter(mut self, pattern: &str) -> Self {
        self.filter = Some(pattern.to_string());
        self
    }

    /// Set the per-test deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the grace window before the timeout abort
    pub fn timeout_grace(mut self, grace: Duration) -> Self {
        self.timeout_grace = grace;
        self
    }

    /// Set the number of extra attempts for failing tests
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the pause between attempts
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Disable or re-enable retries regardless of the environment toggle
    pub fn no_retry(mut self, value: bool) -> Self {
        self.no_retry = value;
        self
    }

    /// Set a setup function to run once after the source is loaded
    pub fn setup<F>(mut self, func: F) -> Self
    where
        F: Fn(&mut dyn TestRuntime) -> Result<()> + 'static,
    {
        self.setup = Some(Box::new(func));
        self
    }

    /// Attach a coverage/profiling side-channel
    pub fn profiler(mut self, profiler: Box<dyn Profiler>) -> Self {
        self.profiler = Some(profiler);
        self
    }

    /// Set the directory receiving report artifacts
    pub fn out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    /// Whether a failing test may be re-attempted at all
    pub fn retries_enabled(&self) -> bool {
        !self.no_retry && self.max_retries > 0
    }
}

impl Default for RunParams {
    fn default() -> Self {
        Self::new()
    }
}

/// `TEST_NO_RETRY` semantics: unset, empty or `"0"` keeps retries enabled;
/// anything else disables them
fn retry_disabled(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(v) => !(v.is_empty() || v == "0"),
    }
}
