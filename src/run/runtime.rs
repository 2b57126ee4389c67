//! The pluggable test runtime seam
//!
//! The engine never manipulates editor or host state directly; everything
//! environment-specific goes through [`TestRuntime`]. The crate ships one
//! in-process implementation ([`crate::run::host::ScriptHost`]) and external
//! hosts implement the trait themselves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::run::record::TestFailure;

/// Recognized message prefix for skip signaling, matched case-insensitively
pub const SKIP_MARKER: &str = "skipped";

/// Tagged result of invoking a test body or hook.
///
/// Skip signaling is an explicit variant rather than an error-message
/// convention; runtimes that only see raised messages can map them with
/// [`skip_reason`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    /// The procedure completed without raising
    Passed,
    /// The procedure raised; each entry is one recorded error
    Failed(Vec<TestFailure>),
    /// The procedure requested a skip, with a reason
    Skipped(String),
    /// The host process terminated while the procedure was running
    HostExited(i32),
}

/// Cooperative cancellation flag shared with the in-flight procedure.
///
/// The timeout guard sets it on deadline; cancellation-aware runtimes poll
/// it and bail out of the test body.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the not-cancelled state
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One captured diagnostic log source, dumped to disk when a test fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDump {
    /// Short name of the log source, e.g. `channel`
    pub source: String,
    /// Captured log content
    pub content: String,
}

/// Capability object for the host environment that executes test code.
///
/// Isolation and diagnostic methods have no-op defaults so minimal runtimes
/// only implement loading and invocation.
pub trait TestRuntime {
    /// Evaluate the test source once. Top-level code executes immediately;
    /// errors are returned for the engine to record as one synthetic
    /// failure.
    fn load(&mut self, source: &str) -> Result<(), Vec<TestFailure>>;

    /// Whether a callable procedure with this exact name is defined
    fn has_proc(&self, name: &str) -> bool;

    /// Invoke a named procedure (test body or hook)
    fn invoke(&mut self, name: &str, cancel: &CancelToken) -> TestOutcome;

    /// Whether [`TestRuntime::invoke`] honors the cancel token. Runtimes
    /// that cannot cancel get the crash-style timeout fallback.
    fn supports_cancellation(&self) -> bool {
        false
    }

    /// Reset ambient interactive state to the known baseline
    fn reset_isolation(&mut self) -> Result<(), TestFailure> {
        Ok(())
    }

    /// Close one round of extra viewports/tabs. Returns `true` while
    /// progress is being made; the engine bounds the loop.
    fn close_extra_windows(&mut self) -> bool {
        false
    }

    /// Forced terminal cleanup step: wipe transient buffers
    fn wipe_buffers(&mut self) -> Result<(), TestFailure> {
        Ok(())
    }

    /// Diagnostic output left unconsumed by the last invocation, if any.
    /// Draining resets the buffer.
    fn pending_output(&mut self) -> Option<String> {
        None
    }

    /// Drain captured per-source log dumps accumulated since the last call
    fn drain_logs(&mut self) -> Vec<LogDump> {
        Vec::new()
    }
}

/// Extract a skip reason from a raised message.
///
/// A message whose first word is `skipped` (any case), optionally followed
/// by a colon, signals "treat as skipped"; the remainder is the reason.
pub fn skip_reason(message: &str) -> Option<String> {
    let trimmed = message.trim_start();
    if trimmed.len() < SKIP_MARKER.len() {
        return None;
    }
    let (head, rest) = trimmed.split_at(SKIP_MARKER.len());
    if !head.eq_ignore_ascii_case(SKIP_MARKER) {
        return None;
    }
    let reason = rest.trim_start().trim_start_matches(':').trim();
    Some(reason.to_string())
}
