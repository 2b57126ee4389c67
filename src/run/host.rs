//! In-process test runtime backed by registered closures
//!
//! [`ScriptHost`] is the runtime used by embedders who drive the harness
//! from Rust (and by this crate's own tests): test procedures are named
//! closures over a mutable [`HostState`], registered up front the way
//! custom commands are registered on a builder.

use std::collections::HashMap;

use crate::run::record::TestFailure;
use crate::run::runtime::{CancelToken, LogDump, TestOutcome, TestRuntime};

/// Type alias for a registered procedure
pub type ProcFn = Box<dyn FnMut(&mut HostState, &CancelToken) -> TestOutcome>;

/// Type alias for the optional load hook, run when the source is evaluated
pub type LoadFn = Box<dyn FnMut(&mut HostState, &str) -> Result<(), Vec<TestFailure>>>;

/// Mutable ambient state shared by all procedures of a [`ScriptHost`]
#[derive(Debug, Default)]
pub struct HostState {
    /// Diagnostic output emitted but not yet consumed
    pub pending_output: String,
    /// Count of extra viewports/tabs beyond the baseline
    pub open_windows: usize,
    /// Transient buffer names
    pub buffers: Vec<String>,
    /// Captured log dumps, drained by the engine after each test
    pub logs: Vec<LogDump>,
}

impl HostState {
    /// Emit diagnostic output; a test that does not consume it fails the
    /// output hygiene check
    pub fn emit(&mut self, text: &str) {
        self.pending_output.push_str(text);
    }

    /// Consume any pending diagnostic output
    pub fn clear_output(&mut self) {
        self.pending_output.clear();
    }

    /// Capture a log dump for the current test
    pub fn log(&mut self, source: impl Into<String>, content: impl Into<String>) {
        self.logs.push(LogDump {
            source: source.into(),
            content: content.into(),
        });
    }
}

/// A [`TestRuntime`] built from registered named closures
pub struct ScriptHost {
    procs: HashMap<String, ProcFn>,
    state: HostState,
    load_hook: Option<LoadFn>,
    cancellable: bool,
}

impl ScriptHost {
    /// Create an empty host that honors cancellation
    pub fn new() -> Self {
        ScriptHost {
            procs: HashMap::new(),
            state: HostState::default(),
            load_hook: None,
            cancellable: true,
        }
    }

    /// Register a procedure under the given name
    pub fn register<F>(mut self, name: &str, func: F) -> Self
    where
        F: FnMut(&mut HostState, &CancelToken) -> TestOutcome + 'static,
    {
        self.procs.insert(name.to_string(), Box::new(func));
        self
    }

    /// Set a hook invoked when the test source is loaded
    pub fn on_load<F>(mut self, func: F) -> Self
    where
        F: FnMut(&mut HostState, &str) -> Result<(), Vec<TestFailure>> + 'static,
    {
        self.load_hook = Some(Box::new(func));
        self
    }

    /// Declare whether procedures honor the cancel token
    pub fn cancellable(mut self, value: bool) -> Self {
        self.cancellable = value;
        self
    }

    /// Inspect the ambient state
    pub fn state(&self) -> &HostState {
        &self.state
    }

    /// Mutate the ambient state, e.g. to seed windows or buffers
    pub fn state_mut(&mut self) -> &mut HostState {
        &mut self.state
    }
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRuntime for ScriptHost {
    fn load(&mut self, source: &str) -> Result<(), Vec<TestFailure>> {
        match self.load_hook.as_mut() {
            Some(hook) => hook(&mut self.state, source),
            None => Ok(()),
        }
    }

    fn has_proc(&self, name: &str) -> bool {
        self.procs.contains_key(name)
    }

    fn invoke(&mut self, name: &str, cancel: &CancelToken) -> TestOutcome {
        match self.procs.get_mut(name) {
            Some(func) => func(&mut self.state, cancel),
            None => TestOutcome::Failed(vec![TestFailure::at(
                format!("procedure '{}' is not defined", name),
                name,
            )]),
        }
    }

    fn supports_cancellation(&self) -> bool {
        self.cancellable
    }

    fn reset_isolation(&mut self) -> Result<(), TestFailure> {
        self.state.pending_output.clear();
        Ok(())
    }

    fn close_extra_windows(&mut self) -> bool {
        if self.state.open_windows > 0 {
            self.state.open_windows -= 1;
            true
        } else {
            false
        }
    }

    fn wipe_buffers(&mut self) -> Result<(), TestFailure> {
        self.state.buffers.clear();
        Ok(())
    }

    fn pending_output(&mut self) -> Option<String> {
        if self.state.pending_output.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.state.pending_output))
        }
    }

    fn drain_logs(&mut self) -> Vec<LogDump> {
        std::mem::take(&mut self.state.logs)
    }
}
