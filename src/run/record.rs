//! Run state: test cases and the per-invocation record

/// Lifecycle status of a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    /// Discovered but not yet started
    Pending,
    /// Currently executing
    Running,
    /// Completed without recorded errors
    Passed,
    /// Completed with at least one recorded error
    Failed,
    /// Requested skip from the test body
    Skipped,
}

/// One recorded failure, tagged with an optional source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFailure {
    /// Human-readable failure message
    pub message: String,
    /// Where the failure originated (procedure name, file:line, ...)
    pub location: Option<String>,
}

impl TestFailure {
    /// Create a failure with no location information
    pub fn new(message: impl Into<String>) -> Self {
        TestFailure {
            message: message.into(),
            location: None,
        }
    }

    /// Create a failure tagged with a source location
    pub fn at(message: impl Into<String>, location: impl Into<String>) -> Self {
        TestFailure {
            message: message.into(),
            location: Some(location.into()),
        }
    }

    /// Render the failure as a single report line
    pub fn render(&self) -> String {
        match &self.location {
            Some(loc) => format!("{} ({})", self.message, loc),
            None => self.message.clone(),
        }
    }
}

/// One discovered test procedure and its run state
#[derive(Debug)]
pub struct TestCase {
    /// Procedure name, e.g. `Test_quit_all`
    pub name: String,
    /// Fully-qualified id: source path plus name
    pub id: String,
    /// Current lifecycle status
    pub status: TestStatus,
    /// Errors accumulated during the current attempt
    pub errors: Vec<TestFailure>,
    /// Number of extra attempts consumed by the retry controller
    pub retries: u32,
    /// Reason given by a skip outcome, if any
    pub skip_reason: Option<String>,
}

impl TestCase {
    /// Create a pending case for a procedure found in `source`
    pub fn new(source: &str, name: &str) -> Self {
        TestCase {
            name: name.to_string(),
            id: format!("{}:{}", source, name),
            status: TestStatus::Pending,
            errors: Vec::new(),
            retries: 0,
            skip_reason: None,
        }
    }

    /// Mark the case running and clear per-attempt state
    pub fn begin_attempt(&mut self) {
        self.status = TestStatus::Running;
        self.skip_reason = None;
    }

    /// Append a failure to the current attempt
    pub fn fail(&mut self, failure: TestFailure) {
        self.errors.push(failure);
    }

    /// Settle the terminal status for the current attempt.
    ///
    /// Precedence: an explicit skip wins over recorded errors, which win
    /// over a clean pass.
    pub fn settle(&mut self) -> TestStatus {
        self.status = if self.skip_reason.is_some() {
            TestStatus::Skipped
        } else if self.errors.is_empty() {
            TestStatus::Passed
        } else {
            TestStatus::Failed
        };
        self.status
    }
}

/// Outcome of one lifecycle attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The attempt ran to completion with a terminal status
    Completed(TestStatus),
    /// The host runtime terminated while the test was in flight
    HostExited(i32),
}

/// Failure detail for one test, as flushed to the failure log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEntry {
    /// Fully-qualified test id
    pub test_id: String,
    /// Rendered failure lines
    pub messages: Vec<String>,
}

/// Skip detail for one test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipEntry {
    /// Fully-qualified test id
    pub test_id: String,
    /// Reason given by the skip outcome
    pub reason: String,
}

/// Aggregated counters and entries for one harness invocation.
///
/// Owned by the orchestrator and threaded explicitly through the retry
/// controller and reporter; there is no ambient run state.
#[derive(Debug, Default)]
pub struct RunRecord {
    /// Number of tests attempted (pass, fail and skip alike)
    pub executed: usize,
    /// Number of tests with a terminal failed status
    pub failed: usize,
    /// Ordered failure entries
    pub failures: Vec<FailureEntry>,
    /// Ordered skip entries
    pub skipped: Vec<SkipEntry>,
    /// Ordered informational messages (retry history, load notes)
    pub messages: Vec<String>,
}

impl RunRecord {
    /// Create an empty record
    pub fn new() -> Self {
        RunRecord::default()
    }

    /// Append an informational message
    pub fn message(&mut self, line: impl Into<String>) {
        self.messages.push(line.into());
    }

    /// Record a settled case into the aggregate counters and entry lists
    pub fn record_case(&mut self, case: &TestCase) {
        match case.status {
            TestStatus::Failed => {
                self.failed += 1;
                self.failures.push(FailureEntry {
                    test_id: case.id.clone(),
                    messages: case.errors.iter().map(TestFailure::render).collect(),
                });
            }
            TestStatus::Skipped => {
                let reason = case.skip_reason.clone().unwrap_or_default();
                self.skipped.push(SkipEntry {
                    test_id: case.id.clone(),
                    reason,
                });
                // Teardown errors after a skip still surface in the message
                // log, never in the failure log.
                for err in &case.errors {
                    self.messages.push(format!("{}: {}", case.id, err.render()));
                }
            }
            _ => {}
        }
    }

    /// Record a failure that has no completed case behind it, such as a
    /// script load error or a host exit
    pub fn record_synthetic_failure(&mut self, test_id: &str, messages: Vec<String>) {
        self.failed += 1;
        self.failures.push(FailureEntry {
            test_id: test_id.to_string(),
            messages,
        });
    }

    /// Merge another record into this one, preserving order
    pub fn absorb(&mut self, other: RunRecord) {
        self.executed += other.executed;
        self.failed += other.failed;
        self.failures.extend(other.failures);
        self.skipped.extend(other.skipped);
        self.messages.extend(other.messages);
    }
}
