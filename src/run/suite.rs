//! Suite orchestration: discovery, iteration, finalization

use std::fs;
use std::path::Path;

use crate::discovery;
use crate::error::Result;
use crate::report::Reporter;
use crate::run::params::RunParams;
use crate::run::record::{AttemptOutcome, RunRecord, TestCase, TestFailure, TestStatus};
use crate::run::retry;
use crate::run::runtime::TestRuntime;
use crate::EXIT_SUCCESS;

/// Aggregated result of one or more suite runs
#[derive(Debug)]
pub struct RunSummary {
    /// Counters and entries for the run
    pub record: RunRecord,
    /// Process exit code derived from the failure count
    pub exit_code: i32,
    /// Whether the run was cut short by a host exit
    pub aborted: bool,
}

impl RunSummary {
    /// An empty successful summary, used as the merge seed
    pub fn empty() -> Self {
        RunSummary {
            record: RunRecord::new(),
            exit_code: EXIT_SUCCESS,
            aborted: false,
        }
    }

    /// Merge another summary into this one
    pub fn absorb(&mut self, other: RunSummary) {
        self.record.absorb(other.record);
        if other.exit_code != EXIT_SUCCESS {
            self.exit_code = other.exit_code;
        }
        self.aborted |= other.aborted;
    }
}

/// Run every test discovered in one source script - main implementation
#[tracing::instrument(skip_all, fields(source = %script_path.display()))]
pub(crate) fn run_suite_impl(
    script_path: &Path,
    runtime: &mut dyn TestRuntime,
    params: &mut RunParams,
) -> Result<RunSummary> {
    let source = fs::read_to_string(script_path)?;
    let source_id = script_path.to_string_lossy().to_string();
    let marker_stem = script_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("test")
        .to_string();

    let mut record = RunRecord::new();
    let mut aborted = false;

    if params.coverage {
        if let Some(profiler) = params.profiler.as_mut() {
            profiler.start()?;
        }
    }

    // Top-level script code executes here. A load error becomes one
    // synthetic failure and the run still finalizes; procedures the host
    // never defined are dropped below.
    if let Err(errors) = runtime.load(&source) {
        let messages = errors.iter().map(TestFailure::render).collect();
        record.record_synthetic_failure(&format!("{} (load)", source_id), messages);
    }

    if let Some(setup) = &params.setup {
        setup(&mut *runtime)?;
    }

    let mut names = discovery::discover(&source)?;
    names.sort();
    if let Some(pattern) = &params.filter {
        names = discovery::filter_names(names, pattern);
    }

    for name in names {
        if !runtime.has_proc(&name) {
            tracing::debug!(test = %name, "discovered procedure is not defined by the host, dropping");
            continue;
        }

        let mut case = TestCase::new(&source_id, &name);
        record.executed += 1;

        match retry::run_with_retry(&mut case, runtime, params, &mut record) {
            AttemptOutcome::Completed(_) => {
                record.record_case(&case);
                let dumps = runtime.drain_logs();
                if case.status == TestStatus::Failed && !dumps.is_empty() {
                    Reporter::new(&params.out_dir).write_log_dumps(&case.name, &dumps)?;
                }
            }
            AttemptOutcome::HostExited(code) => {
                tracing::warn!(test = %name, code, "host exited during test, finalizing run");
                record.record_synthetic_failure(
                    &case.id,
                    vec![format!("caused the host to exit (code {})", code)],
                );
                aborted = true;
                break;
            }
        }
    }

    if params.coverage {
        if let Some(profiler) = params.profiler.as_mut() {
            profiler.stop()?;
        }
    }

    let exit_code = Reporter::new(&params.out_dir).finish(&source_id, &marker_stem, &record)?;
    Ok(RunSummary {
        record,
        exit_code,
        aborted,
    })
}
