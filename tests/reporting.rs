//! Report artifacts: logs, markers, dumps and the profiler side-channel

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use testrun_rs::{
    harness, run_suite_with, Profiler, Result, RunParams, ScriptHost, TestFailure, TestOutcome,
    EXIT_SUCCESS, FAILURE_LOG, MESSAGE_LOG,
};

fn write_script(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_failure_log_has_id_and_location() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "test_report.vim", "func Test_x()\nendfunc\n");

    let mut host = ScriptHost::new().register("Test_x", |_state, _cancel| {
        TestOutcome::Failed(vec![TestFailure::at(
            "E684: list index out of range",
            "test_report.vim:12",
        )])
    });

    harness::run(&script)
        .out_dir(dir.path())
        .no_retry(true)
        .execute(&mut host)
        .unwrap();

    let log = fs::read_to_string(dir.path().join(FAILURE_LOG)).unwrap();
    assert!(log.contains("Test_x"));
    assert!(log.contains("E684: list index out of range"));
    assert!(log.contains("test_report.vim:12"));
}

#[test]
fn test_skipped_test_never_reaches_failure_log() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "test_skiplog.vim", "func Test_s()\nendfunc\n");

    let mut host = ScriptHost::new().register("Test_s", |_state, _cancel| {
        TestOutcome::Skipped("needs X11".to_string())
    });

    harness::run(&script)
        .out_dir(dir.path())
        .execute(&mut host)
        .unwrap();

    assert!(!dir.path().join(FAILURE_LOG).exists());
    let messages = fs::read_to_string(dir.path().join(MESSAGE_LOG)).unwrap();
    assert!(messages.contains("Skipped:"));
}

#[test]
fn test_log_dumps_written_only_for_failures() {
    let dir = TempDir::new().unwrap();
    let script = write_script(
        &dir,
        "test_dumps.vim",
        "func Test_bad()\nendfunc\nfunc Test_good()\nendfunc\n",
    );

    let mut host = ScriptHost::new()
        .register("Test_bad", |state, _cancel| {
            state.log("channel", "ch 3: connection refused\n");
            TestOutcome::Failed(vec![TestFailure::new("no connection")])
        })
        .register("Test_good", |state, _cancel| {
            state.log("channel", "ch 4: ok\n");
            TestOutcome::Passed
        });

    harness::run(&script)
        .out_dir(dir.path())
        .no_retry(true)
        .execute(&mut host)
        .unwrap();

    let bad_dump = dir.path().join("Test_bad_channel.testlog");
    assert!(bad_dump.exists());
    assert_eq!(
        fs::read_to_string(bad_dump).unwrap(),
        "ch 3: connection refused\n"
    );
    assert!(!dir.path().join("Test_good_channel.testlog").exists());
}

struct FlagProfiler {
    started: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl Profiler for FlagProfiler {
    fn start(&mut self) -> Result<()> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_profiler_runs_around_the_suite_when_coverage_is_on() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "test_cov.vim", "func Test_a()\nendfunc\n");

    let started = Arc::new(AtomicBool::new(false));
    let stopped = Arc::new(AtomicBool::new(false));

    let mut params = RunParams::new()
        .out_dir(dir.path())
        .profiler(Box::new(FlagProfiler {
            started: Arc::clone(&started),
            stopped: Arc::clone(&stopped),
        }));
    params.coverage = true;

    let mut host = ScriptHost::new().register("Test_a", |_state, _cancel| TestOutcome::Passed);

    let summary = run_suite_with(&script, &mut host, &mut params).unwrap();
    assert_eq!(summary.exit_code, EXIT_SUCCESS);
    assert!(started.load(Ordering::SeqCst));
    assert!(stopped.load(Ordering::SeqCst));
}

#[test]
fn test_profiler_idle_without_coverage_toggle() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "test_nocov.vim", "func Test_a()\nendfunc\n");

    let started = Arc::new(AtomicBool::new(false));
    let stopped = Arc::new(AtomicBool::new(false));

    let mut params = RunParams::new()
        .out_dir(dir.path())
        .profiler(Box::new(FlagProfiler {
            started: Arc::clone(&started),
            stopped: Arc::clone(&stopped),
        }));
    params.coverage = false;

    let mut host = ScriptHost::new().register("Test_a", |_state, _cancel| TestOutcome::Passed);

    run_suite_with(&script, &mut host, &mut params).unwrap();
    assert!(!started.load(Ordering::SeqCst));
    assert!(!stopped.load(Ordering::SeqCst));
}

#[test]
fn test_suite_setup_runs_once_after_load() {
    let dir = TempDir::new().unwrap();
    let script = write_script(
        &dir,
        "test_setup.vim",
        "func Test_a()\nendfunc\nfunc Test_b()\nendfunc\n",
    );

    let calls = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&calls);

    let mut host = ScriptHost::new()
        .register("Test_a", |_state, _cancel| TestOutcome::Passed)
        .register("Test_b", |_state, _cancel| TestOutcome::Passed);

    let summary = harness::run(&script)
        .out_dir(dir.path())
        .setup(move |_runtime| {
            assert!(!flag.swap(true, Ordering::SeqCst), "setup ran twice");
            Ok(())
        })
        .execute(&mut host)
        .unwrap();

    assert!(calls.load(Ordering::SeqCst));
    assert_eq!(summary.record.executed, 2);
}
