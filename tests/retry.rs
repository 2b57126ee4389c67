//! Retry controller behavior

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use testrun_rs::{
    harness, ScriptHost, TestFailure, TestOutcome, EXIT_FAILURE, EXIT_SUCCESS, FAILURE_LOG,
    MESSAGE_LOG,
};

fn one_test_script(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("test_retry.vim");
    fs::write(&path, "func Test_flaky()\nendfunc\n").unwrap();
    path
}

#[test]
fn test_flaky_test_passes_on_second_attempt() {
    let dir = TempDir::new().unwrap();
    let script = one_test_script(&dir);

    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);

    let mut host = ScriptHost::new().register("Test_flaky", move |_state, _cancel| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            TestOutcome::Failed(vec![TestFailure::new("timing glitch")])
        } else {
            TestOutcome::Passed
        }
    });

    let summary = harness::run(&script)
        .out_dir(dir.path())
        .retry_delay(Duration::from_millis(1))
        .execute(&mut host)
        .unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(summary.exit_code, EXIT_SUCCESS);
    assert_eq!(summary.record.failed, 0);
    assert!(summary.record.failures.is_empty());
    assert!(dir.path().join("test_retry.ok").exists());

    // The attempt-1 failure is preserved in the message log even though
    // the test ended up passing.
    let messages = fs::read_to_string(dir.path().join(MESSAGE_LOG)).unwrap();
    assert!(messages.contains("failed on attempt 1"));
    assert!(messages.contains("timing glitch"));
    assert!(!dir.path().join(FAILURE_LOG).exists());
}

#[test]
fn test_retries_stop_at_bound() {
    let dir = TempDir::new().unwrap();
    let script = one_test_script(&dir);

    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);

    let mut host = ScriptHost::new().register("Test_flaky", move |_state, _cancel| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        TestOutcome::Failed(vec![TestFailure::new(format!("boom #{}", n))])
    });

    let summary = harness::run(&script)
        .out_dir(dir.path())
        .max_retries(3)
        .retry_delay(Duration::from_millis(1))
        .execute(&mut host)
        .unwrap();

    // One initial attempt plus exactly max_retries extra ones.
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    assert_eq!(summary.exit_code, EXIT_FAILURE);
    assert_eq!(summary.record.failed, 1);
}

#[test]
fn test_final_failure_carries_only_last_attempt_errors() {
    let dir = TempDir::new().unwrap();
    let script = one_test_script(&dir);

    let counter = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&counter);

    let mut host = ScriptHost::new().register("Test_flaky", move |_state, _cancel| {
        let n = c.fetch_add(1, Ordering::SeqCst) + 1;
        TestOutcome::Failed(vec![TestFailure::new(format!("boom #{}", n))])
    });

    let summary = harness::run(&script)
        .out_dir(dir.path())
        .max_retries(2)
        .retry_delay(Duration::from_millis(1))
        .execute(&mut host)
        .unwrap();

    let entry = &summary.record.failures[0];
    assert_eq!(entry.messages, vec!["boom #3".to_string()]);

    // Earlier attempts live in the message log instead.
    let messages = fs::read_to_string(dir.path().join(MESSAGE_LOG)).unwrap();
    assert!(messages.contains("boom #1"));
    assert!(messages.contains("boom #2"));
}

#[test]
fn test_no_retry_attempts_exactly_once() {
    let dir = TempDir::new().unwrap();
    let script = one_test_script(&dir);

    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);

    let mut host = ScriptHost::new().register("Test_flaky", move |_state, _cancel| {
        counter.fetch_add(1, Ordering::SeqCst);
        TestOutcome::Failed(vec![TestFailure::new("always fails")])
    });

    harness::run(&script)
        .out_dir(dir.path())
        .no_retry(true)
        .execute(&mut host)
        .unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_zero_max_retries_disables_retrying() {
    let dir = TempDir::new().unwrap();
    let script = one_test_script(&dir);

    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);

    let mut host = ScriptHost::new().register("Test_flaky", move |_state, _cancel| {
        counter.fetch_add(1, Ordering::SeqCst);
        TestOutcome::Failed(vec![TestFailure::new("always fails")])
    });

    harness::run(&script)
        .out_dir(dir.path())
        .max_retries(0)
        .execute(&mut host)
        .unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_skip_is_not_retried() {
    let dir = TempDir::new().unwrap();
    let script = one_test_script(&dir);

    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);

    let mut host = ScriptHost::new().register("Test_flaky", move |_state, _cancel| {
        counter.fetch_add(1, Ordering::SeqCst);
        TestOutcome::Skipped("no terminal feature".to_string())
    });

    let summary = harness::run(&script)
        .out_dir(dir.path())
        .retry_delay(Duration::from_millis(1))
        .execute(&mut host)
        .unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(summary.record.skipped.len(), 1);
}
