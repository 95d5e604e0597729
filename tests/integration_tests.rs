//! End-to-end runs of the broker with a local worker pool.
//!
//! These tests exercise the full pipeline: load a source file, lease tasks
//! to workers, run the checks, and drain.

use std::io::Write;
use std::time::{Duration, Instant};

use gimps_lite::config::RunnerConfig;
use gimps_lite::runner::Runner;
use gimps_lite::worker::{CheckReport, CheckRequest, MersenneExecutor, Verdict};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

fn source_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

/// Test 1: a small backlog runs to drained and every task gets a report
#[tokio::test]
async fn test_run_drains_backlog_and_records_results() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let results_path = dir.path().join("results.jsonl");
    let source = source_file("2\n3\n5\n7\n11\n13\n");

    let config = RunnerConfig::default()
        .with_workers(2)
        .with_poll_interval(Duration::from_millis(10))
        .with_sweep_interval(Duration::from_millis(50))
        .with_results_path(results_path.clone());
    let runner = Runner::new(config).expect("runner should build");

    let loaded = runner
        .load_tasks(source.path())
        .await
        .expect("source should load");
    assert_eq!(loaded, 6);

    let status = tokio::time::timeout(
        Duration::from_secs(10),
        runner.run(CancellationToken::new()),
    )
    .await
    .expect("run should drain within 10 seconds");

    assert_eq!(status.completed, 6, "All tasks should complete");
    assert_eq!(status.ready, 0);
    assert_eq!(status.leased, 0);

    let contents = std::fs::read_to_string(&results_path).expect("results file should exist");
    let reports: Vec<CheckReport> = contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be one report"))
        .collect();
    assert_eq!(reports.len(), 6, "Exactly one report per task");

    let mut prime_exponents: Vec<u64> = reports
        .iter()
        .filter(|r| r.verdict == Verdict::MersennePrime)
        .map(|r| r.exponent)
        .collect();
    prime_exponents.sort_unstable();
    assert_eq!(prime_exponents, vec![2, 3, 5, 7, 13]);

    let composites: Vec<u64> = reports
        .iter()
        .filter(|r| r.verdict == Verdict::Composite)
        .map(|r| r.exponent)
        .collect();
    assert_eq!(composites, vec![11]);
}

/// Test 2: an already-cancelled shutdown token stops the run promptly
/// without losing tasks
#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let source = source_file("3\n5\n7\n");
    let config = RunnerConfig::default()
        .with_workers(1)
        .with_poll_interval(Duration::from_millis(10));
    let runner = Runner::new(config).expect("runner should build");
    runner
        .load_tasks(source.path())
        .await
        .expect("source should load");

    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let status = tokio::time::timeout(Duration::from_secs(5), runner.run(shutdown))
        .await
        .expect("run should stop promptly after cancellation");

    // Workers finish whatever they already leased, so nothing stays leased
    // and every task is either done or still queued
    assert_eq!(status.leased, 0);
    assert_eq!(status.completed + status.ready, 3, "No task may be lost");
}

/// Test 3: a late completion after lease recovery is tolerated and the
/// task completes normally on re-delivery
#[tokio::test]
async fn test_late_completion_is_tolerated() {
    let source = source_file("31\n");
    let config = RunnerConfig::default().with_lease_ttl(Duration::from_millis(20));
    let runner = Runner::new(config).expect("runner should build");
    runner
        .load_tasks(source.path())
        .await
        .expect("source should load");

    let task = runner.request_task().await.expect("one task should be ready");

    // Let the lease expire, then reclaim it by hand
    tokio::time::sleep(Duration::from_millis(50)).await;
    let recovered = runner.broker().write().await.recover_expired(Instant::now());
    assert_eq!(recovered, 1);

    // The slow worker reports afterwards: tolerated, but it does not count
    let report = MersenneExecutor::new().check(CheckRequest { exponent: 31 });
    assert!(
        !runner.complete_task(task.id, report.clone()).await,
        "Late completion should be rejected"
    );

    // Re-delivery completes normally
    let task = runner
        .request_task()
        .await
        .expect("task should be re-deliverable");
    assert!(runner.complete_task(task.id, report).await);

    let status = runner.status().await;
    assert_eq!(status.completed, 1);
    assert!(runner.broker().read().await.is_drained());
}

/// Test 4: a duplicate completion is rejected and recorded only once
#[tokio::test]
async fn test_duplicate_completion_recorded_once() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let results_path = dir.path().join("results.jsonl");
    let source = source_file("13\n");

    let config = RunnerConfig::default().with_results_path(results_path.clone());
    let runner = Runner::new(config).expect("runner should build");
    runner
        .load_tasks(source.path())
        .await
        .expect("source should load");

    let task = runner.request_task().await.expect("one task should be ready");
    let report = MersenneExecutor::new().check(CheckRequest { exponent: 13 });

    assert!(runner.complete_task(task.id, report.clone()).await);
    assert!(
        !runner.complete_task(task.id, report).await,
        "Second completion should be rejected"
    );

    let contents = std::fs::read_to_string(&results_path).expect("results file should exist");
    assert_eq!(contents.lines().count(), 1, "Report must be recorded once");
}

/// Test 5: an explicitly failed task goes back to the head of the queue
#[tokio::test]
async fn test_report_failure_requeues_at_head() {
    let source = source_file("3\n5\n7\n");
    let runner = Runner::new(RunnerConfig::default()).expect("runner should build");
    runner
        .load_tasks(source.path())
        .await
        .expect("source should load");

    let first = runner.request_task().await.expect("first task");
    assert_eq!(first.payload["exponent"], 3);
    assert!(runner.report_failure(first.id).await);

    // The failed task comes back before untouched work
    let again = runner.request_task().await.expect("requeued task");
    assert_eq!(again.id, first.id);
}
