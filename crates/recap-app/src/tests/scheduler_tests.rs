use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::*;
use crate::pipeline::PipelineSettings;
use crate::scheduler::run_scheduler;

#[tokio::test]
async fn test_scheduler_runs_until_cancelled() {
    let reports = tempfile::tempdir().unwrap();
    let shots = tempfile::tempdir().unwrap();
    let extractor = Arc::new(ScriptedExtractor::texts(&[]));
    let f = fixture(
        reports.path(),
        Arc::new(FakeSource::new(shots.path())),
        extractor.clone(),
        Arc::new(StepClock::new(&["2026-03-01 10:00:00"])),
        PipelineSettings::default(),
        None,
    );

    let cancel = CancellationToken::new();
    let scheduler = tokio::spawn(run_scheduler(
        f.orchestrator.clone(),
        Duration::from_millis(50),
        cancel.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(400)).await;
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), scheduler)
        .await
        .expect("scheduler did not stop")
        .unwrap()
        .unwrap();

    // let a tick spawned right before cancel claim the gate
    tokio::time::sleep(Duration::from_millis(50)).await;
    while f.orchestrator.is_running() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let runs = extractor.call_count();
    assert!(runs >= 2, "expected several runs, got {runs}");

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(extractor.call_count(), runs, "ticks continued after cancel");
}

#[tokio::test]
async fn test_first_run_waits_one_interval() {
    let reports = tempfile::tempdir().unwrap();
    let shots = tempfile::tempdir().unwrap();
    let extractor = Arc::new(ScriptedExtractor::texts(&[]));
    let f = fixture(
        reports.path(),
        Arc::new(FakeSource::new(shots.path())),
        extractor.clone(),
        Arc::new(StepClock::new(&["2026-03-01 10:00:00"])),
        PipelineSettings::default(),
        None,
    );

    let cancel = CancellationToken::new();
    let scheduler = tokio::spawn(run_scheduler(
        f.orchestrator.clone(),
        Duration::from_secs(60),
        cancel.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    scheduler.await.unwrap().unwrap();

    assert_eq!(extractor.call_count(), 0);
}
