//! Polling loop exits

mod support;

use std::sync::Arc;
use std::time::Duration;

use qcportal_core::{PollExit, PollOptions, SubmitOptions};
use qcportal_domain::RecordStatus;
use support::{singlepoint, FakeServer};
use tokio_util::sync::CancellationToken;

fn server(polls_to_complete: u32) -> Arc<FakeServer> {
    Arc::new(
        FakeServer::new()
            .with_entry("water", 1)
            .with_entry("ammonia", 2)
            .with_specification("b3lyp")
            .polls_to_complete(polls_to_complete),
    )
}

fn fast() -> PollOptions {
    PollOptions::default().interval(Duration::from_secs(1)).max_interval(Duration::from_secs(4))
}

#[tokio::test(start_paused = true)]
async fn stops_when_every_record_is_terminal() {
    let server = server(3);
    let mut ds = singlepoint(&server);
    ds.submit(SubmitOptions::new("b3lyp")).await.unwrap();

    let report = ds.iterate_updated(fast()).await.unwrap();

    assert_eq!(report.exit, PollExit::AllTerminal);
    assert!(report.is_complete());
    assert_eq!(report.iterations, 3);
    assert_eq!(report.updated.len(), 2);
    assert!(report.pending.is_empty());
    assert_eq!(ds.record_ref("water", "b3lyp").unwrap().status, Some(RecordStatus::Complete));
}

#[tokio::test(start_paused = true)]
async fn fresh_dataset_waits_for_records_already_on_the_server() {
    let server = Arc::new(
        FakeServer::new()
            .polls_to_complete(2)
            .with_entry("water", 1)
            .with_specification("b3lyp")
            .with_record("water", "b3lyp", RecordStatus::Waiting),
    );
    let mut ds = singlepoint(&server);

    let report = ds.iterate_updated(fast()).await.unwrap();

    assert_eq!(report.exit, PollExit::AllTerminal);
    assert_eq!(report.iterations, 2);
    assert_eq!(server.calls().record_items, 2);
    assert_eq!(server.record_status("water", "b3lyp"), Some(RecordStatus::Complete));
    assert_eq!(ds.record_ref("water", "b3lyp").unwrap().status, Some(RecordStatus::Complete));
}

#[tokio::test(start_paused = true)]
async fn dataset_without_records_is_checked_once() {
    let server = server(1);
    let mut ds = singlepoint(&server);

    let report = ds.iterate_updated(fast()).await.unwrap();

    assert_eq!(report.exit, PollExit::AllTerminal);
    assert_eq!(report.iterations, 1);
    assert_eq!(server.calls().record_items, 1);
}

#[tokio::test(start_paused = true)]
async fn unbounded_timeout_is_no_deadline() {
    let server = server(u32::MAX);
    let mut ds = singlepoint(&server);
    ds.submit(SubmitOptions::new("b3lyp")).await.unwrap();

    let options = fast().max_iterations(1).timeout(Duration::MAX);
    let report = ds.iterate_updated(options).await.unwrap();

    assert_eq!(report.exit, PollExit::IterationBudgetExhausted);
    assert_eq!(report.iterations, 1);
}

#[tokio::test(start_paused = true)]
async fn iteration_budget_bounds_the_loop() {
    let server = server(u32::MAX);
    let mut ds = singlepoint(&server);
    ds.submit(SubmitOptions::new("b3lyp")).await.unwrap();
    let before = server.calls().record_items;

    let report = ds.iterate_updated(fast().max_iterations(4)).await.unwrap();

    assert_eq!(report.exit, PollExit::IterationBudgetExhausted);
    assert_eq!(report.iterations, 4);
    assert_eq!(report.pending.len(), 2);
    assert_eq!(server.calls().record_items - before, 4);
}

#[tokio::test(start_paused = true)]
async fn timeout_bounds_the_loop() {
    let server = server(u32::MAX);
    let mut ds = singlepoint(&server);
    ds.submit(SubmitOptions::new("b3lyp")).await.unwrap();

    let options = fast().interval(Duration::from_secs(10)).max_interval(Duration::from_secs(10));
    let report = ds.iterate_updated(options.timeout(Duration::from_secs(25))).await.unwrap();

    assert_eq!(report.exit, PollExit::TimedOut);
    assert_eq!(report.iterations, 3);
    assert!(!report.pending.is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancelled_token_stops_before_polling() {
    let server = server(u32::MAX);
    let mut ds = singlepoint(&server);
    ds.submit(SubmitOptions::new("b3lyp")).await.unwrap();
    let before = server.calls().record_items;

    let token = CancellationToken::new();
    token.cancel();
    let report = ds.iterate_updated(fast().cancel_on(token)).await.unwrap();

    assert_eq!(report.exit, PollExit::Cancelled);
    assert_eq!(report.iterations, 0);
    assert_eq!(server.calls().record_items, before);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_the_wait() {
    let server = server(u32::MAX);
    let mut ds = singlepoint(&server);
    ds.submit(SubmitOptions::new("b3lyp")).await.unwrap();

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        trigger.cancel();
    });

    let options = fast().interval(Duration::from_secs(60)).max_interval(Duration::from_secs(60));
    let report = ds.iterate_updated(options.cancel_on(token)).await.unwrap();

    assert_eq!(report.exit, PollExit::Cancelled);
    assert_eq!(report.iterations, 1);
}

#[tokio::test(start_paused = true)]
async fn records_failing_on_the_server_are_terminal() {
    let server = Arc::new(
        FakeServer::new()
            .with_entry("water", 1)
            .with_specification("b3lyp")
            .with_record("water", "b3lyp", RecordStatus::Error),
    );
    let mut ds = singlepoint(&server);
    ds.submit(SubmitOptions::new("b3lyp").missing_only()).await.unwrap();

    let report = ds.iterate_updated(fast()).await.unwrap();

    assert_eq!(report.exit, PollExit::AllTerminal);
    assert_eq!(report.iterations, 1);
    assert!(report.updated.contains(&qcportal_domain::RecordKey::new("water", "b3lyp")));
}
