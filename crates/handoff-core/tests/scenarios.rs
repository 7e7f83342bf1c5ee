//! End-to-end scenarios against the in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use handoff_core::app::{Iteration, StoreRetryPolicy, Worker, WorkerConfig};
use handoff_core::domain::{EventKind, Outcome, TaskState};
use handoff_core::impls::{InMemoryQueueStore, MemoryEventSink};
use handoff_core::ports::{QueueStore, TaskHandler, handler_fn};

const INPUT: &str = "trt/plantA/todo";
const CLAIMED: &str = "trt/plantA/taken";
const OUTPUT: &str = "global/done";

fn config() -> WorkerConfig {
    WorkerConfig::new(INPUT, OUTPUT)
        .with_claimed_queue(CLAIMED)
        .with_claim_timeout(Duration::from_secs(1))
        .with_store_retry(StoreRetryPolicy::fail_fast())
}

fn counting_handler(calls: Arc<AtomicU32>) -> Arc<dyn TaskHandler> {
    Arc::new(handler_fn(move |_| {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Outcome::success() }
    }))
}

#[tokio::test]
async fn well_formed_task_ends_up_in_output_once() {
    let store = InMemoryQueueStore::new();
    store.push(INPUT, "build/lineA/partX").await.unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let worker = Worker::new(
        config(),
        Arc::new(store.clone()),
        counting_handler(calls.clone()),
    )
    .unwrap();

    let iteration = worker.run_once().await.unwrap();

    assert_eq!(iteration.state(), Some(TaskState::Done));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(store.list(CLAIMED).await.unwrap().is_empty());
    assert_eq!(store.list(OUTPUT).await.unwrap(), vec!["build/lineA/partX"]);
    assert!(store.list(INPUT).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_task_stays_in_claimed_without_dead_letter() {
    let store = InMemoryQueueStore::new();
    store.push(INPUT, "badtask").await.unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let events = MemoryEventSink::new();
    let worker = Worker::new(
        config(),
        Arc::new(store.clone()),
        counting_handler(calls.clone()),
    )
    .unwrap()
    .with_events(Arc::new(events.clone()));

    let iteration = worker.run_once().await.unwrap();

    assert!(matches!(iteration, Iteration::LeftInClaimed(ref e) if e.raw() == "badtask"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(store.list(OUTPUT).await.unwrap().is_empty());
    assert_eq!(store.list(CLAIMED).await.unwrap(), vec!["badtask"]);
    assert_eq!(events.kinds(), vec![EventKind::Taken, EventKind::Stuck]);
}

#[tokio::test]
async fn tasks_are_processed_oldest_first() {
    let store = InMemoryQueueStore::new();
    for task in ["build/lineA/part1", "build/lineA/part2", "build/lineA/part3"] {
        store.push(INPUT, task).await.unwrap();
    }
    let worker = Worker::new(
        config(),
        Arc::new(store.clone()),
        counting_handler(Arc::new(AtomicU32::new(0))),
    )
    .unwrap();

    for _ in 0..3 {
        worker.run_once().await.unwrap();
    }

    // output も LPUSH なので先頭が最新
    assert_eq!(
        store.list(OUTPUT).await.unwrap(),
        vec!["build/lineA/part3", "build/lineA/part2", "build/lineA/part1"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_workers_claim_a_single_task_once() {
    let store = InMemoryQueueStore::new();
    store.push(INPUT, "build/lineA/partX").await.unwrap();
    let calls = Arc::new(AtomicU32::new(0));

    let mut joins = Vec::new();
    for _ in 0..6 {
        let worker = Worker::new(
            config(),
            Arc::new(store.clone()),
            counting_handler(calls.clone()),
        )
        .unwrap();
        joins.push(tokio::spawn(async move { worker.run_once().await.unwrap() }));
    }

    let mut completed = 0;
    let mut idle = 0;
    for join in joins {
        match join.await.unwrap() {
            Iteration::Completed(_) => completed += 1,
            Iteration::Idle => idle += 1,
            other => panic!("unexpected iteration: {other:?}"),
        }
    }

    assert_eq!(completed, 1);
    assert_eq!(idle, 5);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.list(OUTPUT).await.unwrap(), vec!["build/lineA/partX"]);
    assert!(store.list(CLAIMED).await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn idle_worker_keeps_running_without_phantom_claims() {
    let store = InMemoryQueueStore::new();
    let calls = Arc::new(AtomicU32::new(0));
    let worker = Worker::new(
        config(),
        Arc::new(store.clone()),
        counting_handler(calls.clone()),
    )
    .unwrap();

    for _ in 0..3 {
        assert_eq!(worker.run_once().await.unwrap(), Iteration::Idle);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.len(CLAIMED).await.unwrap(), 0);

    // idle の後に来たタスクは普通に処理される
    store.push(INPUT, "build/lineA/partX").await.unwrap();
    assert!(matches!(
        worker.run_once().await.unwrap(),
        Iteration::Completed(_)
    ));
}

#[tokio::test]
async fn counts_reflect_every_queue() {
    let store = InMemoryQueueStore::new();
    for task in ["build/lineA/partX", "oops", "paint/lineB/partY"] {
        store.push(INPUT, task).await.unwrap();
    }
    let handler = Arc::new(handler_fn(|task| async move {
        if task.nature() == "paint" {
            Outcome::failure("booth offline")
        } else {
            Outcome::success()
        }
    }));
    let worker = Worker::new(
        config()
            .with_dead_letter_queue("trt/plantA/dead")
            .with_failed_queue("trt/plantA/failed"),
        Arc::new(store.clone()),
        handler,
    )
    .unwrap();

    for _ in 0..3 {
        worker.run_once().await.unwrap();
    }

    let counts = worker.counts().await.unwrap();
    assert_eq!(counts.input, 0);
    assert_eq!(counts.claimed, 0);
    assert_eq!(counts.output, 1);
    assert_eq!(counts.dead_letter, Some(1));
    assert_eq!(counts.failed, Some(1));
}
