//! Integration tests for core-async.
//!
//! These tests verify the Tokio-backed abstractions and the serial worker
//! runtime the playback core is built on.

use core_async::runtime::SerialRuntime;
use core_async::sync::{self, CancellationToken};
use core_async::{task, time};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};

#[tokio::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    assert_eq!(handle.await.unwrap(), 42);
}

#[tokio::test]
async fn test_sleep() {
    let start = time::Instant::now();
    time::sleep(time::Duration::from_millis(20)).await;
    assert!(start.elapsed() >= time::Duration::from_millis(20));
}

#[tokio::test]
async fn test_timeout_failure() {
    let result = time::timeout(time::Duration::from_millis(10), async {
        time::sleep(time::Duration::from_millis(100)).await;
    })
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_unbounded_channel_preserves_order() {
    let (tx, mut rx) = sync::mpsc::unbounded_channel();

    task::spawn(async move {
        for i in 0..5 {
            tx.send(i).unwrap();
        }
    });

    let mut values = Vec::new();
    while let Some(value) = rx.recv().await {
        values.push(value);
    }

    assert_eq!(values, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_watch_channel_keeps_latest_value() {
    let (tx, rx) = sync::watch::channel(0);
    tx.send(3).unwrap();
    tx.send(7).unwrap();

    // Late subscribers observe only the latest value.
    let late = tx.subscribe();
    assert_eq!(*late.borrow(), 7);
    assert_eq!(*rx.borrow(), 7);
}

#[tokio::test]
async fn test_aborted_task_never_runs() {
    let ran = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&ran);

    let handle = task::spawn(async move {
        time::sleep(time::Duration::from_millis(20)).await;
        *flag.lock().unwrap() = true;
    });
    handle.abort();

    time::sleep(time::Duration::from_millis(40)).await;
    assert!(!*ran.lock().unwrap());
}

#[test]
fn test_serial_runtime_cancellation_stops_delayed_work() {
    let token = CancellationToken::new();
    let worker_token = token.clone();
    let (tx, rx) = std_mpsc::channel();

    let worker = SerialRuntime::start("cancel-worker", move || async move {
        let delayed = {
            let token = worker_token.clone();
            let tx = tx.clone();
            task::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = time::sleep(time::Duration::from_millis(200)) => {
                        let _ = tx.send("fired");
                    }
                }
            })
        };
        worker_token.cancelled().await;
        let _ = delayed.await;
        let _ = tx.send("stopped");
    })
    .unwrap();

    token.cancel();
    worker.join().unwrap();

    let messages: Vec<_> = rx.try_iter().collect();
    assert_eq!(messages, vec!["stopped"]);
}

#[test]
fn test_serial_runtime_reports_finished_after_join_point() {
    let worker = SerialRuntime::start("short-lived", || async {}).unwrap();
    // The main future resolves immediately; the thread should wind down.
    for _ in 0..100 {
        if worker.is_finished() {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    assert!(worker.is_finished());
    worker.join().unwrap();
}
