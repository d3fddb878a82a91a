//! Integration tests for cancellation: `abort()`, `close()`, `Drop` and
//! `StreamAbortHandle`. The engine execution must be released exactly once
//! and a paused engine thread must never be left parked.

use jql_link::{LinkError, StreamOutcome, StreamState, StreamHandlers};
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

mod common;

use common::{capacity, client, client_with_handlers, wait_until, EngineStats, Script, ScriptedEngine};

#[tokio::test]
async fn test_abort_is_idempotent() {
    let engine = ScriptedEngine::new(Script::docs(100));
    let mut stream = client(&engine, capacity(4)).create_query("/*", None).execute();
    assert!(stream.next().await.is_some());

    stream.abort();
    stream.abort();
    stream.abort();
    assert_eq!(stream.state(), StreamState::Aborted);
    assert!(stream.next().await.is_none());
    assert!(matches!(stream.next().await, Some(Err(LinkError::StreamClosed))));
    stream.close();
    stream.close();
    drop(stream);

    engine.join_all();
    assert_eq!(EngineStats::get(&engine.stats().aborts), 1);
    assert_eq!(EngineStats::get(&engine.stats().destroys), 1);
    assert_eq!(engine.live_executions(), 0);
}

#[tokio::test]
async fn test_abort_releases_parked_engine_thread() {
    let engine = ScriptedEngine::new(Script::docs(1_000));
    let stream = client(&engine, capacity(2)).create_query("/*", None).execute();
    stream.resume();
    assert!(wait_until(Duration::from_secs(2), || engine.any_parked()).await);
    assert_eq!(stream.state(), StreamState::Paused);

    let resumes_before = EngineStats::get(&engine.stats().resumes);
    stream.abort();
    // Abort on a paused stream lets the engine go before aborting it.
    assert_eq!(EngineStats::get(&engine.stats().resumes), resumes_before + 1);
    assert_eq!(stream.buffered_len(), 0);
    assert_eq!(stream.pending_len(), 0);

    engine.join_all();
    assert_eq!(EngineStats::get(&engine.stats().finished), 1);
    assert!(EngineStats::get(&engine.stats().pushed) < 1_000);
}

#[tokio::test]
async fn test_abort_before_first_pull() {
    let engine = ScriptedEngine::new(Script::docs(10));
    let mut stream = client(&engine, capacity(4)).create_query("/*", None).execute();
    assert!(wait_until(Duration::from_secs(2), || engine.any_parked()).await);

    stream.abort();
    engine.join_all();
    // The woken thread may still attempt one push; it must be refused.
    assert_eq!(EngineStats::get(&engine.stats().accepted), 0);
    assert!(stream.next().await.is_none());
    assert_eq!(EngineStats::get(&engine.stats().destroys), 1);
}

#[tokio::test]
async fn test_drop_releases_execution() {
    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let o = outcomes.clone();
    let handlers = StreamHandlers::new().on_complete(move |outcome| o.lock().push(outcome));

    let engine = ScriptedEngine::new(Script::docs(50));
    let client = client_with_handlers(&engine, capacity(4), handlers);
    {
        let mut stream = client.create_query("/*", None).execute();
        assert!(stream.next().await.is_some());
    }

    engine.join_all();
    assert_eq!(EngineStats::get(&engine.stats().aborts), 1);
    assert_eq!(EngineStats::get(&engine.stats().destroys), 1);
    assert_eq!(*outcomes.lock(), vec![StreamOutcome::Aborted]);
}

#[tokio::test]
async fn test_drop_after_completion_does_not_abort() {
    let engine = ScriptedEngine::new(Script::docs(3));
    let mut stream = client(&engine, capacity(4)).create_query("/*", None).execute();
    while stream.next().await.is_some() {}
    drop(stream);

    engine.join_all();
    assert_eq!(EngineStats::get(&engine.stats().aborts), 0);
    assert_eq!(EngineStats::get(&engine.stats().destroys), 1);
}

#[tokio::test]
async fn test_close_unread_scalar_stream_completes() {
    let engine = ScriptedEngine::new(Script::new().scalar(12));
    let mut stream = client(&engine, capacity(4)).create_query("/* | count", None).execute();

    let value = stream.next().await.unwrap().unwrap().as_scalar();
    assert_eq!(value, Some(12));
    // Only the sentinel is left: closing completes instead of aborting.
    stream.close();
    assert_eq!(stream.state(), StreamState::Closed);
    assert!(matches!(stream.next().await, Some(Err(LinkError::StreamClosed))));

    engine.join_all();
    assert_eq!(EngineStats::get(&engine.stats().aborts), 0);
    assert_eq!(EngineStats::get(&engine.stats().destroys), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abort_handle_wakes_waiting_consumer() {
    let engine = ScriptedEngine::new(Script::docs(5).step_delay(Duration::from_secs(5)));
    let mut stream = client(&engine, capacity(4)).create_query("/*", None).execute();
    let handle = stream.abort_handle();

    let consumer = tokio::spawn(async move {
        let first = stream.next().await;
        (first.is_none(), stream.state())
    });
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!handle.is_finished());
    handle.abort();

    let (ended, state) = tokio::time::timeout(Duration::from_secs(2), consumer)
        .await
        .expect("consumer woke up")
        .unwrap();
    assert!(ended);
    assert_eq!(state, StreamState::Aborted);
    assert!(handle.is_finished());
    handle.abort();
    assert_eq!(EngineStats::get(&engine.stats().destroys), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_abort_races_with_pushes() {
    for seed in 0..20_u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let engine = ScriptedEngine::new(Script::docs(200).in_flight(rng.random_range(0..3)));
        let mut stream = client(&engine, capacity(rng.random_range(1..8)))
            .create_query("/*", None)
            .execute();

        let take = rng.random_range(0..20);
        let mut last = 0;
        for _ in 0..take {
            match stream.next().await {
                Some(Ok(item)) => {
                    let id = item.id().unwrap();
                    assert_eq!(id, last + 1, "seed {}", seed);
                    last = id;
                },
                other => panic!("seed {}: unexpected {:?}", seed, other),
            }
        }

        let handle = stream.abort_handle();
        let aborter = std::thread::spawn(move || handle.abort());
        // Anything still delivered must continue the sequence.
        while let Some(item) = stream.next().await {
            let id = item.unwrap().id().unwrap();
            assert_eq!(id, last + 1, "seed {}", seed);
            last = id;
        }
        aborter.join().unwrap();
        drop(stream);

        engine.join_all();
        assert_eq!(EngineStats::get(&engine.stats().destroys), 1, "seed {}", seed);
        assert_eq!(engine.live_executions(), 0, "seed {}", seed);
    }
}
