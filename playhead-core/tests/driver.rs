//! Session driver running on a tokio runtime

mod common;

use playhead_core::checkpoint::CheckpointDecision;
use playhead_core::config::PlaybackConfig;
use playhead_core::controller::{PlaybackSessionController, SessionEvent};
use playhead_core::driver::spawn_session_driver;
use playhead_core::ports::TokioSpawner;
use playhead_core::position::EngineTick;
use playhead_core::testing::{ManualClock, MemoryProgressStore, RecordingEngine};
use playhead_model::{ProgressCheckpoint, SubjectId};
use std::sync::Arc;
use std::time::Duration;

fn controller(
    store: &MemoryProgressStore,
    clock: &ManualClock,
) -> PlaybackSessionController {
    let spawner = TokioSpawner::try_current().expect("inside a runtime");
    PlaybackSessionController::new(
        Arc::new(store.clone()),
        Box::new(RecordingEngine::new()),
        Arc::new(spawner),
        Arc::new(clock.clone()),
        PlaybackConfig::default(),
    )
}

async fn wait_for_writes(
    store: &MemoryProgressStore,
    count: usize,
) -> Vec<ProgressCheckpoint> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let writes = store.writes();
            if writes.len() >= count {
                return writes;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("writes did not land in time")
}

#[tokio::test]
async fn handle_drives_a_full_session() {
    common::init_tracing();
    let store = MemoryProgressStore::new();
    let clock = ManualClock::new();
    let (handle, task) = spawn_session_driver(
        controller(&store, &clock),
        Duration::from_secs(3600),
    );

    let subject = SubjectId::new();
    let session = handle.open(subject, None).await.expect("driver running");
    assert_eq!(session.subject_id(), subject);

    handle
        .engine_tick(EngineTick::at_seconds(30.0, 600.0))
        .await
        .expect("driver running");
    clock.advance(Duration::from_secs(10));
    let decision = handle.timer_tick().await.expect("driver running");
    assert!(matches!(decision, Some(CheckpointDecision::Started(_))));
    assert_eq!(wait_for_writes(&store, 1).await[0].whole_position(), 30);

    handle
        .engine_tick(EngineTick::at_seconds(45.0, 600.0))
        .await
        .expect("driver running");
    let snapshot = handle
        .snapshot()
        .await
        .expect("driver running")
        .expect("session open");
    assert_eq!(snapshot.position_seconds(), 45.0);

    let final_checkpoint = handle.close().await.expect("driver running");
    assert_eq!(final_checkpoint.map(|cp| cp.whole_position()), Some(45));
    assert_eq!(wait_for_writes(&store, 2).await[1].whole_position(), 45);

    let events = handle.drain_events().await.expect("driver running");
    assert!(
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::Closed { .. }))
    );

    handle.shutdown().await.expect("driver running");
    task.await.expect("driver task");
    assert!(handle.snapshot().await.is_err());
}

#[tokio::test]
async fn dropping_every_handle_closes_the_session() {
    let store = MemoryProgressStore::new();
    let clock = ManualClock::new();
    let (handle, task) = spawn_session_driver(
        controller(&store, &clock),
        Duration::from_secs(3600),
    );

    handle.open(SubjectId::new(), None).await.expect("driver running");
    handle
        .engine_tick(EngineTick::at_seconds(12.0, 600.0))
        .await
        .expect("driver running");
    let other = handle.clone();
    other.seek_start().await.expect("driver running");
    other.seek_commit(0.5).await.expect("driver running");

    drop(handle);
    drop(other);
    task.await.expect("driver task");

    let writes = wait_for_writes(&store, 1).await;
    assert_eq!(writes[0].whole_position(), 300);
}
