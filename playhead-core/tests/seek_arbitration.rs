//! Seek gestures versus engine ticks
//!
//! Engine ticks that arrive while a seek is pending or settling must not move
//! the trusted position; the first tick after the settle window does.

mod common;

use common::{Harness, assert_close};
use playhead_core::controller::SessionEvent;
use playhead_core::ports::SeekTarget;
use playhead_core::position::EngineTick;
use playhead_core::seek::SeekState;
use playhead_model::SubjectId;

async fn playing_at_ten_percent() -> Harness {
    let mut h = Harness::new();
    h.controller.open(SubjectId::new(), None).await;
    h.controller.on_engine_tick(EngineTick::at_fraction(0.1, 600.0));
    h.events();
    h
}

#[tokio::test]
async fn stale_tick_during_settle_is_ignored() {
    let mut h = playing_at_ten_percent().await;
    assert_close(h.controller.displayed_position(), 60.0);

    h.controller.on_seek_start();
    h.controller.on_seek_to(0.75);
    h.controller.on_seek_commit(0.75);
    assert_eq!(h.engine.last_seek(), Some(SeekTarget::Fraction(0.75)));

    h.advance_ms(100);
    h.controller.on_engine_tick(EngineTick::at_fraction(0.30, 600.0));
    assert_close(h.controller.displayed_position(), 450.0);
    assert_close(h.controller.displayed_fraction(), 0.75);
}

#[tokio::test]
async fn first_tick_after_settle_is_trusted() {
    let mut h = playing_at_ten_percent().await;
    h.controller.on_seek_start();
    h.controller.on_seek_commit(0.75);

    h.advance_ms(100);
    h.controller.on_engine_tick(EngineTick::at_fraction(0.30, 600.0));

    h.advance_ms(150);
    h.controller.on_engine_tick(EngineTick::at_fraction(0.75, 600.0));
    let session = h.controller.session().expect("session open");
    assert_eq!(session.seek_state(), SeekState::Idle);
    assert_close(session.position_seconds(), 450.0);
    assert!(
        h.events()
            .iter()
            .any(|e| matches!(e, SessionEvent::SeekSettled { .. }))
    );

    h.controller.on_engine_tick(EngineTick::at_fraction(0.76, 600.0));
    assert_close(h.controller.displayed_position(), 456.0);
}

#[tokio::test]
async fn ticks_are_ignored_while_dragging() {
    let mut h = playing_at_ten_percent().await;
    h.controller.on_seek_start();
    h.controller.on_seek_to(0.5);

    h.advance_ms(5_000);
    h.controller.on_engine_tick(EngineTick::at_fraction(0.2, 600.0));
    assert_close(h.controller.displayed_fraction(), 0.5);
    assert_close(
        h.controller.session().expect("session open").position_seconds(),
        60.0,
    );
    assert!(h.engine.seeks().is_empty());
}

#[tokio::test]
async fn commit_near_end_is_clamped() {
    let mut h = playing_at_ten_percent().await;
    h.controller.on_seek_start();
    h.controller.on_seek_commit(1.0);
    match h.engine.last_seek() {
        Some(SeekTarget::Fraction(f)) => assert_close(f, 0.999_999),
        other => panic!("unexpected seek {other:?}"),
    }

    h.controller.on_seek_start();
    h.controller.on_seek_commit(-0.2);
    assert_eq!(h.engine.last_seek(), Some(SeekTarget::Fraction(0.0)));
}

#[tokio::test]
async fn new_gesture_during_settle_restarts_the_seek() {
    let mut h = playing_at_ten_percent().await;
    h.controller.on_seek_start();
    h.controller.on_seek_commit(0.4);

    h.advance_ms(150);
    h.controller.on_seek_start();
    h.controller.on_seek_to(0.6);

    // Old deadline passed, but the new gesture is still pending.
    h.advance_ms(100);
    h.controller.on_engine_tick(EngineTick::at_fraction(0.4, 600.0));
    assert_close(h.controller.displayed_fraction(), 0.6);

    h.controller.on_seek_commit(0.6);
    h.advance_ms(200);
    h.controller.on_engine_tick(EngineTick::at_fraction(0.6, 600.0));
    let session = h.controller.session().expect("session open");
    assert!(session.seek_state().is_idle());
    assert_close(session.position_seconds(), 360.0);
}

#[tokio::test]
async fn timer_settles_seek_without_ticks() {
    let mut h = playing_at_ten_percent().await;
    h.controller.on_seek_start();
    h.controller.on_seek_commit(0.5);

    h.advance_ms(250);
    h.timer();
    let session = h.controller.session().expect("session open");
    assert!(session.seek_state().is_idle());
    assert_close(session.position_seconds(), 300.0);
}

#[tokio::test]
async fn digit_jumps_and_skips_use_the_seek_path() {
    let mut h = playing_at_ten_percent().await;

    assert!(h.controller.jump_to_percent_digit(3));
    assert!(!h.controller.jump_to_percent_digit(12));
    assert_eq!(h.engine.last_seek(), Some(SeekTarget::Fraction(0.3)));
    assert!(matches!(
        h.controller.session().expect("session open").seek_state(),
        SeekState::SeekSettling { .. }
    ));
    assert_close(h.controller.displayed_position(), 180.0);

    // Skips are relative to the displayed position, even mid-settle.
    h.controller.skip_forward();
    assert_close(h.controller.displayed_position(), 185.0);
    h.controller.skip_backward();
    h.controller.skip_backward();
    assert_close(h.controller.displayed_position(), 175.0);

    h.controller.jump_to_percent_digit(0);
    h.controller.skip_backward();
    assert_close(h.controller.displayed_position(), 0.0);
}

#[tokio::test]
async fn failed_engine_seek_is_reported_and_still_settles() {
    let mut h = playing_at_ten_percent().await;
    h.engine.reject_seeks(true);

    h.controller.jump_to_fraction(0.5);
    let events = h.events();
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::Fault(playhead_core::error::RecoveredFault::EngineSeekFailed { .. })
    )));

    h.advance_ms(200);
    h.controller.on_engine_tick(EngineTick::at_fraction(0.1, 600.0));
    assert_close(h.controller.displayed_position(), 60.0);
}

#[tokio::test]
async fn seek_without_session_is_a_no_op() {
    let mut h = Harness::new();
    h.controller.on_seek_start();
    h.controller.on_seek_commit(0.5);
    h.controller.skip_forward();
    assert!(h.engine.seeks().is_empty());
    assert_eq!(h.controller.displayed_position(), 0.0);
}
