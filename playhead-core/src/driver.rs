//! Actor host for threaded applications.
//!
//! A [`PlaybackSessionController`] is not safe for concurrent mutation. The
//! driver moves it into a tokio task that owns it exclusively, feeds it from an
//! mpsc command queue and fires the checkpoint timer on an interval. Any number
//! of [`SessionHandle`] clones can then post events from other threads.

use crate::checkpoint::CheckpointDecision;
use crate::controller::{PlaybackSessionController, SessionEvent};
use crate::position::EngineTick;
use crate::session::PlaybackSession;
use playhead_model::{EpisodeId, ProgressCheckpoint, SubjectId};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

const COMMAND_QUEUE_DEPTH: usize = 256;

/// The driver task has stopped.
#[derive(Debug, Error)]
#[error("playback session driver is no longer running")]
pub struct DriverClosed;

#[derive(Debug)]
enum SessionCommand {
    Open {
        subject_id: SubjectId,
        episode_id: Option<EpisodeId>,
        reply: oneshot::Sender<PlaybackSession>,
    },
    EngineTick(EngineTick),
    EngineDuration(f64),
    SeekStart,
    SeekTo(f64),
    SeekCommit(f64),
    JumpToFraction(f64),
    JumpToPercentDigit(u8),
    SkipBy(f64),
    TimerTick {
        reply: oneshot::Sender<Option<CheckpointDecision>>,
    },
    Snapshot {
        reply: oneshot::Sender<Option<PlaybackSession>>,
    },
    DrainEvents {
        reply: oneshot::Sender<Vec<SessionEvent>>,
    },
    Close {
        reply: oneshot::Sender<Option<ProgressCheckpoint>>,
    },
    Shutdown,
}

/// Cloneable sender side of a session driver.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

/// Moves `controller` into a background task.
///
/// `timer_period` is how often the checkpoint timer fires; the configured
/// checkpoint interval still gates the actual writes.
pub fn spawn_session_driver(
    controller: PlaybackSessionController,
    timer_period: Duration,
) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let task = tokio::spawn(run(controller, rx, timer_period));
    (SessionHandle { tx }, task)
}

async fn run(
    mut controller: PlaybackSessionController,
    mut rx: mpsc::Receiver<SessionCommand>,
    timer_period: Duration,
) {
    let mut timer = tokio::time::interval(timer_period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else {
                    debug!(target: "playhead::session", "all handles dropped");
                    break;
                };
                if !handle_command(&mut controller, command).await {
                    break;
                }
            }
            _ = timer.tick() => {
                let now = controller.now();
                controller.on_timer_tick(now);
            }
        }
    }

    controller.close();
    info!(target: "playhead::session", "session driver stopped");
}

async fn handle_command(
    controller: &mut PlaybackSessionController,
    command: SessionCommand,
) -> bool {
    match command {
        SessionCommand::Open {
            subject_id,
            episode_id,
            reply,
        } => {
            let session = controller.open(subject_id, episode_id).await.clone();
            let _ = reply.send(session);
        }
        SessionCommand::EngineTick(tick) => controller.on_engine_tick(tick),
        SessionCommand::EngineDuration(seconds) => {
            controller.on_engine_duration(seconds)
        }
        SessionCommand::SeekStart => controller.on_seek_start(),
        SessionCommand::SeekTo(fraction) => controller.on_seek_to(fraction),
        SessionCommand::SeekCommit(fraction) => {
            controller.on_seek_commit(fraction)
        }
        SessionCommand::JumpToFraction(fraction) => {
            controller.jump_to_fraction(fraction)
        }
        SessionCommand::JumpToPercentDigit(digit) => {
            controller.jump_to_percent_digit(digit);
        }
        SessionCommand::SkipBy(seconds) => controller.skip_by(seconds),
        SessionCommand::TimerTick { reply } => {
            let now = controller.now();
            let _ = reply.send(controller.on_timer_tick(now));
        }
        SessionCommand::Snapshot { reply } => {
            let _ = reply.send(controller.session().cloned());
        }
        SessionCommand::DrainEvents { reply } => {
            let _ = reply.send(controller.drain_events());
        }
        SessionCommand::Close { reply } => {
            let _ = reply.send(controller.close());
        }
        SessionCommand::Shutdown => return false,
    }
    true
}

impl SessionHandle {
    async fn send(&self, command: SessionCommand) -> Result<(), DriverClosed> {
        self.tx.send(command).await.map_err(|_| DriverClosed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, DriverClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(build(reply)).await?;
        rx.await.map_err(|_| DriverClosed)
    }

    pub async fn open(
        &self,
        subject_id: SubjectId,
        episode_id: Option<EpisodeId>,
    ) -> Result<PlaybackSession, DriverClosed> {
        self.request(|reply| SessionCommand::Open {
            subject_id,
            episode_id,
            reply,
        })
        .await
    }

    pub async fn engine_tick(&self, tick: EngineTick) -> Result<(), DriverClosed> {
        self.send(SessionCommand::EngineTick(tick)).await
    }

    pub async fn engine_duration(
        &self,
        seconds: f64,
    ) -> Result<(), DriverClosed> {
        self.send(SessionCommand::EngineDuration(seconds)).await
    }

    pub async fn seek_start(&self) -> Result<(), DriverClosed> {
        self.send(SessionCommand::SeekStart).await
    }

    pub async fn seek_to(&self, fraction: f64) -> Result<(), DriverClosed> {
        self.send(SessionCommand::SeekTo(fraction)).await
    }

    pub async fn seek_commit(&self, fraction: f64) -> Result<(), DriverClosed> {
        self.send(SessionCommand::SeekCommit(fraction)).await
    }

    pub async fn jump_to_fraction(
        &self,
        fraction: f64,
    ) -> Result<(), DriverClosed> {
        self.send(SessionCommand::JumpToFraction(fraction)).await
    }

    pub async fn jump_to_percent_digit(
        &self,
        digit: u8,
    ) -> Result<(), DriverClosed> {
        self.send(SessionCommand::JumpToPercentDigit(digit)).await
    }

    pub async fn skip_by(&self, seconds: f64) -> Result<(), DriverClosed> {
        self.send(SessionCommand::SkipBy(seconds)).await
    }

    /// Runs the checkpoint timer immediately, outside the interval.
    pub async fn timer_tick(
        &self,
    ) -> Result<Option<CheckpointDecision>, DriverClosed> {
        self.request(|reply| SessionCommand::TimerTick { reply }).await
    }

    pub async fn snapshot(
        &self,
    ) -> Result<Option<PlaybackSession>, DriverClosed> {
        self.request(|reply| SessionCommand::Snapshot { reply }).await
    }

    pub async fn drain_events(
        &self,
    ) -> Result<Vec<SessionEvent>, DriverClosed> {
        self.request(|reply| SessionCommand::DrainEvents { reply }).await
    }

    pub async fn close(
        &self,
    ) -> Result<Option<ProgressCheckpoint>, DriverClosed> {
        self.request(|reply| SessionCommand::Close { reply }).await
    }

    /// Stops the driver; the active session is closed on the way out.
    pub async fn shutdown(&self) -> Result<(), DriverClosed> {
        self.send(SessionCommand::Shutdown).await
    }
}
