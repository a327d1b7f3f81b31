//! Playback scheduler: a single task owning the playback state.
//!
//! Commands and timer ticks are handled one at a time by the same task, so a
//! tick can never overlap another tick or a load. Callers talk to it through a
//! cloneable [`SchedulerHandle`].

use crate::playback::consumer::{FrameUpdate, RenderConsumer};
use crate::playback::state::{Playback, PlaybackError, PlaybackPhase, PlaybackState};
use crate::sequence::{FrameSequence, SourceKind};
use glam::Vec3;
use reel_data::{Frame, Normalizer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

const COMMAND_QUEUE_DEPTH: usize = 32;

/// Which center frames are normalized about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Centering {
    /// Each frame on its own bounding-box center.
    #[default]
    PerFrame,
    /// Every frame on the center of the whole sequence's bounds.
    Stable,
}

/// Presentation settings of the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    #[serde(flatten)]
    pub normalizer: Normalizer,
    pub centering: Centering,
    /// Present at most this many points per frame.
    pub point_budget: Option<usize>,
}

/// Issued when a load begins. Only the newest ticket's sequence is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

/// Result of handing a sequence to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The sequence replaced the previous one; the phase it ended in.
    Applied(PlaybackPhase),
    /// A newer load began in the meantime; the sequence was dropped.
    Superseded,
}

enum Command {
    Load {
        ticket: LoadTicket,
        sequence: FrameSequence,
        autoplay: bool,
        reply: oneshot::Sender<LoadOutcome>,
    },
    Start {
        reply: oneshot::Sender<Result<(), PlaybackError>>,
    },
    Stop {
        reply: oneshot::Sender<bool>,
    },
    Unload {
        reply: oneshot::Sender<()>,
    },
    State {
        reply: oneshot::Sender<PlaybackState>,
    },
}

enum Event {
    Command(Command),
    Tick,
}

/// Cloneable handle to a running [`PlaybackScheduler`].
#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::Sender<Command>,
    latest_ticket: Arc<AtomicU64>,
}

impl SchedulerHandle {
    /// Reserve a ticket for a load that is about to begin. Any older ticket
    /// becomes stale.
    pub fn begin_load(&self) -> LoadTicket {
        LoadTicket(self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Replace the held sequence, ending `Stopped` (or `Idle` if empty).
    pub async fn load(
        &self,
        ticket: LoadTicket,
        sequence: FrameSequence,
    ) -> Result<LoadOutcome, PlaybackError> {
        self.request(|reply| Command::Load {
            ticket,
            sequence,
            autoplay: false,
            reply,
        })
        .await
    }

    /// Replace the held sequence and start it in the same step.
    pub async fn play(
        &self,
        ticket: LoadTicket,
        sequence: FrameSequence,
    ) -> Result<LoadOutcome, PlaybackError> {
        self.request(|reply| Command::Load {
            ticket,
            sequence,
            autoplay: true,
            reply,
        })
        .await
    }

    /// Load a sequence that is already in hand, superseding pending loads.
    pub async fn replace(&self, sequence: FrameSequence) -> Result<LoadOutcome, PlaybackError> {
        let ticket = self.begin_load();
        self.load(ticket, sequence).await
    }

    /// Start from frame 0. The first frame is presented immediately.
    pub async fn start(&self) -> Result<(), PlaybackError> {
        self.request(|reply| Command::Start { reply }).await?
    }

    /// Stop ticking. Returns whether playback was running.
    pub async fn stop(&self) -> Result<bool, PlaybackError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Stop and drop the held sequence.
    pub async fn unload(&self) -> Result<(), PlaybackError> {
        self.request(|reply| Command::Unload { reply }).await
    }

    pub async fn state(&self) -> Result<PlaybackState, PlaybackError> {
        self.request(|reply| Command::State { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, PlaybackError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| PlaybackError::SchedulerClosed)?;
        response.await.map_err(|_| PlaybackError::SchedulerClosed)
    }
}

/// Owns the frame sequence and playback state, advances on a fixed period
/// and presents normalized frames to a [`RenderConsumer`].
pub struct PlaybackScheduler<C: RenderConsumer> {
    playback: Playback,
    consumer: C,
    config: SchedulerConfig,
    ticker: Option<Interval>,
    shared_center: Option<Vec3>,
    latest_ticket: Arc<AtomicU64>,
}

impl<C: RenderConsumer> PlaybackScheduler<C> {
    /// Spawn the scheduler task. It runs until every handle is dropped.
    pub fn spawn(config: SchedulerConfig, consumer: C) -> (SchedulerHandle, JoinHandle<()>) {
        let (commands, receiver) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let latest_ticket = Arc::new(AtomicU64::new(0));
        let scheduler = Self {
            playback: Playback::new(),
            consumer,
            config,
            ticker: None,
            shared_center: None,
            latest_ticket: Arc::clone(&latest_ticket),
        };
        let task = tokio::spawn(scheduler.run(receiver));
        (
            SchedulerHandle {
                commands,
                latest_ticket,
            },
            task,
        )
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            let event = tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(command) => Event::Command(command),
                    None => break,
                },
                _ = next_tick(&mut self.ticker) => Event::Tick,
            };
            match event {
                Event::Command(command) => self.handle(command),
                Event::Tick => self.tick(),
            }
        }
        debug!("Playback scheduler shutting down");
    }

    fn handle(&mut self, command: Command) {
        // A dropped reply receiver only means the caller stopped waiting.
        match command {
            Command::Load {
                ticket,
                sequence,
                autoplay,
                reply,
            } => {
                let _ = reply.send(self.load(ticket, sequence, autoplay));
            }
            Command::Start { reply } => {
                let _ = reply.send(self.start());
            }
            Command::Stop { reply } => {
                let _ = reply.send(self.stop());
            }
            Command::Unload { reply } => {
                self.ticker = None;
                self.shared_center = None;
                self.playback.clear();
                let _ = reply.send(());
            }
            Command::State { reply } => {
                let _ = reply.send(self.playback.state());
            }
        }
    }

    fn load(&mut self, ticket: LoadTicket, sequence: FrameSequence, autoplay: bool) -> LoadOutcome {
        let latest = self.latest_ticket.load(Ordering::SeqCst);
        if ticket.0 != latest {
            debug!("Discarding load {} superseded by {}", ticket.0, latest);
            return LoadOutcome::Superseded;
        }

        // The old timer must be gone before the sequence is swapped.
        self.ticker = None;
        self.shared_center = match self.config.centering {
            Centering::Stable => sequence.bounds().map(|bounds| bounds.center()),
            Centering::PerFrame => None,
        };

        let info = sequence.info();
        let mut phase = self.playback.load(sequence);
        info!(
            "Loaded {:?} with {} frames at {} fps",
            info.kind, info.frame_count, info.frames_per_second
        );

        if autoplay && phase == PlaybackPhase::Stopped && self.start().is_ok() {
            phase = PlaybackPhase::Playing;
        }
        LoadOutcome::Applied(phase)
    }

    fn start(&mut self) -> Result<(), PlaybackError> {
        let (index, frame) = self
            .playback
            .start()
            .map(|(index, frame)| (index, frame.clone()))?;
        self.ticker = self.arm_ticker();
        self.present(index, &frame);
        Ok(())
    }

    fn stop(&mut self) -> bool {
        self.ticker = None;
        self.playback.stop()
    }

    fn tick(&mut self) {
        let Some((index, frame)) = self
            .playback
            .advance()
            .map(|(index, frame)| (index, frame.clone()))
        else {
            self.ticker = None;
            return;
        };
        self.present(index, &frame);
    }

    /// Snapshots show a single frame, so only videos get a timer.
    fn arm_ticker(&self) -> Option<Interval> {
        let sequence = self.playback.sequence()?;
        if sequence.kind() == SourceKind::StaticSnapshot {
            return None;
        }
        let period = sequence.period();
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!("Ticking every {:?}", period);
        Some(interval)
    }

    fn present(&mut self, index: usize, frame: &Frame) {
        let normalizer = self.config.normalizer;
        let mut normalized = match self.shared_center {
            Some(center) => normalizer.normalize_about(frame, center),
            None => normalizer.normalize(frame),
        };
        if let Some(budget) = self.config.point_budget {
            normalized = normalized.truncated(budget);
        }

        debug!("Presenting frame {} ({} points)", index, normalized.len());
        self.consumer.present(FrameUpdate {
            index,
            frame_count: self.playback.frame_count(),
            frame: normalized,
        });
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
