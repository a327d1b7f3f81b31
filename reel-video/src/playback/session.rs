//! Playback session: loading sources into a scheduler, newest load wins.

use crate::ingest::{AssemblyError, FrameAssembler};
use crate::playback::scheduler::{LoadOutcome, SchedulerHandle};
use crate::playback::state::{PlaybackError, PlaybackState};
use crate::sequence::SequenceInfo;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from opening a source in a session.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("Load of {} was superseded by a newer load", .0.display())]
    Superseded(PathBuf),
}

/// Pairs an assembler with a running scheduler.
///
/// Cloning is cheap; clones drive the same scheduler. Assembly runs on the
/// caller's task and blocking workers, never on the scheduler task.
#[derive(Clone)]
pub struct PlaybackSession {
    assembler: FrameAssembler,
    scheduler: SchedulerHandle,
    rate_override: Option<f64>,
}

impl PlaybackSession {
    pub fn new(assembler: FrameAssembler, scheduler: SchedulerHandle) -> Self {
        Self {
            assembler,
            scheduler,
            rate_override: None,
        }
    }

    /// Play every opened sequence at `frames_per_second`, ignoring its own rate.
    pub fn with_rate_override(mut self, frames_per_second: Option<f64>) -> Self {
        self.rate_override = frames_per_second;
        self
    }

    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    /// Load `path` and start playing it.
    ///
    /// If another `open` begins before this one finishes assembling, this
    /// one's frames are discarded and [`LoadError::Superseded`] is returned.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub async fn open(&self, path: &Path) -> Result<SequenceInfo, LoadError> {
        let ticket = self.scheduler.begin_load();
        let mut sequence = self.assembler.load(path).await?;
        if let Some(rate) = self.rate_override {
            sequence = sequence.with_frame_rate(rate);
        }
        let info = sequence.info();

        match self.scheduler.play(ticket, sequence).await? {
            LoadOutcome::Applied(phase) => {
                info!("Playing {} frames ({:?})", info.frame_count, phase);
                Ok(info)
            }
            LoadOutcome::Superseded => {
                debug!("Dropping superseded sequence");
                Err(LoadError::Superseded(path.to_path_buf()))
            }
        }
    }

    pub async fn stop(&self) -> Result<bool, PlaybackError> {
        self.scheduler.stop().await
    }

    pub async fn restart(&self) -> Result<(), PlaybackError> {
        self.scheduler.start().await
    }

    pub async fn state(&self) -> Result<PlaybackState, PlaybackError> {
        self.scheduler.state().await
    }

    /// End the session's playback and release the held frames.
    pub async fn close(&self) -> Result<(), PlaybackError> {
        self.scheduler.unload().await
    }
}
