//! Frame sequence assembly: enumerate, decode in parallel, reassemble in order.

use crate::ingest::codec::{FrameCodec, decode_handle};
use crate::ingest::rate::{DEFAULT_FRAMES_PER_SECOND, read_frame_rate};
use crate::ingest::source::{
    FrameHandle, ResolvedSource, SourceError, SourceOptions, enumerate_frames, resolve_source,
};
use crate::sequence::{FrameSequence, SourceKind};
use reel_data::{Frame, parse_ply_text};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors that abort a whole load. Single-frame failures never end up here.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("No frames could be decoded from {}", location.display())]
    EmptySequence { location: PathBuf },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to read snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Loader task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Assembly settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Maximum number of frames decoded concurrently.
    pub decode_workers: usize,
    #[serde(flatten)]
    pub source: SourceOptions,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            decode_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            source: SourceOptions::default(),
        }
    }
}

/// Loads sources into frame sequences using an injected codec.
///
/// All file and codec work runs on blocking workers, never on the task that
/// awaits the result.
#[derive(Clone)]
pub struct FrameAssembler {
    codec: Arc<dyn FrameCodec>,
    config: AssemblerConfig,
}

impl FrameAssembler {
    pub fn new(codec: Arc<dyn FrameCodec>, config: AssemblerConfig) -> Self {
        Self { codec, config }
    }

    pub fn with_codec(codec: impl FrameCodec + 'static) -> Self {
        Self::new(Arc::new(codec), AssemblerConfig::default())
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Load any supported source: a video directory, a single codec payload
    /// or a PLY text snapshot.
    #[tracing::instrument(skip_all, fields(path = %location.display()))]
    pub async fn load(&self, location: &Path) -> Result<FrameSequence, AssemblyError> {
        let path = location.to_path_buf();
        let extension = self.codec.extension().to_string();
        let resolved = tokio::task::spawn_blocking(move || resolve_source(&path, &extension)).await??;

        match resolved {
            ResolvedSource::Snapshot { path } => self.load_snapshot(path).await,
            ResolvedSource::Video { directory, handles } => {
                self.assemble_handles(location, directory, handles).await
            }
        }
    }

    /// Assemble the compressed video stored in `directory`.
    #[tracing::instrument(skip_all, fields(path = %directory.display()))]
    pub async fn assemble(&self, directory: &Path) -> Result<FrameSequence, AssemblyError> {
        let dir = directory.to_path_buf();
        let extension = self.codec.extension().to_string();
        let handles = tokio::task::spawn_blocking(move || enumerate_frames(&dir, &extension)).await??;
        self.assemble_handles(directory, Some(directory.to_path_buf()), handles)
            .await
    }

    async fn load_snapshot(&self, path: PathBuf) -> Result<FrameSequence, AssemblyError> {
        let frame = tokio::task::spawn_blocking(move || {
            std::fs::read(&path)
                .map(|bytes| parse_ply_text(&String::from_utf8_lossy(&bytes)))
                .map_err(|source| AssemblyError::Snapshot { path, source })
        })
        .await??;

        info!("Loaded snapshot with {} points", frame.len());
        Ok(FrameSequence::snapshot(frame))
    }

    async fn assemble_handles(
        &self,
        location: &Path,
        directory: Option<PathBuf>,
        handles: Vec<FrameHandle>,
    ) -> Result<FrameSequence, AssemblyError> {
        let total = handles.len();
        let frames = self.decode_all(handles).await;
        let failed = total - frames.len();

        if frames.is_empty() {
            warn!("No decodable frames among {} payloads", total);
            return Err(AssemblyError::EmptySequence {
                location: location.to_path_buf(),
            });
        }

        let frames_per_second = match directory {
            Some(dir) => {
                let rate_file = self.config.source.rate_file.clone();
                tokio::task::spawn_blocking(move || read_frame_rate(&dir, &rate_file)).await?
            }
            None => DEFAULT_FRAMES_PER_SECOND,
        };

        info!(
            "Assembled {} frames ({} failed) at {} fps",
            frames.len(),
            failed,
            frames_per_second
        );
        Ok(FrameSequence::new(
            frames,
            frames_per_second,
            SourceKind::CompressedVideo,
        ))
    }

    /// Decode every handle, skipping failures. The result is in handle order
    /// regardless of which worker finishes first.
    async fn decode_all(&self, handles: Vec<FrameHandle>) -> Vec<Frame> {
        let mut slots: Vec<Option<Frame>> = vec![None; handles.len()];
        let workers = worker_count(self.config.decode_workers, handles.len());
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();

        for (slot, handle) in handles.into_iter().enumerate() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let codec = Arc::clone(&self.codec);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let result = decode_handle(codec.as_ref(), &handle);
                (slot, handle, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, handle, Ok(frame))) => {
                    debug!("Decoded frame {} ({} points)", handle.index, frame.len());
                    slots[slot] = Some(frame);
                }
                Ok((_, handle, Err(e))) => {
                    warn!("Skipping frame {} ({}): {}", handle.index, handle.path.display(), e);
                }
                Err(e) => {
                    warn!("Decode worker failed: {}", e);
                }
            }
        }

        slots.into_iter().flatten().collect()
    }
}

/// Concurrent decodes: at least one, never more than there are frames.
fn worker_count(configured: usize, frames: usize) -> usize {
    configured
        .min(frames)
        .min(Semaphore::MAX_PERMITS)
        .max(1)
}
