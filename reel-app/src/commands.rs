//! Subcommand implementations.

use crate::config::AppConfig;
use reel_data::BoundingBox;
use reel_video::ingest::{AssemblyError, SourceError, discover_videos};
use reel_video::playback::PlaybackError;
use reel_video::{
    FrameAssembler, FrameSequence, FrameUpdate, LoadError, PlaybackScheduler, PlaybackSession,
    PlyCodec, SequenceInfo,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Invalid play duration: {0} seconds")]
    InvalidDuration(f64),

    #[error("Failed to listen for Ctrl-C: {0}")]
    Signal(#[source] std::io::Error),

    #[error("Failed to encode report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("Scheduler task failed: {0}")]
    Scheduler(#[from] tokio::task::JoinError),
}

fn assembler(config: &AppConfig) -> FrameAssembler {
    FrameAssembler::new(Arc::new(PlyCodec), config.source.clone())
}

/// Totals of one `play` run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaySummary {
    pub presented: usize,
    pub points: usize,
    pub last_index: Option<usize>,
}

impl PlaySummary {
    fn record(&mut self, update: &FrameUpdate) {
        self.presented += 1;
        self.points += update.frame.len();
        self.last_index = Some(update.index);
    }
}

/// Play `path` until Ctrl-C, or for `seconds` when given.
pub async fn play(
    path: &Path,
    seconds: Option<f64>,
    fps: Option<f64>,
    config: &AppConfig,
) -> Result<PlaySummary, CommandError> {
    let limit = seconds
        .map(|s| Duration::try_from_secs_f64(s).map_err(|_| CommandError::InvalidDuration(s)))
        .transpose()?;

    let (frames_tx, mut frames_rx) = mpsc::unbounded_channel::<FrameUpdate>();
    let (scheduler, task) = PlaybackScheduler::spawn(config.playback.clone(), frames_tx);
    let session = PlaybackSession::new(assembler(config), scheduler).with_rate_override(fps);

    let info = session.open(path).await?;
    info!(
        "Opened {} ({} frames at {} fps, {} points)",
        path.display(),
        info.frame_count,
        info.frames_per_second,
        info.total_points
    );

    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    let summary = present_until(&mut frames_rx, deadline, tokio::signal::ctrl_c()).await?;

    session.stop().await?;
    let state = session.state().await?;
    session.close().await?;
    drop(session);
    task.await?;

    info!(
        "Presented {} frames ({} points), stopped at frame {} of {}",
        summary.presented,
        summary.points,
        state.current_frame_index + 1,
        state.frame_count
    );
    Ok(summary)
}

/// Record presented frames until the deadline passes, the interrupt fires or
/// the scheduler goes away. Both futures are polled across every pass.
async fn present_until(
    frames: &mut mpsc::UnboundedReceiver<FrameUpdate>,
    deadline: impl Future<Output = ()>,
    interrupt: impl Future<Output = std::io::Result<()>>,
) -> Result<PlaySummary, CommandError> {
    tokio::pin!(deadline);
    tokio::pin!(interrupt);

    let mut summary = PlaySummary::default();
    loop {
        tokio::select! {
            update = frames.recv() => match update {
                Some(update) => {
                    debug!(
                        "Frame {}/{}: {} points",
                        update.index + 1,
                        update.frame_count,
                        update.frame.len()
                    );
                    summary.record(&update);
                }
                None => break,
            },
            _ = &mut deadline => break,
            signal = &mut interrupt => {
                signal.map_err(CommandError::Signal)?;
                info!("Interrupted");
                break;
            }
        }
    }
    Ok(summary)
}

/// Report printed by `info`.
#[derive(Debug, Clone, Serialize)]
pub struct InfoReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub sequence: SequenceInfo,
    /// `[min, max]` over the whole sequence.
    pub bounds: Option<[[f32; 3]; 2]>,
    pub points_per_frame: Vec<usize>,
}

impl InfoReport {
    pub fn new(path: &Path, sequence: &FrameSequence) -> Self {
        Self {
            path: path.to_path_buf(),
            sequence: sequence.info(),
            bounds: sequence.bounds().map(corners),
            points_per_frame: sequence.frames().iter().map(|f| f.len()).collect(),
        }
    }

    fn print(&self) {
        println!("{}", self.path.display());
        println!("  kind:   {:?}", self.sequence.kind);
        println!("  frames: {}", self.sequence.frame_count);
        println!("  rate:   {} fps", self.sequence.frames_per_second);
        println!("  points: {}", self.sequence.total_points);
        if let Some([min, max]) = self.bounds {
            println!("  bounds: {:?} .. {:?}", min, max);
        }
        for (index, points) in self.points_per_frame.iter().enumerate() {
            println!("  frame {:>5}: {:>8} points", index, points);
        }
    }
}

fn corners(bounds: BoundingBox) -> [[f32; 3]; 2] {
    [bounds.min.to_array(), bounds.max.to_array()]
}

/// Assemble `path` and print what it holds.
pub async fn info(path: &Path, json: bool, config: &AppConfig) -> Result<(), CommandError> {
    let sequence = assembler(config).load(path).await?;
    let report = InfoReport::new(path, &sequence);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }
    Ok(())
}

/// Print the video bundles found directly under `root`.
pub fn list(root: &Path, config: &AppConfig) -> Result<(), CommandError> {
    let videos = discover_videos(root, &config.source.source)?;
    if videos.is_empty() {
        info!("No video bundles under {}", root.display());
    }
    for video in videos {
        println!("{}", video.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_data::{Frame, Point};
    use reel_video::SourceKind;
    use std::fs;

    const TRIANGLE: &str = "ply
format ascii 1.0
element vertex 3
property float x
property float y
property float z
end_header
0 0 0
2 0 0
0 2 4
";

    fn point(x: f32, y: f32, z: f32) -> Point {
        Point::new(x, y, z)
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "reel_commands_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_info_report() {
        let frames = vec![
            Frame::from(vec![point(0.0, 0.0, 0.0), point(1.0, 2.0, 3.0)]),
            Frame::empty(),
            Frame::from(vec![point(-1.0, 0.0, 0.0)]),
        ];
        let sequence = FrameSequence::new(frames, 24.0, SourceKind::CompressedVideo);
        let report = InfoReport::new(Path::new("clip.drc.bundle"), &sequence);

        assert_eq!(report.points_per_frame, [2, 0, 1]);
        assert_eq!(report.bounds, Some([[-1.0, 0.0, 0.0], [1.0, 2.0, 3.0]]));

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["frame_count"], 3);
        assert_eq!(json["frames_per_second"], 24.0);
        assert_eq!(json["kind"], "compressed_video");
    }

    #[tokio::test]
    async fn test_play_snapshot_for_a_while() {
        let dir = scratch_dir("play");
        let snapshot = dir.join("triangle.ply");
        fs::write(&snapshot, TRIANGLE).unwrap();

        let summary = play(&snapshot, Some(0.05), None, &AppConfig::default())
            .await
            .unwrap();
        assert_eq!(summary.presented, 1);
        assert_eq!(summary.points, 3);
        assert_eq!(summary.last_index, Some(0));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_play_rejects_negative_duration() {
        let result = play(Path::new("unused"), Some(-1.0), None, &AppConfig::default()).await;
        assert!(matches!(result, Err(CommandError::InvalidDuration(_))));
    }

    #[tokio::test]
    async fn test_play_missing_source() {
        let missing = std::env::temp_dir().join("reel_commands_missing.ply");
        let result = play(&missing, Some(0.01), None, &AppConfig::default()).await;
        assert!(matches!(
            result,
            Err(CommandError::Load(LoadError::Assembly(AssemblyError::Source(
                SourceError::NotFound(_)
            ))))
        ));
    }

    #[test]
    fn test_list_bundles() {
        let root = scratch_dir("list");
        fs::create_dir_all(root.join("b.drc.bundle")).unwrap();
        fs::create_dir_all(root.join("a.drc.bundle")).unwrap();
        fs::create_dir_all(root.join("other")).unwrap();
        assert!(list(&root, &AppConfig::default()).is_ok());
        assert!(list(&root.join("nope"), &AppConfig::default()).is_err());
        fs::remove_dir_all(&root).unwrap();
    }

    fn update(index: usize) -> FrameUpdate {
        FrameUpdate {
            index,
            frame_count: 5,
            frame: Frame::from(vec![point(0.0, 0.0, 0.0)]),
        }
    }

    #[tokio::test]
    async fn test_interrupt_ends_presentation() {
        let (tx, mut rx) = mpsc::unbounded_channel::<FrameUpdate>();
        let (fire, fired) = tokio::sync::oneshot::channel::<()>();

        let presenting = tokio::spawn(async move {
            let interrupt = async move {
                let _ = fired.await;
                Ok(())
            };
            let summary = present_until(&mut rx, std::future::pending(), interrupt).await;
            (summary, rx)
        });

        // Fired while the loop is parked on other branches; it must still be seen.
        tokio::task::yield_now().await;
        fire.send(()).unwrap();
        let (summary, _rx) = presenting.await.unwrap();
        assert_eq!(summary.unwrap(), PlaySummary::default());
        drop(tx);
    }

    #[tokio::test]
    async fn test_failed_interrupt_is_reported() {
        let (_tx, mut rx) = mpsc::unbounded_channel::<FrameUpdate>();
        let interrupt = async { Err(std::io::Error::other("no signal handler")) };
        let result = present_until(&mut rx, std::future::pending(), interrupt).await;
        assert!(matches!(result, Err(CommandError::Signal(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_ends_presentation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(update(1)).unwrap();
        tx.send(update(2)).unwrap();
        let deadline = tokio::time::sleep(std::time::Duration::from_secs(1));
        let summary = present_until(&mut rx, deadline, std::future::pending())
            .await
            .unwrap();
        assert_eq!(summary.presented, 2);
        assert_eq!(summary.last_index, Some(2));
    }

    #[test]
    fn test_summary_records_last_frame() {
        let mut summary = PlaySummary::default();
        for index in [3, 4] {
            summary.record(&update(index));
        }
        assert_eq!(summary.presented, 2);
        assert_eq!(summary.last_index, Some(4));
    }
}
