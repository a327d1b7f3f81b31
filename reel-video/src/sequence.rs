//! Ordered, immutable frame sequences.

use crate::ingest::rate::effective_rate;
use reel_data::{BoundingBox, Frame};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Shortest tick period; faster rates are clamped to 1000 frames per second.
const MIN_PERIOD: Duration = Duration::from_millis(1);
/// Longest tick period.
const MAX_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Where a sequence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// One PLY text document.
    StaticSnapshot,
    /// Codec-compressed frames.
    CompressedVideo,
}

/// A point-cloud video: frames in playback order plus a playback rate.
///
/// Cloning shares the frames. Once built, neither the frame list nor any
/// frame changes; a new source produces a new sequence.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Arc<[Frame]>,
    frames_per_second: f64,
    kind: SourceKind,
}

impl FrameSequence {
    /// Build a sequence. An unusable rate falls back to the default.
    pub fn new(frames: Vec<Frame>, frames_per_second: f64, kind: SourceKind) -> Self {
        Self {
            frames: frames.into(),
            frames_per_second: effective_rate(Some(frames_per_second)),
            kind,
        }
    }

    /// One-frame sequence for a static snapshot.
    pub fn snapshot(frame: Frame) -> Self {
        Self::new(vec![frame], effective_rate(None), SourceKind::StaticSnapshot)
    }

    /// The same frames at another rate. An unusable rate keeps the current one.
    pub fn with_frame_rate(mut self, frames_per_second: f64) -> Self {
        if frames_per_second.is_finite() && frames_per_second > 0.0 {
            self.frames_per_second = frames_per_second;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Time between ticks, `1 / frames_per_second`, clamped to [1ms, 1h].
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.frames_per_second)
            .unwrap_or(MAX_PERIOD)
            .clamp(MIN_PERIOD, MAX_PERIOD)
    }

    /// Bounds over every point of every frame.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.frames
            .iter()
            .filter_map(Frame::bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    pub fn info(&self) -> SequenceInfo {
        SequenceInfo {
            frame_count: self.len(),
            frames_per_second: self.frames_per_second,
            kind: self.kind,
            total_points: self.frames.iter().map(Frame::len).sum(),
        }
    }
}

/// Summary of a loaded sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SequenceInfo {
    pub frame_count: usize,
    pub frames_per_second: f64,
    pub kind: SourceKind,
    pub total_points: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_invalid_rate_uses_default() {
        let seq = FrameSequence::new(vec![Frame::empty()], 0.0, SourceKind::CompressedVideo);
        assert_eq!(seq.frames_per_second(), 30.0);
        let seq = FrameSequence::new(vec![Frame::empty()], -2.0, SourceKind::CompressedVideo);
        assert_eq!(seq.frames_per_second(), 30.0);
    }

    #[test]
    fn test_with_frame_rate_shares_frames() {
        let seq = FrameSequence::new(vec![Frame::empty(); 3], 30.0, SourceKind::CompressedVideo);
        let faster = seq.clone().with_frame_rate(60.0);
        assert_eq!(faster.frames_per_second(), 60.0);
        assert_eq!(faster.len(), 3);
        assert_eq!(faster.clone().with_frame_rate(f64::NAN).frames_per_second(), 60.0);
        assert_eq!(seq.frames_per_second(), 30.0);
    }

    #[test]
    fn test_period() {
        let seq = FrameSequence::new(vec![Frame::empty()], 4.0, SourceKind::CompressedVideo);
        assert_eq!(seq.period(), Duration::from_millis(250));

        let fast = FrameSequence::new(vec![Frame::empty()], 1.0e9, SourceKind::CompressedVideo);
        assert_eq!(fast.period(), MIN_PERIOD);

        let slow = FrameSequence::new(vec![Frame::empty()], 1.0e-300, SourceKind::CompressedVideo);
        assert_eq!(slow.period(), MAX_PERIOD);
    }

    #[test]
    fn test_sequence_bounds_and_info() {
        let seq = FrameSequence::new(
            vec![
                Frame::new(vec![Vec3::ZERO, Vec3::ONE]),
                Frame::empty(),
                Frame::new(vec![Vec3::splat(-3.0)]),
            ],
            10.0,
            SourceKind::CompressedVideo,
        );
        let bounds = seq.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::splat(-3.0));
        assert_eq!(bounds.max, Vec3::ONE);

        let info = seq.info();
        assert_eq!(info.frame_count, 3);
        assert_eq!(info.total_points, 3);
        assert_eq!(info.kind, SourceKind::CompressedVideo);
    }

    #[test]
    fn test_snapshot() {
        let seq = FrameSequence::snapshot(Frame::new(vec![Vec3::ONE]));
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.kind(), SourceKind::StaticSnapshot);
        assert_eq!(seq.frames_per_second(), 30.0);
    }
}
