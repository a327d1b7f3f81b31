//! Playback state machine, free of timers and threads.

use crate::sequence::{FrameSequence, SourceKind};
use reel_data::Frame;
use thiserror::Error;
use tracing::debug;

/// Errors from playback commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("No frame sequence is loaded")]
    NothingLoaded,

    #[error("Playback is already running")]
    AlreadyPlaying,

    #[error("Playback scheduler has shut down")]
    SchedulerClosed,
}

/// Lifecycle phase of a playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// No (non-empty) sequence loaded.
    Idle,
    /// Advancing on every tick.
    Playing,
    /// Sequence loaded, not advancing. The index is kept.
    Stopped,
}

/// Snapshot of the playback state handed to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub current_frame_index: usize,
    pub is_playing: bool,
    /// `None` while idle.
    pub source_kind: Option<SourceKind>,
    pub phase: PlaybackPhase,
    pub frame_count: usize,
}

/// Current frame index and play/stop state over a held sequence.
///
/// `current_frame_index < frame_count` whenever a sequence is held, and
/// playing implies a non-empty sequence.
#[derive(Debug)]
pub struct Playback {
    sequence: Option<FrameSequence>,
    index: usize,
    phase: PlaybackPhase,
}

impl Playback {
    pub fn new() -> Self {
        Self {
            sequence: None,
            index: 0,
            phase: PlaybackPhase::Idle,
        }
    }

    /// Replace the held sequence wholesale and rewind.
    ///
    /// Ends in `Stopped`, or `Idle` when the sequence is empty.
    pub fn load(&mut self, sequence: FrameSequence) -> PlaybackPhase {
        self.index = 0;
        if sequence.is_empty() {
            self.sequence = None;
            self.phase = PlaybackPhase::Idle;
        } else {
            debug!("Loaded sequence of {} frames", sequence.len());
            self.sequence = Some(sequence);
            self.phase = PlaybackPhase::Stopped;
        }
        self.phase
    }

    /// Drop the held sequence and go idle.
    pub fn clear(&mut self) {
        self.sequence = None;
        self.index = 0;
        self.phase = PlaybackPhase::Idle;
    }

    /// Begin playing from frame 0 and return it for immediate display.
    pub fn start(&mut self) -> Result<(usize, &Frame), PlaybackError> {
        match self.phase {
            PlaybackPhase::Playing => return Err(PlaybackError::AlreadyPlaying),
            PlaybackPhase::Idle => return Err(PlaybackError::NothingLoaded),
            PlaybackPhase::Stopped => {}
        }
        let sequence = self.sequence.as_ref().ok_or(PlaybackError::NothingLoaded)?;
        let frame = sequence.frame(0).ok_or(PlaybackError::NothingLoaded)?;
        self.index = 0;
        self.phase = PlaybackPhase::Playing;
        Ok((0, frame))
    }

    /// Step to the next frame, wrapping at the end. Only while playing.
    pub fn advance(&mut self) -> Option<(usize, &Frame)> {
        if self.phase != PlaybackPhase::Playing {
            return None;
        }
        let sequence = self.sequence.as_ref()?;
        self.index = (self.index + 1) % sequence.len();
        sequence.frame(self.index).map(|frame| (self.index, frame))
    }

    /// Stop advancing, keeping the index. Returns whether playback was running.
    pub fn stop(&mut self) -> bool {
        if self.phase != PlaybackPhase::Playing {
            return false;
        }
        self.phase = PlaybackPhase::Stopped;
        true
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn sequence(&self) -> Option<&FrameSequence> {
        self.sequence.as_ref()
    }

    pub fn frame_count(&self) -> usize {
        self.sequence.as_ref().map_or(0, FrameSequence::len)
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.sequence.as_ref()?.frame(self.index)
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            current_frame_index: self.index,
            is_playing: self.phase == PlaybackPhase::Playing,
            source_kind: self.sequence.as_ref().map(FrameSequence::kind),
            phase: self.phase,
            frame_count: self.frame_count(),
        }
    }
}

impl Default for Playback {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use proptest::prelude::*;

    fn sequence(len: usize) -> FrameSequence {
        let frames = (0..len)
            .map(|i| Frame::new(vec![Vec3::splat(i as f32)]))
            .collect();
        FrameSequence::new(frames, 30.0, SourceKind::CompressedVideo)
    }

    #[test]
    fn test_new_is_idle() {
        let playback = Playback::new();
        let state = playback.state();
        assert_eq!(state.phase, PlaybackPhase::Idle);
        assert!(!state.is_playing);
        assert_eq!(state.source_kind, None);
        assert_eq!(state.frame_count, 0);
    }

    #[test]
    fn test_load_empty_goes_idle() {
        let mut playback = Playback::new();
        playback.load(sequence(3));
        assert_eq!(playback.load(sequence(0)), PlaybackPhase::Idle);
        assert_eq!(playback.start().unwrap_err(), PlaybackError::NothingLoaded);
    }

    #[test]
    fn test_start_emits_first_frame() {
        let mut playback = Playback::new();
        assert_eq!(playback.load(sequence(5)), PlaybackPhase::Stopped);
        let (index, frame) = playback.start().unwrap();
        assert_eq!(index, 0);
        assert_eq!(frame.points()[0], Vec3::ZERO);
        assert!(playback.state().is_playing);
        assert_eq!(playback.start().unwrap_err(), PlaybackError::AlreadyPlaying);
    }

    #[test]
    fn test_advance_wraps() {
        let mut playback = Playback::new();
        playback.load(sequence(3));
        playback.start().unwrap();
        let indices: Vec<usize> = (0..7).map(|_| playback.advance().unwrap().0).collect();
        assert_eq!(indices, [1, 2, 0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_advance_requires_playing() {
        let mut playback = Playback::new();
        assert!(playback.advance().is_none());
        playback.load(sequence(3));
        assert!(playback.advance().is_none());
        assert_eq!(playback.state().current_frame_index, 0);
    }

    #[test]
    fn test_stop_keeps_index_and_restart_rewinds() {
        let mut playback = Playback::new();
        playback.load(sequence(5));
        playback.start().unwrap();
        playback.advance();
        playback.advance();
        assert!(playback.stop());
        assert!(!playback.stop());

        let state = playback.state();
        assert_eq!(state.phase, PlaybackPhase::Stopped);
        assert_eq!(state.current_frame_index, 2);
        assert_eq!(playback.current_frame().unwrap().points()[0], Vec3::splat(2.0));

        assert_eq!(playback.start().unwrap().0, 0);
        assert_eq!(playback.state().current_frame_index, 0);
    }

    #[test]
    fn test_load_replaces_and_rewinds() {
        let mut playback = Playback::new();
        playback.load(sequence(5));
        playback.start().unwrap();
        playback.advance();
        assert_eq!(playback.load(sequence(2)), PlaybackPhase::Stopped);
        let state = playback.state();
        assert_eq!(state.current_frame_index, 0);
        assert_eq!(state.frame_count, 2);
        assert!(!state.is_playing);
    }

    #[test]
    fn test_clear() {
        let mut playback = Playback::new();
        playback.load(sequence(2));
        playback.start().unwrap();
        playback.clear();
        assert_eq!(playback.state().phase, PlaybackPhase::Idle);
        assert!(playback.current_frame().is_none());
    }

    proptest! {
        #[test]
        fn prop_index_after_ticks(len in 1usize..12, ticks in 0usize..100) {
            let mut playback = Playback::new();
            playback.load(sequence(len));
            playback.start().unwrap();
            for _ in 0..ticks {
                playback.advance();
            }
            let state = playback.state();
            prop_assert_eq!(state.current_frame_index, ticks % len);
            prop_assert!(state.current_frame_index < state.frame_count);
        }
    }
}
