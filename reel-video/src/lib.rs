//! Reel Video Crate
//!
//! Point-cloud video playback: assembling per-frame payloads from storage
//! into ordered frame sequences, and presenting them on a timer.
//!
//! ## Modules
//!
//! - [`ingest`]: Source resolution, frame decoding and sequence assembly
//! - [`sequence`]: The immutable, timed frame sequence
//! - [`playback`]: Playback state, scheduling and render hand-off

pub mod ingest;
pub mod playback;
pub mod sequence;

pub use ingest::{AssemblerConfig, AssemblyError, FrameAssembler, FrameCodec, PlyCodec};
pub use playback::{
    FrameUpdate, LoadError, PlaybackScheduler, PlaybackSession, PlaybackState, RenderConsumer,
    SchedulerConfig, SchedulerHandle,
};
pub use sequence::{FrameSequence, SequenceInfo, SourceKind};
