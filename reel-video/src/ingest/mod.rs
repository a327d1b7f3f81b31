//! Data ingestion module
//!
//! Turns paths on storage into frame sequences:
//! - Frame source resolution and ordering
//! - The codec boundary for compressed frame payloads
//! - Sidecar rate descriptors
//! - Parallel, order-preserving assembly

pub mod assembler;
pub mod codec;
pub mod rate;
pub mod source;

pub use assembler::{AssemblerConfig, AssemblyError, FrameAssembler};
pub use codec::{DecodeError, FrameCodec, PlyCodec, decode_handle};
pub use rate::{DEFAULT_FRAMES_PER_SECOND, effective_rate, read_frame_rate};
pub use source::{
    FrameHandle, ResolvedSource, SourceError, SourceOptions, discover_videos, enumerate_frames,
    resolve_source,
};
