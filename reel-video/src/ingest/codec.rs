//! Boundary to the point-cloud compression codec.
//!
//! The codec is opaque: it receives the raw bytes of one frame payload and
//! returns its points. Implementations must be pure and thread-safe, since the
//! assembler calls them from several blocking workers at once.

use crate::ingest::source::FrameHandle;
use reel_data::{Frame, load_ply_positions};
use thiserror::Error;

/// Failure to decode a single frame payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed frame payload: {0}")]
    Malformed(String),
}

/// A point-cloud codec: compressed bytes in, one frame out.
pub trait FrameCodec: Send + Sync {
    /// File extension (without the dot) of payloads this codec decodes.
    fn extension(&self) -> &str;

    /// Decode one payload.
    fn decode(&self, bytes: &[u8]) -> Result<Frame, DecodeError>;
}

/// Read the payload behind `handle` and decode it.
pub fn decode_handle(codec: &dyn FrameCodec, handle: &FrameHandle) -> Result<Frame, DecodeError> {
    let bytes = std::fs::read(&handle.path)?;
    codec.decode(&bytes)
}

/// Codec for per-frame PLY payloads (ASCII or binary).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlyCodec;

impl FrameCodec for PlyCodec {
    fn extension(&self) -> &str {
        "ply"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Frame, DecodeError> {
        load_ply_positions(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::path::PathBuf;

    #[test]
    fn test_ply_codec_decodes_frame() {
        let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n";
        let frame = PlyCodec.decode(text.as_bytes()).unwrap();
        assert_eq!(frame.points(), &[Vec3::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn test_ply_codec_rejects_garbage() {
        assert!(matches!(
            PlyCodec.decode(b"\x00\x01garbage"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_payload_is_io_error() {
        let handle = FrameHandle {
            index: 0,
            path: PathBuf::from("/definitely/not/here/f00.ply"),
        };
        assert!(matches!(
            decode_handle(&PlyCodec, &handle),
            Err(DecodeError::Io(_))
        ));
    }
}
