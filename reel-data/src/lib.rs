//! Reel Data Crate
//!
//! Point-cloud frame primitives, PLY parsing and geometry normalization.
//! This crate does no I/O scheduling and knows nothing about playback.

pub mod normalize;
pub mod ply;
pub mod types;

pub use normalize::Normalizer;
pub use ply::{PlyError, load_ply_positions, parse_ply_text};
pub use types::{BoundingBox, Frame, Point};
