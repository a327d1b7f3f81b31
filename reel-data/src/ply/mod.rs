//! PLY file loading and parsing

mod loader;
mod text;

pub use loader::{PlyError, load_ply_positions};
pub use text::parse_ply_text;
