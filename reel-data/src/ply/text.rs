//! Permissive line-oriented PLY text parsing.
//!
//! Only the vertex count declaration, the header terminator and the leading
//! `x y z` of each body line are looked at. Binary bodies, property
//! reordering and non-vertex elements are not supported.

use crate::types::{Frame, Point};
use tracing::debug;

const VERTEX_DECLARATION: &str = "element vertex";
const HEADER_TERMINATOR: &str = "end_header";

/// Parse a textual PLY document into a frame.
///
/// Never fails: a document without `end_header`, without a vertex count or
/// with unreadable body lines yields fewer (possibly zero) points.
pub fn parse_ply_text(text: &str) -> Frame {
    let mut lines = text.lines();
    let mut declared = 0usize;
    let mut terminated = false;

    for line in lines.by_ref() {
        if line.contains(VERTEX_DECLARATION) {
            declared = line
                .split_whitespace()
                .last()
                .and_then(|count| count.parse().ok())
                .unwrap_or(0);
        }
        if line.trim_end() == HEADER_TERMINATOR {
            terminated = true;
            break;
        }
    }

    if !terminated {
        debug!("PLY text has no end_header; returning empty frame");
        return Frame::empty();
    }

    let mut points = Vec::new();
    let mut skipped = 0usize;
    for line in lines.map(str::trim).filter(|line| !line.is_empty()).take(declared) {
        match parse_vertex(line) {
            Some(point) => points.push(point),
            None => skipped += 1,
        }
    }

    debug!(
        "Parsed PLY text: {} declared, {} points, {} skipped lines",
        declared,
        points.len(),
        skipped
    );
    Frame::new(points)
}

/// First three numeric fields of a body line. Extra fields are ignored.
fn parse_vertex(line: &str) -> Option<Point> {
    let mut coords = line
        .split_whitespace()
        .filter_map(|field| field.parse::<f32>().ok());
    let x = coords.next()?;
    let y = coords.next()?;
    let z = coords.next()?;
    Some(Point::new(x, y, z))
}
