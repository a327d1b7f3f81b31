//! Structured PLY loading for full (ASCII or binary) documents.

use crate::types::{Frame, Point};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from structured PLY loading.
#[derive(Debug, Error)]
pub enum PlyError {
    #[error("PLY parsing error: {0}")]
    Parse(String),

    #[error("Missing '{property}' at vertex {index}")]
    MissingProperty { property: &'static str, index: usize },
}

// Only the vertex element matters; faces and other elements are ignored.
#[derive(Deserialize, Debug)]
struct PlyFile {
    #[serde(rename = "vertex")]
    vertex: Vec<HashMap<String, JsonValue>>,
}

/// Load vertex positions from an in-memory PLY document.
///
/// Unlike [`parse_ply_text`](crate::ply::parse_ply_text) this validates the
/// header grammar, understands binary bodies and honours property order, and
/// it reports malformed input as an error.
pub fn load_ply_positions(bytes: &[u8]) -> Result<Frame, PlyError> {
    let ply_data: PlyFile = serde_ply::from_reader(Cursor::new(bytes)).map_err(|e| {
        warn!("Failed to parse PLY document: {}", e);
        PlyError::Parse(e.to_string())
    })?;

    fn get_f32(prop: Option<&JsonValue>) -> Option<f32> {
        prop.and_then(|v| match v {
            JsonValue::Number(n) => n.as_f64().map(|f| f as f32),
            _ => None,
        })
    }

    let mut points = Vec::with_capacity(ply_data.vertex.len());
    for (index, vertex) in ply_data.vertex.iter().enumerate() {
        let coord = |property: &'static str| {
            get_f32(vertex.get(property)).ok_or(PlyError::MissingProperty { property, index })
        };
        points.push(Point::new(coord("x")?, coord("y")?, coord("z")?));
    }

    debug!("Loaded {} vertices from PLY document", points.len());
    Ok(Frame::new(points))
}
