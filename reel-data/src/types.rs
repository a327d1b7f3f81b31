//! Core data types for point-cloud frames.
//!
//! These are CPU-side, immutable representations shared by the parser, the
//! normalizer and the playback pipeline.

use glam::Vec3;
use std::sync::Arc;

/// A point in 3D space. No identity beyond its position.
pub type Point = Vec3;

/// An ordered set of points captured at a single instant.
///
/// Insertion order is render order. The point storage is shared and never
/// mutated, so cloning a frame hands out a read-only snapshot; every
/// transformation produces a new frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    points: Arc<[Point]>,
}

impl Frame {
    /// Create a frame from an ordered list of points.
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points: points.into(),
        }
    }

    /// A frame with no points.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Axis-aligned bounds of this frame, `None` when it has no points.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.points.iter().copied())
    }

    /// A frame holding at most the first `max_points` points.
    ///
    /// Returns a cheap clone when the frame already fits.
    pub fn truncated(&self, max_points: usize) -> Self {
        if self.points.len() <= max_points {
            return self.clone();
        }
        Self::new(self.points[..max_points].to_vec())
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Point>> for Frame {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Point> for Frame {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Minimum side length used when sizing a frame for display.
const MIN_FRAMING_SIDE: f32 = 0.1;

/// Axis-aligned bounding box over a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Component-wise min/max in a single pass. `None` for an empty input.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Largest side of the box, with every side floored at 0.1 so flat or
    /// single-point clouds still get a usable viewing distance.
    pub fn framing_extent(&self) -> f32 {
        self.size().abs().max(Vec3::splat(MIN_FRAMING_SIDE)).max_element()
    }
}
