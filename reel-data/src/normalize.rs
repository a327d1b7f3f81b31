//! Geometry normalization into the renderer's coordinate convention.
//!
//! Each frame is re-centered on its own bounding-box center, then the z axis
//! is optionally mirrored. Centering is independent per frame, so content
//! whose bounds drift will appear to shift between frames; a sequence-wide
//! center can be supplied through [`Normalizer::normalize_about`].

use crate::types::{Frame, Point};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Fixed axis correction applied after centering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Normalizer {
    /// Mirror the z coordinate (capture space faces the opposite way).
    pub flip_z: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self { flip_z: true }
    }
}

impl Normalizer {
    pub fn new(flip_z: bool) -> Self {
        Self { flip_z }
    }

    /// Center `frame` on its bounding-box center and apply the axis correction.
    ///
    /// An empty frame is returned unchanged.
    pub fn normalize(&self, frame: &Frame) -> Frame {
        match frame.bounds() {
            Some(bounds) => self.normalize_about(frame, bounds.center()),
            None => frame.clone(),
        }
    }

    /// Translate `frame` so that `center` lands on the origin, then apply the
    /// axis correction.
    pub fn normalize_about(&self, frame: &Frame, center: Vec3) -> Frame {
        if frame.is_empty() {
            return frame.clone();
        }
        let sign = self.axis_signs();
        frame
            .points()
            .iter()
            .map(|&p| (p - center) * sign)
            .collect()
    }

    fn axis_signs(&self) -> Point {
        Vec3::new(1.0, 1.0, if self.flip_z { -1.0 } else { 1.0 })
    }
}
