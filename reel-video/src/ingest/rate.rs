//! Sidecar frame-rate descriptor.
//!
//! A recorded video directory may carry a small JSON record such as
//! `{"frameRate": 24.0}`. Any problem reading it falls back to
//! [`DEFAULT_FRAMES_PER_SECOND`]; it is never an error.

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Playback rate used when no usable descriptor is found.
pub const DEFAULT_FRAMES_PER_SECOND: f64 = 30.0;

#[derive(Debug, Deserialize)]
struct RateDescriptor {
    #[serde(rename = "frameRate", alias = "fps", default)]
    frame_rate: Option<f64>,
}

/// A rate is usable only if it is finite and strictly positive.
pub fn effective_rate(rate: Option<f64>) -> f64 {
    match rate {
        Some(fps) if fps.is_finite() && fps > 0.0 => fps,
        Some(fps) => {
            warn!("Ignoring invalid frame rate {}; using {}", fps, DEFAULT_FRAMES_PER_SECOND);
            DEFAULT_FRAMES_PER_SECOND
        }
        None => DEFAULT_FRAMES_PER_SECOND,
    }
}

/// Extract the frame rate from descriptor JSON, without validation.
pub fn parse_rate_descriptor(json: &str) -> Option<f64> {
    match serde_json::from_str::<RateDescriptor>(json) {
        Ok(descriptor) => descriptor.frame_rate,
        Err(e) => {
            warn!("Unreadable rate descriptor: {}", e);
            None
        }
    }
}

/// Frame rate for the video in `directory`, read from `file_name`.
pub fn read_frame_rate(directory: &Path, file_name: &str) -> f64 {
    let path = directory.join(file_name);
    let rate = match std::fs::read_to_string(&path) {
        Ok(json) => parse_rate_descriptor(&json),
        Err(e) => {
            debug!("No rate descriptor at {}: {}", path.display(), e);
            None
        }
    };
    effective_rate(rate)
}
