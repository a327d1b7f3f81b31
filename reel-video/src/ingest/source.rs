//! Frame source resolution: turning a path into an ordered list of frame handles.
//!
//! Video frames are ordered by file name alone (byte-wise ascending). There
//! is no embedded frame index, so writers must zero-pad per-frame names:
//! `f2.drc` sorts after `f10.drc`.

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Extension of single-file snapshots handled by the text parser.
pub const SNAPSHOT_EXTENSION: &str = "ply";

/// Errors that can occur while resolving a frame source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported source: {}", .0.display())]
    Unsupported(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SourceError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Naming conventions of a recorded video directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    /// Sidecar file holding the frame rate, looked up inside the video directory.
    pub rate_file: String,
    /// Substring identifying video directories when listing a library root.
    pub bundle_suffix: String,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            rate_file: "metadata.json".to_string(),
            bundle_suffix: ".drc.bundle".to_string(),
        }
    }
}

/// One decodable frame payload on storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHandle {
    /// Position of this frame in the sequence.
    pub index: usize,
    pub path: PathBuf,
}

/// What a path turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    /// A single PLY text document.
    Snapshot { path: PathBuf },
    /// Codec-compressed frames. `directory` is set when the frames came from
    /// a video directory, which is also where the rate descriptor lives.
    Video {
        directory: Option<PathBuf>,
        handles: Vec<FrameHandle>,
    },
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension() == Some(OsStr::new(extension.trim_start_matches('.')))
}

/// List the frame payloads in `directory` carrying `extension`, sorted by
/// file name ascending.
pub fn enumerate_frames(directory: &Path, extension: &str) -> Result<Vec<FrameHandle>, SourceError> {
    let entries = std::fs::read_dir(directory).map_err(|e| SourceError::io(directory, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SourceError::io(directory, e))?;
        let path = entry.path();
        if path.is_file() && has_extension(&path, extension) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    debug!(
        "Enumerated {} '{}' frames in {}",
        paths.len(),
        extension,
        directory.display()
    );
    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| FrameHandle { index, path })
        .collect())
}

/// Classify `path`: a directory is a video, a `.ply` file is a snapshot and a
/// file with the codec extension is a one-frame video.
pub fn resolve_source(path: &Path, extension: &str) -> Result<ResolvedSource, SourceError> {
    if path.is_dir() {
        let handles = enumerate_frames(path, extension)?;
        return Ok(ResolvedSource::Video {
            directory: Some(path.to_path_buf()),
            handles,
        });
    }
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }
    if has_extension(path, SNAPSHOT_EXTENSION) {
        return Ok(ResolvedSource::Snapshot {
            path: path.to_path_buf(),
        });
    }
    if has_extension(path, extension) {
        return Ok(ResolvedSource::Video {
            directory: None,
            handles: vec![FrameHandle {
                index: 0,
                path: path.to_path_buf(),
            }],
        });
    }
    Err(SourceError::Unsupported(path.to_path_buf()))
}

/// List recorded video directories directly under `root`, sorted by name.
pub fn discover_videos(root: &Path, options: &SourceOptions) -> Result<Vec<PathBuf>, SourceError> {
    let entries = std::fs::read_dir(root).map_err(|e| SourceError::io(root, e))?;

    let mut videos = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SourceError::io(root, e))?;
        let path = entry.path();
        let is_bundle = path
            .file_name()
            .and_then(OsStr::to_str)
            .is_some_and(|name| name.contains(&options.bundle_suffix));
        if is_bundle && path.is_dir() {
            videos.push(path);
        }
    }
    videos.sort();
    Ok(videos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("reel_source_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn names(handles: &[FrameHandle]) -> Vec<String> {
        handles
            .iter()
            .map(|h| h.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_enumerate_sorts_and_filters() {
        let dir = scratch_dir("enumerate");
        for name in ["f02.drc", "f00.drc", "notes.txt", "f01.drc", "metadata.json"] {
            fs::write(dir.join(name), b"x").unwrap();
        }
        fs::create_dir(dir.join("nested.drc")).unwrap();

        let handles = enumerate_frames(&dir, "drc").unwrap();
        assert_eq!(names(&handles), ["f00.drc", "f01.drc", "f02.drc"]);
        assert_eq!(
            handles.iter().map(|h| h.index).collect::<Vec<_>>(),
            [0, 1, 2]
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_enumerate_is_lexicographic_not_numeric() {
        let dir = scratch_dir("lexicographic");
        for name in ["f2.drc", "f10.drc", "f1.drc"] {
            fs::write(dir.join(name), b"x").unwrap();
        }

        let handles = enumerate_frames(&dir, ".drc").unwrap();
        assert_eq!(names(&handles), ["f1.drc", "f10.drc", "f2.drc"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_resolve_kinds() {
        let dir = scratch_dir("resolve");
        let ply = dir.join("cloud.ply");
        let drc = dir.join("cloud.drc");
        let other = dir.join("cloud.obj");
        for path in [&ply, &drc, &other] {
            fs::write(path, b"x").unwrap();
        }

        assert_eq!(
            resolve_source(&ply, "drc").unwrap(),
            ResolvedSource::Snapshot { path: ply.clone() }
        );
        match resolve_source(&drc, "drc").unwrap() {
            ResolvedSource::Video { directory, handles } => {
                assert!(directory.is_none());
                assert_eq!(handles, vec![FrameHandle { index: 0, path: drc.clone() }]);
            }
            other => panic!("unexpected {other:?}"),
        }
        match resolve_source(&dir, "drc").unwrap() {
            ResolvedSource::Video { directory, handles } => {
                assert_eq!(directory, Some(dir.clone()));
                assert_eq!(handles.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            resolve_source(&other, "drc"),
            Err(SourceError::Unsupported(_))
        ));
        assert!(matches!(
            resolve_source(&dir.join("missing.ply"), "drc"),
            Err(SourceError::NotFound(_))
        ));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_discover_videos() {
        let root = scratch_dir("discover");
        fs::create_dir(root.join("b.drc.bundle")).unwrap();
        fs::create_dir(root.join("a.drc.bundle")).unwrap();
        fs::create_dir(root.join("plain")).unwrap();
        fs::write(root.join("c.drc.bundle"), b"not a directory").unwrap();

        let videos = discover_videos(&root, &SourceOptions::default()).unwrap();
        assert_eq!(videos, vec![root.join("a.drc.bundle"), root.join("b.drc.bundle")]);

        fs::remove_dir_all(&root).unwrap();
    }
}
