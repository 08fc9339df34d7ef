//! Inputs the composer reads besides the plan: resolved graphic files and
//! descriptors of the source video and background music.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Image extensions recognized when discovering graphics on disk.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Graphic plan index → generated image file.
///
/// Only indices whose generation succeeded are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetMap {
    entries: BTreeMap<usize, PathBuf>,
}

impl AssetMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, graphic_index: usize, path: impl Into<PathBuf>) {
        self.entries.insert(graphic_index, path.into());
    }

    pub fn get(&self, graphic_index: usize) -> Option<&Path> {
        self.entries.get(&graphic_index).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Path)> {
        self.entries.iter().map(|(i, p)| (*i, p.as_path()))
    }

    /// Scan `dir` for files named `graphic_{i}.{ext}` or `graphic_{i}_*.{ext}`.
    ///
    /// When several files match one index, the lexicographically last name
    /// wins, which is the newest for timestamped names.
    pub fn discover(dir: impl AsRef<Path>, graphic_count: usize) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        let mut map = Self::new();
        if !dir.is_dir() {
            return Ok(map);
        }

        let mut names: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_image_extension(path))
            .collect();
        names.sort();

        for path in names {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(index) = graphic_index_from_stem(stem) {
                if index < graphic_count {
                    map.entries.insert(index, path);
                }
            }
        }
        Ok(map)
    }

    /// Drop entries whose file no longer exists, returning their indices.
    pub fn retain_existing(&mut self) -> Vec<usize> {
        let missing: Vec<usize> = self
            .entries
            .iter()
            .filter(|(_, path)| !path.exists())
            .map(|(i, _)| *i)
            .collect();
        for index in &missing {
            self.entries.remove(index);
        }
        missing
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Parse `graphic_{i}` or `graphic_{i}_{anything}`.
fn graphic_index_from_stem(stem: &str) -> Option<usize> {
    let rest = stem.strip_prefix("graphic_")?;
    let digits = rest.split('_').next()?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Reasons a media descriptor is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MediaError {
    #[error("source duration must be positive and finite, got {0}")]
    InvalidDuration(f64),

    #[error("frame size must be non-zero, got {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },
}

/// The decodable source video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceInfo {
    path: PathBuf,
    duration: f64,
    width: u32,
    height: u32,
    has_audio: bool,
}

impl SourceInfo {
    pub fn new(
        path: impl Into<PathBuf>,
        duration: f64,
        width: u32,
        height: u32,
        has_audio: bool,
    ) -> Result<Self, MediaError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(MediaError::InvalidDuration(duration));
        }
        if width == 0 || height == 0 {
            return Err(MediaError::EmptyFrame { width, height });
        }
        Ok(Self {
            path: path.into(),
            duration,
            width,
            height,
            has_audio,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length in seconds; always positive.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn has_audio(&self) -> bool {
        self.has_audio
    }
}

/// A background music file with its probed length.
///
/// The duration is not validated here: an unusable duration is resolved by
/// the audio mix planner, which then treats the music as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicSource {
    pub path: PathBuf,
    pub duration: f64,
}

impl MusicSource {
    pub fn new(path: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            path: path.into(),
            duration,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }
}
