//! On-disk job bundle.
//!
//! ```text
//! <job>/
//!   job.json      manifest: source, output, style
//!   plan.json     editing plan (raw model reply or canonical JSON)
//!   graphics/     generated overlay images
//!   exports/      rendered output
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::plan::EditPlan;
use crate::recovery::Recovery;
use crate::style::StyleConfig;

pub const MANIFEST_FILE: &str = "job.json";
pub const PLAN_FILE: &str = "plan.json";
pub const GRAPHICS_DIR: &str = "graphics";
pub const EXPORTS_DIR: &str = "exports";

/// Job manifest (`job.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobManifest {
    /// Schema version.
    pub version: String,

    /// Human-readable job name.
    pub name: String,

    /// Creation timestamp (RFC 3339).
    pub created_at: String,

    /// Last modified timestamp (RFC 3339).
    pub modified_at: String,

    /// Source video, relative to the job root unless absolute.
    #[serde(default)]
    pub source: Option<String>,

    /// Render target, relative to the job root unless absolute.
    #[serde(default = "default_output")]
    pub output: String,

    /// Style and feature options.
    #[serde(default)]
    pub style: StyleConfig,
}

fn default_output() -> String {
    format!("{EXPORTS_DIR}/final.mp4")
}

impl JobManifest {
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: "1.0".to_string(),
            name: name.into(),
            created_at: now.clone(),
            modified_at: now,
            source: None,
            output: default_output(),
            style: StyleConfig::default(),
        }
    }
}

/// A job bundle loaded into memory.
#[derive(Debug, Clone)]
pub struct LoadedJob {
    /// Filesystem path to the job directory.
    pub root: PathBuf,

    pub manifest: JobManifest,

    pub plan: EditPlan,
}

impl LoadedJob {
    /// Load a job from a directory.
    ///
    /// A missing `plan.json` yields an empty plan. A `plan.json` with no
    /// recoverable JSON object yields an empty plan carrying a recovery note.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, JobError> {
        let root = root.as_ref().to_path_buf();

        let manifest_path = root.join(MANIFEST_FILE);
        let manifest_json =
            std::fs::read_to_string(&manifest_path).map_err(|e| JobError::IoError {
                path: manifest_path.clone(),
                source: e,
            })?;
        let manifest: JobManifest =
            serde_json::from_str(&manifest_json).map_err(|e| JobError::ParseError {
                path: manifest_path,
                source: e,
            })?;

        let plan_path = root.join(PLAN_FILE);
        let plan = if plan_path.exists() {
            let text = std::fs::read_to_string(&plan_path).map_err(|e| JobError::IoError {
                path: plan_path.clone(),
                source: e,
            })?;
            EditPlan::from_response_text(&text).unwrap_or_else(|| {
                tracing::warn!(path = %plan_path.display(), "No JSON object in plan file");
                EditPlan {
                    recoveries: vec![Recovery::malformed(
                        "plan",
                        "no JSON object found; whole source used",
                    )],
                    ..EditPlan::default()
                }
            })
        } else {
            EditPlan::default()
        };

        Ok(Self {
            root,
            manifest,
            plan,
        })
    }

    /// Write the manifest and the canonical plan back to disk.
    pub fn save(&self) -> Result<(), JobError> {
        std::fs::create_dir_all(&self.root).map_err(|e| JobError::IoError {
            path: self.root.clone(),
            source: e,
        })?;

        let manifest_path = self.root.join(MANIFEST_FILE);
        write_json(&manifest_path, &self.manifest)?;

        let canonical = EditPlan {
            recoveries: Vec::new(),
            ..self.plan.clone()
        };
        write_json(&self.root.join(PLAN_FILE), &canonical)
    }

    /// Create a new job on disk with the standard directory structure.
    pub fn create(root: impl AsRef<Path>, name: impl Into<String>) -> Result<Self, JobError> {
        let root = root.as_ref().to_path_buf();

        if root.join(MANIFEST_FILE).exists() {
            return Err(JobError::ValidationError {
                message: format!("a job already exists at {}", root.display()),
            });
        }

        for subdir in [GRAPHICS_DIR, EXPORTS_DIR] {
            std::fs::create_dir_all(root.join(subdir)).map_err(|e| JobError::IoError {
                path: root.join(subdir),
                source: e,
            })?;
        }

        let job = Self {
            root,
            manifest: JobManifest::new(name),
            plan: EditPlan::default(),
        };
        job.save()?;
        Ok(job)
    }

    /// Resolve a manifest path against the job root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn source_path(&self) -> Option<PathBuf> {
        self.manifest.source.as_ref().map(|s| self.resolve(s))
    }

    pub fn music_path(&self) -> Option<PathBuf> {
        self.manifest.style.music.as_ref().map(|m| self.resolve(m))
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.manifest.output)
    }

    pub fn graphics_dir(&self) -> PathBuf {
        self.root.join(GRAPHICS_DIR)
    }

    /// Validate that all referenced input files exist.
    pub fn validate_sources(&self) -> Vec<String> {
        let mut errors = vec![];

        match self.source_path() {
            None => errors.push("No source video set in job.json".to_string()),
            Some(path) if !path.exists() => {
                errors.push(format!("Source video missing: {}", path.display()))
            }
            Some(_) => {}
        }

        if let Some(path) = self.music_path() {
            if !path.exists() {
                errors.push(format!("Music track missing: {}", path.display()));
            }
        }

        errors
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), JobError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| JobError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, json).map_err(|e| JobError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Errors that can occur when working with job bundles.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid job: {message}")]
    ValidationError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_defaults_for_minimal_file() {
        let manifest: JobManifest = serde_json::from_str(
            r#"{ "version": "1.0", "name": "n", "created_at": "x", "modified_at": "x" }"#,
        )
        .unwrap();
        assert_eq!(manifest.output, "exports/final.mp4");
        assert!(manifest.source.is_none());
        assert_eq!(manifest.style, StyleConfig::default());
    }

    #[test]
    fn test_resolve_keeps_absolute_paths() {
        let job = LoadedJob {
            root: PathBuf::from("/jobs/demo"),
            manifest: JobManifest::new("demo"),
            plan: EditPlan::default(),
        };
        assert_eq!(job.resolve("in.mp4"), PathBuf::from("/jobs/demo/in.mp4"));
        assert_eq!(job.resolve("/media/in.mp4"), PathBuf::from("/media/in.mp4"));
        assert_eq!(job.output_path(), PathBuf::from("/jobs/demo/exports/final.mp4"));
    }

    #[test]
    fn test_validate_reports_unset_source() {
        let job = LoadedJob {
            root: PathBuf::from("/jobs/demo"),
            manifest: JobManifest::new("demo"),
            plan: EditPlan::default(),
        };
        let errors = job.validate_sources();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("No source video"));
    }
}
