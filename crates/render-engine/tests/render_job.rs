use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use autocut_common::error::{AutocutError, AutocutResult};
use autocut_composer::Composer;
use autocut_plan_model::{AssetMap, EditPlan, SourceInfo, StyleConfig};
use autocut_render_engine::{
    render_with_backend, ProgressCallback, RenderBackend, RenderJob, RenderProgress,
    RenderStage, SubtitleFormat,
};
use serde_json::json;

/// Writes a few bytes to the output, then succeeds, fails or panics.
struct ScriptedBackend {
    fail: bool,
    panic: bool,
}

impl ScriptedBackend {
    fn succeeding() -> Self {
        Self {
            fail: false,
            panic: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            panic: false,
        }
    }

    fn panicking() -> Self {
        Self {
            fail: false,
            panic: true,
        }
    }
}

impl RenderBackend for ScriptedBackend {
    fn render(&mut self, job: &RenderJob, progress: Option<ProgressCallback>) -> AutocutResult<()> {
        std::fs::write(&job.output_path, b"partial")?;
        if let Some(cb) = &progress {
            cb(RenderProgress {
                progress: 0.5,
                frames_rendered: 10,
                total_frames: 20,
                eta_secs: 1.0,
                stage: RenderStage::Rendering,
            });
        }
        if self.panic {
            panic!("encoder thread died");
        }
        if self.fail {
            return Err(AutocutError::render("encoder crashed"));
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn workspace(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("input.mp4"), b"not really a video").unwrap();
    dir
}

fn job_in(dir: &Path) -> RenderJob {
    let source = SourceInfo::new(dir.join("input.mp4"), 12.0, 640, 360, true).unwrap();
    let plan = EditPlan::from_value(&json!({
        "segments": [{"start": 0, "end": 6}],
        "captions": [{"start": 1, "end": 3, "text": "First point"}]
    }));
    let graph = Composer::with_defaults().compose(
        &plan,
        &AssetMap::new(),
        &source,
        None,
        &StyleConfig::default(),
    );
    RenderJob::new(graph, dir.join("exports").join("final.mp4"))
}

#[tokio::test]
async fn test_failed_render_removes_partial_output() {
    let dir = workspace("autocut_test_render_failure");
    let job = job_in(&dir);
    let output = job.output_path.clone();

    let err = render_with_backend(Box::new(ScriptedBackend::failing()), job, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AutocutError::Render { .. }));
    assert!(!output.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_panicking_backend_removes_partial_output() {
    let dir = workspace("autocut_test_render_panic");
    let job = job_in(&dir);
    let output = job.output_path.clone();

    let err = render_with_backend(Box::new(ScriptedBackend::panicking()), job, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AutocutError::Render { .. }));
    assert!(!output.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_successful_render_writes_sidecar_and_reports_progress() {
    let dir = workspace("autocut_test_render_success");
    let mut job = job_in(&dir);
    job.subtitles = Some(SubtitleFormat::Srt);

    let stages = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&stages);
    let callback: ProgressCallback = Box::new(move |p| seen.lock().unwrap().push(p.stage));

    let output = render_with_backend(Box::new(ScriptedBackend::succeeding()), job, Some(callback))
        .await
        .unwrap();

    assert!(output.exists());
    let srt = std::fs::read_to_string(output.with_extension("srt")).unwrap();
    assert!(srt.contains("00:00:01,000 --> 00:00:03,000\nFirst point"));
    assert_eq!(*stages.lock().unwrap(), vec![RenderStage::Rendering]);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_missing_source_is_rejected_before_rendering() {
    let dir = workspace("autocut_test_render_missing_source");
    let job = job_in(&dir);
    std::fs::remove_file(dir.join("input.mp4")).unwrap();

    let err = render_with_backend(Box::new(ScriptedBackend::succeeding()), job, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AutocutError::FileNotFound { .. }));
    let _ = std::fs::remove_dir_all(&dir);
}
