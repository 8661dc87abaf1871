//! End-to-end pipeline runs against a scripted media toolkit.
//!
//! The fake writes every "media" file as its duration in plain text, so
//! probing a file returns exactly what the last write produced, including
//! files renamed into place after a trim.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use slideclip_media::{AudioFormat, MediaError, MediaResult, MediaToolkit};
use slideclip_models::{ClipStage, Interval, RegionOfInterest, TrimOutcome};
use slideclip_worker::{ManifestStore, Orchestrator, PipelineConfig};

#[derive(Default)]
struct FakeState {
    boundaries: Vec<f64>,
    silences: HashMap<String, Vec<Interval>>,
    failing_sources: HashSet<String>,
    stalled_detections: HashSet<String>,
    transcodes: Vec<String>,
    frames: Vec<f64>,
    source_reads: usize,
    max_source_reads: usize,
}

#[derive(Clone, Default)]
struct FakeToolkit {
    state: Arc<Mutex<FakeState>>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl FakeToolkit {
    fn new(boundaries: &[f64]) -> Self {
        let toolkit = Self::default();
        toolkit.state.lock().unwrap().boundaries = boundaries.to_vec();
        toolkit
    }

    fn silence(&self, file: &str, intervals: Vec<Interval>) {
        self.state
            .lock()
            .unwrap()
            .silences
            .insert(file.to_string(), intervals);
    }

    fn fail_transcode_of(&self, file: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_sources
            .insert(file.to_string());
    }

    fn stall_detection_of(&self, file: &str) {
        self.state
            .lock()
            .unwrap()
            .stalled_detections
            .insert(file.to_string());
    }

    fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.failing_sources.clear();
        state.stalled_detections.clear();
    }

    fn transcodes(&self) -> Vec<String> {
        self.state.lock().unwrap().transcodes.clone()
    }

    fn frames(&self) -> Vec<f64> {
        self.state.lock().unwrap().frames.clone()
    }

    fn max_source_reads(&self) -> usize {
        self.state.lock().unwrap().max_source_reads
    }

    /// Hold a read of the source video open across an await point.
    async fn read_source(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.source_reads += 1;
            state.max_source_reads = state.max_source_reads.max(state.source_reads);
        }
        tokio::task::yield_now().await;
        self.state.lock().unwrap().source_reads -= 1;
    }
}

fn write_duration(path: &Path, secs: f64) -> MediaResult<()> {
    std::fs::write(path, secs.to_string())?;
    Ok(())
}

#[async_trait]
impl MediaToolkit for FakeToolkit {
    async fn get_duration(&self, path: &Path) -> MediaResult<f64> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MediaError::unreadable(path, e.to_string()))?;
        text.trim()
            .parse()
            .map_err(|_| MediaError::unreadable(path, "no duration"))
    }

    async fn frame_size(&self, _video: &Path) -> MediaResult<(u32, u32)> {
        Ok((1920, 1080))
    }

    async fn detect_scene_boundaries(
        &self,
        _video: &Path,
        region: &RegionOfInterest,
        _sensitivity: f64,
    ) -> MediaResult<Vec<f64>> {
        assert_eq!(*region, RegionOfInterest::upper_half());
        Ok(self.state.lock().unwrap().boundaries.clone())
    }

    async fn detect_silence_intervals(
        &self,
        audio: &Path,
        _noise_db: f64,
        _min_silence_secs: f64,
    ) -> MediaResult<Vec<Interval>> {
        let state = self.state.lock().unwrap();
        let name = file_name(audio);
        if state.stalled_detections.contains(&name) {
            return Err(MediaError::Timeout(30));
        }
        Ok(state
            .silences
            .get(&name)
            .cloned()
            .unwrap_or_default())
    }

    async fn extract_frame(&self, _video: &Path, at_secs: f64, output: &Path) -> MediaResult<()> {
        self.read_source().await;
        self.state.lock().unwrap().frames.push(at_secs);
        std::fs::write(output, b"jpeg")?;
        Ok(())
    }

    async fn extract_audio_range(
        &self,
        _video: &Path,
        _start: f64,
        duration: f64,
        output: &Path,
    ) -> MediaResult<()> {
        self.read_source().await;
        write_duration(output, duration)
    }

    async fn transcode_range(
        &self,
        audio: &Path,
        lead_trim: f64,
        keep_duration: f64,
        format: AudioFormat,
        output: &Path,
    ) -> MediaResult<()> {
        let source = file_name(audio);
        {
            let mut state = self.state.lock().unwrap();
            state.transcodes.push(source.clone());
            if state.failing_sources.contains(&source) {
                return Err(MediaError::transcode_failed(format!(
                    "scripted failure for {}",
                    source
                )));
            }
        }

        let available = self.get_duration(audio).await?;
        assert!(lead_trim + keep_duration <= available + 1e-9);
        assert_eq!(AudioFormat::from_path(output), Some(format));
        write_duration(output, keep_duration)
    }
}

struct Fixture {
    _dir: TempDir,
    video: PathBuf,
    out: PathBuf,
}

impl Fixture {
    fn new(source_duration: f64) -> Self {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("talk.mp4");
        std::fs::write(&video, source_duration.to_string()).unwrap();
        let out = dir.path().join("talk");
        Self {
            _dir: dir,
            video,
            out,
        }
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            output_dir: self.out.clone(),
            ..Default::default()
        }
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.out.join(name)).unwrap()
    }

    fn leftover_temporaries(&self) -> Vec<String> {
        std::fs::read_dir(&self.out)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(".slideclip-") || name.starts_with(".tmp"))
            .collect()
    }
}

fn closed(start: f64, end: f64) -> Interval {
    Interval::new(start, end).unwrap()
}

/// Three sections: 10s, 12s and 8s, with scene boundaries in noisy order.
fn scripted_toolkit() -> FakeToolkit {
    let toolkit = FakeToolkit::new(&[22.0, 10.0, 10.0004, 10.0]);
    toolkit.silence("section_001.wav", vec![closed(0.0, 1.0), closed(8.5, 10.0)]);
    toolkit.silence("section_002.mp3", vec![closed(0.0, 0.15)]);
    toolkit.silence("section_003.mp3", vec![Interval::open(7.0).unwrap()]);
    toolkit
}

#[tokio::test]
async fn test_full_run() {
    let fixture = Fixture::new(30.0);
    let toolkit = scripted_toolkit();
    let orchestrator = Orchestrator::new(toolkit.clone(), fixture.config());

    let summary = orchestrator.run(&fixture.video).await.unwrap();

    assert!(!summary.has_failures());
    assert_eq!(summary.clips, 3);
    assert_eq!(summary.original_duration, 30.0);
    assert!((summary.current_duration - (7.7 + 12.0 + 7.1)).abs() < 1e-9);
    assert!((summary.seconds_saved() - 3.2).abs() < 1e-9);
    assert_eq!(summary.steps.len(), 3);
    assert_eq!(summary.steps[0].processed, 3);

    let manifest = ManifestStore::new(&fixture.out).load().await.unwrap();
    let sections: Vec<u32> = manifest.iter().map(|c| c.section).collect();
    assert_eq!(sections, vec![1, 2, 3]);
    assert!(manifest.iter().all(|c| c.is_final() && c.failure.is_none()));

    // Lead and tail silence trimmed during conversion, nothing more in cleanup
    let first = manifest.get(1).unwrap();
    assert_eq!((first.start_time, first.end_time), (0.0, 10.0));
    assert_eq!(first.audio, "section_001.mp3");
    assert!((first.trim_start() - 0.9).abs() < 1e-9);
    assert!((first.trim_end() - 1.4).abs() < 1e-9);
    assert!((first.duration - 7.7).abs() < 1e-9);
    assert_eq!(
        first.ledger.pass(2).unwrap().outcome,
        TrimOutcome::NothingToTrim
    );
    assert_eq!(first.ledger.passes().len(), 2);

    // Cleanup trim under the significance threshold is recorded, not applied
    let second = manifest.get(2).unwrap();
    assert_eq!(second.duration, 12.0);
    assert_eq!(second.trim_start(), 0.0);
    assert_eq!(
        second.ledger.pass(2).unwrap().outcome,
        TrimOutcome::BelowThreshold
    );

    // Open trailing silence removed in place during cleanup
    let third = manifest.get(3).unwrap();
    assert!((third.trim_end() - 0.9).abs() < 1e-9);
    assert!((third.duration - 7.1).abs() < 1e-9);
    let on_disk: f64 = fixture.read("section_003.mp3").parse().unwrap();
    assert!((on_disk - 7.1).abs() < 1e-9);

    // Images captured just after each segment start
    let frames = toolkit.frames();
    assert_eq!(frames.len(), 3);
    assert!((frames[1] - 10.3).abs() < 1e-9);

    // Three conversions and one in-place cleanup
    assert_eq!(
        toolkit.transcodes(),
        vec![
            "section_001.wav",
            "section_002.wav",
            "section_003.wav",
            "section_003.mp3"
        ]
    );

    let html = fixture.read("index.html");
    for clip in manifest.iter() {
        assert!(html.contains(&format!("src=\"{}\"", clip.image)));
        assert!(html.contains(&format!("src=\"{}\"", clip.audio)));
        assert!(fixture.out.join(&clip.image).exists());
        assert!(fixture.out.join(&clip.audio).exists());
    }
    assert!(!html.contains(".wav"));
    assert!(fixture.leftover_temporaries().is_empty());
}

#[tokio::test]
async fn test_transcode_failure_keeps_last_good_state() {
    let fixture = Fixture::new(30.0);
    let toolkit = scripted_toolkit();
    toolkit.fail_transcode_of("section_002.wav");
    let orchestrator = Orchestrator::new(toolkit.clone(), fixture.config());

    let summary = orchestrator.run(&fixture.video).await.unwrap();

    assert!(summary.has_failures());
    assert_eq!(summary.failed_sections, vec![2]);
    assert_eq!(summary.steps[1].failed, vec![2]);

    let manifest = ManifestStore::new(&fixture.out).load().await.unwrap();
    let failed = manifest.get(2).unwrap();
    assert_eq!(failed.stage, ClipStage::Extracted);
    assert_eq!(failed.audio, "section_002.wav");
    assert!(failed.ledger.passes().is_empty());
    assert!(failed
        .failure
        .as_deref()
        .unwrap()
        .contains("scripted failure"));

    assert_eq!(fixture.read("section_002.wav"), "12");
    assert!(!fixture.out.join("section_002.mp3").exists());
    assert!(fixture.leftover_temporaries().is_empty());

    // The other clips are unaffected
    assert!(manifest.get(1).unwrap().is_final());
    assert!(manifest.get(3).unwrap().is_final());

    // The page only references files that exist
    let html = fixture.read("index.html");
    assert!(html.contains("section_002.wav"));
    assert!(html.contains("audio/wav"));
}

#[tokio::test]
async fn test_detection_timeout_fails_only_that_clip() {
    let fixture = Fixture::new(30.0);
    let toolkit = scripted_toolkit();
    toolkit.stall_detection_of("section_001.wav");
    let orchestrator = Orchestrator::new(toolkit.clone(), fixture.config());

    let summary = orchestrator.run(&fixture.video).await.unwrap();

    assert_eq!(summary.failed_sections, vec![1]);
    assert_eq!(summary.steps[1].failed, vec![1]);
    assert_eq!(summary.steps[1].processed, 2);

    let manifest = ManifestStore::new(&fixture.out).load().await.unwrap();
    let stalled = manifest.get(1).unwrap();
    assert_eq!(stalled.stage, ClipStage::Extracted);
    assert_eq!(stalled.audio, "section_001.wav");
    assert!(stalled.failure.as_deref().unwrap().contains("timed out"));
    assert!(manifest.get(2).unwrap().is_final());
    assert!(manifest.get(3).unwrap().is_final());
    assert!(fixture.out.join("index.html").exists());

    // A later run picks the clip back up
    toolkit.clear_failures();
    let summary = Orchestrator::new(toolkit.clone(), fixture.config())
        .run(&fixture.video)
        .await
        .unwrap();
    assert!(!summary.has_failures());
    let manifest = ManifestStore::new(&fixture.out).load().await.unwrap();
    assert!(manifest.iter().all(|c| c.is_final() && c.failure.is_none()));
}

#[tokio::test]
async fn test_resume_only_processes_unfinished_clips() {
    let fixture = Fixture::new(30.0);
    let toolkit = scripted_toolkit();
    toolkit.fail_transcode_of("section_002.wav");

    let first_run = Orchestrator::new(toolkit.clone(), fixture.config());
    first_run.run(&fixture.video).await.unwrap();
    let before = ManifestStore::new(&fixture.out).load().await.unwrap();

    toolkit.clear_failures();
    let attempts_before = toolkit.transcodes().len();
    let second_run = Orchestrator::new(toolkit.clone(), fixture.config());
    assert_ne!(first_run.run_id(), second_run.run_id());
    let summary = second_run.run(&fixture.video).await.unwrap();

    assert!(!summary.has_failures());
    assert_eq!(summary.steps[0].processed, 0);
    assert_eq!(summary.steps[0].skipped, 3);
    assert_eq!(summary.steps[1].processed, 1);
    assert_eq!(summary.steps[1].skipped, 2);

    let after = ManifestStore::new(&fixture.out).load().await.unwrap();
    assert!(after.iter().all(|c| c.is_final()));
    assert_eq!(after.get(1), before.get(1));
    assert_eq!(after.get(3), before.get(3));
    assert_eq!(after.get(2).unwrap().audio, "section_002.mp3");

    // Only section 2 was retried; its cleanup trim is below the threshold
    let transcodes = toolkit.transcodes();
    assert_eq!(&transcodes[attempts_before..], &["section_002.wav"]);
}

#[tokio::test]
async fn test_rerun_after_completion_is_a_noop() {
    let fixture = Fixture::new(30.0);
    let toolkit = scripted_toolkit();

    Orchestrator::new(toolkit.clone(), fixture.config())
        .run(&fixture.video)
        .await
        .unwrap();
    let before = ManifestStore::new(&fixture.out).load().await.unwrap();
    let transcodes = toolkit.transcodes().len();

    let summary = Orchestrator::new(toolkit.clone(), fixture.config())
        .run(&fixture.video)
        .await
        .unwrap();

    assert_eq!(toolkit.transcodes().len(), transcodes);
    assert!(summary.steps.iter().all(|s| s.processed == 0));
    let after = ManifestStore::new(&fixture.out).load().await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_steps_run_separately() {
    let fixture = Fixture::new(30.0);
    let toolkit = scripted_toolkit();
    let orchestrator = Orchestrator::new(toolkit.clone(), fixture.config());
    let store = ManifestStore::new(&fixture.out);

    orchestrator.extract(&fixture.video).await.unwrap();
    let manifest = store.load().await.unwrap();
    assert_eq!(manifest.sections_at(ClipStage::Extracted), vec![1, 2, 3]);
    assert!(!fixture.out.join("index.html").exists());

    // Cleanup before conversion has nothing to do
    let cleanup = orchestrator.cleanup().await.unwrap();
    assert_eq!(cleanup.processed, 0);
    assert_eq!(cleanup.skipped, 3);

    let conversion = orchestrator.convert().await.unwrap();
    assert_eq!(conversion.processed, 3);
    assert!((conversion.seconds_trimmed - 2.3).abs() < 1e-9);
    let manifest = store.load().await.unwrap();
    assert_eq!(
        manifest.sections_at(ClipStage::Trimmed { pass: 1 }),
        vec![1, 2, 3]
    );

    let cleanup = orchestrator.cleanup().await.unwrap();
    assert_eq!(cleanup.processed, 3);
    assert!((cleanup.seconds_trimmed - 0.9).abs() < 1e-9);

    orchestrator.write_player().await.unwrap();
    assert!(fixture.out.join("index.html").exists());
}

#[tokio::test]
async fn test_safety_veto_keeps_short_clip() {
    // One second of silence: both edges capped at 0.3s would leave 0.4s
    let fixture = Fixture::new(11.0);
    let toolkit = FakeToolkit::new(&[10.0]);
    toolkit.silence("section_002.wav", vec![closed(0.0, 1.0)]);

    let summary = Orchestrator::new(toolkit.clone(), fixture.config())
        .run(&fixture.video)
        .await
        .unwrap();

    assert_eq!(summary.steps[1].vetoed, 1);
    let manifest = ManifestStore::new(&fixture.out).load().await.unwrap();
    let short = manifest.get(2).unwrap();
    assert_eq!(short.duration, 1.0);
    assert_eq!(short.ledger.veto_count(), 1);
    assert_eq!(
        short.ledger.pass(1).unwrap().outcome,
        TrimOutcome::SafetyVetoApplied
    );
    assert!(short.is_final());
}

#[tokio::test]
async fn test_parallel_chunks_keep_section_order() {
    let fixture = Fixture::new(50.0);
    let toolkit = FakeToolkit::new(&[40.0, 10.0, 30.0, 20.0]);
    for section in 1..=5 {
        toolkit.silence(
            &format!("section_{:03}.wav", section),
            vec![closed(0.0, 0.6)],
        );
    }
    let config = PipelineConfig {
        max_parallel_clips: 2,
        ..fixture.config()
    };

    let summary = Orchestrator::new(toolkit.clone(), config)
        .run(&fixture.video)
        .await
        .unwrap();
    assert_eq!(summary.clips, 5);
    assert_eq!(toolkit.max_source_reads(), 1);

    let raw: serde_json::Value =
        serde_json::from_str(&fixture.read("sections_summary.json")).unwrap();
    let sections: Vec<u64> = raw
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["section"].as_u64().unwrap())
        .collect();
    assert_eq!(sections, vec![1, 2, 3, 4, 5]);
    for clip in raw.as_array().unwrap() {
        assert!((clip["trim_start"].as_f64().unwrap() - 0.5).abs() < 1e-9);
        assert!((clip["duration"].as_f64().unwrap() - 9.5).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_missing_source_video() {
    let fixture = Fixture::new(30.0);
    let orchestrator = Orchestrator::new(FakeToolkit::new(&[]), fixture.config());

    let err = orchestrator
        .run(&fixture.out.join("missing.mp4"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        slideclip_worker::PipelineError::SourceNotFound(_)
    ));
}
