//! Pipeline orchestration.
//!
//! Drives every clip through `Extracted → Converted → Trimmed{1} →
//! Trimmed{2} → Final`. Each pass works on a copy of the clip record and
//! only publishes it when every step succeeded, so a failed FFmpeg call
//! leaves the clip in its last successful state with the failure noted on
//! the record. Extraction runs one segment at a time against the source
//! video. The trim passes process clips in chunks of `max_parallel_clips`,
//! and the manifest is checkpointed after every chunk.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn, Instrument};

use slideclip_media::fs_utils::{commit, ensure_dir, temp_sibling};
use slideclip_media::{
    analyze_clip, apply_trim, build_segments, frame, should_transcode, AudioFormat, MediaToolkit,
    TrimPolicy,
};
use slideclip_models::{ClipRecord, ClipStage, PassEntry, Segment, TrimDecision, TrimOutcome};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::{new_run_id, ClipLogger};
use crate::manifest_store::ManifestStore;
use crate::metrics;
use crate::player;

const EXTRACT_STEP: &str = "extract";

/// One silence trimming pass over the clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimPass {
    /// Pass 1: WAV to MP3 with the conversion policy.
    Conversion,
    /// Pass 2: in-place MP3 cleanup with the cleanup policy.
    Cleanup,
}

impl TrimPass {
    pub fn number(&self) -> u8 {
        match self {
            TrimPass::Conversion => 1,
            TrimPass::Cleanup => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrimPass::Conversion => "conversion",
            TrimPass::Cleanup => "cleanup",
        }
    }

    /// Whether `clip` still needs this pass.
    pub fn is_pending(&self, clip: &ClipRecord) -> bool {
        match self {
            TrimPass::Conversion => !clip.stage.has_reached(ClipStage::Trimmed { pass: 1 }),
            TrimPass::Cleanup => {
                clip.stage.has_reached(ClipStage::Trimmed { pass: 1 }) && !clip.is_final()
            }
        }
    }

    fn policy<'a>(&self, config: &'a PipelineConfig) -> &'a TrimPolicy {
        match self {
            TrimPass::Conversion => &config.policies.conversion,
            TrimPass::Cleanup => &config.policies.cleanup,
        }
    }
}

impl std::fmt::Display for TrimPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Counters for one step of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassSummary {
    pub name: String,
    /// Clips that completed the step.
    pub processed: usize,
    /// Clips that did not need the step.
    pub skipped: usize,
    /// Sections that failed the step.
    pub failed: Vec<u32>,
    /// Clips where the planner's safety veto fired.
    pub vetoed: usize,
    /// Seconds removed by the step across all clips.
    pub seconds_trimmed: f64,
}

impl PassSummary {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Outcome of a pipeline invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub steps: Vec<PassSummary>,
    pub clips: usize,
    pub original_duration: f64,
    pub current_duration: f64,
    pub failed_sections: Vec<u32>,
    pub player: Option<PathBuf>,
}

impl RunSummary {
    /// Seconds of audio removed across all clips.
    pub fn seconds_saved(&self) -> f64 {
        (self.original_duration - self.current_duration).max(0.0)
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_sections.is_empty()
    }
}

struct ClipOutcome {
    record: ClipRecord,
    entry: Option<PassEntry>,
    error: Option<PipelineError>,
}

/// Runs the pipeline steps against one output directory.
pub struct Orchestrator<T: MediaToolkit> {
    toolkit: T,
    config: PipelineConfig,
    store: ManifestStore,
    run_id: String,
}

impl<T: MediaToolkit> Orchestrator<T> {
    pub fn new(toolkit: T, config: PipelineConfig) -> Self {
        let store = ManifestStore::new(&config.output_dir);
        Self {
            toolkit,
            config,
            store,
            run_id: new_run_id(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    fn chunk_size(&self) -> usize {
        self.config.max_parallel_clips.max(1)
    }

    fn output_path(&self, name: &str) -> PathBuf {
        self.config.output_dir.join(name)
    }

    /// Extract, convert, clean up, and write the player page.
    pub async fn run(&self, video: &Path) -> PipelineResult<RunSummary> {
        info!(run_id = %self.run_id, video = %video.display(), "Starting pipeline run");

        let extract = self.extract(video).await?;
        let conversion = self.convert().await?;
        let cleanup = self.cleanup().await?;
        let player = self.write_player().await?;

        self.summarize(vec![extract, conversion, cleanup], Some(player))
            .await
    }

    /// Split the source into segments and extract an image and WAV for each.
    ///
    /// Sections already listed in the manifest are kept as they are.
    pub async fn extract(&self, video: &Path) -> PipelineResult<PassSummary> {
        if !video.exists() {
            return Err(PipelineError::SourceNotFound(video.to_path_buf()));
        }
        ensure_dir(&self.config.output_dir).await?;

        let mut manifest = self.store.load().await?;
        let mut summary = PassSummary::new(EXTRACT_STEP);

        let duration = self.toolkit.get_duration(video).await?;
        match self.toolkit.frame_size(video).await {
            Ok((width, height)) => info!(
                video = %video.display(),
                duration,
                width,
                height,
                "Probed source video"
            ),
            Err(e) => warn!(video = %video.display(), error = %e, "Could not read frame size"),
        }

        let scene = &self.config.scene;
        let boundaries = self
            .toolkit
            .detect_scene_boundaries(video, &scene.region, scene.sensitivity)
            .await?;
        let segments = build_segments(&boundaries, duration, &self.config.segmentation)?;
        metrics::record_segments_built(segments.len());

        info!(
            run_id = %self.run_id,
            boundaries = boundaries.len(),
            segments = segments.len(),
            "Segmented source video"
        );

        let pending: Vec<Segment> = segments
            .into_iter()
            .filter(|segment| manifest.get(segment.index).is_none())
            .collect();
        summary.skipped = manifest.len();

        // Every extraction reads the source video, so segments go one at a time
        for segment in &pending {
            let logger = ClipLogger::new(&self.run_id, segment.index, EXTRACT_STEP);
            let span = logger.create_span();
            let result = async {
                logger.log_start(&format!(
                    "segment {:.3}s to {:.3}s",
                    segment.start, segment.end
                ));
                let result = self.extract_segment(video, segment).await;
                match &result {
                    Ok(record) => logger.log_completion(&format!(
                        "{} and {} ({:.3}s)",
                        record.image, record.audio, record.original_duration
                    )),
                    Err(e) => logger.log_error(&e.to_string()),
                }
                result
            }
            .instrument(span)
            .await;

            match result {
                Ok(record) => {
                    metrics::record_clip_processed(EXTRACT_STEP, record.duration);
                    summary.processed += 1;
                    manifest.upsert(record);
                    self.store.save(&manifest).await?;
                }
                Err(e) => {
                    metrics::record_clip_failed(EXTRACT_STEP);
                    summary.failed.push(segment.index);
                    if !e.is_clip_local() {
                        error!(run_id = %self.run_id, error = %e, "Extraction aborted");
                        return Err(e);
                    }
                }
            }
        }

        Ok(summary)
    }

    async fn extract_segment(&self, video: &Path, segment: &Segment) -> PipelineResult<ClipRecord> {
        let image = format!("section_{:03}.jpg", segment.index);
        let audio = format!(
            "section_{:03}.{}",
            segment.index,
            AudioFormat::Wav.extension()
        );
        let image_path = self.output_path(&image);
        let audio_path = self.output_path(&audio);

        let at = frame::capture_time(segment.start, segment.end, self.config.image_offset_secs);
        let temp = temp_sibling(&image_path)?;
        self.toolkit.extract_frame(video, at, &temp).await?;
        commit(temp, &image_path)?;

        let temp = temp_sibling(&audio_path)?;
        self.toolkit
            .extract_audio_range(video, segment.start, segment.duration(), &temp)
            .await?;
        commit(temp, &audio_path)?;

        let original_duration = match self.toolkit.get_duration(&audio_path).await {
            Ok(d) if d > 0.0 => d,
            Ok(d) => {
                warn!(section = segment.index, probed = d, "Extracted audio probed empty");
                segment.duration()
            }
            Err(e) => {
                warn!(section = segment.index, error = %e, "Could not probe extracted audio");
                segment.duration()
            }
        };

        Ok(ClipRecord::extracted(segment, image, audio, original_duration)?)
    }

    /// Pass 1: trim each extracted WAV and convert it to MP3.
    pub async fn convert(&self) -> PipelineResult<PassSummary> {
        self.run_pass(TrimPass::Conversion).await
    }

    /// Pass 2: trim remaining edge silence from each MP3 in place.
    pub async fn cleanup(&self) -> PipelineResult<PassSummary> {
        self.run_pass(TrimPass::Cleanup).await
    }

    /// Regenerate the player page from the manifest.
    pub async fn write_player(&self) -> PipelineResult<PathBuf> {
        ensure_dir(&self.config.output_dir).await?;
        let manifest = self.store.load().await?;
        player::write_player(&self.config.output_dir, &manifest)
    }

    /// Collect totals from the manifest.
    pub async fn summarize(
        &self,
        steps: Vec<PassSummary>,
        player: Option<PathBuf>,
    ) -> PipelineResult<RunSummary> {
        let manifest = self.store.load().await?;

        let mut failed_sections = manifest.failed_sections();
        failed_sections.extend(steps.iter().flat_map(|s| s.failed.iter().copied()));
        failed_sections.sort_unstable();
        failed_sections.dedup();

        let summary = RunSummary {
            run_id: self.run_id.clone(),
            steps,
            clips: manifest.len(),
            original_duration: manifest.total_original_duration(),
            current_duration: manifest.total_current_duration(),
            failed_sections,
            player,
        };

        info!(
            run_id = %summary.run_id,
            clips = summary.clips,
            original_duration = summary.original_duration,
            current_duration = summary.current_duration,
            seconds_saved = summary.seconds_saved(),
            failed = summary.failed_sections.len(),
            "Pipeline summary"
        );
        if summary.has_failures() {
            warn!(
                run_id = %summary.run_id,
                sections = ?summary.failed_sections,
                "Some sections failed"
            );
        }

        Ok(summary)
    }

    async fn run_pass(&self, pass: TrimPass) -> PipelineResult<PassSummary> {
        let mut manifest = self.store.load().await?;
        let mut summary = PassSummary::new(pass.name());

        let pending = manifest.select(|clip| pass.is_pending(clip));
        summary.skipped = manifest.len() - pending.len();

        info!(
            run_id = %self.run_id,
            pass = pass.number(),
            pending = pending.len(),
            skipped = summary.skipped,
            "Starting {} pass",
            pass
        );

        for chunk in pending.chunks(self.chunk_size()) {
            let futures = chunk.iter().cloned().map(|clip| {
                let logger = ClipLogger::new(&self.run_id, clip.section, pass.name());
                let span = logger.create_span();
                self.process_clip(pass, clip, logger).instrument(span)
            });

            let mut fatal = None;
            let mut records = Vec::with_capacity(chunk.len());
            for outcome in join_all(futures).await {
                match (&outcome.entry, outcome.error) {
                    (_, Some(e)) => {
                        metrics::record_clip_failed(pass.name());
                        summary.failed.push(outcome.record.section);
                        if !e.is_clip_local() && fatal.is_none() {
                            fatal = Some(e);
                        }
                    }
                    (Some(entry), None) => {
                        let trimmed = entry.lead_trim + entry.tail_trim;
                        metrics::record_clip_processed(pass.name(), outcome.record.duration);
                        metrics::record_seconds_trimmed(pass.name(), trimmed);
                        if entry.outcome == TrimOutcome::SafetyVetoApplied {
                            metrics::record_safety_veto(pass.name());
                            summary.vetoed += 1;
                        }
                        summary.processed += 1;
                        summary.seconds_trimmed += trimmed;
                    }
                    (None, None) => summary.processed += 1,
                }
                records.push(outcome.record);
            }

            manifest.merge(records);
            self.store.save(&manifest).await?;

            if let Some(e) = fatal {
                error!(run_id = %self.run_id, pass = pass.number(), error = %e, "Pass aborted");
                return Err(e);
            }
        }

        info!(
            run_id = %self.run_id,
            pass = pass.number(),
            processed = summary.processed,
            failed = summary.failed.len(),
            vetoed = summary.vetoed,
            seconds_trimmed = summary.seconds_trimmed,
            "Finished {} pass",
            pass
        );

        Ok(summary)
    }

    async fn process_clip(
        &self,
        pass: TrimPass,
        clip: ClipRecord,
        logger: ClipLogger,
    ) -> ClipOutcome {
        logger.log_start(&format!("{} at {}", clip.audio, clip.stage));

        let mut working = clip.clone();
        let result = match pass {
            TrimPass::Conversion => self.convert_clip(&mut working, &logger).await,
            TrimPass::Cleanup => self.cleanup_clip(&mut working, &logger).await,
        };

        match result {
            Ok(entry) => {
                logger.log_completion(&format!(
                    "{} now {:.3}s (trim_start {:.3}s, trim_end {:.3}s)",
                    working.audio,
                    working.duration,
                    working.trim_start(),
                    working.trim_end()
                ));
                ClipOutcome {
                    record: working,
                    entry,
                    error: None,
                }
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                let mut record = clip;
                record.mark_failed(format!("{} pass: {}", pass, e));
                ClipOutcome {
                    record,
                    entry: None,
                    error: Some(e),
                }
            }
        }
    }

    async fn convert_clip(
        &self,
        clip: &mut ClipRecord,
        logger: &ClipLogger,
    ) -> PipelineResult<Option<PassEntry>> {
        let pass = TrimPass::Conversion;
        let policy = pass.policy(&self.config);

        let source = self.output_path(&clip.audio);
        let target_name = Path::new(&clip.audio)
            .with_extension(AudioFormat::Mp3.extension())
            .to_string_lossy()
            .into_owned();
        let target = self.output_path(&target_name);

        let analysis = analyze_clip(&self.toolkit, &source, policy).await?;
        log_decision(logger, &analysis.decision, analysis.duration);

        let entry = clip.apply_trim(pass.number(), &analysis.decision, analysis.duration)?;
        apply_trim(
            &self.toolkit,
            &source,
            &target,
            &analysis.decision.plan,
            analysis.duration,
            AudioFormat::Mp3,
        )
        .await?;

        clip.audio = target_name;
        if !clip.stage.has_reached(ClipStage::Converted) {
            clip.advance(ClipStage::Converted)?;
        }
        clip.advance(ClipStage::Trimmed { pass: 1 })?;

        Ok(Some(entry))
    }

    async fn cleanup_clip(
        &self,
        clip: &mut ClipRecord,
        logger: &ClipLogger,
    ) -> PipelineResult<Option<PassEntry>> {
        let pass = TrimPass::Cleanup;

        // Pass already recorded by an earlier run; only the stage is behind.
        if clip.ledger.has_pass(pass.number()) {
            finalize(clip)?;
            return Ok(None);
        }

        let policy = pass.policy(&self.config);
        let audio = self.output_path(&clip.audio);

        let analysis = analyze_clip(&self.toolkit, &audio, policy).await?;
        log_decision(logger, &analysis.decision, analysis.duration);

        let decision = if !analysis.decision.plan.is_noop()
            && !should_transcode(&analysis.decision, policy)
        {
            TrimDecision::keep(TrimOutcome::BelowThreshold)
        } else {
            analysis.decision
        };

        let entry = clip.apply_trim(pass.number(), &decision, analysis.duration)?;
        if !decision.plan.is_noop() {
            let format = AudioFormat::from_path(&audio).unwrap_or(AudioFormat::Mp3);
            apply_trim(
                &self.toolkit,
                &audio,
                &audio,
                &decision.plan,
                analysis.duration,
                format,
            )
            .await?;
        }

        finalize(clip)?;
        Ok(Some(entry))
    }
}

fn finalize(clip: &mut ClipRecord) -> PipelineResult<()> {
    if !clip.stage.has_reached(ClipStage::Trimmed { pass: 2 }) {
        clip.advance(ClipStage::Trimmed { pass: 2 })?;
    }
    clip.advance(ClipStage::Final)?;
    Ok(())
}

fn log_decision(logger: &ClipLogger, decision: &TrimDecision, duration: f64) {
    match decision.outcome {
        TrimOutcome::SafetyVetoApplied => logger.log_warning(&format!(
            "safety veto, keeping all {:.3}s",
            duration
        )),
        TrimOutcome::Untouched => {
            logger.log_warning(&format!("silent end to end, keeping all {:.3}s", duration))
        }
        _ => logger.log_progress(&format!(
            "{} (lead {:.3}s, tail {:.3}s of {:.3}s)",
            decision.outcome, decision.plan.lead_trim, decision.plan.tail_trim, duration
        )),
    }
}
