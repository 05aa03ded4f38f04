//! Analysis runner.
//!
//! Sequences one analysis: probe both sources, plan checkpoints, extract all
//! windows concurrently, correlate each checkpoint as soon as its pair is
//! ready, then classify and resolve.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use tokio::sync::Semaphore;

use super::errors::{AnalysisError, AnalysisResult, SourceRole};
use super::types::{AnalysisConfig, SourceReport, SyncReport};
use super::workspace::TaskWorkspace;
use crate::analysis::{
    classify, correlate, effective_duration, plan_checkpoints, CheckpointPlan, OffsetEstimate,
};
use crate::extraction::{
    extract_with_timeout, probe_with_timeout, ExtractRequest, Extractor, FfmpegExtractor,
    FfprobeProber, ProbeError, Prober,
};
use crate::models::{Checkpoint, MediaSource, StreamInfo, StreamKind, StreamSelector};
use crate::mux::resolve;

/// Correlations held in memory at once. Extractions are not limited.
pub const MAX_CONCURRENT_CORRELATIONS: usize = 1;

/// Runs offset analyses with a given probe/extract backend.
pub struct SyncAnalyzer {
    prober: Arc<dyn Prober>,
    extractor: Arc<dyn Extractor>,
    config: AnalysisConfig,
    correlation_slots: Semaphore,
}

impl SyncAnalyzer {
    /// Analyzer using the `ffprobe` and `ffmpeg` binaries.
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_tools(
            Arc::new(FfprobeProber::new()),
            Arc::new(FfmpegExtractor::new()),
            config,
        )
    }

    /// Analyzer with custom tools.
    pub fn with_tools(
        prober: Arc<dyn Prober>,
        extractor: Arc<dyn Extractor>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            prober,
            extractor,
            config,
            correlation_slots: Semaphore::new(MAX_CONCURRENT_CORRELATIONS),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Probe a single stream with the configured bounded wait.
    pub async fn probe(
        &self,
        source: &MediaSource,
        selector: StreamSelector,
    ) -> Result<StreamInfo, ProbeError> {
        probe_with_timeout(
            self.prober.as_ref(),
            source,
            selector,
            self.config.probe_timeout,
        )
        .await
    }

    /// Measure the offset of `comparison` against `reference`.
    ///
    /// A cut is a valid outcome and is returned as `Ok`; use
    /// [`SyncReport::require_automatic`] to turn it into an error.
    pub async fn analyze(
        &self,
        reference: &MediaSource,
        reference_selector: StreamSelector,
        comparison: &MediaSource,
        comparison_selector: StreamSelector,
    ) -> AnalysisResult<SyncReport> {
        let started = Instant::now();

        tracing::info!(
            "Analyzing {} [{}] against {} [{}] ({} profile)",
            comparison.display_name(),
            comparison_selector,
            reference.display_name(),
            reference_selector.audio_map_spec(),
            self.config.profile
        );

        let (reference_report, comparison_report) = tokio::try_join!(
            self.probe_reference(reference, reference_selector),
            self.probe_comparison(comparison, comparison_selector),
        )?;

        let duration_s = effective_duration(
            reference_report.info.duration_s,
            comparison_report.info.duration_s,
        );
        let plans = plan_checkpoints(duration_s, &self.config.checkpoints);

        tracing::info!(
            "Effective duration {:.1}s, checkpoints: {}",
            duration_s,
            plans
                .iter()
                .map(|p| p.checkpoint.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let workspace = TaskWorkspace::create(self.config.temp_root.as_deref())?;

        let estimates = join_all(plans.iter().map(|plan| {
            self.measure_checkpoint(
                &workspace,
                plan,
                reference,
                reference_selector,
                comparison,
                comparison_selector,
            )
        }))
        .await;

        if let Err(e) = workspace.close() {
            tracing::warn!("{}", e);
        }

        let estimates = collect_estimates(&plans, estimates)?;

        let offset_of = |checkpoint: Checkpoint| {
            estimates
                .iter()
                .find(|e| e.checkpoint == checkpoint)
                .and_then(|e| e.offset_ms)
        };

        let start_ms = offset_of(Checkpoint::Start).ok_or_else(|| {
            AnalysisError::correlate(Checkpoint::Start, "no usable offset at start")
        })?;

        let analysis = classify(
            start_ms,
            offset_of(Checkpoint::Mid),
            offset_of(Checkpoint::End),
            &self.config.classifier,
        );

        let plan = resolve(
            reference_report.info.internal_delay_ms,
            &analysis,
            reference_report.info.duration_s,
        );

        tracing::info!(
            "Result: {} (drift {:.1}ms), delay {}ms{}",
            analysis.outcome,
            analysis.drift_ms,
            plan.final_delay_ms,
            plan.atempo_ratio
                .map(|r| format!(
                    ", atempo {:.6} ({})",
                    r,
                    plan.matched_standard.as_deref().unwrap_or("")
                ))
                .unwrap_or_default()
        );

        Ok(SyncReport {
            profile: self.config.profile,
            reference: reference_report,
            comparison: comparison_report,
            effective_duration_s: duration_s,
            estimates,
            analysis,
            plan,
            processing_time_s: started.elapsed().as_secs_f64(),
        })
    }

    /// Probe the reference's video stream, falling back to its audio track
    /// when it has no video.
    async fn probe_reference(
        &self,
        source: &MediaSource,
        selector: StreamSelector,
    ) -> AnalysisResult<SourceReport> {
        let (info, metadata_from) = match self.probe(source, selector).await {
            Ok(info) => (info, selector.kind),
            Err(ProbeError::NotFound(reason)) if selector.kind == StreamKind::Video => {
                tracing::warn!(
                    "Reference {}: {}, using audio track {} metadata",
                    source.display_name(),
                    reason,
                    selector.track
                );
                let info = self
                    .probe(source, selector.as_audio())
                    .await
                    .map_err(|e| AnalysisError::probe(SourceRole::Reference, e))?;
                (info, StreamKind::Audio)
            }
            Err(e) => return Err(AnalysisError::probe(SourceRole::Reference, e)),
        };

        tracing::info!(
            "Reference: {:.1}s, {} fps, delay {}ms, {}",
            info.duration_s,
            info.fps_label(),
            info.internal_delay_ms,
            info.codec
        );

        Ok(SourceReport {
            source: source.clone(),
            audio_track: selector.track,
            metadata_from,
            info,
        })
    }

    async fn probe_comparison(
        &self,
        source: &MediaSource,
        selector: StreamSelector,
    ) -> AnalysisResult<SourceReport> {
        let info = self
            .probe(source, selector)
            .await
            .map_err(|e| AnalysisError::probe(SourceRole::Comparison, e))?;

        tracing::info!(
            "Comparison: {:.1}s, delay {}ms, {}",
            info.duration_s,
            info.internal_delay_ms,
            info.codec
        );

        Ok(SourceReport {
            source: source.clone(),
            audio_track: selector.track,
            metadata_from: selector.kind,
            info,
        })
    }

    /// Extract both windows of a checkpoint, then correlate them.
    async fn measure_checkpoint(
        &self,
        workspace: &TaskWorkspace,
        plan: &CheckpointPlan,
        reference: &MediaSource,
        reference_selector: StreamSelector,
        comparison: &MediaSource,
        comparison_selector: StreamSelector,
    ) -> AnalysisResult<Option<f64>> {
        let checkpoint = plan.checkpoint;

        let reference_request = self.request(
            reference,
            reference_selector,
            plan.reference_start_s,
            plan.reference_duration_s,
        );
        let comparison_request = self.request(
            comparison,
            comparison_selector,
            plan.comparison_start_s,
            plan.comparison_duration_s,
        );

        let reference_path = workspace.window_path(SourceRole::Reference, checkpoint);
        let comparison_path = workspace.window_path(SourceRole::Comparison, checkpoint);

        let (reference_window, comparison_window) = tokio::join!(
            extract_with_timeout(
                self.extractor.as_ref(),
                &reference_request,
                &reference_path,
                self.config.extract_timeout,
            ),
            extract_with_timeout(
                self.extractor.as_ref(),
                &comparison_request,
                &comparison_path,
                self.config.extract_timeout,
            ),
        );

        let reference_window = reference_window
            .map_err(|e| AnalysisError::extract(SourceRole::Reference, checkpoint, e))?;
        let comparison_window = comparison_window
            .map_err(|e| AnalysisError::extract(SourceRole::Comparison, checkpoint, e))?;

        let reference_pcm = reference_window
            .load()
            .await
            .map_err(|e| AnalysisError::extract(SourceRole::Reference, checkpoint, e))?;
        let comparison_pcm = comparison_window
            .load()
            .await
            .map_err(|e| AnalysisError::extract(SourceRole::Comparison, checkpoint, e))?;

        // Long windows need a large FFT buffer; run them one at a time
        let _slot = self
            .correlation_slots
            .acquire()
            .await
            .map_err(|e| AnalysisError::correlate(checkpoint, e.to_string()))?;

        let config = self.config.correlation;
        let offset = tokio::task::spawn_blocking(move || {
            correlate(&reference_pcm, &comparison_pcm, &config)
        })
        .await
        .map_err(|e| {
            AnalysisError::correlate(checkpoint, format!("correlation task failed: {}", e))
        })?;

        match offset {
            Some(ms) => tracing::info!("{}: {:+.1}ms", checkpoint, ms),
            None => tracing::warn!("{}: silent or weak signal, no offset", checkpoint),
        }

        Ok(offset)
    }

    fn request(
        &self,
        source: &MediaSource,
        selector: StreamSelector,
        start_time_s: f64,
        duration_s: f64,
    ) -> ExtractRequest {
        ExtractRequest {
            source: source.clone(),
            selector,
            start_time_s,
            duration_s,
            format: self.config.format,
            min_output_bytes: self.config.min_output_bytes,
        }
    }
}

/// Pair checkpoint results with their plans.
///
/// A failed mandatory checkpoint aborts the analysis; optional ones are kept
/// as rejected estimates.
fn collect_estimates(
    plans: &[CheckpointPlan],
    results: Vec<AnalysisResult<Option<f64>>>,
) -> AnalysisResult<Vec<OffsetEstimate>> {
    let mut estimates = Vec::with_capacity(plans.len());

    for (plan, result) in plans.iter().zip(results) {
        let checkpoint = plan.checkpoint;
        let offset = match result {
            Ok(offset) => offset,
            Err(e) if checkpoint.is_mandatory() => return Err(e),
            Err(e) => {
                tracing::warn!("Skipping {} checkpoint: {}", checkpoint, e);
                None
            }
        };

        if offset.is_none() && checkpoint.is_mandatory() {
            return Err(AnalysisError::correlate(
                checkpoint,
                "silent or weak signal",
            ));
        }

        estimates.push(OffsetEstimate::new(
            checkpoint,
            plan.reference_start_s,
            offset,
        ));
    }

    Ok(estimates)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::analysis::{ClassificationOutcome, ClassifierConfig};
    use crate::extraction::types::f64_to_s16le;
    use crate::extraction::{
        ExtractError, ExtractResult, PcmFormat, ProbeResult, SampleWindow,
    };
    use crate::logging::init_test_tracing;
    use crate::models::AnalysisProfile;

    const RATE: u32 = 4000;

    fn info(duration_s: f64, internal_delay_ms: i64, fps: f64) -> StreamInfo {
        StreamInfo {
            duration_s,
            fps,
            internal_delay_ms,
            codec: if fps > 0.0 { "H264" } else { "AAC" }.to_string(),
        }
    }

    #[derive(Default)]
    struct FakeProber {
        video: HashMap<String, StreamInfo>,
        audio: HashMap<String, StreamInfo>,
    }

    impl FakeProber {
        fn with_video(mut self, source: &str, info: StreamInfo) -> Self {
            self.video.insert(source.to_string(), info);
            self
        }

        fn with_audio(mut self, source: &str, info: StreamInfo) -> Self {
            self.audio.insert(source.to_string(), info);
            self
        }
    }

    #[async_trait]
    impl Prober for FakeProber {
        async fn probe(
            &self,
            source: &MediaSource,
            selector: StreamSelector,
        ) -> ProbeResult<StreamInfo> {
            let table = match selector.kind {
                StreamKind::Video => &self.video,
                StreamKind::Audio => &self.audio,
            };
            table
                .get(source.as_str())
                .cloned()
                .ok_or_else(|| ProbeError::NotFound(format!("no {} stream", selector.kind)))
        }
    }

    type OffsetFn = Box<dyn Fn(f64) -> f64 + Send + Sync>;

    /// Broadband noise, identical for every source at the same timeline sample.
    fn timeline_sample(n: i64) -> f64 {
        let mut z = (n as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        ((z >> 11) as f64 / (1u64 << 53) as f64) - 0.5
    }

    /// Writes windows cut from a shared noise timeline. Each source has an
    /// offset (ms) as a function of the window position; a negative offset
    /// makes that source's content appear early.
    #[derive(Default)]
    struct SyntheticExtractor {
        offsets: HashMap<String, OffsetFn>,
        silent: Vec<String>,
        fail_at: Option<(String, f64)>,
        hang: bool,
        calls: AtomicUsize,
    }

    impl SyntheticExtractor {
        fn offset(mut self, source: &str, f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
            self.offsets.insert(source.to_string(), Box::new(f));
            self
        }
    }

    #[async_trait]
    impl Extractor for SyntheticExtractor {
        async fn extract(
            &self,
            request: &ExtractRequest,
            output: &Path,
        ) -> ExtractResult<SampleWindow> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = request.source.as_str();

            if self.hang {
                std::future::pending::<()>().await;
            }
            if let Some((source, at)) = &self.fail_at {
                if source == name && (request.start_time_s - at).abs() < 1e-6 {
                    return Err(ExtractError::Command {
                        tool: "fake".to_string(),
                        message: "connection reset".to_string(),
                    });
                }
            }

            let rate = request.format.sample_rate as f64;
            let offset_ms = self
                .offsets
                .get(name)
                .map(|f| f(request.start_time_s))
                .unwrap_or(0.0);
            let shift = (offset_ms * rate / 1000.0).round() as i64;
            let first = (request.start_time_s * rate).round() as i64;
            let count = (request.duration_s * rate).round() as usize;
            let gain = if self.silent.iter().any(|s| s == name) {
                0.0
            } else {
                0.8
            };

            let samples: Vec<f64> = (0..count as i64)
                .map(|i| gain * timeline_sample(first + i - shift))
                .collect();

            tokio::fs::write(output, f64_to_s16le(&samples))
                .await
                .map_err(|e| ExtractError::Io {
                    path: output.to_path_buf(),
                    source: e,
                })?;

            SampleWindow::from_output(request, output).await
        }
    }

    fn config(temp_root: &Path) -> AnalysisConfig {
        let mut config = AnalysisConfig::for_profile(AnalysisProfile::Quick);
        config.format = PcmFormat {
            sample_rate: RATE,
            channels: 1,
        };
        config.temp_root = Some(temp_root.to_path_buf());
        config
    }

    fn analyzer(
        prober: FakeProber,
        extractor: Arc<SyntheticExtractor>,
        config: AnalysisConfig,
    ) -> SyncAnalyzer {
        SyncAnalyzer::with_tools(Arc::new(prober), extractor, config)
    }

    fn standard_prober(duration_s: f64) -> FakeProber {
        FakeProber::default()
            .with_video("ref.mkv", info(duration_s, 40, 23.976))
            .with_audio("ref.mkv", info(duration_s, 0, 0.0))
            .with_audio("cmp.mka", info(duration_s, 0, 0.0))
    }

    async fn run(analyzer: &SyncAnalyzer) -> AnalysisResult<SyncReport> {
        analyzer
            .analyze(
                &MediaSource::new("ref.mkv"),
                StreamSelector::video(),
                &MediaSource::new("cmp.mka"),
                StreamSelector::audio(0),
            )
            .await
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("offset measured");
        let one_sample_ms = 1000.0 / RATE as f64;
        assert!(
            (actual - expected).abs() <= one_sample_ms,
            "expected {} got {}",
            expected,
            actual
        );
    }

    fn workspace_count(root: &Path) -> usize {
        std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn three_point_stable() {
        init_test_tracing();
        let root = tempfile::tempdir().unwrap();
        let extractor = Arc::new(SyntheticExtractor::default().offset("cmp.mka", |t| {
            if t < 300.0 {
                -30.0
            } else if t < 900.0 {
                15.0
            } else {
                60.0
            }
        }));
        let analyzer = analyzer(standard_prober(1200.0), extractor.clone(), config(root.path()));

        let report = run(&analyzer).await.unwrap();

        assert_eq!(report.estimates.len(), 3);
        assert_close(report.estimate(Checkpoint::Start).unwrap().offset_ms, -30.0);
        assert_close(report.estimate(Checkpoint::Mid).unwrap().offset_ms, 15.0);
        assert_close(report.estimate(Checkpoint::End).unwrap().offset_ms, 60.0);

        assert_eq!(report.analysis.outcome, ClassificationOutcome::Stable);
        assert_eq!(report.plan.final_delay_ms, 40 + 30);
        assert!(report.plan.atempo_ratio.is_none());
        assert_eq!(report.reference.metadata_from, StreamKind::Video);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 6);
        assert_eq!(workspace_count(root.path()), 0);
        assert_eq!(
            analyzer.correlation_slots.available_permits(),
            MAX_CONCURRENT_CORRELATIONS
        );
    }

    #[tokio::test]
    async fn linear_drift_gives_tempo() {
        let root = tempfile::tempdir().unwrap();
        // Comparison runs early by half a millisecond per second
        let extractor = Arc::new(SyntheticExtractor::default().offset("cmp.mka", |t| -0.5 * t));
        let analyzer = analyzer(standard_prober(1200.0), extractor, config(root.path()));

        let report = run(&analyzer).await.unwrap();

        assert!(report.analysis.fps_issue());
        assert!(!report.analysis.cut_detected());
        assert_close(Some(report.analysis.drift_ms), -575.0);

        // 1200 / (1200 + 0.575), within 0.000521 of the 0.999 standard
        let ratio = report.plan.atempo_ratio.unwrap();
        assert!((ratio - 0.999521).abs() <= 1e-6, "ratio {}", ratio);
        assert_eq!(report.plan.matched_standard.as_deref(), Some("23.976 -> 24"));
        assert_eq!(report.plan.final_delay_ms, 40);
    }

    #[tokio::test]
    async fn cut_is_reported_not_failed() {
        let root = tempfile::tempdir().unwrap();
        let extractor = Arc::new(SyntheticExtractor::default().offset("cmp.mka", |t| {
            if t < 300.0 {
                0.0
            } else if t < 900.0 {
                2000.0
            } else {
                400.0
            }
        }));
        let analyzer = analyzer(standard_prober(1200.0), extractor, config(root.path()));

        let report = run(&analyzer).await.unwrap();
        assert!(report.analysis.cut_detected());
        assert!(report.plan.requires_manual_edit());
        assert!(report.plan.atempo_ratio.is_none());

        let err = report.require_automatic().unwrap_err();
        assert!(matches!(err, AnalysisError::Cut { .. }));
    }

    #[tokio::test]
    async fn classifier_thresholds_are_configurable() {
        let root = tempfile::tempdir().unwrap();
        let extractor = Arc::new(SyntheticExtractor::default().offset("cmp.mka", |t| {
            if t < 300.0 {
                0.0
            } else if t < 900.0 {
                25.0
            } else {
                50.0
            }
        }));
        let mut config = config(root.path());
        config.classifier = ClassifierConfig {
            stable_tolerance_ms: 20.0,
            ..ClassifierConfig::default()
        };
        let analyzer = analyzer(standard_prober(1200.0), extractor, config);

        let report = run(&analyzer).await.unwrap();
        assert!(report.analysis.fps_issue());
    }

    #[tokio::test]
    async fn short_material_uses_start_only() {
        let root = tempfile::tempdir().unwrap();
        let extractor = Arc::new(SyntheticExtractor::default().offset("cmp.mka", |_| -250.0));
        let analyzer = analyzer(standard_prober(90.0), extractor.clone(), config(root.path()));

        let report = run(&analyzer).await.unwrap();
        assert_eq!(report.estimates.len(), 1);
        assert!(report.analysis.is_stable());
        assert_eq!(report.analysis.drift_ms, 0.0);
        assert_eq!(report.plan.final_delay_ms, 290);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn effective_duration_is_the_shorter_source() {
        let root = tempfile::tempdir().unwrap();
        let prober = FakeProber::default()
            .with_video("ref.mkv", info(1200.0, 0, 25.0))
            .with_audio("cmp.mka", info(100.0, 0, 0.0));
        let extractor = Arc::new(SyntheticExtractor::default());
        let analyzer = analyzer(prober, extractor, config(root.path()));

        let report = run(&analyzer).await.unwrap();
        assert_eq!(report.effective_duration_s, 100.0);
        assert_eq!(report.estimates.len(), 1);
    }

    #[tokio::test]
    async fn reference_without_video_uses_audio_metadata() {
        let root = tempfile::tempdir().unwrap();
        let prober = FakeProber::default()
            .with_audio("ref.mkv", info(600.0, -12, 0.0))
            .with_audio("cmp.mka", info(600.0, 0, 0.0));
        let extractor = Arc::new(SyntheticExtractor::default().offset("cmp.mka", |_| 100.0));
        let analyzer = analyzer(prober, extractor, config(root.path()));

        let report = run(&analyzer).await.unwrap();
        assert_eq!(report.reference.metadata_from, StreamKind::Audio);
        assert_eq!(report.plan.final_delay_ms, -12 - 100);
    }

    #[tokio::test]
    async fn probe_failure_aborts_before_extraction() {
        let root = tempfile::tempdir().unwrap();
        let prober = FakeProber::default().with_video("ref.mkv", info(600.0, 0, 24.0));
        let extractor = Arc::new(SyntheticExtractor::default());
        let analyzer = analyzer(prober, extractor.clone(), config(root.path()));

        let err = run(&analyzer).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Probe {
                role: SourceRole::Comparison,
                source: ProbeError::NotFound(_)
            }
        ));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[tokio::test]
    async fn silent_start_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let extractor = Arc::new(SyntheticExtractor {
            silent: vec!["cmp.mka".to_string()],
            ..SyntheticExtractor::default()
        });
        let analyzer = analyzer(standard_prober(1200.0), extractor, config(root.path()));

        let err = run(&analyzer).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Correlate {
                checkpoint: Checkpoint::Start,
                ..
            }
        ));
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[tokio::test]
    async fn failed_mid_degrades_to_two_points() {
        let root = tempfile::tempdir().unwrap();
        let extractor = Arc::new(SyntheticExtractor {
            // Mid comparison window of 1200 s material starts at 580 s
            fail_at: Some(("cmp.mka".to_string(), 580.0)),
            ..SyntheticExtractor::default().offset("cmp.mka", |t| -0.5 * t)
        });
        let analyzer = analyzer(standard_prober(1200.0), extractor, config(root.path()));

        let report = run(&analyzer).await.unwrap();
        let mid = report.estimate(Checkpoint::Mid).unwrap();
        assert!(!mid.is_measured());
        assert!(report.analysis.mid_offset_ms.is_none());
        // Large drift without a midpoint is drift, never a cut
        assert!(report.analysis.fps_issue());
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[tokio::test]
    async fn failed_start_extraction_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let extractor = Arc::new(SyntheticExtractor {
            fail_at: Some(("ref.mkv".to_string(), 10.0)),
            ..SyntheticExtractor::default()
        });
        let analyzer = analyzer(standard_prober(1200.0), extractor, config(root.path()));

        let err = run(&analyzer).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Extract {
                role: SourceRole::Reference,
                checkpoint: Checkpoint::Start,
                ..
            }
        ));
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[tokio::test]
    async fn hung_extraction_times_out() {
        let root = tempfile::tempdir().unwrap();
        let extractor = Arc::new(SyntheticExtractor {
            hang: true,
            ..SyntheticExtractor::default()
        });
        let mut config = config(root.path());
        config.extract_timeout = Duration::from_millis(50);
        let analyzer = analyzer(standard_prober(1200.0), extractor, config);

        let err = run(&analyzer).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[test]
    fn collect_keeps_optional_failures() {
        let plans = plan_checkpoints(
            1200.0,
            &crate::analysis::CheckpointConfig::for_profile(AnalysisProfile::Quick),
        );
        let results = vec![
            Ok(Some(-10.0)),
            Err(AnalysisError::correlate(Checkpoint::Mid, "boom")),
            Ok(None),
        ];
        let estimates = collect_estimates(&plans, results).unwrap();
        assert_eq!(estimates.len(), 3);
        assert!(estimates[0].is_measured());
        assert!(!estimates[1].is_measured());
        assert!(!estimates[2].is_measured());
    }
}
