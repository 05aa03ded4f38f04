//! Configuration and results of an analysis run.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{AnalysisError, AnalysisResult};
use crate::analysis::{
    CheckpointConfig, ClassifierConfig, CorrelationConfig, DriftAnalysis, OffsetEstimate,
};
use crate::extraction::{PcmFormat, DEFAULT_MIN_OUTPUT_BYTES, DEFAULT_PROBE_TIMEOUT};
use crate::models::{AnalysisProfile, Checkpoint, MediaSource, StreamInfo, StreamKind};
use crate::mux::SyncPlan;

/// Default bounded wait for one window extraction.
pub const DEFAULT_EXTRACT_TIMEOUT: Duration = Duration::from_secs(300);

/// Everything one analysis run needs to know.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub profile: AnalysisProfile,
    pub format: PcmFormat,
    pub checkpoints: CheckpointConfig,
    pub correlation: CorrelationConfig,
    pub classifier: ClassifierConfig,
    /// Extraction outputs below this size are treated as empty.
    pub min_output_bytes: u64,
    pub probe_timeout: Duration,
    pub extract_timeout: Duration,
    /// Parent of the per-run workspace; system temp dir when unset.
    pub temp_root: Option<PathBuf>,
}

impl AnalysisConfig {
    /// Defaults for a profile.
    pub fn for_profile(profile: AnalysisProfile) -> Self {
        let format = match profile {
            AnalysisProfile::Quick => PcmFormat::MONO_16K,
            AnalysisProfile::Thorough => PcmFormat::STEREO_48K,
        };

        Self {
            profile,
            format,
            checkpoints: CheckpointConfig::for_profile(profile),
            correlation: CorrelationConfig::default(),
            classifier: ClassifierConfig::default(),
            min_output_bytes: DEFAULT_MIN_OUTPUT_BYTES,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            extract_timeout: DEFAULT_EXTRACT_TIMEOUT,
            temp_root: None,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::for_profile(AnalysisProfile::default())
    }
}

/// One side of an analysis as it was probed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: MediaSource,
    /// Audio track sampled for correlation.
    pub audio_track: usize,
    /// Stream the metadata came from.
    pub metadata_from: StreamKind,
    pub info: StreamInfo,
}

/// Complete result of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub profile: AnalysisProfile,
    pub reference: SourceReport,
    pub comparison: SourceReport,
    /// Duration used to place checkpoints.
    pub effective_duration_s: f64,
    /// One entry per planned checkpoint, in temporal order.
    pub estimates: Vec<OffsetEstimate>,
    pub analysis: DriftAnalysis,
    pub plan: SyncPlan,
    pub processing_time_s: f64,
}

impl SyncReport {
    /// Estimate for a checkpoint, if it was planned.
    pub fn estimate(&self, checkpoint: Checkpoint) -> Option<&OffsetEstimate> {
        self.estimates.iter().find(|e| e.checkpoint == checkpoint)
    }

    /// Reject reports that need a manual edit.
    ///
    /// A cut becomes [`AnalysisError::Cut`]; other reports pass through.
    pub fn require_automatic(self) -> AnalysisResult<Self> {
        if self.analysis.cut_detected() {
            return Err(AnalysisError::Cut {
                start_ms: self.analysis.start_offset_ms,
                mid_ms: self.analysis.mid_offset_ms.unwrap_or(f64::NAN),
                end_ms: self.analysis.end_offset_ms.unwrap_or(f64::NAN),
            });
        }
        Ok(self)
    }
}
