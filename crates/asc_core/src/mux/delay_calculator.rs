//! Delay and tempo resolution.
//!
//! Turns a [`DriftAnalysis`] into the numbers handed to the muxer. All sync
//! math for the final plan happens here.
//!
//! # Rules
//!
//! - **Delay**: `round(reference_internal_delay - start_offset)`. A negative
//!   start offset means the comparison audio starts early, so it is delayed
//!   by that amount on top of the reference's own container delay.
//!
//! - **Tempo** (drift only): `duration / (duration - drift_ms / 1000)`,
//!   rounded to 6 decimals. This stretches or compresses the comparison
//!   audio so its end meets the reference's end.
//!
//! - **Cut**: no tempo; the plan requires a manual edit.
//!
//! ```text
//! start = -50 ms, end = -650 ms, duration = 1000 s
//! drift = -600 ms
//! atempo = 1000 / (1000 - (-0.6)) = 0.999400
//! ```

use serde::{Deserialize, Serialize};

use crate::analysis::{ClassificationOutcome, DriftAnalysis};

/// Tolerance when matching a tempo ratio to a known conversion.
pub const STANDARD_MATCH_EPSILON: f64 = 0.001;

/// Label used when no known conversion matches.
pub const CUSTOM_STANDARD: &str = "Custom";

/// Known frame-rate conversions and their tempo ratios.
pub const STANDARD_RATIOS: [(&str, f64); 4] = [
    ("24 -> 23.976", 1.001),
    ("23.976 -> 24", 0.999),
    ("25 -> 23.976", 1.0427),
    ("23.976 -> 25", 0.9590),
];

/// What the caller has to do with a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    /// Apply the delay.
    Delay,
    /// Apply the delay and the tempo ratio.
    DelayAndTempo,
    /// Automatic remediation is not possible.
    ManualEdit,
}

/// Final remediation for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub final_delay_ms: i64,
    pub atempo_ratio: Option<f64>,
    /// A [`STANDARD_RATIOS`] label, [`CUSTOM_STANDARD`], or none.
    pub matched_standard: Option<String>,
    pub outcome: ClassificationOutcome,
    pub action: PlanAction,
}

impl SyncPlan {
    pub fn requires_manual_edit(&self) -> bool {
        self.action == PlanAction::ManualEdit
    }

    /// ffmpeg audio filter for the tempo correction, e.g. `atempo=0.999400`.
    pub fn ffmpeg_tempo_filter(&self) -> Option<String> {
        self.atempo_ratio.map(|r| format!("atempo={:.6}", r))
    }

    /// mkvmerge `--sync` value for a track, e.g. `0:160`.
    pub fn mkvmerge_sync_arg(&self, track_id: usize) -> String {
        format!("{}:{}", track_id, self.final_delay_ms)
    }
}

/// Build the remediation plan.
///
/// # Arguments
///
/// * `reference_internal_delay_ms` - Container start offset of the reference
/// * `analysis` - Classified checkpoint offsets
/// * `reference_duration_s` - Duration of the reference, used for the tempo
pub fn resolve(
    reference_internal_delay_ms: i64,
    analysis: &DriftAnalysis,
    reference_duration_s: f64,
) -> SyncPlan {
    let final_delay_ms =
        (reference_internal_delay_ms as f64 - analysis.start_offset_ms).round() as i64;

    match analysis.outcome {
        ClassificationOutcome::Stable => SyncPlan {
            final_delay_ms,
            atempo_ratio: None,
            matched_standard: None,
            outcome: analysis.outcome,
            action: PlanAction::Delay,
        },
        ClassificationOutcome::Cut => SyncPlan {
            final_delay_ms,
            atempo_ratio: None,
            matched_standard: None,
            outcome: analysis.outcome,
            action: PlanAction::ManualEdit,
        },
        ClassificationOutcome::Drift => match tempo_ratio(reference_duration_s, analysis.drift_ms) {
            Some(ratio) => SyncPlan {
                final_delay_ms,
                atempo_ratio: Some(ratio),
                matched_standard: Some(match_standard(ratio).to_string()),
                outcome: analysis.outcome,
                action: PlanAction::DelayAndTempo,
            },
            None => {
                tracing::warn!(
                    "Drift of {:.0}ms over {:.1}s has no usable tempo ratio",
                    analysis.drift_ms,
                    reference_duration_s
                );
                SyncPlan {
                    final_delay_ms,
                    atempo_ratio: None,
                    matched_standard: None,
                    outcome: analysis.outcome,
                    action: PlanAction::ManualEdit,
                }
            }
        },
    }
}

/// Tempo ratio for `drift_ms` over `duration_s`, rounded to 6 decimals.
///
/// `None` when the corrected duration would not be positive.
pub fn tempo_ratio(duration_s: f64, drift_ms: f64) -> Option<f64> {
    let denominator = duration_s - drift_ms / 1000.0;
    if !(duration_s > 0.0) || !(denominator > 0.0) {
        return None;
    }
    let ratio = duration_s / denominator;
    Some((ratio * 1_000_000.0).round() / 1_000_000.0)
}

/// Label of the known conversion within [`STANDARD_MATCH_EPSILON`], or `"Custom"`.
pub fn match_standard(ratio: f64) -> &'static str {
    STANDARD_RATIOS
        .iter()
        .find(|(_, r)| (ratio - r).abs() < STANDARD_MATCH_EPSILON)
        .map(|(label, _)| *label)
        .unwrap_or(CUSTOM_STANDARD)
}
