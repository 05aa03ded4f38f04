//! Drift and cut detection from checkpoint offsets.
//!
//! Compares the offsets measured at start, mid and end:
//! - Stable: start and end agree within tolerance
//! - Drift: offsets move linearly (frame-rate conversion)
//! - Cut: the midpoint is far off the start/end line (content added or removed)
//!
//! All functions are pure - no I/O, no side effects.

use serde::{Deserialize, Serialize};

/// Default tolerance below which start/end disagreement is noise (ms).
pub const DEFAULT_STABLE_TOLERANCE_MS: f64 = 100.0;

/// Default distance of the midpoint from the start/end line that marks a cut (ms).
pub const DEFAULT_CUT_TOLERANCE_MS: f64 = 200.0;

/// Classification of an offset pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationOutcome {
    /// Constant offset; a plain delay fixes it.
    #[default]
    Stable,
    /// Constant-rate drift; needs a delay and a tempo change.
    Drift,
    /// Structural edit; needs manual intervention.
    Cut,
}

impl std::fmt::Display for ClassificationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassificationOutcome::Stable => write!(f, "Stable"),
            ClassificationOutcome::Drift => write!(f, "FPS Drift"),
            ClassificationOutcome::Cut => write!(f, "Cut Detected"),
        }
    }
}

/// Thresholds for classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Drift at or below this is treated as stable (ms).
    pub stable_tolerance_ms: f64,
    /// Midpoint deviation above this is treated as a cut (ms).
    pub cut_tolerance_ms: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            stable_tolerance_ms: DEFAULT_STABLE_TOLERANCE_MS,
            cut_tolerance_ms: DEFAULT_CUT_TOLERANCE_MS,
        }
    }
}

/// Result of classifying the checkpoint offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftAnalysis {
    pub start_offset_ms: f64,
    pub mid_offset_ms: Option<f64>,
    pub end_offset_ms: Option<f64>,
    /// `end - start`, or 0 without an end measurement.
    pub drift_ms: f64,
    pub outcome: ClassificationOutcome,
}

impl DriftAnalysis {
    pub fn cut_detected(&self) -> bool {
        self.outcome == ClassificationOutcome::Cut
    }

    pub fn fps_issue(&self) -> bool {
        self.outcome == ClassificationOutcome::Drift
    }

    pub fn is_stable(&self) -> bool {
        self.outcome == ClassificationOutcome::Stable
    }

    /// Where the midpoint would sit if the offsets moved linearly.
    pub fn expected_mid_ms(&self) -> f64 {
        self.start_offset_ms + self.drift_ms / 2.0
    }

    /// Distance of the measured midpoint from the linear expectation.
    pub fn mid_deviation_ms(&self) -> Option<f64> {
        self.mid_offset_ms.map(|mid| (mid - self.expected_mid_ms()).abs())
    }
}

/// Classify checkpoint offsets.
///
/// Without an end offset there is nothing to compare, so the result is
/// stable. Without a mid offset a large drift is reported as drift, never as
/// a cut.
pub fn classify(
    start_ms: f64,
    mid_ms: Option<f64>,
    end_ms: Option<f64>,
    config: &ClassifierConfig,
) -> DriftAnalysis {
    let drift_ms = end_ms.map(|end| end - start_ms).unwrap_or(0.0);

    let outcome = if drift_ms.abs() <= config.stable_tolerance_ms {
        ClassificationOutcome::Stable
    } else {
        match mid_ms {
            Some(mid) => {
                let expected_mid = start_ms + drift_ms / 2.0;
                if (mid - expected_mid).abs() > config.cut_tolerance_ms {
                    ClassificationOutcome::Cut
                } else {
                    ClassificationOutcome::Drift
                }
            }
            None => ClassificationOutcome::Drift,
        }
    };

    DriftAnalysis {
        start_offset_ms: start_ms,
        mid_offset_ms: mid_ms,
        end_offset_ms: end_ms,
        drift_ms,
        outcome,
    }
}
