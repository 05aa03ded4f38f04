//! Checkpoint placement.
//!
//! Pure functions deciding where the reference and comparison windows are
//! extracted. The comparison window is longer than the reference window by a
//! search margin on each side, so the correlation can find offsets of up to
//! ± margin in either direction.

use serde::{Deserialize, Serialize};

use crate::models::{AnalysisProfile, Checkpoint};

/// Material longer than this uses the long adaptive window.
const ADAPTIVE_LONG_THRESHOLD_S: f64 = 600.0;
const ADAPTIVE_LONG_WINDOW_S: f64 = 270.0;
const ADAPTIVE_MIN_WINDOW_S: f64 = 30.0;

/// How long each reference window is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Same length regardless of material.
    Fixed { duration_s: f64 },
    /// 270 s for material over 10 minutes, otherwise a third of it (≥ 30 s).
    Adaptive,
}

impl WindowPolicy {
    /// Window length for material of `duration_s` seconds.
    pub fn window_duration(&self, duration_s: f64) -> f64 {
        match *self {
            WindowPolicy::Fixed { duration_s: w } => w,
            WindowPolicy::Adaptive => {
                if duration_s > ADAPTIVE_LONG_THRESHOLD_S {
                    ADAPTIVE_LONG_WINDOW_S
                } else {
                    (duration_s / 3.0).floor().max(ADAPTIVE_MIN_WINDOW_S)
                }
            }
        }
    }
}

/// Checkpoint placement parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    pub window: WindowPolicy,
    /// Extra comparison audio on each side of the reference window (seconds).
    pub search_margin_s: f64,
    /// Mid and end checkpoints are only used at or above this duration.
    pub min_multi_point_duration_s: f64,
    /// Gap left between the end window and the end of the material.
    pub end_margin_s: f64,
}

impl CheckpointConfig {
    pub fn for_profile(profile: AnalysisProfile) -> Self {
        match profile {
            AnalysisProfile::Quick => Self {
                window: WindowPolicy::Fixed { duration_s: 20.0 },
                search_margin_s: 10.0,
                min_multi_point_duration_s: 120.0,
                end_margin_s: 10.0,
            },
            AnalysisProfile::Thorough => Self {
                window: WindowPolicy::Adaptive,
                search_margin_s: 10.0,
                min_multi_point_duration_s: 0.0,
                end_margin_s: 5.0,
            },
        }
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self::for_profile(AnalysisProfile::default())
    }
}

/// Where to extract the two windows of one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointPlan {
    pub checkpoint: Checkpoint,
    pub reference_start_s: f64,
    pub reference_duration_s: f64,
    pub comparison_start_s: f64,
    pub comparison_duration_s: f64,
}

/// Duration used for placement: the shorter of two known durations.
///
/// An unknown (zero) duration is ignored; both unknown gives 0.
pub fn effective_duration(reference_s: f64, comparison_s: f64) -> f64 {
    match (reference_s > 0.0, comparison_s > 0.0) {
        (true, true) => reference_s.min(comparison_s),
        (true, false) => reference_s,
        (false, true) => comparison_s,
        (false, false) => 0.0,
    }
}

/// Plan the checkpoints for material of `duration_s` seconds.
///
/// `start` is always planned. `mid` and `end` are added when the material is
/// long enough for the start and end windows not to overlap, with the end
/// window finishing `end_margin_s` before the end. Short material shrinks the
/// margin and window so the start window still fits.
pub fn plan_checkpoints(duration_s: f64, config: &CheckpointConfig) -> Vec<CheckpointPlan> {
    let nominal_window = config.window.window_duration(duration_s.max(0.0));

    let (window, margin) = if duration_s > 0.0 {
        let margin = config.search_margin_s.min(duration_s / 4.0).max(0.0);
        let window = nominal_window.min(duration_s - 2.0 * margin);
        (window, margin)
    } else {
        (nominal_window, config.search_margin_s.max(0.0))
    };

    let span = window + 2.0 * margin;

    let at = |checkpoint: Checkpoint, position: f64| CheckpointPlan {
        checkpoint,
        reference_start_s: position + margin,
        reference_duration_s: window,
        comparison_start_s: position,
        comparison_duration_s: span,
    };

    let mut plans = vec![at(Checkpoint::Start, 0.0)];

    if duration_s >= multi_point_threshold(span, config) {
        // Centered on the midpoint of the material
        plans.push(at(Checkpoint::Mid, (duration_s - span) / 2.0));
        plans.push(at(
            Checkpoint::End,
            duration_s - span - config.end_margin_s,
        ));
    }

    plans
}

/// Smallest duration at which start and end windows fit side by side.
fn multi_point_threshold(span: f64, config: &CheckpointConfig) -> f64 {
    config
        .min_multi_point_duration_s
        .max(2.0 * span + config.end_margin_s)
}
