//! Offset analysis.
//!
//! Pure functions that the orchestrator composes:
//!
//! 1. **Checkpoints** (`checkpoints`): decide which start/mid/end windows to
//!    extract for material of a given length.
//!
//! 2. **Correlation** (`correlation`): estimate the offset between a
//!    reference and a comparison window, rejecting silence and weak peaks.
//!
//! 3. **Drift Detection** (`drift_detection`): classify the checkpoint offsets
//!    as stable, drifting or cut.
//!
//! # Usage
//!
//! ```ignore
//! use asc_core::analysis::{classify, correlate, plan_checkpoints, ClassifierConfig};
//!
//! let plans = plan_checkpoints(duration_s, &checkpoint_config);
//! // extract and load one PcmBuffer pair per plan ...
//! let start = correlate(&ref_start, &cmp_start, &correlation_config);
//! let analysis = classify(start_ms, mid, end, &ClassifierConfig::default());
//! ```

mod checkpoints;
mod correlation;
mod drift_detection;
mod types;

pub use checkpoints::{
    effective_duration, plan_checkpoints, CheckpointConfig, CheckpointPlan, WindowPolicy,
};
pub use correlation::{
    correlate, fft_length, valid_cross_correlation, CorrelationConfig, ValidCorrelation,
    DEFAULT_SILENCE_THRESHOLD,
};
pub use drift_detection::{
    classify, ClassificationOutcome, ClassifierConfig, DriftAnalysis,
    DEFAULT_CUT_TOLERANCE_MS, DEFAULT_STABLE_TOLERANCE_MS,
};
pub use types::{OffsetEstimate, PcmBuffer};
