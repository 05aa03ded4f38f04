//! Core types for offset analysis.

use serde::{Deserialize, Serialize};

use crate::models::Checkpoint;

/// Mono audio loaded from one extracted window.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    /// Normalized samples in [-1, 1].
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Position of the first sample in the source (seconds).
    pub start_time_s: f64,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f64>, sample_rate: u32, start_time_s: f64) -> Self {
        Self {
            samples,
            sample_rate,
            start_time_s,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_s(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value.
    pub fn peak_amplitude(&self) -> f64 {
        self.samples.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()))
    }
}

/// Measured offset at one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffsetEstimate {
    pub checkpoint: Checkpoint,
    /// Seek position used for the reference window (seconds).
    pub position_s: f64,
    /// Offset in milliseconds; `None` when the measurement was rejected.
    pub offset_ms: Option<f64>,
}

impl OffsetEstimate {
    pub fn new(checkpoint: Checkpoint, position_s: f64, offset_ms: Option<f64>) -> Self {
        Self {
            checkpoint,
            position_s,
            offset_ms,
        }
    }

    /// A checkpoint that could not be measured.
    pub fn rejected(checkpoint: Checkpoint, position_s: f64) -> Self {
        Self::new(checkpoint, position_s, None)
    }

    pub fn is_measured(&self) -> bool {
        self.offset_ms.is_some()
    }
}
