//! Offset estimation by cross-correlation.
//!
//! Pure functions over in-memory buffers: no I/O, no logging. The lag search
//! is restricted to "valid" overlap, where the shorter buffer lies entirely
//! inside the longer one, so zero-padding never contributes to a peak.

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

use super::types::PcmBuffer;

/// Default silence threshold: one part in 64 of full scale.
pub const DEFAULT_SILENCE_THRESHOLD: f64 = 1.0 / 64.0;

/// Configuration for the correlation engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Buffers whose peak absolute amplitude is below this are treated as silent.
    pub silence_threshold: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
        }
    }
}

impl CorrelationConfig {
    /// Minimum correlation peak accepted for an overlap of `overlap_len` samples.
    pub fn peak_floor(&self, overlap_len: usize) -> f64 {
        self.silence_threshold * self.silence_threshold * overlap_len as f64
    }
}

/// Correlation values over the valid lag range.
#[derive(Debug, Clone)]
pub struct ValidCorrelation {
    /// Lag of `values[0]`, in samples.
    pub first_lag: isize,
    /// `c(k) = Σ cmp[j + k] · ref[j]` for `k = first_lag, first_lag + 1, ...`
    pub values: Vec<f64>,
}

impl ValidCorrelation {
    /// Lag and value of the largest-magnitude peak; the lowest lag wins ties.
    ///
    /// The returned value keeps its sign, so an inverted-polarity match shows
    /// up as a negative peak at the true alignment.
    pub fn peak(&self) -> Option<(isize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.values.iter().enumerate() {
            match best {
                Some((_, b)) if v.abs() <= b.abs() => {}
                _ => best = Some((i, v)),
            }
        }
        best.map(|(i, v)| (self.first_lag + i as isize, v))
    }
}

/// Estimate the offset of `comparison` relative to `reference` in milliseconds.
///
/// Returns `None` when the buffers differ in sample rate, either is empty or
/// silent, or the best correlation is too weak to trust. A negative result
/// means the comparison audio leads the reference.
pub fn correlate(
    reference: &PcmBuffer,
    comparison: &PcmBuffer,
    config: &CorrelationConfig,
) -> Option<f64> {
    if reference.sample_rate != comparison.sample_rate || reference.sample_rate == 0 {
        return None;
    }
    if reference.is_empty() || comparison.is_empty() {
        return None;
    }
    if reference.peak_amplitude() < config.silence_threshold
        || comparison.peak_amplitude() < config.silence_threshold
    {
        return None;
    }

    let correlation = centered_cross_correlation(
        &reference.samples,
        mean(&reference.samples),
        &comparison.samples,
        mean(&comparison.samples),
    );
    let (lag, peak) = correlation.peak()?;

    let overlap_len = reference.len().min(comparison.len());
    if !peak.is_finite() || peak.abs() < config.peak_floor(overlap_len) {
        return None;
    }

    let rate = reference.sample_rate as f64;
    let lag_ms = lag as f64 / rate * 1000.0;
    let window_ms = (comparison.start_time_s - reference.start_time_s) * 1000.0;

    Some(lag_ms + window_ms)
}

fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Smallest `2^a · 3^b · 5^c` that is at least `min_len`.
///
/// rustfft handles these sizes with its mixed-radix kernels, and they sit
/// much closer to the correlation length than the next power of two.
pub fn fft_length(min_len: usize) -> usize {
    let target = min_len.max(1);
    let mut best = target.next_power_of_two();

    let mut p5 = 1usize;
    while p5 < best {
        let mut p35 = p5;
        while p35 < best {
            let mut n = p35;
            while n < target {
                n *= 2;
            }
            best = best.min(n);
            p35 *= 3;
        }
        p5 *= 5;
    }

    best
}

/// Cross-correlation of `comparison` against `reference` over the valid lags
/// `[min(0, Lc - Lr), max(0, Lc - Lr)]`.
///
/// Computed as a full linear correlation via FFT (at least `Lc + Lr - 1`
/// points, so nothing wraps), from which the valid slice is read.
pub fn valid_cross_correlation(reference: &[f64], comparison: &[f64]) -> ValidCorrelation {
    centered_cross_correlation(reference, 0.0, comparison, 0.0)
}

/// Both real inputs share one complex transform (reference in the real part,
/// comparison in the imaginary part) and the spectrum product is formed in
/// place, so a single `fft_len` buffer plus scratch is live at a time.
fn centered_cross_correlation(
    reference: &[f64],
    ref_mean: f64,
    comparison: &[f64],
    cmp_mean: f64,
) -> ValidCorrelation {
    let lr = reference.len() as isize;
    let lc = comparison.len() as isize;

    if lr == 0 || lc == 0 {
        return ValidCorrelation {
            first_lag: 0,
            values: Vec::new(),
        };
    }

    let first_lag = (lc - lr).min(0);
    let last_lag = (lc - lr).max(0);

    let fft_len = fft_length(reference.len() + comparison.len() - 1);

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(fft_len);
    let ifft = planner.plan_fft_inverse(fft_len);

    let mut buffer = vec![Complex::new(0.0, 0.0); fft_len];
    for (slot, &x) in buffer.iter_mut().zip(reference) {
        slot.re = x - ref_mean;
    }
    for (slot, &y) in buffer.iter_mut().zip(comparison) {
        slot.im = y - cmp_mean;
    }

    let scratch_len = fft
        .get_inplace_scratch_len()
        .max(ifft.get_inplace_scratch_len());
    let mut scratch = vec![Complex::new(0.0, 0.0); scratch_len];
    fft.process_with_scratch(&mut buffer, &mut scratch);

    // Z = R + iC, so R[k] = (Z[k] + conj Z[-k]) / 2 and C[k] = (Z[k] - conj Z[-k]) / 2i.
    // IFFT(C · conj(R))[k] = Σ cmp[j + k] · ref[j]; negative lags wrap to the end.
    for k in 0..=fft_len / 2 {
        let j = (fft_len - k) % fft_len;
        let zk = buffer[k];
        let zj = buffer[j].conj();
        let r = (zk + zj) * 0.5;
        let d = zk - zj;
        let c = Complex::new(d.im, -d.re) * 0.5;
        let p = c * r.conj();
        buffer[k] = p;
        if j != k {
            // Real signals: P[-k] = conj P[k]
            buffer[j] = p.conj();
        }
    }

    ifft.process_with_scratch(&mut buffer, &mut scratch);
    drop(scratch);

    let scale = 1.0 / fft_len as f64;
    let len = fft_len as isize;
    let values = (first_lag..=last_lag)
        .map(|k| buffer[k.rem_euclid(len) as usize].re * scale)
        .collect();

    ValidCorrelation { first_lag, values }
}
