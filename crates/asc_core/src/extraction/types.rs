//! Types for probing and sample extraction.
//!
//! These types describe the requests sent to the external media tools and
//! the windows of PCM audio they leave in the task workspace.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::PcmBuffer;
use crate::models::{MediaSource, StreamSelector};

/// Bytes per sample of the extracted PCM (signed 16-bit).
pub const BYTES_PER_SAMPLE: usize = 2;

/// Default minimum size of an extracted buffer; smaller means no usable audio.
pub const DEFAULT_MIN_OUTPUT_BYTES: u64 = 1000;

/// Error type for metadata probing.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The probe did not finish within its bounded wait.
    #[error("Probe timed out after {secs:.1}s")]
    Timeout { secs: f64 },

    /// Source or requested stream does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Probe output could not be parsed.
    #[error("Malformed probe output: {0}")]
    Malformed(String),

    /// The probing tool could not be run or exited with an error.
    #[error("{tool} failed: {message}")]
    Command { tool: String, message: String },
}

impl From<serde_json::Error> for ProbeError {
    fn from(e: serde_json::Error) -> Self {
        ProbeError::Malformed(e.to_string())
    }
}

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Error type for sample extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Extraction did not finish within its bounded wait.
    #[error("Extraction timed out after {secs:.1}s")]
    Timeout { secs: f64 },

    /// The extracted buffer is below the minimum size.
    #[error("No usable audio in {path} ({bytes} bytes)")]
    Empty { path: PathBuf, bytes: u64 },

    /// The decoding tool could not be run or exited with an error.
    #[error("{tool} failed: {message}")]
    Command { tool: String, message: String },

    /// Reading or writing the PCM buffer failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Output format of an extracted window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count in the file (only the first is correlated).
    pub channels: u16,
}

impl PcmFormat {
    /// 16 kHz mono.
    pub const MONO_16K: PcmFormat = PcmFormat {
        sample_rate: 16_000,
        channels: 1,
    };

    /// 48 kHz stereo.
    pub const STEREO_48K: PcmFormat = PcmFormat {
        sample_rate: 48_000,
        channels: 2,
    };

    /// Bytes per interleaved frame.
    pub fn frame_bytes(&self) -> usize {
        BYTES_PER_SAMPLE * self.channels.max(1) as usize
    }
}

/// Request for one window of audio.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub source: MediaSource,
    pub selector: StreamSelector,
    /// Seek position in seconds.
    pub start_time_s: f64,
    /// Window length in seconds.
    pub duration_s: f64,
    pub format: PcmFormat,
    /// Outputs smaller than this are rejected as empty.
    pub min_output_bytes: u64,
}

/// A window of raw PCM written to the task workspace.
///
/// Consumed exactly once by [`SampleWindow::load`], which deletes the file.
#[derive(Debug)]
pub struct SampleWindow {
    pub source: MediaSource,
    pub selector: StreamSelector,
    pub start_time_s: f64,
    pub duration_s: f64,
    pub format: PcmFormat,
    pub path: PathBuf,
}

impl SampleWindow {
    /// Validate a finished extraction output and wrap it as a window.
    ///
    /// Fails with [`ExtractError::Empty`] when the file is missing or smaller
    /// than the request's minimum size.
    pub async fn from_output(request: &ExtractRequest, path: &Path) -> ExtractResult<Self> {
        let bytes = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(ExtractError::io(path, e)),
        };

        if bytes < request.min_output_bytes {
            return Err(ExtractError::Empty {
                path: path.to_path_buf(),
                bytes,
            });
        }

        Ok(Self {
            source: request.source.clone(),
            selector: request.selector,
            start_time_s: request.start_time_s,
            duration_s: request.duration_s,
            format: request.format,
            path: path.to_path_buf(),
        })
    }

    /// Read the window into memory and delete its file.
    pub async fn load(self) -> ExtractResult<PcmBuffer> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| ExtractError::io(&self.path, e))?;

        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            tracing::debug!("Could not remove {}: {}", self.path.display(), e);
        }

        let samples = s16le_first_channel(&bytes, self.format.channels);
        Ok(PcmBuffer::new(
            samples,
            self.format.sample_rate,
            self.start_time_s,
        ))
    }
}

/// Convert interleaved signed 16-bit little-endian PCM to normalized f64
/// samples of the first channel. A trailing partial frame is ignored.
pub fn s16le_first_channel(bytes: &[u8], channels: u16) -> Vec<f64> {
    let frame = BYTES_PER_SAMPLE * channels.max(1) as usize;
    bytes
        .chunks_exact(frame)
        .map(|f| i16::from_le_bytes([f[0], f[1]]) as f64 / 32768.0)
        .collect()
}

/// Encode normalized samples as mono signed 16-bit little-endian PCM.
pub fn f64_to_s16le(samples: &[f64]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&s| {
            let v = (s.clamp(-1.0, 1.0) * 32767.0).round() as i16;
            v.to_le_bytes()
        })
        .collect()
}
