//! Timed audio window extraction with FFmpeg.
//!
//! Seeks before opening the input so only the requested window is read
//! (important for network sources), then decodes one audio track to raw
//! signed 16-bit PCM in the task workspace.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::types::{ExtractError, ExtractRequest, ExtractResult, SampleWindow};

/// Writes one window of audio to a file.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, request: &ExtractRequest, output: &Path) -> ExtractResult<SampleWindow>;
}

/// Run an extraction with a bounded wait.
pub async fn extract_with_timeout(
    extractor: &dyn Extractor,
    request: &ExtractRequest,
    output: &Path,
    timeout: Duration,
) -> ExtractResult<SampleWindow> {
    match tokio::time::timeout(timeout, extractor.extract(request, output)).await {
        Ok(result) => result,
        Err(_) => Err(ExtractError::Timeout {
            secs: timeout.as_secs_f64(),
        }),
    }
}

/// Production extractor backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    program: String,
}

impl FfmpegExtractor {
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments for one extraction, in order.
pub fn ffmpeg_args(request: &ExtractRequest, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error"]
        .iter()
        .map(OsString::from)
        .collect();

    // -ss before -i: input seeking
    args.push("-ss".into());
    args.push(format!("{:.3}", request.start_time_s.max(0.0)).into());
    args.push("-i".into());
    args.push(request.source.as_str().into());
    args.push("-map".into());
    args.push(request.selector.audio_map_spec().into());
    args.push("-t".into());
    args.push(format!("{:.3}", request.duration_s).into());
    args.push("-vn".into());
    args.push("-acodec".into());
    args.push("pcm_s16le".into());
    args.push("-ar".into());
    args.push(request.format.sample_rate.to_string().into());
    args.push("-ac".into());
    args.push(request.format.channels.to_string().into());
    args.push("-f".into());
    args.push("s16le".into());
    args.push(output.as_os_str().to_owned());
    args
}

#[async_trait]
impl Extractor for FfmpegExtractor {
    async fn extract(
        &self,
        request: &ExtractRequest,
        output: &Path,
    ) -> ExtractResult<SampleWindow> {
        let mut cmd = Command::new(&self.program);
        cmd.args(ffmpeg_args(request, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("Running FFmpeg: {:?}", cmd);

        let result = cmd.output().await.map_err(|e| ExtractError::Command {
            tool: self.program.clone(),
            message: format!("failed to spawn: {}", e),
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ExtractError::Command {
                tool: self.program.clone(),
                message: format!(
                    "exit code {}: {}",
                    result.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            });
        }

        let window = SampleWindow::from_output(request, output).await?;

        tracing::debug!(
            "Extracted {:.1}s at {:.3}s from {} [{}]",
            request.duration_s,
            request.start_time_s,
            request.source.display_name(),
            request.selector.audio_map_spec()
        );

        Ok(window)
    }
}
