//! Stream metadata probing using ffprobe.
//!
//! Reads duration, frame rate, codec and container start offset of a single
//! stream without decoding the media. Parsing is kept separate from process
//! execution so it can be tested against captured JSON.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use super::types::{ProbeError, ProbeResult};
use crate::models::{MediaSource, StreamInfo, StreamKind, StreamSelector};

/// Default bounded wait for one probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(20);

/// Reads metadata of one stream of a source.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(
        &self,
        source: &MediaSource,
        selector: StreamSelector,
    ) -> ProbeResult<StreamInfo>;
}

/// Run a probe with a bounded wait.
///
/// A probe that does not finish in time is dropped; for [`FfprobeProber`]
/// this kills the child process.
pub async fn probe_with_timeout(
    prober: &dyn Prober,
    source: &MediaSource,
    selector: StreamSelector,
    timeout: Duration,
) -> ProbeResult<StreamInfo> {
    match tokio::time::timeout(timeout, prober.probe(source, selector)).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout {
            secs: timeout.as_secs_f64(),
        }),
    }
}

/// Production prober backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: String,
}

impl FfprobeProber {
    pub fn new() -> Self {
        Self::with_program("ffprobe")
    }

    /// Use a specific ffprobe executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    async fn probe(
        &self,
        source: &MediaSource,
        selector: StreamSelector,
    ) -> ProbeResult<StreamInfo> {
        if let Some(path) = source.local_path() {
            if !path.exists() {
                return Err(ProbeError::NotFound(format!(
                    "source does not exist: {}",
                    path.display()
                )));
            }
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(["-v", "error", "-show_streams", "-show_format"])
            .args(["-print_format", "json"])
            .arg(source.as_str())
            .kill_on_drop(true);

        tracing::debug!("Running ffprobe: {:?}", cmd);

        let output = cmd.output().await.map_err(|e| ProbeError::Command {
            tool: self.program.clone(),
            message: format!("failed to spawn: {}", e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Command {
                tool: self.program.clone(),
                message: format!(
                    "exit code {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            });
        }

        let json: Value = serde_json::from_slice(&output.stdout)?;
        let info = parse_probe_json(&json, selector)?;

        tracing::debug!(
            "Probed {} [{}]: {:.3}s, {} fps, delay {}ms, {}",
            source.display_name(),
            selector,
            info.duration_s,
            info.fps_label(),
            info.internal_delay_ms,
            info.codec
        );

        Ok(info)
    }
}

/// How a selector was resolved against the streams of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamChoice {
    /// The requested stream exists at this position in `streams`.
    Exact(usize),
    /// The audio index was out of range; the first audio stream is used.
    FirstAudioFallback {
        requested: usize,
        available: usize,
        position: usize,
    },
    /// No stream of the requested kind.
    Missing,
}

/// Decide which stream a selector refers to, given each stream's `codec_type`.
///
/// | selector           | streams of that kind | result               |
/// |--------------------|----------------------|----------------------|
/// | video              | ≥ 1                  | first video          |
/// | audio N            | > N                  | N-th audio           |
/// | audio N            | 1..=N                | first audio, warned  |
/// | any                | 0                    | missing              |
pub fn select_stream(codec_types: &[&str], selector: StreamSelector) -> StreamChoice {
    let wanted = selector.kind.codec_type();
    let positions: Vec<usize> = codec_types
        .iter()
        .enumerate()
        .filter(|(_, t)| **t == wanted)
        .map(|(i, _)| i)
        .collect();

    let Some(&first) = positions.first() else {
        return StreamChoice::Missing;
    };

    match selector.kind {
        StreamKind::Video => StreamChoice::Exact(first),
        StreamKind::Audio => match positions.get(selector.track) {
            Some(&pos) => StreamChoice::Exact(pos),
            None => StreamChoice::FirstAudioFallback {
                requested: selector.track,
                available: positions.len(),
                position: first,
            },
        },
    }
}

/// Parse ffprobe JSON (`-show_streams -show_format`) for one stream.
pub fn parse_probe_json(json: &Value, selector: StreamSelector) -> ProbeResult<StreamInfo> {
    let streams = json
        .get("streams")
        .and_then(|s| s.as_array())
        .ok_or_else(|| ProbeError::Malformed("missing 'streams' array".to_string()))?;

    let codec_types: Vec<&str> = streams
        .iter()
        .map(|s| s.get("codec_type").and_then(|t| t.as_str()).unwrap_or(""))
        .collect();

    let position = match select_stream(&codec_types, selector) {
        StreamChoice::Exact(pos) => pos,
        StreamChoice::FirstAudioFallback {
            requested,
            available,
            position,
        } => {
            tracing::warn!(
                "Audio track {} requested but only {} present, using track 0",
                requested,
                available
            );
            position
        }
        StreamChoice::Missing => {
            return Err(ProbeError::NotFound(format!(
                "no {} stream",
                selector.kind
            )));
        }
    };

    let stream = &streams[position];

    let container_duration = json
        .get("format")
        .map(|f| number_field(f, "duration"))
        .transpose()?
        .flatten();

    let duration_s = number_field(stream, "duration")?
        .or(container_duration)
        .unwrap_or(0.0)
        .max(0.0);

    // Truncated toward zero, matching integer conversion of the start time.
    let internal_delay_ms = number_field(stream, "start_time")?
        .map(|s| (s * 1000.0).trunc() as i64)
        .unwrap_or(0);

    let fps = stream
        .get("r_frame_rate")
        .and_then(|r| r.as_str())
        .map(parse_frame_rate)
        .unwrap_or(0.0);

    let codec = stream
        .get("codec_name")
        .and_then(|c| c.as_str())
        .unwrap_or("unknown")
        .to_uppercase();

    Ok(StreamInfo {
        duration_s,
        fps,
        internal_delay_ms,
        codec,
    })
}

/// Parse an `"num/den"` rate; anything unusable yields 0.
pub fn parse_frame_rate(rate: &str) -> f64 {
    let Some((num, den)) = rate.trim().split_once('/') else {
        return rate
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(0.0);
    };

    match (num.trim().parse::<f64>(), den.trim().parse::<f64>()) {
        (Ok(n), Ok(d)) if d != 0.0 && n.is_finite() && d.is_finite() => (n / d).max(0.0),
        _ => 0.0,
    }
}

/// Read a numeric field that ffprobe may emit as a string or a number.
///
/// Absent or `"N/A"` is `None`; any other unparsable value is malformed.
fn number_field(obj: &Value, key: &str) -> ProbeResult<Option<f64>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() || s.trim() == "N/A" => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ProbeError::Malformed(format!("{} is not a number: {:?}", key, s))),
        Some(other) => Err(ProbeError::Malformed(format!(
            "{} has unexpected type: {}",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_json() -> Value {
        json!({
            "streams": [
                {
                    "index": 0,
                    "codec_name": "h264",
                    "codec_type": "video",
                    "r_frame_rate": "24000/1001",
                    "start_time": "0.042000",
                    "duration": "1420.500000"
                },
                {
                    "index": 1,
                    "codec_name": "aac",
                    "codec_type": "audio",
                    "r_frame_rate": "0/0",
                    "start_time": "-0.021333"
                },
                {
                    "index": 2,
                    "codec_name": "ac3",
                    "codec_type": "audio",
                    "r_frame_rate": "0/0",
                    "start_time": "0.000000",
                    "duration": "1419.9"
                }
            ],
            "format": { "duration": "1421.000000" }
        })
    }

    #[test]
    fn parses_video_stream() {
        let info = parse_probe_json(&sample_json(), StreamSelector::video()).unwrap();
        assert_eq!(info.codec, "H264");
        assert_eq!(info.internal_delay_ms, 42);
        assert!((info.fps - 23.976).abs() < 0.001);
        assert_eq!(info.duration_s, 1420.5);
    }

    #[test]
    fn audio_without_duration_uses_container() {
        let info = parse_probe_json(&sample_json(), StreamSelector::audio(0)).unwrap();
        assert_eq!(info.codec, "AAC");
        assert_eq!(info.duration_s, 1421.0);
        // -21.333 truncates toward zero
        assert_eq!(info.internal_delay_ms, -21);
        assert_eq!(info.fps, 0.0);
    }

    #[test]
    fn audio_index_counts_audio_streams_only() {
        let info = parse_probe_json(&sample_json(), StreamSelector::audio(1)).unwrap();
        assert_eq!(info.codec, "AC3");
    }

    #[test]
    fn out_of_range_audio_falls_back_to_first() {
        let info = parse_probe_json(&sample_json(), StreamSelector::audio(7)).unwrap();
        assert_eq!(info.codec, "AAC");
    }

    #[test]
    fn select_stream_table() {
        let types = ["video", "audio", "subtitle", "audio"];
        assert_eq!(
            select_stream(&types, StreamSelector::video()),
            StreamChoice::Exact(0)
        );
        assert_eq!(
            select_stream(&types, StreamSelector::audio(1)),
            StreamChoice::Exact(3)
        );
        assert_eq!(
            select_stream(&types, StreamSelector::audio(2)),
            StreamChoice::FirstAudioFallback {
                requested: 2,
                available: 2,
                position: 1
            }
        );
        assert_eq!(
            select_stream(&["audio"], StreamSelector::video()),
            StreamChoice::Missing
        );
        assert_eq!(
            select_stream(&["video"], StreamSelector::audio(0)),
            StreamChoice::Missing
        );
    }

    #[test]
    fn no_audio_is_not_found() {
        let json = json!({ "streams": [{ "codec_type": "video" }] });
        let result = parse_probe_json(&json, StreamSelector::audio(0));
        assert!(matches!(result, Err(ProbeError::NotFound(_))));
    }

    #[test]
    fn missing_streams_is_malformed() {
        let result = parse_probe_json(&json!({ "format": {} }), StreamSelector::video());
        assert!(matches!(result, Err(ProbeError::Malformed(_))));
    }

    #[test]
    fn bad_number_is_malformed() {
        let json = json!({
            "streams": [{ "codec_type": "audio", "duration": "abc" }]
        });
        let result = parse_probe_json(&json, StreamSelector::audio(0));
        assert!(matches!(result, Err(ProbeError::Malformed(_))));
    }

    #[test]
    fn missing_fields_default() {
        let json = json!({ "streams": [{ "codec_type": "audio", "duration": "N/A" }] });
        let info = parse_probe_json(&json, StreamSelector::audio(0)).unwrap();
        assert_eq!(info.duration_s, 0.0);
        assert_eq!(info.internal_delay_ms, 0);
        assert_eq!(info.codec, "UNKNOWN");
    }

    #[test]
    fn frame_rate_parsing() {
        assert_eq!(parse_frame_rate("25/1"), 25.0);
        assert_eq!(parse_frame_rate("0/0"), 0.0);
        assert_eq!(parse_frame_rate("30/0"), 0.0);
        assert_eq!(parse_frame_rate("garbage"), 0.0);
        assert_eq!(parse_frame_rate("29.97"), 29.97);
    }

    struct SlowProber;

    #[async_trait]
    impl Prober for SlowProber {
        async fn probe(&self, _: &MediaSource, _: StreamSelector) -> ProbeResult<StreamInfo> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(ProbeError::NotFound("unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn probe_times_out() {
        let result = probe_with_timeout(
            &SlowProber,
            &MediaSource::new("slow.mkv"),
            StreamSelector::video(),
            Duration::from_millis(20),
        )
        .await;
        assert!(matches!(result, Err(ProbeError::Timeout { .. })));
    }

    #[tokio::test]
    async fn missing_local_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = MediaSource::new(dir.path().join("nope.mkv").display().to_string());
        let result = FfprobeProber::new()
            .probe(&source, StreamSelector::audio(0))
            .await;
        assert!(matches!(result, Err(ProbeError::NotFound(_))));
    }
}
