//! Media source and stream structures.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::enums::StreamKind;

/// A media input: a local file path or a network URL readable by ffmpeg.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaSource(String);

impl MediaSource {
    /// Create a source from a path or URL. Surrounding whitespace is dropped.
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into().trim().to_string())
    }

    /// Parse a `location[:track]` argument.
    ///
    /// A trailing `:N` (digits only) selects audio track `N`; without it the
    /// track is 0. `http://host/file.mkv` keeps its scheme colon intact.
    pub fn parse_with_track(arg: &str) -> (Self, usize) {
        let arg = arg.trim();
        if let Some((location, suffix)) = arg.rsplit_once(':') {
            if !location.is_empty()
                && !suffix.is_empty()
                && suffix.chars().all(|c| c.is_ascii_digit())
            {
                if let Ok(track) = suffix.parse::<usize>() {
                    return (Self::new(location), track);
                }
            }
        }
        (Self::new(arg), 0)
    }

    /// The raw location string passed to the external tools.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the source is fetched over the network.
    pub fn is_remote(&self) -> bool {
        self.0.contains("://")
    }

    /// Local filesystem path, if this is not a URL.
    pub fn local_path(&self) -> Option<&Path> {
        if self.is_remote() {
            None
        } else {
            Some(Path::new(&self.0))
        }
    }

    /// Short name for logs: the final path segment.
    pub fn display_name(&self) -> &str {
        self.0
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.0)
    }
}

impl std::fmt::Display for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Selects one stream of a source: its kind and, for audio, the zero-based
/// index among audio streams.
///
/// The track index is also the audio track sampled for correlation when the
/// selector's kind is video (the reference's video stream carries the
/// metadata, its audio track carries the waveform).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamSelector {
    pub kind: StreamKind,
    pub track: usize,
}

impl StreamSelector {
    /// First video stream, audio track 0 for sampling.
    pub fn video() -> Self {
        Self {
            kind: StreamKind::Video,
            track: 0,
        }
    }

    /// Audio track `track`.
    pub fn audio(track: usize) -> Self {
        Self {
            kind: StreamKind::Audio,
            track,
        }
    }

    /// Video metadata with a specific audio track for sampling.
    pub fn video_with_audio_track(track: usize) -> Self {
        Self {
            kind: StreamKind::Video,
            track,
        }
    }

    /// The audio-only selector sharing this selector's track index.
    pub fn as_audio(&self) -> Self {
        Self::audio(self.track)
    }

    /// ffmpeg `-map` argument for the audio track sampled by this selector.
    pub fn audio_map_spec(&self) -> String {
        format!("0:a:{}", self.track)
    }
}

impl std::fmt::Display for StreamSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let index = match self.kind {
            StreamKind::Video => 0,
            StreamKind::Audio => self.track,
        };
        write!(f, "0:{}:{}", self.kind.specifier(), index)
    }
}

/// Metadata of one probed stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Stream duration in seconds (container duration when the stream has none).
    pub duration_s: f64,
    /// Frames per second; 0.0 when unknown or not a video stream.
    pub fps: f64,
    /// Container-declared start offset in whole milliseconds (may be negative).
    pub internal_delay_ms: i64,
    /// Upper-cased codec name.
    pub codec: String,
}

impl StreamInfo {
    /// Whether the frame rate is known.
    pub fn has_fps(&self) -> bool {
        self.fps > 0.0
    }

    /// Frame rate with three decimals, or `N/A`.
    pub fn fps_label(&self) -> String {
        if self.has_fps() {
            format!("{:.3}", self.fps)
        } else {
            "N/A".to_string()
        }
    }
}
