//! Core enums used throughout the engine.

use serde::{Deserialize, Serialize};

/// Kind of media stream a selector points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    /// Value of ffprobe's `codec_type` field for this kind.
    pub fn codec_type(&self) -> &'static str {
        match self {
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
        }
    }

    /// Single-letter stream specifier used by ffmpeg (`v` / `a`).
    pub fn specifier(&self) -> char {
        match self {
            StreamKind::Video => 'v',
            StreamKind::Audio => 'a',
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.codec_type())
    }
}

/// Named temporal sampling position within the material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Checkpoint {
    Start,
    Mid,
    End,
}

impl Checkpoint {
    /// All checkpoints in temporal order.
    pub const ALL: [Checkpoint; 3] = [Checkpoint::Start, Checkpoint::Mid, Checkpoint::End];

    pub fn as_str(&self) -> &'static str {
        match self {
            Checkpoint::Start => "start",
            Checkpoint::Mid => "mid",
            Checkpoint::End => "end",
        }
    }

    /// Whether a failure at this checkpoint aborts the whole analysis.
    pub fn is_mandatory(&self) -> bool {
        matches!(self, Checkpoint::Start)
    }
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extraction/windowing profile for an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisProfile {
    /// 16 kHz mono, short fixed windows. Fast on network sources.
    #[default]
    Quick,
    /// 48 kHz stereo (first channel used), adaptive long windows.
    Thorough,
}

impl std::fmt::Display for AnalysisProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisProfile::Quick => write!(f, "quick"),
            AnalysisProfile::Thorough => write!(f, "thorough"),
        }
    }
}

impl std::str::FromStr for AnalysisProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" | "fast" => Ok(AnalysisProfile::Quick),
            "thorough" | "full" => Ok(AnalysisProfile::Thorough),
            other => Err(format!("unknown analysis profile '{}'", other)),
        }
    }
}
