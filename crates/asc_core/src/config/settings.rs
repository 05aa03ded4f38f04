//! Settings struct with TOML-based sections.
//!
//! Every field has a serde default, so a partial (or empty) file loads.
//! Analysis overrides left unset fall back to the selected profile.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::{
    ClassifierConfig, CorrelationConfig, WindowPolicy, DEFAULT_CUT_TOLERANCE_MS,
    DEFAULT_SILENCE_THRESHOLD, DEFAULT_STABLE_TOLERANCE_MS,
};
use crate::extraction::DEFAULT_MIN_OUTPUT_BYTES;
use crate::logging::LogLevel;
use crate::models::AnalysisProfile;
use crate::orchestrator::AnalysisConfig;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Extraction and correlation settings.
    #[serde(default)]
    pub analysis: AnalysisSettings,

    /// Drift/cut thresholds.
    #[serde(default)]
    pub classifier: ClassifierSettings,

    /// Bounded waits for the external tools.
    #[serde(default)]
    pub timeouts: TimeoutSettings,
}

/// Working directories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Parent folder of per-analysis workspaces. Empty uses the system temp dir.
    #[serde(default)]
    pub temp_root: String,

    /// Folder for the log file. Empty disables file logging.
    #[serde(default)]
    pub logs_folder: String,
}

impl PathSettings {
    pub fn temp_root(&self) -> Option<PathBuf> {
        non_empty_path(&self.temp_root)
    }

    pub fn logs_folder(&self) -> Option<PathBuf> {
        non_empty_path(&self.logs_folder)
    }
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level; `RUST_LOG` takes precedence.
    #[serde(default)]
    pub level: LogLevel,
}

/// Extraction and correlation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Profile used when none is given on the command line.
    #[serde(default)]
    pub profile: AnalysisProfile,

    /// Extra comparison audio on each side of the reference window (seconds).
    #[serde(default = "default_search_margin")]
    pub search_margin_s: f64,

    /// Peak amplitude below which a window counts as silent (full scale = 1.0).
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f64,

    /// Extracted windows smaller than this are treated as empty.
    #[serde(default = "default_min_output_bytes")]
    pub min_output_bytes: u64,

    /// Fixed window length; unset uses the profile's window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_s: Option<f64>,

    /// Shortest material analyzed at three points; unset uses the profile's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_multi_point_duration_s: Option<f64>,

    /// Gap between the end window and the end of the material; unset uses the profile's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_margin_s: Option<f64>,
}

fn default_search_margin() -> f64 {
    10.0
}

fn default_silence_threshold() -> f64 {
    DEFAULT_SILENCE_THRESHOLD
}

fn default_min_output_bytes() -> u64 {
    DEFAULT_MIN_OUTPUT_BYTES
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            profile: AnalysisProfile::default(),
            search_margin_s: default_search_margin(),
            silence_threshold: default_silence_threshold(),
            min_output_bytes: default_min_output_bytes(),
            window_s: None,
            min_multi_point_duration_s: None,
            end_margin_s: None,
        }
    }
}

/// Classification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSettings {
    #[serde(default = "default_stable_tolerance")]
    pub stable_tolerance_ms: f64,

    #[serde(default = "default_cut_tolerance")]
    pub cut_tolerance_ms: f64,
}

fn default_stable_tolerance() -> f64 {
    DEFAULT_STABLE_TOLERANCE_MS
}

fn default_cut_tolerance() -> f64 {
    DEFAULT_CUT_TOLERANCE_MS
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            stable_tolerance_ms: default_stable_tolerance(),
            cut_tolerance_ms: default_cut_tolerance(),
        }
    }
}

/// Bounded waits, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutSettings {
    #[serde(default = "default_probe_secs")]
    pub probe_secs: u64,

    #[serde(default = "default_extract_secs")]
    pub extract_secs: u64,
}

fn default_probe_secs() -> u64 {
    20
}

fn default_extract_secs() -> u64 {
    300
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            probe_secs: default_probe_secs(),
            extract_secs: default_extract_secs(),
        }
    }
}

impl Settings {
    /// Check values that deserialize fine but make no sense.
    pub fn validate(&self) -> Result<(), String> {
        let a = &self.analysis;
        if !(a.search_margin_s >= 0.0) {
            return Err(format!(
                "analysis.search_margin_s must be >= 0, got {}",
                a.search_margin_s
            ));
        }
        if !(a.silence_threshold >= 0.0 && a.silence_threshold < 1.0) {
            return Err(format!(
                "analysis.silence_threshold must be in [0, 1), got {}",
                a.silence_threshold
            ));
        }
        if let Some(w) = a.window_s {
            if !(w > 0.0) {
                return Err(format!("analysis.window_s must be > 0, got {}", w));
            }
        }
        if !(self.classifier.stable_tolerance_ms >= 0.0 && self.classifier.cut_tolerance_ms >= 0.0)
        {
            return Err("classifier tolerances must be >= 0".to_string());
        }
        if self.timeouts.probe_secs == 0 || self.timeouts.extract_secs == 0 {
            return Err("timeouts must be at least 1 second".to_string());
        }
        Ok(())
    }

    /// Engine configuration for `profile` with these settings applied.
    pub fn analysis_config(&self, profile: AnalysisProfile) -> AnalysisConfig {
        let mut config = AnalysisConfig::for_profile(profile);
        let a = &self.analysis;

        config.checkpoints.search_margin_s = a.search_margin_s;
        if let Some(w) = a.window_s {
            config.checkpoints.window = WindowPolicy::Fixed { duration_s: w };
        }
        if let Some(d) = a.min_multi_point_duration_s {
            config.checkpoints.min_multi_point_duration_s = d;
        }
        if let Some(e) = a.end_margin_s {
            config.checkpoints.end_margin_s = e;
        }

        config.correlation = CorrelationConfig {
            silence_threshold: a.silence_threshold,
        };
        config.classifier = ClassifierConfig {
            stable_tolerance_ms: self.classifier.stable_tolerance_ms,
            cut_tolerance_ms: self.classifier.cut_tolerance_ms,
        };
        config.min_output_bytes = a.min_output_bytes;
        config.probe_timeout = Duration::from_secs(self.timeouts.probe_secs);
        config.extract_timeout = Duration::from_secs(self.timeouts.extract_secs);
        config.temp_root = self.paths.temp_root();

        config
    }
}

/// Config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
    Analysis,
    Classifier,
    Timeouts,
}

impl ConfigSection {
    /// Every section, in file order.
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Analysis,
        ConfigSection::Classifier,
        ConfigSection::Timeouts,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Analysis => "analysis",
            ConfigSection::Classifier => "classifier",
            ConfigSection::Timeouts => "timeouts",
        }
    }

    /// Comment written above the section header.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Working directories (empty = system temp / no log file)",
            ConfigSection::Logging => "Logging configuration (RUST_LOG overrides the level)",
            ConfigSection::Analysis => "Extraction and correlation settings",
            ConfigSection::Classifier => "Drift and cut tolerances in milliseconds",
            ConfigSection::Timeouts => "Bounded waits for ffprobe and ffmpeg, in seconds",
        }
    }
}
