//! ASC Core - audio offset analysis for Audio Sync Check
//!
//! Measures the timing offset between a reference and a comparison audio
//! track, detects frame-rate drift and edits, and resolves a final delay and
//! optional tempo correction. External tools (`ffprobe`, `ffmpeg`) sit behind
//! the [`extraction::Prober`] and [`extraction::Extractor`] traits.
//!
//! # Example
//!
//! ```no_run
//! use asc_core::models::{AnalysisProfile, MediaSource, StreamSelector};
//! use asc_core::orchestrator::{AnalysisConfig, SyncAnalyzer};
//!
//! # async fn run() -> Result<(), asc_core::orchestrator::AnalysisError> {
//! let analyzer = SyncAnalyzer::new(AnalysisConfig::for_profile(AnalysisProfile::Quick));
//! let report = analyzer
//!     .analyze(
//!         &MediaSource::new("reference.mkv"),
//!         StreamSelector::video_with_audio_track(0),
//!         &MediaSource::new("https://cdn.example/dub.mka"),
//!         StreamSelector::audio(0),
//!     )
//!     .await?;
//! println!("delay {} ms", report.plan.final_delay_ms);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod extraction;
pub mod logging;
pub mod models;
pub mod mux;
pub mod orchestrator;

pub use orchestrator::{AnalysisConfig, AnalysisError, SyncAnalyzer, SyncReport};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
