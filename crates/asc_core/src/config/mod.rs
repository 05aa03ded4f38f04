//! Configuration management for Audio Sync Check.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates
//! - Conversion into the engine's [`AnalysisConfig`](crate::orchestrator::AnalysisConfig)
//!
//! # Example
//!
//! ```no_run
//! use asc_core::config::{ConfigManager, ConfigSection};
//! use asc_core::logging::LogLevel;
//!
//! let mut config = ConfigManager::new(".config/asc.toml");
//! config.load_or_create().unwrap();
//!
//! let profile = config.settings().analysis.profile;
//! let engine_config = config.settings().analysis_config(profile);
//!
//! config.settings_mut().logging.level = LogLevel::Debug;
//! config.update_section(ConfigSection::Logging).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    AnalysisSettings, ClassifierSettings, ConfigSection, LoggingSettings, PathSettings,
    Settings, TimeoutSettings,
};
