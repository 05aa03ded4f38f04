//! Data models for Audio Sync Check.
//!
//! This module contains the core data structures shared by every stage:
//! - Enums for stream kinds, checkpoints and analysis profiles
//! - Media structures (sources, stream selectors, probed stream info)

mod enums;
mod media;

// Re-export all public types
pub use enums::{AnalysisProfile, Checkpoint, StreamKind};
pub use media::{MediaSource, StreamInfo, StreamSelector};
