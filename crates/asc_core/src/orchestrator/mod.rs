//! Analysis orchestration.
//!
//! [`SyncAnalyzer`] drives one comparison end to end: both sources are probed
//! concurrently, checkpoint windows are extracted into a per-run
//! [`TaskWorkspace`] and correlated, then the offsets are classified and
//! resolved into a [`SyncPlan`](crate::mux::SyncPlan).
//!
//! Failures carry the side ([`SourceRole`]) and checkpoint they happened at.
//! A mandatory (start) checkpoint failing aborts the run; mid/end failures are
//! recorded as rejected estimates.

mod analyzer;
mod errors;
mod types;
mod workspace;

pub use analyzer::{SyncAnalyzer, MAX_CONCURRENT_CORRELATIONS};
pub use errors::{AnalysisError, AnalysisResult, SourceRole};
pub use types::{AnalysisConfig, SourceReport, SyncReport, DEFAULT_EXTRACT_TIMEOUT};
pub use workspace::TaskWorkspace;
