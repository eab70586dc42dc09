//! Consumption summary record.

use std::{fmt, path::PathBuf};

use serde::Serialize;

/// Why a consumption session stopped.
///
/// Every reason except [`TargetReached`](TerminationReason::TargetReached)
/// still represents a complete, valid session — a zero-frame outcome is a
/// result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminationReason {
    /// The target frame count was reached.
    #[serde(rename = "target reached")]
    TargetReached,
    /// The source returned an empty read.
    #[serde(rename = "stream ended")]
    StreamEnded,
    /// The session wall-clock timeout fired.
    #[serde(rename = "timed out")]
    TimedOut,
    /// Cancellation was requested through the token.
    #[serde(rename = "cancelled")]
    Cancelled,
    /// A chunk read failed mid-session.
    #[serde(rename = "read error")]
    ReadError,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::TargetReached => write!(f, "target reached"),
            TerminationReason::StreamEnded => write!(f, "stream ended"),
            TerminationReason::TimedOut => write!(f, "timed out"),
            TerminationReason::Cancelled => write!(f, "cancelled"),
            TerminationReason::ReadError => write!(f, "read error"),
        }
    }
}

/// Aggregate record of one consumption session.
///
/// Assembled once when the session finishes, persisted as
/// `consumption_summary.json` in the session directory, and returned to the
/// caller. Immutable after creation.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct ConsumptionSummary {
    /// Frames recovered and persisted.
    pub frames_extracted: u32,
    /// Chunks read from the source.
    pub chunks_processed: u64,
    /// Total bytes read from the source.
    pub bytes_read: u64,
    /// Wall-clock session duration in seconds.
    pub elapsed_seconds: f64,
    /// Configured target frame count.
    pub target_frames: u32,
    /// Configured extraction-rate intent in frames per second.
    pub target_fps: f64,
    /// Identifier of the consumed stream.
    pub stream_id: String,
    /// Why the session stopped.
    pub termination_reason: TerminationReason,
    /// Directory the frames and this record were written to.
    pub session_dir: PathBuf,
    /// RFC 3339 completion timestamp.
    pub completed_at: String,
}
