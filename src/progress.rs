//! Progress reporting and cancellation support.
//!
//! The consumption loop reports through an injected [`ProgressSink`] rather
//! than a process-wide logger, so embedders (and tests) can capture progress
//! events instead of printing them. Cadence is bounded: updates are emitted
//! every [`progress_interval`](crate::ConsumeOptions::progress_interval)
//! chunks, never per chunk.
//!
//! # Example
//!
//! ```
//! use framesalvage::{ProgressSink, ProgressUpdate};
//!
//! struct PrintProgress;
//!
//! impl ProgressSink for PrintProgress {
//!     fn on_progress(&self, update: &ProgressUpdate) {
//!         println!(
//!             "{:.1}s: {} frames, {} bytes, {} chunks",
//!             update.elapsed.as_secs_f64(),
//!             update.frames_extracted,
//!             update.bytes_read,
//!             update.chunks_processed,
//!         );
//!     }
//! }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use crate::summary::ConsumptionSummary;

/// A snapshot of consumption progress.
///
/// Delivered to [`ProgressSink::on_progress`] at a bounded cadence.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Wall-clock time elapsed since the session started.
    pub elapsed: Duration,
    /// Frames recovered so far.
    pub frames_extracted: u32,
    /// Total bytes read from the source so far.
    pub bytes_read: u64,
    /// Chunks consumed so far.
    pub chunks_processed: u64,
    /// Current length of the accumulation buffer.
    pub buffer_len: usize,
}

/// Receives progress updates during stream consumption.
///
/// Implementations must be [`Send`] and [`Sync`] so a single sink can be
/// shared with a signal handler or monitoring thread. Sinks are
/// **infallible** — they observe but cannot halt the session. Use
/// [`CancellationToken`] to stop a session.
pub trait ProgressSink: Send + Sync {
    /// Called at regular intervals while chunks are being consumed.
    fn on_progress(&self, update: &ProgressUpdate);

    /// Called once, after the summary has been assembled.
    ///
    /// The default implementation does nothing.
    fn on_complete(&self, summary: &ConsumptionSummary) {
        let _ = summary;
    }
}

/// A sink that discards all updates. Used when no sink is configured.
pub(crate) struct NoOpSink;

impl ProgressSink for NoOpSink {
    fn on_progress(&self, _update: &ProgressUpdate) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone the token and hand one copy to the consumer; call
/// [`cancel`](CancellationToken::cancel) from any thread (typically a
/// Ctrl-C handler) to request a graceful stop. The consumption loop checks
/// the token before each read, releases the stream handle, and still writes
/// a best-effort summary.
///
/// # Example
///
/// ```
/// use framesalvage::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. All clones observe the request.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
