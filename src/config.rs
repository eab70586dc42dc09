//! Session consumption configuration.
//!
//! [`ConsumeOptions`] is a builder that carries every tuning knob of a
//! consumption session: target frame count, checkpoint cadence, buffer
//! bounds, the overall timeout, and the scanner caps and window sizes.
//!
//! The scanner knobs (embedded-image cap, raw-unit attempt/success caps,
//! candidate window, retry stride) are deliberately configurable rather than
//! hard-coded: their useful values depend on the bitrate of the source
//! stream, and the defaults assume a modest live camera feed.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use framesalvage::ConsumeOptions;
//!
//! let options = ConsumeOptions::new()
//!     .with_target_frames(20)
//!     .with_timeout(Duration::from_secs(120))
//!     .with_chunk_size(32 * 1024);
//! assert_eq!(options.target_frames, 20);
//! ```

use std::time::Duration;

/// Configuration for one stream consumption session.
///
/// All fields have defaults sized for a live feed in the low hundreds of
/// kilobits per second; construct with [`ConsumeOptions::new`] and override
/// what you need with the `with_*` builders.
#[derive(Debug, Clone)]
#[must_use]
pub struct ConsumeOptions {
    /// Stop after this many frames have been recovered.
    pub target_frames: u32,
    /// Intended extraction rate in frames per second.
    ///
    /// Recorded in the summary for downstream consumers; the cascade itself
    /// is checkpoint-driven, not clock-driven.
    pub extract_fps: f64,
    /// Bytes requested per stream read.
    pub chunk_size: usize,
    /// Run the extraction cascade every N chunks (subject to
    /// [`checkpoint_threshold`](ConsumeOptions::checkpoint_threshold)).
    pub checkpoint_interval: u64,
    /// Minimum buffered bytes before a checkpoint may fire.
    pub checkpoint_threshold: usize,
    /// Hard cap on the buffer; exceeded buffers are trimmed after a
    /// checkpoint.
    pub buffer_hard_cap: usize,
    /// Number of tail bytes kept when the buffer is trimmed.
    pub buffer_trim_tail: usize,
    /// Minimum leftover bytes worth one final cascade pass while draining.
    pub drain_threshold: usize,
    /// Wall-clock bound for the whole session, independent of data arrival.
    pub timeout: Duration,
    /// Emit a progress update every N chunks.
    pub progress_interval: u64,
    /// Maximum frames the container trial decoder pulls per checkpoint.
    pub frames_per_checkpoint: u32,
    /// Maximum embedded images extracted per scanner invocation.
    pub embedded_image_cap: u32,
    /// Maximum decode attempts per raw-unit scanner invocation.
    pub raw_attempt_cap: u32,
    /// Maximum successful decodes per raw-unit scanner invocation.
    pub raw_success_cap: u32,
    /// Bytes of candidate data taken from each raw-unit match.
    pub raw_window: usize,
    /// Scan-position advance after a failed raw-unit decode.
    pub raw_retry_stride: usize,
}

impl Default for ConsumeOptions {
    fn default() -> Self {
        Self {
            target_frames: 10,
            extract_fps: 1.0,
            chunk_size: 64 * 1024,
            checkpoint_interval: 3,
            checkpoint_threshold: 200_000,
            buffer_hard_cap: 500_000,
            buffer_trim_tail: 300_000,
            drain_threshold: 50_000,
            timeout: Duration::from_secs(60),
            progress_interval: 10,
            frames_per_checkpoint: 5,
            embedded_image_cap: 5,
            raw_attempt_cap: 8,
            raw_success_cap: 3,
            raw_window: 50 * 1024,
            raw_retry_stride: 1_000,
        }
    }
}

impl ConsumeOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target frame count.
    pub fn with_target_frames(mut self, target: u32) -> Self {
        self.target_frames = target;
        self
    }

    /// Set the intended extraction rate (recorded in the summary).
    pub fn with_extract_fps(mut self, fps: f64) -> Self {
        self.extract_fps = fps;
        self
    }

    /// Set the per-read chunk size in bytes.
    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }

    /// Set the checkpoint cadence in chunks.
    pub fn with_checkpoint_interval(mut self, chunks: u64) -> Self {
        self.checkpoint_interval = chunks.max(1);
        self
    }

    /// Set the minimum buffered bytes before a checkpoint may fire.
    pub fn with_checkpoint_threshold(mut self, bytes: usize) -> Self {
        self.checkpoint_threshold = bytes;
        self
    }

    /// Set the buffer hard cap and trim tail together.
    ///
    /// `trim_tail` is clamped to `hard_cap`.
    pub fn with_buffer_bounds(mut self, hard_cap: usize, trim_tail: usize) -> Self {
        self.buffer_hard_cap = hard_cap;
        self.buffer_trim_tail = trim_tail.min(hard_cap);
        self
    }

    /// Set the minimum leftover bytes worth a final drain pass.
    pub fn with_drain_threshold(mut self, bytes: usize) -> Self {
        self.drain_threshold = bytes;
        self
    }

    /// Set the session wall-clock timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the progress update cadence in chunks.
    pub fn with_progress_interval(mut self, chunks: u64) -> Self {
        self.progress_interval = chunks.max(1);
        self
    }

    /// Set the per-checkpoint frame cap of the container trial decoder.
    pub fn with_frames_per_checkpoint(mut self, frames: u32) -> Self {
        self.frames_per_checkpoint = frames.max(1);
        self
    }

    /// Set the per-invocation cap of the embedded-image scanner.
    pub fn with_embedded_image_cap(mut self, cap: u32) -> Self {
        self.embedded_image_cap = cap;
        self
    }

    /// Set the raw-unit scanner attempt and success caps.
    pub fn with_raw_caps(mut self, attempts: u32, successes: u32) -> Self {
        self.raw_attempt_cap = attempts;
        self.raw_success_cap = successes;
        self
    }

    /// Set the raw-unit candidate window size in bytes.
    pub fn with_raw_window(mut self, bytes: usize) -> Self {
        self.raw_window = bytes.max(1);
        self
    }

    /// Set the raw-unit failure retry stride in bytes.
    pub fn with_raw_retry_stride(mut self, bytes: usize) -> Self {
        self.raw_retry_stride = bytes.max(1);
        self
    }
}
