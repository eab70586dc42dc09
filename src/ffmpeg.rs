//! FFmpeg log level control.
//!
//! The container trial and raw-unit scanners feed FFmpeg deliberately
//! malformed data all session long, and FFmpeg complains about it loudly on
//! stderr by default. This wrapper lets embedders silence that noise
//! without importing `ffmpeg-next` directly; the CLI sets
//! [`FfmpegLogLevel::Quiet`] unconditionally.
//!
//! This controls FFmpeg's own console output, not the diagnostics this
//! crate emits through the [`log`] facade.

use ffmpeg_next::util::log::{Level, set_level};

/// FFmpeg internal log verbosity, mirroring the `AV_LOG_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print nothing at all.
    Quiet,
    /// Unrecoverable conditions that abort the process.
    Panic,
    /// Unrecoverable errors; the process may continue.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging output.
    Debug,
    /// Extremely verbose tracing.
    Trace,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }
}

/// Set FFmpeg's global log level.
///
/// Process-wide; affects all FFmpeg use in this process.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    set_level(level.to_ffmpeg_level());
}
