//! Error types for the `framesalvage` crate.
//!
//! This module defines [`SalvageError`], the unified error type returned by
//! fallible operations in the crate. Note that most extraction-level failures
//! are *not* surfaced through this type: a decode candidate that fails is
//! swallowed by the cascade and control falls through to the next fallback.
//! `SalvageError` is reserved for failures the caller must know about, such
//! as a stream source that is unusable at session start.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framesalvage` operations.
///
/// Every public method that can fail returns `Result<T, SalvageError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SalvageError {
    /// The stream source was unusable before a single chunk was consumed.
    ///
    /// This is the only fatal session error: a session that never started
    /// produces no summary.
    #[error("Failed to open stream {stream_id}: {reason}")]
    StreamOpen {
        /// Identifier of the stream that could not be read.
        stream_id: String,
        /// Underlying reason the first read failed.
        reason: String,
    },

    /// The session storage directory could not be created.
    #[error("Failed to create session directory at {path}: {reason}")]
    SessionDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// A scratch file or frame candidate could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    FrameDecode(String),

    /// A recovered frame could not be encoded to a still image.
    #[error("Failed to encode frame to image: {0}")]
    FrameEncode(String),

    /// No video stream was found in a scratch container.
    #[error("No video stream found in candidate data")]
    NoVideoStream,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate during frame encode or validation.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    /// The session summary or metadata record could not be serialized.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<FfmpegError> for SalvageError {
    fn from(error: FfmpegError) -> Self {
        SalvageError::Ffmpeg(error.to_string())
    }
}
