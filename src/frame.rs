//! Recovered frame provenance and encoding.

use std::{fmt, io::Cursor, path::PathBuf};

use image::{DynamicImage, ImageFormat};
use serde::Serialize;

use crate::error::SalvageError;

/// Which extraction strategy produced a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryMethod {
    /// Full-buffer container trial decode.
    ContainerTrial,
    /// Embedded still-image scan.
    EmbeddedImage,
    /// Raw codec-unit scan with a synthetic container shim.
    RawUnit,
}

impl fmt::Display for RecoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryMethod::ContainerTrial => write!(f, "container"),
            RecoveryMethod::EmbeddedImage => write!(f, "embedded"),
            RecoveryMethod::RawUnit => write!(f, "raw"),
        }
    }
}

/// Codec family of a raw unit match, when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecFamily {
    /// H.264 / AVC, matched by Annex B start codes.
    H264,
    /// VP8, matched by the keyframe signature.
    Vp8,
    /// VP9, matched by the (loose) frame marker byte.
    Vp9,
}

impl fmt::Display for CodecFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecFamily::H264 => write!(f, "h264"),
            CodecFamily::Vp8 => write!(f, "vp8"),
            CodecFamily::Vp9 => write!(f, "vp9"),
        }
    }
}

/// Provenance record for one persisted frame.
///
/// The pixel data itself is written to disk the moment it is recovered and
/// never retained in memory; this record is what the extraction context
/// returns for logging and bookkeeping.
#[derive(Debug, Clone)]
pub struct RecoveredFrame {
    /// 1-based sequence index, globally unique within the session.
    pub index: u32,
    /// Strategy that produced the frame.
    pub method: RecoveryMethod,
    /// Codec family, when the raw-unit scanner classified the match.
    pub codec: Option<CodecFamily>,
    /// Where the frame was written.
    pub path: PathBuf,
}

/// Encode a decoded frame as JPEG bytes.
pub(crate) fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, SalvageError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .map_err(|error| SalvageError::FrameEncode(error.to_string()))?;
    Ok(bytes)
}
