//! Stream format sniffing.
//!
//! [`sniff_format`] classifies a byte window against a fixed, ordered table
//! of container and codec signatures. The result is a human-readable label
//! used only for diagnostics — extraction never branches on it, because a
//! live stream picked up mid-flight routinely starts in the middle of a
//! cluster and matches nothing.

use std::fmt::Write as _;

use crate::scan::find_pattern;

/// Ordered signature table. First match wins.
///
/// Both the exact window prefix and the first 64 bytes are checked, so a
/// label can fire on a signature that is near, but not at, the window start
/// (common for MP4 atoms, which are preceded by a 4-byte size field).
const SIGNATURES: &[(&[u8], &str)] = &[
    (&[0x1A, 0x45, 0xDF, 0xA3], "WebM/EBML"),
    (&[0x00, 0x00, 0x00, 0x01], "H.264 NAL"),
    (&[0x00, 0x00, 0x01], "H.264 NAL (short)"),
    (b"ftyp", "MP4"),
    (b"moov", "MP4 movie"),
    (b"mdat", "MP4 media data"),
    (&[0x18, 0x53, 0x80, 0x67], "WebM segment"),
    (&[0x1F, 0x43, 0xB6, 0x75], "WebM cluster"),
];

/// Classify a byte window against known container/codec signatures.
///
/// Windows shorter than 8 bytes get a dedicated "too small" label. When no
/// signature matches, the label embeds a hex preview of the first 8 bytes so
/// operators can identify the format by eye.
///
/// This is a pure function: the same window always yields the same label.
///
/// # Example
///
/// ```
/// use framesalvage::sniff_format;
///
/// let label = sniff_format(&[0x1A, 0x45, 0xDF, 0xA3, 0x00, 0x00, 0x00, 0x00]);
/// assert_eq!(label, "WebM/EBML");
/// ```
pub fn sniff_format(window: &[u8]) -> String {
    if window.len() < 8 {
        return "too small to analyse".to_string();
    }

    let head = &window[..window.len().min(64)];

    for (signature, label) in SIGNATURES {
        if window.starts_with(signature) || find_pattern(head, signature, 0).is_some() {
            return (*label).to_string();
        }
    }

    let mut preview = String::with_capacity(16);
    for byte in &window[..8] {
        let _ = write!(preview, "{byte:02x}");
    }
    format!("unknown (starts with {preview})")
}
