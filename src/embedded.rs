//! Embedded still-image scanning.
//!
//! Fallback for streams whose outer container framing is stripped or
//! ambiguous but which carry complete encoded JPEGs verbatim (MJPEG-over-
//! anything, snapshot side channels). The scan walks the buffer for
//! start-of-image / end-of-image marker pairs, slices each candidate out,
//! persists it, and then re-reads and decodes the file to confirm it really
//! is an image — marker pairs turn up by chance in compressed payloads.
//!
//! A start marker with no matching end marker is skipped, not fatal: the
//! scan advances past the start marker and keeps going. Overlapping or
//! nested markers are not reconciled; the scan strictly advances past each
//! consumed end marker.

use crate::{
    cascade::{ExtractionContext, ExtractionStrategy, StrategyOutcome},
    config::ConsumeOptions,
    frame::RecoveryMethod,
    scan::find_pattern,
};

/// JPEG start-of-image marker.
const SOI: &[u8] = &[0xFF, 0xD8];
/// JPEG end-of-image marker.
const EOI: &[u8] = &[0xFF, 0xD9];

/// Minimum trailing bytes worth scanning; below this a full marker pair
/// cannot fit anything decodable.
const MIN_TAIL: usize = 16;

/// Embedded JPEG scanner.
pub struct EmbeddedImageScan {
    per_invocation_cap: u32,
}

impl EmbeddedImageScan {
    /// Build from session options.
    pub fn new(options: &ConsumeOptions) -> Self {
        Self {
            per_invocation_cap: options.embedded_image_cap,
        }
    }
}

impl ExtractionStrategy for EmbeddedImageScan {
    fn name(&self) -> &'static str {
        "embedded-image"
    }

    fn attempt(&mut self, buffer: &[u8], ctx: &mut ExtractionContext<'_>) -> StrategyOutcome {
        let mut extracted = 0u32;
        let mut position = 0usize;

        while extracted < self.per_invocation_cap
            && ctx.remaining() > 0
            && position + MIN_TAIL <= buffer.len()
        {
            let Some(start) = find_pattern(buffer, SOI, position) else {
                break;
            };

            let Some(end) = find_pattern(buffer, EOI, start + SOI.len()) else {
                // Unterminated image; skip the start marker and keep looking.
                position = start + SOI.len();
                continue;
            };

            let candidate = &buffer[start..end + EOI.len()];
            log::debug!(
                "Embedded image candidate at offset {start}: {} bytes",
                candidate.len()
            );

            let path = ctx.candidate_path();
            match ctx.store().write_frame(candidate, &path) {
                Ok(()) => {
                    // Validate by decoding the file we just wrote.
                    if ctx.store().read_image(&path).is_some() {
                        ctx.commit_candidate(path, RecoveryMethod::EmbeddedImage, None);
                        extracted += 1;
                    } else {
                        ctx.store().delete(&path);
                    }
                }
                Err(error) => {
                    log::warn!("Failed to write embedded image candidate: {error}");
                    ctx.store().delete(&path);
                }
            }

            position = end + EOI.len();
        }

        StrategyOutcome::extracted(extracted)
    }
}
