//! Raw codec-unit scanning.
//!
//! Last-resort recovery when neither container structure nor embedded
//! images are found: hunt the buffer for codec-level start patterns, take a
//! bounded window of bytes from each match, wrap it in a minimal container
//! shim for the matched codec family, and ask the decoder for exactly one
//! frame.
//!
//! Matches are classified by an ordered pattern table — H.264 Annex B start
//! codes (4- and 3-byte variants), the VP8 keyframe signature, and the VP9
//! frame marker. The single-byte VP9 marker in particular fires constantly
//! on arbitrary data, which is why both attempts and successes are capped
//! per invocation: this strategy is allowed to be wrong cheaply, not often.
//!
//! On a successful decode the scan jumps past the whole consumed window so
//! the same unit is never matched twice; on failure it advances by a short
//! stride and retries.

use crate::{
    cascade::{ExtractionContext, ExtractionStrategy, StrategyOutcome},
    config::ConsumeOptions,
    decode::decode_frames,
    frame::{CodecFamily, RecoveryMethod},
    scan::find_pattern,
    scratch::ScratchFile,
    storage::SessionStore,
};

/// One entry of the start-pattern table.
struct UnitPattern {
    bytes: &'static [u8],
    family: CodecFamily,
}

/// Ordered start-pattern table. On equal match offsets, the earlier entry
/// wins, so the longer H.264 start code takes precedence over its 3-byte
/// prefix-free sibling and over the loose VP9 marker.
const UNIT_PATTERNS: &[UnitPattern] = &[
    UnitPattern {
        bytes: &[0x00, 0x00, 0x00, 0x01],
        family: CodecFamily::H264,
    },
    UnitPattern {
        bytes: &[0x00, 0x00, 0x01],
        family: CodecFamily::H264,
    },
    UnitPattern {
        bytes: &[0x9D, 0x01, 0x2A],
        family: CodecFamily::Vp8,
    },
    UnitPattern {
        bytes: &[0x82],
        family: CodecFamily::Vp9,
    },
];

/// EBML magic, prepended to VP-family candidates so the Matroska probe has
/// something to bite on.
const EBML_MAGIC: &[u8] = &[0x1A, 0x45, 0xDF, 0xA3];

/// Find the earliest start-pattern match at or after `from`.
///
/// Returns the match offset and the codec family of the winning pattern.
/// Exposed so the table and tie-breaking rules can be tested in isolation.
pub fn earliest_unit(buffer: &[u8], from: usize) -> Option<(usize, CodecFamily)> {
    let mut best: Option<(usize, CodecFamily)> = None;

    for pattern in UNIT_PATTERNS {
        if let Some(offset) = find_pattern(buffer, pattern.bytes, from) {
            match best {
                Some((best_offset, _)) if best_offset <= offset => {}
                _ => best = Some((offset, pattern.family)),
            }
        }
    }

    best
}

/// Raw codec-unit scanner.
pub struct RawUnitScan {
    attempt_cap: u32,
    success_cap: u32,
    window: usize,
    retry_stride: usize,
}

impl RawUnitScan {
    /// Build from session options.
    pub fn new(options: &ConsumeOptions) -> Self {
        Self {
            attempt_cap: options.raw_attempt_cap,
            success_cap: options.raw_success_cap,
            window: options.raw_window,
            retry_stride: options.raw_retry_stride,
        }
    }

    /// Wrap a candidate window in the shim for its codec family and attempt
    /// a single-frame decode. Returns the decoded image on success.
    fn try_decode_unit(
        &self,
        candidate: &[u8],
        family: CodecFamily,
        store: &SessionStore,
    ) -> Option<image::DynamicImage> {
        let (extension, header): (&str, &[u8]) = match family {
            CodecFamily::H264 => ("mp4", &[]),
            CodecFamily::Vp8 | CodecFamily::Vp9 => ("webm", EBML_MAGIC),
        };

        let scratch =
            match ScratchFile::create_with_header(store.dir(), extension, header, candidate) {
                Ok(scratch) => scratch,
                Err(error) => {
                    log::debug!("Failed to write raw-unit scratch file: {error}");
                    return None;
                }
            };

        let mut image = None;
        match decode_frames(scratch.path(), 1, |frame| {
            image = Some(frame);
            Ok(())
        }) {
            Ok(_) => image,
            Err(error) => {
                log::debug!("Raw {family} candidate did not decode: {error}");
                None
            }
        }
    }
}

impl ExtractionStrategy for RawUnitScan {
    fn name(&self) -> &'static str {
        "raw-unit"
    }

    fn attempt(&mut self, buffer: &[u8], ctx: &mut ExtractionContext<'_>) -> StrategyOutcome {
        let mut extracted = 0u32;
        let mut attempts = 0u32;
        let mut position = 0usize;

        while attempts < self.attempt_cap
            && extracted < self.success_cap
            && ctx.remaining() > 0
            && position < buffer.len()
        {
            let Some((offset, family)) = earliest_unit(buffer, position) else {
                break;
            };

            let window_end = (offset + self.window).min(buffer.len());
            let candidate = &buffer[offset..window_end];
            attempts += 1;

            log::debug!(
                "Raw {family} unit candidate at offset {offset}: {} bytes",
                candidate.len()
            );

            match self.try_decode_unit(candidate, family, ctx.store()) {
                Some(image) => {
                    match ctx.persist_image(&image, RecoveryMethod::RawUnit, Some(family)) {
                        Ok(_) => extracted += 1,
                        Err(error) => {
                            log::warn!("Failed to persist raw-unit frame: {error}");
                        }
                    }
                    // Jump well past the consumed region so the same unit
                    // is not matched again.
                    position = window_end;
                }
                None => {
                    position = offset + self.retry_stride;
                }
            }
        }

        StrategyOutcome::extracted(extracted)
    }
}
