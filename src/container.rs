//! Container trial decoding.
//!
//! The first (and most productive, when it works) recovery strategy:
//! interpret the *entire* accumulated buffer as a complete multimedia
//! container. A live stream joined mid-flight rarely starts at a container
//! boundary, so several candidate extensions are tried in order of
//! permissiveness — WebM first, since the generic Matroska parser is the
//! most tolerant of a missing leading header, then MKV, then MP4.
//!
//! Each candidate writes the buffer verbatim to a scratch file (no header
//! synthesis at this layer), hands it to the generic decoder, and pulls
//! sequential frames until the per-checkpoint cap or the readable data runs
//! out. Any failure abandons that candidate and moves on; the first
//! candidate that yields a frame ends the trial.

use crate::{
    cascade::{ExtractionContext, ExtractionStrategy, StrategyOutcome},
    config::ConsumeOptions,
    decode::decode_frames,
    frame::RecoveryMethod,
    scratch::ScratchFile,
};

/// Candidate container extensions, most permissive first.
const CANDIDATE_EXTENSIONS: &[&str] = &["webm", "mkv", "mp4"];

/// Full-buffer container trial decoder.
pub struct ContainerTrial {
    frames_per_checkpoint: u32,
}

impl ContainerTrial {
    /// Build from session options.
    pub fn new(options: &ConsumeOptions) -> Self {
        Self {
            frames_per_checkpoint: options.frames_per_checkpoint,
        }
    }
}

impl ExtractionStrategy for ContainerTrial {
    fn name(&self) -> &'static str {
        "container-trial"
    }

    fn attempt(&mut self, buffer: &[u8], ctx: &mut ExtractionContext<'_>) -> StrategyOutcome {
        let mut extracted = 0u32;
        let mut last_error = None;

        for extension in CANDIDATE_EXTENSIONS {
            if extracted > 0 || ctx.remaining() == 0 {
                break;
            }

            let cap = self.frames_per_checkpoint.min(ctx.remaining());

            // Scratch file is removed when this guard drops, error paths
            // included.
            let scratch = match ScratchFile::create(ctx.store().dir(), extension, buffer) {
                Ok(scratch) => scratch,
                Err(error) => {
                    last_error = Some(error);
                    continue;
                }
            };

            // Frames persist one at a time as they decode; a failure
            // partway through keeps everything already written.
            let before = ctx.frames_extracted();
            let result = decode_frames(scratch.path(), cap, |image| {
                ctx.persist_image(&image, RecoveryMethod::ContainerTrial, None)
                    .map(|_| ())
            });
            let gained = ctx.frames_extracted() - before;
            extracted += gained;

            match result {
                Ok(_) if gained > 0 => {
                    log::debug!(
                        "Buffer of {} bytes opened as .{extension}, decoded {gained} frame(s)",
                        buffer.len(),
                    );
                }
                Ok(_) => {}
                Err(error) if gained == 0 => {
                    log::debug!("Buffer did not open as .{extension}: {error}");
                    last_error = Some(error);
                }
                Err(error) => {
                    log::warn!("Candidate .{extension} ended early after {gained} frame(s): {error}");
                    last_error = Some(error);
                }
            }
        }

        match last_error {
            Some(error) if extracted == 0 => StrategyOutcome::interrupted(0, error),
            _ => StrategyOutcome::extracted(extracted),
        }
    }
}
