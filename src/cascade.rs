//! Extraction strategy cascade.
//!
//! Each recovery strategy is a capability behind the [`ExtractionStrategy`]
//! trait, returning a typed [`StrategyOutcome`] instead of signalling through
//! errors. The consumer sequences strategies in a fixed order and
//! short-circuits on the first one that yields at least one frame; a
//! strategy that fails outright reports its error in the outcome and the
//! cascade falls through to the next fallback.
//!
//! [`ExtractionContext`] is the shared bookkeeping for one session: it owns
//! the frame sequence counter (so indices are strictly increasing and
//! gap-free no matter which strategy produced each frame), the remaining
//! target, and the handle to session storage.

use std::path::PathBuf;

use image::DynamicImage;

use crate::{
    error::SalvageError,
    frame::{CodecFamily, RecoveredFrame, RecoveryMethod, encode_jpeg},
    storage::SessionStore,
};

/// Result of one strategy invocation.
///
/// `frames_extracted` counts frames that were fully decoded, validated, and
/// written — partial frames are never persisted. `error` carries the reason
/// a strategy gave up, purely for diagnostics; it does not stop the cascade.
#[derive(Debug)]
#[must_use]
pub struct StrategyOutcome {
    /// Frames newly persisted by this invocation.
    pub frames_extracted: u32,
    /// The error that ended the invocation, if any.
    pub error: Option<SalvageError>,
}

impl StrategyOutcome {
    /// No frames, no error: the buffer simply held nothing usable.
    pub fn none() -> Self {
        Self {
            frames_extracted: 0,
            error: None,
        }
    }

    /// `count` frames were persisted.
    pub fn extracted(count: u32) -> Self {
        Self {
            frames_extracted: count,
            error: None,
        }
    }

    /// The invocation was cut short by `error` after `count` frames.
    pub fn interrupted(count: u32, error: SalvageError) -> Self {
        Self {
            frames_extracted: count,
            error: Some(error),
        }
    }

    /// Whether this outcome short-circuits the cascade.
    pub fn recovered_frames(&self) -> bool {
        self.frames_extracted > 0
    }
}

/// A frame-recovery strategy that can be run against the current buffer.
///
/// Implementations must never panic or propagate decode failures: any
/// candidate that does not decode is abandoned and reflected, at most, in
/// [`StrategyOutcome::error`].
pub trait ExtractionStrategy {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Attempt to recover frames from `buffer`, persisting through `ctx`.
    fn attempt(&mut self, buffer: &[u8], ctx: &mut ExtractionContext<'_>) -> StrategyOutcome;
}

/// Per-session extraction bookkeeping shared by all strategies.
#[derive(Debug)]
pub struct ExtractionContext<'a> {
    store: &'a SessionStore,
    next_index: u32,
    remaining: u32,
}

impl<'a> ExtractionContext<'a> {
    /// Create a context for a session targeting `target_frames` frames.
    pub fn new(store: &'a SessionStore, target_frames: u32) -> Self {
        Self {
            store,
            next_index: 1,
            remaining: target_frames,
        }
    }

    /// Frames still wanted before the session target is reached.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Frames persisted so far in this session.
    pub fn frames_extracted(&self) -> u32 {
        self.next_index - 1
    }

    /// The session storage this context persists through.
    pub fn store(&self) -> &SessionStore {
        self.store
    }

    /// Path the next committed frame will occupy.
    ///
    /// Strategies that must write a candidate *before* validating it (the
    /// embedded-image scanner) write here, then either
    /// [`commit_candidate`](ExtractionContext::commit_candidate) or delete
    /// the file. The sequence index is only consumed on commit, so rejected
    /// candidates leave no gaps.
    pub fn candidate_path(&self) -> PathBuf {
        self.store.frame_path(self.next_index)
    }

    /// Record a validated candidate already sitting at `path` as the next
    /// frame of the session.
    pub fn commit_candidate(
        &mut self,
        path: PathBuf,
        method: RecoveryMethod,
        codec: Option<CodecFamily>,
    ) -> RecoveredFrame {
        let frame = RecoveredFrame {
            index: self.next_index,
            method,
            codec,
            path,
        };
        self.next_index += 1;
        self.remaining = self.remaining.saturating_sub(1);

        log::info!(
            "Recovered frame {} via {} ({})",
            frame.index,
            frame.method,
            frame
                .codec
                .map(|c| c.to_string())
                .unwrap_or_else(|| "codec unknown".to_string()),
        );
        frame
    }

    /// Encode a decoded frame as JPEG, persist it, and commit it.
    ///
    /// Used by strategies whose decode step already proves validity (the
    /// container trial and raw-unit decoders).
    pub fn persist_image(
        &mut self,
        image: &DynamicImage,
        method: RecoveryMethod,
        codec: Option<CodecFamily>,
    ) -> Result<RecoveredFrame, SalvageError> {
        let bytes = encode_jpeg(image)?;
        let path = self.candidate_path();
        self.store.write_frame(&bytes, &path)?;
        Ok(self.commit_candidate(path, method, codec))
    }
}

/// Run the strategies in order, stopping at the first that recovers frames.
///
/// Returns the total frames recovered at this checkpoint.
pub(crate) fn run_cascade(
    strategies: &mut [Box<dyn ExtractionStrategy>],
    buffer: &[u8],
    ctx: &mut ExtractionContext<'_>,
) -> u32 {
    let mut total = 0;

    for strategy in strategies.iter_mut() {
        if ctx.remaining() == 0 {
            break;
        }

        let outcome = strategy.attempt(buffer, ctx);
        if let Some(error) = &outcome.error {
            log::debug!("Strategy {} gave up: {error}", strategy.name());
        }

        total += outcome.frames_extracted;
        if outcome.recovered_frames() {
            log::debug!(
                "Strategy {} recovered {} frame(s), skipping remaining fallbacks",
                strategy.name(),
                outcome.frames_extracted,
            );
            break;
        }
    }

    total
}
