//! Stream consumption loop.
//!
//! [`StreamConsumer`] owns one consumption session: it pulls fixed-size
//! chunks from a [`StreamSource`], accumulates them in a bounded buffer, and
//! at checkpoint cadence runs the extraction cascade (container trial →
//! embedded-image scan → raw-unit scan, short-circuiting on first success).
//!
//! The session is a single logical thread: reads, buffering, and extraction
//! are strictly sequential, so there is no concurrent mutation of the
//! buffer. Extraction blocks the read loop, which bounds peak memory at the
//! cost of added read latency — acceptable because checkpoints are gated on
//! both chunk cadence and buffer size.
//!
//! Loop shape: `IDLE → READING → (EXTRACTING)* → DRAINING → DONE`. The loop
//! leaves `READING` when the target frame count is reached, the wall-clock
//! timeout fires, the source runs dry, a chunk read fails, or cancellation
//! is requested. `DRAINING` gives a meaningful leftover buffer one final
//! cascade pass. Every exit path releases the source handle and produces a
//! summary — except a source that is unusable before the first chunk, which
//! is the one fatal error.

use std::{
    sync::Arc,
    time::Instant,
};

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    cascade::{ExtractionContext, ExtractionStrategy, run_cascade},
    config::ConsumeOptions,
    container::ContainerTrial,
    embedded::EmbeddedImageScan,
    error::SalvageError,
    progress::{CancellationToken, NoOpSink, ProgressSink, ProgressUpdate},
    raw_unit::RawUnitScan,
    sniff::sniff_format,
    source::StreamSource,
    storage::SessionStore,
    summary::{ConsumptionSummary, TerminationReason},
};

/// Consumes a chunked byte stream and recovers still frames from it.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
///
/// use framesalvage::{ConsumeOptions, ReaderSource, SessionStore, StreamConsumer};
///
/// let store = SessionStore::create("data/raw", "camera-7").unwrap();
/// let options = ConsumeOptions::new().with_target_frames(10);
///
/// let mut consumer = StreamConsumer::new(store, options);
/// let source = ReaderSource::new(File::open("capture.bin").unwrap());
/// let summary = consumer.run(source).unwrap();
///
/// println!(
///     "{} frame(s) recovered, stopped because: {}",
///     summary.frames_extracted, summary.termination_reason,
/// );
/// ```
pub struct StreamConsumer {
    options: ConsumeOptions,
    store: SessionStore,
    sink: Arc<dyn ProgressSink>,
    cancellation: Option<CancellationToken>,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl StreamConsumer {
    /// Create a consumer with the default strategy cascade.
    pub fn new(store: SessionStore, options: ConsumeOptions) -> Self {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(ContainerTrial::new(&options)),
            Box::new(EmbeddedImageScan::new(&options)),
            Box::new(RawUnitScan::new(&options)),
        ];

        Self {
            options,
            store,
            sink: Arc::new(NoOpSink),
            cancellation: None,
            strategies,
        }
    }

    /// Inject a progress sink. Defaults to a no-op.
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Attach a cancellation token, checked before every read.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Replace the strategy cascade.
    ///
    /// Strategies run in the given order with first-success short-circuit.
    /// Mainly useful for tests and embedders with bespoke recovery logic.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// The session store this consumer persists into.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Consume `source` until the target is reached, the stream ends, the
    /// timeout fires, or cancellation is requested.
    ///
    /// Returns the session summary; a session that recovered zero frames is
    /// a complete, valid outcome. The summary is also persisted to the
    /// session directory as `consumption_summary.json`.
    ///
    /// # Errors
    ///
    /// Returns [`SalvageError::StreamOpen`] if the very first read fails —
    /// a session that never started produces no summary.
    pub fn run<S: StreamSource>(&mut self, mut source: S) -> Result<ConsumptionSummary, SalvageError> {
        let started = Instant::now();
        let mut buffer: Vec<u8> = Vec::new();
        let mut chunks_processed: u64 = 0;
        let mut bytes_read: u64 = 0;

        let Self {
            options,
            store,
            sink,
            cancellation,
            strategies,
        } = self;
        let mut ctx = ExtractionContext::new(store, options.target_frames);

        log::info!(
            "Consuming stream {} (target {} frames, timeout {:?})",
            store.stream_id(),
            options.target_frames,
            options.timeout,
        );

        let reason = loop {
            if cancellation
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
            {
                log::info!("Cancellation requested, stopping consumption");
                break TerminationReason::Cancelled;
            }

            if started.elapsed() > options.timeout {
                log::warn!(
                    "Timeout reached after {:.1}s",
                    started.elapsed().as_secs_f64()
                );
                break TerminationReason::TimedOut;
            }

            if ctx.remaining() == 0 {
                break TerminationReason::TargetReached;
            }

            let chunk = match source.read_chunk(options.chunk_size) {
                Ok(chunk) => chunk,
                Err(error) if chunks_processed == 0 => {
                    source.close();
                    return Err(SalvageError::StreamOpen {
                        stream_id: store.stream_id().to_string(),
                        reason: error.to_string(),
                    });
                }
                Err(error) => {
                    log::error!("Chunk read failed after {chunks_processed} chunks: {error}");
                    break TerminationReason::ReadError;
                }
            };

            if chunk.is_empty() {
                log::info!("Stream ended, no more data");
                break TerminationReason::StreamEnded;
            }

            if chunks_processed == 0 {
                log::debug!("Stream format sniff: {}", sniff_format(&chunk));
            }

            chunks_processed += 1;
            bytes_read += chunk.len() as u64;
            buffer.extend_from_slice(&chunk);

            // Cadence fields are pub; guard against hand-set zeros.
            let at_checkpoint = chunks_processed % options.checkpoint_interval.max(1) == 0
                && buffer.len() >= options.checkpoint_threshold;
            if at_checkpoint {
                log::debug!(
                    "Checkpoint at chunk {chunks_processed}: extracting from {} byte buffer",
                    buffer.len()
                );
                let recovered = run_cascade(strategies, &buffer, &mut ctx);
                if recovered > 0 {
                    log::info!(
                        "Recovered {recovered} frame(s) at checkpoint, total {}",
                        ctx.frames_extracted()
                    );
                }

                // Trim to the bounded tail so memory stays capped. A
                // hand-set tail larger than the buffer trims nothing.
                if buffer.len() > options.buffer_hard_cap {
                    let excess = buffer.len().saturating_sub(options.buffer_trim_tail);
                    buffer.drain(..excess);
                }

                if ctx.remaining() == 0 {
                    break TerminationReason::TargetReached;
                }
            }

            if chunks_processed % options.progress_interval.max(1) == 0 {
                sink.on_progress(&ProgressUpdate {
                    elapsed: started.elapsed(),
                    frames_extracted: ctx.frames_extracted(),
                    bytes_read,
                    chunks_processed,
                    buffer_len: buffer.len(),
                });
            }
        };

        // Draining: one last pass over a meaningful leftover tail.
        if reason != TerminationReason::TargetReached
            && ctx.remaining() > 0
            && buffer.len() >= options.drain_threshold
        {
            log::debug!(
                "Final extraction pass over {} leftover bytes",
                buffer.len()
            );
            let recovered = run_cascade(strategies, &buffer, &mut ctx);
            if recovered > 0 {
                log::info!("Final pass recovered {recovered} frame(s)");
            }
        }

        source.close();

        let summary = ConsumptionSummary {
            frames_extracted: ctx.frames_extracted(),
            chunks_processed,
            bytes_read,
            elapsed_seconds: started.elapsed().as_secs_f64(),
            target_frames: options.target_frames,
            target_fps: options.extract_fps,
            stream_id: store.stream_id().to_string(),
            termination_reason: reason,
            session_dir: store.dir().to_path_buf(),
            completed_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_else(|_| "unknown".to_string()),
        };

        if let Err(error) =
            store.write_json(&summary, &store.dir().join("consumption_summary.json"))
        {
            log::warn!("Failed to persist consumption summary: {error}");
        }

        log::info!(
            "Session finished: {} frame(s), {} chunks, {} bytes, {:.1}s, reason: {}",
            summary.frames_extracted,
            summary.chunks_processed,
            summary.bytes_read,
            summary.elapsed_seconds,
            summary.termination_reason,
        );

        sink.on_complete(&summary);
        Ok(summary)
    }
}
