//! Stream consumption loop integration tests.
//!
//! The consumer is exercised with scripted stream sources and scripted
//! extraction strategies, so the loop's state machine, checkpoint gating,
//! short-circuiting, and termination reasons can be verified without any
//! real media.

use std::{
    collections::VecDeque,
    io::{self, Cursor},
    sync::{Arc, Mutex},
    time::Duration,
};

use framesalvage::{
    CancellationToken, ConsumeOptions, ExtractionContext, ExtractionStrategy, RecoveryMethod,
    SalvageError, SessionStore, StrategyOutcome, StreamConsumer, StreamSource,
};
use image::{DynamicImage, ImageFormat, RgbImage};

// ── Test doubles ───────────────────────────────────────────────────

struct SourceState {
    chunks: VecDeque<Result<Vec<u8>, String>>,
    closed: u32,
}

/// A stream source driven by a pre-recorded script of chunks and errors.
#[derive(Clone)]
struct ScriptedSource {
    state: Arc<Mutex<SourceState>>,
}

impl ScriptedSource {
    fn new(chunks: Vec<Result<Vec<u8>, String>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SourceState {
                chunks: chunks.into(),
                closed: 0,
            })),
        }
    }

    fn of_chunks(chunks: Vec<Vec<u8>>) -> Self {
        Self::new(chunks.into_iter().map(Ok).collect())
    }

    fn remaining(&self) -> usize {
        self.state.lock().unwrap().chunks.len()
    }

    fn close_count(&self) -> u32 {
        self.state.lock().unwrap().closed
    }
}

impl StreamSource for ScriptedSource {
    fn read_chunk(&mut self, _max: usize) -> io::Result<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        match state.chunks.pop_front() {
            Some(Ok(chunk)) => Ok(chunk),
            Some(Err(message)) => Err(io::Error::other(message)),
            None => Ok(Vec::new()),
        }
    }

    fn close(&mut self) {
        self.state.lock().unwrap().closed += 1;
    }
}

/// A strategy that extracts a scripted number of frames per invocation and
/// records the buffer length it observed each time.
struct ScriptedStrategy {
    label: &'static str,
    script: Vec<u32>,
    calls: Arc<Mutex<Vec<usize>>>,
    jpeg: Vec<u8>,
}

impl ScriptedStrategy {
    fn new(label: &'static str, script: Vec<u32>) -> Self {
        Self {
            label,
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
            jpeg: tiny_jpeg(),
        }
    }

    fn call_log(&self) -> Arc<Mutex<Vec<usize>>> {
        self.calls.clone()
    }
}

impl ExtractionStrategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        self.label
    }

    fn attempt(&mut self, buffer: &[u8], ctx: &mut ExtractionContext<'_>) -> StrategyOutcome {
        let mut calls = self.calls.lock().unwrap();
        let invocation = calls.len();
        calls.push(buffer.len());
        drop(calls);

        let scripted = self.script.get(invocation).copied().unwrap_or(0);
        let mut extracted = 0;
        while extracted < scripted && ctx.remaining() > 0 {
            let path = ctx.candidate_path();
            ctx.store()
                .write_frame(&self.jpeg, &path)
                .expect("write scripted frame");
            ctx.commit_candidate(path, RecoveryMethod::EmbeddedImage, None);
            extracted += 1;
        }
        StrategyOutcome::extracted(extracted)
    }
}

fn tiny_jpeg() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([12, 120, 40])));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .expect("in-memory JPEG encode");
    bytes
}

fn filler(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 100) as u8 + 1).collect()
}

/// Options that fire a checkpoint on every chunk.
fn eager_options() -> ConsumeOptions {
    ConsumeOptions::new()
        .with_checkpoint_interval(1)
        .with_checkpoint_threshold(1)
}

fn dir_entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── Termination reasons ────────────────────────────────────────────

#[test]
fn empty_stream_is_a_valid_zero_frame_session() {
    let root = tempfile::tempdir().unwrap();
    let store = SessionStore::create(root.path(), "cam").unwrap();
    let session_dir = store.dir().to_path_buf();

    let source = ScriptedSource::of_chunks(Vec::new());
    let mut consumer = StreamConsumer::new(store, ConsumeOptions::new());
    let summary = consumer.run(source.clone()).unwrap();

    assert_eq!(summary.frames_extracted, 0);
    assert_eq!(summary.chunks_processed, 0);
    assert_eq!(summary.bytes_read, 0);
    assert_eq!(summary.termination_reason.to_string(), "stream ended");
    assert_eq!(source.close_count(), 1);

    // No scratch files or frames left behind; only the two records.
    assert_eq!(
        dir_entries(&session_dir),
        vec!["consumption_summary.json", "session_info.json"]
    );

    // The persisted record agrees with the returned summary.
    let raw = std::fs::read_to_string(session_dir.join("consumption_summary.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["termination_reason"], "stream ended");
    assert_eq!(parsed["frames_extracted"], 0);
}

#[test]
fn target_reached_stops_without_reading_further_chunks() {
    let root = tempfile::tempdir().unwrap();
    let store = SessionStore::create(root.path(), "cam").unwrap();

    let source = ScriptedSource::of_chunks(vec![filler(100); 10]);
    let strategy = ScriptedStrategy::new("scripted", vec![2; 10]);

    let options = eager_options().with_target_frames(2);
    let mut consumer =
        StreamConsumer::new(store, options).with_strategies(vec![Box::new(strategy)]);
    let summary = consumer.run(source.clone()).unwrap();

    assert_eq!(summary.frames_extracted, 2);
    assert_eq!(summary.termination_reason.to_string(), "target reached");
    assert_eq!(summary.chunks_processed, 1);
    assert_eq!(source.remaining(), 9, "loop must not read past the target");
    assert_eq!(source.close_count(), 1);
}

#[test]
fn zero_duration_timeout_fires_before_any_read() {
    let root = tempfile::tempdir().unwrap();
    let store = SessionStore::create(root.path(), "cam").unwrap();

    let source = ScriptedSource::of_chunks(vec![filler(100); 3]);
    let options = ConsumeOptions::new().with_timeout(Duration::ZERO);
    let mut consumer = StreamConsumer::new(store, options);
    let summary = consumer.run(source.clone()).unwrap();

    assert_eq!(summary.termination_reason.to_string(), "timed out");
    assert_eq!(summary.frames_extracted, 0);
    assert_eq!(source.close_count(), 1);
}

#[test]
fn pre_cancelled_token_stops_the_session_gracefully() {
    let root = tempfile::tempdir().unwrap();
    let store = SessionStore::create(root.path(), "cam").unwrap();
    let session_dir = store.dir().to_path_buf();

    let token = CancellationToken::new();
    token.cancel();

    let source = ScriptedSource::of_chunks(vec![filler(100); 3]);
    let mut consumer = StreamConsumer::new(store, ConsumeOptions::new()).with_cancellation(token);
    let summary = consumer.run(source.clone()).unwrap();

    assert_eq!(summary.termination_reason.to_string(), "cancelled");
    assert_eq!(source.close_count(), 1);
    // A best-effort summary is still persisted.
    assert!(session_dir.join("consumption_summary.json").exists());
}

#[test]
fn first_read_failure_is_fatal_with_no_summary() {
    let root = tempfile::tempdir().unwrap();
    let store = SessionStore::create(root.path(), "cam").unwrap();
    let session_dir = store.dir().to_path_buf();

    let source = ScriptedSource::new(vec![Err("connection reset".to_string())]);
    let mut consumer = StreamConsumer::new(store, ConsumeOptions::new());
    let result = consumer.run(source.clone());

    match result {
        Err(SalvageError::StreamOpen { stream_id, reason }) => {
            assert_eq!(stream_id, "cam");
            assert!(reason.contains("connection reset"));
        }
        other => panic!("Expected StreamOpen error, got: {other:?}"),
    }

    assert_eq!(source.close_count(), 1);
    assert!(
        !session_dir.join("consumption_summary.json").exists(),
        "no summary may be fabricated for a session that never started"
    );
}

#[test]
fn mid_session_read_failure_terminates_with_summary() {
    let root = tempfile::tempdir().unwrap();
    let store = SessionStore::create(root.path(), "cam").unwrap();

    let source = ScriptedSource::new(vec![
        Ok(filler(100)),
        Err("connection reset".to_string()),
    ]);
    let mut consumer = StreamConsumer::new(store, ConsumeOptions::new());
    let summary = consumer.run(source.clone()).unwrap();

    assert_eq!(summary.termination_reason.to_string(), "read error");
    assert_eq!(summary.chunks_processed, 1);
    assert_eq!(summary.bytes_read, 100);
    assert_eq!(source.close_count(), 1);
}

// ── Cascade behaviour ──────────────────────────────────────────────

#[test]
fn cascade_short_circuits_on_first_successful_strategy() {
    let root = tempfile::tempdir().unwrap();
    let store = SessionStore::create(root.path(), "cam").unwrap();

    let first = ScriptedStrategy::new("first", vec![1; 10]);
    let second = ScriptedStrategy::new("second", vec![1; 10]);
    let third = ScriptedStrategy::new("third", vec![1; 10]);
    let second_calls = second.call_log();
    let third_calls = third.call_log();

    let source = ScriptedSource::of_chunks(vec![filler(100); 3]);
    let options = eager_options().with_target_frames(100);
    let mut consumer = StreamConsumer::new(store, options).with_strategies(vec![
        Box::new(first),
        Box::new(second),
        Box::new(third),
    ]);
    consumer.run(source).unwrap();

    assert!(
        second_calls.lock().unwrap().is_empty(),
        "second strategy must never run while the first succeeds"
    );
    assert!(third_calls.lock().unwrap().is_empty());
}

#[test]
fn cascade_falls_through_when_earlier_strategies_find_nothing() {
    let root = tempfile::tempdir().unwrap();
    let store = SessionStore::create(root.path(), "cam").unwrap();

    let first = ScriptedStrategy::new("first", vec![0; 10]);
    let second = ScriptedStrategy::new("second", vec![1; 10]);
    let third = ScriptedStrategy::new("third", vec![1; 10]);
    let first_calls = first.call_log();
    let third_calls = third.call_log();

    let source = ScriptedSource::of_chunks(vec![filler(100)]);
    let options = eager_options().with_target_frames(100);
    let mut consumer = StreamConsumer::new(store, options).with_strategies(vec![
        Box::new(first),
        Box::new(second),
        Box::new(third),
    ]);
    let summary = consumer.run(source).unwrap();

    assert_eq!(summary.frames_extracted, 1);
    assert_eq!(first_calls.lock().unwrap().len(), 1);
    assert!(
        third_calls.lock().unwrap().is_empty(),
        "third strategy must not run once the second succeeded"
    );
}

#[test]
fn sequence_indices_are_gapless_across_strategies() {
    let root = tempfile::tempdir().unwrap();
    let store = SessionStore::create(root.path(), "cam").unwrap();
    let session_dir = store.dir().to_path_buf();

    // First strategy contributes only at the first checkpoint; the second
    // takes over afterwards. Indices must keep counting without gaps.
    let first = ScriptedStrategy::new("first", vec![1, 0, 0, 0]);
    let second = ScriptedStrategy::new("second", vec![1, 1, 1]);

    let source = ScriptedSource::of_chunks(vec![filler(100); 4]);
    let options = eager_options().with_target_frames(4);
    let mut consumer = StreamConsumer::new(store, options)
        .with_strategies(vec![Box::new(first), Box::new(second)]);
    let summary = consumer.run(source).unwrap();

    assert_eq!(summary.frames_extracted, 4);
    assert_eq!(summary.termination_reason.to_string(), "target reached");

    let frames: Vec<String> = dir_entries(&session_dir)
        .into_iter()
        .filter(|name| name.starts_with("frame_"))
        .collect();
    assert_eq!(frames.len(), 4);
    for (position, name) in frames.iter().enumerate() {
        let expected = format!("frame_{:04}_", position + 1);
        assert!(
            name.starts_with(&expected),
            "expected {name} to start with {expected}"
        );
    }
}

#[test]
fn leftover_buffer_gets_one_draining_pass() {
    let root = tempfile::tempdir().unwrap();
    let store = SessionStore::create(root.path(), "cam").unwrap();

    let strategy = ScriptedStrategy::new("scripted", vec![1; 10]);
    let calls = strategy.call_log();

    // Checkpoints never fire (interval larger than the chunk count), so the
    // only extraction opportunity is the drain pass after the stream ends.
    let options = ConsumeOptions::new()
        .with_checkpoint_interval(100)
        .with_drain_threshold(1)
        .with_target_frames(5);
    let source = ScriptedSource::of_chunks(vec![filler(100); 2]);
    let mut consumer =
        StreamConsumer::new(store, options).with_strategies(vec![Box::new(strategy)]);
    let summary = consumer.run(source).unwrap();

    assert_eq!(summary.termination_reason.to_string(), "stream ended");
    assert_eq!(summary.frames_extracted, 1);
    assert_eq!(calls.lock().unwrap().len(), 1, "exactly one drain pass");
}

// ── Resource bounds ────────────────────────────────────────────────

#[test]
fn buffer_stays_bounded_by_cap_plus_one_chunk() {
    let root = tempfile::tempdir().unwrap();
    let store = SessionStore::create(root.path(), "cam").unwrap();

    let strategy = ScriptedStrategy::new("scripted", vec![0; 64]);
    let calls = strategy.call_log();

    let chunk_size = 400;
    let options = eager_options()
        .with_buffer_bounds(1_000, 500)
        .with_drain_threshold(usize::MAX);
    let source = ScriptedSource::of_chunks(vec![filler(chunk_size); 20]);
    let mut consumer =
        StreamConsumer::new(store, options).with_strategies(vec![Box::new(strategy)]);
    consumer.run(source).unwrap();

    let observed = calls.lock().unwrap();
    assert_eq!(observed.len(), 20);
    for length in observed.iter() {
        assert!(
            *length <= 1_000 + chunk_size,
            "buffer grew past hard cap + one chunk: {length}"
        );
    }
    // The trim must actually have engaged at least once.
    assert!(observed.iter().any(|length| *length > 1_000));
}

#[test]
fn frames_never_exceed_target() {
    let root = tempfile::tempdir().unwrap();
    let store = SessionStore::create(root.path(), "cam").unwrap();

    // Strategy would happily produce 5 per checkpoint; target is 3.
    let strategy = ScriptedStrategy::new("scripted", vec![5; 10]);
    let options = eager_options().with_target_frames(3);
    let source = ScriptedSource::of_chunks(vec![filler(100); 10]);
    let mut consumer =
        StreamConsumer::new(store, options).with_strategies(vec![Box::new(strategy)]);
    let summary = consumer.run(source).unwrap();

    assert_eq!(summary.frames_extracted, 3);
    assert_eq!(summary.target_frames, 3);
}

#[test]
fn hand_set_option_fields_cannot_panic_the_loop() {
    let root = tempfile::tempdir().unwrap();
    let store = SessionStore::create(root.path(), "cam").unwrap();

    // The option fields are public; writing them directly bypasses the
    // builder clamps. The loop must still not divide by zero or underflow
    // the trim arithmetic.
    let mut options = ConsumeOptions::new();
    options.checkpoint_interval = 0;
    options.progress_interval = 0;
    options.checkpoint_threshold = 1;
    options.buffer_hard_cap = 100;
    options.buffer_trim_tail = usize::MAX;
    options.drain_threshold = usize::MAX;

    let strategy = ScriptedStrategy::new("scripted", vec![0; 10]);
    let calls = strategy.call_log();

    let source = ScriptedSource::of_chunks(vec![filler(400); 3]);
    let mut consumer =
        StreamConsumer::new(store, options).with_strategies(vec![Box::new(strategy)]);
    let summary = consumer.run(source).unwrap();

    assert_eq!(summary.termination_reason.to_string(), "stream ended");
    assert_eq!(summary.chunks_processed, 3);
    // A zero interval behaves as "every chunk", not as a crash.
    assert_eq!(calls.lock().unwrap().len(), 3);
}
