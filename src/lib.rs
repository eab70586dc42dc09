//! # framesalvage
//!
//! Recover still frames from a live, container-agnostic video byte stream.
//!
//! `framesalvage` consumes an open-ended chunked byte stream — typically a
//! live feed picked up mid-flight, with no knowledge of the container or
//! codec in use — and opportunistically extracts still images from it,
//! powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! Bytes accumulate in a bounded buffer; at checkpoint cadence, a cascade
//! of best-effort decoders runs against the buffer, falling through
//! strategies of decreasing structure assumption:
//!
//! 1. **Container trial** — treat the whole buffer as a WebM/MKV/MP4 file
//!    and decode it generically.
//! 2. **Embedded-image scan** — locate complete encoded JPEGs embedded
//!    verbatim in the byte stream.
//! 3. **Raw codec-unit scan** — locate H.264/VP8/VP9 start patterns, wrap a
//!    bounded window in a minimal container shim, and decode one frame.
//!
//! The first strategy that yields a frame wins the checkpoint. Memory and
//! wall-clock cost are bounded regardless of whether any frame is ever
//! recovered: the buffer is trimmed to a fixed tail, every scanner has
//! per-invocation caps, and the whole session is cut off by a timeout.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::fs::File;
//!
//! use framesalvage::{ConsumeOptions, ReaderSource, SessionStore, StreamConsumer};
//!
//! let store = SessionStore::create("data/raw", "camera-7").unwrap();
//! let options = ConsumeOptions::new().with_target_frames(10);
//!
//! let mut consumer = StreamConsumer::new(store, options);
//! let summary = consumer
//!     .run(ReaderSource::new(File::open("capture.bin").unwrap()))
//!     .unwrap();
//!
//! println!("{} frame(s) recovered", summary.frames_extracted);
//! ```
//!
//! Recovered frames land in a session-scoped directory as sequentially
//! numbered JPEGs, alongside a `consumption_summary.json` record.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod cascade;
pub mod config;
pub mod consumer;
pub mod container;
mod decode;
pub mod embedded;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod progress;
pub mod raw_unit;
mod scan;
mod scratch;
pub mod sniff;
pub mod source;
pub mod storage;
pub mod summary;

pub use cascade::{ExtractionContext, ExtractionStrategy, StrategyOutcome};
pub use config::ConsumeOptions;
pub use consumer::StreamConsumer;
pub use container::ContainerTrial;
pub use embedded::EmbeddedImageScan;
pub use error::SalvageError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame::{CodecFamily, RecoveredFrame, RecoveryMethod};
pub use progress::{CancellationToken, ProgressSink, ProgressUpdate};
pub use raw_unit::RawUnitScan;
pub use sniff::sniff_format;
pub use source::{ReaderSource, StreamSource};
pub use storage::SessionStore;
pub use summary::{ConsumptionSummary, TerminationReason};
