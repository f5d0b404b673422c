//! Adaptive three-stage streaming compression pipeline.
//!
//! Ported from the reference LZ4/zstd-style adaptive compressor
//! (`ZSTD_compress_advanced`'s multithreaded-adaptive sibling): a bounded
//! ring of job slots shuttled through a Reader, a Compressor, and a Writer,
//! each on its own thread, with a controller that retunes the compression
//! level at every job boundary from observed per-stage idle time.
//!
//! This module is deliberately independent of file paths, CLI parsing, and
//! progress-bar rendering (see `DESIGN.md`); [`supervisor::run`] operates on
//! any [`std::io::Read`] source and [`std::io::Write`] sink, the same way
//! [`crate::io::compress_frame`] and [`crate::io::compress_mt`] are layered
//! on top of the frame codec.
//!
//! # Layout
//!
//! - [`ring`] — the bounded job ring, its counter/condvar pairs, the shared
//!   progress/idle fields, and the abort flag (C1, C2).
//! - [`reader`] — the Reader stage (C3).
//! - [`compressor`] — the Compressor stage (C4), which also hosts the
//!   adaptive controller at each job boundary.
//! - [`writer`] — the Writer stage (C5).
//! - [`controller`] — the pure level-adaptation function (C6).
//! - [`codec`] — the narrow codec capability trait the Compressor depends on,
//!   and its LZ4F-backed implementation.
//! - [`supervisor`] — lifecycle: allocation, thread spawning, teardown (C7).
//! - [`error`] — the error surface stages report through the abort flag.

pub mod codec;
pub mod compressor;
pub mod controller;
pub mod error;
pub mod reader;
pub mod ring;
pub mod supervisor;
pub mod writer;

pub use codec::{AdaptiveCodec, Lz4fAdaptiveCodec};
pub use error::PipelineError;
pub use supervisor::{run, PipelineConfig, PipelineStats};
