//! basefind: recover the probable base load address of a raw binary blob.
//!
//! Works on headerless inputs (memory dumps, firmware images, carved
//! executables) using only the blob's own contents: candidate pointer
//! values and candidate string locations are extracted, correlated per
//! modulus with an FFT circular cross-correlation, and the per-modulus
//! alignments are combined with the Chinese Remainder Theorem into a
//! single best-guess offset.

/// Configuration types for an analysis run
pub mod config;
/// Per-modulus correlation engine
pub mod correlate;
/// CRT reconstruction and offset interpretation
pub mod crt;
/// Error types
pub mod error;
/// Blob loading (memory-mapped file input)
pub mod input;
/// Tracing initialization helpers
pub mod logging;
/// Coprime modulus set construction
pub mod moduli;
/// End-to-end analysis pipeline
pub mod pipeline;
/// Candidate pointer extraction
pub mod pointers;
/// Candidate string extraction
pub mod strings;

pub use config::{AnalysisConfig, Endianness};
pub use crt::BaseEstimate;
pub use error::{BasefindError, Result};
pub use pipeline::{analyze, analyze_with_progress, Analysis};
