//! Candidate string extraction.
//!
//! Locates NUL-terminated printable/UTF-8-like runs in a raw blob. The
//! scanner is a byte-class state machine, not a validator: overlong
//! encodings and surrogate byte patterns are accepted on purpose, since
//! false positives only add noise to the later correlation.

mod scan;

pub use scan::scan_string_offsets;
