//! Candidate pointer extraction.
//!
//! Every aligned window of the blob is decoded as an unsigned integer
//! and treated as a pointer candidate. No plausibility filtering is
//! applied: true pointers produce a correlatable signal against the
//! string set, everything else contributes uncorrelated noise.

use std::collections::HashSet;

use crate::config::Endianness;

/// Decode `window` as an unsigned integer of the given byte order.
/// Widths up to 8 bytes are supported.
#[inline]
fn decode(window: &[u8], endianness: Endianness) -> u64 {
    match endianness {
        Endianness::Little => window
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        Endianness::Big => window.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
    }
}

/// Scan `data` at stride `alignment`, decoding `width` bytes per window,
/// and return the set of decoded values. Set semantics dedupe repeated
/// values, so the result does not depend on scan order.
pub fn scan_pointer_targets(
    data: &[u8],
    width: usize,
    alignment: usize,
    endianness: Endianness,
) -> HashSet<u64> {
    let mut targets = HashSet::new();
    if width == 0 || width > 8 || alignment == 0 || data.len() < width {
        return targets;
    }
    let mut i = 0usize;
    while i + width <= data.len() {
        targets.insert(decode(&data[i..i + width], endianness));
        i += alignment;
    }
    targets
}
