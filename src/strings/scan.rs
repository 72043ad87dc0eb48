//! Byte-class state machine for NUL-terminated string candidates.

use std::collections::BTreeSet;

/// Length in bytes of the printable/UTF-8-like sequence starting at `i`,
/// or `None` if no sequence starts there.
///
/// Byte classes: printable ASCII (plus tab/LF/FF/CR), and 2-4 byte UTF-8
/// lead bytes followed by the right number of continuation bytes. The
/// 3- and 4-byte classes deliberately skip the E0/ED/F0/F4 range
/// restrictions, so overlong encodings and surrogates pass.
fn seq_len(data: &[u8], i: usize) -> Option<usize> {
    let b = *data.get(i)?;
    let len = match b {
        0x09 | 0x0A | 0x0C | 0x0D | 0x20..=0x7E => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return None,
    };
    if i + len > data.len() {
        return None;
    }
    if data[i + 1..i + len].iter().all(|&c| (0x80..=0xBF).contains(&c)) {
        Some(len)
    } else {
        None
    }
}

/// Scan `data` for maximal printable/UTF-8-like runs of at least
/// `min_len` code points that are immediately followed by a NUL byte,
/// and return the set of run start offsets.
///
/// Matching is leftmost, maximal-length and non-overlapping. A blob
/// shorter than `min_len + 1` bytes yields the empty set.
pub fn scan_string_offsets(data: &[u8], min_len: usize) -> BTreeSet<u64> {
    let mut out = BTreeSet::new();
    let mut i = 0usize;
    while i < data.len() {
        let start = i;
        let mut end = i;
        let mut points = 0usize;
        while let Some(len) = seq_len(data, end) {
            end += len;
            points += 1;
        }
        if points >= min_len && data.get(end) == Some(&0) {
            out.insert(start as u64);
            // consume the terminator as well
            i = end + 1;
        } else if end > start {
            // Failed run: no suffix can succeed where the whole run did
            // not (fewer code points, same terminator), so skip past it.
            i = end;
        } else {
            i += 1;
        }
    }
    out
}
