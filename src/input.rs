//! Blob loading for the CLI surface.
//!
//! Memory-maps the input file so arbitrarily large dumps are analyzed
//! without copying. Failures are reported with the failing path before
//! any computation starts.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use crate::error::{BasefindError, Result};

/// Map a file read-only. Returns `None` for an empty file, since
/// mapping zero bytes fails on most platforms; callers treat that as an
/// empty blob.
pub fn load_blob<P: AsRef<Path>>(path: P) -> Result<Option<Mmap>> {
    let path = path.as_ref();
    let wrap = |source: std::io::Error| BasefindError::Input {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(wrap)?;
    let len = file.metadata().map_err(wrap)?.len();
    if len == 0 {
        return Ok(None);
    }
    let blob = unsafe { Mmap::map(&file) }.map_err(wrap)?;
    debug!(path = %path.display(), len, "blob mapped");
    Ok(Some(blob))
}
