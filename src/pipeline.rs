//! End-to-end analysis pipeline.
//!
//! Sequential batch computation: extraction, modulus construction,
//! per-modulus correlation, CRT reconstruction. Each stage consumes the
//! complete output of the previous one; only the correlation stage runs
//! in parallel internally.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::correlate::{correlate_all, ProgressFn};
use crate::error::Result;
use crate::moduli::build_moduli;
use crate::pointers::scan_pointer_targets;
use crate::crt::{self, BaseEstimate};
use crate::strings::scan_string_offsets;

/// Outcome of a run, with the statistics that back it.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub estimate: BaseEstimate,
    pub blob_len: usize,
    pub string_count: usize,
    pub pointer_count: usize,
    pub modulus_count: usize,
    /// Moduli whose correlation peak was tied (weak signal).
    pub weak_moduli: usize,
}

/// Analyze a blob with the given configuration.
pub fn analyze(blob: &[u8], config: &AnalysisConfig) -> Result<Analysis> {
    analyze_with_progress(blob, config, None)
}

/// Like [`analyze`], reporting correlation progress through `progress`.
pub fn analyze_with_progress(
    blob: &[u8],
    config: &AnalysisConfig,
    progress: Option<&ProgressFn<'_>>,
) -> Result<Analysis> {
    config.validate()?;
    config.validate_bounds(blob.len())?;

    let strings = scan_string_offsets(blob, config.min_string_len);
    info!(count = strings.len(), "strings located");
    let pointers = scan_pointer_targets(
        blob,
        config.pointer_width,
        config.alignment(),
        config.endianness,
    );
    info!(count = pointers.len(), "pointer candidates collected");

    // Empty input on either side means every residue histogram is all
    // zero; report that outright instead of a spuriously specific 0.
    if strings.is_empty() || pointers.is_empty() {
        warn!("empty string or pointer set; statistics cannot localize an offset");
        return Ok(Analysis {
            estimate: BaseEstimate::Inconclusive,
            blob_len: blob.len(),
            string_count: strings.len(),
            pointer_count: pointers.len(),
            modulus_count: 0,
            weak_moduli: 0,
        });
    }

    let lower = config.modulus_lower_bound(blob.len());
    let upper = config.modulus_upper_bound(blob.len());
    let moduli = build_moduli(lower, upper);
    info!(
        count = moduli.len(),
        lower,
        largest = moduli.last().copied().unwrap_or(0),
        "modulus set built"
    );

    let alignments = correlate_all(&pointers, &strings, &moduli, progress);
    let weak_moduli = alignments.iter().filter(|a| a.ties > 1).count();
    if weak_moduli > 0 {
        warn!(
            weak_moduli,
            total = alignments.len(),
            "some moduli had ambiguous peaks; the estimate may be unreliable"
        );
    }

    let pairs: Vec<(u64, u64)> = alignments.iter().map(|a| (a.modulus, a.offset)).collect();
    let (k, product) = crt::combine(&pairs)?;
    let estimate = crt::interpret(k, product, blob.len(), config.pointer_width);
    info!(%estimate, "reconstruction complete");

    Ok(Analysis {
        estimate,
        blob_len: blob.len(),
        string_count: strings.len(),
        pointer_count: pointers.len(),
        modulus_count: moduli.len(),
        weak_moduli,
    })
}
