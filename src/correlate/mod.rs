//! Per-modulus correlation engine.
//!
//! For each modulus p, builds residue histograms of the pointer-target
//! and string-offset sets and finds their best circular alignment. The
//! string histogram is indexed by the negated residue, which turns the
//! desired cross-correlation into a circular convolution (convolution
//! theorem), computed either directly for sparse inputs or through an
//! arbitrary-length FFT.
//!
//! The modulus loop is embarrassingly parallel: every modulus reads the
//! same two immutable sets and owns its own histograms, so it runs under
//! rayon with per-task buffers. Peak memory is bounded by the largest
//! modulus times the worker count, not by the sum of all moduli.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};
use tracing::{debug, warn};

/// Peaks closer than this (in histogram counts) are considered tied.
const TIE_TOLERANCE: f64 = 1e-6;

/// Best circular alignment for one modulus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    pub modulus: u64,
    /// Best alignment offset modulo the modulus (lowest index on a tie).
    pub offset: u64,
    /// Correlation strength at the best offset, in matched pairs.
    pub peak: f64,
    /// Number of residues sharing the maximum. More than one means the
    /// signal at this modulus is weak or ambiguous.
    pub ties: usize,
}

/// Incremental progress observer: called with (moduli done, total).
/// The lifetime parameter lets callers pass closures that borrow local
/// state instead of forcing `'static` captures.
pub type ProgressFn<'a> = dyn Fn(usize, usize) + Send + Sync + 'a;

fn residue_histogram_forward(values: &HashSet<u64>, modulus: u64) -> Vec<f64> {
    let mut hist = vec![0.0f64; modulus as usize];
    for &x in values {
        hist[(x % modulus) as usize] += 1.0;
    }
    hist
}

fn residue_histogram_negated(values: &BTreeSet<u64>, modulus: u64) -> Vec<f64> {
    let mut hist = vec![0.0f64; modulus as usize];
    for &x in values {
        let r = x % modulus;
        let idx = if r == 0 { 0 } else { modulus - r };
        hist[idx as usize] += 1.0;
    }
    hist
}

/// Sparse O(nzA * nzB) circular convolution. Exact, and faster than the
/// transform when the histograms are mostly empty.
fn convolve_direct(a: &[f64], b: &[f64], modulus: usize) -> Vec<f64> {
    let nz_a: Vec<usize> = (0..modulus).filter(|&i| a[i] != 0.0).collect();
    let nz_b: Vec<usize> = (0..modulus).filter(|&i| b[i] != 0.0).collect();
    let mut out = vec![0.0f64; modulus];
    for &i in &nz_a {
        for &j in &nz_b {
            let mut k = i + j;
            if k >= modulus {
                k -= modulus;
            }
            out[k] += a[i] * b[j];
        }
    }
    out
}

/// Circular convolution via forward transform, pointwise product and
/// inverse transform. rustfft handles arbitrary (including prime)
/// lengths in O(p log p); only the real part carries signal, the
/// imaginary part is transform noise.
fn convolve_fft(a: &[f64], b: &[f64], modulus: usize) -> Vec<f64> {
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(modulus);
    let mut fa: Vec<Complex<f64>> = a.iter().map(|&v| Complex::new(v, 0.0)).collect();
    let mut fb: Vec<Complex<f64>> = b.iter().map(|&v| Complex::new(v, 0.0)).collect();
    forward.process(&mut fa);
    forward.process(&mut fb);
    for (x, y) in fa.iter_mut().zip(fb.iter()) {
        *x *= *y;
    }
    let inverse = planner.plan_fft_inverse(modulus);
    inverse.process(&mut fa);
    // rustfft leaves a uniform factor of `modulus` on the inverse;
    // normalize so peak values read as pair counts
    let scale = 1.0 / modulus as f64;
    fa.iter().map(|c| c.re * scale).collect()
}

/// Best circular alignment of the two sets modulo `modulus`.
pub fn best_alignment(
    pointers: &HashSet<u64>,
    strings: &BTreeSet<u64>,
    modulus: u64,
) -> Alignment {
    let p = modulus as usize;
    let a = residue_histogram_forward(pointers, modulus);
    let b = residue_histogram_negated(strings, modulus);

    // Direct sparse accumulation beats the transform when the work is
    // small compared to p log p.
    let fft_work = (p as u128) * u128::from(p.max(2).ilog2() + 1) * 4;
    let direct_work = (pointers.len() as u128) * (strings.len() as u128);
    let corr = if direct_work <= fft_work {
        convolve_direct(&a, &b, p)
    } else {
        convolve_fft(&a, &b, p)
    };

    let peak = corr.iter().fold(f64::NEG_INFINITY, |m, &v| m.max(v));
    let mut offset = 0u64;
    let mut ties = 0usize;
    for (i, &v) in corr.iter().enumerate() {
        if v > peak - TIE_TOLERANCE {
            if ties == 0 {
                offset = i as u64;
            }
            ties += 1;
        }
    }
    if ties > 1 {
        warn!(modulus, ties, peak, "ambiguous correlation peak");
    }
    Alignment {
        modulus,
        offset,
        peak,
        ties,
    }
}

/// Correlate both sets against every modulus, in parallel.
///
/// Each worker owns its histogram pair and frees it when the modulus is
/// done. `progress`, when given, is invoked once with a count of zero
/// before the loop starts and then after every completed modulus;
/// results are returned in modulus order regardless of completion order.
pub fn correlate_all(
    pointers: &HashSet<u64>,
    strings: &BTreeSet<u64>,
    moduli: &[u64],
    progress: Option<&ProgressFn<'_>>,
) -> Vec<Alignment> {
    let total = moduli.len();
    let done = AtomicUsize::new(0);
    if let Some(report) = progress {
        report(0, total);
    }
    moduli
        .par_iter()
        .map(|&modulus| {
            let alignment = best_alignment(pointers, strings, modulus);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(modulus, finished, total, "modulus correlated");
            if let Some(report) = progress {
                report(finished, total);
            }
            alignment
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shifted_sets(shift: u64) -> (HashSet<u64>, BTreeSet<u64>) {
        let strings: BTreeSet<u64> = [10, 50, 90].into_iter().collect();
        let pointers: HashSet<u64> = strings.iter().map(|s| s + shift).collect();
        (pointers, strings)
    }

    #[test]
    fn noise_free_recovery_is_exact() {
        let (pointers, strings) = shifted_sets(500);
        for p in [97u64, 101, 103, 1009] {
            let alignment = best_alignment(&pointers, &strings, p);
            assert_eq!(alignment.offset, 500 % p, "modulus {p}");
            assert_eq!(alignment.ties, 1, "modulus {p}");
            assert!((alignment.peak - 3.0).abs() < 1e-9, "modulus {p}");
        }
    }

    #[test]
    fn recovery_with_uncorrelated_noise() {
        let (mut pointers, strings) = shifted_sets(700);
        // a handful of junk targets must not displace a 3-pair peak
        pointers.extend([123_456, 9_999_991, 31_337]);
        let alignment = best_alignment(&pointers, &strings, 1013);
        assert_eq!(alignment.offset, 700 % 1013);
        assert_eq!(alignment.ties, 1);
    }

    #[test]
    fn direct_and_fft_paths_agree() {
        let p = 257usize;
        let mut a = vec![0.0f64; p];
        let mut b = vec![0.0f64; p];
        for i in [0usize, 3, 50, 119, 200, 256] {
            a[i] = 1.0;
        }
        a[50] = 4.0;
        for j in [7usize, 50, 118, 240] {
            b[j] = 1.0;
        }
        b[7] = 2.0;
        let direct = convolve_direct(&a, &b, p);
        let fft = convolve_fft(&a, &b, p);
        for (i, (x, y)) in direct.iter().zip(fft.iter()).enumerate() {
            assert!((x - y).abs() < 1e-7, "index {i}: {x} vs {y}");
        }
    }

    #[test]
    fn tie_between_two_shifts_is_reported() {
        // two pointer/string pairs with different shifts, equal support
        let strings: BTreeSet<u64> = [10, 400].into_iter().collect();
        let pointers: HashSet<u64> = [110, 700].into_iter().collect();
        let alignment = best_alignment(&pointers, &strings, 1009);
        assert!(alignment.ties > 1);
        assert!((alignment.peak - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_sets_tie_everywhere() {
        let pointers = HashSet::new();
        let strings = BTreeSet::new();
        let alignment = best_alignment(&pointers, &strings, 101);
        assert_eq!(alignment.ties, 101);
        assert_eq!(alignment.peak, 0.0);
    }

    #[test]
    fn parallel_results_keep_modulus_order() {
        let (pointers, strings) = shifted_sets(321);
        let moduli = [97u64, 101, 103, 107, 109];
        let alignments = correlate_all(&pointers, &strings, &moduli, None);
        let got: Vec<u64> = alignments.iter().map(|a| a.modulus).collect();
        assert_eq!(got, moduli);
        for a in &alignments {
            assert_eq!(a.offset, 321 % a.modulus);
        }
    }

    #[test]
    fn progress_reports_borrow_local_state() {
        use std::sync::Mutex;
        let (pointers, strings) = shifted_sets(42);
        let moduli = [97u64, 101, 103];
        // the observer borrows a stack-local; the callback type must not
        // demand 'static captures
        let calls: Mutex<Vec<usize>> = Mutex::new(Vec::new());
        let report = |done: usize, total: usize| {
            assert_eq!(total, moduli.len());
            calls.lock().unwrap().push(done);
        };
        correlate_all(&pointers, &strings, &moduli, Some(&report));
        let calls = calls.into_inner().unwrap();
        // one leading 0/total report, then one per completed modulus
        assert_eq!(calls.len(), moduli.len() + 1);
        assert_eq!(calls[0], 0);
        let mut sorted = calls.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
    }
}
