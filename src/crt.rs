//! Chinese Remainder Theorem reconstruction and offset interpretation.
//!
//! Combines per-modulus alignments into the unique value `k` in
//! `[0, M)` satisfying every congruence, then maps `k` onto a signed
//! file offset. The modulus product can exceed 64 bits, so all modular
//! products go through an overflow-safe u128 multiply.

use std::fmt;

use serde::Serialize;

use crate::error::{BasefindError, Result};

/// Final outcome of the reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseEstimate {
    /// Blob is mapped below address 0 by this displacement (< blob length).
    Negative(u64),
    /// Base address representable in the configured pointer width.
    Positive(u128),
    /// Statistics did not localize to either interpretation.
    Inconclusive,
}

impl fmt::Display for BaseEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseEstimate::Negative(off) => write!(f, "-{off:#x}"),
            BaseEstimate::Positive(off) => write!(f, "{off:#x}"),
            BaseEstimate::Inconclusive => write!(f, "not found"),
        }
    }
}

#[inline]
fn add_mod(a: u128, b: u128, m: u128) -> u128 {
    // a, b < m, so one wrapping subtraction corrects any overflow
    let (sum, overflow) = a.overflowing_add(b);
    if overflow || sum >= m {
        sum.wrapping_sub(m)
    } else {
        sum
    }
}

/// `a * b mod m` without intermediate overflow.
fn mul_mod(mut a: u128, b: u128, m: u128) -> u128 {
    a %= m;
    let mut b = b % m;
    if let Some(product) = a.checked_mul(b) {
        return product % m;
    }
    let mut acc = 0u128;
    while b > 0 {
        if b & 1 == 1 {
            acc = add_mod(acc, a, m);
        }
        a = add_mod(a, a, m);
        b >>= 1;
    }
    acc
}

/// Modular multiplicative inverse of `a` mod `m` via extended Euclid.
/// `None` when `gcd(a, m) != 1`.
fn mod_inverse(a: u64, m: u64) -> Option<u64> {
    let (mut old_r, mut r) = (i128::from(a % m), i128::from(m));
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
    }
    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(i128::from(m)) as u64)
}

/// Combine `(modulus, residue)` pairs into `(k, M)` where `M` is the
/// product of all moduli and `k` the unique value in `[0, M)` congruent
/// to every residue.
///
/// A missing modular inverse means the pairwise-coprimality invariant of
/// the modulus builder was violated; that is an internal defect, not a
/// recoverable condition.
pub fn combine(alignments: &[(u64, u64)]) -> Result<(u128, u128)> {
    if alignments.is_empty() {
        return Err(BasefindError::Internal(
            "CRT reconstruction requires at least one modulus".into(),
        ));
    }
    let product: u128 = alignments.iter().map(|&(m, _)| u128::from(m)).product();
    let mut k = 0u128;
    for &(modulus, residue) in alignments {
        let partial = product / u128::from(modulus);
        let inverse = mod_inverse((partial % u128::from(modulus)) as u64, modulus)
            .ok_or_else(|| {
                BasefindError::Internal(format!(
                    "no modular inverse for {partial} mod {modulus}; modulus set not coprime"
                ))
            })?;
        let term = mul_mod(
            mul_mod(u128::from(residue), partial, product),
            u128::from(inverse),
            product,
        );
        k = add_mod(k, term, product);
    }
    Ok((k, product))
}

/// Map the reconstructed value onto a signed file offset.
///
/// `M - k` below the blob length means the blob sits at a negative
/// displacement from address 0; otherwise `k` itself must fit in the
/// configured pointer width to be a plausible positive base.
pub fn interpret(k: u128, product: u128, blob_len: usize, pointer_width: usize) -> BaseEstimate {
    let negative = product - k;
    if negative < blob_len as u128 {
        BaseEstimate::Negative(negative as u64)
    } else if k < 1u128 << (pointer_width * 8) {
        BaseEstimate::Positive(k)
    } else {
        BaseEstimate::Inconclusive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textbook_crt() {
        // unique value in [0, 105) with k % 3 == 2, k % 5 == 3, k % 7 == 2
        let (k, product) = combine(&[(3, 2), (5, 3), (7, 2)]).unwrap();
        assert_eq!(product, 105);
        assert_eq!(k, 23);
    }

    #[test]
    fn single_modulus_is_identity() {
        let (k, product) = combine(&[(97, 41)]).unwrap();
        assert_eq!((k, product), (41, 97));
    }

    #[test]
    fn non_coprime_moduli_are_an_internal_defect() {
        let err = combine(&[(6, 1), (9, 2)]).unwrap_err();
        assert!(matches!(err, BasefindError::Internal(_)));
    }

    #[test]
    fn empty_input_rejected() {
        assert!(combine(&[]).is_err());
    }

    #[test]
    fn wide_moduli_survive_overflow() {
        // product is far beyond u64; residues must still round-trip
        let moduli = [(0xFFFF_FFFB_u64, 123), (0xFFFF_FFFD, 456), (0xFFFF_FFFF, 789)];
        let (k, product) = combine(&moduli).unwrap();
        for &(m, r) in &moduli {
            assert_eq!(k % u128::from(m), u128::from(r));
        }
        assert!(product > u128::from(u64::MAX));
    }

    #[test]
    fn mod_inverse_basics() {
        assert_eq!(mod_inverse(3, 7), Some(5));
        assert_eq!(mod_inverse(1, 13), Some(1));
        assert_eq!(mod_inverse(6, 9), None);
    }

    #[test]
    fn mul_mod_overflowing_operands() {
        let m = (1u128 << 100) + 3;
        let a = (1u128 << 99) + 7;
        let b = (1u128 << 98) + 11;
        let got = mul_mod(a, b, m);
        // closed form check against the schoolbook identity
        // (a * b) mod m == ((a mod m) * (b mod m)) mod m, computed via
        // repeated halving of b
        let mut expect = 0u128;
        let (mut x, mut y) = (a % m, b);
        while y > 0 {
            if y & 1 == 1 {
                expect = (expect + x) % m;
            }
            x = (x + x) % m;
            y >>= 1;
        }
        assert_eq!(got, expect);
    }

    #[test]
    fn interpret_negative_wins_when_close_to_product() {
        let product = 1_000_000u128;
        let estimate = interpret(product - 100, product, 1024, 8);
        assert_eq!(estimate, BaseEstimate::Negative(100));
    }

    #[test]
    fn interpret_positive_when_representable() {
        let product = (1u128 << 64) + 100_000;
        let estimate = interpret(500, product, 1024, 8);
        assert_eq!(estimate, BaseEstimate::Positive(500));
    }

    #[test]
    fn interpret_inconclusive_outside_both_ranges() {
        // k too large for a 4-byte pointer, M - k not below blob length
        let product = 1u128 << 40;
        let estimate = interpret(1u128 << 36, product, 1024, 4);
        assert_eq!(estimate, BaseEstimate::Inconclusive);
    }

    #[test]
    fn display_formats() {
        assert_eq!(BaseEstimate::Negative(100).to_string(), "-0x64");
        assert_eq!(BaseEstimate::Positive(500).to_string(), "0x1f4");
        assert_eq!(BaseEstimate::Inconclusive.to_string(), "not found");
    }
}
