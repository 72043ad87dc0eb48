//! Coprime modulus set construction.
//!
//! Builds the CRT decomposition basis: an increasing list of odd,
//! pairwise coprime integers above a lower bound whose product exceeds
//! an upper bound. Only odd candidates are tried because aligned
//! pointers in real binaries share power-of-two structure that would
//! bias every even-modulus residue histogram identically and mask the
//! correlation signal.

/// Greatest common divisor (Euclid).
pub fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Return odd, pairwise coprime integers strictly greater than `lower`,
/// in increasing order, whose product exceeds `upper`.
///
/// A candidate is accepted when it is coprime to the running product;
/// since every previously accepted modulus divides the product, this is
/// sufficient for pairwise coprimality transitively.
pub fn build_moduli(lower: u64, upper: u128) -> Vec<u64> {
    let mut candidate = lower + 1 + (lower % 2);
    let mut moduli = Vec::new();
    let mut product: u128 = 1;
    while product <= upper {
        if gcd(u128::from(candidate), product) == 1 {
            moduli.push(candidate);
            product *= u128::from(candidate);
        }
        candidate += 2;
    }
    moduli
}
