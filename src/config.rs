//! Configuration for an analysis run.
//!
//! All knobs are external to the algorithm core and validated before any
//! extraction happens.

use serde::{Deserialize, Serialize};

use crate::error::{BasefindError, Result};

/// Byte order used when decoding candidate pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    Little,
    Big,
}

/// Tunables for a single analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum length of candidate strings, in code points
    pub min_string_len: usize,
    /// Width of candidate pointers, in bytes (4 = 32-bit pointers)
    pub pointer_width: usize,
    /// Byte order of candidate pointers
    pub endianness: Endianness,
    /// Scan stride for candidate pointers, in bytes; defaults to the
    /// pointer width when unset
    pub alignment: Option<usize>,
    /// Slack factor scaling the modulus lower bound relative to blob
    /// size (higher = slower and more memory but more accurate);
    /// defaults to `min(1.0, 16.0 / alignment)` when unset
    pub slack_factor: Option<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_string_len: 5,
            pointer_width: 8,
            endianness: Endianness::Little,
            alignment: None,
            slack_factor: None,
        }
    }
}

impl AnalysisConfig {
    /// Effective pointer scan stride.
    pub fn alignment(&self) -> usize {
        self.alignment.unwrap_or(self.pointer_width)
    }

    /// Effective slack factor. The default keeps the ratio of pointer
    /// candidates to modulus size at most 1/16 so the noise floor of the
    /// residue histograms stays low.
    pub fn slack_factor(&self) -> f64 {
        self.slack_factor
            .unwrap_or_else(|| (16.0 / self.alignment() as f64).min(1.0))
    }

    /// Reject invalid configurations before extraction.
    pub fn validate(&self) -> Result<()> {
        if self.min_string_len == 0 {
            return Err(BasefindError::Config(
                "minimum string length must be at least 1".into(),
            ));
        }
        if self.pointer_width == 0 || self.pointer_width > 8 {
            return Err(BasefindError::Config(format!(
                "pointer width must be 1..=8 (got {})",
                self.pointer_width
            )));
        }
        if self.alignment() == 0 {
            return Err(BasefindError::Config(
                "pointer alignment must be at least 1".into(),
            ));
        }
        let f = self.slack_factor();
        if !(f.is_finite() && f > 0.0) {
            return Err(BasefindError::Config(format!(
                "slack factor must be a positive finite number (got {f})"
            )));
        }
        Ok(())
    }

    /// Lower bound for the modulus set: `floor(L * slack)`.
    pub fn modulus_lower_bound(&self, blob_len: usize) -> u64 {
        (blob_len as f64 * self.slack_factor()) as u64
    }

    /// Upper bound for the modulus set: `2^(8W) + L`, wide enough to
    /// cover both the positive and the negative offset interpretation.
    pub fn modulus_upper_bound(&self, blob_len: usize) -> u128 {
        (1u128 << (self.pointer_width * 8)) + blob_len as u128
    }

    /// Check that the derived modulus bounds leave a non-empty range.
    pub fn validate_bounds(&self, blob_len: usize) -> Result<()> {
        let lower = self.modulus_lower_bound(blob_len) as u128;
        let upper = self.modulus_upper_bound(blob_len);
        if lower >= upper {
            return Err(BasefindError::Config(format!(
                "slack factor {} puts the modulus lower bound ({lower}) at or above \
                 the upper bound ({upper})",
                self.slack_factor()
            )));
        }
        Ok(())
    }
}
