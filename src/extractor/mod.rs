//! Fuzzy extractor interface and the shipped sample-then-lock construction.
//!
//! A fuzzy extractor turns a noisy secret into a stable key:
//!
//! ```text
//! generate(w)       -> (key, helper)
//! reproduce(w', helper) -> key    if hamming(w, w') <= t  (w.p. >= 1 - failure_rate)
//!                       -> none   if hamming(w, w') >> t
//! ```
//!
//! Between the two the outcome is probabilistic. `t` is the radius that is
//! reliably accepted, not a sharp cut-off; see
//! [`ExtractorParams::accept_probability`] for the shipped construction.
//!
//! The flows depend only on the [`FuzzyExtractor`] trait, so the
//! construction can be swapped for any audited implementation exposing the
//! same two operations.

mod lockers;
mod params;

pub use lockers::SampleLockExtractor;
pub use params::{ExtractorParams, MAX_TOLERANCE_BITS};

use crate::encoding::Bitstring;
use crate::helper::Helper;
use std::sync::atomic::{compiler_fence, Ordering};
use thiserror::Error;

/// Hard failures of the extractor.
///
/// A reading that simply does not match is not an error; see
/// [`FuzzyExtractor::reproduce`].
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("bitstring is {actual} bytes, extractor expects {expected}")]
    InvalidInputLength { expected: usize, actual: usize },

    #[error("helper data is corrupt: {0}")]
    CorruptHelper(String),

    #[error("invalid extractor parameters: {0}")]
    InvalidParams(String),

    #[error("randomness source failed: {0}")]
    Randomness(String),
}

/// A derived secret key.
///
/// Never printed; zeroed when dropped.
#[derive(Clone)]
pub struct Key(Vec<u8>);

impl Key {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex, two characters per byte, no separators.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl PartialEq for Key {
    /// Constant time in the key length.
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

impl Eq for Key {}

impl Drop for Key {
    fn drop(&mut self) {
        self.0.fill(0);
        compiler_fence(Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

/// The generate/reproduce capability.
pub trait FuzzyExtractor {
    /// Bitstring length in bytes this extractor accepts.
    fn input_len(&self) -> usize;

    /// Hamming distance within which readings reliably reproduce the key.
    fn tolerance_bits(&self) -> u32;

    /// Derives a fresh key and its helper from an enrollment reading.
    ///
    /// Randomized: two calls on the same input give unrelated outputs.
    fn generate(&self, bitstring: &Bitstring) -> Result<(Key, Helper), ExtractorError>;

    /// Recovers the key locked in `helper` from a fresh reading.
    ///
    /// Readings within [`tolerance_bits`](Self::tolerance_bits) of the
    /// enrollment reading give `Some(key)` with high probability. Readings
    /// somewhat further away may still succeed; the chance falls with
    /// distance and is negligible for an unrelated reading.
    ///
    /// `Ok(None)` means the reading is not close enough to the enrollment
    /// reading. That is the normal outcome for an impostor or a poor
    /// capture, distinct from `Err(CorruptHelper)`.
    fn reproduce(
        &self,
        bitstring: &Bitstring,
        helper: &Helper,
    ) -> Result<Option<Key>, ExtractorError>;
}

impl<X: FuzzyExtractor + ?Sized> FuzzyExtractor for &X {
    fn input_len(&self) -> usize {
        (**self).input_len()
    }

    fn tolerance_bits(&self) -> u32 {
        (**self).tolerance_bits()
    }

    fn generate(&self, bitstring: &Bitstring) -> Result<(Key, Helper), ExtractorError> {
        (**self).generate(bitstring)
    }

    fn reproduce(
        &self,
        bitstring: &Bitstring,
        helper: &Helper,
    ) -> Result<Option<Key>, ExtractorError> {
        (**self).reproduce(bitstring, helper)
    }
}
