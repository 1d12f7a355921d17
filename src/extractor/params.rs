//! Sample-then-lock parameters.

use super::ExtractorError;
use serde::{Deserialize, Serialize};

/// Largest supported tolerance. The locker count grows as `2^t`.
pub const MAX_TOLERANCE_BITS: u32 = 16;

/// Parameters of a [`SampleLockExtractor`](super::SampleLockExtractor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorParams {
    /// Bitstring length in bytes.
    pub input_len: usize,
    /// Derived key length in bytes.
    pub key_len: usize,
    /// Hamming distance the extractor is sized to tolerate.
    pub tolerance_bits: u32,
    /// Zero bytes appended to the key inside each locker.
    pub check_len: usize,
    /// Per-locker nonce length in bytes.
    pub nonce_len: usize,
    /// Acceptable probability that a reading within tolerance fails.
    pub failure_rate: f64,
}

impl ExtractorParams {
    /// Parameters for `input_len`-byte bitstrings tolerating `tolerance_bits`
    /// flipped bits, with a key as long as the input.
    pub fn new(input_len: usize, tolerance_bits: u32) -> Self {
        Self {
            input_len,
            key_len: input_len,
            tolerance_bits,
            check_len: 4,
            nonce_len: 16,
            failure_rate: 0.001,
        }
    }

    pub fn with_key_len(mut self, key_len: usize) -> Self {
        self.key_len = key_len;
        self
    }

    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate;
        self
    }

    /// Bytes locked in each cipher row.
    #[inline]
    pub fn cipher_len(&self) -> usize {
        self.key_len + self.check_len
    }

    /// Number of lockers needed to meet `failure_rate` at `tolerance_bits`.
    ///
    /// Each locker samples every input bit with probability 1/2, so it
    /// avoids all `t` differing bits with probability `p = 2^-t`. All `L`
    /// lockers miss with probability `(1 - p)^L`; this returns the smallest
    /// `L` bringing that under `failure_rate`.
    pub fn locker_count(&self) -> usize {
        let p = 0.5f64.powi(self.tolerance_bits as i32);
        let count = (self.failure_rate.ln() / (-p).ln_1p()).ceil();
        if count.is_finite() && count >= 1.0 {
            count as usize
        } else {
            1
        }
    }

    /// Probability that a reading `distance` bits from the enrollment
    /// reading reproduces the key.
    ///
    /// A locker opens only if its sample misses all differing bits, so this
    /// is `1 - (1 - 2^-d)^L`. It is at least `1 - failure_rate` up to
    /// `tolerance_bits` and decays gradually beyond: with the defaults
    /// (`t = 8`, 1765 lockers) a reading 10 bits away is still accepted
    /// about 82% of the time, 16 bits away under 3%.
    pub fn accept_probability(&self, distance: u32) -> f64 {
        let miss_one = (-(0.5f64.powi(distance as i32))).ln_1p();
        1.0 - (self.locker_count() as f64 * miss_one).exp()
    }

    /// Checks the parameters are usable.
    pub fn validate(&self) -> Result<(), ExtractorError> {
        let invalid = |msg: String| Err(ExtractorError::InvalidParams(msg));

        if self.input_len == 0 {
            return invalid("input length must be non-zero".into());
        }
        if self.key_len == 0 || self.check_len == 0 || self.nonce_len == 0 {
            return invalid("key, check and nonce lengths must be non-zero".into());
        }
        if !(self.failure_rate > 0.0 && self.failure_rate < 1.0) {
            return invalid(format!(
                "failure rate {} must lie strictly between 0 and 1",
                self.failure_rate
            ));
        }
        if self.tolerance_bits > MAX_TOLERANCE_BITS {
            return invalid(format!(
                "tolerance of {} bits exceeds the supported maximum of {MAX_TOLERANCE_BITS}",
                self.tolerance_bits
            ));
        }
        if self.tolerance_bits as usize > self.input_len * 8 {
            return invalid(format!(
                "tolerance of {} bits exceeds the {}-bit input",
                self.tolerance_bits,
                self.input_len * 8
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let params = ExtractorParams::new(16, 8);
        assert!(params.validate().is_ok());
        assert_eq!(params.key_len, 16);
        assert_eq!(params.cipher_len(), 20);
    }

    #[test]
    fn test_locker_count_default() {
        // ceil(ln(0.001) / ln(1 - 1/256))
        assert_eq!(ExtractorParams::new(16, 8).locker_count(), 1765);
    }

    #[test]
    fn test_locker_count_grows_with_tolerance() {
        let low = ExtractorParams::new(16, 4).locker_count();
        let high = ExtractorParams::new(16, 10).locker_count();
        assert!(high > low * 32);
    }

    #[test]
    fn test_zero_tolerance_needs_one_locker() {
        assert_eq!(ExtractorParams::new(16, 0).locker_count(), 1);
    }

    #[test]
    fn test_accept_probability_curve() {
        let params = ExtractorParams::new(16, 8);
        assert_eq!(params.accept_probability(0), 1.0);
        assert!(params.accept_probability(8) >= 1.0 - params.failure_rate);
        assert!((params.accept_probability(10) - 0.822).abs() < 0.01);
        assert!(params.accept_probability(16) < 0.03);
        assert!(params.accept_probability(40) < 1e-8);

        let curve: Vec<f64> = (0..=32).map(|d| params.accept_probability(d)).collect();
        assert!(curve.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_excessive_tolerance_rejected() {
        let params = ExtractorParams::new(16, MAX_TOLERANCE_BITS + 1);
        assert!(matches!(params.validate(), Err(ExtractorError::InvalidParams(_))));

        let params = ExtractorParams::new(1, 9);
        assert!(matches!(params.validate(), Err(ExtractorError::InvalidParams(_))));
    }

    #[test]
    fn test_bad_failure_rate_rejected() {
        for rate in [0.0, 1.0, f64::NAN, -0.5] {
            let params = ExtractorParams::new(16, 8).with_failure_rate(rate);
            assert!(params.validate().is_err(), "rate {rate} accepted");
        }
    }
}
