//! Sign-based binarization of feature vectors.
//!
//! Unit-normalizing before thresholding at zero keeps the encoding
//! independent of the embedding's overall scale, so small angular
//! perturbations of the vector only flip the few components that sit
//! close to zero.

use super::Bitstring;
use crate::embedding::FeatureVector;

/// Deterministic feature-vector to bitstring encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitEncoder;

impl BitEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encodes a feature vector into a packed bitstring.
    ///
    /// One bit per component (`1` when the normalized component is `>= 0`),
    /// right-padded with zeros to a whole number of bytes. An all-zero vector
    /// is passed through unnormalized and encodes as all ones.
    pub fn encode(&self, vector: &FeatureVector) -> Bitstring {
        encode_components(vector.as_slice())
    }
}

/// Encodes raw components. Exposed for callers that hold a plain slice.
pub fn encode_components(components: &[f32]) -> Bitstring {
    let norm = components
        .iter()
        .map(|&c| f64::from(c) * f64::from(c))
        .sum::<f64>()
        .sqrt() as f32;

    let scale = if norm > 0.0 { norm } else { 1.0 };

    let bits = Bitstring::from_bits(components.iter().map(|&c| c / scale >= 0.0));

    tracing::trace!(
        components = components.len(),
        bytes = bits.len(),
        normalized = norm > 0.0,
        "Encoded feature vector"
    );

    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sign_threshold() {
        let bits = encode_components(&[0.8, -0.3, 0.1, -0.0, 0.0, -5.0, 2.0, -1.0]);
        // -0.0 >= 0.0 holds under IEEE comparison
        assert_eq!(bits.as_bytes(), &[0b1011_1010]);
    }

    #[test]
    fn test_all_zero_vector_encodes_all_ones() {
        let bits = encode_components(&[0.0; 10]);
        assert_eq!(bits.as_bytes(), &[0xFF, 0b1100_0000]);
        assert_eq!(bits.bit_len(), 10);
        assert_eq!(bits.popcount(), 10);
    }

    #[test]
    fn test_empty_vector() {
        let bits = encode_components(&[]);
        assert!(bits.is_empty());
        assert_eq!(bits.bit_len(), 0);
    }

    #[test]
    fn test_nan_encodes_as_zero() {
        let bits = encode_components(&[f32::NAN, 1.0]);
        assert_eq!(bits.bit(0), Some(false));
    }

    #[test]
    fn test_scale_invariance() {
        let v: Vec<f32> = (0..128).map(|i| ((i * 37 % 11) as f32) - 5.0).collect();
        let scaled: Vec<f32> = v.iter().map(|c| c * 1000.0).collect();
        assert_eq!(encode_components(&v), encode_components(&scaled));
    }

    #[test]
    fn test_encoder_matches_free_function() {
        let v = FeatureVector::new(vec![0.5, -0.5, 0.25]);
        assert_eq!(BitEncoder::new().encode(&v), encode_components(&[0.5, -0.5, 0.25]));
    }

    proptest! {
        #[test]
        fn prop_deterministic_and_sized(v in prop::collection::vec(-10.0f32..10.0, 0..300)) {
            let a = encode_components(&v);
            let b = encode_components(&v);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.padded_bit_len(), v.len().div_ceil(8) * 8);
            prop_assert_eq!(a.bit_len(), v.len());
        }

        #[test]
        fn prop_padding_bits_are_zero(v in prop::collection::vec(-1.0f32..1.0, 1..64)) {
            let bits = encode_components(&v);
            for i in v.len()..bits.padded_bit_len() {
                prop_assert_eq!(bits.bit(i), Some(false));
            }
        }
    }
}
