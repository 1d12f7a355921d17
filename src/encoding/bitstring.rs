//! Fixed-length bitstring type produced by the encoder.

/// A packed, fixed-length bit sequence.
///
/// Bits are stored most-significant-bit first within each byte. Only the
/// first `bit_len` bits carry information; the remainder of the final byte
/// is zero padding.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitstring {
    /// Packed byte data.
    data: Vec<u8>,
    /// Number of meaningful bits.
    bit_len: usize,
}

impl Bitstring {
    /// Wraps already-packed bytes. Every bit of every byte is meaningful.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let bit_len = data.len() * 8;
        Self { data, bit_len }
    }

    /// Packs a sequence of bits MSB-first, zero-padding the final byte.
    pub fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut data = Vec::new();
        let mut bit_len = 0usize;

        for bit in bits {
            if bit_len % 8 == 0 {
                data.push(0u8);
            }
            if bit {
                let last = data.len() - 1;
                data[last] |= 0x80 >> (bit_len % 8);
            }
            bit_len += 1;
        }

        Self { data, bit_len }
    }

    /// Returns the packed bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of meaningful (unpadded) bits.
    #[inline]
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns the total number of bits including padding.
    #[inline]
    pub fn padded_bit_len(&self) -> usize {
        self.data.len() * 8
    }

    /// Returns bit `index`, or `None` past the padded length.
    pub fn bit(&self, index: usize) -> Option<bool> {
        let byte = self.data.get(index / 8)?;
        Some(byte & (0x80 >> (index % 8)) != 0)
    }

    /// Counts the number of set bits.
    pub fn popcount(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Number of differing bit positions, or `None` if lengths differ.
    pub fn hamming_distance(&self, other: &Bitstring) -> Option<usize> {
        if self.data.len() != other.data.len() {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| (a ^ b).count_ones() as usize)
                .sum(),
        )
    }

    /// Returns a copy with the given bit positions inverted.
    ///
    /// Positions past the padded length are ignored.
    pub fn with_flipped_bits(&self, positions: &[usize]) -> Self {
        let mut data = self.data.clone();
        for &pos in positions {
            if let Some(byte) = data.get_mut(pos / 8) {
                *byte ^= 0x80 >> (pos % 8);
            }
        }
        Self {
            data,
            bit_len: self.bit_len,
        }
    }
}

impl std::fmt::Debug for Bitstring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Bit contents are biometric-derived; only report the shape.
        f.debug_struct("Bitstring")
            .field("bytes", &self.data.len())
            .field("bit_len", &self.bit_len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bits_msb_first() {
        let bits = Bitstring::from_bits([true, false, true, true, false, false, false, true]);
        assert_eq!(bits.as_bytes(), &[0b1011_0001]);
        assert_eq!(bits.bit_len(), 8);
    }

    #[test]
    fn test_from_bits_pads_final_byte() {
        let bits = Bitstring::from_bits([true, true, true]);
        assert_eq!(bits.as_bytes(), &[0b1110_0000]);
        assert_eq!(bits.bit_len(), 3);
        assert_eq!(bits.padded_bit_len(), 8);
    }

    #[test]
    fn test_hamming_distance() {
        let a = Bitstring::from_bytes(vec![0xFF, 0x00]);
        let b = Bitstring::from_bytes(vec![0xF0, 0x01]);
        assert_eq!(a.hamming_distance(&b), Some(5));
        assert_eq!(a.hamming_distance(&a), Some(0));
    }

    #[test]
    fn test_hamming_distance_length_mismatch() {
        let a = Bitstring::from_bytes(vec![0xFF]);
        let b = Bitstring::from_bytes(vec![0xFF, 0x00]);
        assert_eq!(a.hamming_distance(&b), None);
    }

    #[test]
    fn test_flip_bits() {
        let a = Bitstring::from_bytes(vec![0x00, 0x00]);
        let b = a.with_flipped_bits(&[0, 15, 99]);
        assert_eq!(b.as_bytes(), &[0x80, 0x01]);
        assert_eq!(a.hamming_distance(&b), Some(2));
    }

    #[test]
    fn test_bit_lookup() {
        let bits = Bitstring::from_bytes(vec![0b0100_0000]);
        assert_eq!(bits.bit(0), Some(false));
        assert_eq!(bits.bit(1), Some(true));
        assert_eq!(bits.bit(8), None);
    }
}
