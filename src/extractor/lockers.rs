//! Sample-then-lock fuzzy extractor.
//!
//! # Construction
//!
//! Generation draws a random key, then builds `L` digital lockers. Locker
//! `i` holds a random mask `m_i`, a random nonce `n_i` and
//!
//! ```text
//! c_i = BLAKE3-XOF(domain, n_i || (w & m_i)) XOR (key || 0^check_len)
//! ```
//!
//! Reproduction recomputes the pad over `w' & m_i`. Whenever the sampled
//! bits of `w'` equal those of `w` the XOR yields the key followed by the
//! zero check bytes, which is how a correct opening is recognized.
//!
//! # Helper layout
//!
//! Three `uint8` arrays, in order: masks `[L, input_len]`,
//! nonces `[L, nonce_len]`, ciphers `[L, key_len + check_len]`.

use super::{ExtractorError, ExtractorParams, FuzzyExtractor, Key};
use crate::encoding::Bitstring;
use crate::helper::{DType, Helper, HelperArray};
use blake3::Hasher;
use rand_core::{CryptoRng, OsRng, RngCore};

/// Key-derivation context for locker pads.
/// Keeps these pads distinct from any other BLAKE3 use of the same bytes.
const LOCKER_DOMAIN: &str = "facekey 2024 sample-lock locker pad v1";

/// Sample-then-lock extractor over fixed-length bitstrings.
#[derive(Debug, Clone)]
pub struct SampleLockExtractor {
    params: ExtractorParams,
    lockers: usize,
}

impl SampleLockExtractor {
    /// Creates an extractor, validating the parameters.
    pub fn new(params: ExtractorParams) -> Result<Self, ExtractorError> {
        params.validate()?;
        let lockers = params.locker_count();

        tracing::debug!(
            input_len = params.input_len,
            tolerance_bits = params.tolerance_bits,
            lockers,
            "Configured sample-lock extractor"
        );

        Ok(Self { params, lockers })
    }

    /// Returns the parameters.
    pub fn params(&self) -> &ExtractorParams {
        &self.params
    }

    /// Returns the number of lockers per helper.
    pub fn locker_count(&self) -> usize {
        self.lockers
    }

    /// Generates with a caller-supplied randomness source.
    pub fn generate_with_rng<R: RngCore + CryptoRng>(
        &self,
        bitstring: &Bitstring,
        rng: &mut R,
    ) -> Result<(Key, Helper), ExtractorError> {
        self.check_input(bitstring)?;
        let p = &self.params;
        let input = bitstring.as_bytes();

        let mut key = vec![0u8; p.key_len];
        fill(rng, &mut key)?;

        let mut masks = vec![0u8; self.lockers * p.input_len];
        let mut nonces = vec![0u8; self.lockers * p.nonce_len];
        fill(rng, &mut masks)?;
        fill(rng, &mut nonces)?;

        let mut ciphers = Vec::with_capacity(self.lockers * p.cipher_len());
        let mut pad = vec![0u8; p.cipher_len()];
        for (mask, nonce) in masks
            .chunks_exact(p.input_len)
            .zip(nonces.chunks_exact(p.nonce_len))
        {
            self.locker_pad(input, mask, nonce, &mut pad);
            // Key bytes are masked by the pad; check bytes are the pad itself.
            let plaintext = key.iter().chain(std::iter::repeat(&0u8));
            ciphers.extend(pad.iter().zip(plaintext).map(|(a, b)| a ^ b));
        }

        let helper = Helper::new(vec![
            u8_matrix(self.lockers, p.input_len, masks)?,
            u8_matrix(self.lockers, p.nonce_len, nonces)?,
            u8_matrix(self.lockers, p.cipher_len(), ciphers)?,
        ]);

        tracing::info!(lockers = self.lockers, "Generated key and helper");
        Ok((Key::from_bytes(key), helper))
    }

    fn check_input(&self, bitstring: &Bitstring) -> Result<(), ExtractorError> {
        if bitstring.len() != self.params.input_len {
            return Err(ExtractorError::InvalidInputLength {
                expected: self.params.input_len,
                actual: bitstring.len(),
            });
        }
        Ok(())
    }

    fn locker_pad(&self, input: &[u8], mask: &[u8], nonce: &[u8], pad: &mut [u8]) {
        let sampled: Vec<u8> = input.iter().zip(mask.iter()).map(|(w, m)| w & m).collect();

        let mut hasher = Hasher::new_derive_key(LOCKER_DOMAIN);
        hasher.update(nonce);
        hasher.update(&sampled);
        hasher.finalize_xof().fill(pad);
    }

    /// Checks the helper has the layout this extractor produces.
    fn validate_helper<'h>(
        &self,
        helper: &'h Helper,
    ) -> Result<[&'h HelperArray; 3], ExtractorError> {
        let corrupt = |msg: String| ExtractorError::CorruptHelper(msg);
        let p = &self.params;

        let [masks, nonces, ciphers] = helper.arrays() else {
            return Err(corrupt(format!("expected 3 arrays, found {}", helper.len())));
        };

        let expected = [
            ("masks", masks, p.input_len),
            ("nonces", nonces, p.nonce_len),
            ("ciphers", ciphers, p.cipher_len()),
        ];
        let mut rows = None;
        for (name, array, width) in expected {
            if array.dtype() != DType::U8 {
                let dtype = array.dtype();
                return Err(corrupt(format!("{name} have dtype {dtype}, expected uint8")));
            }
            let &[count, cols] = array.shape() else {
                let shape = array.shape();
                return Err(corrupt(format!("{name} have shape {shape:?}, expected rank 2")));
            };
            if cols != width {
                return Err(corrupt(format!("{name} rows are {cols} bytes, expected {width}")));
            }
            match rows {
                None if count == 0 => return Err(corrupt("helper holds no lockers".into())),
                None => rows = Some(count),
                Some(n) if n != count => {
                    return Err(corrupt(format!("{name} hold {count} rows, masks hold {n}")));
                }
                Some(_) => {}
            }
        }

        Ok([masks, nonces, ciphers])
    }
}

impl FuzzyExtractor for SampleLockExtractor {
    fn input_len(&self) -> usize {
        self.params.input_len
    }

    fn tolerance_bits(&self) -> u32 {
        self.params.tolerance_bits
    }

    fn generate(&self, bitstring: &Bitstring) -> Result<(Key, Helper), ExtractorError> {
        self.generate_with_rng(bitstring, &mut OsRng)
    }

    fn reproduce(
        &self,
        bitstring: &Bitstring,
        helper: &Helper,
    ) -> Result<Option<Key>, ExtractorError> {
        self.check_input(bitstring)?;
        let [masks, nonces, ciphers] = self.validate_helper(helper)?;
        let p = &self.params;
        let input = bitstring.as_bytes();

        let mut pad = vec![0u8; p.cipher_len()];
        let lockers = masks
            .as_bytes()
            .chunks_exact(p.input_len)
            .zip(nonces.as_bytes().chunks_exact(p.nonce_len))
            .zip(ciphers.as_bytes().chunks_exact(p.cipher_len()));

        for (index, ((mask, nonce), cipher)) in lockers.enumerate() {
            self.locker_pad(input, mask, nonce, &mut pad);
            let opened: Vec<u8> = pad.iter().zip(cipher.iter()).map(|(a, b)| a ^ b).collect();
            let (key, check) = opened.split_at(p.key_len);

            if check.iter().all(|&b| b == 0) {
                tracing::debug!(locker = index, "Locker opened");
                return Ok(Some(Key::from_bytes(key.to_vec())));
            }
        }

        tracing::debug!("No locker opened");
        Ok(None)
    }
}

fn fill<R: RngCore>(rng: &mut R, dest: &mut [u8]) -> Result<(), ExtractorError> {
    rng.try_fill_bytes(dest)
        .map_err(|e| ExtractorError::Randomness(e.to_string()))
}

fn u8_matrix(rows: usize, cols: usize, data: Vec<u8>) -> Result<HelperArray, ExtractorError> {
    HelperArray::from_raw(DType::U8, vec![rows, cols], data)
        .map_err(|e| ExtractorError::CorruptHelper(e.to_string()))
}
