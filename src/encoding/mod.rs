//! Feature-vector binarization.
//!
//! This module converts real-valued face embeddings into packed
//! fixed-length bitstrings, the input format of the fuzzy extractor.

mod bitstring;
mod encoder;

pub use bitstring::Bitstring;
pub use encoder::{encode_components, BitEncoder};
