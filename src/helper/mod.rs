//! Helper data and its transport encoding.
//!
//! The helper is public by construction: a fuzzy extractor's helper leaks
//! negligible information about the key it locks. It still has to travel
//! between client and credential service intact, which is what the codec
//! guarantees.

mod array;
mod codec;

pub use array::{ArrayError, DType, Element, Helper, HelperArray};
pub use codec::{CodecError, HelperCodec, HelperRecord, SerializedHelper};
