//! Transport encoding for helper data.
//!
//! A helper travels as a JSON array of records, one per buffer:
//!
//! ```text
//! [{"data": "<base64>", "shape": [2, 16], "dtype": "uint8"}, ...]
//! ```
//!
//! The codec is generic: it trusts nothing about rank, shape or element
//! type beyond what each record states, and it never reorders records.

use super::array::{ArrayError, DType, Helper, HelperArray};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while decoding helper data.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed helper record {index}: {reason}")]
    MalformedHelperRecord { index: usize, reason: String },

    #[error("helper JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// One serialized buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelperRecord {
    /// Base64 (standard alphabet, padded) of the raw little-endian bytes.
    pub data: String,
    /// Dimension sizes, outermost first.
    pub shape: Vec<usize>,
    /// Element type name.
    pub dtype: String,
}

/// Ordered list of records; the wire form of a [`Helper`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializedHelper(pub Vec<HelperRecord>);

impl SerializedHelper {
    #[inline]
    pub fn records(&self) -> &[HelperRecord] {
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
}

/// Helper serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelperCodec;

impl HelperCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encodes every buffer, in order.
    pub fn serialize(&self, helper: &Helper) -> SerializedHelper {
        let records = helper
            .iter()
            .map(|array| HelperRecord {
                data: STANDARD.encode(array.as_bytes()),
                shape: array.shape().to_vec(),
                dtype: array.dtype().name().to_string(),
            })
            .collect::<Vec<_>>();

        tracing::debug!(records = records.len(), "Serialized helper");
        SerializedHelper(records)
    }

    /// Rebuilds the helper, failing on the first malformed record.
    pub fn deserialize(&self, serialized: &SerializedHelper) -> Result<Helper, CodecError> {
        let helper = serialized
            .records()
            .iter()
            .enumerate()
            .map(|(index, record)| decode_record(index, record))
            .collect::<Result<Helper, _>>()?;

        tracing::debug!(arrays = helper.len(), "Deserialized helper");
        Ok(helper)
    }

    /// Serializes straight to JSON text.
    pub fn to_json(&self, helper: &Helper) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.serialize(helper))?)
    }

    /// Parses JSON text holding the record array, without decoding buffers.
    pub fn records_from_json(&self, json: &str) -> Result<SerializedHelper, CodecError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses and decodes JSON text holding the record array.
    pub fn from_json(&self, json: &str) -> Result<Helper, CodecError> {
        self.deserialize(&self.records_from_json(json)?)
    }

    /// Parses the double-encoded form, a JSON string literal whose contents
    /// are the record array, without decoding buffers.
    ///
    /// This is how the credential service's retrieve endpoint returns the
    /// helper.
    pub fn records_from_json_string(&self, quoted: &str) -> Result<SerializedHelper, CodecError> {
        let inner: String = serde_json::from_str(quoted)?;
        self.records_from_json(&inner)
    }

    /// Parses and decodes the double-encoded form.
    pub fn from_json_string(&self, quoted: &str) -> Result<Helper, CodecError> {
        self.deserialize(&self.records_from_json_string(quoted)?)
    }
}

fn decode_record(index: usize, record: &HelperRecord) -> Result<HelperArray, CodecError> {
    let malformed = |reason: String| CodecError::MalformedHelperRecord { index, reason };

    let dtype = DType::from_name(&record.dtype)
        .ok_or_else(|| malformed(format!("unrecognized dtype '{}'", record.dtype)))?;
    let bytes = STANDARD
        .decode(record.data.as_bytes())
        .map_err(|e| malformed(format!("invalid base64 payload: {e}")))?;

    HelperArray::from_raw(dtype, record.shape.clone(), bytes).map_err(|e| match e {
        ArrayError::LengthMismatch { expected, actual, .. } => malformed(format!(
            "payload is {actual} bytes, shape {:?} of {dtype} requires {expected}",
            record.shape
        )),
        other => malformed(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_helper() -> Helper {
        Helper::new(vec![
            HelperArray::from_elements(vec![2, 3], &[1u8, 2, 3, 4, 5, 6]).unwrap(),
            HelperArray::from_elements(vec![2], &[-1.5f32, 3.25]).unwrap(),
            HelperArray::from_elements(vec![], &[i64::MIN]).unwrap(),
        ])
    }

    #[test]
    fn test_serialize_records_in_order() {
        let serialized = HelperCodec::new().serialize(&sample_helper());
        let dtypes: Vec<_> = serialized.records().iter().map(|r| r.dtype.as_str()).collect();
        assert_eq!(dtypes, ["uint8", "float32", "int64"]);
        assert_eq!(serialized.records()[0].data, "AQIDBAUG");
        assert_eq!(serialized.records()[0].shape, vec![2, 3]);
    }

    #[test]
    fn test_round_trip() {
        let codec = HelperCodec::new();
        let helper = sample_helper();
        let decoded = codec.deserialize(&codec.serialize(&helper)).unwrap();
        assert_eq!(decoded, helper);
    }

    #[test]
    fn test_json_shape() {
        let helper = Helper::new(vec![HelperArray::from_elements(vec![3], &[0u8, 1, 2]).unwrap()]);
        let json = HelperCodec::new().to_json(&helper).unwrap();
        assert_eq!(json, r#"[{"data":"AAEC","shape":[3],"dtype":"uint8"}]"#);
    }

    #[test]
    fn test_double_encoded_string() {
        let codec = HelperCodec::new();
        let helper = sample_helper();
        let inner = codec.to_json(&helper).unwrap();
        let quoted = serde_json::to_string(&inner).unwrap();

        assert_eq!(codec.from_json_string(&quoted).unwrap(), helper);
        // The inner form is not itself a string literal.
        assert!(matches!(codec.from_json_string(&inner), Err(CodecError::Json(_))));
    }

    #[test]
    fn test_records_from_double_encoded_string() {
        let codec = HelperCodec::new();
        let helper = sample_helper();
        let quoted = serde_json::to_string(&codec.to_json(&helper).unwrap()).unwrap();

        let records = codec.records_from_json_string(&quoted).unwrap();
        assert_eq!(records, codec.serialize(&helper));
        assert_eq!(codec.deserialize(&records).unwrap(), helper);
    }

    #[test]
    fn test_unknown_dtype_is_malformed() {
        let serialized = SerializedHelper(vec![HelperRecord {
            data: "AAEC".into(),
            shape: vec![3],
            dtype: "complex64".into(),
        }]);
        let err = HelperCodec::new().deserialize(&serialized).unwrap_err();
        assert!(matches!(err, CodecError::MalformedHelperRecord { index: 0, .. }));
    }

    #[test]
    fn test_length_mismatch_is_malformed() {
        let serialized = SerializedHelper(vec![
            HelperRecord {
                data: "AAEC".into(),
                shape: vec![3],
                dtype: "uint8".into(),
            },
            HelperRecord {
                data: "AAEC".into(),
                shape: vec![1],
                dtype: "float32".into(),
            },
        ]);
        let err = HelperCodec::new().deserialize(&serialized).unwrap_err();
        assert!(matches!(err, CodecError::MalformedHelperRecord { index: 1, .. }));
    }

    #[test]
    fn test_bad_base64_is_malformed() {
        let serialized = SerializedHelper(vec![HelperRecord {
            data: "not base64!".into(),
            shape: vec![1],
            dtype: "uint8".into(),
        }]);
        let err = HelperCodec::new().deserialize(&serialized).unwrap_err();
        assert!(matches!(err, CodecError::MalformedHelperRecord { index: 0, .. }));
    }

    #[test]
    fn test_empty_helper() {
        let codec = HelperCodec::new();
        let helper = codec.from_json("[]").unwrap();
        assert!(helper.is_empty());
    }

    fn arb_array() -> impl Strategy<Value = HelperArray> {
        (
            prop::sample::select(DType::ALL.to_vec()),
            prop::collection::vec(0usize..5, 0..4),
        )
            .prop_flat_map(|(dtype, shape)| {
                let len = shape.iter().product::<usize>() * dtype.size();
                prop::collection::vec(any::<u8>(), len)
                    .prop_map(move |data| HelperArray::from_raw(dtype, shape.clone(), data).unwrap())
            })
    }

    proptest! {
        #[test]
        fn prop_round_trip_any_helper(arrays in prop::collection::vec(arb_array(), 0..6)) {
            let codec = HelperCodec::new();
            let helper = Helper::new(arrays);
            let json = codec.to_json(&helper).unwrap();
            prop_assert_eq!(codec.from_json(&json).unwrap(), helper);
        }
    }
}
