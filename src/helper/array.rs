//! Typed, shaped byte buffers.

use thiserror::Error;

/// Element type of a helper array, spelled the way numpy spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl DType {
    /// All supported element types.
    pub const ALL: [DType; 11] = [
        DType::Bool,
        DType::U8,
        DType::I8,
        DType::U16,
        DType::I16,
        DType::U32,
        DType::I32,
        DType::U64,
        DType::I64,
        DType::F32,
        DType::F64,
    ];

    /// Wire name of the type.
    pub fn name(self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::U8 => "uint8",
            DType::I8 => "int8",
            DType::U16 => "uint16",
            DType::I16 => "int16",
            DType::U32 => "uint32",
            DType::I32 => "int32",
            DType::U64 => "uint64",
            DType::I64 => "int64",
            DType::F32 => "float32",
            DType::F64 => "float64",
        }
    }

    /// Parses a wire name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }

    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            DType::Bool | DType::U8 | DType::I8 => 1,
            DType::U16 | DType::I16 => 2,
            DType::U32 | DType::I32 | DType::F32 => 4,
            DType::U64 | DType::I64 | DType::F64 => 8,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Rust element types that can back a [`HelperArray`].
pub trait Element: Copy + sealed::Sealed {
    const DTYPE: DType;

    fn write_le(self, out: &mut Vec<u8>);

    /// `bytes` is exactly `DTYPE.size()` long.
    fn read_le(bytes: &[u8]) -> Self;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! numeric_element {
    ($($ty:ty => $dtype:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const DTYPE: DType = $dtype;

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(buf)
                }
            }
        )*
    };
}

numeric_element! {
    u8 => DType::U8,
    i8 => DType::I8,
    u16 => DType::U16,
    i16 => DType::I16,
    u32 => DType::U32,
    i32 => DType::I32,
    u64 => DType::U64,
    i64 => DType::I64,
    f32 => DType::F32,
    f64 => DType::F64,
}

impl sealed::Sealed for bool {}

impl Element for bool {
    const DTYPE: DType = DType::Bool;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// Raised when a buffer's length does not fit its declared shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayError {
    #[error("shape {shape:?} of {dtype} needs {expected} bytes, buffer has {actual}")]
    LengthMismatch {
        dtype: DType,
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },
    #[error("shape {0:?} overflows the addressable size")]
    ShapeOverflow(Vec<usize>),
}

/// One typed, shaped, row-major buffer of little-endian elements.
#[derive(Clone, PartialEq, Eq)]
pub struct HelperArray {
    dtype: DType,
    shape: Vec<usize>,
    data: Vec<u8>,
}

impl HelperArray {
    /// Wraps raw little-endian bytes, checking them against the shape.
    ///
    /// An empty shape denotes a scalar holding one element.
    pub fn from_raw(dtype: DType, shape: Vec<usize>, data: Vec<u8>) -> Result<Self, ArrayError> {
        let expected =
            byte_len(dtype, &shape).ok_or_else(|| ArrayError::ShapeOverflow(shape.clone()))?;
        if data.len() != expected {
            return Err(ArrayError::LengthMismatch {
                dtype,
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { dtype, shape, data })
    }

    /// Builds an array from typed elements.
    pub fn from_elements<T: Element>(shape: Vec<usize>, elements: &[T]) -> Result<Self, ArrayError> {
        let mut data = Vec::with_capacity(elements.len() * T::DTYPE.size());
        for &e in elements {
            e.write_le(&mut data);
        }
        Self::from_raw(T::DTYPE, shape, data)
    }

    /// Reads the elements back, or `None` if `T` is not the stored type.
    pub fn to_vec<T: Element>(&self) -> Option<Vec<T>> {
        if T::DTYPE != self.dtype {
            return None;
        }
        Some(
            self.data
                .chunks_exact(self.dtype.size())
                .map(T::read_le)
                .collect(),
        )
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Raw little-endian bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of elements.
    pub fn element_count(&self) -> usize {
        self.data.len() / self.dtype.size()
    }
}

impl std::fmt::Debug for HelperArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelperArray")
            .field("dtype", &self.dtype)
            .field("shape", &self.shape)
            .field("bytes", &self.data.len())
            .finish()
    }
}

fn byte_len(dtype: DType, shape: &[usize]) -> Option<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))?
        .checked_mul(dtype.size())
}

/// Public per-enrollment data needed to reproduce a key.
///
/// An ordered list of arrays; order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Helper {
    arrays: Vec<HelperArray>,
}

impl Helper {
    pub fn new(arrays: Vec<HelperArray>) -> Self {
        Self { arrays }
    }

    #[inline]
    pub fn arrays(&self) -> &[HelperArray] {
        &self.arrays
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HelperArray> {
        self.arrays.iter()
    }
}

impl FromIterator<HelperArray> for Helper {
    fn from_iter<I: IntoIterator<Item = HelperArray>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_names_round_trip() {
        for dtype in DType::ALL {
            assert_eq!(DType::from_name(dtype.name()), Some(dtype));
        }
        assert_eq!(DType::from_name("complex128"), None);
        assert_eq!(DType::from_name("UINT8"), None);
    }

    #[test]
    fn test_from_elements_little_endian() {
        let arr = HelperArray::from_elements(vec![2], &[1u16, 0x0203]).unwrap();
        assert_eq!(arr.as_bytes(), &[0x01, 0x00, 0x03, 0x02]);
        assert_eq!(arr.to_vec::<u16>(), Some(vec![1, 0x0203]));
        assert_eq!(arr.to_vec::<i16>(), None);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = HelperArray::from_raw(DType::F32, vec![2, 3], vec![0u8; 20]).unwrap_err();
        assert_eq!(
            err,
            ArrayError::LengthMismatch {
                dtype: DType::F32,
                shape: vec![2, 3],
                expected: 24,
                actual: 20,
            }
        );
    }

    #[test]
    fn test_scalar_shape() {
        let arr = HelperArray::from_elements(vec![], &[7.5f64]).unwrap();
        assert_eq!(arr.element_count(), 1);
        assert_eq!(arr.to_vec::<f64>(), Some(vec![7.5]));
    }

    #[test]
    fn test_zero_sized_dimension() {
        let arr = HelperArray::from_raw(DType::I64, vec![0, 5], Vec::new()).unwrap();
        assert_eq!(arr.element_count(), 0);
    }

    #[test]
    fn test_shape_overflow() {
        let err = HelperArray::from_raw(DType::U64, vec![usize::MAX, 2], Vec::new()).unwrap_err();
        assert!(matches!(err, ArrayError::ShapeOverflow(_)));
    }

    #[test]
    fn test_bool_elements() {
        let arr = HelperArray::from_elements(vec![3], &[true, false, true]).unwrap();
        assert_eq!(arr.as_bytes(), &[1, 0, 1]);
        assert_eq!(arr.to_vec::<bool>(), Some(vec![true, false, true]));
    }
}
