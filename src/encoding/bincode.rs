//! Fixed-width codec for serde types.
//!
//! bincode is configured with fixed-size integers and little-endian byte
//! order, so a struct made only of scalars and arrays always serializes to the
//! same number of bytes. Anything that smuggles in a length prefix (strings,
//! vectors, maps) is caught by comparing against the declared span.

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use super::check_span;
use crate::error::Result;
use crate::Error;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

/// Serialize `value` into `buf`, which must be exactly as long as the encoding.
pub fn encode_into<T: Serialize>(value: &T, buf: &mut [u8]) -> Result<()> {
    let bytes = options()
        .serialize(value)
        .map_err(|e| Error::Encode("value", e.to_string()))?;
    if bytes.len() != buf.len() {
        return Err(Error::UnsupportedType(format!(
            "value serialized to {} bytes but its fixed span is {}",
            bytes.len(),
            buf.len()
        )));
    }
    buf.copy_from_slice(&bytes);
    Ok(())
}

/// Deserialize a value from exactly `span` bytes.
pub fn decode<T: DeserializeOwned>(buf: &[u8], span: usize) -> Result<T> {
    check_span(span, buf.len())?;
    options()
        .deserialize(buf)
        .map_err(|e| Error::Decode("value", e.to_string()))
}

/// Checks that the default value of `T` serializes to exactly `span` bytes.
pub fn validate<T: Serialize + Default>(span: usize) -> Result<()> {
    let size = options()
        .serialized_size(&T::default())
        .map_err(|e| Error::Encode("value", e.to_string()))?;
    if size != span as u64 {
        return Err(Error::UnsupportedType(format!(
            "{} serializes to {} bytes, declared span is {}",
            std::any::type_name::<T>(),
            size,
            span
        )));
    }
    Ok(())
}

/// Implements [`FixedCodec`](crate::FixedCodec) for a serde type through
/// bincode.
///
/// The type must implement `Serialize`, `Deserialize` and `Default`; `$span`
/// is its serialized width. A wrong span is reported when a cache using the
/// type is opened.
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
///
/// depcache::bincode_codec!(Point, 16);
/// ```
#[macro_export]
macro_rules! bincode_codec {
    ($ty:ty, $span:expr) => {
        impl $crate::FixedCodec for $ty {
            const SPAN: usize = $span;

            fn shape() -> String {
                stringify!($ty).to_string()
            }

            fn encode_into(&self, buf: &mut [u8]) -> $crate::Result<()> {
                $crate::encoding::check_span(Self::SPAN, buf.len())?;
                $crate::encoding::bincode::encode_into(self, buf)
            }

            fn decode(buf: &[u8]) -> $crate::Result<Self> {
                $crate::encoding::bincode::decode(buf, Self::SPAN)
            }

            fn validate() -> $crate::Result<()> {
                $crate::encoding::bincode::validate::<Self>(Self::SPAN)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixedCodec;
    use serde::Deserialize;

    #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: u32,
        weight: f64,
        active: bool,
    }

    crate::bincode_codec!(Sample, 13);

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Labelled {
        label: String,
    }

    crate::bincode_codec!(Labelled, 8);

    #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
    struct Misdeclared {
        a: u64,
    }

    crate::bincode_codec!(Misdeclared, 4);

    #[test]
    fn test_struct_round_trip() {
        let original = Sample {
            id: 42,
            weight: 4.6,
            active: true,
        };

        let encoded = original.encode().unwrap();
        assert_eq!(encoded.len(), Sample::SPAN);
        assert_eq!(&encoded[..4], &42u32.to_le_bytes());
        assert_eq!(Sample::decode(&encoded).unwrap(), original);
    }

    #[test]
    fn test_shape_is_type_name() {
        assert_eq!(Sample::shape(), "Sample");
        assert!(Sample::validate().is_ok());
    }

    #[test]
    fn test_variable_length_is_rejected() {
        // The empty string fits the declared span (just the length prefix),
        // anything longer does not.
        assert!(Labelled::validate().is_ok());
        let value = Labelled {
            label: "too long".to_string(),
        };
        assert!(matches!(value.encode(), Err(Error::UnsupportedType(_))));
    }

    #[test]
    fn test_wrong_span_fails_validation() {
        assert!(matches!(
            Misdeclared::validate(),
            Err(Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_invalid_data() {
        let mut encoded = Sample::default().encode().unwrap();
        encoded[12] = 7;
        assert!(matches!(Sample::decode(&encoded), Err(Error::Decode(..))));
        assert!(matches!(
            Sample::decode(&encoded[..12]),
            Err(Error::SpanMismatch { .. })
        ));
    }
}
