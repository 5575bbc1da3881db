//! Fixed-width binary codecs for cache keys and values.
//!
//! Every type stored in a cache file has a serialized width known at compile
//! time (`FixedCodec::SPAN`). That is what lets the loader slice a file into
//! records with plain offset arithmetic instead of length prefixes.
//!
//! Built-in codecs cover scalars, fixed arrays and tuples (see [`fixed`]).
//! Structs either implement [`FixedCodec`] by hand or go through serde with
//! [`bincode_codec!`](crate::bincode_codec). A type with neither is rejected
//! by the compiler where the cache is declared.

pub mod bincode;
pub mod fixed;

use crate::error::Result;
use crate::Error;

/// A value with a constant serialized width.
pub trait FixedCodec: Sized {
    /// Serialized width in bytes.
    const SPAN: usize;

    /// Short descriptor of the layout, used to derive cache file names.
    fn shape() -> String;

    /// Writes exactly `SPAN` bytes into `buf`.
    fn encode_into(&self, buf: &mut [u8]) -> Result<()>;

    /// Reads a value back from exactly `SPAN` bytes.
    fn decode(buf: &[u8]) -> Result<Self>;

    fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; Self::SPAN];
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Checks that the type really has the layout it claims. Called once when
    /// a cache is opened.
    fn validate() -> Result<()> {
        Ok(())
    }
}

/// Fails unless `actual` equals `expected`.
pub fn check_span(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::SpanMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_span() {
        assert!(check_span(8, 8).is_ok());
        assert!(matches!(
            check_span(8, 7),
            Err(Error::SpanMismatch {
                expected: 8,
                actual: 7
            })
        ));
    }

    #[test]
    fn test_encode_allocates_span() {
        let encoded = 7u32.encode().unwrap();
        assert_eq!(encoded.len(), u32::SPAN);
        assert_eq!(encoded, vec![7, 0, 0, 0]);
    }
}
