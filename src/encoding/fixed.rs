//! Codecs for scalars, fixed arrays and tuples.
//!
//! Scalars are written little-endian, one field at a time. On the usual
//! little-endian hosts that is byte-for-byte the in-memory representation,
//! but unlike a raw memory copy it reads back the same everywhere.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use itertools::Itertools as _;

use super::{check_span, FixedCodec};
use crate::error::Result;
use crate::Error;

macro_rules! scalar_codec {
    ($ty:ty, $span:expr, $write:ident, $read:ident) => {
        impl FixedCodec for $ty {
            const SPAN: usize = $span;

            fn shape() -> String {
                stringify!($ty).to_string()
            }

            fn encode_into(&self, buf: &mut [u8]) -> Result<()> {
                check_span(Self::SPAN, buf.len())?;
                (&mut buf[..])
                    .$write::<LittleEndian>(*self)
                    .map_err(|e| Error::Encode(stringify!($ty), e.to_string()))
            }

            fn decode(buf: &[u8]) -> Result<Self> {
                check_span(Self::SPAN, buf.len())?;
                (&buf[..])
                    .$read::<LittleEndian>()
                    .map_err(|e| Error::Decode(stringify!($ty), e.to_string()))
            }
        }
    };
}

scalar_codec!(u16, 2, write_u16, read_u16);
scalar_codec!(u32, 4, write_u32, read_u32);
scalar_codec!(u64, 8, write_u64, read_u64);
scalar_codec!(u128, 16, write_u128, read_u128);
scalar_codec!(i16, 2, write_i16, read_i16);
scalar_codec!(i32, 4, write_i32, read_i32);
scalar_codec!(i64, 8, write_i64, read_i64);
scalar_codec!(i128, 16, write_i128, read_i128);
scalar_codec!(f32, 4, write_f32, read_f32);
scalar_codec!(f64, 8, write_f64, read_f64);

impl FixedCodec for u8 {
    const SPAN: usize = 1;

    fn shape() -> String {
        "u8".to_string()
    }

    fn encode_into(&self, buf: &mut [u8]) -> Result<()> {
        check_span(Self::SPAN, buf.len())?;
        buf[0] = *self;
        Ok(())
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        check_span(Self::SPAN, buf.len())?;
        Ok(buf[0])
    }
}

impl FixedCodec for i8 {
    const SPAN: usize = 1;

    fn shape() -> String {
        "i8".to_string()
    }

    fn encode_into(&self, buf: &mut [u8]) -> Result<()> {
        check_span(Self::SPAN, buf.len())?;
        (&mut buf[..])
            .write_i8(*self)
            .map_err(|e| Error::Encode("i8", e.to_string()))
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        check_span(Self::SPAN, buf.len())?;
        (&buf[..])
            .read_i8()
            .map_err(|e| Error::Decode("i8", e.to_string()))
    }
}

// Pointer-sized integers are always stored as 64 bits so files written on a
// 64-bit host keep their record size everywhere.
impl FixedCodec for usize {
    const SPAN: usize = 8;

    fn shape() -> String {
        "usize".to_string()
    }

    fn encode_into(&self, buf: &mut [u8]) -> Result<()> {
        (*self as u64).encode_into(buf)
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        let value = u64::decode(buf)?;
        usize::try_from(value).map_err(|e| Error::Decode("usize", e.to_string()))
    }
}

impl FixedCodec for isize {
    const SPAN: usize = 8;

    fn shape() -> String {
        "isize".to_string()
    }

    fn encode_into(&self, buf: &mut [u8]) -> Result<()> {
        (*self as i64).encode_into(buf)
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        let value = i64::decode(buf)?;
        isize::try_from(value).map_err(|e| Error::Decode("isize", e.to_string()))
    }
}

impl FixedCodec for bool {
    const SPAN: usize = 1;

    fn shape() -> String {
        "bool".to_string()
    }

    fn encode_into(&self, buf: &mut [u8]) -> Result<()> {
        u8::from(*self).encode_into(buf)
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        match u8::decode(buf)? {
            0x00 => Ok(false),
            0x01 => Ok(true),
            b => Err(Error::Decode("bool", format!("invalid byte {:#04x}", b))),
        }
    }
}

impl FixedCodec for char {
    const SPAN: usize = 4;

    fn shape() -> String {
        "char".to_string()
    }

    fn encode_into(&self, buf: &mut [u8]) -> Result<()> {
        u32::from(*self).encode_into(buf)
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        let code = u32::decode(buf)?;
        char::from_u32(code)
            .ok_or_else(|| Error::Decode("char", format!("invalid scalar value {:#x}", code)))
    }
}

impl<T: FixedCodec, const N: usize> FixedCodec for [T; N] {
    const SPAN: usize = T::SPAN * N;

    fn shape() -> String {
        format!("{}x{}", T::shape(), N)
    }

    fn encode_into(&self, buf: &mut [u8]) -> Result<()> {
        check_span(Self::SPAN, buf.len())?;
        for (i, item) in self.iter().enumerate() {
            item.encode_into(&mut buf[i * T::SPAN..(i + 1) * T::SPAN])?;
        }
        Ok(())
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        check_span(Self::SPAN, buf.len())?;
        let items = (0..N)
            .map(|i| T::decode(&buf[i * T::SPAN..(i + 1) * T::SPAN]))
            .collect::<Result<Vec<T>>>()?;
        items
            .try_into()
            .map_err(|_| Error::Decode("array", format!("expected {} items", N)))
    }

    fn validate() -> Result<()> {
        T::validate()
    }
}

macro_rules! tuple_codec {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: FixedCodec),+> FixedCodec for ($($name,)+) {
            const SPAN: usize = 0 $(+ $name::SPAN)+;

            fn shape() -> String {
                [$($name::shape()),+].iter().join("_")
            }

            #[allow(unused_assignments)]
            fn encode_into(&self, buf: &mut [u8]) -> Result<()> {
                check_span(Self::SPAN, buf.len())?;
                let mut offset = 0;
                $(
                    self.$idx.encode_into(&mut buf[offset..offset + $name::SPAN])?;
                    offset += $name::SPAN;
                )+
                Ok(())
            }

            #[allow(unused_assignments)]
            fn decode(buf: &[u8]) -> Result<Self> {
                check_span(Self::SPAN, buf.len())?;
                let mut offset = 0;
                Ok(($(
                    {
                        let value = $name::decode(&buf[offset..offset + $name::SPAN])?;
                        offset += $name::SPAN;
                        value
                    },
                )+))
            }

            fn validate() -> Result<()> {
                $($name::validate()?;)+
                Ok(())
            }
        }
    };
}

tuple_codec!(A.0);
tuple_codec!(A.0, B.1);
tuple_codec!(A.0, B.1, C.2);
tuple_codec!(A.0, B.1, C.2, D.3);
tuple_codec!(A.0, B.1, C.2, D.3, E.4);
tuple_codec!(A.0, B.1, C.2, D.3, E.4, F.5);
tuple_codec!(A.0, B.1, C.2, D.3, E.4, F.5, G.6);
tuple_codec!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7);
tuple_codec!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7, I.8);
tuple_codec!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7, I.8, J.9);
tuple_codec!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7, I.8, J.9, K.10);
tuple_codec!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7, I.8, J.9, K.10, L.11);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_spans() {
        assert_eq!(u8::SPAN, 1);
        assert_eq!(i16::SPAN, 2);
        assert_eq!(f32::SPAN, 4);
        assert_eq!(f64::SPAN, 8);
        assert_eq!(u128::SPAN, 16);
        assert_eq!(usize::SPAN, 8);
        assert_eq!(char::SPAN, 4);
    }

    #[test]
    fn test_scalars_are_little_endian() {
        assert_eq!(0x0102_0304u32.encode().unwrap(), vec![4, 3, 2, 1]);
        assert_eq!((-1i16).encode().unwrap(), vec![0xff, 0xff]);
        assert_eq!(1.5f64.encode().unwrap(), 1.5f64.to_le_bytes().to_vec());
    }

    #[test]
    fn test_float_bits_survive() {
        for value in [0.0f64, -0.0, f64::MIN_POSITIVE, f64::INFINITY, -4.6] {
            let decoded = f64::decode(&value.encode().unwrap()).unwrap();
            assert_eq!(decoded.to_bits(), value.to_bits());
        }
        assert!(f64::decode(&f64::NAN.encode().unwrap()).unwrap().is_nan());
    }

    #[test]
    fn test_bool_rejects_other_bytes() {
        assert!(bool::decode(&[1]).unwrap());
        assert!(!bool::decode(&[0]).unwrap());
        assert!(matches!(bool::decode(&[2]), Err(Error::Decode("bool", _))));
    }

    #[test]
    fn test_char_rejects_surrogates() {
        assert_eq!(char::decode(&'é'.encode().unwrap()).unwrap(), 'é');
        let surrogate = 0xD800u32.encode().unwrap();
        assert!(matches!(char::decode(&surrogate), Err(Error::Decode("char", _))));
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        assert!(matches!(
            u32::decode(&[0, 0, 0]),
            Err(Error::SpanMismatch {
                expected: 4,
                actual: 3
            })
        ));
        let mut buf = [0u8; 9];
        assert!(1u64.encode_into(&mut buf).is_err());
    }

    #[test]
    fn test_array_codec() {
        let value = [1.0f64, 2.5, -3.0];
        assert_eq!(<[f64; 3]>::SPAN, 24);
        assert_eq!(<[f64; 3]>::shape(), "f64x3");
        let encoded = value.encode().unwrap();
        assert_eq!(&encoded[8..16], &2.5f64.to_le_bytes());
        assert_eq!(<[f64; 3]>::decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_tuple_layout_has_no_padding() {
        type Pair = (u8, u64);
        assert_eq!(Pair::SPAN, 9);
        assert_eq!(Pair::shape(), "u8_u64");

        let encoded = (7u8, 1u64).encode().unwrap();
        assert_eq!(encoded, vec![7, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(Pair::decode(&encoded).unwrap(), (7, 1));
    }

    #[test]
    fn test_nested_tuple() {
        type Nested = (i32, (bool, [u16; 2]));
        assert_eq!(Nested::SPAN, 9);
        let value: Nested = (-5, (true, [3, 4]));
        assert_eq!(Nested::decode(&value.encode().unwrap()).unwrap(), value);
    }
}
