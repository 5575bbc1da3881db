//! Composite cache keys.
//!
//! A [`Deps`] wraps a tuple of plain values ("dependency tuple"). The tuple
//! type fixes the arity and the slot types, so the serialized width
//! `Deps::<T>::SPAN` is a compile-time constant and the loader can slice a
//! cache file without any framing.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::encoding::FixedCodec;
use crate::error::Result;
use crate::hasher::checksum;

/// A single value that can sit in a key slot.
pub trait Slot: FixedCodec + Copy + PartialEq {
    /// Hash of the slot's textual representation.
    fn slot_hash(&self) -> u64;
}

macro_rules! display_slot {
    ($($ty:ty),+) => {
        $(
            impl Slot for $ty {
                fn slot_hash(&self) -> u64 {
                    checksum(self.to_string().as_bytes())
                }
            }
        )+
    };
}

display_slot!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char);

macro_rules! float_slot {
    ($($ty:ty),+) => {
        $(
            impl Slot for $ty {
                fn slot_hash(&self) -> u64 {
                    // -0.0 == 0.0 but they print differently.
                    let value = if *self == 0.0 { 0.0 } else { *self };
                    checksum(value.to_string().as_bytes())
                }
            }
        )+
    };
}

float_slot!(f32, f64);

impl<T: Slot, const N: usize> Slot for [T; N] {
    fn slot_hash(&self) -> u64 {
        self.iter()
            .fold(0u64, |acc, item| acc.rotate_left(7) ^ item.slot_hash())
    }
}

/// A tuple of [`Slot`]s.
pub trait Slots: FixedCodec + Copy + PartialEq {
    /// XOR of every slot hash into `seed`.
    fn fold_hash(&self, seed: u64) -> u64;
}

macro_rules! tuple_slots {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: Slot),+> Slots for ($($name,)+) {
            fn fold_hash(&self, seed: u64) -> u64 {
                seed $(^ self.$idx.slot_hash())+
            }
        }
    };
}

tuple_slots!(A.0);
tuple_slots!(A.0, B.1);
tuple_slots!(A.0, B.1, C.2);
tuple_slots!(A.0, B.1, C.2, D.3);
tuple_slots!(A.0, B.1, C.2, D.3, E.4);
tuple_slots!(A.0, B.1, C.2, D.3, E.4, F.5);
tuple_slots!(A.0, B.1, C.2, D.3, E.4, F.5, G.6);
tuple_slots!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7);
tuple_slots!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7, I.8);
tuple_slots!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7, I.8, J.9);
tuple_slots!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7, I.8, J.9, K.10);
tuple_slots!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7, I.8, J.9, K.10, L.11);

/// Composite key over a fixed tuple of values.
///
/// Equality compares slots pairwise in declared order. The hash XOR-folds the
/// slot hashes starting from `u64::MAX`; it ignores slot order, so keys that
/// only differ by a permutation collide, which costs a probe but never a wrong
/// answer.
///
/// Float slots follow IEEE equality: a key containing NaN never matches
/// anything, including itself, so it is stored but can never be loaded.
#[derive(Clone, Copy)]
pub struct Deps<T>(T);

impl<T: Slots> Deps<T> {
    pub fn new(values: T) -> Self {
        Deps(values)
    }

    pub fn values(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Slots> From<T> for Deps<T> {
    fn from(values: T) -> Self {
        Deps(values)
    }
}

impl<T: Slots> PartialEq for Deps<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Slots> Eq for Deps<T> {}

impl<T: Slots> Hash for Deps<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.fold_hash(u64::MAX));
    }
}

impl<T: Slots + fmt::Debug> fmt::Debug for Deps<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deps{:?}", self.0)
    }
}

impl<T: Slots> FixedCodec for Deps<T> {
    const SPAN: usize = T::SPAN;

    fn shape() -> String {
        T::shape()
    }

    fn encode_into(&self, buf: &mut [u8]) -> Result<()> {
        self.0.encode_into(buf)
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        T::decode(buf).map(Deps)
    }

    fn validate() -> Result<()> {
        T::validate()
    }
}

/// Builds a [`Deps`] key from a list of values.
///
/// ```
/// use depcache::{deps, FixedCodec};
///
/// let key = deps!(1, 4.6);
/// assert_eq!(key, deps!(1, 4.6));
/// assert_eq!(depcache::Deps::<(i32, f64)>::SPAN, 12);
/// ```
#[macro_export]
macro_rules! deps {
    ($($value:expr),+ $(,)?) => {
        $crate::Deps::new(($($value,)+))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equal_keys() {
        let a = deps!(1, 4.6);
        let b = deps!(1, 4.6);
        assert_eq!(a, b);
        assert_eq!(a.encode().unwrap(), b.encode().unwrap());
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_different_keys() {
        assert_ne!(deps!(1, 4.6), deps!(2, 4.6));
        assert_ne!(deps!(1, 4.6), deps!(1, 4.7));
        assert_ne!(
            deps!(1, 4.6).encode().unwrap(),
            deps!(2, 4.6).encode().unwrap()
        );
    }

    #[test]
    fn test_key_span_is_sum_of_slots() {
        assert_eq!(Deps::<(i32, f64)>::SPAN, 12);
        assert_eq!(Deps::<(u8, u8, u8)>::SPAN, 3);
        assert_eq!(Deps::<(bool, [i16; 4], char)>::SPAN, 13);
        assert_eq!(Deps::<(i32, f64)>::shape(), "i32_f64");
    }

    #[test]
    fn test_serialized_layout() {
        let bytes = deps!(1i32, 4.6f64).encode().unwrap();
        assert_eq!(&bytes[..4], &1i32.to_le_bytes());
        assert_eq!(&bytes[4..], &4.6f64.to_le_bytes());

        let decoded = Deps::<(i32, f64)>::decode(&bytes).unwrap();
        assert_eq!(decoded, deps!(1, 4.6));
        assert_eq!(decoded.into_inner(), (1, 4.6));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let bytes = deps!(1i32, 4.6f64).encode().unwrap();
        assert!(Deps::<(i32, f64)>::decode(&bytes[..11]).is_err());
    }

    #[test]
    fn test_hash_is_seeded_xor_fold() {
        let key = deps!(7u32, 9u32);
        let expected = u64::MAX ^ 7u32.slot_hash() ^ 9u32.slot_hash();
        assert_eq!(key.values().fold_hash(u64::MAX), expected);

        // Swapping slots of the same type collides but stays unequal.
        let swapped = deps!(9u32, 7u32);
        assert_eq!(hash_of(&key), hash_of(&swapped));
        assert_ne!(key, swapped);
    }

    #[test]
    fn test_signed_zero_hashes_equally() {
        let positive = deps!(0.0f64);
        let negative = deps!(-0.0f64);
        assert_eq!(positive, negative);
        assert_eq!(hash_of(&positive), hash_of(&negative));
    }

    #[test]
    fn test_nan_never_matches() {
        let key = deps!(f64::NAN);
        let copy = key;
        assert_ne!(key, copy);
    }
}
