use crc::{Algorithm, Crc};

pub const CRC_64_ECMA: Algorithm<u64> = crc::CRC_64_ECMA_182;

const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA);

/// CRC-64 of `data`.
///
/// Slot hashes and tag suffixes go through this instead of `RandomState` so
/// the result is the same in every process.
pub fn checksum(data: &[u8]) -> u64 {
    CRC64.checksum(data)
}
