//! Record layout of a cache file.
//!
//! ```text
//! +-----------------+-------------------+-----------------+-------------------+----
//! | key (KeySpan)   | value (ValueSpan) | key (KeySpan)   | value (ValueSpan) | ...
//! +-----------------+-------------------+-----------------+-------------------+----
//! ```
//!
//! No header, no length prefixes, no checksum. Record `i` occupies
//! `[i * record_size, (i + 1) * record_size)`.

use std::hash::Hash;

use crate::encoding::FixedCodec;
use crate::error::Result;
use crate::table::Table;

/// Byte geometry of one record for a key/value pair of types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub key_span: usize,
    pub value_span: usize,
}

impl Layout {
    pub fn of<K: FixedCodec, V: FixedCodec>() -> Self {
        Layout {
            key_span: K::SPAN,
            value_span: V::SPAN,
        }
    }

    pub fn record_size(&self) -> usize {
        self.key_span + self.value_span
    }

    /// Whole records contained in `len` bytes.
    pub fn record_count(&self, len: usize) -> usize {
        match self.record_size() {
            0 => 0,
            size => len / size,
        }
    }

    /// Bytes left over after the last whole record.
    pub fn trailing(&self, len: usize) -> usize {
        match self.record_size() {
            0 => len,
            size => len % size,
        }
    }
}

/// Decodes every whole record in `bytes` into `table`, returning how many were
/// read. A trailing partial record is ignored.
pub fn decode_into<K, V>(bytes: &[u8], table: &mut Table<K, V>) -> Result<usize>
where
    K: FixedCodec + Eq + Hash,
    V: FixedCodec + Clone,
{
    let layout = Layout::of::<K, V>();
    let record_count = layout.record_count(bytes.len());
    let record_size = layout.record_size();

    for i in 0..record_count {
        let record = &bytes[record_size * i..record_size * i + record_size];
        let (key, value) = record.split_at(layout.key_span);
        table.put(K::decode(key)?, V::decode(value)?);
    }

    Ok(record_count)
}

/// Encodes every entry of `table` back to back.
///
/// Entries whose value cannot be encoded are left out and logged; the rest of
/// the table is still written. Returns the buffer and the number of records
/// in it.
pub fn encode_table<K, V>(table: &Table<K, V>) -> (Vec<u8>, usize)
where
    K: FixedCodec + Eq + Hash,
    V: FixedCodec + Clone,
{
    let layout = Layout::of::<K, V>();
    let record_size = layout.record_size();
    let mut buf = Vec::with_capacity(table.len() * record_size);
    let mut written = 0;

    for (key, value) in table.iter() {
        let start = buf.len();
        buf.resize(start + record_size, 0);
        let (key_buf, value_buf) = buf[start..].split_at_mut(layout.key_span);

        if let Err(e) = key
            .encode_into(key_buf)
            .and_then(|_| value.encode_into(value_buf))
        {
            tracing::error!(error = %e, "Skipping cache entry that failed to encode");
            buf.truncate(start);
            continue;
        }
        written += 1;
    }

    (buf, written)
}
