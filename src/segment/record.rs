//! Record codec
//!
//! Encodes and decodes the single log record that every segment is made of.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CaskError, Result};

/// Fixed header length: key_len (4) + value_len (4) + tombstone (1) + timestamp (8)
pub const HEADER_SIZE: usize = 17;

/// Fixed-width part of a record, read before the key and value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub key_len: u32,
    pub value_len: u32,
    pub tombstone: bool,
    /// Wall-clock milliseconds; metadata only, never used for ordering
    pub timestamp: u64,
}

impl RecordHeader {
    /// Decode a header from the first `HEADER_SIZE` bytes of `buf`
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(CaskError::TruncatedHeader {
                available: buf.len(),
            });
        }

        let key_len = buf.get_u32();
        let value_len = buf.get_u32();
        let tombstone = match buf.get_u8() {
            0 => false,
            1 => true,
            other => {
                return Err(CaskError::Corruption(format!(
                    "invalid tombstone flag: {}",
                    other
                )))
            }
        };
        let timestamp = buf.get_u64();

        Ok(Self {
            key_len,
            value_len,
            tombstone,
            timestamp,
        })
    }

    /// Write the header in big-endian layout
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32(self.key_len);
        buf.put_u32(self.value_len);
        buf.put_u8(self.tombstone as u8);
        buf.put_u64(self.timestamp);
    }

    /// Total on-disk span of the record this header describes
    pub fn record_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.key_len as u64 + self.value_len as u64
    }
}

/// A single key/value (or tombstone) entry in a segment
///
/// ```text
/// ┌──────────┬──────────┬─────────┬───────────────┬─────┬───────┐
/// │KeyLen (4)│ValLen (4)│Tomb (1) │ Timestamp (8) │ Key │ Value │
/// └──────────┴──────────┴─────────┴───────────────┴─────┴───────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub tombstone: bool,
    pub timestamp: u64,
}

impl Record {
    /// A live key/value record
    pub fn put(key: Vec<u8>, value: Vec<u8>, timestamp: u64) -> Self {
        Self {
            key,
            value,
            tombstone: false,
            timestamp,
        }
    }

    /// A deletion marker; carries no value bytes
    pub fn tombstone(key: Vec<u8>, timestamp: u64) -> Self {
        Self {
            key,
            value: Vec::new(),
            tombstone: true,
            timestamp,
        }
    }

    pub fn header(&self) -> RecordHeader {
        debug_assert!(self.key.len() <= u32::MAX as usize);
        debug_assert!(self.value.len() <= u32::MAX as usize);
        RecordHeader {
            key_len: self.key.len() as u32,
            value_len: self.value.len() as u32,
            tombstone: self.tombstone,
            timestamp: self.timestamp,
        }
    }

    /// Size of the encoded record in bytes
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.key.len() + self.value.len()
    }

    /// Serialize header, key and value into one contiguous buffer
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.header().encode_into(&mut buf);
        buf.put_slice(&self.key);
        buf.put_slice(&self.value);
        buf.freeze()
    }

    /// Decode one full record from the start of `buf`
    ///
    /// Bytes past the declared record span are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let header = RecordHeader::decode(buf)?;
        let expected = header.record_size();
        if (buf.len() as u64) < expected {
            return Err(CaskError::TruncatedRecord {
                expected,
                available: buf.len() as u64,
            });
        }

        let key_end = HEADER_SIZE + header.key_len as usize;
        let value_end = key_end + header.value_len as usize;

        Ok(Self {
            key: buf[HEADER_SIZE..key_end].to_vec(),
            value: buf[key_end..value_end].to_vec(),
            tombstone: header.tombstone,
            timestamp: header.timestamp,
        })
    }
}

/// Reject keys or values whose length cannot be stored in a u32 field
pub fn ensure_fits(len: usize) -> Result<()> {
    if len > u32::MAX as usize {
        return Err(CaskError::EntryTooLarge { len });
    }
    Ok(())
}

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
