//! Segment Reader
//!
//! Sequential scan of one segment file, used by recovery.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::warn;

use crate::error::Result;

use super::{RecordHeader, SegmentId, HEADER_SIZE};

/// Location and key of one record found during a scan
///
/// The value is skipped; only what the index needs is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRecord {
    pub offset: u64,
    pub header: RecordHeader,
    pub key: Vec<u8>,
}

impl ScannedRecord {
    /// Full on-disk span of the record
    pub fn size(&self) -> u64 {
        self.header.record_size()
    }
}

/// Walks the records of a segment from offset 0 in write order
///
/// The scan ends quietly at the first record that cannot be read in full
/// (short header, bad tombstone flag, or lengths running past end of file).
/// Everything before that point is returned.
pub struct SegmentReader {
    id: SegmentId,
    reader: BufReader<File>,
    /// Start of the next record
    offset: u64,
    file_len: u64,
    truncated: bool,
}

impl SegmentReader {
    pub fn open(dir: &Path, id: SegmentId) -> Result<Self> {
        let file = File::open(id.path_in(dir))?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            id,
            reader: BufReader::new(file),
            offset: 0,
            file_len,
            truncated: false,
        })
    }

    /// Read the next complete record, or `None` at the end of valid data
    pub fn next_record(&mut self) -> Result<Option<ScannedRecord>> {
        if self.truncated {
            return Ok(None);
        }

        let remaining = self.file_len - self.offset;
        if remaining == 0 {
            return Ok(None);
        }

        if remaining < HEADER_SIZE as u64 {
            return Ok(self.stop(remaining, "incomplete header"));
        }

        let mut header_buf = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut header_buf)?;

        let header = match RecordHeader::decode(&header_buf) {
            Ok(header) => header,
            Err(_) => return Ok(self.stop(remaining, "inconsistent header")),
        };

        let size = header.record_size();
        if size > remaining {
            return Ok(self.stop(remaining, "record runs past end of file"));
        }

        let mut key = vec![0u8; header.key_len as usize];
        self.reader.read_exact(&mut key)?;
        self.reader.seek_relative(header.value_len as i64)?;

        let record = ScannedRecord {
            offset: self.offset,
            header,
            key,
        };
        self.offset += size;

        Ok(Some(record))
    }

    fn stop(&mut self, remaining: u64, reason: &str) -> Option<ScannedRecord> {
        warn!(
            segment = %self.id,
            offset = self.offset,
            dropped_bytes = remaining,
            reason,
            "ignoring truncated segment tail"
        );
        self.truncated = true;
        None
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Bytes of complete records scanned so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether the scan stopped at an incomplete tail
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl Iterator for SegmentReader {
    type Item = Result<ScannedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
