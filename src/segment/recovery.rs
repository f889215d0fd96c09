//! Recovery
//!
//! Rebuilds the KeyDir by replaying every segment at open time.

use std::path::Path;

use tracing::{info, trace};

use crate::error::Result;
use crate::keydir::{KeyDir, KeyDirEntry};

use super::{list_segments, SegmentReader};

/// Result of a recovery scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of segment files replayed
    pub segments_scanned: u64,

    /// Number of complete records applied to the index
    pub records_recovered: u64,

    /// Segments whose scan stopped at an incomplete tail
    pub truncated_segments: u64,

    /// Bytes of complete records across all segments
    pub bytes_scanned: u64,
}

/// Replay every segment in `dir` into a new KeyDir
///
/// Segments are scanned oldest to newest and records in write order, so the
/// last `set` for a key is always its most recent record. Timestamps are
/// never consulted. A truncated tail ends that segment's scan without error.
pub fn load_all(dir: &Path) -> Result<(KeyDir, RecoveryResult)> {
    let keydir = KeyDir::new();
    let mut result = RecoveryResult::default();

    for id in list_segments(dir)? {
        let mut reader = SegmentReader::open(dir, id)?;

        while let Some(record) = reader.next_record()? {
            trace!(
                segment = %id,
                offset = record.offset,
                tombstone = record.header.tombstone,
                "replaying record"
            );

            let entry = KeyDirEntry {
                segment_id: id,
                offset: record.offset,
                size: record.size(),
                timestamp: record.header.timestamp,
                tombstone: record.header.tombstone,
            };
            keydir.set(record.key, entry);
            result.records_recovered += 1;
        }

        result.segments_scanned += 1;
        result.bytes_scanned += reader.offset();
        if reader.is_truncated() {
            result.truncated_segments += 1;
        }
    }

    info!(
        segments = result.segments_scanned,
        records = result.records_recovered,
        truncated = result.truncated_segments,
        keys = keydir.len(),
        "recovered keydir"
    );

    Ok((keydir, result))
}
