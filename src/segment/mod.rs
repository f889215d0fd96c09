//! Segment Module
//!
//! The append-only log files that make up a store.
//!
//! ## Responsibilities
//! - Record codec with fixed-width length prefixes
//! - Appending to the single active segment, with rollover
//! - Sequential scans for crash recovery
//! - Cached read handles for point lookups
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//! ├── 00000001.data   (oldest)
//! ├── 00000002.data
//! └── 00000003.data   (active, newest)
//! ```
//!
//! Segment ids are zero-padded so a lexical sort of file names matches
//! chronological order. Files that do not parse as segment names are ignored.

mod pool;
mod reader;
mod record;
mod recovery;
mod writer;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{trace, warn};

use crate::error::{CaskError, Result};

pub use pool::ReadPool;
pub use reader::{ScannedRecord, SegmentReader};
pub use record::{ensure_fits, now_millis, Record, RecordHeader, HEADER_SIZE};
pub use recovery::{load_all, RecoveryResult};
pub use writer::SegmentWriter;

/// File extension shared by all segment files
pub const SEGMENT_SUFFIX: &str = ".data";

/// Digits in the zero-padded id part of a segment file name
pub const SEGMENT_ID_WIDTH: usize = 8;

/// Identifier of one segment file; higher ids are newer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(pub u64);

impl SegmentId {
    /// Id given to the first segment of an empty store
    pub const FIRST: SegmentId = SegmentId(1);

    pub fn next(self) -> Self {
        SegmentId(self.0 + 1)
    }

    /// "00000042.data"
    pub fn file_name(self) -> String {
        format!("{:0width$}{}", self.0, SEGMENT_SUFFIX, width = SEGMENT_ID_WIDTH)
    }

    pub fn path_in(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    /// Parse a segment file name
    /// "00000042.data" → SegmentId(42)
    pub fn from_file_name(name: &str) -> Result<Self> {
        let stem = name
            .strip_suffix(SEGMENT_SUFFIX)
            .ok_or_else(|| CaskError::InvalidSegmentName(name.to_string()))?;

        if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CaskError::InvalidSegmentName(name.to_string()));
        }

        stem.parse()
            .map(SegmentId)
            .map_err(|_| CaskError::InvalidSegmentName(name.to_string()))
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = SEGMENT_ID_WIDTH)
    }
}

/// List every segment in `dir`, oldest first
///
/// Stray files are skipped rather than treated as fatal.
pub fn list_segments(dir: &Path) -> Result<Vec<SegmentId>> {
    let mut ids = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = entry.file_name();
        let name = name.to_string_lossy();

        match SegmentId::from_file_name(&name) {
            Ok(id) => ids.push(id),
            Err(_) if !name.ends_with(SEGMENT_SUFFIX) => {
                trace!(file = %name, "ignoring non-segment file");
            }
            Err(e) => warn!(error = %e, "ignoring stray file in data directory"),
        }
    }

    ids.sort();
    Ok(ids)
}

/// Id one greater than the newest segment in `dir`
///
/// Never returns an id whose path is already taken by something that is not
/// a segment, such as a directory with a segment-like name.
pub fn next_segment_id(dir: &Path) -> Result<SegmentId> {
    let newest = list_segments(dir)?
        .last()
        .map(|id| id.next())
        .unwrap_or(SegmentId::FIRST);
    Ok(free_segment_id(dir, newest))
}

/// First id at or above `from` with nothing at its path
pub fn free_segment_id(dir: &Path, from: SegmentId) -> SegmentId {
    let mut id = from;
    while id.path_in(dir).exists() {
        warn!(path = %id.path_in(dir).display(), "segment name already taken, skipping id");
        id = id.next();
    }
    id
}
