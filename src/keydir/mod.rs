//! KeyDir Module
//!
//! In-memory index from each key to its most recently written record.
//!
//! ## Responsibilities
//! - O(1) average lookup of a key's record location
//! - Last-write-wins: every write overwrites, regardless of timestamp
//! - Tombstones stay indexed until compaction removes the dead record
//!
//! ## Data Structure Choice
//! HashMap wrapped in RwLock:
//! - No ordering needed (listing and folding are unordered)
//! - Many concurrent readers, one writer at a time
//!
//! The KeyDir is never persisted; it is rebuilt from the segments at open.

mod table;

pub use table::KeyDir;

use crate::segment::SegmentId;

/// Location of the latest record for one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDirEntry {
    /// Segment holding the record
    pub segment_id: SegmentId,

    /// Byte offset of the record within the segment
    pub offset: u64,

    /// Full record span (header + key + value)
    pub size: u64,

    /// Timestamp stored in the record header
    pub timestamp: u64,

    /// True when the latest record is a deletion marker
    pub tombstone: bool,
}
