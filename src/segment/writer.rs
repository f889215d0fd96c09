//! Segment Writer
//!
//! Appends records to the single active segment of a store.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::SyncStrategy;
use crate::error::Result;

use super::{free_segment_id, next_segment_id, Record, SegmentId};

/// Owns the active (writable) segment
///
/// The write cursor is tracked here instead of asking the filesystem, so an
/// append costs one `write` and no `stat`.
pub struct SegmentWriter {
    dir: PathBuf,
    id: SegmentId,
    file: File,
    /// Byte offset where the next record will start
    offset: u64,
    sync_strategy: SyncStrategy,
    /// Appends since the last fsync
    unsynced: usize,
    /// Set when a failed append left bytes that could not be cut off;
    /// the next append moves to a fresh segment
    sealed: bool,
}

impl SegmentWriter {
    /// Create a fresh segment whose id is one above the newest in `dir`
    pub fn create_next(dir: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let id = next_segment_id(dir)?;
        Self::open(dir, id, sync_strategy)
    }

    /// Open (or create) segment `id` for appending
    ///
    /// The cursor starts at the current file size, 0 for a new file.
    pub fn open(dir: &Path, id: SegmentId, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(id.path_in(dir))?;
        let offset = file.metadata()?.len();

        debug!(segment = %id, offset, "opened active segment");

        Ok(Self {
            dir: dir.to_path_buf(),
            id,
            file,
            offset,
            sync_strategy,
            unsynced: 0,
            sealed: false,
        })
    }

    /// Append a record, returning the offset at which it starts
    pub fn append(&mut self, record: &Record) -> Result<u64> {
        if self.sealed {
            self.rollover()?;
        }

        let bytes = record.encode();
        let offset = self.offset;

        if let Err(e) = self.file.write_all(&bytes) {
            // Drop whatever part of the record made it out so the tail stays framed
            let truncated = self.file.set_len(offset);
            self.discard_partial(offset, truncated)?;
            return Err(e.into());
        }

        self.offset += bytes.len() as u64;
        self.unsynced += 1;

        match self.sync_strategy {
            SyncStrategy::Never => {}
            SyncStrategy::EveryWrite => self.sync()?,
            SyncStrategy::EveryNEntries { count } => {
                if self.unsynced >= count {
                    self.sync()?;
                }
            }
        }

        Ok(offset)
    }

    /// Close the active segment and start the next one
    pub fn rollover(&mut self) -> Result<()> {
        self.file.flush()?;
        if self.sync_strategy != SyncStrategy::Never {
            self.sync()?;
        }

        let next = free_segment_id(&self.dir, next_segment_id(&self.dir)?.max(self.id.next()));
        debug!(from = %self.id, to = %next, size = self.offset, "rolling over segment");

        *self = Self::open(&self.dir, next, self.sync_strategy)?;
        Ok(())
    }

    /// Settle the cursor after a failed write
    ///
    /// If the partial record could not be truncated away, the cursor follows
    /// the real file length and the segment is sealed, so no later record is
    /// indexed at an offset inside the leftover bytes.
    fn discard_partial(&mut self, offset: u64, truncated: io::Result<()>) -> Result<()> {
        if let Err(e) = truncated {
            warn!(
                segment = %self.id,
                offset,
                error = %e,
                "could not truncate partial record, sealing segment"
            );
            self.offset = self.file.metadata()?.len();
            self.sealed = true;
        }
        Ok(())
    }

    /// True if the next append will start a new segment
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// True once the cursor has grown past `limit`
    pub fn exceeds(&self, limit: u64) -> bool {
        self.offset > limit
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Current write cursor (bytes in the segment)
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of appends not yet fsynced
    pub fn unsynced_count(&self) -> usize {
        self.unsynced
    }

    pub fn path(&self) -> PathBuf {
        self.id.path_in(&self.dir)
    }
}
