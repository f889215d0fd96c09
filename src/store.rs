//! Store Module
//!
//! The public facade that coordinates the log and the index.
//!
//! ## Responsibilities
//! - Rebuild the KeyDir from segments on open
//! - Append writes to the active segment, then update the KeyDir
//! - Serve reads by seeking straight to the indexed record
//! - Hand compaction off to the Compactor

use std::fs;
use std::io;
use std::path::Path;

use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::compaction::{Compactor, MergeResult};
use crate::config::Config;
use crate::error::{CaskError, Result};
use crate::keydir::{KeyDir, KeyDirEntry};
use crate::segment::{
    ensure_fits, list_segments, load_all, now_millis, ReadPool, Record, SegmentId,
    SegmentWriter,
};

/// An open log-structured key-value store
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader
///
/// - **Writes** (put/delete/merge/sync): Serialized by the `writer` mutex
///   - The lock covers append → KeyDir update → rollover, so the order in
///     which calls return is the order of their records in the log
///
/// - **Reads** (get/list_keys/fold): Never take the writer lock
///   - KeyDir uses an internal RwLock
///   - `segment_guard` is held shared while a read touches segment files and
///     exclusively while compaction deletes them
pub struct Store {
    /// Store configuration
    config: Config,

    /// Key → latest record location (internal RwLock)
    keydir: KeyDir,

    /// Cached read handles per segment
    readers: ReadPool,

    /// Active segment; `None` when opened read-only
    writer: Option<Mutex<SegmentWriter>>,

    /// Keeps segment files from being deleted under an in-flight read
    segment_guard: RwLock<()>,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory if it doesn't exist
    /// 2. Replay every segment into a fresh KeyDir
    /// 3. If read-write, start a new active segment for this session
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let (keydir, recovery) = load_all(&config.data_dir)?;

        // Never append to a segment another session left behind
        let writer = if config.read_write {
            let writer = SegmentWriter::create_next(&config.data_dir, config.sync_strategy)?;
            Some(Mutex::new(writer))
        } else {
            None
        };

        info!(
            dir = %config.data_dir.display(),
            read_write = config.read_write,
            segments = recovery.segments_scanned,
            live_keys = keydir.live_count(),
            "store opened"
        );

        Ok(Self {
            readers: ReadPool::new(&config.data_dir),
            config,
            keydir,
            writer,
            segment_guard: RwLock::new(()),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().data_dir(path.as_ref()).build();
        Self::open(config)
    }

    /// Get a value by key
    ///
    /// Returns `Ok(None)` when the key was never written or its latest
    /// record is a tombstone.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let _files = self.segment_guard.read();

        match self.keydir.get(key) {
            Some(entry) if !entry.tombstone => self.read_entry(key, &entry).map(Some),
            _ => Ok(None),
        }
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Acquire the writer
    /// 2. Append the record to the active segment
    /// 3. Point the KeyDir at it
    /// 4. Roll over if the segment outgrew its limit
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut writer = self.writer_lock()?;

        ensure_fits(key.len())?;
        ensure_fits(value.len())?;

        let record = Record::put(key.to_vec(), value.to_vec(), now_millis());
        self.append_locked(&mut writer, record)
    }

    /// Delete a key
    ///
    /// Appends a tombstone so the delete survives a restart. Deleting a key
    /// that does not exist still writes the tombstone.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let mut writer = self.writer_lock()?;

        ensure_fits(key.len())?;

        let record = Record::tombstone(key.to_vec(), now_millis());
        self.append_locked(&mut writer, record)
    }

    /// All live keys, in no particular order
    pub fn list_keys(&self) -> Vec<Vec<u8>> {
        self.keydir.live_keys()
    }

    /// Fold over every live key/value pair, in no particular order
    ///
    /// Keys deleted while the fold is running are skipped.
    pub fn fold<T, F>(&self, init: T, mut f: F) -> Result<T>
    where
        F: FnMut(T, &[u8], Vec<u8>) -> T,
    {
        let mut acc = init;
        for key in self.keydir.live_keys() {
            if let Some(value) = self.get(&key)? {
                acc = f(acc, &key, value);
            }
        }
        Ok(acc)
    }

    /// Compact all live records into a single new segment
    pub fn merge(&self) -> Result<MergeResult> {
        let mut writer = self.writer_lock()?;
        Compactor::new(self).run(&mut writer)
    }

    /// Force sync of the active segment (no-op when read-only)
    pub fn sync(&self) -> Result<()> {
        if let Some(writer) = &self.writer {
            writer.lock().sync()?;
        }
        Ok(())
    }

    /// Close the store gracefully
    ///
    /// Syncs the active segment and releases every file handle. An active
    /// segment that never received a record is removed.
    ///
    /// Dropping a `Store` does the same on a best-effort basis; `close` is
    /// the way to find out whether it worked.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()?;
        info!(dir = %self.config.data_dir.display(), "store closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_read_only(&self) -> bool {
        self.writer.is_none()
    }

    /// Number of live (non-tombstoned) keys
    pub fn key_count(&self) -> usize {
        self.keydir.live_count()
    }

    /// Number of segment files currently in the data directory
    pub fn segment_count(&self) -> Result<usize> {
        Ok(list_segments(&self.config.data_dir)?.len())
    }

    /// Id of the segment receiving writes, if read-write
    pub fn active_segment_id(&self) -> Option<SegmentId> {
        self.writer.as_ref().map(|writer| writer.lock().id())
    }

    // =========================================================================
    // Crate-internal helpers (used by the Compactor)
    // =========================================================================

    pub(crate) fn keydir(&self) -> &KeyDir {
        &self.keydir
    }

    pub(crate) fn readers(&self) -> &ReadPool {
        &self.readers
    }

    pub(crate) fn segment_guard(&self) -> &RwLock<()> {
        &self.segment_guard
    }

    /// Read the value of the record `entry` points at
    ///
    /// The caller keeps the segment alive, either through `segment_guard`
    /// or by holding the writer (only compaction deletes segments).
    pub(crate) fn read_entry(&self, key: &[u8], entry: &KeyDirEntry) -> Result<Vec<u8>> {
        let buf = self
            .readers
            .read_at(entry.segment_id, entry.offset, entry.size)?;
        let record = Record::decode(&buf)?;

        if record.key != key || record.tombstone || record.encoded_len() as u64 != entry.size {
            return Err(CaskError::Corruption(format!(
                "record at segment {} offset {} does not match the index",
                entry.segment_id, entry.offset
            )));
        }

        Ok(record.value)
    }

    /// Release the writer and read handles; later calls do nothing
    fn shutdown(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            let mut writer = writer.into_inner();
            writer.sync()?;

            if writer.offset() == 0 {
                let path = writer.path();
                drop(writer);
                match fs::remove_file(&path) {
                    Ok(()) => debug!(path = %path.display(), "removed empty active segment"),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        self.readers.clear();
        Ok(())
    }

    fn writer_lock(&self) -> Result<MutexGuard<'_, SegmentWriter>> {
        self.writer
            .as_ref()
            .map(|writer| writer.lock())
            .ok_or(CaskError::ReadOnly)
    }

    /// Append under the writer lock, index the result, roll over if needed
    ///
    /// Once the record is in the log the write has happened. A failed
    /// rollover is only logged; the writer stays over its limit and the next
    /// write tries again.
    fn append_locked(&self, writer: &mut SegmentWriter, record: Record) -> Result<()> {
        let offset = writer.append(&record)?;

        let entry = KeyDirEntry {
            segment_id: writer.id(),
            offset,
            size: record.encoded_len() as u64,
            timestamp: record.timestamp,
            tombstone: record.tombstone,
        };
        self.keydir.set(record.key, entry);

        if writer.exceeds(self.config.max_segment_size) {
            if let Err(e) = writer.rollover() {
                warn!(
                    segment = %writer.id(),
                    error = %e,
                    "segment rollover failed, retrying on next write"
                );
            }
        }

        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(dir = %self.config.data_dir.display(), error = %e, "store not closed cleanly");
        }
    }
}

/// Compact the store at `path` in one call
///
/// Opens the store read-write, merges, and closes it again.
pub fn merge(path: impl AsRef<Path>) -> Result<MergeResult> {
    let store = Store::open_path(path)?;
    let result = store.merge()?;
    store.close()?;
    Ok(result)
}
