//! Read handle pool
//!
//! Keeps one open read handle per segment for point lookups.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;

use super::SegmentId;

/// Lazily opened read handles, keyed by segment id
///
/// A handle is opened on the first read of its segment and lives until it is
/// evicted (segment deleted by compaction) or the pool is cleared on close.
pub struct ReadPool {
    dir: PathBuf,
    handles: Mutex<HashMap<SegmentId, Arc<Mutex<File>>>>,
}

impl ReadPool {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Read exactly `size` bytes at `offset` of segment `id`
    pub fn read_at(&self, id: SegmentId, offset: u64, size: u64) -> Result<Vec<u8>> {
        let handle = self.acquire(id)?;
        let mut file = handle.lock();

        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; size as usize];
        file.read_exact(&mut buf)?;

        Ok(buf)
    }

    fn acquire(&self, id: SegmentId) -> Result<Arc<Mutex<File>>> {
        let mut handles = self.handles.lock();
        if let Some(handle) = handles.get(&id) {
            return Ok(Arc::clone(handle));
        }

        let file = File::open(id.path_in(&self.dir))?;
        debug!(segment = %id, "opened read handle");

        let handle = Arc::new(Mutex::new(file));
        handles.insert(id, Arc::clone(&handle));
        Ok(handle)
    }

    /// Close the handle for one segment, if open
    pub fn evict(&self, id: SegmentId) {
        self.handles.lock().remove(&id);
    }

    /// Close every handle
    pub fn clear(&self) {
        self.handles.lock().clear();
    }

    /// Number of handles currently open
    pub fn open_count(&self) -> usize {
        self.handles.lock().len()
    }
}
