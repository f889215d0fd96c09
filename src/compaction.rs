//! Compaction
//!
//! Rewrites every live record into one fresh segment and deletes the rest.
//!
//! ## Ordering
//! ```text
//! 1. snapshot live KeyDir entries
//! 2. append each live value to segment N+1 (original timestamps)
//! 3. fsync segment N+1                      ← must finish before step 5
//! 4. make segment N+1 the active segment
//! 5. delete every older segment
//! 6. rebuild the KeyDir from disk, falling back to the locations
//!    recorded while copying in step 2
//! ```
//!
//! A crash anywhere before step 5 leaves old and new records side by side;
//! the new segment has the highest id, so recovery still resolves every key
//! to its latest value.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::SyncStrategy;
use crate::error::Result;
use crate::keydir::{KeyDir, KeyDirEntry};
use crate::segment::{
    free_segment_id, list_segments, load_all, next_segment_id, Record, SegmentId,
    SegmentWriter,
};
use crate::store::Store;

/// Summary of one merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeResult {
    /// Live records copied into the compaction segment
    pub records_written: u64,

    /// Segment files deleted
    pub segments_removed: u64,

    /// Total segment bytes before the merge
    pub bytes_before: u64,

    /// Total segment bytes after the merge
    pub bytes_after: u64,
}

/// Runs a single merge against an open store
pub struct Compactor<'a> {
    store: &'a Store,
}

impl<'a> Compactor<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Merge while holding the store's writer
    ///
    /// On success `active` has been replaced by the compaction segment, so
    /// later writes land above every record it contains.
    pub fn run(self, active: &mut SegmentWriter) -> Result<MergeResult> {
        let dir = self.store.data_dir();
        let live = self.store.keydir().live_entries();
        let old_segments = list_segments(dir)?;
        let bytes_before = segment_bytes(dir, &old_segments)?;

        let target_id = free_segment_id(dir, next_segment_id(dir)?.max(active.id().next()));
        let mut target = SegmentWriter::open(dir, target_id, SyncStrategy::Never)?;
        debug!(segment = %target_id, live = live.len(), "writing compaction segment");

        let mut result = MergeResult {
            bytes_before,
            ..MergeResult::default()
        };

        let copied = self.copy_live(live, &mut target)?;
        result.records_written = copied.len() as u64;

        // Old segments may only go once the new one is durable
        target.sync()?;
        drop(target);

        *active = SegmentWriter::open(dir, target_id, self.store.config().sync_strategy)?;

        let mut first_error: Option<io::Error> = None;
        {
            let _files = self.store.segment_guard().write();

            for id in old_segments.iter().filter(|id| **id < target_id) {
                self.store.readers().evict(*id);
                match fs::remove_file(id.path_in(dir)) {
                    Ok(()) => result.segments_removed += 1,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!(segment = %id, error = %e, "failed to delete merged segment");
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }

            let loaded = load_all(dir).map(|(keydir, _)| keydir);
            self.store.keydir().replace(settle_keydir(loaded, copied));
        }

        if let Some(e) = first_error {
            return Err(e.into());
        }

        result.bytes_after = segment_bytes(dir, &list_segments(dir)?)?;

        info!(
            records = result.records_written,
            removed = result.segments_removed,
            bytes_before = result.bytes_before,
            bytes_after = result.bytes_after,
            "merge complete"
        );

        Ok(result)
    }

    /// Copy each live value into `target`, recording where it landed
    fn copy_live(
        &self,
        live: Vec<(Vec<u8>, KeyDirEntry)>,
        target: &mut SegmentWriter,
    ) -> Result<KeyDir> {
        let copied = KeyDir::new();

        for (key, entry) in live {
            let value = self.store.read_entry(&key, &entry)?;
            let record = Record::put(key, value, entry.timestamp);
            let offset = target.append(&record)?;

            let location = KeyDirEntry {
                segment_id: target.id(),
                offset,
                size: record.encoded_len() as u64,
                timestamp: record.timestamp,
                tombstone: false,
            };
            copied.set(record.key, location);
        }

        Ok(copied)
    }
}

/// Pick the index to install once old segments are gone
///
/// The reload from disk wins. If it fails, the locations recorded during the
/// copy are used, so the KeyDir never points at a deleted segment.
fn settle_keydir(loaded: Result<KeyDir>, copied: KeyDir) -> KeyDir {
    match loaded {
        Ok(keydir) => {
            if keydir.live_count() != copied.len() {
                warn!(
                    reloaded = keydir.live_count(),
                    copied = copied.len(),
                    "reloaded index disagrees with compaction segment"
                );
            }
            keydir
        }
        Err(e) => {
            warn!(error = %e, "failed to reload index after merge, using copied locations");
            copied
        }
    }
}

fn segment_bytes(dir: &Path, ids: &[SegmentId]) -> Result<u64> {
    let mut total = 0;
    for id in ids {
        total += fs::metadata(id.path_in(dir))?.len();
    }
    Ok(total)
}
