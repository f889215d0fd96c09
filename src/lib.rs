//! # CaskKV
//!
//! An embedded, log-structured key-value store in the Bitcask style:
//! - Append-only segment files with a fixed-width record format
//! - In-memory KeyDir rebuilt by replaying the log on open
//! - Crash recovery that ignores a partially written tail
//! - Compaction (merge) that reclaims superseded and deleted records
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Store                                │
//! │            (Single Writer / Multi Reader)                    │
//! └──────┬──────────────────────┬───────────────────────┬───────┘
//!        │ put/delete           │ get/fold              │ merge
//!        ▼                      ▼                       ▼
//! ┌─────────────┐        ┌─────────────┐         ┌─────────────┐
//! │   Segment   │        │   KeyDir    │         │  Compactor  │
//! │   Writer    │        │  (RwLock)   │         │             │
//! └──────┬──────┘        └──────┬──────┘         └──────┬──────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │        Segment files  00000001.data … 0000000N.data          │
//! │            (replayed by Recovery, read via ReadPool)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use caskkv::Store;
//!
//! let store = Store::open_path("./caskkv_data")?;
//! store.put(b"a", b"1")?;
//! assert_eq!(store.get(b"a")?, Some(b"1".to_vec()));
//! store.delete(b"a")?;
//! store.merge()?;
//! store.close()?;
//! # Ok::<(), caskkv::CaskError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod segment;
pub mod keydir;
pub mod compaction;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CaskError, Result};
pub use config::{Config, SyncStrategy};
pub use compaction::MergeResult;
pub use store::{merge, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of CaskKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
