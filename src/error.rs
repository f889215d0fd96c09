//! Error types for CaskKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using CaskError
pub type Result<T> = std::result::Result<T, CaskError>;

/// Unified error type for CaskKV operations
#[derive(Debug, Error)]
pub enum CaskError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Access Errors
    // -------------------------------------------------------------------------
    #[error("Store is opened read-only")]
    ReadOnly,

    #[error("Entry too large: {len} bytes exceeds the u32 length field")]
    EntryTooLarge { len: usize },

    // -------------------------------------------------------------------------
    // Record Codec Errors
    // -------------------------------------------------------------------------
    #[error("Truncated record header: {available} of 17 bytes available")]
    TruncatedHeader { available: usize },

    #[error("Truncated record: expected {expected} bytes, {available} available")]
    TruncatedRecord { expected: u64, available: u64 },

    #[error("Data corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Directory Errors
    // -------------------------------------------------------------------------
    #[error("Not a segment file name: {0}")]
    InvalidSegmentName(String),
}
