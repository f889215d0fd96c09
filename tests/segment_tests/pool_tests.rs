//! Tests for the read handle pool

use caskkv::config::SyncStrategy;
use caskkv::segment::{ReadPool, Record, SegmentId, SegmentWriter};
use caskkv::CaskError;
use tempfile::TempDir;

#[test]
fn test_read_at_returns_exact_record() {
    let temp = TempDir::new().unwrap();
    let mut writer = SegmentWriter::create_next(temp.path(), SyncStrategy::Never).unwrap();
    let first = Record::put(b"a".to_vec(), b"1".to_vec(), 1);
    let second = Record::put(b"b".to_vec(), b"22".to_vec(), 2);
    writer.append(&first).unwrap();
    let offset = writer.append(&second).unwrap();

    let pool = ReadPool::new(temp.path());
    let bytes = pool
        .read_at(writer.id(), offset, second.encoded_len() as u64)
        .unwrap();

    assert_eq!(Record::decode(&bytes).unwrap(), second);
}

#[test]
fn test_handles_opened_lazily_and_reused() {
    let temp = TempDir::new().unwrap();
    let mut writer = SegmentWriter::create_next(temp.path(), SyncStrategy::Never).unwrap();
    let record = Record::put(b"a".to_vec(), b"1".to_vec(), 1);
    writer.append(&record).unwrap();

    let pool = ReadPool::new(temp.path());
    assert_eq!(pool.open_count(), 0);

    pool.read_at(writer.id(), 0, record.encoded_len() as u64).unwrap();
    pool.read_at(writer.id(), 0, record.encoded_len() as u64).unwrap();
    assert_eq!(pool.open_count(), 1);

    pool.evict(writer.id());
    assert_eq!(pool.open_count(), 0);
}

#[test]
fn test_sees_appends_after_open() {
    let temp = TempDir::new().unwrap();
    let mut writer = SegmentWriter::create_next(temp.path(), SyncStrategy::Never).unwrap();
    let first = Record::put(b"a".to_vec(), b"1".to_vec(), 1);
    writer.append(&first).unwrap();

    let pool = ReadPool::new(temp.path());
    pool.read_at(writer.id(), 0, first.encoded_len() as u64).unwrap();

    let second = Record::put(b"b".to_vec(), b"2".to_vec(), 2);
    let offset = writer.append(&second).unwrap();
    let bytes = pool
        .read_at(writer.id(), offset, second.encoded_len() as u64)
        .unwrap();

    assert_eq!(Record::decode(&bytes).unwrap().key, b"b");
}

#[test]
fn test_missing_segment_is_io_error() {
    let temp = TempDir::new().unwrap();
    let pool = ReadPool::new(temp.path());

    assert!(matches!(
        pool.read_at(SegmentId(5), 0, 17),
        Err(CaskError::Io(_))
    ));
}

#[test]
fn test_clear_closes_everything() {
    let temp = TempDir::new().unwrap();
    let mut writer = SegmentWriter::create_next(temp.path(), SyncStrategy::Never).unwrap();
    let record = Record::put(b"a".to_vec(), b"1".to_vec(), 1);
    writer.append(&record).unwrap();
    writer.rollover().unwrap();
    writer.append(&record).unwrap();

    let pool = ReadPool::new(temp.path());
    pool.read_at(SegmentId(1), 0, record.encoded_len() as u64).unwrap();
    pool.read_at(SegmentId(2), 0, record.encoded_len() as u64).unwrap();
    assert_eq!(pool.open_count(), 2);

    pool.clear();
    assert_eq!(pool.open_count(), 0);
}
