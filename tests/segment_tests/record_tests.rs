//! Tests for the record codec
//!
//! These tests verify:
//! - Big-endian header layout at every field boundary
//! - Zero-length keys and values, tombstones
//! - Maximum u32 length fields
//! - Truncated header / record detection

use caskkv::segment::{ensure_fits, Record, RecordHeader, HEADER_SIZE};
use caskkv::CaskError;

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_header_size_is_17() {
    assert_eq!(HEADER_SIZE, 17);
}

#[test]
fn test_encode_layout() {
    let record = Record::put(b"ab".to_vec(), b"xyz".to_vec(), 0x0102030405060708);
    let bytes = record.encode();

    assert_eq!(bytes.len(), HEADER_SIZE + 2 + 3);
    assert_eq!(&bytes[0..4], &[0, 0, 0, 2]); // key length
    assert_eq!(&bytes[4..8], &[0, 0, 0, 3]); // value length
    assert_eq!(bytes[8], 0); // tombstone
    assert_eq!(&bytes[9..17], &[1, 2, 3, 4, 5, 6, 7, 8]); // timestamp
    assert_eq!(&bytes[17..19], b"ab");
    assert_eq!(&bytes[19..22], b"xyz");
}

#[test]
fn test_tombstone_layout() {
    let record = Record::tombstone(b"gone".to_vec(), 99);
    let bytes = record.encode();

    assert_eq!(bytes.len(), HEADER_SIZE + 4);
    assert_eq!(&bytes[4..8], &[0, 0, 0, 0]);
    assert_eq!(bytes[8], 1);
    assert!(record.value.is_empty());
}

#[test]
fn test_encoded_len_matches_encode() {
    let record = Record::put(b"key".to_vec(), vec![7u8; 1000], 1);
    assert_eq!(record.encoded_len(), record.encode().len());
    assert_eq!(record.header().record_size(), record.encoded_len() as u64);
}

// =============================================================================
// Decode Tests
// =============================================================================

#[test]
fn test_decode_put_record() {
    let record = Record::put(b"hello".to_vec(), b"world".to_vec(), 1_700_000_000_000);
    let decoded = Record::decode(&record.encode()).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn test_decode_zero_length_key() {
    let record = Record::put(Vec::new(), b"value".to_vec(), 5);
    let decoded = Record::decode(&record.encode()).unwrap();

    assert!(decoded.key.is_empty());
    assert_eq!(decoded.value, b"value");
}

#[test]
fn test_decode_zero_length_value() {
    let record = Record::put(b"key".to_vec(), Vec::new(), 5);
    let decoded = Record::decode(&record.encode()).unwrap();

    assert_eq!(decoded.key, b"key");
    assert!(decoded.value.is_empty());
    assert!(!decoded.tombstone);
}

#[test]
fn test_decode_tombstone() {
    let record = Record::tombstone(b"key".to_vec(), 42);
    let decoded = Record::decode(&record.encode()).unwrap();

    assert!(decoded.tombstone);
    assert_eq!(decoded.timestamp, 42);
}

#[test]
fn test_decode_ignores_trailing_bytes() {
    let first = Record::put(b"a".to_vec(), b"1".to_vec(), 1);
    let second = Record::put(b"b".to_vec(), b"2".to_vec(), 2);

    let mut buf = first.encode().to_vec();
    buf.extend_from_slice(&second.encode());

    assert_eq!(Record::decode(&buf).unwrap(), first);
}

#[test]
fn test_decode_header_fields() {
    let record = Record::put(b"k".to_vec(), b"vv".to_vec(), u64::MAX);
    let header = RecordHeader::decode(&record.encode()).unwrap();

    assert_eq!(header.key_len, 1);
    assert_eq!(header.value_len, 2);
    assert!(!header.tombstone);
    assert_eq!(header.timestamp, u64::MAX);
}

#[test]
fn test_header_max_u32_lengths() {
    let header = RecordHeader {
        key_len: u32::MAX,
        value_len: u32::MAX,
        tombstone: false,
        timestamp: 0,
    };

    let mut buf = Vec::new();
    header.encode_into(&mut buf);

    assert_eq!(&buf[0..8], &[0xFF; 8]);
    assert_eq!(RecordHeader::decode(&buf).unwrap(), header);
    assert_eq!(header.record_size(), 17 + 2 * u32::MAX as u64);
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_decode_truncated_header() {
    let bytes = Record::put(b"k".to_vec(), b"v".to_vec(), 0).encode();

    for len in 0..HEADER_SIZE {
        match RecordHeader::decode(&bytes[..len]) {
            Err(CaskError::TruncatedHeader { available }) => assert_eq!(available, len),
            other => panic!("expected TruncatedHeader, got {:?}", other),
        }
    }
}

#[test]
fn test_decode_truncated_record() {
    let bytes = Record::put(b"key".to_vec(), b"value".to_vec(), 0).encode();
    let cut = &bytes[..bytes.len() - 1];

    match Record::decode(cut) {
        Err(CaskError::TruncatedRecord { expected, available }) => {
            assert_eq!(expected, bytes.len() as u64);
            assert_eq!(available, cut.len() as u64);
        }
        other => panic!("expected TruncatedRecord, got {:?}", other),
    }
}

#[test]
fn test_decode_max_length_header_is_truncated() {
    let mut buf = Vec::new();
    RecordHeader {
        key_len: u32::MAX,
        value_len: 0,
        tombstone: false,
        timestamp: 0,
    }
    .encode_into(&mut buf);

    assert!(matches!(
        Record::decode(&buf),
        Err(CaskError::TruncatedRecord { .. })
    ));
}

#[test]
fn test_decode_invalid_tombstone_flag() {
    let mut bytes = Record::put(b"k".to_vec(), b"v".to_vec(), 0).encode().to_vec();
    bytes[8] = 7;

    assert!(matches!(
        RecordHeader::decode(&bytes),
        Err(CaskError::Corruption(_))
    ));
}

#[test]
fn test_ensure_fits() {
    assert!(ensure_fits(0).is_ok());
    assert!(ensure_fits(u32::MAX as usize).is_ok());
}
