//! Integration tests for container encoding and on-disk triads

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use bytes::Bytes;
use pretty_assertions::assert_eq;
use stingray_formats::toc::{EntryData, EntryKey, TocEntry, TocError, TocFile, sibling_path};

fn u64_at(buf: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap())
}

fn u32_at(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

fn two_entries_of_type_7() -> TocFile {
    let mut toc = TocFile::new("scenario");
    toc.add_entry(TocEntry::new(
        EntryKey::new(1, 7),
        EntryData::new(vec![1, 2, 3, 4], vec![5; 10], Vec::new()),
    ))
    .unwrap();
    toc.add_entry(TocEntry::new(
        EntryKey::new(2, 7),
        EntryData::new(vec![9; 8], Vec::new(), vec![6; 3]),
    ))
    .unwrap();
    toc
}

#[test]
fn type_7_container_layout() {
    let buffers = two_entries_of_type_7().to_buffers().unwrap();
    let index = &buffers.index;

    // 72-byte header, one 32-byte type group, two 80-byte entry records
    assert_eq!(u32_at(index, 0), 0xEFCD_AB89);
    assert_eq!(u32_at(index, 4), 1);
    assert_eq!(u32_at(index, 8), 2);
    assert_eq!(index.len(), 264 + 4 + 8);

    assert_eq!(u64_at(index, 72 + 8), 7);
    assert_eq!(u64_at(index, 72 + 16), 2);

    let first = 104;
    assert_eq!(u64_at(index, first), 1);
    assert_eq!(u64_at(index, first + 16), 264);
    assert_eq!(u64_at(index, first + 32), 0);
    assert_eq!(u32_at(index, first + 76), 1);

    let second = first + 80;
    assert_eq!(u64_at(index, second), 2);
    assert_eq!(u64_at(index, second + 16), 268);
    assert_eq!(u64_at(index, second + 32), 64, "empty gpu payload still gets an aligned offset");
    assert_eq!(u32_at(index, second + 76), 2);

    assert_eq!(&index[264..268], &[1, 2, 3, 4]);
    assert_eq!(buffers.gpu, vec![5; 10]);
    assert_eq!(buffers.stream, vec![6; 3]);
}

#[test]
fn type_7_container_rebuilds_byte_exact() {
    let first = two_entries_of_type_7().to_buffers().unwrap();
    let parsed = TocFile::parse(
        Bytes::from(first.index.clone()),
        Bytes::from(first.gpu.clone()),
        Bytes::from(first.stream.clone()),
    )
    .unwrap();
    assert_eq!(parsed.to_buffers().unwrap(), first);
}

#[test]
fn save_and_load_triad() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("9ba626afa44a3aa3");
    two_entries_of_type_7().save(&path).unwrap();

    assert!(sibling_path(&path, ".gpu_resources").exists());
    assert!(sibling_path(&path, ".stream").exists());

    let loaded = TocFile::load(&path).unwrap();
    assert_eq!(loaded.name(), "9ba626afa44a3aa3");
    assert_eq!(loaded.len(), 2);
    let entry = loaded.entry(EntryKey::new(2, 7)).unwrap();
    assert_eq!(entry.data().index.as_ref(), &[9; 8]);
    assert_eq!(entry.data().stream.as_ref(), &[6; 3]);

    let listing = TocFile::read_listing(&path).unwrap();
    assert_eq!(listing.types, vec![7]);
    assert!(listing.contains_file(1));
    assert!(!listing.contains_file(3));
}

#[test]
fn missing_siblings_load_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index_only");
    let mut toc = TocFile::new(&path);
    toc.add_entry(TocEntry::new(EntryKey::new(1, 7), EntryData::index_only(vec![1])))
        .unwrap();
    let buffers = toc.to_buffers().unwrap();
    std::fs::write(&path, &buffers.index).unwrap();

    let loaded = TocFile::load(&path).unwrap();
    assert_eq!(loaded.len(), 1);
}

#[test]
fn bad_magic_is_a_format_error() {
    let mut buffers = two_entries_of_type_7().to_buffers().unwrap();
    buffers.index[0] = 0;
    let err = TocFile::parse(Bytes::from(buffers.index), Bytes::new(), Bytes::new()).unwrap_err();
    assert!(matches!(err, TocError::InvalidMagic(_)));
    assert!(err.is_format_error());
}

#[test]
fn truncated_gpu_file_is_rejected() {
    let buffers = two_entries_of_type_7().to_buffers().unwrap();
    let err = TocFile::parse(
        Bytes::from(buffers.index),
        Bytes::from(vec![5; 4]),
        Bytes::from(buffers.stream),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        TocError::PayloadOutOfBounds { file_id: 1, region: "gpu", .. }
    ));
}

/// Index file with the given type records and one type 7 entry holding `[1, 2, 3, 4]`
fn hand_built_index(type_records: &[u64]) -> Vec<u8> {
    use binrw::BinWrite;
    use stingray_formats::toc::constants::{ENTRY_RECORD_SIZE, HEADER_SIZE, TYPE_RECORD_SIZE};
    use stingray_formats::toc::{TocEntryRecord, TocHeader, TocTypeRecord};

    let table_end = HEADER_SIZE + type_records.len() * TYPE_RECORD_SIZE + ENTRY_RECORD_SIZE;
    let mut cursor = std::io::Cursor::new(Vec::new());
    TocHeader {
        num_types: type_records.len() as u32,
        num_files: 1,
        ..TocHeader::new()
    }
    .write(&mut cursor)
    .unwrap();
    for &type_id in type_records {
        TocTypeRecord {
            unused: 0,
            type_id,
            entry_count: 1,
            unknown_16: 16,
            unknown_64: 64,
        }
        .write(&mut cursor)
        .unwrap();
    }
    TocEntryRecord {
        file_id: 1,
        type_id: 7,
        index_offset: table_end as u64,
        stream_offset: 0,
        gpu_offset: 0,
        unknown1: 0,
        unknown2: 0,
        index_size: 4,
        stream_size: 0,
        gpu_size: 0,
        unknown_16: 16,
        unknown_64: 64,
        entry_index: 1,
    }
    .write(&mut cursor)
    .unwrap();
    let mut index = cursor.into_inner();
    index.extend_from_slice(&[1, 2, 3, 4]);
    index
}

fn parse_then_rebuild(index: Vec<u8>) -> TocFile {
    let parsed = TocFile::parse(Bytes::from(index), Bytes::new(), Bytes::new()).unwrap();
    assert_eq!(parsed.len(), 1);
    let buffers = parsed.to_buffers().unwrap();
    TocFile::parse(
        Bytes::from(buffers.index),
        Bytes::from(buffers.gpu),
        Bytes::from(buffers.stream),
    )
    .unwrap()
}

#[test]
fn entry_without_a_type_record_survives_rebuild() {
    let rebuilt = parse_then_rebuild(hand_built_index(&[]));
    assert_eq!(rebuilt.len(), 1);
    assert_eq!(rebuilt.types().len(), 1);
    assert_eq!(
        rebuilt.entry(EntryKey::new(1, 7)).unwrap().data().index.as_ref(),
        &[1, 2, 3, 4]
    );
}

#[test]
fn repeated_type_records_collapse_on_rebuild() {
    let rebuilt = parse_then_rebuild(hand_built_index(&[7, 7]));
    assert_eq!(rebuilt.len(), 1);
    let types: Vec<u64> = rebuilt.types().iter().map(|t| t.type_id).collect();
    assert_eq!(types, vec![7]);
    assert_eq!(
        rebuilt.entry(EntryKey::new(1, 7)).unwrap().data().index.as_ref(),
        &[1, 2, 3, 4]
    );
}
