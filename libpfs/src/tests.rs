use crate::error::ReaderError;
use crate::reader::{get_file, get_list};
use crate::{DIRECTORY_CRC, FILE_TYPE};

use byteorder::ByteOrder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::PathBuf;
use tempdir::TempDir;

fn zlib_pack(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("zlib encoder write failed");
    encoder.finish().expect("zlib encoder finish failed")
}

fn build_blocks(data: &[u8], chunk: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for piece in data.chunks(chunk.max(1)) {
        let packed = zlib_pack(piece);
        out.extend_from_slice(
            &u32::try_from(packed.len())
                .expect("packed block overflow in test")
                .to_le_bytes(),
        );
        out.extend_from_slice(
            &u32::try_from(piece.len())
                .expect("plain block overflow in test")
                .to_le_bytes(),
        );
        out.extend_from_slice(&packed);
    }
    out
}

fn build_archive(files: &[(&str, &[u8])], chunk: usize) -> Vec<u8> {
    let mut body: Vec<u8> = Vec::new();
    let mut records: Vec<(u32, u32, u32)> = Vec::new();

    for (index, (_, data)) in files.iter().enumerate() {
        let position = u32::try_from(12 + body.len()).expect("position overflow in test");
        body.extend_from_slice(&build_blocks(data, chunk));
        records.push((
            0x1000 + u32::try_from(index).expect("index overflow in test"),
            position,
            u32::try_from(data.len()).expect("size overflow in test"),
        ));
    }

    let mut table: Vec<u8> = Vec::new();
    table.extend_from_slice(
        &u32::try_from(files.len())
            .expect("file count overflow in test")
            .to_le_bytes(),
    );
    for (name, _) in files {
        let mut raw = name.as_bytes().to_vec();
        raw.push(0);
        table.extend_from_slice(
            &u32::try_from(raw.len())
                .expect("name length overflow in test")
                .to_le_bytes(),
        );
        table.extend_from_slice(&raw);
    }
    let table_position = u32::try_from(12 + body.len()).expect("position overflow in test");
    body.extend_from_slice(&build_blocks(&table, chunk));
    records.push((
        DIRECTORY_CRC,
        table_position,
        u32::try_from(table.len()).expect("table size overflow in test"),
    ));

    let directory = u32::try_from(12 + body.len()).expect("directory offset overflow in test");

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(&directory.to_le_bytes());
    out.extend_from_slice(&FILE_TYPE.to_le_bytes());
    out.extend_from_slice(&0x0002_0000u32.to_le_bytes());
    out.extend_from_slice(&body);
    out.extend_from_slice(
        &u32::try_from(records.len())
            .expect("record count overflow in test")
            .to_le_bytes(),
    );
    for (crc, position, size) in records {
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&position.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
    }
    out
}

fn write_archive(dir: &TempDir, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join("archive.s3d");
    fs::write(&path, bytes).expect("failed to write test archive");
    path
}

#[test]
fn list_returns_named_entries() {
    let dir = TempDir::new("libpfs-tests").expect("failed to create temp dir");
    let bytes = build_archive(&[("wall.bmp", b"wall data"), ("gate.dds", b"gate")], 8192);
    let path = write_archive(&dir, &bytes);
    let file = File::open(path).expect("failed to open test archive");

    let list = get_list(&file).expect("failed to list archive");
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].name, "wall.bmp");
    assert_eq!(list[0].size, 9);
    assert_eq!(list[1].name, "gate.dds");
    assert_eq!(list[1].size, 4);
}

#[test]
fn read_returns_file_data() {
    let dir = TempDir::new("libpfs-tests").expect("failed to create temp dir");
    let bytes = build_archive(&[("wall.bmp", b"some pixel payload")], 8192);
    let path = write_archive(&dir, &bytes);
    let file = File::open(path).expect("failed to open test archive");

    let list = get_list(&file).expect("failed to list archive");
    let data = get_file(&file, &list[0]).expect("failed to read entry");
    assert_eq!(data, b"some pixel payload");
}

#[test]
fn read_reassembles_multiple_blocks() {
    let dir = TempDir::new("libpfs-tests").expect("failed to create temp dir");
    let payload: Vec<u8> = (0u16..600).map(|value| (value % 251) as u8).collect();
    let bytes = build_archive(&[("big.bmp", &payload)], 128);
    let path = write_archive(&dir, &bytes);
    let file = File::open(path).expect("failed to open test archive");

    let list = get_list(&file).expect("failed to list archive");
    let data = get_file(&file, &list[0]).expect("failed to read entry");
    assert_eq!(data, payload);
}

#[test]
fn rejects_wrong_magic() {
    let dir = TempDir::new("libpfs-tests").expect("failed to create temp dir");
    let mut bytes = build_archive(&[("wall.bmp", b"data")], 8192);
    bytes[4..8].copy_from_slice(b"XXXX");
    let path = write_archive(&dir, &bytes);
    let file = File::open(path).expect("failed to open test archive");

    assert!(matches!(get_list(&file), Err(ReaderError::IncorrectHeader)));
}

#[test]
fn rejects_small_file() {
    let dir = TempDir::new("libpfs-tests").expect("failed to create temp dir");
    let path = write_archive(&dir, &[0u8; 8]);
    let file = File::open(path).expect("failed to open test archive");

    assert!(matches!(
        get_list(&file),
        Err(ReaderError::SmallFile { .. })
    ));
}

#[test]
fn rejects_directory_beyond_file() {
    let dir = TempDir::new("libpfs-tests").expect("failed to create temp dir");
    let mut bytes = build_archive(&[("wall.bmp", b"data")], 8192);
    let bogus = u32::try_from(bytes.len() + 100).expect("offset overflow in test");
    bytes[0..4].copy_from_slice(&bogus.to_le_bytes());
    let path = write_archive(&dir, &bytes);
    let file = File::open(path).expect("failed to open test archive");

    assert!(matches!(
        get_list(&file),
        Err(ReaderError::DirectoryOutOfBounds { .. })
    ));
}

#[test]
fn rejects_missing_name_directory() {
    let dir = TempDir::new("libpfs-tests").expect("failed to create temp dir");
    let mut bytes = build_archive(&[("wall.bmp", b"data")], 8192);
    // Overwrite the filename directory CRC so no entry carries it.
    let directory = byteorder::LittleEndian::read_u32(&bytes[0..4]) as usize;
    let names_record = directory + 4 + 12;
    bytes[names_record..names_record + 4].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
    let path = write_archive(&dir, &bytes);
    let file = File::open(path).expect("failed to open test archive");

    assert!(matches!(
        get_list(&file),
        Err(ReaderError::MissingNameDirectory)
    ));
}

#[test]
fn rejects_name_count_mismatch() {
    let dir = TempDir::new("libpfs-tests").expect("failed to create temp dir");
    let mut bytes = build_archive(&[("wall.bmp", b"data")], 8192);
    // Append a second data record without a matching filename.
    let directory = byteorder::LittleEndian::read_u32(&bytes[0..4]) as usize;
    let count = byteorder::LittleEndian::read_u32(&bytes[directory..directory + 4]);
    bytes[directory..directory + 4].copy_from_slice(&(count + 1).to_le_bytes());
    bytes.extend_from_slice(&0x2000u32.to_le_bytes());
    bytes.extend_from_slice(&12u32.to_le_bytes());
    bytes.extend_from_slice(&4u32.to_le_bytes());
    let path = write_archive(&dir, &bytes);
    let file = File::open(path).expect("failed to open test archive");

    assert!(matches!(
        get_list(&file),
        Err(ReaderError::NameCountMismatch {
            expected: 1,
            received: 2
        })
    ));
}

#[test]
fn rejects_lying_block_size() {
    let dir = TempDir::new("libpfs-tests").expect("failed to create temp dir");
    let mut bytes = build_archive(&[("wall.bmp", b"data")], 8192);
    // First data block starts right after the header; corrupt its inflated size.
    let inflated = byteorder::LittleEndian::read_u32(&bytes[16..20]);
    bytes[16..20].copy_from_slice(&(inflated + 1).to_le_bytes());
    let path = write_archive(&dir, &bytes);
    let file = File::open(path).expect("failed to open test archive");

    let list = get_list(&file).expect("failed to list archive");
    assert!(matches!(
        get_file(&file, &list[0]),
        Err(ReaderError::IncorrectBlockSize { .. })
    ));
}

#[test]
fn rejects_entry_position_beyond_file() {
    let dir = TempDir::new("libpfs-tests").expect("failed to create temp dir");
    let bytes = build_archive(&[("wall.bmp", b"data")], 8192);
    let path = write_archive(&dir, &bytes);
    let file = File::open(path).expect("failed to open test archive");

    let list = get_list(&file).expect("failed to list archive");
    let mut entry = list[0].clone();
    entry.position = u32::try_from(bytes.len() + 50).expect("position overflow in test");
    assert!(matches!(
        get_file(&file, &entry),
        Err(ReaderError::BlockOutOfBounds { .. })
    ));
}

#[test]
fn entry_extension_is_split_from_name() {
    let entry = crate::reader::ArchiveEntry {
        crc: 1,
        name: String::from("wall.bmp"),
        position: 12,
        size: 4,
    };
    assert_eq!(entry.extension(), Some("bmp"));

    let bare = crate::reader::ArchiveEntry {
        crc: 2,
        name: String::from("readme"),
        position: 12,
        size: 4,
    };
    assert_eq!(bare.extension(), None);
}
