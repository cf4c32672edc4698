use std::io::{Read, Seek};

use byteorder::{ByteOrder, ReadBytesExt};
use flate2::read::ZlibDecoder;

use crate::error::ReaderError;
use crate::{DIRECTORY_CRC, DIRECTORY_RECORD_SIZE, FILE_TYPE, HEADER_SIZE, MINIMUM_FILE_SIZE};

#[derive(Clone, Debug)]
pub struct ArchiveEntry {
    /// CRC of the file name
    pub crc: u32,
    /// File name
    pub name: String,
    /// Position of the first data block
    pub position: u32,
    /// Inflated file size (in bytes)
    pub size: u32,
}

impl ArchiveEntry {
    /// Get the extension of the file name
    pub fn extension(&self) -> Option<&str> {
        let (_, extension) = self.name.rsplit_once('.')?;
        if extension.is_empty() {
            return None;
        }
        Some(extension)
    }
}

#[derive(Debug)]
struct FileHeader {
    /// Position of the directory
    directory: u32,
    /// Constant magic value
    magic: u32,
    /// Format version
    _version: u32,
}

#[derive(Copy, Clone, Debug)]
struct DirectoryRecord {
    crc: u32,
    position: u32,
    size: u32,
}

/// Get a packed file data
pub fn get_file(file: &std::fs::File, entry: &ArchiveEntry) -> Result<Vec<u8>, ReaderError> {
    let size = get_file_size(file)?;
    check_file_size(size)?;

    if entry.position < HEADER_SIZE || entry.position >= size {
        return Err(ReaderError::BlockOutOfBounds {
            position: entry.position,
            size,
        });
    }

    get_block_data(file, entry.position, entry.size)
}

/// Get a list of packed files
pub fn get_list(file: &std::fs::File) -> Result<Vec<ArchiveEntry>, ReaderError> {
    let size = get_file_size(file)?;
    check_file_size(size)?;

    let header = get_file_header(file)?;
    check_file_header(&header, size)?;

    let records = get_directory(file, &header, size)?;
    let list = build_entries(file, records)?;

    log::debug!("listed {} entries", list.len());
    Ok(list)
}

fn check_file_header(header: &FileHeader, size: u32) -> Result<(), ReaderError> {
    if header.magic != FILE_TYPE {
        return Err(ReaderError::IncorrectHeader);
    }

    if header.directory < HEADER_SIZE || header.directory > size.saturating_sub(4) {
        return Err(ReaderError::DirectoryOutOfBounds {
            offset: header.directory,
            size,
        });
    }

    Ok(())
}

fn check_file_size(size: u32) -> Result<(), ReaderError> {
    if size < MINIMUM_FILE_SIZE {
        return Err(ReaderError::SmallFile {
            expected: MINIMUM_FILE_SIZE,
            received: size,
        });
    }

    Ok(())
}

fn get_file_header(file: &std::fs::File) -> Result<FileHeader, ReaderError> {
    let mut reader = std::io::BufReader::new(file);
    let mut buffer = vec![0u8; HEADER_SIZE as usize];

    reader.seek(std::io::SeekFrom::Start(0))?;
    reader.read_exact(&mut buffer)?;

    Ok(FileHeader {
        directory: byteorder::LittleEndian::read_u32(&buffer[0..4]),
        magic: byteorder::LittleEndian::read_u32(&buffer[4..8]),
        _version: byteorder::LittleEndian::read_u32(&buffer[8..12]),
    })
}

fn get_directory(
    file: &std::fs::File,
    header: &FileHeader,
    size: u32,
) -> Result<Vec<DirectoryRecord>, ReaderError> {
    let mut reader = std::io::BufReader::new(file);
    reader.seek(std::io::SeekFrom::Start(u64::from(header.directory)))?;

    let count = reader.read_u32::<byteorder::LittleEndian>()?;
    let end = u64::from(header.directory)
        + 4
        + u64::from(count) * u64::from(DIRECTORY_RECORD_SIZE);
    if end > u64::from(size) {
        return Err(ReaderError::DirectoryOutOfBounds {
            offset: header.directory,
            size,
        });
    }

    let mut records = Vec::with_capacity(usize::try_from(count)?);
    for _ in 0..count {
        records.push(DirectoryRecord {
            crc: reader.read_u32::<byteorder::LittleEndian>()?,
            position: reader.read_u32::<byteorder::LittleEndian>()?,
            size: reader.read_u32::<byteorder::LittleEndian>()?,
        });
    }

    Ok(records)
}

fn build_entries(
    file: &std::fs::File,
    records: Vec<DirectoryRecord>,
) -> Result<Vec<ArchiveEntry>, ReaderError> {
    let mut data_records: Vec<DirectoryRecord> = Vec::new();
    let mut names_record: Option<DirectoryRecord> = None;

    for record in records {
        if record.crc == DIRECTORY_CRC {
            names_record = Some(record);
        } else {
            data_records.push(record);
        }
    }

    let Some(names_record) = names_record else {
        return Err(ReaderError::MissingNameDirectory);
    };

    // Filenames are stored in data offset order
    data_records.sort_by_key(|record| record.position);

    let table = get_block_data(file, names_record.position, names_record.size)?;
    let names = get_name_table(&table)?;

    if names.len() != data_records.len() {
        return Err(ReaderError::NameCountMismatch {
            expected: names.len(),
            received: data_records.len(),
        });
    }

    let list = names
        .into_iter()
        .zip(data_records)
        .map(|(name, record)| ArchiveEntry {
            crc: record.crc,
            name,
            position: record.position,
            size: record.size,
        })
        .collect();

    Ok(list)
}

fn get_name_table(buffer: &[u8]) -> Result<Vec<String>, ReaderError> {
    let Some(count_bytes) = buffer.get(0..4) else {
        return Err(ReaderError::IncorrectNameTable {
            expected: 0,
            received: 0,
        });
    };
    let count = byteorder::LittleEndian::read_u32(count_bytes);

    // Every name needs at least its length field.
    if u64::from(count) * 4 + 4 > u64::try_from(buffer.len())? {
        return Err(ReaderError::IncorrectNameTable {
            expected: count,
            received: 0,
        });
    }

    let mut names = Vec::with_capacity(usize::try_from(count)?);
    let mut cursor = 4usize;

    for _ in 0..count {
        let received = u32::try_from(names.len())?;
        let Some(length_bytes) = buffer.get(cursor..cursor + 4) else {
            return Err(ReaderError::IncorrectNameTable {
                expected: count,
                received,
            });
        };
        let length = usize::try_from(byteorder::LittleEndian::read_u32(length_bytes))?;
        cursor += 4;

        let Some(raw) = buffer.get(cursor..cursor + length) else {
            return Err(ReaderError::IncorrectNameTable {
                expected: count,
                received,
            });
        };
        cursor += length;

        let name = String::from_utf8_lossy(raw)
            .trim_matches(char::from(0))
            .to_string();
        names.push(name);
    }

    Ok(names)
}

fn get_block_data(
    file: &std::fs::File,
    position: u32,
    size: u32,
) -> Result<Vec<u8>, ReaderError> {
    let total = usize::try_from(size)?;

    let mut reader = std::io::BufReader::new(file);
    reader.seek(std::io::SeekFrom::Start(u64::from(position)))?;

    let mut buffer: Vec<u8> = Vec::with_capacity(total);
    while buffer.len() < total {
        let deflated = reader.read_u32::<byteorder::LittleEndian>()?;
        let inflated = reader.read_u32::<byteorder::LittleEndian>()?;

        let mut packed = vec![0u8; usize::try_from(deflated)?];
        reader.read_exact(&mut packed)?;

        let before = buffer.len();
        let mut decoder = ZlibDecoder::new(packed.as_slice());
        if let Err(error) = decoder.read_to_end(&mut buffer) {
            return Err(ReaderError::Inflate(error));
        }

        let received = u32::try_from(buffer.len() - before)?;
        if received != inflated {
            return Err(ReaderError::IncorrectBlockSize {
                expected: inflated,
                received,
            });
        }
    }

    if buffer.len() != total {
        return Err(ReaderError::IncorrectBlockSize {
            expected: size,
            received: u32::try_from(buffer.len())?,
        });
    }

    Ok(buffer)
}

fn get_file_size(file: &std::fs::File) -> Result<u32, ReaderError> {
    let metadata = file.metadata()?;
    let size = u32::try_from(metadata.len())?;
    Ok(size)
}
