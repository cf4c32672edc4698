use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ReaderError {
    #[error("incorrect header format")]
    #[diagnostic(code(libpfs::header_error))]
    IncorrectHeader,

    #[error("file is too small (must be at least {expected:?} bytes, received {received:?} bytes)")]
    #[diagnostic(code(libpfs::file_size_error))]
    SmallFile { expected: u32, received: u32 },

    #[error("directory is out of bounds (offset {offset:?}, file size {size:?} bytes)")]
    #[diagnostic(code(libpfs::directory_error))]
    DirectoryOutOfBounds { offset: u32, size: u32 },

    #[error("data block is out of bounds (position {position:?}, file size {size:?} bytes)")]
    #[diagnostic(code(libpfs::block_position_error))]
    BlockOutOfBounds { position: u32, size: u32 },

    #[error("incorrect data block size (expected {expected:?} bytes, received {received:?} bytes)")]
    #[diagnostic(code(libpfs::block_size_error))]
    IncorrectBlockSize { expected: u32, received: u32 },

    #[error("data block decompression error")]
    #[diagnostic(code(libpfs::inflate_error))]
    Inflate(#[source] std::io::Error),

    #[error("archive has no filename directory")]
    #[diagnostic(code(libpfs::name_directory_error))]
    MissingNameDirectory,

    #[error("incorrect filename table (expected {expected:?} names, received {received:?})")]
    #[diagnostic(code(libpfs::name_table_error))]
    IncorrectNameTable { expected: u32, received: u32 },

    #[error("filename count does not match entry count (expected {expected:?}, received {received:?})")]
    #[diagnostic(code(libpfs::name_count_error))]
    NameCountMismatch { expected: usize, received: usize },

    #[error("resource file reading error")]
    #[diagnostic(code(libpfs::io_error))]
    ReadFile(#[from] std::io::Error),

    #[error("error converting an value")]
    #[diagnostic(code(libpfs::try_from_int_error))]
    TryFromIntError(#[from] std::num::TryFromIntError),
}
