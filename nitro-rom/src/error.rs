//! Error types for ROM reading, mounting and object decoding
//!
//! The split follows how failures propagate:
//! - [`ReadError`] and [`TableError`] come from the low-level decoders.
//! - [`MountError`] is fatal to provider initialization.
//! - [`DecodeError`] and [`LoadError`] are local to a single file access.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by [`BinaryReader`](crate::BinaryReader).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// A read ran past the end of the reader's range.
    #[error("unexpected end of data: needed {requested} bytes at 0x{offset:08X} (range is {len} bytes)")]
    UnexpectedEof {
        /// Absolute offset of the failed read
        offset: usize,
        requested: usize,
        len: usize,
    },

    /// A sub-range does not fit inside the reader.
    #[error("range 0x{offset:08X}+0x{length:X} is outside of 0x{len:X} bytes")]
    OutOfBounds {
        offset: usize,
        length: usize,
        len: usize,
    },

    /// A region with a negative length cannot be scoped.
    #[error("region at 0x{offset:08X} has negative length {length}")]
    NegativeLength { offset: u32, length: i64 },
}

/// Structural corruption in a name table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("invalid directory count {0} in root directory record")]
    InvalidDirectoryCount(u16),

    #[error("subdirectory reference 0x{directory:04X} is outside of {count} directories")]
    DirectoryOutOfRange { directory: u16, count: u16 },

    /// A directory was reached twice, so the table is not a tree.
    #[error("directory 0x{directory:04X} is referenced more than once (cycle in name table)")]
    DirectoryCycle { directory: u16 },

    #[error("file ID {id} is assigned to both '{first}' and '{second}'")]
    DuplicateFileId {
        id: u16,
        first: String,
        second: String,
    },

    #[error("file IDs of directory 0x{directory:04X} overflow past 0xFFFF")]
    FileIdOverflow { directory: u16 },

    #[error("reserved entry tag 0x80 in directory 0x{directory:04X}")]
    ReservedEntryTag { directory: u16 },

    /// The root record's first ID disagrees with the lowest ID actually assigned.
    #[error("root directory records first file ID {recorded} but the lowest decoded ID is {derived}")]
    FirstIdMismatch { recorded: u16, derived: u16 },

    /// Decoded IDs do not form one contiguous run.
    #[error("{count} files are spread over IDs {first}..={last}")]
    IdGap { first: u16, last: u16, count: usize },

    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Fatal errors while loading and mounting a ROM image.
#[derive(Debug, Error)]
pub enum MountError {
    #[error("failed to read ROM file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ROM file {path} is too large ({len} bytes, max {max} bytes)")]
    TooLarge { path: PathBuf, len: u64, max: u64 },

    #[error("ROM header is truncated or invalid: {0}")]
    Header(ReadError),

    #[error("allocation table is unreadable: {0}")]
    AllocationTable(ReadError),

    #[error("name table is corrupt: {0}")]
    NameTable(#[from] TableError),

    /// An ID in the named range has no name table entry.
    #[error("file ID {id} has no name table entry")]
    MissingName { id: u16 },

    #[error("allocation table has {count} entries, more than the 65536 addressable file IDs")]
    TooManyFiles { count: usize },
}

/// Errors raised while decoding a typed object from a scoped reader.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("magic mismatch: expected '{expected}', found '{found}'")]
    MagicMismatch { expected: String, found: String },

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("invalid {what}: {reason}")]
    Invalid { what: &'static str, reason: String },

    #[error("archive structure is corrupt: {0}")]
    Structure(#[from] MountError),
}

impl From<TableError> for DecodeError {
    fn from(err: TableError) -> Self {
        Self::Structure(MountError::NameTable(err))
    }
}

/// Errors from a single provider query.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The name is not in the mounted index.
    #[error("file not found: {name}")]
    NotFound { name: String },

    #[error("failed to read '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: ReadError,
    },

    #[error("failed to decode '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },
}

impl LoadError {
    /// Returns true for lookup misses, as opposed to decode or read failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
