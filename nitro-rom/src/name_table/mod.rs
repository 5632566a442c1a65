//! File name table (FNT)
//!
//! # Layout
//!
//! All offsets are relative to the start of the table.
//!
//! ```text
//! Directory table (8 bytes per directory, root first):
//!   0x00: sub_table_offset u32
//!   0x04: first_file_id    u16
//!   0x06: root: directory count / others: parent ID (0xF000 | index)
//!
//! Sub-table entries, terminated by 0x00:
//!   0x01..=0x7F  file:          name[tag]
//!   0x80         reserved
//!   0x81..=0xFF  subdirectory:  name[tag & 0x7F], directory ID u16
//! ```
//!
//! Files in a directory take sequential IDs starting at the directory's
//! `first_file_id`. Directories are walked depth-first with an explicit
//! stack; a directory reached twice aborts the decode. The decoded IDs must
//! form one gapless run starting at the root's `first_file_id`.


use bytemuck::{Pod, Zeroable};
use hashbrown::HashMap;

use crate::error::TableError;
use crate::reader::BinaryReader;

/// Marker bits of a directory ID
pub const DIRECTORY_ID_MASK: u16 = 0xF000;

/// Upper bound on directories in one table
pub const MAX_DIRECTORIES: u16 = 0x1000;

const ENTRY_END: u8 = 0x00;
const ENTRY_RESERVED: u8 = 0x80;
const ENTRY_DIRECTORY_BIT: u8 = 0x80;

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct DirectoryRecord {
    sub_table_offset: u32,
    first_file_id: u16,
    /// Directory count for the root, parent directory ID otherwise
    parent_or_count: u16,
}

impl DirectoryRecord {
    const SIZE: usize = 8;

    fn read(reader: &BinaryReader<'_>, index: u16) -> Result<Self, TableError> {
        let mut cursor = reader.scope(usize::from(index) * Self::SIZE, Self::SIZE)?;
        let raw: Self = cursor.read_pod()?;
        Ok(Self {
            sub_table_offset: u32::from_le(raw.sub_table_offset),
            first_file_id: u16::from_le(raw.first_file_id),
            parent_or_count: u16::from_le(raw.parent_or_count),
        })
    }
}

/// Flattened name table: file ID → relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    files: HashMap<u16, String>,
    first_id: u16,
    directory_count: u16,
}

impl NameTable {
    /// Decode a name table from a reader scoped to exactly the table.
    pub fn load(reader: &BinaryReader<'_>) -> Result<Self, TableError> {
        let root = DirectoryRecord::read(reader, 0)?;
        let directory_count = root.parent_or_count;
        if directory_count == 0 || directory_count > MAX_DIRECTORIES {
            return Err(TableError::InvalidDirectoryCount(directory_count));
        }

        let mut files: HashMap<u16, String> = HashMap::new();
        let mut visited = vec![false; usize::from(directory_count)];
        let mut stack: Vec<(u16, String)> = vec![(0, String::new())];

        while let Some((index, prefix)) = stack.pop() {
            let directory = DIRECTORY_ID_MASK | index;
            let seen = &mut visited[usize::from(index)];
            if *seen {
                return Err(TableError::DirectoryCycle { directory });
            }
            *seen = true;

            let record = if index == 0 {
                root
            } else {
                DirectoryRecord::read(reader, index)?
            };

            let mut entries = reader.clone();
            entries.seek(record.sub_table_offset as usize)?;

            let mut next_id = Some(record.first_file_id);
            let mut subdirectories = Vec::new();

            loop {
                let tag = entries.read_u8()?;
                match tag {
                    ENTRY_END => break,
                    ENTRY_RESERVED => return Err(TableError::ReservedEntryTag { directory }),
                    _ if tag & ENTRY_DIRECTORY_BIT != 0 => {
                        let name = entries.read_string(usize::from(tag & !ENTRY_DIRECTORY_BIT))?;
                        let child = entries.read_u16()?;
                        let child_index = child & !DIRECTORY_ID_MASK;
                        if child & DIRECTORY_ID_MASK != DIRECTORY_ID_MASK
                            || child_index >= directory_count
                        {
                            return Err(TableError::DirectoryOutOfRange {
                                directory: child,
                                count: directory_count,
                            });
                        }
                        subdirectories.push((child_index, format!("{prefix}{name}/")));
                    }
                    _ => {
                        let name = entries.read_string(usize::from(tag))?;
                        let id = next_id.ok_or(TableError::FileIdOverflow { directory })?;
                        let path = format!("{prefix}{name}");
                        if let Some(first) = files.get(&id) {
                            return Err(TableError::DuplicateFileId {
                                id,
                                first: first.clone(),
                                second: path,
                            });
                        }
                        files.insert(id, path);
                        next_id = id.checked_add(1);
                    }
                }
            }

            // Reversed so the first subdirectory on disk is walked first
            stack.extend(subdirectories.into_iter().rev());
        }

        if let Some(&derived) = files.keys().min()
            && derived != root.first_file_id
        {
            return Err(TableError::FirstIdMismatch {
                recorded: root.first_file_id,
                derived,
            });
        }

        if let (Some(&first), Some(&last)) = (files.keys().min(), files.keys().max())
            && usize::from(last - first) + 1 != files.len()
        {
            return Err(TableError::IdGap {
                first,
                last,
                count: files.len(),
            });
        }

        Ok(Self {
            files,
            first_id: root.first_file_id,
            directory_count,
        })
    }

    /// Lowest named file ID; lower IDs are overlays.
    pub fn first_id(&self) -> u16 {
        self.first_id
    }

    pub fn directory_count(&self) -> u16 {
        self.directory_count
    }

    pub fn get(&self, id: u16) -> Option<&str> {
        self.files.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.files.iter().map(|(&id, path)| (id, path.as_str()))
    }

    /// Highest named file ID, if any.
    pub fn last_id(&self) -> Option<u16> {
        self.files.keys().max().copied()
    }
}
