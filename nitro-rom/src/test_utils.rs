//! Builders that synthesize Nitro images for unit and integration tests
//!
//! Nothing here is used by the library itself. The builders write the same
//! layouts the decoders read, with just enough header fields filled in.

use crate::header::RomHeader;
use crate::name_table::DIRECTORY_ID_MASK;

// ============================================================================
// Name tables
// ============================================================================

#[derive(Debug, Clone)]
enum Entry {
    File(String),
    Directory { name: String, target: u16 },
}

#[derive(Debug, Clone)]
struct Directory {
    parent: u16,
    entries: Vec<Entry>,
}

/// Builds a name table directory tree.
///
/// Directory 0 is the root. File IDs are assigned the way the decoder walks
/// the tree: a directory's own files first, then its subdirectories
/// depth-first, so IDs are contiguous from `first_id`.
#[derive(Debug, Clone)]
pub struct NameTableBuilder {
    first_id: u16,
    directories: Vec<Directory>,
    first_id_overrides: Vec<(u16, u16)>,
}

impl NameTableBuilder {
    pub fn new(first_id: u16) -> Self {
        Self {
            first_id,
            directories: vec![Directory {
                parent: 0,
                entries: Vec::new(),
            }],
            first_id_overrides: Vec::new(),
        }
    }

    /// Add a file to directory `dir`.
    pub fn file(&mut self, dir: u16, name: &str) -> &mut Self {
        self.directories[usize::from(dir)]
            .entries
            .push(Entry::File(name.to_string()));
        self
    }

    /// Add a new subdirectory under `parent` and return its index.
    pub fn dir(&mut self, parent: u16, name: &str) -> u16 {
        let index = self.directories.len() as u16;
        self.directories.push(Directory {
            parent,
            entries: Vec::new(),
        });
        self.link(parent, name, index);
        index
    }

    /// Add a subdirectory entry under `parent` pointing at any directory
    /// index, existing or not. Used to build corrupt tables.
    pub fn link(&mut self, parent: u16, name: &str, target: u16) -> &mut Self {
        self.directories[usize::from(parent)]
            .entries
            .push(Entry::Directory {
                name: name.to_string(),
                target,
            });
        self
    }

    /// Force the recorded first file ID of one directory.
    pub fn override_first_id(&mut self, dir: u16, first_id: u16) -> &mut Self {
        self.first_id_overrides.push((dir, first_id));
        self
    }

    /// Serialize the table.
    pub fn build(&self) -> Vec<u8> {
        let count = self.directories.len();
        let mut first_ids = vec![0u16; count];
        let mut visited = vec![false; count];
        let mut next = self.first_id;
        self.assign_ids(0, &mut next, &mut first_ids, &mut visited);
        for &(dir, id) in &self.first_id_overrides {
            first_ids[usize::from(dir)] = id;
        }

        let mut sub_tables = Vec::new();
        let mut offsets = Vec::with_capacity(count);
        for directory in &self.directories {
            offsets.push((count * 8 + sub_tables.len()) as u32);
            for entry in &directory.entries {
                match entry {
                    Entry::File(name) => {
                        sub_tables.push(name.len() as u8);
                        sub_tables.extend_from_slice(name.as_bytes());
                    }
                    Entry::Directory { name, target } => {
                        sub_tables.push(0x80 | name.len() as u8);
                        sub_tables.extend_from_slice(name.as_bytes());
                        sub_tables.extend_from_slice(&(DIRECTORY_ID_MASK | target).to_le_bytes());
                    }
                }
            }
            sub_tables.push(0);
        }

        let mut bytes = Vec::with_capacity(count * 8 + sub_tables.len());
        for (index, directory) in self.directories.iter().enumerate() {
            bytes.extend_from_slice(&offsets[index].to_le_bytes());
            bytes.extend_from_slice(&first_ids[index].to_le_bytes());
            let last = if index == 0 {
                count as u16
            } else {
                DIRECTORY_ID_MASK | directory.parent
            };
            bytes.extend_from_slice(&last.to_le_bytes());
        }
        bytes.extend_from_slice(&sub_tables);
        bytes
    }

    fn assign_ids(&self, dir: u16, next: &mut u16, first_ids: &mut [u16], visited: &mut [bool]) {
        let index = usize::from(dir);
        if index >= self.directories.len() || visited[index] {
            return;
        }
        visited[index] = true;
        first_ids[index] = *next;

        let entries = &self.directories[index].entries;
        for entry in entries {
            if let Entry::File(_) = entry {
                *next = next.wrapping_add(1);
            }
        }
        for entry in entries {
            if let Entry::Directory { target, .. } = entry {
                self.assign_ids(*target, next, first_ids, visited);
            }
        }
    }
}

// ============================================================================
// ROM images
// ============================================================================

/// Builds a complete ROM image: header, FNT, FAT and file data.
///
/// Files are placed in the order they are added. The FAT has one slot per
/// added file (overlays first, then named files in name-table ID order).
#[derive(Debug, Clone)]
pub struct RomBuilder {
    title: String,
    game_code: [u8; 4],
    names: NameTableBuilder,
    /// `None` marks an absent slot
    files: Vec<Option<Vec<u8>>>,
    raw_regions: Vec<(usize, (u32, u32))>,
    arm9_overlays: Vec<[u32; 8]>,
}

impl RomBuilder {
    pub fn new(names: NameTableBuilder) -> Self {
        Self {
            title: "NITRO TEST".to_string(),
            game_code: *b"NTST",
            names,
            files: Vec::new(),
            raw_regions: Vec::new(),
            arm9_overlays: Vec::new(),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Append a file slot with contents.
    pub fn slot(mut self, data: &[u8]) -> Self {
        self.files.push(Some(data.to_vec()));
        self
    }

    /// Append a slot whose region is zero-length.
    pub fn empty_slot(mut self) -> Self {
        self.files.push(None);
        self
    }

    /// Overwrite a slot's raw `(start, end)` pair after layout.
    pub fn raw_region(mut self, id: usize, start: u32, end: u32) -> Self {
        self.raw_regions.push((id, (start, end)));
        self
    }

    /// Add an ARM9 overlay table entry.
    pub fn arm9_overlay(mut self, overlay_id: u32, file_id: u32) -> Self {
        self.arm9_overlays
            .push([overlay_id, 0x0200_0000, 0x100, 0x20, 0, 0, file_id, 0]);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut image = vec![0u8; 0x200];

        let fnt = self.names.build();
        let fnt_offset = image.len() as u32;
        image.extend_from_slice(&fnt);
        align(&mut image);

        let fat_offset = image.len() as u32;
        let fat_size = (self.files.len() * 8) as u32;
        image.resize(image.len() + fat_size as usize, 0);
        align(&mut image);

        let ovt_offset = image.len() as u32;
        for entry in &self.arm9_overlays {
            for word in entry {
                image.extend_from_slice(&word.to_le_bytes());
            }
        }
        let ovt_size = (self.arm9_overlays.len() * 32) as u32;
        align(&mut image);

        let mut pairs = Vec::with_capacity(self.files.len());
        for file in &self.files {
            match file {
                Some(data) => {
                    let start = image.len() as u32;
                    image.extend_from_slice(data);
                    pairs.push((start, image.len() as u32));
                    align(&mut image);
                }
                None => pairs.push((0, 0)),
            }
        }
        for &(id, pair) in &self.raw_regions {
            pairs[id] = pair;
        }
        for (id, (start, end)) in pairs.into_iter().enumerate() {
            let at = fat_offset as usize + id * 8;
            image[at..at + 4].copy_from_slice(&start.to_le_bytes());
            image[at + 4..at + 8].copy_from_slice(&end.to_le_bytes());
        }

        let mut title = [0u8; 12];
        let len = self.title.len().min(12);
        title[..len].copy_from_slice(&self.title.as_bytes()[..len]);
        image[0x00..0x0C].copy_from_slice(&title);
        image[0x0C..0x10].copy_from_slice(&self.game_code);
        image[0x10..0x12].copy_from_slice(b"01");
        put_u32(&mut image, 0x40, fnt_offset);
        put_u32(&mut image, 0x44, fnt.len() as u32);
        put_u32(&mut image, 0x48, fat_offset);
        put_u32(&mut image, 0x4C, fat_size);
        put_u32(&mut image, 0x50, ovt_offset);
        put_u32(&mut image, 0x54, ovt_size);
        let total_len = image.len() as u32;
        put_u32(&mut image, 0x80, total_len);
        put_u32(&mut image, 0x84, 0x4000);

        let crc = RomHeader::checksum(&image);
        image[0x15E..0x160].copy_from_slice(&crc.to_le_bytes());
        image
    }
}

// ============================================================================
// NARC archives
// ============================================================================

/// Builds a NARC archive from named or anonymous files.
#[derive(Debug, Clone)]
pub struct NarcBuilder {
    names: Option<NameTableBuilder>,
    files: Vec<Vec<u8>>,
}

impl NarcBuilder {
    /// Archive with a name table; files must be added in name-table ID order.
    pub fn named(names: NameTableBuilder) -> Self {
        Self {
            names: Some(names),
            files: Vec::new(),
        }
    }

    /// Archive whose name table only has an empty root.
    pub fn anonymous() -> Self {
        Self {
            names: None,
            files: Vec::new(),
        }
    }

    pub fn file(mut self, data: &[u8]) -> Self {
        self.files.push(data.to_vec());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut image = Vec::new();
        let mut pairs = Vec::new();
        for data in &self.files {
            let start = image.len() as u32;
            image.extend_from_slice(data);
            pairs.push((start, image.len() as u32));
            align(&mut image);
        }

        let mut fat = Vec::new();
        fat.extend_from_slice(&(self.files.len() as u16).to_le_bytes());
        fat.extend_from_slice(&0u16.to_le_bytes());
        for (start, end) in pairs {
            fat.extend_from_slice(&start.to_le_bytes());
            fat.extend_from_slice(&end.to_le_bytes());
        }

        let mut fnt = match &self.names {
            Some(names) => names.build(),
            None => NameTableBuilder::new(0).build(),
        };
        align(&mut fnt);

        let blocks = [block(b"BTAF", &fat), block(b"BTNF", &fnt), block(b"GMIF", &image)];
        let total: usize = 16 + blocks.iter().map(Vec::len).sum::<usize>();

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"NARC");
        out.extend_from_slice(&0xFFFEu16.to_le_bytes());
        out.extend_from_slice(&0x0100u16.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(&3u16.to_le_bytes());
        for b in blocks {
            out.extend_from_slice(&b);
        }
        out
    }
}

fn block(magic: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 8);
    out.extend_from_slice(magic);
    out.extend_from_slice(&((body.len() + 8) as u32).to_le_bytes());
    out.extend_from_slice(body);
    out
}

fn align(bytes: &mut Vec<u8>) {
    let padded = bytes.len().next_multiple_of(4);
    bytes.resize(padded, 0);
}

fn put_u32(bytes: &mut [u8], at: usize, value: u32) {
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
