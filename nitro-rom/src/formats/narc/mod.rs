//! NARC archives (`.narc`)
//!
//! A NARC is a small filesystem of its own, stored as a file inside the ROM.
//! It carries the same two tables as a cartridge and is mounted the same
//! way, with offsets relative to its image block.
//!
//! # Layout
//! ```text
//! 0x00: Nitro header (magic "NARC", 3 blocks)
//! BTAF: file count u16, reserved u16, count × (start u32, end u32)
//! BTNF: name table (see `name_table`)
//! GMIF: file image
//! ```
//!
//! Most archives ship a name table with only an empty root; their files are
//! named by index (`0.rgcn`, `1.bin`, ...).


use std::sync::Arc;

use crate::allocation::AllocationTable;
use crate::config::MountOptions;
use crate::error::DecodeError;
use crate::mount::{FileIndex, MountBuilder, UnnamedPolicy};
use crate::name_table::NameTable;
use crate::object::{Deserializable, NitroHeader, read_block};
use crate::provider::FileProvider;
use crate::reader::BinaryReader;
use crate::registry::{FileTypeRegistry, KnownFileTypes};

pub const NARC_MAGIC: &[u8; 4] = b"NARC";
pub const FAT_BLOCK_MAGIC: &[u8; 4] = b"BTAF";
pub const FNT_BLOCK_MAGIC: &[u8; 4] = b"BTNF";
pub const IMAGE_BLOCK_MAGIC: &[u8; 4] = b"GMIF";

/// A decoded archive with its own mounted index.
#[derive(Debug, Clone)]
pub struct Narc {
    pub header: NitroHeader,
    allocation_table: AllocationTable,
    name_table: NameTable,
    image: Vec<u8>,
    files: FileIndex,
    options: MountOptions,
    registry: Arc<dyn FileTypeRegistry>,
}

impl Narc {
    /// Decode an archive at the cursor and mount it with `options` and
    /// `registry`. Archives nested inside this one inherit both through
    /// [`load_narc`](FileProvider::load_narc).
    pub fn decode_with(
        reader: &mut BinaryReader<'_>,
        options: &MountOptions,
        registry: Arc<dyn FileTypeRegistry>,
    ) -> Result<Self, DecodeError> {
        let start = reader.position();
        let header: NitroHeader = reader.read_object()?;
        if &header.magic != NARC_MAGIC {
            return Err(DecodeError::MagicMismatch {
                expected: String::from_utf8_lossy(NARC_MAGIC).into_owned(),
                found: header.magic_str(),
            });
        }
        if header.block_count < 3 {
            return Err(DecodeError::Invalid {
                what: "NARC block count",
                reason: format!("expected 3 blocks, found {}", header.block_count),
            });
        }
        reader.seek(start + usize::from(header.header_size))?;

        let mut fat_block = read_block(reader, FAT_BLOCK_MAGIC)?;
        let count = fat_block.read_u16()?;
        fat_block.skip(2)?;
        let allocation_table = AllocationTable::with_count(&mut fat_block, usize::from(count))?;

        let fnt_block = read_block(reader, FNT_BLOCK_MAGIC)?;
        let name_table = NameTable::load(&fnt_block)?;

        let image_block = read_block(reader, IMAGE_BLOCK_MAGIC)?;
        let image = image_block.as_slice().to_vec();

        let files = MountBuilder::new(&image, registry.as_ref(), options).mount(
            &allocation_table,
            &name_table,
            UnnamedPolicy::ByIndex,
        )?;

        tracing::debug!(
            files = files.len(),
            named = !name_table.is_empty(),
            "Decoded NARC archive"
        );

        Ok(Self {
            header,
            allocation_table,
            name_table,
            image,
            files,
            options: options.clone(),
            registry,
        })
    }

    pub fn allocation_table(&self) -> &AllocationTable {
        &self.allocation_table
    }

    pub fn name_table(&self) -> &NameTable {
        &self.name_table
    }

    /// True when files are named by index rather than by the name table.
    pub fn is_anonymous(&self) -> bool {
        self.name_table.is_empty()
    }
}

impl Deserializable for Narc {
    const MAGIC: Option<&'static [u8; 4]> = Some(NARC_MAGIC);

    /// Mounts with the default options and registry.
    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self, DecodeError> {
        Self::decode_with(
            reader,
            &MountOptions::default(),
            Arc::new(KnownFileTypes::default()),
        )
    }
}

impl FileProvider for Narc {
    fn files(&self) -> &FileIndex {
        &self.files
    }

    fn image(&self) -> &[u8] {
        &self.image
    }

    fn mount_context(&self) -> (&MountOptions, &Arc<dyn FileTypeRegistry>) {
        (&self.options, &self.registry)
    }
}
