//! File providers: the query surface over a mounted index
//!
//! [`FileProvider`] is implemented by anything that owns an image and a
//! [`FileIndex`] over it: the cartridge ([`NdsFileProvider`]) and nested
//! archives ([`Narc`](crate::formats::Narc)). All queries are read-only and
//! every reader handed out borrows the provider's image.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::allocation::AllocationTable;
use crate::config::MountOptions;
use crate::error::{DecodeError, LoadError, MountError};
use crate::formats::Narc;
use crate::fs::read_file_with_limit;
use crate::header::RomHeader;
use crate::mount::{FileIndex, MountBuilder, RomFile, UnnamedPolicy};
use crate::name_table::NameTable;
use crate::object::Deserializable;
use crate::overlay::{OverlayEntry, read_overlay_table};
use crate::reader::BinaryReader;
use crate::region::RegionDescriptor;
use crate::registry::FileTypeRegistry;

/// Name-addressed access to mounted files.
pub trait FileProvider {
    /// The frozen index.
    fn files(&self) -> &FileIndex;

    /// Bytes the index's regions point into.
    fn image(&self) -> &[u8];

    /// Options and registry that nested archives are mounted with.
    fn mount_context(&self) -> (&MountOptions, &Arc<dyn FileTypeRegistry>);

    /// Every mounted name, sorted.
    fn list_names(&self) -> BTreeSet<&str> {
        self.files().names().collect()
    }

    fn exists(&self, name: &str) -> bool {
        self.files().contains(name)
    }

    fn get(&self, name: &str) -> Result<&RomFile, LoadError> {
        self.files().get(name).ok_or_else(|| LoadError::NotFound {
            name: name.to_string(),
        })
    }

    /// Independent reader over exactly one file, positioned at 0.
    fn create_reader(&self, name: &str) -> Result<BinaryReader<'_>, LoadError> {
        let file = self.get(name)?;
        self.reader_for(file)
    }

    fn reader_for(&self, file: &RomFile) -> Result<BinaryReader<'_>, LoadError> {
        BinaryReader::new(self.image())
            .load_region(&file.region)
            .map_err(|source| LoadError::Read {
                name: file.name.clone(),
                source,
            })
    }

    /// Raw contents of one file.
    fn read_bytes(&self, name: &str) -> Result<&[u8], LoadError> {
        Ok(self.create_reader(name)?.as_slice())
    }

    /// Decode a typed object from the start of a file.
    fn load_object<T: Deserializable>(&self, name: &str) -> Result<T, LoadError> {
        let file = self.get(name)?;
        self.load_file_object(file)
    }

    fn load_file_object<T: Deserializable>(&self, file: &RomFile) -> Result<T, LoadError> {
        self.reader_for(file)?
            .read_object()
            .map_err(|source| LoadError::Decode {
                name: file.name.clone(),
                source,
            })
    }

    /// Decode a nested NARC, mounting it with this provider's options and
    /// registry rather than the defaults `load_object` would use.
    fn load_narc(&self, name: &str) -> Result<Narc, LoadError> {
        let file = self.get(name)?;
        let mut reader = self.reader_for(file)?;
        let (options, registry) = self.mount_context();
        Narc::decode_with(&mut reader, options, Arc::clone(registry)).map_err(|source| {
            LoadError::Decode {
                name: file.name.clone(),
                source,
            }
        })
    }

    /// Like [`load_object`](Self::load_object), but logs the failure and
    /// returns `None` instead of an error.
    fn try_load_object<T: Deserializable>(&self, name: &str) -> Option<T> {
        match self.load_object(name) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(
                    file = name,
                    kind = std::any::type_name::<T>(),
                    error = %e,
                    "Failed to load object"
                );
                None
            }
        }
    }
}

/// Virtual filesystem over a cartridge ROM image.
#[derive(Debug, Clone)]
pub struct NdsFileProvider {
    image: Vec<u8>,
    header: RomHeader,
    allocation_table: AllocationTable,
    name_table: NameTable,
    files: FileIndex,
    options: MountOptions,
    registry: Arc<dyn FileTypeRegistry>,
}

impl NdsFileProvider {
    /// Read a ROM file and mount it.
    pub fn open(path: &Path, options: &MountOptions) -> Result<Self, MountError> {
        let image = read_file_with_limit(path, options.max_rom_bytes)?;
        tracing::info!(path = %path.display(), bytes = image.len(), "Loaded ROM image");
        Self::initialize(image, options)
    }

    /// Decode the header and both tables and mount the image, using the
    /// registry described by `options`.
    pub fn initialize(image: Vec<u8>, options: &MountOptions) -> Result<Self, MountError> {
        Self::initialize_with_registry(image, options, Arc::new(options.registry()))
    }

    /// Like [`initialize`](Self::initialize) with a caller-supplied registry.
    /// The registry is kept for archives opened with
    /// [`load_narc`](FileProvider::load_narc).
    pub fn initialize_with_registry(
        image: Vec<u8>,
        options: &MountOptions,
        registry: Arc<dyn FileTypeRegistry>,
    ) -> Result<Self, MountError> {
        let reader = BinaryReader::new(&image);

        let header = RomHeader::read(&mut reader.clone()).map_err(MountError::Header)?;
        if !header.checksum_valid(&image) {
            tracing::warn!(
                stored = header.header_crc,
                computed = RomHeader::checksum(&image),
                "Header checksum mismatch"
            );
        }

        let mut fat_reader = reader
            .load_region(&header.fat)
            .map_err(MountError::AllocationTable)?;
        let allocation_table =
            AllocationTable::load(&mut fat_reader).map_err(MountError::AllocationTable)?;

        let fnt_reader = reader
            .load_region(&header.fnt)
            .map_err(|e| MountError::NameTable(e.into()))?;
        let name_table = NameTable::load(&fnt_reader)?;

        let files = MountBuilder::new(&image, registry.as_ref(), options).mount(
            &allocation_table,
            &name_table,
            UnnamedPolicy::Overlays,
        )?;

        tracing::info!(
            title = %header.title,
            game_code = %header.game_code,
            files = files.len(),
            "Mounted ROM"
        );

        Ok(Self {
            image,
            header,
            allocation_table,
            name_table,
            files,
            options: options.clone(),
            registry,
        })
    }

    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    pub fn header(&self) -> &RomHeader {
        &self.header
    }

    pub fn allocation_table(&self) -> &AllocationTable {
        &self.allocation_table
    }

    pub fn name_table(&self) -> &NameTable {
        &self.name_table
    }

    pub fn arm9_overlays(&self) -> Result<Vec<OverlayEntry>, DecodeError> {
        self.overlay_table(&self.header.arm9_overlays)
    }

    pub fn arm7_overlays(&self) -> Result<Vec<OverlayEntry>, DecodeError> {
        self.overlay_table(&self.header.arm7_overlays)
    }

    /// Mounted file holding an overlay's code.
    pub fn overlay_file(&self, entry: &OverlayEntry) -> Option<&RomFile> {
        u16::try_from(entry.file_id)
            .ok()
            .and_then(|id| self.files.by_id(id))
    }

    fn overlay_table(&self, region: &RegionDescriptor) -> Result<Vec<OverlayEntry>, DecodeError> {
        if !region.is_live() {
            return Ok(Vec::new());
        }
        let mut reader = BinaryReader::new(&self.image).load_region(region)?;
        read_overlay_table(&mut reader)
    }
}

impl FileProvider for NdsFileProvider {
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
