//! Reconciling the allocation table with the name table
//!
//! The allocation table knows where every file ID lives but not what it is
//! called; the name table knows names for the IDs from `first_id` upwards.
//! Mounting walks every ID once and produces a frozen name → [`RomFile`]
//! index:
//!
//! - absent regions (`length <= 0`) are skipped
//! - regions past the end of the image are mounted unsniffed; reading them
//!   fails per call
//! - IDs below `first_id` are overlays, named `{overlay_dir}/{id}.bin`
//! - named IDs without an extension get one from their magic, or the fallback
//! - a repeated name replaces the earlier entry

use hashbrown::HashMap;

use crate::allocation::AllocationTable;
use crate::config::MountOptions;
use crate::error::MountError;
use crate::name_table::NameTable;
use crate::region::RegionDescriptor;
use crate::registry::{FileTypeRegistry, normalize_tag};

/// A mounted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomFile {
    /// Allocation table slot
    pub id: u16,
    pub name: String,
    pub region: RegionDescriptor,
}

impl RomFile {
    /// Size of the file in bytes.
    pub fn len(&self) -> usize {
        self.region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// Extension after the last `.` of the final path segment.
    pub fn extension(&self) -> Option<&str> {
        final_segment(&self.name).rsplit_once('.').map(|(_, ext)| ext)
    }
}

/// Frozen name → file index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIndex {
    files: HashMap<String, RomFile>,
    /// Allocation slot → mounted name
    ids: HashMap<u16, String>,
}

impl FileIndex {
    pub fn get(&self, name: &str) -> Option<&RomFile> {
        self.files.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn files(&self) -> impl Iterator<Item = &RomFile> {
        self.files.values()
    }

    /// File mounted from allocation slot `id`, if it survived mounting.
    pub fn by_id(&self, id: u16) -> Option<&RomFile> {
        self.ids.get(&id).and_then(|name| self.files.get(name))
    }
}

/// How IDs without a name table entry are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnnamedPolicy {
    /// Cartridge images: IDs below `first_id` are overlays; a named-range
    /// ID without an entry is corruption.
    Overlays,
    /// Archives with an empty name table: every ID is named `{id}` plus the
    /// repaired extension.
    ByIndex,
}

/// Accumulates the index during the single mount pass.
pub struct MountBuilder<'a> {
    image: &'a [u8],
    registry: &'a dyn FileTypeRegistry,
    options: &'a MountOptions,
    files: HashMap<String, RomFile>,
}

impl<'a> MountBuilder<'a> {
    /// `image` is the byte range the allocation table's offsets point into.
    pub fn new(
        image: &'a [u8],
        registry: &'a dyn FileTypeRegistry,
        options: &'a MountOptions,
    ) -> Self {
        Self {
            image,
            registry,
            options,
            files: HashMap::new(),
        }
    }

    /// Walk every allocation slot once and freeze the result.
    pub fn mount(
        mut self,
        fat: &AllocationTable,
        fnt: &NameTable,
        policy: UnnamedPolicy,
    ) -> Result<FileIndex, MountError> {
        if fat.len() > usize::from(u16::MAX) + 1 {
            return Err(MountError::TooManyFiles { count: fat.len() });
        }
        let anonymous = policy == UnnamedPolicy::ByIndex && fnt.is_empty();

        for (index, region) in fat.regions().iter().enumerate() {
            let id = index as u16;
            if !region.is_live() {
                continue;
            }
            let name = if anonymous {
                self.with_extension(id.to_string(), region)
            } else if id >= fnt.first_id() {
                let entry = fnt.get(id).ok_or(MountError::MissingName { id })?;
                self.with_extension(entry.to_string(), region)
            } else {
                format!("{}/{}.bin", self.options.overlay_dir, id)
            };

            if !region.fits_within(self.image.len()) {
                tracing::warn!(
                    id,
                    file = %name,
                    offset = region.offset,
                    length = region.length,
                    image_len = self.image.len(),
                    "Region extends past the image"
                );
            }

            self.insert(RomFile {
                id,
                name,
                region: *region,
            });
        }

        if let Some(last) = fnt.last_id()
            && usize::from(last) >= fat.len()
        {
            tracing::warn!(
                last_named_id = last,
                fat_entries = fat.len(),
                "Name table references IDs beyond the allocation table"
            );
        }

        tracing::debug!(
            files = self.files.len(),
            slots = fat.len(),
            first_id = fnt.first_id(),
            "Mounted file index"
        );

        let ids = self
            .files
            .values()
            .map(|file| (file.id, file.name.clone()))
            .collect();
        Ok(FileIndex {
            files: self.files,
            ids,
        })
    }

    fn insert(&mut self, file: RomFile) {
        let id = file.id;
        if let Some(previous) = self.files.insert(file.name.clone(), file) {
            tracing::warn!(
                file = %previous.name,
                previous_id = previous.id,
                id,
                "Duplicate file name, keeping the later ID"
            );
        }
    }

    fn with_extension(&self, mut name: String, region: &RegionDescriptor) -> String {
        if final_segment(&name).contains('.') {
            return name;
        }
        let extension = self
            .sniff(region)
            .unwrap_or_else(|| self.options.fallback_extension.clone());
        name.push('.');
        name.push_str(&extension);
        name
    }

    /// Lowercased magic at the start of the region if the registry knows it.
    fn sniff(&self, region: &RegionDescriptor) -> Option<String> {
        if !self.options.sniff_extensions
            || region.len() < 4
            || !region.fits_within(self.image.len())
        {
            return None;
        }
        let start = region.offset as usize;
        let magic = self.image.get(start..start + 4)?;
        normalize_tag(magic).filter(|tag| self.registry.contains(tag))
    }
}

fn final_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::BinaryReader;
    use crate::registry::KnownFileTypes;
    use crate::test_utils::NameTableBuilder;

    fn names(builder: &NameTableBuilder) -> NameTable {
        NameTable::load(&BinaryReader::new(&builder.build())).unwrap()
    }

    fn mount(
        image: &[u8],
        fat: Vec<RegionDescriptor>,
        fnt: &NameTable,
        registry: &KnownFileTypes,
    ) -> Result<FileIndex, MountError> {
        let options = MountOptions::default();
        MountBuilder::new(image, registry, &options).mount(
            &AllocationTable::from_regions(fat),
            fnt,
            UnnamedPolicy::Overlays,
        )
    }

    #[test]
    fn test_overlay_and_sniffed_name() {
        let mut image = vec![0u8; 128];
        image[64..68].copy_from_slice(b"TEX ");
        let mut builder = NameTableBuilder::new(2);
        let data = builder.dir(0, "data");
        builder.file(data, "map");

        let registry = KnownFileTypes::empty().with_tags(["TEX "]);
        let index = mount(
            &image,
            vec![
                RegionDescriptor::new(0, 0),
                RegionDescriptor::new(32, 20),
                RegionDescriptor::new(64, 30),
            ],
            &names(&builder),
            &registry,
        )
        .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(
            index.get("overlays/1.bin").map(|f| f.region),
            Some(RegionDescriptor::new(32, 20))
        );
        assert_eq!(
            index.get("data/map.tex").map(|f| f.region),
            Some(RegionDescriptor::new(64, 30))
        );
        assert_eq!(index.by_id(2).map(|f| f.name.as_str()), Some("data/map.tex"));
        assert!(index.by_id(0).is_none());
    }

    #[test]
    fn test_existing_extension_is_kept() {
        let mut image = vec![0u8; 64];
        image[0..4].copy_from_slice(b"NARC");
        let mut builder = NameTableBuilder::new(0);
        builder.file(0, "archive.dat");

        let index = mount(
            &image,
            vec![RegionDescriptor::new(0, 16)],
            &names(&builder),
            &KnownFileTypes::default(),
        )
        .unwrap();
        assert!(index.contains("archive.dat"));
    }

    #[test]
    fn test_dot_in_directory_does_not_count() {
        let image = vec![0u8; 64];
        let mut builder = NameTableBuilder::new(0);
        let dir = builder.dir(0, "v1.2");
        builder.file(dir, "readme");

        let index = mount(
            &image,
            vec![RegionDescriptor::new(0, 16)],
            &names(&builder),
            &KnownFileTypes::default(),
        )
        .unwrap();
        assert!(index.contains("v1.2/readme.bin"));
    }

    #[test]
    fn test_unknown_magic_falls_back() {
        let mut image = vec![0u8; 64];
        image[0..4].copy_from_slice(b"ZZZZ");
        let mut builder = NameTableBuilder::new(0);
        builder.file(0, "blob");

        let index = mount(
            &image,
            vec![RegionDescriptor::new(0, 16)],
            &names(&builder),
            &KnownFileTypes::default(),
        )
        .unwrap();
        assert_eq!(index.names().collect::<Vec<_>>(), vec!["blob.bin"]);
    }

    #[test]
    fn test_magic_is_case_insensitive() {
        let mut image = vec![0u8; 64];
        image[0..4].copy_from_slice(b"nArC");
        let mut builder = NameTableBuilder::new(0);
        builder.file(0, "pack");

        let index = mount(
            &image,
            vec![RegionDescriptor::new(0, 16)],
            &names(&builder),
            &KnownFileTypes::default(),
        )
        .unwrap();
        assert!(index.contains("pack.narc"));
    }

    #[test]
    fn test_short_region_is_not_sniffed() {
        let mut image = vec![0u8; 64];
        image[0..4].copy_from_slice(b"NARC");
        let mut builder = NameTableBuilder::new(0);
        builder.file(0, "tiny");

        let index = mount(
            &image,
            vec![RegionDescriptor::new(0, 3)],
            &names(&builder),
            &KnownFileTypes::default(),
        )
        .unwrap();
        assert!(index.contains("tiny.bin"));
    }

    #[test]
    fn test_absent_regions_are_skipped() {
        let image = vec![0u8; 64];
        let mut builder = NameTableBuilder::new(0);
        builder.file(0, "a.bin").file(0, "b.bin").file(0, "c.bin");

        let index = mount(
            &image,
            vec![
                RegionDescriptor::new(0, 0),
                RegionDescriptor::new(16, -8),
                RegionDescriptor::new(0, 8),
            ],
            &names(&builder),
            &KnownFileTypes::default(),
        )
        .unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.contains("c.bin"));
        assert!(index.files().all(|f| f.region.is_live()));
    }

    #[test]
    fn test_region_outside_image_is_still_mounted() {
        let image = vec![0u8; 32];
        let mut builder = NameTableBuilder::new(0);
        builder.file(0, "a").file(0, "b.bin");

        let index = mount(
            &image,
            vec![RegionDescriptor::new(16, 64), RegionDescriptor::new(0, 16)],
            &names(&builder),
            &KnownFileTypes::default(),
        )
        .unwrap();
        assert_eq!(index.len(), 2);
        // Not sniffed, so the fallback applies
        assert_eq!(
            index.get("a.bin").map(|f| f.region),
            Some(RegionDescriptor::new(16, 64))
        );
        assert!(index.contains("b.bin"));
    }

    #[test]
    fn test_out_of_image_overlay_is_mounted() {
        let image = vec![0u8; 32];
        let mut builder = NameTableBuilder::new(1);
        builder.file(0, "a.bin");

        let index = mount(
            &image,
            vec![RegionDescriptor::new(16, 64), RegionDescriptor::new(0, 8)],
            &names(&builder),
            &KnownFileTypes::default(),
        )
        .unwrap();
        assert_eq!(index.by_id(0).map(|f| f.name.as_str()), Some("overlays/0.bin"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_missing_name_behind_out_of_image_region() {
        let image = vec![0u8; 32];
        let mut builder = NameTableBuilder::new(0);
        builder.file(0, "only.bin");

        let result = mount(
            &image,
            vec![RegionDescriptor::new(0, 8), RegionDescriptor::new(16, 64)],
            &names(&builder),
            &KnownFileTypes::default(),
        );
        assert!(matches!(result, Err(MountError::MissingName { id: 1 })));
    }

    #[test]
    fn test_missing_name_is_structural() {
        let image = vec![0u8; 64];
        let mut builder = NameTableBuilder::new(0);
        builder.file(0, "only.bin");

        let result = mount(
            &image,
            vec![RegionDescriptor::new(0, 8), RegionDescriptor::new(8, 8)],
            &names(&builder),
            &KnownFileTypes::default(),
        );
        assert!(matches!(result, Err(MountError::MissingName { id: 1 })));
    }

    #[test]
    fn test_duplicate_names_keep_later_id() {
        let image = vec![0u8; 64];
        let mut builder = NameTableBuilder::new(0);
        // "x" and "x.bin" collide once the fallback extension is added
        builder.file(0, "x").file(0, "x.bin");

        let index = mount(
            &image,
            vec![RegionDescriptor::new(0, 8), RegionDescriptor::new(8, 16)],
            &names(&builder),
            &KnownFileTypes::default(),
        )
        .unwrap();
        assert_eq!(index.len(), 1);
        let file = index.get("x.bin").unwrap();
        assert_eq!(file.id, 1);
        assert_eq!(file.region, RegionDescriptor::new(8, 16));
        assert_eq!(index.by_id(1).map(|f| f.name.as_str()), Some("x.bin"));
        assert!(index.by_id(0).is_none());
    }

    #[test]
    fn test_custom_options() {
        let mut image = vec![0u8; 64];
        image[16..20].copy_from_slice(b"NARC");
        let mut builder = NameTableBuilder::new(1);
        builder.file(0, "pack");

        let options = MountOptions {
            overlay_dir: "ovl".to_string(),
            fallback_extension: "dat".to_string(),
            sniff_extensions: false,
            ..MountOptions::default()
        };
        let registry = options.registry();
        let index = MountBuilder::new(&image, &registry, &options)
            .mount(
                &AllocationTable::from_regions(vec![
                    RegionDescriptor::new(0, 8),
                    RegionDescriptor::new(16, 8),
                ]),
                &names(&builder),
                UnnamedPolicy::Overlays,
            )
            .unwrap();

        assert!(index.contains("ovl/0.bin"));
        assert!(index.contains("pack.dat"));
    }

    #[test]
    fn test_by_index_policy() {
        let mut image = vec![0u8; 64];
        image[8..12].copy_from_slice(b"RGCN");
        let options = MountOptions::default();
        let registry = KnownFileTypes::default();

        let index = MountBuilder::new(&image, &registry, &options)
            .mount(
                &AllocationTable::from_regions(vec![
                    RegionDescriptor::new(0, 8),
                    RegionDescriptor::new(8, 8),
                ]),
                &names(&NameTableBuilder::new(0)),
                UnnamedPolicy::ByIndex,
            )
            .unwrap();

        assert!(index.contains("0.bin"));
        assert!(index.contains("1.rgcn"));
    }

    #[test]
    fn test_rom_file_extension() {
        let file = RomFile {
            id: 0,
            name: "a.b/c.narc".to_string(),
            region: RegionDescriptor::new(0, 4),
        };
        assert_eq!(file.extension(), Some("narc"));
        assert_eq!(file.len(), 4);
    }
}
