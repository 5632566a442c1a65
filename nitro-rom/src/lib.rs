//! Nitro-ROM: a read-only virtual filesystem over Nintendo DS cartridge images
//!
//! A cartridge stores its files as two tables: the allocation table (FAT)
//! maps file IDs to byte regions, and the name table (FNT) maps directory
//! paths to file IDs. Mounting reconciles the two into a flat index of
//! `dir/sub/name.ext` paths, after which files are read through scoped
//! readers or decoded into typed objects.
//!
//! # Key Features
//!
//! - **Validated name tables**: cycles, out-of-range directories and
//!   overlapping ID ranges are rejected instead of looping or overflowing
//! - **Overlays**: IDs below the first named ID are exposed as
//!   `overlays/{id}.bin`
//! - **Extension repair**: extensionless names get one from their magic
//! - **Nested archives**: NARC files mount with the same machinery
//!
//! # Usage
//!
//! ```ignore
//! use nitro_rom::{FileProvider, MountOptions, NdsFileProvider};
//!
//! let rom = NdsFileProvider::open("game.nds".as_ref(), &MountOptions::default())?;
//! for name in rom.list_names() {
//!     println!("{name}");
//! }
//! let archive = rom.load_narc("a/0/0/1.narc")?;
//! let bytes = archive.read_bytes("0.rgcn")?;
//! ```

pub mod allocation;
pub mod config;
pub mod error;
pub mod formats;
pub mod fs;
pub mod header;
pub mod mount;
pub mod name_table;
pub mod object;
pub mod overlay;
pub mod provider;
pub mod reader;
pub mod region;
pub mod registry;

pub mod test_utils;

pub use allocation::AllocationTable;
pub use config::{ConfigError, MountOptions};
pub use error::{DecodeError, LoadError, MountError, ReadError, TableError};
pub use formats::Narc;
pub use header::{ProcessorBinary, RomHeader};
pub use mount::{FileIndex, MountBuilder, RomFile, UnnamedPolicy};
pub use name_table::NameTable;
pub use object::{Deserializable, NitroHeader};
pub use overlay::OverlayEntry;
pub use provider::{FileProvider, NdsFileProvider};
pub use reader::BinaryReader;
pub use region::{PointerMode, RegionDescriptor};
pub use registry::{FileTypeRegistry, KnownFileTypes};
