//! ARM9/ARM7 overlay tables
//!
//! Each entry is 32 bytes of little-endian u32 fields:
//! overlay ID, RAM address, RAM size, BSS size, static initializer start and
//! end, file ID, flags. The file ID points into the allocation table's
//! overlay range.

use bytemuck::{Pod, Zeroable};

use crate::error::DecodeError;
use crate::object::Deserializable;
use crate::reader::BinaryReader;

/// One overlay table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct OverlayEntry {
    pub overlay_id: u32,
    pub ram_address: u32,
    pub ram_size: u32,
    pub bss_size: u32,
    pub static_init_start: u32,
    pub static_init_end: u32,
    pub file_id: u32,
    pub flags: u32,
}

impl OverlayEntry {
    pub const SIZE: usize = 32;

    /// Size of the overlay's file when compressed (flags bits 0-23).
    pub fn compressed_size(&self) -> u32 {
        self.flags & 0x00FF_FFFF
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & 0x0100_0000 != 0
    }
}

impl Deserializable for OverlayEntry {
    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self, DecodeError> {
        let raw: Self = reader.read_pod()?;
        Ok(Self {
            overlay_id: u32::from_le(raw.overlay_id),
            ram_address: u32::from_le(raw.ram_address),
            ram_size: u32::from_le(raw.ram_size),
            bss_size: u32::from_le(raw.bss_size),
            static_init_start: u32::from_le(raw.static_init_start),
            static_init_end: u32::from_le(raw.static_init_end),
            file_id: u32::from_le(raw.file_id),
            flags: u32::from_le(raw.flags),
        })
    }
}

/// Decode every whole entry in a reader scoped to an overlay table.
pub fn read_overlay_table(reader: &mut BinaryReader<'_>) -> Result<Vec<OverlayEntry>, DecodeError> {
    let count = reader.remaining() / OverlayEntry::SIZE;
    (0..count).map(|_| reader.read_object()).collect()
}
