//! Typed decoding from scoped readers
//!
//! Any type implementing [`Deserializable`] can be loaded from a mounted file
//! with [`FileProvider::load_object`](crate::FileProvider::load_object).
//! [`BinaryReader::read_object`] checks `MAGIC` before handing the reader to
//! `deserialize`, so implementations may assume the magic is present.

use crate::error::DecodeError;
use crate::reader::BinaryReader;

/// Capability of decoding a value from a reader positioned at its start.
pub trait Deserializable: Sized {
    /// Four bytes expected at the reader's position, if the format has any.
    const MAGIC: Option<&'static [u8; 4]> = None;

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self, DecodeError>;
}

/// Byte-order mark of little-endian Nitro containers
pub const NITRO_BOM: u16 = 0xFFFE;

/// Generic 16-byte header shared by Nitro container formats.
///
/// ```text
/// 0x00: magic [4]
/// 0x04: byte order mark u16 (0xFFFE)
/// 0x06: version u16
/// 0x08: file size u32
/// 0x0C: header size u16
/// 0x0E: block count u16
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NitroHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub file_size: u32,
    pub header_size: u16,
    pub block_count: u16,
}

impl NitroHeader {
    pub const SIZE: usize = 16;

    pub fn magic_str(&self) -> String {
        String::from_utf8_lossy(&self.magic).into_owned()
    }
}

impl Deserializable for NitroHeader {
    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self, DecodeError> {
        let magic = reader.read_array::<4>()?;
        let bom = reader.read_u16()?;
        if bom != NITRO_BOM {
            return Err(DecodeError::Invalid {
                what: "byte order mark",
                reason: format!("expected 0x{NITRO_BOM:04X}, found 0x{bom:04X}"),
            });
        }
        let version = reader.read_u16()?;
        let file_size = reader.read_u32()?;
        let header_size = reader.read_u16()?;
        let block_count = reader.read_u16()?;
        if usize::from(header_size) < Self::SIZE {
            return Err(DecodeError::Invalid {
                what: "header size",
                reason: format!("{header_size} is smaller than {}", Self::SIZE),
            });
        }
        Ok(Self {
            magic,
            version,
            file_size,
            header_size,
            block_count,
        })
    }
}

/// 8-byte block header: magic and size including the header itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub magic: [u8; 4],
    pub size: u32,
}

impl BlockHeader {
    pub const SIZE: usize = 8;
}

impl Deserializable for BlockHeader {
    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            magic: reader.read_array()?,
            size: reader.read_u32()?,
        })
    }
}

/// Read the block at the cursor, check its magic, and return a reader over
/// its body. The cursor moves past the whole block.
pub fn read_block<'a>(
    reader: &mut BinaryReader<'a>,
    magic: &[u8; 4],
) -> Result<BinaryReader<'a>, DecodeError> {
    let start = reader.position();
    let header: BlockHeader = reader.read_object()?;
    if &header.magic != magic {
        return Err(DecodeError::MagicMismatch {
            expected: String::from_utf8_lossy(magic).into_owned(),
            found: String::from_utf8_lossy(&header.magic).into_owned(),
        });
    }
    let size = header.size as usize;
    if size < BlockHeader::SIZE {
        return Err(DecodeError::Invalid {
            what: "block size",
            reason: format!(
                "block '{}' claims {size} bytes",
                String::from_utf8_lossy(magic)
            ),
        });
    }
    let body = reader.scope(start + BlockHeader::SIZE, size - BlockHeader::SIZE)?;
    reader.seek(start + size)?;
    Ok(body)
}
