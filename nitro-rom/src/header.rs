//! Nitro cartridge header
//!
//! # Layout (little-endian)
//! ```text
//! 0x000: title [12]            0x040: FNT offset, size
//! 0x00C: game code [4]         0x048: FAT offset, size
//! 0x010: maker code [2]        0x050: ARM9 overlay table offset, size
//! 0x012: unit code u8          0x058: ARM7 overlay table offset, size
//! 0x014: device capacity u8    0x068: banner offset
//! 0x01E: ROM version u8        0x080: total used ROM size
//! 0x020: ARM9 binary [4 × u32] 0x084: header size
//! 0x030: ARM7 binary [4 × u32] 0x15E: header CRC16
//! ```

use crate::error::ReadError;
use crate::reader::BinaryReader;
use crate::region::{PointerMode, RegionDescriptor};

/// Load information for one CPU's main binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessorBinary {
    pub rom_offset: u32,
    pub entry_address: u32,
    pub ram_address: u32,
    pub size: u32,
}

impl ProcessorBinary {
    fn read(reader: &mut BinaryReader<'_>) -> Result<Self, ReadError> {
        Ok(Self {
            rom_offset: reader.read_u32()?,
            entry_address: reader.read_u32()?,
            ram_address: reader.read_u32()?,
            size: reader.read_u32()?,
        })
    }

    /// Region of the binary inside the ROM image.
    pub fn region(&self) -> RegionDescriptor {
        RegionDescriptor::new(self.rom_offset, i64::from(self.size))
    }
}

/// Decoded cartridge header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomHeader {
    pub title: String,
    pub game_code: String,
    pub maker_code: String,
    pub unit_code: u8,
    pub device_capacity: u8,
    pub rom_version: u8,
    pub arm9: ProcessorBinary,
    pub arm7: ProcessorBinary,
    pub fnt: RegionDescriptor,
    pub fat: RegionDescriptor,
    pub arm9_overlays: RegionDescriptor,
    pub arm7_overlays: RegionDescriptor,
    pub banner_offset: u32,
    pub total_used_rom_size: u32,
    pub header_size: u32,
    pub header_crc: u16,
}

impl RomHeader {
    /// Bytes covered by the decoded fields, CRC included
    pub const SIZE: usize = 0x160;

    /// Bytes covered by the header CRC
    pub const CRC_RANGE: usize = 0x15E;

    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self, ReadError> {
        // Fail on a short image before decoding anything
        reader.peek_bytes(0, Self::SIZE)?;
        reader.seek(0)?;

        let title = reader.read_string(12)?;
        let game_code = reader.read_string(4)?;
        let maker_code = reader.read_string(2)?;
        let unit_code = reader.read_u8()?;
        reader.skip(1)?; // encryption seed select
        let device_capacity = reader.read_u8()?;
        reader.seek(0x1E)?;
        let rom_version = reader.read_u8()?;
        reader.seek(0x20)?;

        let arm9 = ProcessorBinary::read(reader)?;
        let arm7 = ProcessorBinary::read(reader)?;
        let fnt = RegionDescriptor::decode(reader, PointerMode::OffsetLength)?;
        let fat = RegionDescriptor::decode(reader, PointerMode::OffsetLength)?;
        let arm9_overlays = RegionDescriptor::decode(reader, PointerMode::OffsetLength)?;
        let arm7_overlays = RegionDescriptor::decode(reader, PointerMode::OffsetLength)?;

        reader.seek(0x68)?;
        let banner_offset = reader.read_u32()?;
        reader.seek(0x80)?;
        let total_used_rom_size = reader.read_u32()?;
        let header_size = reader.read_u32()?;
        reader.seek(Self::CRC_RANGE)?;
        let header_crc = reader.read_u16()?;

        Ok(Self {
            title,
            game_code,
            maker_code,
            unit_code,
            device_capacity,
            rom_version,
            arm9,
            arm7,
            fnt,
            fat,
            arm9_overlays,
            arm7_overlays,
            banner_offset,
            total_used_rom_size,
            header_size,
            header_crc,
        })
    }

    /// CRC-16/MODBUS of the first 0x15E bytes of `image`.
    pub fn checksum(image: &[u8]) -> u16 {
        crc16(&image[..Self::CRC_RANGE.min(image.len())])
    }

    /// True when the stored header CRC matches the image.
    pub fn checksum_valid(&self, image: &[u8]) -> bool {
        image.len() >= Self::CRC_RANGE && Self::checksum(image) == self.header_crc
    }
}

/// CRC-16/MODBUS, as stored at 0x15E
const HEADER_CRC: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_MODBUS);

fn crc16(bytes: &[u8]) -> u16 {
    HEADER_CRC.checksum(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{NameTableBuilder, RomBuilder};

    #[test]
    fn test_crc16_check_value() {
        assert_eq!(crc16(b"123456789"), 0x4B37);
    }

    #[test]
    fn test_read_built_header() {
        let mut names = NameTableBuilder::new(0);
        names.file(0, "a.bin");
        let image = RomBuilder::new(names).title("MYGAME").slot(b"abcd").build();

        let header = RomHeader::read(&mut BinaryReader::new(&image)).unwrap();
        assert_eq!(header.title, "MYGAME");
        assert_eq!(header.game_code, "NTST");
        assert_eq!(header.maker_code, "01");
        assert_eq!(header.fnt.offset, 0x200);
        assert!(header.fnt.is_live());
        assert_eq!(header.fat.length, 8);
        assert_eq!(header.header_size, 0x4000);
        assert!(header.checksum_valid(&image));
    }

    #[test]
    fn test_checksum_detects_change() {
        let image = RomBuilder::new(NameTableBuilder::new(0)).build();
        let mut tampered = image.clone();
        tampered[0] ^= 0xFF;

        let header = RomHeader::read(&mut BinaryReader::new(&tampered)).unwrap();
        assert!(!header.checksum_valid(&tampered));
    }

    #[test]
    fn test_short_image() {
        let image = vec![0u8; RomHeader::SIZE - 1];
        assert!(matches!(
            RomHeader::read(&mut BinaryReader::new(&image)),
            Err(ReadError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_processor_region() {
        let arm9 = ProcessorBinary {
            rom_offset: 0x4000,
            entry_address: 0x0200_0800,
            ram_address: 0x0200_0000,
            size: 0x1000,
        };
        assert_eq!(arm9.region(), RegionDescriptor::new(0x4000, 0x1000));
    }
}
