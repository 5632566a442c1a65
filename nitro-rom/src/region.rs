//! Byte ranges inside a ROM image

use crate::error::ReadError;
use crate::reader::BinaryReader;

/// On-disk encoding of a region descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerMode {
    /// Offset followed by an explicit length
    #[default]
    OffsetLength,
    /// Offset followed by an exclusive end offset
    StartEnd,
}

/// An `(offset, length)` byte range.
///
/// The length is signed: a `StartEnd` pair whose end lies before its start
/// decodes to a negative length. Any region with `length <= 0` is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RegionDescriptor {
    pub offset: u32,
    pub length: i64,
}

impl RegionDescriptor {
    /// Encoded size in either mode
    pub const SIZE: usize = 8;

    pub const fn new(offset: u32, length: i64) -> Self {
        Self { offset, length }
    }

    /// Decode two little-endian u32 values. Malformed values are passed
    /// through for the caller to filter.
    pub fn decode(reader: &mut BinaryReader<'_>, mode: PointerMode) -> Result<Self, ReadError> {
        let offset = reader.read_u32()?;
        let second = reader.read_u32()?;
        let length = match mode {
            PointerMode::OffsetLength => i64::from(second),
            PointerMode::StartEnd => i64::from(second) - i64::from(offset),
        };
        Ok(Self { offset, length })
    }

    /// True when the region has backing bytes.
    pub fn is_live(&self) -> bool {
        self.length > 0
    }

    /// Length in bytes, 0 for absent regions.
    pub fn len(&self) -> usize {
        usize::try_from(self.length).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        !self.is_live()
    }

    /// Exclusive end offset, `None` for absent regions.
    pub fn end(&self) -> Option<u64> {
        self.is_live()
            .then(|| u64::from(self.offset) + self.length as u64)
    }

    /// True when the region is live and lies entirely within `image_len` bytes.
    pub fn fits_within(&self, image_len: usize) -> bool {
        self.end().is_some_and(|end| end <= image_len as u64)
    }
}
