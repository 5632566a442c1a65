//! Little-endian binary cursor over a borrowed byte slice
//!
//! A `BinaryReader` never owns data. Scoping a sub-range produces a new,
//! independent reader whose position starts at 0, so decoders always work
//! with offsets relative to the start of the structure they decode.

use bytemuck::Pod;

use crate::error::{DecodeError, ReadError};
use crate::object::Deserializable;
use crate::region::RegionDescriptor;

/// Cursor over an immutable byte range.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
    /// Absolute offset of `data` inside the outermost reader (diagnostics only)
    base: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            base: 0,
        }
    }

    /// Size of the readable range in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current position relative to the start of this reader.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Absolute offset of this reader's start in the image it was scoped from.
    pub fn base_offset(&self) -> usize {
        self.base
    }

    /// Bytes left between the cursor and the end of the range.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// The whole range this reader covers, independent of the cursor.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    pub fn seek(&mut self, position: usize) -> Result<(), ReadError> {
        if position > self.data.len() {
            return Err(self.eof(position, 0));
        }
        self.position = position;
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<(), ReadError> {
        self.read_bytes(count).map(|_| ())
    }

    /// Read `count` bytes and advance.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], ReadError> {
        let bytes = self.peek_bytes(self.position, count)?;
        self.position += count;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ReadError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, ReadError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, ReadError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a plain-old-data record verbatim.
    ///
    /// The bytes are copied without any endian conversion; records read this
    /// way store little-endian fields and convert them with `from_le`.
    pub fn read_pod<T: Pod>(&mut self) -> Result<T, ReadError> {
        let bytes = self.read_bytes(std::mem::size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Read a fixed-length string, cut at the first NUL.
    pub fn read_string(&mut self, len: usize) -> Result<String, ReadError> {
        Ok(decode_string(self.read_bytes(len)?))
    }

    /// Borrow `len` bytes at `offset` without moving the cursor.
    pub fn peek_bytes(&self, offset: usize, len: usize) -> Result<&'a [u8], ReadError> {
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| self.eof(offset, len))?;
        Ok(&self.data[offset..end])
    }

    /// Read a `len`-byte string at `offset` without moving the cursor.
    pub fn peek_string(&self, len: usize, offset: usize) -> Result<String, ReadError> {
        Ok(decode_string(self.peek_bytes(offset, len)?))
    }

    /// New reader over `[offset, offset + len)` of this one, positioned at 0.
    pub fn scope(&self, offset: usize, len: usize) -> Result<BinaryReader<'a>, ReadError> {
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(ReadError::OutOfBounds {
                offset: self.base + offset,
                length: len,
                len: self.data.len(),
            })?;
        Ok(BinaryReader {
            data: &self.data[offset..end],
            position: 0,
            base: self.base + offset,
        })
    }

    /// New reader over the bytes a region descriptor points at.
    pub fn load_region(&self, region: &RegionDescriptor) -> Result<BinaryReader<'a>, ReadError> {
        if region.length < 0 {
            return Err(ReadError::NegativeLength {
                offset: region.offset,
                length: region.length,
            });
        }
        self.scope(region.offset as usize, region.len())
    }

    /// Decode a typed object at the cursor, checking its magic first.
    pub fn read_object<T: Deserializable>(&mut self) -> Result<T, DecodeError> {
        if let Some(magic) = T::MAGIC {
            let found = self.peek_bytes(self.position, magic.len())?;
            if found != magic {
                return Err(DecodeError::MagicMismatch {
                    expected: String::from_utf8_lossy(magic).into_owned(),
                    found: String::from_utf8_lossy(found).into_owned(),
                });
            }
        }
        T::deserialize(self)
    }

    fn eof(&self, offset: usize, requested: usize) -> ReadError {
        ReadError::UnexpectedEof {
            offset: self.base + offset,
            requested,
            len: self.data.len(),
        }
    }
}

/// NUL-terminated or fixed-length string, lossy for non-UTF-8 bytes.
pub(crate) fn decode_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integers_little_endian() {
        let data = [0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(reader.read_i32().unwrap(), -1);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0u8; 3];
        let mut reader = BinaryReader::new(&data);
        let err = reader.read_u32().unwrap_err();
        assert_eq!(
            err,
            ReadError::UnexpectedEof {
                offset: 0,
                requested: 4,
                len: 3
            }
        );
        // Failed reads leave the cursor where it was
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_peek_does_not_move() {
        let data = b"xxNARCyy";
        let mut reader = BinaryReader::new(data);
        reader.skip(1).unwrap();

        assert_eq!(reader.peek_string(4, 2).unwrap(), "NARC");
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_read_string_stops_at_nul() {
        let data = b"POKEMON\0\0\0\0\0";
        let mut reader = BinaryReader::new(data);
        assert_eq!(reader.read_string(12).unwrap(), "POKEMON");
        assert_eq!(reader.position(), 12);
    }

    #[test]
    fn test_scope_is_relative() {
        let data: Vec<u8> = (0u8..32).collect();
        let reader = BinaryReader::new(&data);
        let mut inner = reader.scope(8, 8).unwrap();

        assert_eq!(inner.position(), 0);
        assert_eq!(inner.len(), 8);
        assert_eq!(inner.base_offset(), 8);
        assert_eq!(inner.read_u8().unwrap(), 8);

        let mut nested = inner.scope(4, 4).unwrap();
        assert_eq!(nested.base_offset(), 12);
        assert_eq!(nested.read_u8().unwrap(), 12);

        // Nested reads cannot escape their parent range
        assert!(inner.scope(4, 5).is_err());
        assert!(matches!(
            inner.read_bytes(8),
            Err(ReadError::UnexpectedEof { offset: 9, .. })
        ));
    }

    #[test]
    fn test_scope_overflow_is_out_of_bounds() {
        let data = [0u8; 4];
        let reader = BinaryReader::new(&data);
        assert!(matches!(
            reader.scope(usize::MAX, 2),
            Err(ReadError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_load_region_rejects_negative_length() {
        let data = [0u8; 16];
        let reader = BinaryReader::new(&data);
        let region = RegionDescriptor::new(8, -4);
        assert!(matches!(
            reader.load_region(&region),
            Err(ReadError::NegativeLength { offset: 8, length: -4 })
        ));
    }

    #[test]
    fn test_read_pod() {
        #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
        #[repr(C)]
        struct Pair {
            a: u32,
            b: u32,
        }

        let data = [1, 0, 0, 0, 2, 0, 0, 0];
        let mut reader = BinaryReader::new(&data);
        let pair: Pair = reader.read_pod().unwrap();
        assert_eq!(u32::from_le(pair.a), 1);
        assert_eq!(u32::from_le(pair.b), 2);
    }

    #[test]
    fn test_seek_bounds() {
        let data = [0u8; 4];
        let mut reader = BinaryReader::new(&data);
        assert!(reader.seek(4).is_ok());
        assert_eq!(reader.remaining(), 0);
        assert!(reader.seek(5).is_err());
    }
}
