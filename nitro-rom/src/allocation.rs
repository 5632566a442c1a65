//! File allocation table (FAT)
//!
//! A flat array of `StartEnd` region descriptors. The position of a
//! descriptor is its file ID.

use crate::error::ReadError;
use crate::reader::BinaryReader;
use crate::region::{PointerMode, RegionDescriptor};

/// Region descriptors indexed by file ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationTable {
    regions: Vec<RegionDescriptor>,
}

impl AllocationTable {
    /// Decode descriptors until the scoped table range is exhausted.
    pub fn load(reader: &mut BinaryReader<'_>) -> Result<Self, ReadError> {
        let count = reader.remaining() / RegionDescriptor::SIZE;
        let table = Self::with_count(reader, count)?;

        let trailing = reader.remaining();
        if trailing > 0 {
            tracing::debug!(trailing, "Ignoring partial descriptor at end of allocation table");
        }
        Ok(table)
    }

    /// Decode exactly `count` descriptors (archives store the count explicitly).
    pub fn with_count(reader: &mut BinaryReader<'_>, count: usize) -> Result<Self, ReadError> {
        let mut regions = Vec::with_capacity(count.min(reader.remaining() / RegionDescriptor::SIZE));
        for _ in 0..count {
            regions.push(RegionDescriptor::decode(reader, PointerMode::StartEnd)?);
        }
        Ok(Self { regions })
    }

    pub fn from_regions(regions: Vec<RegionDescriptor>) -> Self {
        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: u16) -> Option<&RegionDescriptor> {
        self.regions.get(usize::from(id))
    }

    pub fn regions(&self) -> &[RegionDescriptor] {
        &self.regions
    }

    /// Number of slots with backing bytes.
    pub fn live_count(&self) -> usize {
        self.regions.iter().filter(|r| r.is_live()).count()
    }
}
