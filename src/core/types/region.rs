//! Readable memory region descriptor

use super::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A span of contiguous readable memory in a target process.
///
/// Regions are snapshots: the target may remap its memory at any time, so a
/// region returned by one enumeration call says nothing about the next one.
/// No readable memory starts at [`end`](Self::end); adjacent readable
/// mappings have already been merged into this region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryRegion {
    address: Address,
    size: usize,
}

impl MemoryRegion {
    /// Creates a region. Returns `None` for an empty span.
    pub fn new(address: Address, size: usize) -> Option<Self> {
        (size > 0).then_some(MemoryRegion { address, size })
    }

    /// Creates a region covering `[start, end)`. Returns `None` when empty.
    pub fn from_bounds(start: Address, end: Address) -> Option<Self> {
        Self::new(start, start.distance_to(end))
    }

    /// Base address of the region
    pub fn address(&self) -> Address {
        self.address
    }

    /// Size of the region in bytes, always positive
    pub fn size(&self) -> usize {
        self.size
    }

    /// First address past the region
    pub fn end(&self) -> Address {
        self.address.saturating_add(self.size)
    }

    /// Check if an address is within this region
    pub fn contains(&self, address: Address) -> bool {
        address >= self.address && address < self.end()
    }

    /// Grows the region by `size` bytes when `next` starts exactly at our end.
    ///
    /// Returns `false` and leaves the region untouched otherwise.
    pub fn try_extend(&mut self, next: &MemoryRegion) -> bool {
        if next.address != self.end() {
            return false;
        }
        self.size = self.size.saturating_add(next.size);
        true
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}-{:x} ({} bytes)", self.address, self.end(), self.size)
    }
}
