//! Memory block information from VirtualQueryEx

use crate::core::types::Address;
use crate::memory::regions::Mapping;
use winapi::um::winnt::{MEMORY_BASIC_INFORMATION, MEM_COMMIT, PAGE_GUARD, PAGE_NOACCESS};

/// Wrapper for MEMORY_BASIC_INFORMATION
#[derive(Debug, Clone)]
pub struct MemoryBasicInfo {
    pub base_address: Address,
    pub region_size: usize,
    pub state: u32,
    pub protect: u32,
}

impl From<MEMORY_BASIC_INFORMATION> for MemoryBasicInfo {
    fn from(mbi: MEMORY_BASIC_INFORMATION) -> Self {
        MemoryBasicInfo {
            base_address: Address::new(mbi.BaseAddress as usize),
            region_size: mbi.RegionSize,
            state: mbi.State,
            protect: mbi.Protect,
        }
    }
}

impl MemoryBasicInfo {
    /// Check if memory is committed
    pub fn is_committed(&self) -> bool {
        self.state == MEM_COMMIT
    }

    /// Committed, and neither no-access nor a guard page
    pub fn is_readable(&self) -> bool {
        self.is_committed() && self.protect & PAGE_NOACCESS == 0 && self.protect & PAGE_GUARD == 0
    }

    pub fn end(&self) -> Address {
        self.base_address.saturating_add(self.region_size)
    }

    pub fn mapping(&self) -> Mapping {
        Mapping {
            start: self.base_address,
            end: self.end(),
            readable: self.is_readable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(state: u32, protect: u32) -> MemoryBasicInfo {
        MemoryBasicInfo {
            base_address: Address::new(0x1000),
            region_size: 0x2000,
            state,
            protect,
        }
    }

    #[test]
    fn test_readability() {
        // PAGE_READWRITE
        assert!(block(MEM_COMMIT, 0x04).is_readable());
        assert!(!block(MEM_COMMIT, PAGE_NOACCESS).is_readable());
        assert!(!block(MEM_COMMIT, 0x04 | PAGE_GUARD).is_readable());
        // MEM_RESERVE
        assert!(!block(0x2000, 0x04).is_readable());
    }

    #[test]
    fn test_mapping_bounds() {
        let mapping = block(MEM_COMMIT, 0x02).mapping();
        assert_eq!(mapping.start, Address::new(0x1000));
        assert_eq!(mapping.end, Address::new(0x3000));
        assert!(mapping.readable);
    }
}
