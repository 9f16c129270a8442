//! Memory region enumeration over any [`MemoryAccess`]

use crate::core::types::{Address, MemoryError, MemoryRegion, MemoryResult, Outcome};
use crate::memory::access::MemoryAccess;
use tracing::trace;

/// Enumerates the readable regions of a process in address order.
///
/// Each step asks the backend for the next region at or after the end of the
/// previous one, so the yielded regions are strictly increasing and never
/// overlap. Iteration ends at the "no region" sentinel or after the first
/// hard error, which is yielded once.
pub struct RegionEnumerator<'a, H: MemoryAccess + ?Sized> {
    access: &'a H,
    current_address: Option<Address>,
    soft_errors: Vec<MemoryError>,
}

impl<'a, H: MemoryAccess + ?Sized> RegionEnumerator<'a, H> {
    /// Create a new region enumerator starting at address zero
    pub fn new(access: &'a H) -> Self {
        Self::starting_at(access, Address::null())
    }

    /// Create a region enumerator starting at `address`
    pub fn starting_at(access: &'a H, address: Address) -> Self {
        RegionEnumerator {
            access,
            current_address: Some(address),
            soft_errors: Vec::new(),
        }
    }

    /// Soft errors reported by the backend so far
    pub fn soft_errors(&self) -> &[MemoryError] {
        &self.soft_errors
    }

    /// Takes ownership of the soft errors collected so far
    pub fn take_soft_errors(&mut self) -> Vec<MemoryError> {
        std::mem::take(&mut self.soft_errors)
    }

    /// Get the next memory region
    pub fn next_region(&mut self) -> Option<MemoryResult<MemoryRegion>> {
        let address = self.current_address?;

        let region = match self
            .access
            .next_readable_region(address)
            .collect_into(&mut self.soft_errors)
        {
            Ok(Some(region)) => region,
            Ok(None) => {
                self.current_address = None;
                return None;
            }
            Err(error) => {
                self.current_address = None;
                return Some(Err(error));
            }
        };

        if region.end() <= address {
            self.current_address = None;
            return Some(Err(MemoryError::enumeration_failed(
                self.access.pid(),
                format!("backend returned {} for a lookup at {}", region, address),
            )));
        }

        trace!(pid = self.access.pid(), %region, "readable region");
        // A region touching the top of the address space is the last one.
        self.current_address = region.address().checked_add(region.size());
        Some(Ok(region))
    }
}

impl<H: MemoryAccess + ?Sized> Iterator for RegionEnumerator<'_, H> {
    type Item = MemoryResult<MemoryRegion>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_region()
    }
}

/// Collects every readable region at or after `start`
pub fn readable_regions<H: MemoryAccess + ?Sized>(
    access: &H,
    start: Address,
) -> Outcome<Vec<MemoryRegion>> {
    let mut enumerator = RegionEnumerator::starting_at(access, start);
    let mut regions = Vec::new();

    while let Some(next) = enumerator.next_region() {
        match next {
            Ok(region) => regions.push(region),
            Err(error) => return Outcome::new(Err(error), enumerator.take_soft_errors()),
        }
    }

    Outcome::new(Ok(regions), enumerator.take_soft_errors())
}

/// One mapping of an address space as the OS reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub start: Address,
    pub end: Address,
    pub readable: bool,
}

/// Resolves the readable region containing `address`, or the next one above
/// it, from mappings in ascending address order.
///
/// Mappings ending at or below `address` are skipped, so the region starts
/// at the first mapping that reaches past it. From there readable mappings
/// that touch are merged into one region. Unreadable
/// mappings crossed before the region starts are soft errors; one met after
/// it started only ends it. The first `Err` from `mappings` is the hard error.
pub fn region_from_mappings<I>(mappings: I, address: Address) -> Outcome<Option<MemoryRegion>>
where
    I: IntoIterator<Item = MemoryResult<Mapping>>,
{
    let mut soft_errors = Vec::new();
    let mut region: Option<MemoryRegion> = None;

    for mapping in mappings {
        let mapping = match mapping {
            Ok(mapping) => mapping,
            Err(error) => return Outcome::new(Err(error), soft_errors),
        };
        if mapping.end <= address {
            continue;
        }
        let Some(candidate) = MemoryRegion::from_bounds(mapping.start, mapping.end) else {
            continue;
        };

        if let Some(current) = region.as_mut() {
            if !mapping.readable || !current.try_extend(&candidate) {
                break;
            }
        } else if mapping.readable {
            region = Some(candidate);
        } else {
            soft_errors.push(MemoryError::UnreadableMemory {
                start: mapping.start,
                end: mapping.end,
            });
        }
    }

    Outcome::new(Ok(region), soft_errors)
}
