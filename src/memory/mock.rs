//! In-memory process used by tests and benchmarks
//!
//! [`MockProcess`] lays out readable and unreadable segments at chosen
//! addresses and implements [`MemoryAccess`] over them with the same contract
//! as the OS backends. Reads can be made to fail a fixed number of times to
//! exercise the walker's retry path.

use crate::core::types::{Address, MemoryError, MemoryRegion, MemoryResult, Outcome, ProcessId};
use crate::memory::access::MemoryAccess;
use crate::memory::regions::{region_from_mappings, Mapping};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Segment {
    address: Address,
    data: Vec<u8>,
    readable: bool,
}

impl Segment {
    fn end(&self) -> Address {
        self.address.saturating_add(self.data.len())
    }
}

/// Fake process whose address space is a sorted list of segments
#[derive(Debug)]
pub struct MockProcess {
    pid: ProcessId,
    segments: Vec<Segment>,
    faults: Mutex<HashMap<Address, usize>>,
    reads: AtomicUsize,
}

impl MockProcess {
    /// Starts building a mock process
    pub fn builder() -> MockProcessBuilder {
        MockProcessBuilder::default()
    }

    /// Number of `copy_memory` calls made so far, failed ones included
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Raw bytes of the readable memory in `[start, start + len)`, if mapped
    pub fn bytes(&self, start: Address, len: usize) -> Option<Vec<u8>> {
        let mut out = vec![0u8; len];
        self.fill(start, &mut out).ok()?;
        Some(out)
    }

    /// Consumes one injected failure covering `[address, end)`, if any
    fn take_fault(&self, address: Address, end: Address) -> bool {
        let Ok(mut faults) = self.faults.lock() else {
            return false;
        };
        for (fault_address, remaining) in faults.iter_mut() {
            if *remaining > 0 && *fault_address >= address && *fault_address < end {
                if *remaining != usize::MAX {
                    *remaining -= 1;
                }
                return true;
            }
        }
        false
    }

    fn fill(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<()> {
        let mut cursor = address;
        let mut written = 0;

        while written < buffer.len() {
            let segment = self
                .segments
                .iter()
                .find(|s| s.readable && s.address <= cursor && cursor < s.end())
                .ok_or_else(|| {
                    MemoryError::read_failed(address, buffer.len(), format!("{} is not mapped", cursor))
                })?;

            let offset = segment.address.distance_to(cursor);
            let count = (segment.data.len() - offset).min(buffer.len() - written);
            buffer[written..written + count].copy_from_slice(&segment.data[offset..offset + count]);
            written += count;
            cursor = cursor.saturating_add(count);
        }
        Ok(())
    }
}

impl MemoryAccess for MockProcess {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn next_readable_region(&self, address: Address) -> Outcome<Option<MemoryRegion>> {
        let mappings = self.segments.iter().map(|segment| {
            Ok(Mapping {
                start: segment.address,
                end: segment.end(),
                readable: segment.readable,
            })
        });
        region_from_mappings(mappings, address)
    }

    fn copy_memory(&self, address: Address, buffer: &mut [u8]) -> Outcome<()> {
        self.reads.fetch_add(1, Ordering::Relaxed);

        let end = address.saturating_add(buffer.len());
        if self.take_fault(address, end) {
            return Outcome::err(MemoryError::read_failed(
                address,
                buffer.len(),
                "injected fault",
            ));
        }

        self.fill(address, buffer).into()
    }
}

/// Builder for [`MockProcess`]
#[derive(Debug, Default)]
pub struct MockProcessBuilder {
    pid: ProcessId,
    segments: Vec<Segment>,
    faults: HashMap<Address, usize>,
}

impl MockProcessBuilder {
    /// Sets the pid reported by the mock
    pub fn pid(mut self, pid: ProcessId) -> Self {
        self.pid = pid;
        self
    }

    /// Maps readable `data` at `address`
    pub fn readable(mut self, address: usize, data: Vec<u8>) -> Self {
        self.segments.push(Segment {
            address: Address::new(address),
            data,
            readable: true,
        });
        self
    }

    /// Maps `size` readable bytes at `address`, filled with a position-derived pattern
    pub fn readable_pattern(self, address: usize, size: usize) -> Self {
        let data = (0..size)
            .map(|i| ((address + i) % 251) as u8)
            .collect();
        self.readable(address, data)
    }

    /// Maps `size` unreadable bytes at `address`
    pub fn unreadable(mut self, address: usize, size: usize) -> Self {
        self.segments.push(Segment {
            address: Address::new(address),
            data: vec![0; size],
            readable: false,
        });
        self
    }

    /// Makes the next `times` reads touching `address` fail
    pub fn fail_reads_at(mut self, address: usize, times: usize) -> Self {
        self.faults.insert(Address::new(address), times);
        self
    }

    /// Makes every read touching `address` fail
    pub fn always_fail_reads_at(self, address: usize) -> Self {
        self.fail_reads_at(address, usize::MAX)
    }

    /// Sorts the segments and checks they neither overlap nor are empty
    pub fn build(mut self) -> MemoryResult<MockProcess> {
        self.segments.sort_by_key(|s| s.address);

        for segment in &self.segments {
            if segment.data.is_empty() {
                return Err(MemoryError::InvalidArgument(format!(
                    "empty segment at {}",
                    segment.address
                )));
            }
        }
        for pair in self.segments.windows(2) {
            if pair[0].end() > pair[1].address {
                return Err(MemoryError::InvalidArgument(format!(
                    "segments at {} and {} overlap",
                    pair[0].address, pair[1].address
                )));
            }
        }

        Ok(MockProcess {
            pid: self.pid,
            segments: self.segments,
            faults: Mutex::new(self.faults),
            reads: AtomicUsize::new(0),
        })
    }
}
