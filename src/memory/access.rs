//! Capability interface every memory backend implements
//!
//! The walker and the searches are written once against [`MemoryAccess`];
//! the per-OS [`ProcessHandle`](crate::process::ProcessHandle) and the
//! in-memory [`MockProcess`](crate::memory::mock::MockProcess) are the
//! implementations.

use crate::core::types::{Address, MemoryRegion, Outcome, ProcessId};

/// Read-only access to one process's address space.
///
/// Implementations hold no mutable cursor, so a single value may be shared by
/// reference between threads that read concurrently.
pub trait MemoryAccess {
    /// Process the accessor is bound to
    fn pid(&self) -> ProcessId;

    /// Returns the readable region containing `address`, or the next readable
    /// region above it, or `None` when no readable memory is left.
    ///
    /// Adjacent readable mappings from the one holding `address` upward are
    /// merged, so the region ends where readable memory ends. Its start is
    /// that first mapping's start; touching readable mappings wholly below
    /// `address` are not looked at. Unreadable mappings crossed while
    /// searching are soft errors;
    /// the hard error is reserved for failing to enumerate at all.
    fn next_readable_region(&self, address: Address) -> Outcome<Option<MemoryRegion>>;

    /// Fills `buffer` with the bytes starting at `address`.
    ///
    /// A read that cannot fill the whole buffer is a hard error naming the
    /// address and byte count; the buffer contents are then unspecified.
    fn copy_memory(&self, address: Address, buffer: &mut [u8]) -> Outcome<()>;
}

impl<T: MemoryAccess + ?Sized> MemoryAccess for &T {
    fn pid(&self) -> ProcessId {
        (**self).pid()
    }

    fn next_readable_region(&self, address: Address) -> Outcome<Option<MemoryRegion>> {
        (**self).next_readable_region(address)
    }

    fn copy_memory(&self, address: Address, buffer: &mut [u8]) -> Outcome<()> {
        (**self).copy_memory(address, buffer)
    }
}
