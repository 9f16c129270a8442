//! Process handle with RAII semantics, implementing [`MemoryAccess`]

use crate::core::types::{Address, MemoryRegion, MemoryResult, Outcome, ProcessId};
use crate::memory::access::MemoryAccess;
use crate::memory::regions::region_from_mappings;
use std::fmt;
use tracing::debug;

#[cfg(target_os = "linux")]
use crate::linux;

#[cfg(windows)]
use crate::core::types::MemoryError;
#[cfg(windows)]
use crate::windows::bindings::{kernel32, psapi};
#[cfg(windows)]
use crate::windows::types::Handle;

/// Read-only access to another process's memory.
///
/// The handle never mutates the target, so a `&ProcessHandle` may be shared
/// between threads reading concurrently. Resources are released by
/// [`close`](Self::close), or on drop when `close` is never called.
pub struct ProcessHandle {
    pid: ProcessId,
    #[cfg(windows)]
    handle: Handle,
}

impl ProcessHandle {
    /// Opens `pid` for reading.
    ///
    /// Fails with `NoSuchProcess` or `AccessDenied` when the OS refuses.
    #[cfg(target_os = "linux")]
    pub fn open(pid: ProcessId) -> MemoryResult<Self> {
        linux::probe_access(pid)?;
        debug!(pid, "opened process");
        Ok(ProcessHandle { pid })
    }

    /// Opens `pid` for reading.
    ///
    /// Fails with `NoSuchProcess` or `AccessDenied` when the OS refuses.
    #[cfg(windows)]
    pub fn open(pid: ProcessId) -> MemoryResult<Self> {
        let handle = kernel32::open_process(pid)?;
        debug!(pid, "opened process");
        Ok(ProcessHandle { pid, handle })
    }

    /// Releases the handle's OS resources
    #[cfg(target_os = "linux")]
    pub fn close(self) -> Outcome<()> {
        debug!(pid = self.pid, "closed process");
        Outcome::ok(())
    }

    /// Releases the handle's OS resources
    #[cfg(windows)]
    pub fn close(self) -> Outcome<()> {
        let ProcessHandle { pid, handle } = self;
        match handle.close() {
            Ok(()) => {
                debug!(pid, "closed process");
                Outcome::ok(())
            }
            Err(e) => Outcome::err(MemoryError::release_failed(pid, e.to_string())),
        }
    }

    /// Process identifier
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Full path of the process executable
    #[cfg(target_os = "linux")]
    pub fn name(&self) -> MemoryResult<String> {
        let path = linux::exe_path(self.pid)?;
        Ok(path.to_string_lossy().into_owned())
    }

    /// Full path of the process image, in NT device form
    #[cfg(windows)]
    pub fn name(&self) -> MemoryResult<String> {
        let path = psapi::process_image_file_name(&self.handle)
            .map_err(|e| e.into_memory_error(self.pid))?;
        Ok(path.to_string_lossy().into_owned())
    }

    #[cfg(windows)]
    pub(crate) fn raw_handle(&self) -> &Handle {
        &self.handle
    }
}

#[cfg(target_os = "linux")]
impl MemoryAccess for ProcessHandle {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn next_readable_region(&self, address: Address) -> Outcome<Option<MemoryRegion>> {
        let entries = match linux::read_maps(self.pid) {
            Ok(entries) => entries,
            Err(e) => return Outcome::err(e),
        };
        let mappings = entries
            .iter()
            .filter(|entry| !entry.is_pseudo())
            .map(|entry| Ok(entry.mapping()));
        region_from_mappings(mappings, address)
    }

    fn copy_memory(&self, address: Address, buffer: &mut [u8]) -> Outcome<()> {
        linux::read_process_memory(self.pid, address, buffer).into()
    }
}

#[cfg(windows)]
impl MemoryAccess for ProcessHandle {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn next_readable_region(&self, address: Address) -> Outcome<Option<MemoryRegion>> {
        // Free and reserved blocks are holes, not unreadable memory
        let mappings = kernel32::MemoryBlocks::new(&self.handle, self.pid, address)
            .filter(|block| block.as_ref().map_or(true, |b| b.is_committed()))
            .map(|block| block.map(|b| b.mapping()));
        region_from_mappings(mappings, address)
    }

    fn copy_memory(&self, address: Address, buffer: &mut [u8]) -> Outcome<()> {
        kernel32::read_process_memory(&self.handle, address, buffer).into()
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle").field("pid", &self.pid).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::regions::readable_regions;

    fn own() -> ProcessHandle {
        ProcessHandle::open(std::process::id()).unwrap()
    }

    #[test]
    fn test_handle_is_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProcessHandle>();
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_open_own_process() {
        let handle = own();
        assert_eq!(handle.pid(), std::process::id());
        assert_eq!(MemoryAccess::pid(&handle), std::process::id());
        let (result, soft) = handle.close().into_parts();
        assert!(result.is_ok());
        assert!(soft.is_empty());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_open_missing_process() {
        // Above the default pid_max on Linux and never a Windows pid
        let err = ProcessHandle::open(0x7fff_fff1).unwrap_err();
        assert!(err.is_no_such_process(), "unexpected error: {err}");
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_name_is_test_binary() {
        let handle = own();
        let name = handle.name().unwrap();
        let exe = std::env::current_exe().unwrap();
        let stem = exe.file_stem().unwrap().to_string_lossy().into_owned();
        assert!(name.contains(&stem), "{name} does not name {stem}");
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_read_own_heap() {
        let handle = own();
        let data: Vec<u8> = (0..64u8).collect();
        let address = Address::new(data.as_ptr() as usize);

        let region = handle.next_readable_region(address).collect_into(&mut Vec::new());
        let region = region.unwrap().expect("heap is readable");
        assert!(region.contains(address));

        let mut buffer = vec![0u8; data.len()];
        let (result, _) = handle.copy_memory(address, &mut buffer).into_parts();
        result.unwrap();
        assert_eq!(buffer, data);
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_own_regions_ascend() {
        let handle = own();
        let (regions, _) = readable_regions(&handle, Address::null()).into_parts();
        let regions = regions.unwrap();
        assert!(!regions.is_empty());
        assert!(regions.windows(2).all(|w| w[0].end() <= w[1].address()));
    }
}
