//! Kernel32.dll bindings for process and memory operations

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use crate::windows::types::{Handle, MemoryBasicInfo};
use crate::windows::utils::{ErrorCode, WinError};
use std::mem;
use winapi::shared::basetsd::SIZE_T;
use winapi::shared::minwindef::{FALSE, LPCVOID, LPVOID};
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::{ReadProcessMemory, VirtualQueryEx};
use winapi::um::processthreadsapi::OpenProcess;
use winapi::um::winnt::{
    HANDLE, MEMORY_BASIC_INFORMATION, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

/// Opens `pid` for querying and reading its memory
pub fn open_process(pid: ProcessId) -> MemoryResult<Handle> {
    // SAFETY: OpenProcess takes no pointers
    let handle = unsafe { OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, FALSE, pid) };
    if handle.is_null() {
        Err(WinError::new("OpenProcess").into_memory_error(pid))
    } else {
        Ok(Handle::new(handle))
    }
}

/// Safe wrapper for CloseHandle
///
/// # Safety
/// The handle must be owned by the caller and not used afterwards
pub unsafe fn close_handle(handle: HANDLE) -> Result<(), WinError> {
    if handle.is_null() {
        return Ok(());
    }

    if CloseHandle(handle) == FALSE {
        Err(WinError::new("CloseHandle"))
    } else {
        Ok(())
    }
}

/// Fills `buffer` from `address`; anything short of the full length fails
pub fn read_process_memory(handle: &Handle, address: Address, buffer: &mut [u8]) -> MemoryResult<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    let mut bytes_read: SIZE_T = 0;

    // SAFETY: `buffer` is writable for `buffer.len()` bytes and outlives the
    // call; the remote address is only dereferenced inside the target.
    let result = unsafe {
        ReadProcessMemory(
            handle.raw(),
            address.as_usize() as LPCVOID,
            buffer.as_mut_ptr() as LPVOID,
            buffer.len(),
            &mut bytes_read,
        )
    };

    if result == FALSE {
        let error = WinError::new("ReadProcessMemory");
        return Err(MemoryError::read_failed(address, buffer.len(), error.to_string()));
    }
    if bytes_read != buffer.len() {
        return Err(MemoryError::read_failed(
            address,
            buffer.len(),
            format!("short read of {} bytes", bytes_read),
        ));
    }
    Ok(())
}

/// Queries the memory block containing `address`.
///
/// Returns `None` past the end of the user address space, where
/// VirtualQueryEx fails with ERROR_INVALID_PARAMETER.
pub fn virtual_query_ex(handle: &Handle, address: Address) -> Result<Option<MemoryBasicInfo>, WinError> {
    // SAFETY: MEMORY_BASIC_INFORMATION is plain data; all-zero is valid
    let mut mbi: MEMORY_BASIC_INFORMATION = unsafe { mem::zeroed() };

    // SAFETY: `mbi` is a valid out-pointer of the size passed
    let result = unsafe {
        VirtualQueryEx(
            handle.raw(),
            address.as_usize() as LPCVOID,
            &mut mbi,
            mem::size_of::<MEMORY_BASIC_INFORMATION>(),
        )
    };

    if result == 0 {
        let error = WinError::new(format!("VirtualQueryEx at {}", address));
        if error.code() == ErrorCode::InvalidParameter {
            return Ok(None);
        }
        return Err(error);
    }
    Ok(Some(MemoryBasicInfo::from(mbi)))
}

/// Successive memory blocks of a process from a start address upward
pub struct MemoryBlocks<'a> {
    handle: &'a Handle,
    pid: ProcessId,
    next: Option<Address>,
}

impl<'a> MemoryBlocks<'a> {
    pub fn new(handle: &'a Handle, pid: ProcessId, start: Address) -> Self {
        MemoryBlocks {
            handle,
            pid,
            next: Some(start),
        }
    }
}

impl Iterator for MemoryBlocks<'_> {
    type Item = MemoryResult<MemoryBasicInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        let address = self.next.take()?;

        match virtual_query_ex(self.handle, address) {
            Ok(Some(block)) => {
                if block.end() > address {
                    self.next = Some(block.end());
                }
                Some(Ok(block))
            }
            Ok(None) => None,
            Err(error) => Some(Err(MemoryError::enumeration_failed(
                self.pid,
                error.to_string(),
            ))),
        }
    }
}
