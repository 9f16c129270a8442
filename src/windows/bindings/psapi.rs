//! PSAPI.dll bindings for process and module enumeration

use crate::core::types::{MemoryResult, ProcessId};
use crate::windows::types::Handle;
use crate::windows::utils::{wide_to_path, WinError};
use std::path::PathBuf;
use winapi::shared::minwindef::{DWORD, FALSE, HMODULE, MAX_PATH};
use winapi::um::psapi::{
    EnumProcessModules, EnumProcesses, GetModuleFileNameExW, GetProcessImageFileNameW,
};

/// Longest path the wide-string APIs can return
const MAX_LONG_PATH: usize = 32_768;

/// Pids of every running process
pub fn enum_processes() -> Result<Vec<ProcessId>, WinError> {
    let mut pids: Vec<DWORD> = vec![0; 1024];

    loop {
        let capacity = (pids.len() * std::mem::size_of::<DWORD>()) as DWORD;
        let mut bytes_needed: DWORD = 0;

        // SAFETY: `pids` is writable for `capacity` bytes
        let result = unsafe { EnumProcesses(pids.as_mut_ptr(), capacity, &mut bytes_needed) };
        if result == FALSE {
            return Err(WinError::new("EnumProcesses"));
        }

        // A full buffer may mean the list was truncated
        if bytes_needed < capacity {
            pids.truncate(bytes_needed as usize / std::mem::size_of::<DWORD>());
            pids.retain(|&pid| pid != 0);
            return Ok(pids);
        }
        pids.resize(pids.len() * 2, 0);
    }
}

/// Module handles loaded in the process
pub fn enum_process_modules(handle: &Handle) -> Result<Vec<HMODULE>, WinError> {
    let mut modules: Vec<HMODULE> = vec![std::ptr::null_mut(); 256];

    loop {
        let capacity = (modules.len() * std::mem::size_of::<HMODULE>()) as DWORD;
        let mut bytes_needed: DWORD = 0;

        // SAFETY: `modules` is writable for `capacity` bytes
        let result = unsafe {
            EnumProcessModules(handle.raw(), modules.as_mut_ptr(), capacity, &mut bytes_needed)
        };
        if result == FALSE {
            return Err(WinError::new("EnumProcessModules"));
        }

        let count = bytes_needed as usize / std::mem::size_of::<HMODULE>();
        if count <= modules.len() {
            modules.truncate(count);
            return Ok(modules);
        }
        modules.resize(count, std::ptr::null_mut());
    }
}

/// Calls a wide-string getter with growing buffers until the result fits
fn read_wide_path<F>(context: &str, mut getter: F) -> Result<PathBuf, WinError>
where
    F: FnMut(&mut [u16]) -> DWORD,
{
    let mut buffer = vec![0u16; MAX_PATH];
    loop {
        let length = getter(&mut buffer) as usize;
        if length == 0 {
            return Err(WinError::new(context));
        }
        if length < buffer.len() || buffer.len() >= MAX_LONG_PATH {
            buffer.truncate(length);
            return Ok(wide_to_path(&buffer));
        }
        buffer.resize(buffer.len() * 2, 0);
    }
}

/// Full path of a loaded module
pub fn module_file_name(handle: &Handle, module: HMODULE) -> Result<PathBuf, WinError> {
    read_wide_path("GetModuleFileNameExW", |buffer| {
        // SAFETY: `buffer` is writable for the length passed
        unsafe {
            GetModuleFileNameExW(handle.raw(), module, buffer.as_mut_ptr(), buffer.len() as DWORD)
        }
    })
}

/// Image path of the process, in NT device form
pub fn process_image_file_name(handle: &Handle) -> Result<PathBuf, WinError> {
    read_wide_path("GetProcessImageFileNameW", |buffer| {
        // SAFETY: `buffer` is writable for the length passed
        unsafe { GetProcessImageFileNameW(handle.raw(), buffer.as_mut_ptr(), buffer.len() as DWORD) }
    })
}

/// Paths of every module loaded in the process, in load order
pub fn loaded_module_paths(handle: &Handle, pid: ProcessId) -> MemoryResult<Vec<PathBuf>> {
    let modules = enum_process_modules(handle).map_err(|e| e.into_memory_error(pid))?;
    modules
        .into_iter()
        .map(|module| module_file_name(handle, module).map_err(|e| e.into_memory_error(pid)))
        .collect()
}
