//! Owned process HANDLE with automatic cleanup

use crate::windows::bindings::kernel32;
use crate::windows::utils::WinError;
use std::ptr;
use winapi::um::winnt::HANDLE;

/// Owned Windows HANDLE, closed on drop unless closed explicitly
pub struct Handle {
    handle: HANDLE,
}

impl Handle {
    /// Takes ownership of `handle`
    pub fn new(handle: HANDLE) -> Self {
        Handle { handle }
    }

    /// Check if handle is null
    pub fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    /// Get the raw handle, valid while `self` lives
    pub fn raw(&self) -> HANDLE {
        self.handle
    }

    /// Closes the handle, reporting a failure instead of ignoring it
    pub fn close(mut self) -> Result<(), WinError> {
        let handle = std::mem::replace(&mut self.handle, ptr::null_mut());
        // SAFETY: the handle is owned by `self` and is not used again
        unsafe { kernel32::close_handle(handle) }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            // SAFETY: the handle is owned by `self`; errors cannot be reported here
            unsafe {
                let _ = kernel32::close_handle(self.handle);
            }
        }
    }
}

// Process handles are usable from any thread of the owning process
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handle_close_is_noop() {
        let handle = Handle::new(ptr::null_mut());
        assert!(handle.is_null());
        assert!(handle.close().is_ok());
    }
}
