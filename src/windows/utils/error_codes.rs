//! Windows error code handling utilities

use crate::core::types::{MemoryError, ProcessId};
use std::fmt;
use winapi::shared::winerror::{
    ERROR_ACCESS_DENIED, ERROR_INSUFFICIENT_BUFFER, ERROR_INVALID_ADDRESS, ERROR_INVALID_HANDLE,
    ERROR_INVALID_PARAMETER, ERROR_PARTIAL_COPY, ERROR_SUCCESS,
};
use winapi::um::errhandlingapi::GetLastError;

/// Windows error codes the backend tells apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success,
    AccessDenied,
    InvalidHandle,
    InvalidParameter,
    InsufficientBuffer,
    PartialCopy,
    InvalidAddress,
    Other(u32),
}

impl From<u32> for ErrorCode {
    fn from(code: u32) -> Self {
        match code {
            ERROR_SUCCESS => ErrorCode::Success,
            ERROR_ACCESS_DENIED => ErrorCode::AccessDenied,
            ERROR_INVALID_HANDLE => ErrorCode::InvalidHandle,
            ERROR_INVALID_PARAMETER => ErrorCode::InvalidParameter,
            ERROR_INSUFFICIENT_BUFFER => ErrorCode::InsufficientBuffer,
            ERROR_PARTIAL_COPY => ErrorCode::PartialCopy,
            ERROR_INVALID_ADDRESS => ErrorCode::InvalidAddress,
            _ => ErrorCode::Other(code),
        }
    }
}

impl ErrorCode {
    /// Get the last Windows error of the calling thread
    pub fn last_error() -> Self {
        // SAFETY: GetLastError only reads thread-local state
        ErrorCode::from(unsafe { GetLastError() })
    }

    /// Raw Win32 error value
    pub fn raw(&self) -> u32 {
        match self {
            ErrorCode::Success => ERROR_SUCCESS,
            ErrorCode::AccessDenied => ERROR_ACCESS_DENIED,
            ErrorCode::InvalidHandle => ERROR_INVALID_HANDLE,
            ErrorCode::InvalidParameter => ERROR_INVALID_PARAMETER,
            ErrorCode::InsufficientBuffer => ERROR_INSUFFICIENT_BUFFER,
            ErrorCode::PartialCopy => ERROR_PARTIAL_COPY,
            ErrorCode::InvalidAddress => ERROR_INVALID_ADDRESS,
            ErrorCode::Other(code) => *code,
        }
    }

    /// System message text for the code
    pub fn message(&self) -> String {
        windows::core::HRESULT::from_win32(self.raw())
            .message()
            .to_string()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (error {})", self.message().trim_end(), self.raw())
    }
}

/// Windows error wrapper carrying the failed call's context
pub struct WinError {
    code: ErrorCode,
    context: String,
}

impl WinError {
    /// Captures the last Windows error with context
    pub fn new(context: impl Into<String>) -> Self {
        WinError {
            code: ErrorCode::last_error(),
            context: context.into(),
        }
    }

    /// Create with specific error code
    pub fn with_code(code: ErrorCode, context: impl Into<String>) -> Self {
        WinError {
            code,
            context: context.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Maps the error for an operation on `pid` into the crate's taxonomy
    pub fn into_memory_error(self, pid: ProcessId) -> MemoryError {
        match self.code {
            ErrorCode::AccessDenied => {
                MemoryError::access_denied(pid, format!("{}: {}", self.context, self.code))
            }
            ErrorCode::InvalidParameter => MemoryError::NoSuchProcess { pid },
            code => MemoryError::WindowsApi(format!("{}: {}", self.context, code)),
        }
    }
}

impl fmt::Display for WinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_conversion() {
        assert_eq!(ErrorCode::from(0), ErrorCode::Success);
        assert_eq!(ErrorCode::from(5), ErrorCode::AccessDenied);
        assert_eq!(ErrorCode::from(999), ErrorCode::Other(999));
        assert_eq!(ErrorCode::from(87).raw(), 87);
    }

    #[test]
    fn test_error_mapping() {
        let denied = WinError::with_code(ErrorCode::AccessDenied, "OpenProcess").into_memory_error(4);
        assert!(denied.is_access_denied());

        let missing = WinError::with_code(ErrorCode::InvalidParameter, "OpenProcess").into_memory_error(7);
        assert!(missing.is_no_such_process());

        let other = WinError::with_code(ErrorCode::InvalidHandle, "ReadProcessMemory").into_memory_error(7);
        assert!(other.to_string().contains("ReadProcessMemory"));
    }
}
