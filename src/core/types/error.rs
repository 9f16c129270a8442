//! Error type shared by every memwalk operation
//!
//! The same enum serves both tiers of the taxonomy: an error returned in the
//! `Err` arm of a result is a hard error, while errors collected in an
//! [`Outcome`](super::Outcome)'s soft error list are informational.

use super::{Address, ProcessId};
use crate::memory::charsets::CharsetError;
use thiserror::Error;

/// Main error type for memory operations
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("No such process: {pid}")]
    NoSuchProcess { pid: ProcessId },

    #[error("Access denied to process {pid}: {reason}")]
    AccessDenied { pid: ProcessId, reason: String },

    #[error("Failed to read {size} bytes at {address}: {reason}")]
    ReadFailed {
        address: Address,
        size: usize,
        reason: String,
    },

    #[error("Unreadable memory {start}-{end}")]
    UnreadableMemory { start: Address, end: Address },

    #[error("Failed to enumerate memory regions of process {pid}: {reason}")]
    EnumerationFailed { pid: ProcessId, reason: String },

    #[error("Failed to release resources of process {pid}: {reason}")]
    ReleaseFailed { pid: ProcessId, reason: String },

    #[error("Invalid memory address: {0}")]
    InvalidAddress(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid pattern format: {0}")]
    InvalidPattern(String),

    #[error("Charset decoding failed: {0}")]
    Charset(#[from] CharsetError),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Windows API: {0}")]
    WindowsApi(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

impl MemoryError {
    /// Creates an access denied error for a process
    pub fn access_denied(pid: ProcessId, reason: impl Into<String>) -> Self {
        MemoryError::AccessDenied {
            pid,
            reason: reason.into(),
        }
    }

    /// Creates a read failed error naming the attempted range
    pub fn read_failed(address: Address, size: usize, reason: impl Into<String>) -> Self {
        MemoryError::ReadFailed {
            address,
            size,
            reason: reason.into(),
        }
    }

    /// Creates an enumeration failure for a process
    pub fn enumeration_failed(pid: ProcessId, reason: impl Into<String>) -> Self {
        MemoryError::EnumerationFailed {
            pid,
            reason: reason.into(),
        }
    }

    /// Creates a release failure for a process
    pub fn release_failed(pid: ProcessId, reason: impl Into<String>) -> Self {
        MemoryError::ReleaseFailed {
            pid,
            reason: reason.into(),
        }
    }

    /// Whether the error says the target process is gone or was never there
    pub fn is_no_such_process(&self) -> bool {
        matches!(self, MemoryError::NoSuchProcess { .. })
    }

    /// Whether the error says the OS refused access to the target
    pub fn is_access_denied(&self) -> bool {
        matches!(self, MemoryError::AccessDenied { .. })
    }
}
