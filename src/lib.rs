//! memwalk: read-only introspection of another process's memory
//!
//! Open a process, enumerate its readable regions, walk them in chunks and
//! search them for literal bytes or regular expressions. Linux and Windows
//! backends implement the same [`MemoryAccess`] capability.

pub mod config;
pub mod core;
pub mod logging;
pub mod memory;
pub mod process;

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(windows)]
pub mod windows;

// Re-export main types from core module
pub use crate::core::types::{
    Address, MemoryError, MemoryRegion, MemoryResult, Outcome, ProcessId, ProcessInfo,
};

pub use memory::{
    find_bytes, find_regex, find_regex_with_charset, walk, walk_sliding, Charset, MemoryAccess,
    MemoryScanner, ScanOptions, WalkEnd,
};
pub use process::ProcessHandle;

// Re-export core directly for full access
pub use crate::core::*;
