//! Core module containing fundamental types for memwalk
//!
//! This module provides the foundational building blocks used throughout
//! the crate, including address handling, region descriptors, process
//! information, and error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Address, MemoryError, MemoryRegion, MemoryResult, Outcome, ProcessId, ProcessInfo,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

// Platform verification at compile time
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
compile_error!("memwalk only supports Linux and Windows");
