//! Core type definitions for memwalk
//!
//! This module contains all fundamental types used throughout the crate:
//! addresses, readable regions, process snapshots, and the two-tier error
//! model (hard errors in results, soft errors alongside them).

mod address;
mod error;
mod outcome;
mod process_info;
mod region;

// Re-export all public types
pub use address::Address;
pub use error::{MemoryError, MemoryResult};
pub use outcome::Outcome;
pub use process_info::ProcessInfo;
pub use region::MemoryRegion;

// Common type aliases
pub type ProcessId = u32;
