//! Windows backend built on kernel32 and psapi
//!
//! All unsafe FFI calls are contained within this module; callers see owned
//! handles, copied buffers and `MemoryError`s.

pub mod bindings;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use types::{Handle, MemoryBasicInfo};
pub use utils::{ErrorCode, WinError};

// Re-export key bindings
pub use bindings::{kernel32, psapi};
