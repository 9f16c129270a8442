//! Windows-specific type definitions and wrappers

pub mod handle;
pub mod memory_info;

// Re-export commonly used types
pub use handle::Handle;
pub use memory_info::MemoryBasicInfo;
