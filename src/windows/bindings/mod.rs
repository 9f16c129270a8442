//! Windows API bindings
//!
//! Low-level FFI bindings to Windows system libraries.

pub mod kernel32;
pub mod psapi;

pub use kernel32::{open_process, read_process_memory, virtual_query_ex, MemoryBlocks};
pub use psapi::{enum_processes, loaded_module_paths, process_image_file_name};
