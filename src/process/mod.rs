//! Process access: handles, enumeration and loaded libraries
//!
//! [`ProcessHandle`] is the OS-backed implementation of
//! [`MemoryAccess`](crate::memory::MemoryAccess); the rest of this module
//! finds processes to open.

pub mod enumerator;
pub mod handle;
pub mod libraries;

pub use enumerator::{all_pids, close_all, grep, open_all, processes};
pub use handle::ProcessHandle;
pub use libraries::{
    find_processes_with_library, has_library, loaded_libraries, matching_loaded_libraries,
};
