//! Linux backend built on procfs and `process_vm_readv`

pub mod maps;
pub mod mem;
pub mod procfs;

pub use maps::{parse_maps, read_maps, MapEntry};
pub use mem::{probe_access, read_process_memory};
pub use procfs::{comm, exe_path, list_pids};
