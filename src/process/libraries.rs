//! Shared libraries loaded by a process

use crate::core::types::{MemoryResult, Outcome, ProcessId};
#[cfg(windows)]
use crate::process::enumerator::close_all;
use crate::process::enumerator::all_pids;
use crate::process::handle::ProcessHandle;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;
#[cfg(windows)]
use tracing::warn;

/// Absolute paths of the files mapped into a process, in first-seen order
#[cfg(target_os = "linux")]
fn library_paths(pid: ProcessId) -> MemoryResult<Vec<PathBuf>> {
    let entries = crate::linux::read_maps(pid)?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries.iter().filter(|e| e.is_file_backed()) {
        if let Some(path) = entry.pathname.as_deref().map(PathBuf::from) {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    Ok(paths)
}

/// Libraries loaded by the process, each listed once.
///
/// On Linux these are the file-backed mappings of `/proc/<pid>/maps`, so the
/// executable itself is included.
pub fn loaded_libraries(process: &ProcessHandle) -> Outcome<Vec<PathBuf>> {
    #[cfg(target_os = "linux")]
    let paths = library_paths(process.pid());

    #[cfg(windows)]
    let paths = crate::windows::bindings::psapi::loaded_module_paths(
        process.raw_handle(),
        process.pid(),
    );

    paths.into()
}

/// Loaded libraries whose full path matches `pattern`
pub fn matching_loaded_libraries(process: &ProcessHandle, pattern: &Regex) -> Outcome<Vec<PathBuf>> {
    loaded_libraries(process).map(|paths| {
        paths
            .into_iter()
            .filter(|path| pattern.is_match(&path.to_string_lossy()))
            .collect()
    })
}

fn file_name_matches(path: &Path, pattern: &Regex) -> bool {
    path.file_name()
        .is_some_and(|name| pattern.is_match(&name.to_string_lossy()))
}

/// Whether `pid` has loaded a library whose file name matches `pattern`
pub fn has_library(pid: ProcessId, pattern: &Regex) -> MemoryResult<bool> {
    #[cfg(target_os = "linux")]
    let paths = library_paths(pid)?;

    #[cfg(windows)]
    let paths = {
        let process = ProcessHandle::open(pid)?;
        let paths = crate::windows::bindings::psapi::loaded_module_paths(
            process.raw_handle(),
            pid,
        );
        for error in close_all(vec![process]) {
            warn!(pid, error = %error, "failed to release process");
        }
        paths?
    };

    Ok(paths.iter().any(|path| file_name_matches(path, pattern)))
}

/// Pids of the processes with a library whose file name matches `pattern`.
///
/// Processes that cannot be inspected are soft errors.
pub fn find_processes_with_library(pattern: &Regex) -> Outcome<Vec<ProcessId>> {
    let mut soft_errors = Vec::new();
    let pids = match all_pids().collect_into(&mut soft_errors) {
        Ok(pids) => pids,
        Err(e) => return Outcome::new(Err(e), soft_errors),
    };

    let mut found = Vec::new();
    for pid in pids {
        match has_library(pid, pattern) {
            Ok(true) => found.push(pid),
            Ok(false) => {}
            Err(e) => soft_errors.push(e),
        }
    }
    debug!(%pattern, matches = found.len(), "searched loaded libraries");
    Outcome::new(Ok(found), soft_errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    const SYSTEM_LIBRARY: &str = r"^(libc|ld-linux|ld-musl|libgcc_s)";
    #[cfg(windows)]
    const SYSTEM_LIBRARY: &str = r"(?i)^kernel32\.dll$";

    fn own() -> ProcessHandle {
        ProcessHandle::open(std::process::id()).unwrap()
    }

    #[test]
    fn test_file_name_matches_last_component() {
        let pattern = Regex::new("^libssl").unwrap();
        assert!(file_name_matches(Path::new("/usr/lib/libssl.so.3"), &pattern));
        assert!(!file_name_matches(Path::new("/opt/libssl/other.so"), &pattern));
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_loaded_libraries_unique_and_absolute() {
        let (paths, _) = loaded_libraries(&own()).into_parts();
        let paths = paths.unwrap();
        assert!(!paths.is_empty());
        assert!(paths.iter().all(|p| p.is_absolute() || cfg!(windows)));
        for (i, path) in paths.iter().enumerate() {
            assert!(!paths[i + 1..].contains(path), "{} listed twice", path.display());
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_loaded_libraries_include_executable() {
        let exe = std::env::current_exe().unwrap();
        let stem = exe.file_stem().unwrap().to_string_lossy().into_owned();
        let pattern = Regex::new(&regex::escape(&stem)).unwrap();
        let (paths, _) = matching_loaded_libraries(&own(), &pattern).into_parts();
        assert!(!paths.unwrap().is_empty());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_matching_filters() {
        let pattern = Regex::new("^this will not match$").unwrap();
        let (paths, _) = matching_loaded_libraries(&own(), &pattern).into_parts();
        assert!(paths.unwrap().is_empty());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_has_library_for_self() {
        let pattern = Regex::new(SYSTEM_LIBRARY).unwrap();
        assert!(has_library(std::process::id(), &pattern).unwrap());

        let absent = Regex::new("^libnot-a-real-library").unwrap();
        assert!(!has_library(std::process::id(), &absent).unwrap());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_has_library_releases_handle_each_call() {
        let pattern = Regex::new(SYSTEM_LIBRARY).unwrap();
        for _ in 0..64 {
            assert!(has_library(std::process::id(), &pattern).unwrap());
        }
        let err = has_library(0x7fff_fff1, &pattern).unwrap_err();
        assert!(err.is_no_such_process(), "unexpected error: {err}");
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_find_processes_with_library_includes_self() {
        let pattern = Regex::new(SYSTEM_LIBRARY).unwrap();
        let (pids, _) = find_processes_with_library(&pattern).into_parts();
        assert!(pids.unwrap().contains(&std::process::id()));
    }
}
