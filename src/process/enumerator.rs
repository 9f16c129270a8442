//! Process enumeration and name filtering

use crate::core::types::{MemoryError, Outcome, ProcessId, ProcessInfo};
use crate::process::handle::ProcessHandle;
use regex::Regex;
use tracing::debug;

/// Pids of every running process
#[cfg(target_os = "linux")]
pub fn all_pids() -> Outcome<Vec<ProcessId>> {
    crate::linux::list_pids().into()
}

/// Pids of every running process
#[cfg(windows)]
pub fn all_pids() -> Outcome<Vec<ProcessId>> {
    crate::windows::bindings::psapi::enum_processes()
        .map_err(|e| MemoryError::WindowsApi(e.to_string()))
        .into()
}

/// Opens every running process; pids that cannot be opened are soft errors
pub fn open_all() -> Outcome<Vec<ProcessHandle>> {
    let mut soft_errors = Vec::new();
    let pids = match all_pids().collect_into(&mut soft_errors) {
        Ok(pids) => pids,
        Err(e) => return Outcome::new(Err(e), soft_errors),
    };

    let mut handles = Vec::with_capacity(pids.len());
    for pid in pids {
        match ProcessHandle::open(pid) {
            Ok(handle) => handles.push(handle),
            Err(e) => soft_errors.push(e),
        }
    }
    debug!(opened = handles.len(), failed = soft_errors.len(), "opened processes");
    Outcome::new(Ok(handles), soft_errors)
}

/// Closes every handle, collecting all release failures as soft errors
pub fn close_all(handles: Vec<ProcessHandle>) -> Vec<MemoryError> {
    let mut errors = Vec::new();
    for handle in handles {
        let (result, soft) = handle.close().into_parts();
        errors.extend(soft);
        if let Err(e) = result {
            errors.push(e);
        }
    }
    errors
}

/// Open handles of the processes whose name matches `pattern`.
///
/// Handles that do not match are closed; failures to read a name are soft
/// errors and leave that process out.
pub fn grep(pattern: &Regex) -> Outcome<Vec<ProcessHandle>> {
    let mut soft_errors = Vec::new();
    let handles = match open_all().collect_into(&mut soft_errors) {
        Ok(handles) => handles,
        Err(e) => return Outcome::new(Err(e), soft_errors),
    };

    let mut matches = Vec::new();
    let mut rejected = Vec::new();
    for handle in handles {
        match handle.name() {
            Ok(name) if pattern.is_match(&name) => matches.push(handle),
            Ok(_) => rejected.push(handle),
            Err(e) => {
                soft_errors.push(e);
                rejected.push(handle);
            }
        }
    }
    soft_errors.extend(close_all(rejected));
    Outcome::new(Ok(matches), soft_errors)
}

/// Pid and name of every process that can be opened
pub fn processes() -> Outcome<Vec<ProcessInfo>> {
    let mut soft_errors = Vec::new();
    let handles = match open_all().collect_into(&mut soft_errors) {
        Ok(handles) => handles,
        Err(e) => return Outcome::new(Err(e), soft_errors),
    };

    let mut infos = Vec::with_capacity(handles.len());
    for handle in &handles {
        match handle.name() {
            Ok(name) => infos.push(ProcessInfo::from_path(handle.pid(), name.into())),
            Err(e) => soft_errors.push(e),
        }
    }
    soft_errors.extend(close_all(handles));
    Outcome::new(Ok(infos), soft_errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_all_pids_contains_self() {
        let (pids, _) = all_pids().into_parts();
        assert!(pids.unwrap().contains(&std::process::id()));
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_open_all_includes_self() {
        let (handles, _) = open_all().into_parts();
        let handles = handles.unwrap();
        assert!(handles.iter().any(|h| h.pid() == std::process::id()));
        assert!(close_all(handles).is_empty());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_grep_finds_self() {
        let exe = std::env::current_exe().unwrap();
        let stem = exe.file_stem().unwrap().to_string_lossy().into_owned();
        let pattern = Regex::new(&regex::escape(&stem)).unwrap();

        let (found, _) = grep(&pattern).into_parts();
        let found = found.unwrap();
        assert!(found.iter().any(|h| h.pid() == std::process::id()));
        close_all(found);
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_grep_without_match() {
        let pattern = Regex::new("^no process is called this$").unwrap();
        let (found, _) = grep(&pattern).into_parts();
        assert!(found.unwrap().is_empty());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_processes_lists_self() {
        let (infos, _) = processes().into_parts();
        let infos = infos.unwrap();
        let me = infos
            .iter()
            .find(|info| info.pid == std::process::id())
            .expect("own process listed");
        assert!(me.path.is_some());
        assert!(!me.name.is_empty());
    }
}
