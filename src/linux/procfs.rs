//! Process listing and naming from /proc

use crate::core::types::{MemoryError, MemoryResult, ProcessId};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Pids of every process currently listed in /proc
pub fn list_pids() -> MemoryResult<Vec<ProcessId>> {
    let mut pids: Vec<ProcessId> = fs::read_dir("/proc")?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str()?.parse().ok())
        .collect();
    pids.sort_unstable();
    Ok(pids)
}

/// Resolves the executable of `pid` through /proc/pid/exe
pub fn exe_path(pid: ProcessId) -> MemoryResult<PathBuf> {
    fs::read_link(format!("/proc/{}/exe", pid)).map_err(|e| match e.kind() {
        ErrorKind::NotFound => MemoryError::NoSuchProcess { pid },
        ErrorKind::PermissionDenied => MemoryError::access_denied(pid, e.to_string()),
        _ => MemoryError::IoError(e),
    })
}

/// Short command name from /proc/pid/comm, readable even where `exe` is not
pub fn comm(pid: ProcessId) -> MemoryResult<String> {
    fs::read_to_string(format!("/proc/{}/comm", pid))
        .map(|name| name.trim_end().to_string())
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => MemoryError::NoSuchProcess { pid },
            _ => MemoryError::IoError(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_pid_is_listed() {
        let pids = list_pids().unwrap();
        assert!(pids.contains(&std::process::id()));
        assert!(pids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_own_exe_resolves() {
        let exe = exe_path(std::process::id()).unwrap();
        assert_eq!(exe, std::env::current_exe().unwrap());
        assert!(!comm(std::process::id()).unwrap().is_empty());
    }
}
