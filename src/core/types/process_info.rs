//! Process information types

use super::ProcessId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Snapshot of a running process, as reported by process enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: ProcessId,
    pub name: String,
    pub path: Option<PathBuf>,
}

impl ProcessInfo {
    /// Creates a new ProcessInfo with minimal information
    pub fn new(pid: ProcessId, name: String) -> Self {
        ProcessInfo {
            pid,
            name,
            path: None,
        }
    }

    /// Creates a ProcessInfo whose name is the file name of `path`
    pub fn from_path(pid: ProcessId, path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        ProcessInfo {
            pid,
            name,
            path: Some(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_info_new() {
        let info = ProcessInfo::new(1234, "bash".to_string());
        assert_eq!(info.pid, 1234);
        assert_eq!(info.name, "bash");
        assert!(info.path.is_none());
    }

    #[test]
    fn test_process_info_from_path() {
        let info = ProcessInfo::from_path(42, PathBuf::from("/usr/bin/sleep"));
        assert_eq!(info.name, "sleep");
        assert_eq!(info.path, Some(PathBuf::from("/usr/bin/sleep")));
    }
}
