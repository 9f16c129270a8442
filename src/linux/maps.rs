//! Memory map parsing from /proc/pid/maps
//!
//! Parses the Linux memory mapping format:
//! address           perms offset  dev   inode   pathname
//! 00400000-00452000 r-xp 00000000 08:02 173521  /usr/bin/ls

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use crate::memory::regions::Mapping;
use std::fs;
use std::io::ErrorKind;

/// One line of a maps file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub start: Address,
    pub end: Address,
    pub readable: bool,
    /// Backing file or pseudo-name such as `[heap]`, if any
    pub pathname: Option<String>,
}

impl MapEntry {
    /// Kernel pseudo-mappings that report `r` but cannot be read through
    /// another process
    pub fn is_pseudo(&self) -> bool {
        match self.pathname.as_deref() {
            Some(name) => name == "[vsyscall]" || name.starts_with("[vvar"),
            None => false,
        }
    }

    /// Whether the mapping is backed by a file on disk
    pub fn is_file_backed(&self) -> bool {
        self.pathname
            .as_deref()
            .is_some_and(|name| name.starts_with('/'))
    }

    pub fn mapping(&self) -> Mapping {
        Mapping {
            start: self.start,
            end: self.end,
            readable: self.readable,
        }
    }
}

/// Splits off the next whitespace-delimited field of `line`
fn next_field(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    if line.is_empty() {
        return None;
    }
    let end = line.find(char::is_whitespace).unwrap_or(line.len());
    Some((&line[..end], &line[end..]))
}

fn parse_line(line: &str) -> Option<MapEntry> {
    let (range, rest) = next_field(line)?;
    let (perms, rest) = next_field(rest)?;
    let (_offset, rest) = next_field(rest)?;
    let (_device, rest) = next_field(rest)?;
    let (_inode, rest) = next_field(rest)?;

    let (start, end) = range.split_once('-')?;
    let start = usize::from_str_radix(start, 16).ok()?;
    let end = usize::from_str_radix(end, 16).ok()?;
    if end < start || perms.len() != 4 {
        return None;
    }

    // Paths may contain spaces, so the rest of the line is the name
    let pathname = rest.trim_start();
    Some(MapEntry {
        start: Address::new(start),
        end: Address::new(end),
        readable: perms.starts_with('r'),
        pathname: (!pathname.is_empty()).then(|| pathname.to_string()),
    })
}

/// Parse maps content, rejecting the first malformed line
pub fn parse_maps(content: &str) -> Result<Vec<MapEntry>, String> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            parse_line(line).ok_or_else(|| format!("malformed line {}: {:?}", number + 1, line))
        })
        .collect()
}

/// Reads and parses /proc/pid/maps
pub fn read_maps(pid: ProcessId) -> MemoryResult<Vec<MapEntry>> {
    let path = format!("/proc/{}/maps", pid);
    let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => MemoryError::NoSuchProcess { pid },
        ErrorKind::PermissionDenied => MemoryError::access_denied(pid, format!("{}: {}", path, e)),
        _ => MemoryError::enumeration_failed(pid, format!("{}: {}", path, e)),
    })?;

    parse_maps(&content).map_err(|reason| MemoryError::enumeration_failed(pid, reason))
}
