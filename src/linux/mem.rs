//! Cross-process reads through `process_vm_readv`

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use std::fs::File;
use std::io::{self, ErrorKind};

/// Checks that the caller may read `pid`'s memory.
///
/// Opening /proc/pid/mem runs the same ptrace access check the kernel
/// applies to `process_vm_readv`. The file is closed again right away.
pub fn probe_access(pid: ProcessId) -> MemoryResult<()> {
    let path = format!("/proc/{}/mem", pid);
    match File::open(&path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(MemoryError::NoSuchProcess { pid }),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            Err(MemoryError::access_denied(pid, format!("{}: {}", path, e)))
        }
        Err(e) => Err(MemoryError::IoError(e)),
    }
}

/// Copies `buffer.len()` bytes from `address` in `pid` into `buffer`.
///
/// Page protections are honoured, so a range touching unmapped or
/// `PROT_NONE` memory fails; a short transfer is reported as a failure too.
pub fn read_process_memory(pid: ProcessId, address: Address, buffer: &mut [u8]) -> MemoryResult<()> {
    if buffer.is_empty() {
        return Ok(());
    }

    let local = libc::iovec {
        iov_base: buffer.as_mut_ptr().cast(),
        iov_len: buffer.len(),
    };
    let remote = libc::iovec {
        iov_base: address.as_usize() as *mut libc::c_void,
        iov_len: buffer.len(),
    };

    // SAFETY: `local` describes exactly the writable memory of `buffer`,
    // which stays borrowed for the duration of the call. `remote` is only
    // dereferenced by the kernel inside the target process.
    let read = unsafe { libc::process_vm_readv(pid as libc::pid_t, &local, 1, &remote, 1, 0) };

    if read < 0 {
        let error = io::Error::last_os_error();
        return Err(match error.raw_os_error() {
            Some(libc::ESRCH) => MemoryError::NoSuchProcess { pid },
            Some(libc::EPERM) => MemoryError::access_denied(pid, error.to_string()),
            _ => MemoryError::read_failed(address, buffer.len(), error.to_string()),
        });
    }

    if read as usize != buffer.len() {
        return Err(MemoryError::read_failed(
            address,
            buffer.len(),
            format!("short read of {} bytes", read),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_own_memory() {
        let data = vec![0x5au8, 0xa5, 0x0f, 0xf0];
        let mut buffer = [0u8; 4];
        read_process_memory(
            std::process::id(),
            Address::new(data.as_ptr() as usize),
            &mut buffer,
        )
        .unwrap();
        assert_eq!(&buffer[..], &data[..]);
    }

    #[test]
    fn test_read_unmapped_fails() {
        let mut buffer = [0u8; 16];
        let err = read_process_memory(std::process::id(), Address::new(8), &mut buffer).unwrap_err();
        assert!(err.to_string().contains("16 bytes"));
    }

    #[test]
    fn test_probe_missing_process() {
        assert!(probe_access(u32::MAX).unwrap_err().is_no_such_process());
        assert!(probe_access(std::process::id()).is_ok());
    }
}
