//! Descriptor helpers
//!
//! Some libmagic builds close the descriptor handed to `magic_descriptor`.
//! Queries therefore run on a private close-on-exec duplicate, and only
//! that duplicate is ever closed.

use std::io;
use std::os::fd::{FromRawFd, OwnedFd, RawFd};

use crate::error::{Result, ShimError};

/// Lowest descriptor number a duplicate may take, keeping clear of stdio
const MIN_DUP_FD: RawFd = 3;

/// Check that `fd` refers to an open descriptor
pub fn check_fd(fd: RawFd) -> Result<()> {
    if fd < 0 {
        return Err(ShimError::BadDescriptor);
    }

    // SAFETY: F_GETFD only inspects the descriptor table.
    if unsafe { libc::fcntl(fd, libc::F_GETFD) } < 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EBADF) {
            return Err(ShimError::BadDescriptor);
        }
    }

    Ok(())
}

/// Set `FD_CLOEXEC` on a descriptor
pub fn set_cloexec(fd: RawFd) -> io::Result<()> {
    // SAFETY: fcntl on a descriptor number has no memory-safety requirements.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    if unsafe { libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) } < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Duplicate `fd` into a new close-on-exec descriptor above stdio
pub fn safe_dup(fd: RawFd) -> io::Result<OwnedFd> {
    // SAFETY: fcntl on a descriptor number has no memory-safety requirements.
    let mut new_fd = unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, MIN_DUP_FD) };
    if new_fd < 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINVAL) {
            return Err(err);
        }

        // F_DUPFD_CLOEXEC unsupported; fall back to dup + FD_CLOEXEC.
        new_fd = unsafe { libc::dup(fd) };
        if new_fd < 0 {
            return Err(io::Error::last_os_error());
        }
    }

    // SAFETY: new_fd was just returned by the kernel and nothing else owns it.
    let owned = unsafe { OwnedFd::from_raw_fd(new_fd) };
    set_cloexec(new_fd)?;

    Ok(owned)
}
