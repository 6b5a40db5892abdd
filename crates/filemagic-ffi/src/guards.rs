//! Scoped process-state overrides around native calls
//!
//! libmagic writes parser warnings straight to the process's standard error
//! and formats numbers through the current locale. Both are overridden for
//! the duration of a call through guards that restore the previous state
//! when dropped, so early returns and unwinding cannot leak the override.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd};
use std::ptr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{trace, warn};

use crate::fd::safe_dup;

/// Serialises redirection of the process-wide diagnostic stream.
///
/// Independent sessions share fd 2, so two suppressed calls must never
/// overlap. Always taken after the session lock.
static DIAGNOSTIC_STREAM: Mutex<()> = Mutex::new(());

fn flush_stdio() {
    let _ = io::stderr().flush();
    // SAFETY: fflush(NULL) flushes every C output stream.
    unsafe {
        libc::fflush(ptr::null_mut());
    }
}

/// Redirects standard error to `/dev/null` until restored or dropped
pub struct StderrSuppression {
    saved: Option<OwnedFd>,
    _lock: MutexGuard<'static, ()>,
}

impl StderrSuppression {
    /// Swap fd 2 for `/dev/null`, keeping a private duplicate of the original.
    ///
    /// The duplicate shares its file offset with the original stream, so
    /// the position survives the swap. If the swap fails after the
    /// duplicate was taken, the original is put back before returning.
    pub fn acquire() -> io::Result<Self> {
        let lock = DIAGNOSTIC_STREAM
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        flush_stdio();

        let saved = safe_dup(libc::STDERR_FILENO)?;
        let null = OpenOptions::new().append(true).open("/dev/null")?;

        // SAFETY: both descriptors are open for the duration of the call.
        if unsafe { libc::dup2(null.as_raw_fd(), libc::STDERR_FILENO) } < 0 {
            let err = io::Error::last_os_error();
            unsafe {
                libc::dup2(saved.as_raw_fd(), libc::STDERR_FILENO);
            }
            return Err(err);
        }

        trace!("diagnostic stream suppressed");

        Ok(Self {
            saved: Some(saved),
            _lock: lock,
        })
    }

    /// Put the original standard error back, reporting any failure
    pub fn restore(mut self) -> io::Result<()> {
        self.restore_inner()
    }

    fn restore_inner(&mut self) -> io::Result<()> {
        let Some(saved) = self.saved.take() else {
            return Ok(());
        };

        flush_stdio();

        // SAFETY: saved is a live descriptor owned by this guard.
        if unsafe { libc::dup2(saved.as_raw_fd(), libc::STDERR_FILENO) } < 0 {
            return Err(io::Error::last_os_error());
        }

        trace!("diagnostic stream restored");
        Ok(())
    }
}

impl Drop for StderrSuppression {
    fn drop(&mut self) {
        if let Err(e) = self.restore_inner() {
            warn!(error = %e, "failed to restore standard error");
        }
    }
}

/// Switches the calling thread to the "C" locale until dropped
pub struct LocaleOverride {
    neutral: libc::locale_t,
    previous: libc::locale_t,
}

impl LocaleOverride {
    /// Install a fresh "C" locale for this thread only
    pub fn acquire() -> io::Result<Self> {
        // SAFETY: newlocale with a NULL base allocates a new locale object.
        let neutral = unsafe { libc::newlocale(libc::LC_ALL_MASK, c"C".as_ptr(), ptr::null_mut()) };
        if neutral.is_null() {
            return Err(io::Error::last_os_error());
        }

        let previous = unsafe { libc::uselocale(neutral) };
        if previous.is_null() {
            let err = io::Error::last_os_error();
            unsafe { libc::freelocale(neutral) };
            return Err(err);
        }

        Ok(Self { neutral, previous })
    }
}

impl Drop for LocaleOverride {
    fn drop(&mut self) {
        // SAFETY: previous came from uselocale on this thread; the guard is
        // !Send so the drop runs on the same thread.
        unsafe {
            if libc::uselocale(self.previous).is_null() {
                warn!("failed to restore thread locale");
                return;
            }
            libc::freelocale(self.neutral);
        }
    }
}
