//! Error handling for the native boundary
//!
//! Every native entry point reports failure differently: negative return
//! codes, NULL pointers, or an errno left behind. The shim folds those into
//! [`ShimError`] so callers only deal with one convention.

use std::io;
use thiserror::Error;

/// Failure reported by the native call shim
#[derive(Error, Debug)]
pub enum ShimError {
    /// libmagic could not be loaded or is missing a required entry point
    #[error("libmagic is not available: {message}")]
    Unavailable {
        /// Why loading failed
        message: String,
    },

    /// `magic_open` returned NULL
    #[error("failed to initialize Magic library")]
    Allocation {
        /// errno left by `magic_open`, `ENOMEM` when it left none
        errno: i32,
    },

    /// The argument is outside what the installed library accepts
    #[error("{message}")]
    InvalidArgument {
        /// What was rejected
        message: String,
    },

    /// The entry point or feature does not exist in the installed library
    #[error("{message}")]
    NotImplemented {
        /// What is missing
        message: String,
    },

    /// The caller passed a descriptor that is not open
    #[error("bad file descriptor")]
    BadDescriptor,

    /// The entry point returned its failure value; the session's error slot
    /// holds the details
    #[error("{entry_point} failed")]
    Native {
        /// Native function that failed
        entry_point: &'static str,
    },

    /// A query returned NULL instead of a result string
    #[error("{entry_point} returned no result")]
    NullResult {
        /// Native function that returned NULL
        entry_point: &'static str,
    },

    /// Redirecting or restoring the diagnostic stream failed
    #[error("diagnostic stream redirection failed: {source}")]
    Redirect {
        /// Underlying system call failure
        #[source]
        source: io::Error,
    },
}

/// Convenience type alias for shim results
pub type Result<T> = std::result::Result<T, ShimError>;

impl ShimError {
    /// errno carried by this failure, if it has one of its own
    pub fn errno(&self) -> Option<i32> {
        match self {
            ShimError::Allocation { errno } => Some(*errno),
            ShimError::InvalidArgument { .. } => Some(libc::EINVAL),
            ShimError::NotImplemented { .. } => Some(libc::ENOSYS),
            ShimError::BadDescriptor => Some(libc::EBADF),
            ShimError::Redirect { source } => source.raw_os_error(),
            ShimError::Unavailable { .. }
            | ShimError::Native { .. }
            | ShimError::NullResult { .. } => None,
        }
    }

    /// Whether the session's own error slot should be consulted
    pub fn is_native(&self) -> bool {
        matches!(self, ShimError::Native { .. } | ShimError::NullResult { .. })
    }

    pub(crate) fn not_implemented(what: &str) -> Self {
        ShimError::NotImplemented {
            message: format!("{} is not implemented", what),
        }
    }
}

/// errno left behind by the last failed system or native call
pub(crate) fn last_errno() -> i32 {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}
