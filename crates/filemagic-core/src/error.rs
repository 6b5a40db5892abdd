//! Error types for FileMagic sessions
//!
//! Every failure a session can produce, whether detected locally, reported
//! by libmagic, or raised inside a user callback, becomes one [`MagicError`]
//! with a stable `code`/`message` pair.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

use filemagic_ffi::{Cookie, ShimError};

const NOT_OPEN: &str = "Magic library is not open";
const NOT_LOADED: &str = "Magic database not loaded";
const BAD_DESCRIPTOR: &str = "bad file descriptor";
const EMPTY_INPUT: &str = "empty or invalid input";
const INVALID_RESULT: &str = "empty or invalid result";
const INVALID_MESSAGE: &str = "empty or invalid error message";
const UNKNOWN: &str = "unknown error";
const ALLOCATION: &str = "failed to initialize Magic library";

/// Error returned by every fallible FileMagic operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MagicError {
    /// The session was closed, or never opened
    #[error("magic: {}", NOT_OPEN)]
    NotOpen,

    /// No database has been loaded into the session
    #[error("magic: {}", NOT_LOADED)]
    NotLoaded,

    /// A flag, parameter or path was rejected
    #[error("magic: {message}")]
    InvalidArgument { message: String },

    /// The installed libmagic lacks the entry point or feature
    #[error("magic: {message}")]
    NotImplemented { message: String },

    /// The descriptor passed to a query is not open
    #[error("magic: {}", BAD_DESCRIPTOR)]
    BadDescriptor,

    /// A buffer query was given no bytes
    #[error("magic: {}", EMPTY_INPUT)]
    EmptyInput,

    /// libmagic answered with a placeholder instead of a result
    #[error("magic: {}", INVALID_RESULT)]
    InvalidResult,

    /// libmagic reported failure but left a placeholder error message
    #[error("magic: {}", INVALID_MESSAGE)]
    InvalidMessage,

    /// libmagic reported failure without any error message
    #[error("magic: {}", UNKNOWN)]
    Unknown,

    /// Error reported by libmagic, passed through verbatim
    #[error("magic: {message}")]
    Native { errno: i32, message: String },

    /// `magic_open` could not allocate a session
    #[error("magic: {}", ALLOCATION)]
    Allocation { errno: i32 },

    /// libmagic could not be loaded into the process
    #[error("magic: {message}")]
    Unavailable { message: String },

    /// A system call made around a native call failed
    #[error("magic: {message}")]
    Io { errno: i32, message: String },

    /// A scoped-session callback panicked
    #[error("magic: {message}")]
    Callback { message: String },
}

/// Convenience type alias for Results using our error type
pub type Result<T> = std::result::Result<T, MagicError>;

impl MagicError {
    /// Numeric code: an errno where one applies, otherwise `-1`
    pub fn code(&self) -> i32 {
        match self {
            MagicError::NotOpen => libc::EFAULT,
            MagicError::InvalidArgument { .. } => libc::EINVAL,
            MagicError::NotImplemented { .. } => libc::ENOSYS,
            MagicError::BadDescriptor => libc::EBADF,
            MagicError::Native { errno, .. }
            | MagicError::Allocation { errno }
            | MagicError::Io { errno, .. } => *errno,
            MagicError::NotLoaded
            | MagicError::EmptyInput
            | MagicError::InvalidResult
            | MagicError::InvalidMessage
            | MagicError::Unknown
            | MagicError::Unavailable { .. }
            | MagicError::Callback { .. } => -1,
        }
    }

    /// Human-readable description without the `magic: ` prefix
    pub fn message(&self) -> &str {
        match self {
            MagicError::NotOpen => NOT_OPEN,
            MagicError::NotLoaded => NOT_LOADED,
            MagicError::BadDescriptor => BAD_DESCRIPTOR,
            MagicError::EmptyInput => EMPTY_INPUT,
            MagicError::InvalidResult => INVALID_RESULT,
            MagicError::InvalidMessage => INVALID_MESSAGE,
            MagicError::Unknown => UNKNOWN,
            MagicError::Allocation { .. } => ALLOCATION,
            MagicError::InvalidArgument { message }
            | MagicError::NotImplemented { message }
            | MagicError::Native { message, .. }
            | MagicError::Unavailable { message }
            | MagicError::Io { message, .. }
            | MagicError::Callback { message } => message,
        }
    }

    /// Build an error from the session's native error slot
    pub(crate) fn from_session(cookie: &Cookie) -> Self {
        classify(cookie.error_message(), cookie.errno())
    }

    /// Translate a shim failure, consulting the session for native ones
    pub(crate) fn from_shim(err: ShimError, cookie: Option<&Cookie>) -> Self {
        match (err, cookie) {
            (err, Some(cookie)) if err.is_native() => MagicError::from_session(cookie),
            (err, _) => err.into(),
        }
    }
}

/// Turn the contents of a session's error slot into an error
fn classify(message: Option<String>, errno: i32) -> MagicError {
    match message {
        None => MagicError::Unknown,
        Some(message) if is_sentinel(&message) => MagicError::InvalidMessage,
        Some(message) => MagicError::Native { errno, message },
    }
}

/// Strings libmagic is known to hand back in place of a real message
pub(crate) fn is_sentinel(s: &str) -> bool {
    s.is_empty() || s == "(null)"
}

impl From<ShimError> for MagicError {
    fn from(err: ShimError) -> Self {
        match err {
            ShimError::Unavailable { message } => MagicError::Unavailable { message },
            ShimError::Allocation { errno } => MagicError::Allocation { errno },
            ShimError::InvalidArgument { message } => MagicError::InvalidArgument { message },
            ShimError::NotImplemented { message } => MagicError::NotImplemented { message },
            ShimError::BadDescriptor => MagicError::BadDescriptor,
            ShimError::Native { .. } | ShimError::NullResult { .. } => MagicError::Unknown,
            ShimError::Redirect { source } => MagicError::Io {
                errno: source.raw_os_error().unwrap_or(-1),
                message: source.to_string(),
            },
        }
    }
}

impl Serialize for MagicError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MagicError", 2)?;
        state.serialize_field("code", &self.code())?;
        state.serialize_field("message", self.message())?;
        state.end()
    }
}
