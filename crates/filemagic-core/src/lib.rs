//! FileMagic Core - safe libmagic sessions
//!
//! This crate wraps the native shim from `filemagic-ffi` in a session type
//! that serialises access, tracks state libmagic does not expose reliably,
//! and reports every failure as one structured [`MagicError`].
//!
//! # Main Components
//!
//! - **Sessions**: [`Magic`], opened with a list of [`SessionOption`]s
//! - **Errors**: [`MagicError`] with a stable `code()`/`message()` pair
//! - **Flags**: bit constants and helpers in [`flags`]
//! - **Scoped use**: [`with_session`] closes the session on every path
//! - **One-shot helpers**: [`file_mime`], [`buffer_type`] and friends
//!
//! # Example
//!
//! ```no_run
//! use filemagic_core::{file_mime, Result};
//!
//! fn example() -> Result<()> {
//!     let mime = file_mime("image.png", &["/usr/share/misc/magic"])?;
//!     assert_eq!(mime, "image/png; charset=binary");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod flags;
pub mod oneshot;
pub mod options;
pub mod scoped;
pub mod session;

pub use error::{MagicError, Result};
pub use oneshot::{
    buffer_encoding, buffer_mime, buffer_type, check, compile, file_encoding, file_mime,
    file_type, DEFAULT_DATABASE,
};
pub use options::{Parameter, SessionOption};
pub use scoped::with_session;
pub use session::{Magic, MAGIC_ENV};

pub use filemagic_ffi::Capabilities;

/// Installed libmagic version as `major * 100 + minor`
///
/// Returns `-1` when the library predates `magic_version` or cannot be
/// loaded at all. Use [`capabilities`] to tell the two apart.
pub fn version() -> i32 {
    filemagic_ffi::shim::version().unwrap_or(-1)
}

/// Installed libmagic version as `major.minor`, e.g. `5.45`
pub fn version_string() -> Option<String> {
    format_version(version())
}

fn format_version(version: i32) -> Option<String> {
    (version >= 0).then(|| format!("{}.{:02}", version / 100, version % 100))
}

/// What the installed libmagic supports
pub fn capabilities() -> Result<Capabilities> {
    Ok(filemagic_ffi::library()?.capabilities())
}
