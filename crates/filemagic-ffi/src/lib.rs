//! FileMagic FFI - native call shim over libmagic
//!
//! This crate binds the libmagic C ABI at run time and wraps every entry
//! point in a safe function with one error convention. It does no locking
//! of its own beyond the process-wide diagnostic stream; `filemagic-core`
//! layers sessions and mutual exclusion on top.
//!
//! # Safety
//!
//! The unsafe surface is confined to [`library`] and [`shim`]. Callers must
//! still ensure:
//! - A [`Cookie`] is never used from two threads at once
//! - Strings returned by libmagic are copied before the next call on the
//!   same session (the shim does this for every query)

#![warn(missing_docs)]

mod error;
mod fd;
mod guards;
mod library;
mod memory;
pub mod shim;
mod types;

pub use error::{Result, ShimError};
pub use fd::{check_fd, safe_dup};
pub use guards::{LocaleOverride, StderrSuppression};
pub use library::{library, Capabilities, NativeLibrary, LIBRARY_CANDIDATES, LIBRARY_ENV};
pub use memory::{join_paths, split_paths, PATH_SEPARATOR};
pub use shim::Cookie;
pub use types::DatabaseAction;
