//! One-call helpers: open, load, query once, close
//!
//! `files` names the databases to load; an empty slice loads the default.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::flags::{MIME, MIME_ENCODING, MIME_TYPE};
use crate::options::SessionOption;
use crate::scoped::with_session;

fn database_options<P: AsRef<Path>>(files: &[P], flags: i32) -> Vec<SessionOption> {
    vec![
        SessionOption::with_files(files.iter().map(|f| f.as_ref().to_path_buf())),
        SessionOption::WithFlags(flags),
    ]
}

fn query_file<P: AsRef<Path>>(path: &Path, files: &[P], flags: i32) -> Result<String> {
    with_session(database_options(files, flags), |magic| magic.file(path))
}

fn query_buffer<P: AsRef<Path>>(data: &[u8], files: &[P], flags: i32) -> Result<String> {
    with_session(database_options(files, flags), |magic| magic.buffer(data))
}

/// MIME type and encoding of a file, e.g. `image/png; charset=binary`
pub fn file_mime<P: AsRef<Path>>(path: impl AsRef<Path>, files: &[P]) -> Result<String> {
    query_file(path.as_ref(), files, MIME)
}

/// MIME encoding of a file, e.g. `binary`
pub fn file_encoding<P: AsRef<Path>>(path: impl AsRef<Path>, files: &[P]) -> Result<String> {
    query_file(path.as_ref(), files, MIME_ENCODING)
}

/// MIME type of a file, e.g. `image/png`
pub fn file_type<P: AsRef<Path>>(path: impl AsRef<Path>, files: &[P]) -> Result<String> {
    query_file(path.as_ref(), files, MIME_TYPE)
}

/// MIME type and encoding of a buffer
pub fn buffer_mime<P: AsRef<Path>>(data: &[u8], files: &[P]) -> Result<String> {
    query_buffer(data, files, MIME)
}

/// MIME encoding of a buffer
pub fn buffer_encoding<P: AsRef<Path>>(data: &[u8], files: &[P]) -> Result<String> {
    query_buffer(data, files, MIME_ENCODING)
}

/// MIME type of a buffer
pub fn buffer_type<P: AsRef<Path>>(data: &[u8], files: &[P]) -> Result<String> {
    query_buffer(data, files, MIME_TYPE)
}

/// Compile database files in a throwaway session
pub fn compile<P: AsRef<Path>>(files: &[P]) -> Result<()> {
    with_session([SessionOption::DisableAutoload], |magic| magic.compile(files))
}

/// Check database files in a throwaway session
pub fn check<P: AsRef<Path>>(files: &[P]) -> Result<()> {
    with_session([SessionOption::DisableAutoload], |magic| magic.check(files))
}

/// No database files: load the default
pub const DEFAULT_DATABASE: &[PathBuf] = &[];
