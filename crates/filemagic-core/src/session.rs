//! Thread-safe libmagic sessions
//!
//! A [`Magic`] owns one native session behind a mutex. The native object is
//! not safe for concurrent use even for queries, so every operation holds
//! the lock for its whole duration, native call included.

use std::env;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::os::fd::{AsFd, AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use filemagic_ffi::{shim, Cookie, DatabaseAction};
use tracing::{debug, trace, warn};

use crate::error::{is_sentinel, MagicError, Result};
use crate::flags::{self, EXTENSION, KNOWN_FLAGS};
use crate::options::{Parameter, SessionOption};

/// Environment variable libmagic reads its default database path from
pub const MAGIC_ENV: &str = "MAGIC";

/// Placeholder libmagic returns when it knows no extension for a file
const NO_EXTENSION: &str = "???";

struct State {
    cookie: Option<Cookie>,
    flags: i32,
    paths: Vec<PathBuf>,
    loaded: bool,
    strict_errors: bool,
    load_failure: Option<MagicError>,
}

impl State {
    fn cookie(&mut self) -> Result<&mut Cookie> {
        self.cookie.as_mut().ok_or(MagicError::NotOpen)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.cookie.is_none() {
            return Err(MagicError::NotOpen);
        }
        if !self.loaded {
            return Err(MagicError::NotLoaded);
        }
        Ok(())
    }

    fn database<P: AsRef<Path>>(&mut self, action: DatabaseAction, files: &[P]) -> Result<()> {
        let cookie = self.cookie()?;
        cookie
            .database(action, files)
            .map_err(|e| MagicError::from_shim(e, Some(&*cookie)))
    }

    /// Run one query with RAW (and ERROR when strict) forced on, then
    /// normalise whatever libmagic handed back
    fn query<F>(&mut self, kind: &'static str, call: F) -> Result<String>
    where
        F: FnOnce(&mut Cookie) -> filemagic_ffi::Result<String>,
    {
        self.ensure_ready()?;

        let flags = self.flags;
        let strict = self.strict_errors;
        let forced = flags | flags::RAW | if strict { flags::ERROR } else { flags::NONE };

        let cookie = self.cookie()?;
        let legacy_null_result = cookie.capabilities().legacy_null_result;
        let mut cookie = FlagOverride::apply(cookie, forced, flags)?;

        let result = match call(&mut *cookie) {
            Ok(result) => result,
            Err(e) if e.is_native() && !strict && legacy_null_result => {
                // Older releases return NULL even without MAGIC_ERROR; the
                // text a newer release would have returned sits in the
                // error slot.
                cookie.error_message().ok_or(MagicError::Unknown)?
            }
            Err(e) => return Err(MagicError::from_shim(e, Some(&*cookie))),
        };

        trace!(kind, flags, result = %result, "query answered");
        normalize_result(result, flags)
    }
}

/// Map placeholder answers to an error, or to no extensions at all when
/// extensions were asked for
fn normalize_result(result: String, flags: i32) -> Result<String> {
    let extension = flags & EXTENSION != 0;
    if is_sentinel(&result) || (extension && result == NO_EXTENSION) {
        // Non-regular files legitimately have no extensions.
        if extension {
            return Ok(String::new());
        }
        return Err(MagicError::InvalidResult);
    }
    Ok(result)
}

/// Forces extra flags onto a session for one call, restoring on drop
struct FlagOverride<'a> {
    cookie: &'a mut Cookie,
    restore: i32,
}

impl<'a> FlagOverride<'a> {
    fn apply(cookie: &'a mut Cookie, flags: i32, restore: i32) -> Result<Self> {
        if let Err(e) = cookie.set_flags(flags, KNOWN_FLAGS) {
            return Err(MagicError::from_shim(e, Some(&*cookie)));
        }
        Ok(Self { cookie, restore })
    }
}

impl Deref for FlagOverride<'_> {
    type Target = Cookie;

    fn deref(&self) -> &Cookie {
        self.cookie
    }
}

impl DerefMut for FlagOverride<'_> {
    fn deref_mut(&mut self) -> &mut Cookie {
        self.cookie
    }
}

impl Drop for FlagOverride<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.cookie.set_flags(self.restore, KNOWN_FLAGS) {
            warn!(error = %e, flags = self.restore, "failed to restore session flags");
        }
    }
}

/// A libmagic session
///
/// Sessions are `Send + Sync`; concurrent callers are serialised on an
/// internal lock. Call [`Magic::close`] when done. Dropping an open session
/// also releases the native handle, but only as a safety net.
///
/// # Example
///
/// ```no_run
/// use filemagic_core::{flags, Magic, Result, SessionOption};
///
/// fn example() -> Result<()> {
///     let magic = Magic::open([SessionOption::WithFlags(flags::MIME)])?;
///     let mime = magic.file("/bin/sh")?;
///     println!("{mime}");
///     magic.close();
///     Ok(())
/// }
/// ```
pub struct Magic {
    state: Mutex<State>,
}

impl Magic {
    /// Open a session, apply `options` in order, then load the default
    /// database unless an option disabled autoload or loaded files already
    ///
    /// If any step fails the session is closed before the error is returned.
    pub fn open<I>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = SessionOption>,
    {
        let cookie = Cookie::open(flags::NONE)?;
        let magic = Magic {
            state: Mutex::new(State {
                cookie: Some(cookie),
                flags: flags::NONE,
                paths: Vec::new(),
                loaded: false,
                strict_errors: true,
                load_failure: None,
            }),
        };

        if let Err(e) = magic.configure(options) {
            magic.close();
            return Err(e);
        }

        debug!(session = %magic, "session opened");
        Ok(magic)
    }

    /// Open a session with the default database and no flags
    pub fn new() -> Result<Self> {
        Self::open(std::iter::empty())
    }

    fn configure<I>(&self, options: I) -> Result<()>
    where
        I: IntoIterator<Item = SessionOption>,
    {
        let mut autoload = true;
        for option in options {
            trace!(?option, "applying session option");
            match option {
                SessionOption::DisableAutoload => autoload = false,
                SessionOption::WithFlags(flags) => self.set_flags(flags)?,
                SessionOption::WithFiles(files) => self.load(&files)?,
                SessionOption::WithParameter(param, value) => self.set_parameter(param, value)?,
                SessionOption::DoNotStopOnErrors => self.lock().strict_errors = false,
            }
        }

        if autoload && !self.is_loaded() {
            self.load::<PathBuf>(&[])?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Release the native session; calling it again does nothing
    pub fn close(&self) {
        let mut state = self.lock();
        if let Some(cookie) = state.cookie.take() {
            cookie.close();
            debug!("session closed");
        }
        state.paths.clear();
        state.loaded = false;
    }

    /// Whether the native session is still allocated
    pub fn is_open(&self) -> bool {
        self.lock().cookie.is_some()
    }

    /// Whether the session has been closed
    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    /// Whether a database has been loaded since the session was opened
    pub fn is_loaded(&self) -> bool {
        let state = self.lock();
        state.cookie.is_some() && state.loaded
    }

    /// Whether query I/O errors are reported as failures
    pub fn strict_errors(&self) -> Result<bool> {
        let state = self.lock();
        state.cookie.as_ref().ok_or(MagicError::NotOpen)?;
        Ok(state.strict_errors)
    }

    /// Current flag bitmask as last set through this session
    pub fn flags(&self) -> Result<i32> {
        let state = self.lock();
        state.cookie.as_ref().ok_or(MagicError::NotOpen)?;
        Ok(state.flags)
    }

    /// Current flags as individual bits in ascending order; no flags is `[0]`
    pub fn flags_list(&self) -> Result<Vec<i32>> {
        self.flags().map(flags::decompose)
    }

    /// Replace the session's flags
    pub fn set_flags(&self, flags: i32) -> Result<()> {
        let mut state = self.lock();
        let cookie = state.cookie()?;
        cookie
            .set_flags(flags, KNOWN_FLAGS)
            .map_err(|e| MagicError::from_shim(e, Some(&*cookie)))?;

        state.flags = flags;
        debug!(flags, "session flags set");
        Ok(())
    }

    /// Database files in use
    ///
    /// Reports the files of the last successful load. Before any load, or
    /// whenever `MAGIC` is set, the native default search path is returned
    /// instead, re-read on every call.
    pub fn paths(&self) -> Result<Vec<PathBuf>> {
        let state = self.lock();
        state.cookie.as_ref().ok_or(MagicError::NotOpen)?;

        if !state.paths.is_empty() && env::var_os(MAGIC_ENV).is_none() {
            return Ok(state.paths.clone());
        }
        Ok(shim::default_paths()?)
    }

    /// Load database files; an empty list loads the default database
    ///
    /// libmagic keeps its error state after a failed load, so the failure
    /// is sticky: every later load on this session returns it again and
    /// only a new session can load successfully. The paths and loaded state
    /// from an earlier successful load are left untouched.
    pub fn load<P: AsRef<Path>>(&self, files: &[P]) -> Result<()> {
        let mut state = self.lock();
        state.cookie()?;

        if let Some(failure) = &state.load_failure {
            debug!(error = %failure, "load refused after earlier failure");
            return Err(failure.clone());
        }

        let targets: Vec<PathBuf> = if files.is_empty() {
            shim::default_paths()?
        } else {
            files.iter().map(|f| f.as_ref().to_path_buf()).collect()
        };

        if let Err(e) = state.database(DatabaseAction::Load, &targets) {
            warn!(paths = ?targets, error = %e, "failed to load magic database");
            state.load_failure = Some(e.clone());
            return Err(e);
        }

        debug!(paths = ?targets, "magic database loaded");
        state.paths = targets;
        state.loaded = true;
        Ok(())
    }

    /// Compile database files into `<name>.mgc` in the working directory
    pub fn compile<P: AsRef<Path>>(&self, files: &[P]) -> Result<()> {
        self.lock().database(DatabaseAction::Compile, files)
    }

    /// Check database files for consistency
    pub fn check<P: AsRef<Path>>(&self, files: &[P]) -> Result<()> {
        self.lock().database(DatabaseAction::Check, files)
    }

    /// Identify the file at `path`
    pub fn file(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        self.lock().query("file", |cookie| cookie.file(path))
    }

    /// Identify an in-memory buffer
    pub fn buffer(&self, data: &[u8]) -> Result<String> {
        let mut state = self.lock();
        state.ensure_ready()?;
        if data.is_empty() {
            return Err(MagicError::EmptyInput);
        }
        state.query("buffer", |cookie| cookie.buffer(data))
    }

    /// Identify the contents of an open file
    ///
    /// The descriptor stays open and its owner is unaffected; libmagic only
    /// ever sees a private duplicate.
    pub fn descriptor(&self, fd: impl AsFd) -> Result<String> {
        self.descriptor_raw(fd.as_fd().as_raw_fd())
    }

    /// Identify the contents of a raw descriptor number
    pub fn descriptor_raw(&self, fd: RawFd) -> Result<String> {
        self.lock().query("descriptor", |cookie| cookie.descriptor(fd))
    }

    /// Read a tunable limit
    pub fn parameter(&self, param: Parameter) -> Result<usize> {
        let mut state = self.lock();
        let cookie = state.cookie()?;
        cookie
            .parameter(param.id())
            .map_err(|e| MagicError::from_shim(e, Some(&*cookie)))
    }

    /// Change a tunable limit
    pub fn set_parameter(&self, param: Parameter, value: usize) -> Result<()> {
        let mut state = self.lock();
        let cookie = state.cookie()?;
        cookie
            .set_parameter(param.id(), value)
            .map_err(|e| MagicError::from_shim(e, Some(&*cookie)))?;
        debug!(%param, value, "session parameter set");
        Ok(())
    }
}

impl fmt::Display for Magic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        write!(
            f,
            "Magic{{flags:{} path:{:?} open:{}}}",
            state.flags,
            state.paths,
            state.cookie.is_some()
        )
    }
}

impl fmt::Debug for Magic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0";

    fn png_database() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("png.magic")
    }

    /// Flags as libmagic itself reports them, bypassing the session's copy
    fn native_flags(magic: &Magic) -> i32 {
        let state = magic.lock();
        state.cookie.as_ref().unwrap().flags().unwrap()
    }

    fn closed_session() -> Option<Magic> {
        let magic = Magic::open([SessionOption::DisableAutoload]).ok()?;
        magic.close();
        Some(magic)
    }

    #[test]
    fn test_normalize_result() {
        assert_eq!(
            normalize_result("image/png".to_string(), flags::MIME_TYPE).as_deref(),
            Ok("image/png")
        );
        assert_eq!(
            normalize_result(String::new(), flags::NONE),
            Err(MagicError::InvalidResult)
        );
        assert_eq!(
            normalize_result("(null)".to_string(), flags::MIME),
            Err(MagicError::InvalidResult)
        );
        // "???" is only a placeholder when extensions were requested
        assert_eq!(
            normalize_result("???".to_string(), flags::NONE).as_deref(),
            Ok("???")
        );
        assert_eq!(
            normalize_result("???".to_string(), flags::EXTENSION).as_deref(),
            Ok("")
        );
        assert_eq!(
            normalize_result(String::new(), flags::EXTENSION).as_deref(),
            Ok("")
        );
        assert_eq!(
            normalize_result("png".to_string(), flags::EXTENSION).as_deref(),
            Ok("png")
        );
    }

    #[test]
    fn test_closed_session_rejects_everything() {
        let Some(magic) = closed_session() else {
            return;
        };

        assert!(magic.is_closed());
        assert!(!magic.is_loaded());
        assert_eq!(magic.flags(), Err(MagicError::NotOpen));
        assert_eq!(magic.set_flags(flags::MIME), Err(MagicError::NotOpen));
        assert_eq!(magic.paths(), Err(MagicError::NotOpen));
        assert_eq!(magic.load::<PathBuf>(&[]), Err(MagicError::NotOpen));
        assert_eq!(magic.compile::<PathBuf>(&[]), Err(MagicError::NotOpen));
        assert_eq!(magic.check::<PathBuf>(&[]), Err(MagicError::NotOpen));
        assert_eq!(magic.file("/dev/null"), Err(MagicError::NotOpen));
        assert_eq!(magic.buffer(b""), Err(MagicError::NotOpen));
        assert_eq!(magic.descriptor_raw(0), Err(MagicError::NotOpen));
        assert_eq!(magic.parameter(Parameter::BytesMax), Err(MagicError::NotOpen));
    }

    #[test]
    fn test_close_is_idempotent() {
        let Some(magic) = closed_session() else {
            return;
        };
        let before = magic.to_string();

        magic.close();

        assert_eq!(magic.to_string(), before);
        assert!(magic.is_closed());
    }

    #[test]
    fn test_queries_need_a_database() {
        let Ok(magic) = Magic::open([SessionOption::DisableAutoload]) else {
            return;
        };

        assert!(magic.is_open());
        assert_eq!(magic.file("/dev/null"), Err(MagicError::NotLoaded));
        assert_eq!(magic.buffer(b"data"), Err(MagicError::NotLoaded));
        assert_eq!(magic.descriptor_raw(0), Err(MagicError::NotLoaded));
    }

    #[test]
    fn test_display_reflects_state() {
        let Ok(magic) = Magic::open([
            SessionOption::DisableAutoload,
            SessionOption::WithFlags(flags::MIME_TYPE),
        ]) else {
            return;
        };

        assert_eq!(magic.to_string(), "Magic{flags:16 path:[] open:true}");
        magic.close();
        assert_eq!(magic.to_string(), "Magic{flags:16 path:[] open:false}");
    }

    #[test]
    fn test_query_restores_native_flags() {
        match crate::capabilities() {
            Ok(capabilities) if capabilities.flags_getter => {}
            _ => return,
        }

        let magic = Magic::open([
            SessionOption::WithFiles(vec![png_database()]),
            SessionOption::WithFlags(flags::MIME_TYPE),
        ])
        .unwrap();
        assert_eq!(native_flags(&magic), flags::MIME_TYPE);

        assert_eq!(magic.buffer(PNG_HEADER).as_deref(), Ok("image/png"));
        assert_eq!(native_flags(&magic), flags::MIME_TYPE);

        // Strict queries fail with RAW and ERROR forced on; neither may linger
        assert!(magic.file("does/not/exist").is_err());
        assert_eq!(native_flags(&magic), flags::MIME_TYPE);

        magic.set_flags(flags::NONE).unwrap();
        assert!(magic.file("does/not/exist").is_err());
        assert_eq!(native_flags(&magic), flags::NONE);
    }

    #[test]
    fn test_invalid_flags_abort_open() {
        if crate::capabilities().is_err() {
            return;
        }

        let err = Magic::open([
            SessionOption::DisableAutoload,
            SessionOption::WithFlags(-1),
        ])
        .unwrap_err();
        assert_eq!(err.code(), libc::EINVAL);
        assert_eq!(err.to_string(), "magic: unknown or invalid flag specified");
    }
}
