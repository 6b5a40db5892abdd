//! Loading libmagic and detecting what the installed release supports
//!
//! The library is opened at run time so a missing or old libmagic degrades
//! into errors instead of link failures. Optional entry points are resolved
//! once and summarised in [`Capabilities`]; call sites branch on those
//! instead of comparing version numbers.

use std::env;
use std::ffi::OsString;
use std::sync::OnceLock;

use libloading::Library;
use tracing::{debug, info};

use crate::error::{Result, ShimError};
use crate::types::{
    BufferFn, CloseFn, DatabaseFn, DescriptorFn, ErrnoFn, ErrorFn, FileFn, GetFlagsFn,
    GetParamFn, GetPathFn, OpenFn, SetFlagsFn, SetParamFn, VersionFn,
};

/// Environment variable naming an explicit libmagic shared object
pub const LIBRARY_ENV: &str = "FILEMAGIC_LIBRARY";

/// Shared-object names tried in order when no explicit path is given
pub const LIBRARY_CANDIDATES: &[&str] = &[
    "libmagic.so.1",
    "libmagic.so",
    "libmagic.1.dylib",
    "libmagic.dylib",
];

/// First release whose queries return the error text instead of NULL when
/// strict error reporting is off
const NULL_RESULT_FIXED_VERSION: i32 = 515;

/// What the installed libmagic can do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `magic_version()` result, if the entry point exists
    pub version: Option<i32>,
    /// `magic_getflags` is exported
    pub flags_getter: bool,
    /// `magic_getparam`/`magic_setparam` are exported
    pub parameters: bool,
    /// Failed queries return NULL even without `MAGIC_ERROR`
    pub legacy_null_result: bool,
}

impl Capabilities {
    fn detect(version: Option<i32>, flags_getter: bool, parameters: bool) -> Self {
        Self {
            version,
            flags_getter,
            parameters,
            legacy_null_result: version.map_or(true, |v| v < NULL_RESULT_FIXED_VERSION),
        }
    }
}

/// Resolved libmagic entry points
#[derive(Debug)]
pub struct NativeLibrary {
    pub(crate) open: OpenFn,
    pub(crate) close: CloseFn,
    pub(crate) error: ErrorFn,
    pub(crate) errno: ErrnoFn,
    pub(crate) setflags: SetFlagsFn,
    pub(crate) load: DatabaseFn,
    pub(crate) compile: DatabaseFn,
    pub(crate) check: DatabaseFn,
    pub(crate) file: FileFn,
    pub(crate) buffer: BufferFn,
    pub(crate) descriptor: DescriptorFn,
    pub(crate) getpath: GetPathFn,
    pub(crate) version: Option<VersionFn>,
    pub(crate) getflags: Option<GetFlagsFn>,
    pub(crate) getparam: Option<GetParamFn>,
    pub(crate) setparam: Option<SetParamFn>,
    capabilities: Capabilities,
    // Keeps the mapped object alive for as long as the pointers above.
    _library: Library,
}

macro_rules! required {
    ($lib:expr, $name:literal, $ty:ty) => {
        // SAFETY: the symbol type matches the libmagic prototype in types.rs.
        *unsafe { $lib.get::<$ty>(concat!($name, "\0").as_bytes()) }.map_err(|e| {
            ShimError::Unavailable {
                message: format!("missing entry point {}: {}", $name, e),
            }
        })?
    };
}

macro_rules! optional {
    ($lib:expr, $name:literal, $ty:ty) => {
        // SAFETY: the symbol type matches the libmagic prototype in types.rs.
        unsafe { $lib.get::<$ty>(concat!($name, "\0").as_bytes()) }
            .ok()
            .map(|symbol| *symbol)
    };
}

impl NativeLibrary {
    /// Open a specific shared object
    pub fn load_from(path: impl Into<OsString>) -> Result<Self> {
        let path = path.into();
        // SAFETY: loading libmagic runs no initialisers with preconditions.
        let library = unsafe { Library::new(&path) }.map_err(|e| ShimError::Unavailable {
            message: format!("{}: {}", path.to_string_lossy(), e),
        })?;
        Self::resolve(library)
    }

    /// Open libmagic from `FILEMAGIC_LIBRARY` or the conventional names
    pub fn load_default() -> Result<Self> {
        if let Some(path) = env::var_os(LIBRARY_ENV) {
            return Self::load_from(path);
        }

        let mut failures = Vec::new();
        for candidate in LIBRARY_CANDIDATES {
            match Self::load_from(*candidate) {
                Ok(library) => return Ok(library),
                Err(e) => failures.push(e.to_string()),
            }
        }

        Err(ShimError::Unavailable {
            message: failures.join("; "),
        })
    }

    fn resolve(library: Library) -> Result<Self> {
        let open: OpenFn = required!(library, "magic_open", OpenFn);
        let close: CloseFn = required!(library, "magic_close", CloseFn);
        let error: ErrorFn = required!(library, "magic_error", ErrorFn);
        let errno: ErrnoFn = required!(library, "magic_errno", ErrnoFn);
        let setflags: SetFlagsFn = required!(library, "magic_setflags", SetFlagsFn);
        let load: DatabaseFn = required!(library, "magic_load", DatabaseFn);
        let compile: DatabaseFn = required!(library, "magic_compile", DatabaseFn);
        let check: DatabaseFn = required!(library, "magic_check", DatabaseFn);
        let file: FileFn = required!(library, "magic_file", FileFn);
        let buffer: BufferFn = required!(library, "magic_buffer", BufferFn);
        let descriptor: DescriptorFn = required!(library, "magic_descriptor", DescriptorFn);
        let getpath: GetPathFn = required!(library, "magic_getpath", GetPathFn);

        let version: Option<VersionFn> = optional!(library, "magic_version", VersionFn);
        let getflags: Option<GetFlagsFn> = optional!(library, "magic_getflags", GetFlagsFn);
        let getparam: Option<GetParamFn> = optional!(library, "magic_getparam", GetParamFn);
        let setparam: Option<SetParamFn> = optional!(library, "magic_setparam", SetParamFn);

        // SAFETY: magic_version takes no arguments and touches no state.
        let reported = version.map(|f| unsafe { f() });
        let capabilities =
            Capabilities::detect(reported, getflags.is_some(), getparam.is_some() && setparam.is_some());

        debug!(capabilities = ?capabilities, "resolved libmagic entry points");

        Ok(Self {
            open,
            close,
            error,
            errno,
            setflags,
            load,
            compile,
            check,
            file,
            buffer,
            descriptor,
            getpath,
            version,
            getflags,
            getparam,
            setparam,
            capabilities,
            _library: library,
        })
    }

    /// Capabilities detected when the library was loaded
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

static DEFAULT_LIBRARY: OnceLock<std::result::Result<NativeLibrary, String>> = OnceLock::new();

/// The process's libmagic, loaded on first use
///
/// The outcome of the first attempt is kept for the life of the process, so
/// a missing library is reported consistently rather than retried.
pub fn library() -> Result<&'static NativeLibrary> {
    DEFAULT_LIBRARY
        .get_or_init(|| {
            NativeLibrary::load_default()
                .inspect(|lib| info!(version = ?lib.capabilities.version, "loaded libmagic"))
                .map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|message| ShimError::Unavailable {
            message: message.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_from_version() {
        let caps = Capabilities::detect(Some(545), true, true);
        assert!(!caps.legacy_null_result);
        assert!(caps.flags_getter);

        let caps = Capabilities::detect(Some(514), false, false);
        assert!(caps.legacy_null_result);

        let caps = Capabilities::detect(None, false, false);
        assert!(caps.legacy_null_result);
        assert_eq!(caps.version, None);
    }

    #[test]
    fn test_missing_library_is_unavailable() {
        let err = NativeLibrary::load_from("/nonexistent/libmagic.so.1").unwrap_err();
        assert!(matches!(err, ShimError::Unavailable { .. }));
        assert!(err.to_string().contains("/nonexistent/libmagic.so.1"));
    }
}
