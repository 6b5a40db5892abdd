//! libmagic behaviour flags
//!
//! Values mirror `magic.h`. A session's flags are a plain `i32` bitmask so
//! they can be passed straight through to the native side.

/// No flags
pub const NONE: i32 = 0x000000;
/// Print debugging messages to standard error
pub const DEBUG: i32 = 0x000001;
/// Follow symbolic links
pub const SYMLINK: i32 = 0x000002;
/// Look inside compressed files
pub const COMPRESS: i32 = 0x000004;
/// Look at the contents of devices
pub const DEVICES: i32 = 0x000008;
/// Return the MIME type
pub const MIME_TYPE: i32 = 0x000010;
/// Return all matches, joined by [`SEPARATOR`]
pub const CONTINUE: i32 = 0x000020;
/// Print warnings to standard error
pub const CHECK: i32 = 0x000040;
/// Restore access time on exit
pub const PRESERVE_ATIME: i32 = 0x000080;
/// Don't convert unprintable characters
pub const RAW: i32 = 0x000100;
/// Handle I/O errors as real errors instead of embedding them in the result
pub const ERROR: i32 = 0x000200;
/// Return the MIME encoding
pub const MIME_ENCODING: i32 = 0x000400;
/// Return both the MIME type and encoding
pub const MIME: i32 = MIME_TYPE | MIME_ENCODING;
/// Return the Apple creator and type
pub const APPLE: i32 = 0x000800;
/// Return a slash-separated list of extensions
pub const EXTENSION: i32 = 0x1000000;
/// Check inside compressed files but not report compression
pub const COMPRESS_TRANSP: i32 = 0x2000000;
/// Don't allow decompression that needs to fork
pub const NO_COMPRESS_FORK: i32 = 0x4000000;
/// Every flag that selects a result format other than a description
pub const NODESC: i32 = EXTENSION | MIME | APPLE;

/// Don't check for compressed files
pub const NO_CHECK_COMPRESS: i32 = 0x001000;
/// Don't check for tar files
pub const NO_CHECK_TAR: i32 = 0x002000;
/// Don't check magic entries
pub const NO_CHECK_SOFT: i32 = 0x004000;
/// Don't check application type
pub const NO_CHECK_APPTYPE: i32 = 0x008000;
/// Don't check for ELF details
pub const NO_CHECK_ELF: i32 = 0x010000;
/// Don't check for text files
pub const NO_CHECK_TEXT: i32 = 0x020000;
/// Don't check for CDF files
pub const NO_CHECK_CDF: i32 = 0x040000;
/// Don't check for CSV files
pub const NO_CHECK_CSV: i32 = 0x080000;
/// Don't check tokens
pub const NO_CHECK_TOKENS: i32 = 0x100000;
/// Don't check text encodings
pub const NO_CHECK_ENCODING: i32 = 0x200000;
/// Don't check for JSON files
pub const NO_CHECK_JSON: i32 = 0x400000;
/// Don't check for SIMH tape files
pub const NO_CHECK_SIMH: i32 = 0x800000;
/// Disable every built-in test
pub const NO_CHECK_BUILTIN: i32 = NO_CHECK_COMPRESS
    | NO_CHECK_TAR
    | NO_CHECK_APPTYPE
    | NO_CHECK_ELF
    | NO_CHECK_TEXT
    | NO_CHECK_CSV
    | NO_CHECK_CDF
    | NO_CHECK_TOKENS
    | NO_CHECK_ENCODING
    | NO_CHECK_JSON
    | NO_CHECK_SIMH;

/// Separator between individual matches in [`CONTINUE`] mode
pub const SEPARATOR: &str = "\n- ";

/// Union of every bit libmagic defines
pub const KNOWN_FLAGS: i32 = DEBUG
    | SYMLINK
    | COMPRESS
    | DEVICES
    | MIME
    | CONTINUE
    | CHECK
    | PRESERVE_ATIME
    | RAW
    | ERROR
    | APPLE
    | NO_CHECK_BUILTIN
    | NO_CHECK_SOFT
    | EXTENSION
    | COMPRESS_TRANSP
    | NO_COMPRESS_FORK;

/// Whether `flags` only uses bits libmagic defines
pub fn is_supported(flags: i32) -> bool {
    flags >= 0 && flags & !KNOWN_FLAGS == 0
}

/// Split a bitmask into its set bits, lowest first
///
/// An empty mask yields `[NONE]` rather than an empty list, so callers can
/// always inspect the first element.
pub fn decompose(flags: i32) -> Vec<i32> {
    if flags == NONE {
        return vec![NONE];
    }

    (0..i32::BITS)
        .map(|bit| 1i32 << bit)
        .filter(|mask| flags & mask != 0)
        .collect()
}

/// Split a [`CONTINUE`]-mode result into individual match descriptions
pub fn split_matches(result: &str) -> Vec<&str> {
    result.split(SEPARATOR).collect()
}
