//! One-shot helpers, scoped sessions, and database compile/check


use std::env;
use std::fs;
use std::path::Path;

use filemagic_core::{
    buffer_encoding, buffer_mime, buffer_type, check, compile, file_encoding, file_mime,
    file_type, flags, version, version_string, with_session, MagicError, SessionOption,
};
use serial_test::serial;
use test_support::*;

/// Header every compiled database starts with on little-endian hosts
const COMPILED_MAGIC: [u8; 4] = [0x1c, 0x04, 0x1e, 0xf1];

#[test]
fn test_file_helpers() {
    require_libmagic!();
    let png = png_path();
    let db = [png_database()];

    assert_eq!(file_mime(png.path(), &db).unwrap(), "image/png; charset=binary");
    assert_eq!(file_type(png.path(), &db).unwrap(), "image/png");
    assert_eq!(file_encoding(png.path(), &db).unwrap(), "binary");
}

#[test]
fn test_buffer_helpers() {
    require_libmagic!();
    let db = [gopher_database()];

    assert_eq!(
        buffer_mime(PNG_BYTES, &db).unwrap(),
        "image/x-go-gopher; charset=binary"
    );
    assert_eq!(buffer_type(PNG_BYTES, &db).unwrap(), "image/x-go-gopher");
    assert_eq!(buffer_encoding(PNG_BYTES, &db).unwrap(), "binary");
    assert_eq!(buffer_type(b"", &db), Err(MagicError::EmptyInput));
}

#[test]
fn test_helpers_report_broken_database() {
    require_libmagic!();
    let png = png_path();

    let err = file_mime(png.path(), &[broken_database()]).unwrap_err();
    assert!(err.message().contains("No current entry for continuation"), "{err}");
}

#[test]
fn test_helpers_report_missing_file() {
    require_libmagic!();
    let err = file_type("does/not/exist", &[png_database()]).unwrap_err();
    assert_eq!(err.code(), libc::ENOENT);
}

#[test]
fn test_scoped_session_returns_callback_value() {
    require_libmagic!();
    let options = [
        SessionOption::WithFiles(vec![png_database()]),
        SessionOption::WithFlags(flags::MIME_TYPE),
    ];

    let result = with_session(options, |magic| {
        assert!(magic.is_loaded());
        magic.buffer(PNG_BYTES)
    });
    assert_eq!(result.unwrap(), "image/png");
}

#[test]
fn test_scoped_session_converts_panics() {
    require_libmagic!();
    let result: filemagic_core::Result<()> =
        with_session([SessionOption::DisableAutoload], |_| panic!("123abc456"));

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "magic: 123abc456");
    assert_eq!(err.code(), -1);
}

#[test]
fn test_scoped_session_open_failure() {
    require_libmagic!();
    let result = with_session([SessionOption::WithFlags(-1)], |_| Ok(()));
    assert_eq!(result.unwrap_err().code(), libc::EINVAL);
}

#[test]
#[serial]
fn test_compile_writes_database_in_working_directory() {
    require_libmagic!();
    let dir = tempfile::tempdir().unwrap();
    let previous = env::current_dir().unwrap();
    fs::copy(png_database(), dir.path().join("png.magic")).unwrap();
    env::set_current_dir(dir.path()).unwrap();

    let result = compile(&[Path::new("png.magic")]);
    let header = fs::read(dir.path().join("png.magic.mgc"));
    env::set_current_dir(previous).unwrap();

    result.unwrap();
    let header = header.unwrap();
    assert!(header.len() > 5);
    assert_eq!(header[..4], COMPILED_MAGIC);
    assert!(header[4] > 0, "database format version missing");
}

#[test]
#[serial]
fn test_compile_broken_database_fails() {
    require_libmagic!();
    let dir = tempfile::tempdir().unwrap();
    let previous = env::current_dir().unwrap();
    fs::copy(broken_database(), dir.path().join("broken.magic")).unwrap();
    env::set_current_dir(dir.path()).unwrap();

    let result = compile(&[Path::new("broken.magic")]);
    env::set_current_dir(previous).unwrap();

    let err = result.unwrap_err();
    assert!(err.message().contains("No current entry for continuation"), "{err}");
}

#[test]
fn test_check() {
    require_libmagic!();
    check(&[png_database()]).unwrap();
    check(&[shell_database()]).unwrap();

    let err = check(&[broken_database()]).unwrap_err();
    assert!(matches!(err, MagicError::Native { .. }), "{err:?}");

    let err = check(&["does/not/exist"]).unwrap_err();
    assert!(err.message().contains("could not find any"), "{err}");
}

#[test]
fn test_version_string_matches_version() {
    require_libmagic!();
    match version_string() {
        Some(s) => {
            let v = version();
            assert_eq!(s, format!("{}.{:02}", v / 100, v % 100));
        }
        None => assert_eq!(version(), -1),
    }
}
