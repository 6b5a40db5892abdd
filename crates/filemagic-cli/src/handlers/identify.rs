//! Identify command handler

use super::utils::{display_path, summarize, STDIN_PATH};
use crate::cli::IdentifyArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::{Outcome, OutputWriter};
use filemagic_core::{Magic, MagicError};
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Handle the identify command
///
/// One session serves every path. A failure on one path is reported with
/// the others; only a session that cannot be opened aborts the command.
pub fn handle_identify(
    args: IdentifyArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let options = config.session_options(args.flags(), &args.magic_files, args.no_strict);
    let magic = Magic::open(options)?;
    debug!(session = %magic, "Session opened");

    let mut outcomes = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let name = display_path(path);
        let timer = Timer::with_details("identify", &name);
        let _entered = timer.span().enter();
        outcomes.push(Outcome::new(name, identify_one(&magic, path)));
    }
    magic.close();

    output.outcomes(&outcomes)?;
    summarize(&outcomes)
}

fn identify_one(magic: &Magic, path: &Path) -> filemagic_core::Result<String> {
    if path == Path::new(STDIN_PATH) {
        let data = read_stdin()?;
        return magic.buffer(&data);
    }

    magic.file(path)
}

fn read_stdin() -> filemagic_core::Result<Vec<u8>> {
    let mut data = Vec::new();
    io::stdin()
        .lock()
        .read_to_end(&mut data)
        .map_err(|e| MagicError::Io {
            errno: e.raw_os_error().unwrap_or(-1),
            message: format!("failed to read standard input: {e}"),
        })?;
    Ok(data)
}
