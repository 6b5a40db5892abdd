//! Shared utilities for command handlers

use crate::error::{Error, Result};
use crate::output::Outcome;
use std::path::Path;

/// Command-line path that stands for standard input
pub const STDIN_PATH: &str = "-";

/// Name standard input is reported under
pub const STDIN_NAME: &str = "/dev/stdin";

/// Path as shown in results
pub fn display_path(path: &Path) -> String {
    if path == Path::new(STDIN_PATH) {
        STDIN_NAME.to_string()
    } else {
        path.display().to_string()
    }
}

/// Fail the command when any path failed
pub fn summarize(outcomes: &[Outcome]) -> Result<()> {
    let failed = outcomes.iter().filter(|o| o.is_failure()).count();
    if failed == 0 {
        Ok(())
    } else {
        tracing::debug!(failed, total = outcomes.len(), "Command finished with failures");
        Err(Error::Partial {
            failed,
            total: outcomes.len(),
        })
    }
}
