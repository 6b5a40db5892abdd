//! Version command handler

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::output::OutputWriter;
use filemagic_core::{Capabilities, Magic, SessionOption};
use serde::Serialize;
use std::path::PathBuf;

/// What `filemagic version` reports
#[derive(Debug, Serialize)]
struct VersionReport {
    filemagic: &'static str,
    libmagic: Option<String>,
    flags_getter: bool,
    parameters: bool,
    legacy_null_result: bool,
    database_paths: Vec<PathBuf>,
}

impl VersionReport {
    fn new(capabilities: Capabilities, database_paths: Vec<PathBuf>) -> Self {
        Self {
            filemagic: env!("CARGO_PKG_VERSION"),
            libmagic: filemagic_core::version_string(),
            flags_getter: capabilities.flags_getter,
            parameters: capabilities.parameters,
            legacy_null_result: capabilities.legacy_null_result,
            database_paths,
        }
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        let paths = self
            .database_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(":");

        vec![
            ("filemagic", self.filemagic.to_string()),
            (
                "libmagic",
                self.libmagic.clone().unwrap_or_else(|| "unknown".to_string()),
            ),
            ("flags getter", yes_no(self.flags_getter)),
            ("parameters", yes_no(self.parameters)),
            ("legacy null results", yes_no(self.legacy_null_result)),
            ("database", paths),
        ]
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

/// Handle the version command
pub fn handle_version(output: &mut OutputWriter) -> Result<()> {
    let capabilities = filemagic_core::capabilities()?;

    let magic = Magic::open([SessionOption::DisableAutoload])?;
    let database_paths = magic.paths()?;
    magic.close();

    let report = VersionReport::new(capabilities, database_paths);
    match output.format() {
        OutputFormat::Human => output.fields(&report.rows()),
        _ => output.data(&report),
    }
}
