//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable).

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use filemagic_core::MagicError;
use serde::Serialize;
use std::io::{self, Write};
use tracing::trace;

/// Trait for formatting serializable values
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => {
                // For human format, use pretty JSON as fallback
                Ok(serde_json::to_string_pretty(value)?)
            }
        }
    }
}

/// Result of one path handed to a command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// The command produced a result for the path
    Success { path: String, result: String },
    /// The command failed for the path; other paths carry on
    Failure { path: String, error: MagicError },
}

impl Outcome {
    /// Build an outcome from a per-path result
    pub fn new(path: impl Into<String>, result: filemagic_core::Result<String>) -> Self {
        let path = path.into();
        match result {
            Ok(result) => Outcome::Success { path, result },
            Err(error) => Outcome::Failure { path, error },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!(bytes = formatted.len(), "Outputting data");

        if self.format == OutputFormat::Yaml {
            // serde_yaml already ends documents with a newline
            write!(self.writer, "{}", formatted)?;
            self.writer.flush()?;
            Ok(())
        } else {
            self.writeln(&formatted)
        }
    }

    /// Write per-path outcomes
    ///
    /// Human output is one `path: result` line per path, with failures in
    /// red. Machine formats emit the whole list as one document.
    pub fn outcomes(&mut self, outcomes: &[Outcome]) -> Result<()> {
        if self.format != OutputFormat::Human {
            return self.data(&outcomes);
        }

        for outcome in outcomes {
            let line = match outcome {
                Outcome::Success { path, result } => format!("{}: {}", path, result),
                Outcome::Failure { path, error } => {
                    let message = format!("{}: {}", path, error.message());
                    if self.use_color {
                        message.red().to_string()
                    } else {
                        message
                    }
                }
            };
            self.writeln(&line)?;
        }

        Ok(())
    }

    /// Write `key: value` rows, aligned, for human output
    pub fn fields(&mut self, rows: &[(&str, String)]) -> Result<()> {
        let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

        for (key, value) in rows {
            let label = format!("{:width$}", format!("{key}:"), width = width + 1);
            let label = if self.use_color {
                label.bold().to_string()
            } else {
                label
            };
            self.writeln(&format!("{} {}", label, value))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    include!("output/tests.rs");
}
