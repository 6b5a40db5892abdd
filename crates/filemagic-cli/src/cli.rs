//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use filemagic_core::flags;

/// FileMagic - identify file contents with libmagic
///
/// Reports the type, MIME type, encoding or extensions of files, standard
/// input, or rule databases, and compiles or checks those databases.
#[derive(Parser, Debug)]
#[command(
    name = "filemagic",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "FILEMAGIC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Identify files, or standard input given as `-`
    Identify(IdentifyArgs),

    /// Compile rule databases into `<name>.mgc` in the working directory
    Compile(DatabaseArgs),

    /// Check rule databases for errors
    Check(DatabaseArgs),

    /// Show the installed libmagic version and capabilities
    Version,

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the identify command
#[derive(Parser, Debug)]
pub struct IdentifyArgs {
    /// Files to identify; `-` reads standard input
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Report MIME type and encoding
    #[arg(long, conflicts_with_all = ["mime_type", "mime_encoding", "extension"])]
    pub mime: bool,

    /// Report MIME type only
    #[arg(long, conflicts_with = "extension")]
    pub mime_type: bool,

    /// Report MIME encoding only
    #[arg(long, conflicts_with = "extension")]
    pub mime_encoding: bool,

    /// Report known file extensions
    #[arg(long)]
    pub extension: bool,

    /// Report every match instead of stopping at the first
    #[arg(short = 'k', long)]
    pub keep_going: bool,

    /// Look inside compressed files
    #[arg(short = 'z', long)]
    pub uncompress: bool,

    /// Follow symbolic links
    #[arg(short = 'L', long)]
    pub dereference: bool,

    /// Read block and character devices
    #[arg(short = 's', long)]
    pub special_files: bool,

    /// Rule database to use instead of the default (repeatable)
    #[arg(short = 'm', long = "magic-file", value_name = "FILE")]
    pub magic_files: Vec<PathBuf>,

    /// Report I/O errors as results instead of failures
    #[arg(long)]
    pub no_strict: bool,
}

impl IdentifyArgs {
    /// libmagic flags selected by the command line
    pub fn flags(&self) -> i32 {
        let mut selected = flags::NONE;
        if self.mime {
            selected |= flags::MIME;
        }
        if self.mime_type {
            selected |= flags::MIME_TYPE;
        }
        if self.mime_encoding {
            selected |= flags::MIME_ENCODING;
        }
        if self.extension {
            selected |= flags::EXTENSION;
        }
        if self.keep_going {
            selected |= flags::CONTINUE;
        }
        if self.uncompress {
            selected |= flags::COMPRESS;
        }
        if self.dereference {
            selected |= flags::SYMLINK;
        }
        if self.special_files {
            selected |= flags::DEVICES;
        }
        selected
    }
}

/// Arguments for the compile and check commands
#[derive(Parser, Debug)]
pub struct DatabaseArgs {
    /// Rule database files; none means the default database
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable formatted output
    #[default]
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // Verify that the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli::parse_from(["filemagic", "-vv", "version"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["filemagic", "--quiet", "version"]);
        assert_eq!(cli.verbosity_level(), 0);
    }

    #[test]
    fn test_identify_flags() {
        let cli = Cli::parse_from(["filemagic", "identify", "--mime", "-k", "a.png"]);
        let Commands::Identify(args) = cli.command else {
            panic!("expected identify");
        };
        assert_eq!(args.flags(), flags::MIME | flags::CONTINUE);
        assert_eq!(args.paths, vec![PathBuf::from("a.png")]);
    }

    #[test]
    fn test_identify_repeatable_magic_files() {
        let cli = Cli::parse_from([
            "filemagic", "identify", "-m", "png.magic", "-m", "shell.magic", "-",
        ]);
        let Commands::Identify(args) = cli.command else {
            panic!("expected identify");
        };
        assert_eq!(
            args.magic_files,
            vec![PathBuf::from("png.magic"), PathBuf::from("shell.magic")]
        );
        assert_eq!(args.paths, vec![PathBuf::from("-")]);
        assert_eq!(args.flags(), flags::NONE);
    }

    #[test]
    fn test_conflicting_modes_rejected() {
        let result = Cli::try_parse_from(["filemagic", "identify", "--mime", "--extension", "a"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_format_parsing() {
        let cli = Cli::parse_from(["filemagic", "-o", "json-pretty", "version"]);
        assert_eq!(cli.output, Some(OutputFormat::JsonPretty));
    }
}
