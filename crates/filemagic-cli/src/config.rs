//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//!
//! Command-line arguments are applied on top by the handlers.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::LoggingConfig;
use filemagic_core::{Parameter, SessionOption};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rule databases to load instead of the default one
    pub magic_files: Vec<PathBuf>,

    /// Fail queries on I/O errors instead of reporting them as results
    pub strict_errors: bool,

    /// libmagic tunable limits applied to every session
    pub parameters: BTreeMap<Parameter, usize>,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: OutputFormat,

    /// Use colored output by default
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            magic_files: Vec::new(),
            strict_errors: true,
            parameters: BTreeMap::new(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Human,
            color: true,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Ok(Self::load_from(&Self::default_config_paths()))
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// First readable file among `paths`, or the defaults
    fn load_from(paths: &[PathBuf]) -> Self {
        for path in paths {
            if path.exists() {
                match Self::from_file(path) {
                    Ok(config) => return config,
                    Err(e) => {
                        // Logging is not initialised yet; it depends on this file.
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Self::default()
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".filemagic.yaml"),
            PathBuf::from(".filemagic.json"),
            PathBuf::from("filemagic.yaml"),
            PathBuf::from("filemagic.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let filemagic_dir = config_dir.join("filemagic");
            paths.push(filemagic_dir.join("config.yaml"));
            paths.push(filemagic_dir.join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".filemagic.yaml"));
            paths.push(home_dir.join(".filemagic.json"));
        }

        paths
    }

    /// Session options for this configuration
    ///
    /// Non-empty `magic_files` replace the configured databases, and
    /// `no_strict` turns strict error reporting off whatever the file says.
    pub fn session_options(
        &self,
        session_flags: i32,
        magic_files: &[PathBuf],
        no_strict: bool,
    ) -> Vec<SessionOption> {
        let files = if magic_files.is_empty() {
            &self.magic_files
        } else {
            magic_files
        };

        let mut options = vec![
            SessionOption::WithFlags(session_flags),
            SessionOption::WithFiles(files.to_vec()),
        ];
        options.extend(
            self.parameters
                .iter()
                .map(|(param, value)| SessionOption::WithParameter(*param, *value)),
        );
        if no_strict || !self.strict_errors {
            options.push(SessionOption::DoNotStopOnErrors);
        }

        options
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.strict_errors);
        assert!(config.magic_files.is_empty());
        assert_eq!(config.output.format, OutputFormat::Human);
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "magic_files:\n  - /opt/rules/png.magic\nstrict_errors: false\n\
             parameters:\n  bytes_max: 4096\noutput:\n  format: json-pretty\n\
             logging:\n  level: debug\n  format: json\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.magic_files, vec![PathBuf::from("/opt/rules/png.magic")]);
        assert!(!config.strict_errors);
        assert_eq!(config.parameters.get(&Parameter::BytesMax), Some(&4096));
        assert_eq!(config.output.format, OutputFormat::JsonPretty);
        assert!(config.output.color);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filemagic.json");
        fs::write(&path, r#"{"parameters": {"indir_max": 3}}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.strict_errors);
        assert_eq!(config.parameters.get(&Parameter::IndirMax), Some(&3));
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filemagic.json");
        fs::write(&path, r#"{"parameters": {"depth": 3}}"#).unwrap();

        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_load_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        let good = dir.path().join("good.yaml");
        fs::write(&broken, "{not json").unwrap();
        fs::write(&good, "strict_errors: false\n").unwrap();

        let paths = [dir.path().join("missing.yaml"), broken, good];
        assert!(!Config::load_from(&paths).strict_errors);
        assert_eq!(Config::load_from(&paths[..1]), Config::default());
    }

    #[test]
    fn test_session_options_prefer_command_line_files() {
        let config = Config {
            magic_files: vec![PathBuf::from("configured.magic")],
            parameters: BTreeMap::from([(Parameter::RegexMax, 100)]),
            ..Config::default()
        };

        let options = config.session_options(0x10, &[PathBuf::from("cli.magic")], false);
        assert_eq!(
            options,
            vec![
                SessionOption::WithFlags(0x10),
                SessionOption::WithFiles(vec![PathBuf::from("cli.magic")]),
                SessionOption::WithParameter(Parameter::RegexMax, 100),
            ]
        );

        let options = config.session_options(0, &[], true);
        assert_eq!(
            options[1],
            SessionOption::WithFiles(vec![PathBuf::from("configured.magic")])
        );
        assert_eq!(options.last(), Some(&SessionOption::DoNotStopOnErrors));
    }
}
