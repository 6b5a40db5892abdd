//! Database compile and check handlers

use super::utils::{display_path, summarize};
use crate::cli::DatabaseArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::{Outcome, OutputWriter};
use std::path::{Path, PathBuf};

const DEFAULT_NAME: &str = "default database";

/// Handle the compile command
///
/// Each file is compiled on its own so one broken file does not hide the
/// results for the rest.
pub fn handle_compile(args: DatabaseArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let outcomes = per_file(&args, config, |file| {
        filemagic_core::compile(&as_list(file))?;
        Ok(match file {
            Some(file) => format!("compiled to {}", compiled_name(file)),
            None => "compiled".to_string(),
        })
    });

    report(outcomes, output)
}

/// Handle the check command
pub fn handle_check(args: DatabaseArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let outcomes = per_file(&args, config, |file| {
        filemagic_core::check(&as_list(file))?;
        Ok("ok".to_string())
    });

    report(outcomes, output)
}

/// Files named on the command line, else the configured ones, else the
/// default database (`None`)
fn targets(args: &DatabaseArgs, config: &Config) -> Vec<Option<PathBuf>> {
    let files = if args.files.is_empty() {
        &config.magic_files
    } else {
        &args.files
    };

    if files.is_empty() {
        vec![None]
    } else {
        files.iter().cloned().map(Some).collect()
    }
}

fn per_file<F>(args: &DatabaseArgs, config: &Config, action: F) -> Vec<Outcome>
where
    F: Fn(Option<&Path>) -> filemagic_core::Result<String>,
{
    targets(args, config)
        .iter()
        .map(|file| {
            let name = file
                .as_deref()
                .map(display_path)
                .unwrap_or_else(|| DEFAULT_NAME.to_string());
            let timer = Timer::with_details("database", &name);
            let _entered = timer.span().enter();
            Outcome::new(name, action(file.as_deref()))
        })
        .collect()
}

fn report(outcomes: Vec<Outcome>, output: &mut OutputWriter) -> Result<()> {
    output.outcomes(&outcomes)?;
    summarize(&outcomes)
}

/// `None` is the empty list libmagic reads as its default database
fn as_list(file: Option<&Path>) -> Vec<&Path> {
    file.into_iter().collect()
}

/// Name libmagic gives the compiled form of `file`, in the working directory
fn compiled_name(file: &Path) -> String {
    let base = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = base.strip_suffix(".mgc").unwrap_or(&base);
    format!("{base}.mgc")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiled_name() {
        assert_eq!(compiled_name(Path::new("rules/png.magic")), "png.magic.mgc");
        assert_eq!(compiled_name(Path::new("already.mgc")), "already.mgc");
    }

    #[test]
    fn test_targets_fall_back_to_config_then_default() {
        let args = DatabaseArgs { files: vec![] };
        assert_eq!(targets(&args, &Config::default()), vec![None]);

        let config = Config {
            magic_files: vec![PathBuf::from("configured.magic")],
            ..Config::default()
        };
        assert_eq!(
            targets(&args, &config),
            vec![Some(PathBuf::from("configured.magic"))]
        );

        let args = DatabaseArgs {
            files: vec![PathBuf::from("a.magic"), PathBuf::from("b.magic")],
        };
        assert_eq!(
            targets(&args, &config),
            vec![Some(PathBuf::from("a.magic")), Some(PathBuf::from("b.magic"))]
        );
    }
}
