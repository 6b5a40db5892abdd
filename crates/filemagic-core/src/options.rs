//! Session construction options and tunable parameters

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// libmagic tunable limits (`MAGIC_PARAM_*`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    /// Recursion limit for indirect magic
    IndirMax,
    /// Use count limit for name/use magic
    NameMax,
    /// Maximum number of ELF program sections processed
    ElfPhnumMax,
    /// Maximum number of ELF sections processed
    ElfShnumMax,
    /// Maximum number of ELF notes processed
    ElfNotesMax,
    /// Length limit for regex searches
    RegexMax,
    /// Maximum number of bytes read from a file
    BytesMax,
    /// Maximum number of bytes scanned for encoding detection
    EncodingMax,
}

impl Parameter {
    /// Every parameter, in native id order
    pub const ALL: [Parameter; 8] = [
        Parameter::IndirMax,
        Parameter::NameMax,
        Parameter::ElfPhnumMax,
        Parameter::ElfShnumMax,
        Parameter::ElfNotesMax,
        Parameter::RegexMax,
        Parameter::BytesMax,
        Parameter::EncodingMax,
    ];

    /// Native parameter id
    pub fn id(self) -> i32 {
        match self {
            Parameter::IndirMax => 0,
            Parameter::NameMax => 1,
            Parameter::ElfPhnumMax => 2,
            Parameter::ElfShnumMax => 3,
            Parameter::ElfNotesMax => 4,
            Parameter::RegexMax => 5,
            Parameter::BytesMax => 6,
            Parameter::EncodingMax => 7,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::IndirMax => write!(f, "indir_max"),
            Parameter::NameMax => write!(f, "name_max"),
            Parameter::ElfPhnumMax => write!(f, "elf_phnum_max"),
            Parameter::ElfShnumMax => write!(f, "elf_shnum_max"),
            Parameter::ElfNotesMax => write!(f, "elf_notes_max"),
            Parameter::RegexMax => write!(f, "regex_max"),
            Parameter::BytesMax => write!(f, "bytes_max"),
            Parameter::EncodingMax => write!(f, "encoding_max"),
        }
    }
}

/// Option applied, in order, while a session is being opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOption {
    /// Skip loading the default database
    DisableAutoload,
    /// Set the session's flags
    WithFlags(i32),
    /// Load these database files instead of the default
    WithFiles(Vec<PathBuf>),
    /// Set a tunable limit
    WithParameter(Parameter, usize),
    /// Embed I/O errors in query results instead of failing
    DoNotStopOnErrors,
}

impl SessionOption {
    /// Load `files`, or the default database when empty
    pub fn with_files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        SessionOption::WithFiles(files.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_ids_follow_native_order() {
        for (i, param) in Parameter::ALL.iter().enumerate() {
            assert_eq!(param.id(), i as i32);
        }
    }

    #[test]
    fn test_parameter_names_match_serde() {
        for param in Parameter::ALL {
            let json = serde_json::to_string(&param).unwrap();
            assert_eq!(json, format!("\"{}\"", param));
        }
        let parsed: Parameter = serde_json::from_str("\"bytes_max\"").unwrap();
        assert_eq!(parsed, Parameter::BytesMax);
    }

    #[test]
    fn test_with_files_collects_paths() {
        let option = SessionOption::with_files(["a.magic", "b.magic"]);
        assert_eq!(
            option,
            SessionOption::WithFiles(vec![PathBuf::from("a.magic"), PathBuf::from("b.magic")])
        );
    }
}
