//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod database;
mod identify;
mod utils;
mod version;

pub use completions::handle_completions;
pub use database::{handle_check, handle_compile};
pub use identify::handle_identify;
pub use version::handle_version;
