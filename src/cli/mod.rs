//! CLI support for esql-parser
//!
//! Provides programmatic access to the `esql` subcommands so other tools can
//! embed them without shelling out.

mod check;
mod convert;
mod docs;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use convert::{format_query, quote_name};
pub use docs::{DocCategory, get_doc_category, get_docs_overview};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    #[error("Could not render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// `-` was given but stdin is a terminal.
    #[error("No query provided. Pass it as an argument or pipe it to stdin with '-'.")]
    NoInput,

    #[error("Unknown category: '{0}'\nRun 'esql docs' to see available categories.")]
    UnknownCategory(String),
}
