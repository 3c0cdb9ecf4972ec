//! Validate queries and optionally render their AST

use tracing::debug;

use super::CliError;
use crate::{ParserConfig, Statement, parse_with, to_json, to_json_pretty};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The query to validate
    pub query: String,
    /// Accept experimental grammar
    pub experimental: bool,
    /// Print the AST as JSON instead of a confirmation
    pub json: bool,
    /// Pretty-print the JSON
    pub pretty: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// The query parsed
    SyntaxValid { commands: usize },
    /// The query parsed and was rendered as JSON
    Json(String),
}

impl CheckOptions {
    fn config(&self) -> ParserConfig {
        ParserConfig {
            experimental: self.experimental,
            ..ParserConfig::default()
        }
    }
}

/// Parse the query in `options` and report the outcome.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let statement: Statement = parse_with(&options.query, &options.config())?;
    debug!(experimental = options.experimental, "query accepted");

    if !options.json {
        return Ok(CheckResult::SyntaxValid {
            commands: statement.query.len(),
        });
    }

    let json = if options.pretty {
        to_json_pretty(&statement)?
    } else {
        to_json(&statement)?
    };
    Ok(CheckResult::Json(json))
}
