//! Parser for the ES|QL pipe query language.
//!
//! A query is one source command followed by any number of `|`-chained
//! processing commands:
//!
//! ```
//! use esql_parser::{parse, ProcessingCommand, SourceCommand};
//!
//! let statement = parse("FROM logs-* | WHERE status >= 500 | LIMIT 10").unwrap();
//! assert!(matches!(statement.query.source, SourceCommand::From(_)));
//! assert!(matches!(statement.query.pipeline[1], ProcessingCommand::Limit(_)));
//! ```
//!
//! Grammar alternatives that are still in development are switched off
//! unless [`ParserConfig::experimental`] is set.

pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod output;
pub mod parser;

pub use ast::*;
pub use config::ParserConfig;
pub use error::{ErrorKind, ParseError};
pub use lexer::Lexer;
pub use output::{to_json, to_json_pretty, to_query, to_query_pretty};
pub use parser::Parser;

/// Parse `query` with the stable grammar.
pub fn parse(query: &str) -> Result<Statement, ParseError> {
    parse_with(query, &ParserConfig::default())
}

/// Parse `query` with an explicit configuration.
pub fn parse_with(query: &str, config: &ParserConfig) -> Result<Statement, ParseError> {
    Parser::new(Lexer::new(query), *config)?.parse_statement()
}

/// Parse a standalone boolean expression such as `a > 1 AND b IS NULL`.
pub fn parse_expression(expression: &str) -> Result<Expr, ParseError> {
    Parser::new(Lexer::new(expression), ParserConfig::default())?.parse_expression()
}
