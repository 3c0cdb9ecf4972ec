//! Text-to-text conversions: canonical formatting and identifier quoting

use std::borrow::Cow;

use super::CliError;
use crate::{ParserConfig, grammar, output::QueryPrinter, parse_with};

/// Parse `query` and print it back in canonical form.
pub fn format_query(query: &str, config: &ParserConfig, pretty: bool) -> Result<String, CliError> {
    let statement = parse_with(query, config)?;
    Ok(QueryPrinter::new(pretty).print(&statement))
}

/// `name` as it must be written in a query: back-ticked only when required.
pub fn quote_name(name: &str) -> Cow<'_, str> {
    grammar::quote_if_needed(name)
}
