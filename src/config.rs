/// Parser construction options.
///
/// # Examples
///
/// ```
/// use esql_parser::{ParserConfig, parse_with};
///
/// let config = ParserConfig::experimental();
/// assert!(parse_with("FROM idx | INSIST field", &config).is_ok());
/// assert!(parse_with("FROM idx | INSIST field", &ParserConfig::default()).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Enables grammar alternatives that are not yet part of the stable
    /// language (EXPLAIN, EXTERNAL, INSIST, MMR, dev LOOKUP, LEFT/RIGHT/FULL
    /// JOIN, subqueries in FROM, bracket-qualified names).
    pub experimental: bool,

    /// Maximum nesting of parentheses, function calls, unary operators,
    /// sub-pipelines and maps.
    pub max_depth: usize,
}

impl ParserConfig {
    /// Deep enough for hand-written queries while staying inside a 2 MiB
    /// thread stack in unoptimized builds, where one level of function-call
    /// nesting costs roughly a dozen parser frames.
    pub const DEFAULT_MAX_DEPTH: usize = 32;

    /// Stable grammar plus every experimental alternative.
    pub fn experimental() -> Self {
        ParserConfig {
            experimental: true,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            experimental: false,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}
