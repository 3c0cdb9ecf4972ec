//! Grammar reference for the esql CLI

use std::borrow::Cow;

use super::CliError;
use crate::grammar::{self, Availability, CommandSpec};

/// Available documentation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Syntax,
    Commands,
    Expressions,
    Literals,
    Names,
    Parameters,
    Experimental,
}

impl DocCategory {
    /// Parse category name from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "syntax" | "pipeline" => Some(Self::Syntax),
            "commands" | "command" => Some(Self::Commands),
            "expressions" | "expression" | "operators" | "ops" => Some(Self::Expressions),
            "literals" | "literal" | "types" => Some(Self::Literals),
            "names" | "identifiers" | "quoting" => Some(Self::Names),
            "parameters" | "params" => Some(Self::Parameters),
            "experimental" | "dev" => Some(Self::Experimental),
            _ => None,
        }
    }
}

/// Get the docs overview (category listing)
pub fn get_docs_overview() -> &'static str {
    r#"ES|QL DOCUMENTATION

ES|QL queries start with one source command and pass its rows through any
number of processing commands separated by pipes.

    FROM employees | WHERE still_hired | KEEP first_name, salary | LIMIT 10

DOCUMENTATION CATEGORIES

  syntax            Pipeline shape, settings, comments and keywords
  commands          Every source and processing command with its arguments
  expressions       Boolean, comparison, arithmetic and pattern operators
  literals          Numbers, strings, timespans, arrays and maps
  names             Identifiers, back-tick quoting and name patterns
  parameters        ?, ?name, ?1 and the double forms ?? and ??name
  experimental      Grammar that needs --experimental

Run 'esql doc <category>' for detailed documentation.
"#
}

/// Get documentation for a specific category
pub fn get_doc_category(name: &str) -> Result<Cow<'static, str>, CliError> {
    match DocCategory::from_name(name) {
        Some(DocCategory::Syntax) => Ok(Cow::Borrowed(SYNTAX_DOC)),
        Some(DocCategory::Commands) => Ok(Cow::Owned(commands_doc())),
        Some(DocCategory::Expressions) => Ok(Cow::Borrowed(EXPRESSIONS_DOC)),
        Some(DocCategory::Literals) => Ok(Cow::Borrowed(LITERALS_DOC)),
        Some(DocCategory::Names) => Ok(Cow::Owned(names_doc())),
        Some(DocCategory::Parameters) => Ok(Cow::Borrowed(PARAMETERS_DOC)),
        Some(DocCategory::Experimental) => Ok(Cow::Owned(experimental_doc())),
        None => Err(CliError::UnknownCategory(name.to_string())),
    }
}

fn commands_doc() -> String {
    let mut doc = String::from("COMMANDS\n\nSOURCE COMMANDS (first stage of a query)\n");
    push_table(&mut doc, grammar::SOURCE_COMMANDS, Availability::Stable);
    doc.push_str("\nPROCESSING COMMANDS (after a pipe)\n");
    push_table(&mut doc, grammar::PROCESSING_COMMANDS, Availability::Stable);
    doc.push_str(COMMAND_SYNOPSES);
    doc
}

fn experimental_doc() -> String {
    let mut doc = String::from(
        "EXPERIMENTAL GRAMMAR\n\nEnabled with --experimental or ESQL_EXPERIMENTAL=true. \
         Without the flag these read as unknown input.\n\nSOURCE COMMANDS\n",
    );
    push_table(&mut doc, grammar::SOURCE_COMMANDS, Availability::Experimental);
    doc.push_str("\nPROCESSING COMMANDS\n");
    push_table(&mut doc, grammar::PROCESSING_COMMANDS, Availability::Experimental);
    doc.push_str(EXPERIMENTAL_SYNTAX);
    doc
}

fn push_table(doc: &mut String, table: &[CommandSpec], availability: Availability) {
    for spec in table.iter().filter(|spec| spec.availability == availability) {
        doc.push_str("  ");
        doc.push_str(spec.syntax);
        doc.push('\n');
    }
}

fn names_doc() -> String {
    let reserved: Vec<&str> = grammar::RESERVED_KEYWORDS
        .iter()
        .map(|keyword| keyword.as_str())
        .collect();
    format!(
        "{NAMES_DOC}\nRESERVED WORDS (quote them to use as names)\n  {}\n",
        reserved.join(" ")
    )
}

const SYNTAX_DOC: &str = r#"SYNTAX - Pipeline Structure

QUERY
  source-command [| processing-command]*
    A query has exactly one source command. Each pipe feeds the rows of
    the previous stage into the next command.

    Example:
      FROM logs-* | WHERE status >= 500 | STATS c = COUNT(*) BY host

SETTINGS
  SET name = value; query
    Settings come before the query and end with a semicolon. The value is
    a constant or a map. They are recorded as written.

    Example:
      SET time_zone = "Europe/Paris"; FROM logs | LIMIT 1

KEYWORDS
  Keywords are case-insensitive: 'from', 'FROM' and 'From' are the same.

COMMENTS
  // line comment
  /* block comment */
"#;

const EXPRESSIONS_DOC: &str = r#"EXPRESSIONS - Operators and Precedence

PRECEDENCE (loosest first)
  OR
  AND
  NOT
  IN, LIKE, RLIKE, IS [NOT] NULL, field: "match query"
  ==, !=, <, <=, >, >=, =~
  +, -
  *, /, %
  unary -, unary +
  ::type cast

  Examples:
    1 + 2 * 3          1 + (2 * 3)
    a OR b AND c       a OR (b AND c)
    NOT a AND b        (NOT a) AND b
    a + b::integer     a + (b::integer)

COMPARISON
  Only one comparison per operand: 'a < b < c' is rejected.

PATTERNS
  name LIKE "a*"             Wildcard match
  name RLIKE "a.+"           Regular expression match
  name LIKE ("a*", "b*")     Any of several patterns
  NOT LIKE / NOT RLIKE / NOT IN negate the test

FUNCTIONS
  name(args)
  COUNT(*)
  MATCH(field, "text", {"fuzziness": 1})    Trailing map of options
"#;

const LITERALS_DOC: &str = r#"LITERALS

NUMBERS
  42             integer
  18446744073709551615
                 unsigned long (above the signed range)
  1.5, .5, 1e3   decimal
  -7             signs fold into the literal

STRINGS
  "text"         escapes: \t \n \r \" \\
  """raw"""      triple-quoted, no escapes

OTHER
  true, false, null
  1 day, 5 minutes        timespans (integer followed by a unit)
  [1, 2, 3]               arrays hold one kind of value
  {"key": "value"}        maps appear as function options and WITH clauses
"#;

const NAMES_DOC: &str = r#"NAMES - Identifiers and Quoting

IDENTIFIERS
  emp_no, @timestamp, _id
    Letters, digits and underscores. A name starting with '_' or '@' needs
    at least one more character.

QUOTING
  `first-name`, `with space`, `a``b`
    Back-ticks allow any text. A back-tick inside is written twice. Names
    containing a back-tick or a hyphen always need quoting.

QUALIFIED NAMES
  address.city.name
    Segments are joined with dots; each segment may be quoted.

NAME PATTERNS (KEEP, DROP, RENAME, ENRICH)
  first_*, *_name, `a-b`*
    '*' matches any run of characters within the pattern.
"#;

const PARAMETERS_DOC: &str = r#"PARAMETERS

  ?              anonymous, bound by position of appearance
  ?name          named
  ?1             positional (1-based)
  ??, ??name     identifier parameters, only where a name is expected

  Examples:
    FROM idx | WHERE age > ?min_age
    FROM idx | KEEP ??field
    FROM idx | EVAL x = ??fn(a)
"#;

const COMMAND_SYNOPSES: &str = r#"
SYNOPSES
  FROM index[, index]* [METADATA field[, field]*]
  TS index[, index]*
  ROW name = value[, ...]
  SHOW INFO
  PROMQL [name=value]* [target=](promql text)
  EVAL [name =] expr[, ...]
  WHERE condition
  KEEP pattern[, ...]            DROP pattern[, ...]
  LIMIT n                        SAMPLE probability
  STATS [agg [WHERE cond]][, ...] [BY group[, ...]]
  INLINE STATS ...               (same arguments as STATS)
  SORT expr [ASC|DESC] [NULLS FIRST|LAST][, ...]
  RENAME old AS new[, ...]
  DISSECT field "pattern" [name = value]
  GROK field "pattern"[, "pattern"]*
  ENRICH [mode:]policy [ON field] [WITH [name =] field[, ...]]
  MV_EXPAND field
  LOOKUP JOIN index [AS alias] ON condition[, ...]
  CHANGE_POINT value [ON key] [AS type_name, pvalue_name]
  COMPLETION [target =] prompt [WITH {options}]
  FORK (commands) (commands) ...
  RERANK [target =] "query" ON field[, ...] [WITH {options}]
  FUSE [method] [SCORE BY f] [KEY BY f[, ...]] [GROUP BY f] [WITH {options}]
  URI_PARTS name = expr          REGISTERED_DOMAIN name = expr
  METRICS_INFO
"#;

const EXPERIMENTAL_SYNTAX: &str = r#"
SYNTAX
  EXPLAIN (query)
  EXTERNAL "location" [WITH {options}]
  FROM index, (FROM other | WHERE x > 1)       Subqueries as sources
  LOOKUP table ON field[, ...]
  LEFT JOIN / RIGHT JOIN / FULL JOIN index [AS alias] ON condition
  INSIST pattern[, ...]
  MMR [query_vector] ON field LIMIT n [WITH {options}]
  [qualifier].[name]                          Bracket-qualified names
"#;
