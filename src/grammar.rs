//! Grammar constraints shared by everything that reads or writes query text.
//!
//! The parser, the canonical printer in [`crate::output`] and any query
//! generator used for testing import the same tables from here: keyword
//! reservation, command availability, binding powers and the identifier
//! quoting rules. Keeping a single copy avoids the printer or a generator
//! drifting away from what the parser accepts.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::ast::Keyword;

/// Binding powers of the boolean operators. Higher binds tighter.
///
/// `NOT` parses its operand at [`NOT`](precedence::NOT), which is above both
/// `AND` and `OR`, so `not a and b` is `(not a) and b`.
pub mod precedence {
    pub const OR: u8 = 4;
    pub const AND: u8 = 5;
    pub const NOT: u8 = 8;
}

/// Whether a grammar alternative is part of the stable language or only
/// exists when the experimental flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Stable,
    Experimental,
}

impl Availability {
    pub fn is_enabled(self, experimental: bool) -> bool {
        match self {
            Availability::Stable => true,
            Availability::Experimental => experimental,
        }
    }
}

/// One entry of a command dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Leading keyword(s) as written in queries.
    pub syntax: &'static str,
    pub availability: Availability,
}

const fn stable(syntax: &'static str) -> CommandSpec {
    CommandSpec {
        syntax,
        availability: Availability::Stable,
    }
}

const fn experimental(syntax: &'static str) -> CommandSpec {
    CommandSpec {
        syntax,
        availability: Availability::Experimental,
    }
}

/// Commands allowed as the first stage of a query.
pub const SOURCE_COMMANDS: &[CommandSpec] = &[
    stable("FROM"),
    stable("ROW"),
    stable("SHOW INFO"),
    stable("TS"),
    stable("PROMQL"),
    experimental("EXPLAIN"),
    experimental("EXTERNAL"),
];

/// Commands allowed after a pipe.
pub const PROCESSING_COMMANDS: &[CommandSpec] = &[
    stable("EVAL"),
    stable("WHERE"),
    stable("KEEP"),
    stable("LIMIT"),
    stable("STATS"),
    stable("SORT"),
    stable("DROP"),
    stable("RENAME"),
    stable("DISSECT"),
    stable("GROK"),
    stable("ENRICH"),
    stable("MV_EXPAND"),
    stable("LOOKUP JOIN"),
    stable("CHANGE_POINT"),
    stable("COMPLETION"),
    stable("SAMPLE"),
    stable("FORK"),
    stable("RERANK"),
    stable("INLINE STATS"),
    stable("INLINESTATS"),
    stable("FUSE"),
    stable("URI_PARTS"),
    stable("METRICS_INFO"),
    stable("REGISTERED_DOMAIN"),
    experimental("LEFT JOIN"),
    experimental("RIGHT JOIN"),
    experimental("FULL JOIN"),
    experimental("LOOKUP"),
    experimental("INSIST"),
    experimental("MMR"),
];

/// Source commands visible under the given flag, in table order.
pub fn source_commands(experimental: bool) -> impl Iterator<Item = &'static str> {
    enabled(SOURCE_COMMANDS, experimental)
}

/// Processing commands visible under the given flag, in table order.
pub fn processing_commands(experimental: bool) -> impl Iterator<Item = &'static str> {
    enabled(PROCESSING_COMMANDS, experimental)
}

/// Table entry a command starting with `first`, then `second`, belongs to.
///
/// An entry whose words all match wins over one that only shares the
/// leading keyword, and earlier entries win among equals, so `LOOKUP JOIN`
/// shadows `LOOKUP`. A lone leading match (`SHOW` without `INFO`) is still
/// returned, so the caller can report the missing second word.
pub fn find_command(
    table: &'static [CommandSpec],
    first: Keyword,
    second: Option<Keyword>,
) -> Option<&'static CommandSpec> {
    let leading = |spec: &&CommandSpec| spec.syntax.split(' ').next() == Some(first.as_str());
    let complete = |spec: &&CommandSpec| match spec.syntax.split(' ').nth(1) {
        Some(word) => second.is_some_and(|keyword| keyword.as_str() == word),
        None => true,
    };
    table
        .iter()
        .filter(leading)
        .find(complete)
        .or_else(|| table.iter().find(leading))
}

fn enabled(
    table: &'static [CommandSpec],
    experimental: bool,
) -> impl Iterator<Item = &'static str> {
    table
        .iter()
        .filter(move |spec| spec.availability.is_enabled(experimental))
        .map(|spec| spec.syntax)
}

/// Keywords that can never be used as unquoted identifiers.
pub const RESERVED_KEYWORDS: &[Keyword] = &[
    Keyword::And,
    Keyword::Or,
    Keyword::Not,
    Keyword::In,
    Keyword::Like,
    Keyword::Rlike,
    Keyword::Is,
    Keyword::Null,
    Keyword::True,
    Keyword::False,
    Keyword::By,
    Keyword::As,
    Keyword::On,
    Keyword::With,
    Keyword::Where,
    Keyword::Asc,
    Keyword::Desc,
    Keyword::Nulls,
    Keyword::Metadata,
];

pub fn is_reserved(keyword: Keyword) -> bool {
    RESERVED_KEYWORDS.contains(&keyword)
}

static UNQUOTED_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9_]*|[_@][A-Za-z0-9_]+)$")
        .expect("identifier regex is valid")
});

/// True when `name` can be written without back-ticks: it has identifier
/// shape and is not a reserved keyword.
pub fn is_valid_unquoted_identifier(name: &str) -> bool {
    if !UNQUOTED_IDENTIFIER.is_match(name) {
        return false;
    }
    !Keyword::from_word(name).is_some_and(is_reserved)
}

/// True iff the name contains a back-tick or a hyphen.
pub fn needs_quoting(name: &str) -> bool {
    name.contains('`') || name.contains('-')
}

/// Wrap `name` in back-ticks, doubling any back-tick inside it.
pub fn quote(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('`');
    for ch in name.chars() {
        if ch == '`' {
            quoted.push('`');
        }
        quoted.push(ch);
    }
    quoted.push('`');
    quoted
}

/// Strip surrounding back-ticks and collapse doubled ones.
///
/// Text that is not back-tick delimited (or shorter than two characters) is
/// returned unchanged.
pub fn unquote(text: &str) -> Cow<'_, str> {
    if text.len() >= 2 && text.starts_with('`') && text.ends_with('`') {
        Cow::Owned(text[1..text.len() - 1].replace("``", "`"))
    } else {
        Cow::Borrowed(text)
    }
}

static BARE_CONTIGUOUS_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.*%:@+\-]+$").expect("contiguous text regex is valid")
});

static BARE_PATTERN_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_]*|@[A-Za-z0-9_]+)$")
        .expect("pattern literal regex is valid")
});

/// True when an index pattern or enrich policy can be written without
/// double quotes and still read back as one run of touching tokens.
pub fn is_bare_index_text(text: &str) -> bool {
    BARE_CONTIGUOUS_TEXT.is_match(text) && !Keyword::from_word(text).is_some_and(is_reserved)
}

/// True when a literal piece of a name pattern can be written without
/// back-ticks. `alone` marks a piece that makes up a whole segment, where a
/// reserved word would not be accepted.
pub fn is_bare_pattern_literal(text: &str, alone: bool) -> bool {
    BARE_PATTERN_LITERAL.is_match(text)
        && !(alone && Keyword::from_word(text).is_some_and(is_reserved))
}

/// Quote `name` when printing it bare would not read back as the same
/// identifier.
pub fn quote_if_needed(name: &str) -> Cow<'_, str> {
    if needs_quoting(name) || !is_valid_unquoted_identifier(name) {
        Cow::Owned(quote(name))
    } else {
        Cow::Borrowed(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_lookup_prefers_full_match() {
        let join = find_command(PROCESSING_COMMANDS, Keyword::Lookup, Some(Keyword::Join));
        assert_eq!(join.map(|spec| spec.syntax), Some("LOOKUP JOIN"));

        let lookup = find_command(PROCESSING_COMMANDS, Keyword::Lookup, Some(Keyword::On));
        assert_eq!(lookup.map(|spec| spec.syntax), Some("LOOKUP"));
        assert_eq!(lookup.map(|spec| spec.availability), Some(Availability::Experimental));

        let show = find_command(SOURCE_COMMANDS, Keyword::Show, None);
        assert_eq!(show.map(|spec| spec.syntax), Some("SHOW INFO"));

        assert!(find_command(SOURCE_COMMANDS, Keyword::Eval, None).is_none());
    }

    #[test]
    fn every_command_is_found_under_its_own_words() {
        for table in [SOURCE_COMMANDS, PROCESSING_COMMANDS] {
            for spec in table {
                let mut words = spec.syntax.split(' ').map(Keyword::from_word);
                let first = words.next().flatten().unwrap();
                let second = words.next().flatten();
                let found = find_command(table, first, second).unwrap();
                assert_eq!(found.syntax, spec.syntax);
            }
        }
    }

    #[test]
    fn quoting_predicate() {
        assert!(needs_quoting("first-name"));
        assert!(needs_quoting("a`b"));
        assert!(!needs_quoting("first_name"));
        assert!(!needs_quoting("with space"));
    }

    #[test]
    fn quote_doubles_backticks() {
        assert_eq!(quote("a`b"), "`a``b`");
        assert_eq!(quote("x-y"), "`x-y`");
        assert_eq!(quote(""), "``");
    }

    #[test]
    fn unquote_only_delimited_text() {
        assert_eq!(unquote("`a``b`"), "a`b");
        assert_eq!(unquote("``"), "");
        assert_eq!(unquote("`"), "`");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("`half"), "`half");
    }

    #[test]
    fn quote_unquote_round_trip() {
        for name in ["a-b", "`", "``", "x`-`y", "-", "a``b"] {
            assert_eq!(unquote(&quote(name)), name);
        }
    }

    #[test]
    fn unquoted_identifier_shape() {
        assert!(is_valid_unquoted_identifier("emp_no"));
        assert!(is_valid_unquoted_identifier("@timestamp"));
        assert!(is_valid_unquoted_identifier("_id"));
        assert!(is_valid_unquoted_identifier("limit"));
        assert!(!is_valid_unquoted_identifier("_"));
        assert!(!is_valid_unquoted_identifier("1abc"));
        assert!(!is_valid_unquoted_identifier("by"));
        assert!(!is_valid_unquoted_identifier("with space"));
    }

    #[test]
    fn quote_if_needed_covers_reserved_words() {
        assert_eq!(quote_if_needed("name"), "name");
        assert_eq!(quote_if_needed("NOT"), "`NOT`");
        assert_eq!(quote_if_needed("a.b"), "`a.b`");
    }

    #[test]
    fn bare_index_text() {
        assert!(is_bare_index_text("logs-*"));
        assert!(is_bare_index_text("remote:logs-2024.01.01::failures"));
        assert!(!is_bare_index_text("with space"));
        assert!(!is_bare_index_text("<logs-{now/d}>"));
        assert!(!is_bare_index_text(""));
        assert!(!is_bare_index_text("metadata"));
    }

    #[test]
    fn bare_pattern_literal() {
        assert!(is_bare_pattern_literal("first_", false));
        assert!(is_bare_pattern_literal("by", false));
        assert!(!is_bare_pattern_literal("by", true));
        assert!(!is_bare_pattern_literal("a-b", false));
        assert!(!is_bare_pattern_literal("1e5", false));
        assert!(!is_bare_pattern_literal("", true));
    }

    #[test]
    fn experimental_commands_hidden_by_default() {
        let stable: Vec<_> = processing_commands(false).collect();
        assert!(stable.contains(&"LOOKUP JOIN"));
        assert!(!stable.contains(&"LOOKUP"));
        assert!(!stable.contains(&"MMR"));

        let all: Vec<_> = processing_commands(true).collect();
        assert!(all.contains(&"INSIST"));
        assert!(source_commands(true).any(|c| c == "EXPLAIN"));
        assert!(!source_commands(false).any(|c| c == "EXPLAIN"));
    }
}
