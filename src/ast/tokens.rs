use std::fmt;

/// Byte range of a token in the original query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

/// 1-based line/column of a token start, plus its byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single token produced by the lexer.
///
/// `text` is the exact source slice the token was read from; `kind` carries
/// the decoded value (unescaped string, unquoted identifier, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    pub position: Position,
}

impl Token {
    /// True when `other` starts exactly where this token ends (no whitespace
    /// or comment in between).
    pub fn touches(&self, other: &Token) -> bool {
        self.span.end == other.span.start
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Words
    /// A recognised keyword, matched case-insensitively.
    ///
    /// Non-reserved keywords may still be used as identifiers; the parser
    /// decides from context.
    Keyword(Keyword),

    /// Unquoted identifier
    ///
    /// # Examples
    /// ```text
    /// emp_no
    /// @timestamp
    /// _index
    /// ```
    Identifier(String),

    /// Back-tick quoted identifier, already unquoted
    ///
    /// # Examples
    /// ```text
    /// `first-name`     // Identifier "first-name"
    /// `a``b`           // Identifier "a`b"
    /// ```
    QuotedIdentifier(String),

    // Literals
    /// Double-quoted or triple-quoted string, escapes already resolved
    ///
    /// # Examples
    /// ```text
    /// "hello\tworld"
    /// """raw "text" here"""
    /// ```
    String(String),

    /// Single-quoted string. Only meaningful inside a foreign query body.
    SingleQuotedString(String),

    /// Unsigned integer literal, kept as its digits
    Integer(String),

    /// Unsigned decimal literal, kept as written (`1.5`, `.5`, `1e10`)
    Decimal(String),

    // Parameters
    /// `?`
    Param,
    /// `?name` or `?1`
    NamedParam(String),
    /// `??`
    DoubleParam,
    /// `??name` or `??1`
    NamedDoubleParam(String),

    // Operators
    /// `|`
    Pipe,
    /// `=`
    Assign,
    /// `==`
    Eq,
    /// `=~`
    CiEq,
    /// `!=`
    Neq,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `::`
    CastOp,

    // Delimiters
    Dot,
    Comma,
    Colon,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    /// `#` up to the end of its line. PromQL comment syntax; legal only
    /// inside a foreign query body.
    HashComment,

    /// Any character the language itself has no use for (`$`, `~`, ...).
    ///
    /// Legal only inside a foreign query body.
    Other(char),

    /// End of input
    Eof,
}

impl TokenKind {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == keyword)
    }

    /// Short human-readable description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Keyword(_) => "keyword",
            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_) => "identifier",
            TokenKind::String(_) => "string",
            TokenKind::SingleQuotedString(_) => "single-quoted string",
            TokenKind::Integer(_) => "integer",
            TokenKind::Decimal(_) => "decimal",
            TokenKind::Param
            | TokenKind::NamedParam(_)
            | TokenKind::DoubleParam
            | TokenKind::NamedDoubleParam(_) => "parameter",
            TokenKind::HashComment => "comment",
            TokenKind::Eof => "<EOF>",
            _ => "symbol",
        }
    }
}

/// Keywords known to the grammar.
///
/// Matching is case-insensitive: `from`, `FROM` and `From` are all
/// [`Keyword::From`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Source commands
    From,
    Row,
    Show,
    Info,
    Ts,
    Promql,
    Explain,
    External,

    // Processing commands
    Eval,
    Where,
    Keep,
    Limit,
    Stats,
    Sort,
    Drop,
    Rename,
    Dissect,
    Grok,
    Enrich,
    MvExpand,
    Lookup,
    Join,
    Left,
    Right,
    Full,
    ChangePoint,
    Completion,
    Sample,
    Fork,
    Rerank,
    Inline,
    InlineStats,
    Fuse,
    UriParts,
    MetricsInfo,
    RegisteredDomain,
    Insist,
    Mmr,

    // Statement
    Set,

    // Clauses
    By,
    As,
    On,
    With,
    Metadata,
    Asc,
    Desc,
    Nulls,
    First,
    Last,
    Score,
    Key,
    Group,

    // Expressions
    And,
    Or,
    Not,
    In,
    Like,
    Rlike,
    Is,
    Null,
    True,
    False,
}

impl Keyword {
    /// Look a word up, ignoring case.
    pub fn from_word(word: &str) -> Option<Keyword> {
        let upper = word.to_ascii_uppercase();
        let keyword = match upper.as_str() {
            "FROM" => Keyword::From,
            "ROW" => Keyword::Row,
            "SHOW" => Keyword::Show,
            "INFO" => Keyword::Info,
            "TS" => Keyword::Ts,
            "PROMQL" => Keyword::Promql,
            "EXPLAIN" => Keyword::Explain,
            "EXTERNAL" => Keyword::External,
            "EVAL" => Keyword::Eval,
            "WHERE" => Keyword::Where,
            "KEEP" => Keyword::Keep,
            "LIMIT" => Keyword::Limit,
            "STATS" => Keyword::Stats,
            "SORT" => Keyword::Sort,
            "DROP" => Keyword::Drop,
            "RENAME" => Keyword::Rename,
            "DISSECT" => Keyword::Dissect,
            "GROK" => Keyword::Grok,
            "ENRICH" => Keyword::Enrich,
            "MV_EXPAND" => Keyword::MvExpand,
            "LOOKUP" => Keyword::Lookup,
            "JOIN" => Keyword::Join,
            "LEFT" => Keyword::Left,
            "RIGHT" => Keyword::Right,
            "FULL" => Keyword::Full,
            "CHANGE_POINT" => Keyword::ChangePoint,
            "COMPLETION" => Keyword::Completion,
            "SAMPLE" => Keyword::Sample,
            "FORK" => Keyword::Fork,
            "RERANK" => Keyword::Rerank,
            "INLINE" => Keyword::Inline,
            "INLINESTATS" => Keyword::InlineStats,
            "FUSE" => Keyword::Fuse,
            "URI_PARTS" => Keyword::UriParts,
            "METRICS_INFO" => Keyword::MetricsInfo,
            "REGISTERED_DOMAIN" => Keyword::RegisteredDomain,
            "INSIST" => Keyword::Insist,
            "MMR" => Keyword::Mmr,
            "SET" => Keyword::Set,
            "BY" => Keyword::By,
            "AS" => Keyword::As,
            "ON" => Keyword::On,
            "WITH" => Keyword::With,
            "METADATA" => Keyword::Metadata,
            "ASC" => Keyword::Asc,
            "DESC" => Keyword::Desc,
            "NULLS" => Keyword::Nulls,
            "FIRST" => Keyword::First,
            "LAST" => Keyword::Last,
            "SCORE" => Keyword::Score,
            "KEY" => Keyword::Key,
            "GROUP" => Keyword::Group,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "NOT" => Keyword::Not,
            "IN" => Keyword::In,
            "LIKE" => Keyword::Like,
            "RLIKE" => Keyword::Rlike,
            "IS" => Keyword::Is,
            "NULL" => Keyword::Null,
            "TRUE" => Keyword::True,
            "FALSE" => Keyword::False,
            _ => return None,
        };
        Some(keyword)
    }

    /// Canonical (upper-case) spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::From => "FROM",
            Keyword::Row => "ROW",
            Keyword::Show => "SHOW",
            Keyword::Info => "INFO",
            Keyword::Ts => "TS",
            Keyword::Promql => "PROMQL",
            Keyword::Explain => "EXPLAIN",
            Keyword::External => "EXTERNAL",
            Keyword::Eval => "EVAL",
            Keyword::Where => "WHERE",
            Keyword::Keep => "KEEP",
            Keyword::Limit => "LIMIT",
            Keyword::Stats => "STATS",
            Keyword::Sort => "SORT",
            Keyword::Drop => "DROP",
            Keyword::Rename => "RENAME",
            Keyword::Dissect => "DISSECT",
            Keyword::Grok => "GROK",
            Keyword::Enrich => "ENRICH",
            Keyword::MvExpand => "MV_EXPAND",
            Keyword::Lookup => "LOOKUP",
            Keyword::Join => "JOIN",
            Keyword::Left => "LEFT",
            Keyword::Right => "RIGHT",
            Keyword::Full => "FULL",
            Keyword::ChangePoint => "CHANGE_POINT",
            Keyword::Completion => "COMPLETION",
            Keyword::Sample => "SAMPLE",
            Keyword::Fork => "FORK",
            Keyword::Rerank => "RERANK",
            Keyword::Inline => "INLINE",
            Keyword::InlineStats => "INLINESTATS",
            Keyword::Fuse => "FUSE",
            Keyword::UriParts => "URI_PARTS",
            Keyword::MetricsInfo => "METRICS_INFO",
            Keyword::RegisteredDomain => "REGISTERED_DOMAIN",
            Keyword::Insist => "INSIST",
            Keyword::Mmr => "MMR",
            Keyword::Set => "SET",
            Keyword::By => "BY",
            Keyword::As => "AS",
            Keyword::On => "ON",
            Keyword::With => "WITH",
            Keyword::Metadata => "METADATA",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::Nulls => "NULLS",
            Keyword::First => "FIRST",
            Keyword::Last => "LAST",
            Keyword::Score => "SCORE",
            Keyword::Key => "KEY",
            Keyword::Group => "GROUP",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::In => "IN",
            Keyword::Like => "LIKE",
            Keyword::Rlike => "RLIKE",
            Keyword::Is => "IS",
            Keyword::Null => "NULL",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
