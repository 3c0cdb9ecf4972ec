//! Recursive-descent parser from tokens to [`Statement`].
//!
//! The parser reads the whole token stream up front, then walks it with
//! bounded lookahead. Left-recursive grammar rules are loops keyed by binding
//! power, and commands are looked up in the [`grammar`] command tables,
//! whose availability column decides whether an experimental command is
//! switched on by [`ParserConfig::experimental`].
//!
//! Submodules add the grammar for each area:
//!
//! - `expressions` - boolean, predicate, arithmetic and primary expressions
//! - `names` - qualified names, name patterns, index patterns
//! - `commands` - argument grammars of every command
//! - `foreign` - verbatim capture of embedded PromQL bodies

mod commands;
mod expressions;
mod foreign;
mod names;

use tracing::{debug, trace};

use crate::ast::{
    Expr, JoinKind, Keyword, MapValue, ProcessingCommand, Query, Setting, SourceCommand, Statement,
    Token, TokenKind,
};
use crate::config::ParserConfig;
use crate::error::ParseError;
use crate::grammar::{self, CommandSpec, PROCESSING_COMMANDS, SOURCE_COMMANDS};
use crate::lexer::Lexer;

pub type Result<T> = std::result::Result<T, ParseError>;

pub struct Parser {
    source: String,
    tokens: Vec<Token>,
    pos: usize,
    config: ParserConfig,
    depth: usize,
}

impl Parser {
    /// Tokenize the lexer's input. Lexical errors surface here.
    pub fn new(mut lexer: Lexer, config: ParserConfig) -> Result<Self> {
        let tokens = lexer.tokenize()?;
        Ok(Parser {
            source: lexer.into_source(),
            tokens,
            pos: 0,
            config,
            depth: 0,
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse `SET` settings followed by one query, up to end of input.
    pub fn parse_statement(mut self) -> Result<Statement> {
        let mut settings = Vec::new();
        while self.check_kw(Keyword::Set) {
            settings.push(self.parse_setting()?);
        }

        let query = self.parse_query()?;
        self.expect_end()?;

        debug!(
            commands = query.len(),
            settings = settings.len(),
            "parsed statement"
        );
        Ok(Statement { settings, query })
    }

    /// Parse a single boolean expression, up to end of input.
    pub fn parse_expression(mut self) -> Result<Expr> {
        let expr = self.parse_boolean_expression()?;
        if !self.at_eof() {
            return Err(ParseError::unexpected(self.current(), "<EOF>"));
        }
        Ok(expr)
    }

    // -----------------------------------------------------------------------
    // Token navigation
    // -----------------------------------------------------------------------

    fn current(&self) -> &Token {
        self.token_at(0)
    }

    // The stream always ends with Eof, so looking past the end yields it.
    fn token_at(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        &self.token_at(n).kind
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn check_kw(&self, keyword: Keyword) -> bool {
        self.peek().is_keyword(keyword)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_kw(&mut self, keyword: Keyword) -> bool {
        if self.check_kw(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected(self.current(), expected))
        }
    }

    fn expect_kw(&mut self, keyword: Keyword) -> Result<Token> {
        if self.check_kw(keyword) {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected(
                self.current(),
                &format!("'{}'", keyword.as_str()),
            ))
        }
    }

    fn expect_end(&self) -> Result<()> {
        if self.at_eof() {
            Ok(())
        } else {
            Err(ParseError::unexpected(self.current(), "{<EOF>, '|'}"))
        }
    }

    fn unexpected<T>(&self, expected: &str) -> Result<T> {
        Err(ParseError::unexpected(self.current(), expected))
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.config.max_depth {
            return Err(ParseError::depth_exceeded(
                self.current(),
                self.config.max_depth,
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// `element (, element)*`. A trailing comma fails on the missing element.
    fn parse_comma_sep<T>(&mut self, f: fn(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let mut items = vec![f(self)?];
        while self.eat(&TokenKind::Comma) {
            items.push(f(self)?);
        }
        Ok(items)
    }

    /// A word usable as an identifier: unquoted, back-ticked, or a keyword
    /// that is not reserved.
    fn is_identifier(kind: &TokenKind) -> bool {
        match kind {
            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_) => true,
            TokenKind::Keyword(keyword) => !grammar::is_reserved(*keyword),
            _ => false,
        }
    }

    /// True for tokens that end the current command.
    fn at_command_end(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Pipe | TokenKind::RParen | TokenKind::Eof
        )
    }

    // -----------------------------------------------------------------------
    // Statement and query
    // -----------------------------------------------------------------------

    fn parse_setting(&mut self) -> Result<Setting> {
        self.expect_kw(Keyword::Set)?;
        let name = self.parse_identifier()?;
        self.expect(&TokenKind::Assign, "'='")?;
        let value = if self.check(&TokenKind::LBrace) {
            MapValue::Map(self.parse_map_expression()?)
        } else {
            MapValue::Literal(self.parse_constant()?)
        };
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(Setting { name, value })
    }

    /// Source command, then one processing command per `|`.
    fn parse_query(&mut self) -> Result<Query> {
        let source = self.parse_source_command()?;
        let mut query = Query::new(source);
        while self.eat(&TokenKind::Pipe) {
            query.pipeline.push(self.parse_processing_command()?);
        }
        Ok(query)
    }

    fn parse_source_command(&mut self) -> Result<SourceCommand> {
        let token = self.current().clone();
        trace!(command = %token.text, line = token.position.line, "source command");

        let keyword = self.command_keyword(&token, SOURCE_COMMANDS)?;
        match keyword {
            Keyword::From => {
                self.advance();
                Ok(SourceCommand::From(self.parse_from_arguments()?))
            }
            Keyword::Ts => {
                self.advance();
                Ok(SourceCommand::TimeSeries(self.parse_from_arguments()?))
            }
            Keyword::Row => {
                self.advance();
                Ok(SourceCommand::Row(self.parse_fields()?))
            }
            Keyword::Show => {
                self.advance();
                self.expect_kw(Keyword::Info)?;
                Ok(SourceCommand::ShowInfo)
            }
            Keyword::Promql => {
                self.advance();
                Ok(SourceCommand::Promql(self.parse_promql()?))
            }
            Keyword::Explain => {
                self.advance();
                Ok(SourceCommand::Explain(Box::new(self.parse_explain()?)))
            }
            Keyword::External => {
                self.advance();
                Ok(SourceCommand::External(self.parse_external()?))
            }
            _ => Err(ParseError::no_viable_alternative(&token)),
        }
    }

    fn parse_processing_command(&mut self) -> Result<ProcessingCommand> {
        let token = self.current().clone();
        trace!(command = %token.text, line = token.position.line, "processing command");

        let keyword = self.command_keyword(&token, PROCESSING_COMMANDS)?;
        let command = match keyword {
            Keyword::Eval => {
                self.advance();
                ProcessingCommand::Eval(self.parse_fields()?)
            }
            Keyword::Where => {
                self.advance();
                ProcessingCommand::Where(self.parse_boolean_expression()?)
            }
            Keyword::Keep => {
                self.advance();
                ProcessingCommand::Keep(self.parse_comma_sep(Self::parse_name_pattern)?)
            }
            Keyword::Drop => {
                self.advance();
                ProcessingCommand::Drop(self.parse_comma_sep(Self::parse_name_pattern)?)
            }
            Keyword::Limit => {
                self.advance();
                ProcessingCommand::Limit(self.parse_constant()?)
            }
            Keyword::Sample => {
                self.advance();
                ProcessingCommand::Sample(self.parse_constant()?)
            }
            Keyword::Stats => {
                self.advance();
                ProcessingCommand::Stats(self.parse_stats()?)
            }
            Keyword::Inline => {
                self.advance();
                self.expect_kw(Keyword::Stats)?;
                ProcessingCommand::InlineStats(self.parse_stats()?)
            }
            Keyword::InlineStats => {
                self.advance();
                ProcessingCommand::InlineStats(self.parse_stats()?)
            }
            Keyword::Sort => {
                self.advance();
                ProcessingCommand::Sort(self.parse_comma_sep(Self::parse_order)?)
            }
            Keyword::Rename => {
                self.advance();
                ProcessingCommand::Rename(self.parse_comma_sep(Self::parse_rename_clause)?)
            }
            Keyword::Dissect => {
                self.advance();
                ProcessingCommand::Dissect(self.parse_dissect()?)
            }
            Keyword::Grok => {
                self.advance();
                ProcessingCommand::Grok(self.parse_grok()?)
            }
            Keyword::Enrich => {
                self.advance();
                ProcessingCommand::Enrich(self.parse_enrich()?)
            }
            Keyword::MvExpand => {
                self.advance();
                ProcessingCommand::MvExpand(self.parse_qualified_name()?)
            }
            Keyword::Lookup => {
                self.advance();
                if self.eat_kw(Keyword::Join) {
                    ProcessingCommand::Join(self.parse_join(JoinKind::Lookup)?)
                } else {
                    ProcessingCommand::Lookup(self.parse_lookup()?)
                }
            }
            Keyword::Left | Keyword::Right | Keyword::Full => {
                self.advance();
                self.expect_kw(Keyword::Join)?;
                let kind = match keyword {
                    Keyword::Left => JoinKind::Left,
                    Keyword::Right => JoinKind::Right,
                    _ => JoinKind::Full,
                };
                ProcessingCommand::Join(self.parse_join(kind)?)
            }
            Keyword::ChangePoint => {
                self.advance();
                ProcessingCommand::ChangePoint(self.parse_change_point()?)
            }
            Keyword::Completion => {
                self.advance();
                ProcessingCommand::Completion(self.parse_completion()?)
            }
            Keyword::Fork => {
                self.advance();
                ProcessingCommand::Fork(self.parse_fork()?)
            }
            Keyword::Rerank => {
                self.advance();
                ProcessingCommand::Rerank(self.parse_rerank()?)
            }
            Keyword::Fuse => {
                self.advance();
                ProcessingCommand::Fuse(self.parse_fuse()?)
            }
            Keyword::UriParts => {
                self.advance();
                ProcessingCommand::UriParts(self.parse_derived_field()?)
            }
            Keyword::RegisteredDomain => {
                self.advance();
                ProcessingCommand::RegisteredDomain(self.parse_derived_field()?)
            }
            Keyword::MetricsInfo => {
                self.advance();
                ProcessingCommand::MetricsInfo
            }
            Keyword::Insist => {
                self.advance();
                ProcessingCommand::Insist(self.parse_comma_sep(Self::parse_name_pattern)?)
            }
            Keyword::Mmr => {
                self.advance();
                ProcessingCommand::Mmr(self.parse_mmr()?)
            }
            _ => return Err(ParseError::no_viable_alternative(&token)),
        };
        Ok(command)
    }

    // Leading keyword of a command listed in `table` and enabled under the
    // current configuration.
    fn command_keyword(&self, token: &Token, table: &'static [CommandSpec]) -> Result<Keyword> {
        let TokenKind::Keyword(keyword) = token.kind else {
            return Err(ParseError::no_viable_alternative(token));
        };
        let second = match self.peek_nth(1) {
            TokenKind::Keyword(next) => Some(*next),
            _ => None,
        };
        let Some(spec) = grammar::find_command(table, keyword, second) else {
            return Err(ParseError::no_viable_alternative(token));
        };
        if !spec.availability.is_enabled(self.config.experimental) {
            return Err(ParseError::predicate_failed(token));
        }
        Ok(keyword)
    }
}
