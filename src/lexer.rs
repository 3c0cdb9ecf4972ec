//! Token source for query text.
//!
//! Turns UTF-8 text into [`Token`]s carrying their source slice, byte span and
//! 1-based line/column. Whitespace and `//` / `/* */` comments are skipped.
//! The lexer has no notion of context: whether a word is a keyword or an
//! identifier, and whether adjacent tokens form one index pattern, is left to
//! the parser.

use crate::ast::{Keyword, Position, Span, Token, TokenKind};
use crate::error::{ErrorKind, ParseError};
use crate::grammar;

pub struct Lexer {
    source: String,
    input: Vec<(usize, char)>,
    position: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            source: input.to_string(),
            input: input.char_indices().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }

    /// Read every remaining token. The last one is always [`TokenKind::Eof`].
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn current_char(&self) -> Option<char> {
        self.peek_char(0)
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).map(|(_, c)| *c)
    }

    fn previous_char(&self) -> Option<char> {
        self.position
            .checked_sub(1)
            .and_then(|i| self.input.get(i))
            .map(|(_, c)| *c)
    }

    fn byte_offset(&self) -> usize {
        self.input
            .get(self.position)
            .map_or(self.source.len(), |(offset, _)| *offset)
    }

    fn here(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.byte_offset(),
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), ParseError> {
        loop {
            match (self.current_char(), self.peek_char(1)) {
                (Some(ch), _) if ch.is_whitespace() => self.advance(),
                (Some('/'), Some('/')) => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                (Some('/'), Some('*')) => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    // Block comments nest: `/* a /* b */ c */` is one comment.
    fn skip_block_comment(&mut self) -> Result<(), ParseError> {
        let start = self.here();
        let mut depth = 0usize;
        loop {
            match (self.current_char(), self.peek_char(1)) {
                (Some('/'), Some('*')) => {
                    depth += 1;
                    self.advance_by(2);
                }
                (Some('*'), Some('/')) => {
                    depth -= 1;
                    self.advance_by(2);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                (Some(_), _) => self.advance(),
                (None, _) => {
                    return Err(ParseError::new(
                        ErrorKind::UnterminatedConstruct,
                        start,
                        "unterminated comment",
                    ));
                }
            }
        }
    }

    fn read_word(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_digits(&mut self) -> usize {
        let mut count = 0;
        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            count += 1;
        }
        count
    }

    fn read_string(&mut self, start: Position) -> Result<TokenKind, ParseError> {
        if self.peek_char(1) == Some('"') && self.peek_char(2) == Some('"') {
            return self.read_triple_quoted_string(start);
        }

        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(TokenKind::String(result));
                }
                '\\' => {
                    let escape = self.here();
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\\') => result.push('\\'),
                        Some(other) => {
                            return Err(ParseError::new(
                                ErrorKind::UnexpectedToken,
                                escape,
                                format!("invalid escape sequence '\\{other}'"),
                            ));
                        }
                        None => break,
                    }
                    self.advance();
                }
                '\n' | '\r' => break,
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(ParseError::new(
            ErrorKind::UnterminatedConstruct,
            start,
            "unterminated string literal",
        ))
    }

    // """...""" takes its content verbatim. Up to two extra quotes after the
    // closing delimiter belong to the content.
    fn read_triple_quoted_string(&mut self, start: Position) -> Result<TokenKind, ParseError> {
        self.advance_by(3);
        let mut result = String::new();

        while let Some(ch) = self.current_char() {
            if ch == '"' && self.peek_char(1) == Some('"') && self.peek_char(2) == Some('"') {
                self.advance_by(3);
                let mut extra = 0;
                while extra < 2 && self.current_char() == Some('"') {
                    result.push('"');
                    self.advance();
                    extra += 1;
                }
                return Ok(TokenKind::String(result));
            }
            result.push(ch);
            self.advance();
        }

        Err(ParseError::new(
            ErrorKind::UnterminatedConstruct,
            start,
            "unterminated string literal",
        ))
    }

    fn read_single_quoted_string(&mut self, start: Position) -> Result<TokenKind, ParseError> {
        let mut result = String::new();
        self.advance();

        while let Some(ch) = self.current_char() {
            match ch {
                '\'' => {
                    self.advance();
                    return Ok(TokenKind::SingleQuotedString(result));
                }
                '\\' => {
                    result.push(ch);
                    self.advance();
                    if let Some(escaped) = self.current_char() {
                        result.push(escaped);
                        self.advance();
                    }
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(ParseError::new(
            ErrorKind::UnterminatedConstruct,
            start,
            "unterminated string literal",
        ))
    }

    fn read_quoted_identifier(&mut self, start: Position) -> Result<(), ParseError> {
        self.advance();
        while let Some(ch) = self.current_char() {
            if ch == '`' {
                if self.peek_char(1) == Some('`') {
                    self.advance_by(2);
                    continue;
                }
                self.advance();
                return Ok(());
            }
            self.advance();
        }

        Err(ParseError::new(
            ErrorKind::UnterminatedConstruct,
            start,
            "unterminated quoted identifier",
        ))
    }

    // DIGIT+ [. DIGIT*] [EXPONENT] or . DIGIT+ [EXPONENT]
    fn read_number(&mut self) -> TokenKind {
        let start = self.byte_offset();
        let mut is_decimal = false;

        self.read_digits();
        if self.current_char() == Some('.') {
            is_decimal = true;
            self.advance();
            self.read_digits();
        }
        if self.at_exponent() {
            is_decimal = true;
            self.advance();
            if matches!(self.current_char(), Some('+') | Some('-')) {
                self.advance();
            }
            self.read_digits();
        }

        let text = self.source[start..self.byte_offset()].to_string();
        if is_decimal {
            TokenKind::Decimal(text)
        } else {
            TokenKind::Integer(text)
        }
    }

    fn at_exponent(&self) -> bool {
        if !matches!(self.current_char(), Some('e') | Some('E')) {
            return false;
        }
        match self.peek_char(1) {
            Some(c) if c.is_ascii_digit() => true,
            Some('+') | Some('-') => self.peek_char(2).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    // A leading `.5` is a number unless the dot hangs off a name (`a.5`).
    fn dot_starts_number(&self) -> bool {
        self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            && !self
                .previous_char()
                .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '`' | ')' | ']'))
    }

    fn read_parameter(&mut self) -> TokenKind {
        self.advance();
        let double = self.current_char() == Some('?');
        if double {
            self.advance();
        }

        let start = self.byte_offset();
        self.read_word();
        let name = &self.source[start..self.byte_offset()];

        match (double, name.is_empty()) {
            (false, true) => TokenKind::Param,
            (false, false) => TokenKind::NamedParam(name.to_string()),
            (true, true) => TokenKind::DoubleParam,
            (true, false) => TokenKind::NamedDoubleParam(name.to_string()),
        }
    }

    fn symbol(&mut self, kind: TokenKind, width: usize) -> TokenKind {
        self.advance_by(width);
        kind
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace_and_comments()?;

        let start = self.here();
        let kind = match self.current_char() {
            None => TokenKind::Eof,
            Some('"') => self.read_string(start)?,
            Some('\'') => self.read_single_quoted_string(start)?,
            Some('`') => {
                self.read_quoted_identifier(start)?;
                let raw = &self.source[start.offset..self.byte_offset()];
                TokenKind::QuotedIdentifier(grammar::unquote(raw).into_owned())
            }
            Some('?') => self.read_parameter(),
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some('.') if self.dot_starts_number() => self.read_number(),
            Some(ch)
                if ch.is_ascii_alphabetic()
                    || ch == '_'
                    || (ch == '@'
                        && self
                            .peek_char(1)
                            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')) =>
            {
                self.advance();
                self.read_word();
                let word = &self.source[start.offset..self.byte_offset()];
                match Keyword::from_word(word) {
                    Some(keyword) => TokenKind::Keyword(keyword),
                    None => TokenKind::Identifier(word.to_string()),
                }
            }
            Some('|') => self.symbol(TokenKind::Pipe, 1),
            Some('=') => match self.peek_char(1) {
                Some('=') => self.symbol(TokenKind::Eq, 2),
                Some('~') => self.symbol(TokenKind::CiEq, 2),
                _ => self.symbol(TokenKind::Assign, 1),
            },
            Some('!') if self.peek_char(1) == Some('=') => self.symbol(TokenKind::Neq, 2),
            Some('<') if self.peek_char(1) == Some('=') => self.symbol(TokenKind::Lte, 2),
            Some('<') => self.symbol(TokenKind::Lt, 1),
            Some('>') if self.peek_char(1) == Some('=') => self.symbol(TokenKind::Gte, 2),
            Some('>') => self.symbol(TokenKind::Gt, 1),
            Some(':') if self.peek_char(1) == Some(':') => self.symbol(TokenKind::CastOp, 2),
            Some(':') => self.symbol(TokenKind::Colon, 1),
            Some('+') => self.symbol(TokenKind::Plus, 1),
            Some('-') => self.symbol(TokenKind::Minus, 1),
            Some('*') => self.symbol(TokenKind::Star, 1),
            Some('/') => self.symbol(TokenKind::Slash, 1),
            Some('%') => self.symbol(TokenKind::Percent, 1),
            Some('.') => self.symbol(TokenKind::Dot, 1),
            Some(',') => self.symbol(TokenKind::Comma, 1),
            Some(';') => self.symbol(TokenKind::Semicolon, 1),
            Some('(') => self.symbol(TokenKind::LParen, 1),
            Some(')') => self.symbol(TokenKind::RParen, 1),
            Some('[') => self.symbol(TokenKind::LBracket, 1),
            Some(']') => self.symbol(TokenKind::RBracket, 1),
            Some('{') => self.symbol(TokenKind::LBrace, 1),
            Some('}') => self.symbol(TokenKind::RBrace, 1),
            Some('#') => {
                while self.current_char().is_some_and(|ch| ch != '\n') {
                    self.advance();
                }
                TokenKind::HashComment
            }
            Some(other) => self.symbol(TokenKind::Other(other), 1),
        };

        let end = self.byte_offset();
        Ok(Token {
            kind,
            text: self.source[start.offset..end].to_string(),
            span: Span::new(start.offset, end),
            position: start,
        })
    }
}
