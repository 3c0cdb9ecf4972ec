use super::{Parser, Result};
use crate::ast::{
    IndexPattern, NamePattern, PatternPart, PatternSegment, QualifiedName, Qualifier, Segment,
    Token, TokenKind,
};
use crate::error::ParseError;
use crate::grammar;

impl Parser {
    /// Identifier text. Keywords keep the spelling they were written with.
    pub(super) fn parse_identifier(&mut self) -> Result<String> {
        if !Self::is_identifier(self.peek()) {
            return self.unexpected("identifier");
        }
        let token = self.advance();
        Ok(identifier_text(&token))
    }

    pub(super) fn parse_identifier_or_parameter(&mut self) -> Result<Segment> {
        match self.peek() {
            TokenKind::Param
            | TokenKind::NamedParam(_)
            | TokenKind::DoubleParam
            | TokenKind::NamedDoubleParam(_) => {
                let token = self.advance();
                Ok(Self::parameter_segment(&token.kind))
            }
            _ => Ok(Segment::Identifier(self.parse_identifier()?)),
        }
    }

    /// Index just past a qualified name starting `offset` tokens ahead, or
    /// `None` when no name starts there.
    pub(super) fn scan_qualified_name(&self, offset: usize) -> Option<usize> {
        let mut i = offset;
        if self.config.experimental && self.at_bracket_qualifier_at(i) {
            return self.scan_bracketed_name(i);
        }
        loop {
            if !is_name_segment(self.peek_nth(i)) {
                return None;
            }
            i += 1;
            if self.peek_nth(i) != &TokenKind::Dot {
                return Some(i);
            }
            i += 1;
        }
    }

    // `[qualifier].[a.b]` spans from `[` to the closing `]`.
    fn scan_bracketed_name(&self, offset: usize) -> Option<usize> {
        let mut i = offset + 1;
        if self.peek_nth(i) != &TokenKind::RBracket {
            i += 1;
        }
        i += 3;
        loop {
            if !is_name_segment(self.peek_nth(i)) {
                return None;
            }
            i += 1;
            match self.peek_nth(i) {
                TokenKind::Dot => i += 1,
                TokenKind::RBracket => return Some(i + 1),
                _ => return None,
            }
        }
    }

    /// `[qualifier].[` ahead, experimental only.
    pub(super) fn at_bracket_qualifier(&self) -> bool {
        self.config.experimental && self.at_bracket_qualifier_at(0)
    }

    fn at_bracket_qualifier_at(&self, offset: usize) -> bool {
        if self.peek_nth(offset) != &TokenKind::LBracket {
            return false;
        }
        let mut i = offset + 1;
        if Self::is_identifier(self.peek_nth(i)) {
            i += 1;
        }
        self.peek_nth(i) == &TokenKind::RBracket
            && self.peek_nth(i + 1) == &TokenKind::Dot
            && self.peek_nth(i + 2) == &TokenKind::LBracket
    }

    fn parse_bracket_qualifier(&mut self) -> Result<Option<Qualifier>> {
        if !self.at_bracket_qualifier() {
            return Ok(None);
        }
        self.expect(&TokenKind::LBracket, "'['")?;
        let name = if self.check(&TokenKind::RBracket) {
            None
        } else {
            Some(self.parse_identifier()?)
        };
        self.expect(&TokenKind::RBracket, "']'")?;
        self.expect(&TokenKind::Dot, "'.'")?;
        self.expect(&TokenKind::LBracket, "'['")?;
        Ok(Some(Qualifier { name }))
    }

    /// `a.b.c`, with parameters allowed as segments.
    pub(super) fn parse_qualified_name(&mut self) -> Result<QualifiedName> {
        let qualifier = self.parse_bracket_qualifier()?;
        let mut segments = vec![self.parse_identifier_or_parameter()?];
        while self.eat(&TokenKind::Dot) {
            segments.push(self.parse_identifier_or_parameter()?);
        }
        if qualifier.is_some() {
            self.expect(&TokenKind::RBracket, "']'")?;
        }
        Ok(QualifiedName {
            qualifier,
            segments,
        })
    }

    /// Dotted name whose unquoted segments may contain `*`.
    pub(super) fn parse_name_pattern(&mut self) -> Result<NamePattern> {
        let qualifier = self.parse_bracket_qualifier()?;
        let mut segments = vec![self.parse_pattern_segment()?];
        while self.eat(&TokenKind::Dot) {
            segments.push(self.parse_pattern_segment()?);
        }
        if qualifier.is_some() {
            self.expect(&TokenKind::RBracket, "']'")?;
        }
        Ok(NamePattern {
            qualifier,
            segments,
        })
    }

    // One segment is a run of touching words, stars and back-ticked names:
    // `first_*`, `*name`, `a*`.
    fn parse_pattern_segment(&mut self) -> Result<PatternSegment> {
        match self.peek() {
            TokenKind::Param
            | TokenKind::NamedParam(_)
            | TokenKind::DoubleParam
            | TokenKind::NamedDoubleParam(_) => {
                let token = self.advance();
                let parameter = Self::parameter(&token.kind);
                return Ok(match token.kind {
                    TokenKind::DoubleParam | TokenKind::NamedDoubleParam(_) => {
                        PatternSegment::DoubleParam(parameter)
                    }
                    _ => PatternSegment::Param(parameter),
                });
            }
            kind if is_pattern_part(kind) => {}
            _ => return self.unexpected("identifier pattern"),
        }

        let first = self.advance();
        if is_lone_reserved_word(&first, self.current(), is_pattern_part) {
            return Err(ParseError::unexpected(&first, "identifier pattern"));
        }

        let mut parts = Vec::new();
        push_pattern_part(&mut parts, &first);
        let mut last = first;
        while last.touches(self.current()) && is_pattern_part(self.peek()) {
            last = self.advance();
            push_pattern_part(&mut parts, &last);
        }
        Ok(PatternSegment::Pattern(parts))
    }

    /// Index pattern written bare (`logs-*`, `remote:idx::failures`) or as a
    /// quoted string.
    pub(super) fn parse_index_pattern(&mut self) -> Result<IndexPattern> {
        if let TokenKind::String(text) = self.peek() {
            let pattern = IndexPattern::parse(text);
            self.advance();
            return Ok(pattern);
        }
        let text = self.parse_contiguous_text("index pattern")?;
        Ok(IndexPattern::parse(&text))
    }

    /// Source text of a run of touching tokens, as used by unquoted index
    /// patterns, enrich policies and PromQL parameter values. Whitespace,
    /// commas, pipes, parentheses, brackets, strings and `=` end the run.
    pub(super) fn parse_contiguous_text(&mut self, expected: &str) -> Result<String> {
        if !is_contiguous_part(self.peek()) {
            return self.unexpected(expected);
        }
        let first = self.advance();
        if is_lone_reserved_word(&first, self.current(), is_contiguous_part) {
            return Err(ParseError::unexpected(&first, expected));
        }

        let start = first.span.start;
        let mut last = first;
        while last.touches(self.current()) && is_contiguous_part(self.peek()) {
            last = self.advance();
        }
        Ok(self.source[start..last.span.end].to_string())
    }
}

fn identifier_text(token: &Token) -> String {
    match &token.kind {
        TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => name.clone(),
        _ => token.text.clone(),
    }
}

fn is_name_segment(kind: &TokenKind) -> bool {
    Parser::is_identifier(kind)
        || matches!(
            kind,
            TokenKind::Param
                | TokenKind::NamedParam(_)
                | TokenKind::DoubleParam
                | TokenKind::NamedDoubleParam(_)
        )
}

fn is_pattern_part(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier(_)
            | TokenKind::QuotedIdentifier(_)
            | TokenKind::Keyword(_)
            | TokenKind::Integer(_)
            | TokenKind::Star
    )
}

fn is_contiguous_part(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier(_)
            | TokenKind::Keyword(_)
            | TokenKind::Integer(_)
            | TokenKind::Decimal(_)
            | TokenKind::Star
            | TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Percent
            | TokenKind::Slash
            | TokenKind::Dot
            | TokenKind::Colon
            | TokenKind::CastOp
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LBrace
            | TokenKind::RBrace
            | TokenKind::Other(_)
    )
}

// A reserved keyword standing alone is never a name: `KEEP by` fails, but
// `KEEP by_*` does not.
fn is_lone_reserved_word(token: &Token, next: &Token, glues: fn(&TokenKind) -> bool) -> bool {
    let TokenKind::Keyword(keyword) = token.kind else {
        return false;
    };
    grammar::is_reserved(keyword) && !(token.touches(next) && glues(&next.kind))
}

fn push_pattern_part(parts: &mut Vec<PatternPart>, token: &Token) {
    let text = match &token.kind {
        TokenKind::Star => {
            parts.push(PatternPart::Wildcard);
            return;
        }
        TokenKind::QuotedIdentifier(name) => name.as_str(),
        _ => token.text.as_str(),
    };
    match parts.last_mut() {
        Some(PatternPart::Literal(previous)) => previous.push_str(text),
        _ => parts.push(PatternPart::Literal(text.to_string())),
    }
}
