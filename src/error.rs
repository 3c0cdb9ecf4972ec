//! Parse errors.

use thiserror::Error;

use crate::ast::{Position, Token, TokenKind};

/// What went wrong, independent of where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorKind {
    /// A token is present but not valid at this position.
    UnexpectedToken,
    /// None of the alternatives of a dispatch table matched.
    NoViableAlternative,
    /// The only structural match is an experimental alternative and the
    /// experimental grammar is disabled. The message is the one the input
    /// would get if the alternative did not exist: "no viable alternative"
    /// for a command keyword, "mismatched input" inside a command.
    PredicateFailed,
    /// Input ended inside a string, quoted identifier, comment, list or
    /// foreign query body.
    UnterminatedConstruct,
    /// Nesting went past [`ParserConfig::max_depth`](crate::ParserConfig).
    DepthExceeded,
}

/// A positioned syntax error. Parsing stops at the first one.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {}:{}: {}", .position.line, .position.column, .message)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub position: Position,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ErrorKind, position: Position, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            position,
            message: message.into(),
        }
    }

    /// `token` is not one of `expected`.
    pub fn unexpected(token: &Token, expected: &str) -> Self {
        let kind = if token.kind == TokenKind::Eof {
            ErrorKind::UnterminatedConstruct
        } else {
            ErrorKind::UnexpectedToken
        };
        Self::new(
            kind,
            token.position,
            format!("mismatched input '{}' expecting {}", token_text(token), expected),
        )
    }

    /// No dispatch table entry starts with `token`.
    pub fn no_viable_alternative(token: &Token) -> Self {
        Self::new(
            ErrorKind::NoViableAlternative,
            token.position,
            no_viable_message(token),
        )
    }

    /// `token` starts an experimental alternative that is switched off.
    pub fn predicate_failed(token: &Token) -> Self {
        Self::new(
            ErrorKind::PredicateFailed,
            token.position,
            no_viable_message(token),
        )
    }

    /// Same report as [`ParseError::unexpected`], flagged as a switched-off
    /// alternative.
    pub fn gated(token: &Token, expected: &str) -> Self {
        Self {
            kind: ErrorKind::PredicateFailed,
            ..Self::unexpected(token, expected)
        }
    }

    pub fn depth_exceeded(token: &Token, max_depth: usize) -> Self {
        Self::new(
            ErrorKind::DepthExceeded,
            token.position,
            format!("query nesting exceeds the maximum depth of {max_depth}"),
        )
    }

    /// True for both flavours of "nothing matched here".
    pub fn is_no_viable_alternative(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NoViableAlternative | ErrorKind::PredicateFailed
        )
    }
}

fn no_viable_message(token: &Token) -> String {
    format!("no viable alternative at input '{}'", token_text(token))
}

fn token_text(token: &Token) -> &str {
    if token.kind == TokenKind::Eof {
        "<EOF>"
    } else {
        &token.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Keyword, Span};

    fn token(kind: TokenKind, text: &str, column: u32) -> Token {
        Token {
            kind,
            text: text.to_string(),
            span: Span::new(0, text.len()),
            position: Position {
                line: 1,
                column,
                offset: 0,
            },
        }
    }

    #[test]
    fn test_error_display() {
        let err = ParseError::unexpected(&token(TokenKind::Comma, ",", 8), "identifier");
        assert_eq!(err.to_string(), "line 1:8: mismatched input ',' expecting identifier");
        assert_eq!(err.kind, ErrorKind::UnexpectedToken);
    }

    #[test]
    fn eof_is_unterminated() {
        let err = ParseError::unexpected(&token(TokenKind::Eof, "", 5), "')'");
        assert_eq!(err.kind, ErrorKind::UnterminatedConstruct);
        assert!(err.message.contains("<EOF>"));
    }

    #[test]
    fn gate_failure_reads_like_unknown_command() {
        let hidden = ParseError::predicate_failed(&token(
            TokenKind::Keyword(Keyword::Insist),
            "INSIST",
            3,
        ));
        let unknown = ParseError::no_viable_alternative(&token(
            TokenKind::Identifier("INSIST".into()),
            "INSIST",
            3,
        ));
        assert_eq!(hidden.to_string(), unknown.to_string());
        assert!(hidden.is_no_viable_alternative());
    }

    #[test]
    fn gated_token_reads_like_mismatch() {
        let paren = token(TokenKind::LParen, "(", 6);
        let gated = ParseError::gated(&paren, "index pattern");
        let plain = ParseError::unexpected(&paren, "index pattern");
        assert_eq!(gated.to_string(), plain.to_string());
        assert_eq!(gated.kind, ErrorKind::PredicateFailed);
    }
}
