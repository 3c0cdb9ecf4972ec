use tracing::trace;

use super::{Parser, Result};
use crate::ast::{ForeignQuery, PromqlCommand, PromqlParam, PromqlValue, Token, TokenKind};
use crate::error::ParseError;

impl Parser {
    /// `PROMQL [name = value]* [target =] ( body )`
    pub(super) fn parse_promql(&mut self) -> Result<PromqlCommand> {
        let mut params = Vec::new();
        let mut target = None;

        while Self::is_identifier(self.peek()) && self.peek_nth(1) == &TokenKind::Assign {
            let name = self.parse_identifier()?;
            self.advance();
            if self.check(&TokenKind::LParen) {
                target = Some(name);
                break;
            }
            let value = self.parse_promql_value()?;
            params.push(PromqlParam { name, value });
        }

        let query = self.parse_foreign_body()?;
        Ok(PromqlCommand {
            params,
            target,
            query,
        })
    }

    fn parse_promql_value(&mut self) -> Result<PromqlValue> {
        match self.peek() {
            TokenKind::String(value) => {
                let value = value.clone();
                self.advance();
                Ok(PromqlValue::String(value))
            }
            TokenKind::Param | TokenKind::NamedParam(_) => {
                let token = self.advance();
                Ok(PromqlValue::Parameter(Self::parameter(&token.kind)))
            }
            _ => Ok(PromqlValue::Text(
                self.parse_contiguous_text("parameter value")?,
            )),
        }
    }

    /// Raw text between a `(` and its matching `)`. Nothing inside is
    /// interpreted beyond keeping parentheses balanced. A `#` comment is a
    /// single token, so quotes and parentheses after it never count.
    pub(super) fn parse_foreign_body(&mut self) -> Result<ForeignQuery> {
        let open = self.expect(&TokenKind::LParen, "'('")?;
        let close = self.skip_balanced()?;
        let text = self.source[open.span.end..close.span.start].to_string();
        trace!(bytes = text.len(), line = open.position.line, "captured foreign query");
        Ok(ForeignQuery { text })
    }

    // Consume up to and including the `)` closing an already-consumed `(`.
    fn skip_balanced(&mut self) -> Result<Token> {
        let mut depth = 0usize;
        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::Eof => return Err(ParseError::unexpected(&token, "')'")),
                TokenKind::LParen => {
                    depth += 1;
                    if self.depth + depth > self.config.max_depth {
                        return Err(ParseError::depth_exceeded(&token, self.config.max_depth));
                    }
                }
                TokenKind::RParen if depth == 0 => return Ok(token),
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
        }
    }
}
