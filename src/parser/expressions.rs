use super::{Parser, Result};
use crate::ast::{
    ArithmeticOp, ArrayLiteral, ComparisonOp, DataType, DecimalLiteral, Expr, FunctionArgs,
    FunctionCall, Keyword, Literal, LogicalOp, MapEntry, MapExpression, MapValue, Number, Parameter,
    PatternArg, Segment, StringOrParameter, TokenKind, UnaryOp,
};
use crate::error::{ErrorKind, ParseError};
use crate::grammar::precedence;

impl Parser {
    pub(super) fn parse_boolean_expression(&mut self) -> Result<Expr> {
        self.parse_boolean(0)
    }

    // Precedence climbing over NOT / AND / OR. Operators binding looser than
    // `min_power` are left for the caller.
    fn parse_boolean(&mut self, min_power: u8) -> Result<Expr> {
        let mut left = if self.check_kw(Keyword::Not) {
            self.advance();
            let operand = self.nested(|p| p.parse_boolean(precedence::NOT))?;
            Expr::not(operand)
        } else {
            self.parse_predicate()?
        };

        loop {
            let (op, power) = match self.peek() {
                TokenKind::Keyword(Keyword::And) => (LogicalOp::And, precedence::AND),
                TokenKind::Keyword(Keyword::Or) => (LogicalOp::Or, precedence::OR),
                _ => break,
            };
            if power < min_power {
                break;
            }
            self.advance();
            let right = self.parse_boolean(power + 1)?;
            left = Expr::logical(op, left, right);
        }
        Ok(left)
    }

    /// IN / LIKE / RLIKE / IS NULL on top of a value expression, or a match
    /// expression. Predicates do not chain.
    fn parse_predicate(&mut self) -> Result<Expr> {
        if self.at_match_expression() {
            return self.parse_match_expression();
        }

        let value = Box::new(self.parse_value_expression()?);
        let negated = self.check_kw(Keyword::Not)
            && matches!(
                self.peek_nth(1),
                TokenKind::Keyword(Keyword::In | Keyword::Like | Keyword::Rlike)
            );
        if negated {
            self.advance();
        }

        match self.peek() {
            TokenKind::Keyword(Keyword::In) => {
                self.advance();
                self.expect(&TokenKind::LParen, "'('")?;
                let list = self.parse_comma_sep(Self::parse_value_expression)?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(Expr::In {
                    negated,
                    value,
                    list,
                })
            }
            TokenKind::Keyword(Keyword::Like) => {
                self.advance();
                let pattern = self.parse_pattern_arg()?;
                Ok(Expr::Like {
                    negated,
                    value,
                    pattern,
                })
            }
            TokenKind::Keyword(Keyword::Rlike) => {
                self.advance();
                let pattern = self.parse_pattern_arg()?;
                Ok(Expr::Rlike {
                    negated,
                    value,
                    pattern,
                })
            }
            TokenKind::Keyword(Keyword::Is) => {
                self.advance();
                let negated = self.eat_kw(Keyword::Not);
                self.expect_kw(Keyword::Null)?;
                Ok(Expr::IsNull { negated, value })
            }
            _ => Ok(*value),
        }
    }

    fn parse_pattern_arg(&mut self) -> Result<PatternArg> {
        if self.eat(&TokenKind::LParen) {
            let list = self.parse_comma_sep(Self::parse_string_or_parameter)?;
            self.expect(&TokenKind::RParen, "')'")?;
            Ok(PatternArg::List(list))
        } else {
            Ok(PatternArg::Single(self.parse_string_or_parameter()?))
        }
    }

    pub(super) fn parse_string_or_parameter(&mut self) -> Result<StringOrParameter> {
        match self.peek() {
            TokenKind::String(value) => {
                let value = value.clone();
                self.advance();
                Ok(StringOrParameter::String(value))
            }
            TokenKind::Param | TokenKind::NamedParam(_) => {
                let token = self.advance();
                Ok(StringOrParameter::Parameter(Self::parameter(&token.kind)))
            }
            _ => self.unexpected("{string, parameter}"),
        }
    }

    // `name[::type] :` ahead, checked without consuming anything.
    fn at_match_expression(&self) -> bool {
        let Some(mut i) = self.scan_qualified_name(0) else {
            return false;
        };
        if self.peek_nth(i) == &TokenKind::CastOp {
            if !Self::is_identifier(self.peek_nth(i + 1)) {
                return false;
            }
            i += 2;
        }
        self.peek_nth(i) == &TokenKind::Colon
    }

    fn parse_match_expression(&mut self) -> Result<Expr> {
        let field = self.parse_qualified_name()?;
        let field_type = if self.eat(&TokenKind::CastOp) {
            Some(self.parse_data_type()?)
        } else {
            None
        };
        self.expect(&TokenKind::Colon, "':'")?;
        let query = self.parse_constant()?;
        Ok(Expr::Match {
            field,
            field_type,
            query,
        })
    }

    /// Arithmetic with at most one comparison on top.
    fn parse_value_expression(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;
        let op = match self.peek() {
            TokenKind::Eq => ComparisonOp::Eq,
            TokenKind::Neq => ComparisonOp::Neq,
            TokenKind::Lt => ComparisonOp::Lt,
            TokenKind::Lte => ComparisonOp::Lte,
            TokenKind::Gt => ComparisonOp::Gt,
            TokenKind::Gte => ComparisonOp::Gte,
            TokenKind::CiEq => ComparisonOp::CiEq,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_additive()?;
        Ok(Expr::comparison(op, left, right))
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek() {
                TokenKind::Plus => ArithmeticOp::Add,
                TokenKind::Minus => ArithmeticOp::Sub,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::arithmetic(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                TokenKind::Star => ArithmeticOp::Mul,
                TokenKind::Slash => ArithmeticOp::Div,
                TokenKind::Percent => ArithmeticOp::Mod,
                _ => break,
            };

            self.advance();
            let right = self.parse_unary()?;
            left = Expr::arithmetic(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            _ => return self.parse_postfix(),
        };
        // `-1` is a signed literal, not a negation
        if matches!(self.peek_nth(1), TokenKind::Integer(_) | TokenKind::Decimal(_)) {
            return self.parse_postfix();
        }
        self.advance();
        let operand = self.nested(|p| p.parse_unary())?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// Primary expression followed by any number of `::type` casts.
    pub(super) fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        while self.eat(&TokenKind::CastOp) {
            let data_type = self.parse_data_type()?;
            expr = Expr::Cast {
                expr: Box::new(expr),
                data_type,
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek() {
            TokenKind::LParen => {
                self.advance();
                let inner = self.nested(|p| p.parse_boolean_expression())?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(Expr::Parenthesized(Box::new(inner)))
            }
            TokenKind::Param | TokenKind::NamedParam(_) => match self.peek_nth(1) {
                TokenKind::LParen => self.parse_function_call(),
                TokenKind::Dot => Ok(Expr::Name(self.parse_qualified_name()?)),
                _ => {
                    let token = self.advance();
                    Ok(Expr::Literal(Literal::Parameter(Self::parameter(&token.kind))))
                }
            },
            TokenKind::DoubleParam | TokenKind::NamedDoubleParam(_) => {
                if self.peek_nth(1) == &TokenKind::LParen {
                    self.parse_function_call()
                } else {
                    Ok(Expr::Name(self.parse_qualified_name()?))
                }
            }
            kind if Self::is_identifier(kind) => {
                if self.peek_nth(1) == &TokenKind::LParen {
                    self.parse_function_call()
                } else {
                    Ok(Expr::Name(self.parse_qualified_name()?))
                }
            }
            TokenKind::LBracket if self.at_bracket_qualifier() => {
                Ok(Expr::Name(self.parse_qualified_name()?))
            }
            _ => match self.try_constant()? {
                Some(literal) => Ok(Expr::Literal(literal)),
                None => self.unexpected("an expression"),
            },
        }
    }

    fn parse_function_call(&mut self) -> Result<Expr> {
        let name = self.parse_identifier_or_parameter()?;
        self.expect(&TokenKind::LParen, "'('")?;

        let (args, options) = self.nested(|p| {
            if p.eat(&TokenKind::Star) {
                return Ok((FunctionArgs::Star, None));
            }
            let mut args = Vec::new();
            let mut options = None;
            if !p.check(&TokenKind::RParen) {
                loop {
                    if !args.is_empty() && p.check(&TokenKind::LBrace) {
                        options = Some(p.parse_map_expression()?);
                        break;
                    }
                    args.push(p.parse_boolean_expression()?);
                    if !p.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            Ok((FunctionArgs::List(args), options))
        })?;

        self.expect(&TokenKind::RParen, "')'")?;
        Ok(Expr::Function(FunctionCall {
            name,
            args,
            options,
        }))
    }

    /// `{ "key": value, ... }`
    pub(super) fn parse_map_expression(&mut self) -> Result<MapExpression> {
        self.expect(&TokenKind::LBrace, "'{'")?;
        let entries = self.nested(|p| {
            if p.check(&TokenKind::RBrace) {
                return Ok(Vec::new());
            }
            p.parse_comma_sep(Self::parse_map_entry)
        })?;
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(MapExpression { entries })
    }

    fn parse_map_entry(&mut self) -> Result<MapEntry> {
        let key = match self.peek() {
            TokenKind::String(key) => key.clone(),
            _ => return self.unexpected("string"),
        };
        self.advance();
        self.expect(&TokenKind::Colon, "':'")?;
        let value = if self.check(&TokenKind::LBrace) {
            MapValue::Map(self.parse_map_expression()?)
        } else {
            MapValue::Literal(self.parse_constant()?)
        };
        Ok(MapEntry { key, value })
    }

    pub(super) fn parse_data_type(&mut self) -> Result<DataType> {
        Ok(DataType(self.parse_identifier()?))
    }

    // -----------------------------------------------------------------------
    // Constants
    // -----------------------------------------------------------------------

    pub(super) fn parse_constant(&mut self) -> Result<Literal> {
        match self.try_constant()? {
            Some(literal) => Ok(literal),
            None => self.unexpected("a constant"),
        }
    }

    /// A constant if one starts here; `None` leaves the position untouched.
    fn try_constant(&mut self) -> Result<Option<Literal>> {
        let literal = match self.peek() {
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Literal::Null
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Literal::Boolean(true)
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Literal::Boolean(false)
            }
            TokenKind::String(value) => {
                let value = value.clone();
                self.advance();
                Literal::String(value)
            }
            TokenKind::Param | TokenKind::NamedParam(_) => {
                let token = self.advance();
                Literal::Parameter(Self::parameter(&token.kind))
            }
            TokenKind::LBracket => Literal::Array(self.parse_array()?),
            TokenKind::Integer(_) | TokenKind::Decimal(_) => self.parse_numeric_constant()?,
            TokenKind::Minus | TokenKind::Plus
                if matches!(
                    self.peek_nth(1),
                    TokenKind::Integer(_) | TokenKind::Decimal(_)
                ) =>
            {
                self.parse_numeric_constant()?
            }
            _ => return Ok(None),
        };
        Ok(Some(literal))
    }

    // A number, or an integer qualified by a unit (`1 day`).
    fn parse_numeric_constant(&mut self) -> Result<Literal> {
        let number = self.parse_number()?;
        if let Number::Integer(value) = number
            && let TokenKind::Identifier(unit) = self.peek()
        {
            let unit = unit.clone();
            self.advance();
            return Ok(Literal::Timespan { value, unit });
        }
        Ok(number.into())
    }

    /// Optionally signed integer or decimal.
    pub(super) fn parse_number(&mut self) -> Result<Number> {
        let negative = match self.peek() {
            TokenKind::Minus => {
                self.advance();
                true
            }
            TokenKind::Plus => {
                self.advance();
                false
            }
            _ => false,
        };

        let token = self.advance();
        let sign = if negative { "-" } else { "" };
        match &token.kind {
            TokenKind::Integer(digits) => {
                let text = format!("{sign}{digits}");
                if let Ok(value) = text.parse::<i64>() {
                    return Ok(Number::Integer(value));
                }
                if !negative && let Ok(value) = digits.parse::<u64>() {
                    return Ok(Number::UnsignedLong(value));
                }
                decimal_literal(&token.position, text)
            }
            TokenKind::Decimal(digits) => {
                decimal_literal(&token.position, format!("{sign}{digits}"))
            }
            _ => Err(ParseError::unexpected(&token, "number")),
        }
    }

    /// `[1, 2]`, `[true, false]` or `["a", "b"]`; mixing kinds is an error.
    fn parse_array(&mut self) -> Result<ArrayLiteral> {
        self.expect(&TokenKind::LBracket, "'['")?;
        let array = match self.peek() {
            TokenKind::Keyword(Keyword::True | Keyword::False) => {
                ArrayLiteral::Boolean(self.parse_comma_sep(Self::parse_boolean_value)?)
            }
            TokenKind::String(_) => {
                ArrayLiteral::String(self.parse_comma_sep(Self::parse_string)?)
            }
            _ => ArrayLiteral::Numeric(self.parse_comma_sep(Self::parse_number)?),
        };
        self.expect(&TokenKind::RBracket, "']'")?;
        Ok(array)
    }

    fn parse_boolean_value(&mut self) -> Result<bool> {
        if self.eat_kw(Keyword::True) {
            Ok(true)
        } else if self.eat_kw(Keyword::False) {
            Ok(false)
        } else {
            self.unexpected("{'true', 'false'}")
        }
    }

    pub(super) fn parse_string(&mut self) -> Result<String> {
        match self.peek() {
            TokenKind::String(value) => {
                let value = value.clone();
                self.advance();
                Ok(value)
            }
            _ => self.unexpected("string"),
        }
    }

    /// Parameter marker carried by a token kind.
    pub(super) fn parameter(kind: &TokenKind) -> Parameter {
        match kind {
            TokenKind::NamedParam(name) | TokenKind::NamedDoubleParam(name) => {
                match name.parse::<u32>() {
                    Ok(index) if name.bytes().all(|b| b.is_ascii_digit()) => {
                        Parameter::Positional(index)
                    }
                    _ => Parameter::Named(name.clone()),
                }
            }
            _ => Parameter::Anonymous,
        }
    }

    pub(super) fn parameter_segment(kind: &TokenKind) -> Segment {
        match kind {
            TokenKind::DoubleParam | TokenKind::NamedDoubleParam(_) => {
                Segment::DoubleParam(Self::parameter(kind))
            }
            _ => Segment::Param(Self::parameter(kind)),
        }
    }
}

// Kept as written; only magnitudes no float can hold are refused.
fn decimal_literal(position: &crate::ast::Position, text: String) -> Result<Number> {
    let literal = DecimalLiteral::new(text);
    if literal.to_f64().is_none() {
        return Err(invalid_number(position, literal.as_str()));
    }
    Ok(Number::Decimal(literal))
}

fn invalid_number(position: &crate::ast::Position, text: &str) -> ParseError {
    ParseError::new(
        ErrorKind::UnexpectedToken,
        *position,
        format!("invalid numeric literal '{text}'"),
    )
}
