use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::ast::{ArithmeticOp, ComparisonOp, LogicalOp, Parameter, QualifiedName, Segment, UnaryOp};

/// Expression tree node.
///
/// Every binary node owns both operands; operator precedence is encoded in
/// the shape of the tree, and explicit grouping survives as
/// [`Expr::Parenthesized`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Constant value
    Literal(Literal),

    /// Column reference
    ///
    /// # Examples
    /// ```text
    /// salary
    /// address.city
    /// ```
    Name(QualifiedName),

    /// Function call
    ///
    /// # Examples
    /// ```text
    /// count(*)
    /// round(salary, 2)
    /// match(title, "x", {"fuzziness": 1})
    /// ```
    Function(FunctionCall),

    /// `NOT expr`
    Not(Box<Expr>),

    /// `left AND right`, `left OR right`
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `left == right` and friends
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `left + right` and friends
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `-operand`, `+operand`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// `value [NOT] IN (a, b, ...)`
    In {
        negated: bool,
        value: Box<Expr>,
        list: Vec<Expr>,
    },

    /// `value IS [NOT] NULL`
    IsNull { negated: bool, value: Box<Expr> },

    /// `value [NOT] LIKE "pattern"` or `value [NOT] LIKE ("a", "b")`
    Like {
        negated: bool,
        value: Box<Expr>,
        pattern: PatternArg,
    },

    /// `value [NOT] RLIKE "regex"` or the list form
    Rlike {
        negated: bool,
        value: Box<Expr>,
        pattern: PatternArg,
    },

    /// Full-text match `field[::type] : query`
    ///
    /// # Example
    /// ```text
    /// title : "rust parser"
    /// ```
    Match {
        field: QualifiedName,
        field_type: Option<DataType>,
        query: Literal,
    },

    /// Inline cast `expr :: type`
    Cast {
        expr: Box<Expr>,
        data_type: DataType,
    },

    /// `( expr )`
    Parenthesized(Box<Expr>),
}

impl Expr {
    pub fn name(name: &str) -> Self {
        Expr::Name(QualifiedName::simple(name))
    }

    pub fn integer(value: i64) -> Self {
        Expr::Literal(Literal::Integer(value))
    }

    pub fn string(value: &str) -> Self {
        Expr::Literal(Literal::String(value.to_string()))
    }

    pub fn boolean(value: bool) -> Self {
        Expr::Literal(Literal::Boolean(value))
    }

    pub fn logical(op: LogicalOp, left: Expr, right: Expr) -> Self {
        Expr::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn comparison(op: ComparisonOp, left: Expr, right: Expr) -> Self {
        Expr::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn arithmetic(op: ArithmeticOp, left: Expr, right: Expr) -> Self {
        Expr::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: Expr) -> Self {
        Expr::Not(Box::new(operand))
    }

    pub fn cast(expr: Expr, data_type: &str) -> Self {
        Expr::Cast {
            expr: Box::new(expr),
            data_type: DataType(data_type.to_string()),
        }
    }
}

/// Constant values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Null,
    Integer(i64),
    /// Integer literal above `i64::MAX`
    UnsignedLong(u64),
    Decimal(DecimalLiteral),
    Boolean(bool),
    String(String),
    Parameter(Parameter),
    /// Integer qualified by a unit
    ///
    /// # Examples
    /// ```text
    /// 1 day
    /// 15 minutes
    /// ```
    Timespan { value: i64, unit: String },
    Array(ArrayLiteral),
}

/// Homogeneous bracketed array of constants.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayLiteral {
    /// `[1, 2.5, -3]`
    Numeric(Vec<Number>),
    /// `[true, false]`
    Boolean(Vec<bool>),
    /// `["a", "b"]`
    String(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Number {
    Integer(i64),
    UnsignedLong(u64),
    Decimal(DecimalLiteral),
}

/// Decimal literal as written, sign folded in (`1.5`, `-.5`, `1e30`).
///
/// Integers too wide for `u64` land here as well. The text is kept so that
/// values outside any fixed-precision range survive parsing and printing
/// unchanged; numeric views are available on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DecimalLiteral(String);

impl DecimalLiteral {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Nearest `f64`, or `None` when the magnitude overflows.
    pub fn to_f64(&self) -> Option<f64> {
        self.0.parse::<f64>().ok().filter(|value| value.is_finite())
    }

    /// Exact `rust_decimal` value, or `None` when the literal needs more
    /// than 96 bits of mantissa or a scale above 28. Never rounds.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let (negative, body) = match self.0.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, self.0.as_str()),
        };
        let (mantissa, exponent) = match body.find(['e', 'E']) {
            Some(i) => (&body[..i], body[i + 1..].parse::<i64>().ok()?),
            None => (body, 0),
        };
        let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));

        let joined = format!("{whole}{fraction}");
        let mut digits = joined.trim_start_matches('0').to_string();
        if digits.is_empty() {
            return Some(Decimal::ZERO);
        }
        let mut power = exponent.checked_sub(i64::try_from(fraction.len()).ok()?)?;
        // Trailing zeros are dropped only when the written scale cannot be kept.
        while digits.ends_with('0') && (power < -28 || digits.len() > 38) {
            digits.pop();
            power += 1;
        }

        let mut value = digits.parse::<i128>().ok()?;
        if negative {
            value = -value;
        }
        if power >= 0 {
            let factor = 10i128.checked_pow(u32::try_from(power).ok()?)?;
            Decimal::try_from_i128_with_scale(value.checked_mul(factor)?, 0).ok()
        } else {
            let scale = u32::try_from(-power).ok()?;
            Decimal::try_from_i128_with_scale(value, scale).ok()
        }
    }
}

impl fmt::Display for DecimalLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Number> for Literal {
    fn from(number: Number) -> Self {
        match number {
            Number::Integer(n) => Literal::Integer(n),
            Number::UnsignedLong(n) => Literal::UnsignedLong(n),
            Number::Decimal(d) => Literal::Decimal(d),
        }
    }
}

/// Type name used by inline casts and typed match fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataType(pub String);

/// Function invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    /// Function name; may be a parameter.
    pub name: Segment,
    pub args: FunctionArgs,
    /// Trailing `{ ... }` named options.
    pub options: Option<MapExpression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionArgs {
    /// `f(*)`
    Star,
    /// `f()`, `f(a, b)`
    List(Vec<Expr>),
}

/// `{ "key": value, ... }` options shared by several commands.
///
/// Entries keep their source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MapExpression {
    pub entries: Vec<MapEntry>,
}

impl MapExpression {
    pub fn get(&self, key: &str) -> Option<&MapValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapEntry {
    pub key: String,
    pub value: MapValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapValue {
    Literal(Literal),
    Map(MapExpression),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StringOrParameter {
    String(String),
    Parameter(Parameter),
}

/// Right-hand side of LIKE / RLIKE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternArg {
    Single(StringOrParameter),
    List(Vec<StringOrParameter>),
}

#[cfg(test)]
mod tests {
    use super::DecimalLiteral;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn exact(text: &str) -> Option<Decimal> {
        DecimalLiteral::new(text).to_decimal()
    }

    #[test]
    fn decimal_forms() {
        assert_eq!(exact("1."), Decimal::from_str("1").ok());
        assert_eq!(exact(".5"), Decimal::from_str("0.5").ok());
        assert_eq!(exact("-.5"), Decimal::from_str("-0.5").ok());
        assert_eq!(exact("1.5e2"), Decimal::from_str("150").ok());
        assert_eq!(exact("2E-1"), Decimal::from_str("0.2").ok());
        assert_eq!(exact("0.000"), Some(Decimal::ZERO));
    }

    #[test]
    fn written_scale_is_kept() {
        let value = exact("2.50").unwrap();
        assert_eq!(value.scale(), 2);
        assert_eq!(value.to_string(), "2.50");
    }

    #[test]
    fn no_rounding_outside_range() {
        assert_eq!(exact("1e30"), None);
        assert_eq!(exact("1.5e-30"), None);
        assert_eq!(exact("12345678901234567890123456789012345"), None);
        assert_eq!(exact("1e400"), None);
        assert_eq!(exact("79228162514264337593543950335"), Some(Decimal::MAX));
        assert_eq!(
            exact("1.0000000000000000000000000000000000000000"),
            Decimal::from_str("1").ok()
        );
    }

    #[test]
    fn float_view() {
        assert_eq!(DecimalLiteral::new("1e30").to_f64(), Some(1e30));
        assert_eq!(DecimalLiteral::new("-.5").to_f64(), Some(-0.5));
        assert_eq!(DecimalLiteral::new("1e400").to_f64(), None);
    }
}
