//! # Query Abstract Syntax Tree
//!
//! Typed tree produced by the parser and consumed by the analyzer, the
//! canonical printer and the JSON renderer.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[names]** - Qualified names, name patterns and parameters
//! - **[expressions]** - Expression nodes and literals
//! - **[operators]** - Logical, comparison, arithmetic and unary operators
//! - **[commands]** - Source and processing commands with their arguments
//! - **[query]** - Statement, settings and the query pipeline
//!
//! ## Pipeline Structure
//!
//! Every query starts with exactly one source command and chains any
//! number of processing commands with `|`:
//!
//! ```text
//! FROM employees
//! | WHERE still_hired
//! | STATS avg_salary = AVG(salary) BY department
//! | SORT avg_salary DESC
//! | LIMIT 5
//! ```
//!
//! The tree holds no tokens or positions; it only describes what was
//! written. Parenthesized sub-expressions are kept so printing the tree
//! reproduces the original grouping.
pub mod tokens;
pub mod names;
pub mod expressions;
pub mod operators;
pub mod commands;
pub mod query;

pub use tokens::{Keyword, Position, Span, Token, TokenKind};
pub use names::{
    NamePattern, Parameter, PatternPart, PatternSegment, QualifiedName, Qualifier, Segment,
};
pub use expressions::{
    ArrayLiteral, DataType, DecimalLiteral, Expr, FunctionArgs, FunctionCall, Literal, MapEntry,
    MapExpression, MapValue, Number, PatternArg, StringOrParameter,
};
pub use operators::{ArithmeticOp, ComparisonOp, LogicalOp, UnaryOp};
pub use commands::*;
pub use query::{CommandRef, Query, Setting, Statement};
