// Language Compliance Tests
//
// Properties every conforming parser must hold: operator precedence,
// pipeline shape, quoting, version gating, foreign query capture and list
// handling. Each section names the behaviour under test.

use esql_parser::ast::*;
use esql_parser::error::ErrorKind;
use esql_parser::grammar::{needs_quoting, quote, unquote};
use esql_parser::output::to_query;
use esql_parser::{ParserConfig, parse, parse_expression, parse_with};
use pretty_assertions::assert_eq;

fn where_condition(condition: &str) -> Expr {
    let statement = parse(&format!("FROM idx | WHERE {condition}")).unwrap();
    match statement.query.pipeline.into_iter().next() {
        Some(ProcessingCommand::Where(expr)) => expr,
        other => panic!("expected WHERE, got {other:?}"),
    }
}

// ============================================================================
// Section: Round trip
// ============================================================================

#[test]
fn test_printed_query_parses_to_same_tree() {
    let queries = [
        "FROM employees | WHERE salary > 1000 AND NOT still_hired | KEEP first_*, last_name",
        "ROW a = 1, b = \"two\", c = [1.5, 2.5] | EVAL d = a * -2 + c::long",
        "FROM logs-*, remote:other METADATA _id | STATS c = COUNT(*) WHERE x IS NOT NULL BY host",
        "FROM idx | SORT @timestamp DESC NULLS LAST | LIMIT ?limit",
    ];
    for text in queries {
        let statement = parse(text).unwrap();
        let printed = to_query(&statement);
        assert_eq!(parse(&printed).unwrap(), statement, "printed: {printed}");
    }
}

// ============================================================================
// Section: Precedence
// ============================================================================

#[test]
fn test_product_inside_sum() {
    assert_eq!(
        where_condition("1 + 2 * 3 > 0"),
        Expr::comparison(
            ComparisonOp::Gt,
            Expr::arithmetic(
                ArithmeticOp::Add,
                Expr::integer(1),
                Expr::arithmetic(ArithmeticOp::Mul, Expr::integer(2), Expr::integer(3))
            ),
            Expr::integer(0)
        )
    );
}

#[test]
fn test_and_inside_or() {
    assert_eq!(
        where_condition("a or b and c"),
        Expr::logical(
            LogicalOp::Or,
            Expr::name("a"),
            Expr::logical(LogicalOp::And, Expr::name("b"), Expr::name("c"))
        )
    );
}

#[test]
fn test_not_applies_to_left_operand_only() {
    assert_eq!(
        where_condition("not a and b"),
        Expr::logical(LogicalOp::And, Expr::not(Expr::name("a")), Expr::name("b"))
    );
}

#[test]
fn test_cast_applies_to_right_operand_only() {
    assert_eq!(
        parse_expression("a + b :: integer").unwrap(),
        Expr::arithmetic(
            ArithmeticOp::Add,
            Expr::name("a"),
            Expr::cast(Expr::name("b"), "integer")
        )
    );
}

// ============================================================================
// Section: Quoting
// ============================================================================

#[test]
fn test_unquote_inverts_quote() {
    for name in ["plain", "first-name", "a`b", "``", "", "with space", "日本"] {
        assert_eq!(unquote(&quote(name)), name);
    }
}

#[test]
fn test_names_without_backtick_or_hyphen_need_no_quoting() {
    for name in ["emp_no", "a.b", "with space", "x1"] {
        assert!(!needs_quoting(name), "{name}");
    }
    for name in ["first-name", "a`b"] {
        assert!(needs_quoting(name), "{name}");
    }
}

#[test]
fn test_quoted_name_parses_to_unquoted_text() {
    assert_eq!(
        where_condition("`first-name` == \"x\""),
        Expr::comparison(
            ComparisonOp::Eq,
            Expr::name("first-name"),
            Expr::string("x")
        )
    );
}

// ============================================================================
// Section: Pipeline shape
// ============================================================================

#[test]
fn test_zero_pipes_is_one_command() {
    let statement = parse("FROM idx").unwrap();
    assert_eq!(statement.query.len(), 1);
    assert!(statement.query.pipeline.is_empty());
}

#[test]
fn test_first_command_is_source_rest_processing() {
    let statement = parse("ROW a = 1 | EVAL b = a | WHERE b > 0 | LIMIT 1").unwrap();
    let commands: Vec<CommandRef> = statement.query.commands().collect();
    assert_eq!(commands.len(), 4);
    assert!(matches!(commands[0], CommandRef::Source(_)));
    assert!(
        commands[1..]
            .iter()
            .all(|c| matches!(c, CommandRef::Processing(_)))
    );
}

#[test]
fn test_source_command_after_pipe_fails() {
    let err = parse("FROM a | FROM b").unwrap_err();
    assert!(err.is_no_viable_alternative());
}

#[test]
fn test_empty_stage_fails() {
    assert!(parse("FROM a | | LIMIT 1").is_err());
    assert!(parse("FROM a |").is_err());
    assert!(parse("").is_err());
}

// ============================================================================
// Section: Version gate
// ============================================================================

#[test]
fn test_lookup_needs_experimental() {
    let text = "FROM idx | LOOKUP t ON f";
    let err = parse(text).unwrap_err();
    assert_eq!(err.kind, ErrorKind::PredicateFailed);
    assert!(parse_with(text, &ParserConfig::experimental()).is_ok());
}

#[test]
fn test_gate_failure_reads_like_unknown_input() {
    let gated = parse("FROM idx | INSIST f").unwrap_err();
    let unknown = parse("FROM idx | UNKNOWN f").unwrap_err();
    assert_eq!(gated.message.replace("INSIST", "X"), unknown.message.replace("UNKNOWN", "X"));
    assert_eq!(gated.position, unknown.position);
}

#[test]
fn test_stable_grammar_unchanged_by_flag() {
    let text = "FROM idx | LOOKUP JOIN t ON k | KEEP a";
    assert_eq!(
        parse(text).unwrap(),
        parse_with(text, &ParserConfig::experimental()).unwrap()
    );
}

// ============================================================================
// Section: Foreign query capture
// ============================================================================

#[test]
fn test_promql_body_is_balanced() {
    let statement = parse("PROMQL (sum(rate(x[5m])))").unwrap();
    let SourceCommand::Promql(promql) = statement.query.source else {
        panic!("expected PROMQL");
    };
    assert_eq!(promql.query.text, "sum(rate(x[5m]))");
}

#[test]
fn test_unbalanced_promql_is_unterminated() {
    let err = parse("PROMQL (sum(rate(x[5m])").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnterminatedConstruct);
    assert!(err.message.contains("<EOF>"));
}

#[test]
fn test_promql_body_keeps_whitespace() {
    let statement = parse("PROMQL (  up\n  == 1 )").unwrap();
    let SourceCommand::Promql(promql) = statement.query.source else {
        panic!("expected PROMQL");
    };
    assert_eq!(promql.query.text, "  up\n  == 1 ");
}

// ============================================================================
// Section: Lists
// ============================================================================

#[test]
fn test_trailing_comma_fails() {
    let err = parse("FROM idx | KEEP a,").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnterminatedConstruct);
}

#[test]
fn test_two_patterns() {
    let statement = parse("FROM idx | KEEP a, b").unwrap();
    assert_eq!(
        statement.query.pipeline[0],
        ProcessingCommand::Keep(vec![NamePattern::literal("a"), NamePattern::literal("b")])
    );
}

#[test]
fn test_leading_comma_fails() {
    let err = parse("FROM idx | KEEP , a").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedToken);
    assert_eq!(err.position.column, 17);
}

// ============================================================================
// Section: Errors
// ============================================================================

#[test]
fn test_first_error_wins() {
    let err = parse("FROM idx | WHERE (a > | LIMIT x").unwrap_err();
    assert_eq!(err.position.column, 23);
}

#[test]
fn test_error_display_format() {
    let err = parse("FROM idx\n| WHERE a >").unwrap_err();
    assert_eq!(
        err.to_string(),
        "line 2:12: mismatched input '<EOF>' expecting an expression"
    );
}
