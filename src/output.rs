//! Canonical text and JSON output for parsed statements.
//!
//! [`to_query`] prints an AST back as query text that parses to the same
//! tree. Keywords are upper-cased, identifiers are quoted only when needed
//! and explicit parentheses are kept where the source had them.
//!
//! # Examples
//!
//! ```
//! use esql_parser::parse;
//! use esql_parser::output::{to_query, to_query_pretty};
//!
//! let statement = parse("from employees | where salary>1000 | keep `first-name`").unwrap();
//!
//! assert_eq!(
//!     to_query(&statement),
//!     "FROM employees | WHERE salary > 1000 | KEEP `first-name`"
//! );
//! assert_eq!(
//!     to_query_pretty(&statement),
//!     "FROM employees\n| WHERE salary > 1000\n| KEEP `first-name`"
//! );
//! ```

use crate::ast::{
    AggField, ArrayLiteral, ChangePointCommand, CommandOption, EnrichField, EnrichPolicy, Expr,
    Field, FromCommand, FunctionArgs, FuseConfiguration, IndexPattern, IndexSource, Literal,
    MapExpression, MapValue, NamePattern, NullsOrder, Number, Order, Parameter, PatternArg,
    PatternPart, PatternSegment, ProcessingCommand, PromqlValue, QualifiedName, Qualifier, Query,
    Segment, SortDirection, SourceCommand, Statement, StatsCommand, StringOrParameter,
};
use crate::grammar;

pub struct QueryPrinter {
    pretty: bool,
}

impl QueryPrinter {
    /// `pretty` starts every pipe stage on its own line.
    pub fn new(pretty: bool) -> Self {
        QueryPrinter { pretty }
    }

    pub fn print(&self, statement: &Statement) -> String {
        let mut out = String::new();
        for setting in &statement.settings {
            out.push_str("SET ");
            out.push_str(&grammar::quote_if_needed(&setting.name));
            out.push_str(" = ");
            out.push_str(&self.map_value(&setting.value));
            out.push(';');
            out.push(if self.pretty { '\n' } else { ' ' });
        }
        out.push_str(&self.query(&statement.query));
        out
    }

    fn query(&self, query: &Query) -> String {
        let separator = if self.pretty { "\n| " } else { " | " };
        let mut out = self.source_command(&query.source);
        for command in &query.pipeline {
            out.push_str(separator);
            out.push_str(&self.processing_command(command));
        }
        out
    }

    // Nested queries always print on one line.
    fn inline_query(&self, query: &Query) -> String {
        QueryPrinter::new(false).query(query)
    }

    fn source_command(&self, command: &SourceCommand) -> String {
        match command {
            SourceCommand::From(from) => format!("FROM {}", self.from_arguments(from)),
            SourceCommand::TimeSeries(from) => format!("TS {}", self.from_arguments(from)),
            SourceCommand::Row(fields) => format!("ROW {}", self.fields(fields)),
            SourceCommand::ShowInfo => "SHOW INFO".to_string(),
            SourceCommand::Promql(promql) => {
                let mut out = String::from("PROMQL");
                for param in &promql.params {
                    let value = match &param.value {
                        PromqlValue::String(s) => string_literal(s),
                        PromqlValue::Parameter(p) => parameter(p, false),
                        PromqlValue::Text(text) => text.clone(),
                    };
                    out.push_str(&format!(" {}={}", grammar::quote_if_needed(&param.name), value));
                }
                out.push(' ');
                if let Some(target) = &promql.target {
                    out.push_str(&grammar::quote_if_needed(target));
                    out.push('=');
                }
                out.push_str(&format!("({})", promql.query.text));
                out
            }
            SourceCommand::Explain(query) => format!("EXPLAIN ({})", self.inline_query(query)),
            SourceCommand::External(external) => format!(
                "EXTERNAL {}{}",
                string_or_parameter(&external.location),
                self.with_options(&external.options)
            ),
        }
    }

    fn from_arguments(&self, from: &FromCommand) -> String {
        let sources: Vec<String> = from
            .sources
            .iter()
            .map(|source| match source {
                IndexSource::Pattern(pattern) => index_pattern(pattern),
                IndexSource::Subquery(query) => format!("({})", self.inline_query(query)),
            })
            .collect();
        let mut out = sources.join(", ");
        if !from.metadata.is_empty() {
            let ids: Vec<_> = from
                .metadata
                .iter()
                .map(|id| grammar::quote_if_needed(id))
                .collect();
            out.push_str(" METADATA ");
            out.push_str(&ids.join(", "));
        }
        out
    }

    fn processing_command(&self, command: &ProcessingCommand) -> String {
        match command {
            ProcessingCommand::Eval(fields) => format!("EVAL {}", self.fields(fields)),
            ProcessingCommand::Where(condition) => format!("WHERE {}", self.expr(condition)),
            ProcessingCommand::Keep(patterns) => format!("KEEP {}", name_patterns(patterns)),
            ProcessingCommand::Drop(patterns) => format!("DROP {}", name_patterns(patterns)),
            ProcessingCommand::Insist(patterns) => format!("INSIST {}", name_patterns(patterns)),
            ProcessingCommand::Limit(limit) => format!("LIMIT {}", literal(limit)),
            ProcessingCommand::Sample(probability) => format!("SAMPLE {}", literal(probability)),
            ProcessingCommand::Stats(stats) => self.stats("STATS", stats),
            ProcessingCommand::InlineStats(stats) => self.stats("INLINE STATS", stats),
            ProcessingCommand::Sort(orders) => {
                let orders: Vec<String> = orders.iter().map(|o| self.order(o)).collect();
                format!("SORT {}", orders.join(", "))
            }
            ProcessingCommand::Rename(clauses) => {
                let clauses: Vec<String> = clauses
                    .iter()
                    .map(|c| format!("{} AS {}", name_pattern(&c.old), name_pattern(&c.new)))
                    .collect();
                format!("RENAME {}", clauses.join(", "))
            }
            ProcessingCommand::Dissect(dissect) => {
                let mut out = format!(
                    "DISSECT {} {}",
                    self.expr(&dissect.input),
                    string_literal(&dissect.pattern)
                );
                if !dissect.options.is_empty() {
                    let options: Vec<String> =
                        dissect.options.iter().map(command_option).collect();
                    out.push(' ');
                    out.push_str(&options.join(", "));
                }
                out
            }
            ProcessingCommand::Grok(grok) => {
                let patterns: Vec<String> =
                    grok.patterns.iter().map(|p| string_literal(p)).collect();
                format!("GROK {} {}", self.expr(&grok.input), patterns.join(", "))
            }
            ProcessingCommand::Enrich(enrich) => {
                let mut out = format!("ENRICH {}", enrich_policy(&enrich.policy));
                if let Some(on) = &enrich.on {
                    out.push_str(" ON ");
                    out.push_str(&name_pattern(on));
                }
                if !enrich.with.is_empty() {
                    let fields: Vec<String> = enrich.with.iter().map(enrich_field).collect();
                    out.push_str(" WITH ");
                    out.push_str(&fields.join(", "));
                }
                out
            }
            ProcessingCommand::MvExpand(name) => format!("MV_EXPAND {}", qualified_name(name)),
            ProcessingCommand::Join(join) => {
                let mut out = format!("{} {}", join.kind.syntax(), index_pattern(&join.target));
                if let Some(alias) = &join.alias {
                    out.push_str(" AS ");
                    out.push_str(&grammar::quote_if_needed(alias));
                }
                let conditions: Vec<String> =
                    join.conditions.iter().map(|c| self.expr(c)).collect();
                out.push_str(" ON ");
                out.push_str(&conditions.join(", "));
                out
            }
            ProcessingCommand::Lookup(lookup) => format!(
                "LOOKUP {} ON {}",
                index_pattern(&lookup.table),
                name_patterns(&lookup.on)
            ),
            ProcessingCommand::ChangePoint(change_point) => self.change_point(change_point),
            ProcessingCommand::Completion(completion) => format!(
                "COMPLETION {}{}{}",
                assignment_target(&completion.target),
                self.expr(&completion.prompt),
                self.with_options(&completion.options)
            ),
            ProcessingCommand::Fork(branches) => {
                let branches: Vec<String> = branches
                    .iter()
                    .map(|branch| {
                        let commands: Vec<String> = branch
                            .commands
                            .iter()
                            .map(|c| self.processing_command(c))
                            .collect();
                        format!("({})", commands.join(" | "))
                    })
                    .collect();
                format!("FORK {}", branches.join(" "))
            }
            ProcessingCommand::Rerank(rerank) => format!(
                "RERANK {}{} ON {}{}",
                assignment_target(&rerank.target),
                literal(&rerank.query),
                self.fields(&rerank.fields),
                self.with_options(&rerank.options)
            ),
            ProcessingCommand::Fuse(fuse) => {
                let mut out = String::from("FUSE");
                if let Some(method) = &fuse.method {
                    out.push(' ');
                    out.push_str(&grammar::quote_if_needed(method));
                }
                for clause in &fuse.configuration {
                    out.push(' ');
                    out.push_str(&match clause {
                        FuseConfiguration::Score(name) => {
                            format!("SCORE BY {}", qualified_name(name))
                        }
                        FuseConfiguration::Key(names) => {
                            let names: Vec<String> = names.iter().map(qualified_name).collect();
                            format!("KEY BY {}", names.join(", "))
                        }
                        FuseConfiguration::Group(name) => {
                            format!("GROUP BY {}", qualified_name(name))
                        }
                        FuseConfiguration::Options(map) => format!("WITH {}", map_expression(map)),
                    });
                }
                out
            }
            ProcessingCommand::UriParts(derived) => format!(
                "URI_PARTS {} = {}",
                qualified_name(&derived.target),
                self.expr(&derived.input)
            ),
            ProcessingCommand::RegisteredDomain(derived) => format!(
                "REGISTERED_DOMAIN {} = {}",
                qualified_name(&derived.target),
                self.expr(&derived.input)
            ),
            ProcessingCommand::MetricsInfo => "METRICS_INFO".to_string(),
            ProcessingCommand::Mmr(mmr) => {
                let mut out = String::from("MMR");
                if let Some(vector) = &mmr.query_vector {
                    out.push(' ');
                    out.push_str(&self.expr(vector));
                }
                out.push_str(&format!(
                    " ON {} LIMIT {}{}",
                    qualified_name(&mmr.on),
                    literal(&mmr.limit),
                    self.with_options(&mmr.options)
                ));
                out
            }
        }
    }

    fn stats(&self, keyword: &str, stats: &StatsCommand) -> String {
        let mut out = keyword.to_string();
        if !stats.aggregates.is_empty() {
            let aggregates: Vec<String> =
                stats.aggregates.iter().map(|a| self.agg_field(a)).collect();
            out.push(' ');
            out.push_str(&aggregates.join(", "));
        }
        if !stats.groupings.is_empty() {
            out.push_str(" BY ");
            out.push_str(&self.fields(&stats.groupings));
        }
        out
    }

    fn agg_field(&self, agg: &AggField) -> String {
        let mut out = self.field(&agg.field);
        if let Some(filter) = &agg.filter {
            out.push_str(" WHERE ");
            out.push_str(&self.expr(filter));
        }
        out
    }

    fn order(&self, order: &Order) -> String {
        let mut out = self.expr(&order.expr);
        match order.direction {
            Some(SortDirection::Asc) => out.push_str(" ASC"),
            Some(SortDirection::Desc) => out.push_str(" DESC"),
            None => {}
        }
        match order.nulls {
            Some(NullsOrder::First) => out.push_str(" NULLS FIRST"),
            Some(NullsOrder::Last) => out.push_str(" NULLS LAST"),
            None => {}
        }
        out
    }

    fn change_point(&self, change_point: &ChangePointCommand) -> String {
        let mut out = format!("CHANGE_POINT {}", qualified_name(&change_point.value));
        if let Some(key) = &change_point.key {
            out.push_str(" ON ");
            out.push_str(&qualified_name(key));
        }
        if let Some(output) = &change_point.output {
            out.push_str(&format!(
                " AS {}, {}",
                qualified_name(&output.type_name),
                qualified_name(&output.pvalue_name)
            ));
        }
        out
    }

    fn fields(&self, fields: &[Field]) -> String {
        let fields: Vec<String> = fields.iter().map(|f| self.field(f)).collect();
        fields.join(", ")
    }

    fn field(&self, field: &Field) -> String {
        match &field.name {
            Some(name) => format!("{} = {}", qualified_name(name), self.expr(&field.expr)),
            None => self.expr(&field.expr),
        }
    }

    fn with_options(&self, options: &Option<MapExpression>) -> String {
        match options {
            Some(map) => format!(" WITH {}", map_expression(map)),
            None => String::new(),
        }
    }

    fn map_value(&self, value: &MapValue) -> String {
        match value {
            MapValue::Literal(value) => literal(value),
            MapValue::Map(map) => map_expression(map),
        }
    }

    pub fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(value) => literal(value),
            Expr::Name(name) => qualified_name(name),
            Expr::Function(call) => {
                let mut args = match &call.args {
                    FunctionArgs::Star => vec!["*".to_string()],
                    FunctionArgs::List(args) => args.iter().map(|a| self.expr(a)).collect(),
                };
                if let Some(options) = &call.options {
                    args.push(map_expression(options));
                }
                format!("{}({})", segment(&call.name), args.join(", "))
            }
            Expr::Not(operand) => format!("NOT {}", self.expr(operand)),
            Expr::Logical { op, left, right } => {
                format!("{} {} {}", self.expr(left), op.symbol(), self.expr(right))
            }
            Expr::Comparison { op, left, right } => {
                format!("{} {} {}", self.expr(left), op.symbol(), self.expr(right))
            }
            Expr::Arithmetic { op, left, right } => {
                format!("{} {} {}", self.expr(left), op.symbol(), self.expr(right))
            }
            Expr::Unary { op, operand } => {
                let operand = self.expr(operand);
                // keep `-(+5)` from collapsing into the literal -5
                let sign = if operand.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
                    "+"
                } else {
                    ""
                };
                format!("{}{sign}{operand}", op.symbol())
            }
            Expr::In {
                negated,
                value,
                list,
            } => {
                let list: Vec<String> = list.iter().map(|e| self.expr(e)).collect();
                format!(
                    "{}{} IN ({})",
                    self.expr(value),
                    not_prefix(*negated),
                    list.join(", ")
                )
            }
            Expr::IsNull { negated, value } => {
                let not = if *negated { " NOT" } else { "" };
                format!("{} IS{not} NULL", self.expr(value))
            }
            Expr::Like {
                negated,
                value,
                pattern,
            } => format!(
                "{}{} LIKE {}",
                self.expr(value),
                not_prefix(*negated),
                pattern_arg(pattern)
            ),
            Expr::Rlike {
                negated,
                value,
                pattern,
            } => format!(
                "{}{} RLIKE {}",
                self.expr(value),
                not_prefix(*negated),
                pattern_arg(pattern)
            ),
            Expr::Match {
                field,
                field_type,
                query,
            } => {
                let mut out = qualified_name(field);
                if let Some(data_type) = field_type {
                    out.push_str("::");
                    out.push_str(&grammar::quote_if_needed(&data_type.0));
                }
                out.push_str(": ");
                out.push_str(&literal(query));
                out
            }
            Expr::Cast { expr, data_type } => format!(
                "{}::{}",
                self.expr(expr),
                grammar::quote_if_needed(&data_type.0)
            ),
            Expr::Parenthesized(inner) => format!("({})", self.expr(inner)),
        }
    }
}

fn not_prefix(negated: bool) -> &'static str {
    if negated { " NOT" } else { "" }
}

fn command_option(option: &CommandOption) -> String {
    format!(
        "{} = {}",
        grammar::quote_if_needed(&option.name),
        literal(&option.value)
    )
}

fn assignment_target(target: &Option<QualifiedName>) -> String {
    match target {
        Some(name) => format!("{} = ", qualified_name(name)),
        None => String::new(),
    }
}

fn index_pattern(pattern: &IndexPattern) -> String {
    bare_or_string(pattern.text())
}

fn enrich_policy(policy: &EnrichPolicy) -> String {
    bare_or_string(policy.text())
}

fn bare_or_string(text: String) -> String {
    if grammar::is_bare_index_text(&text) {
        text
    } else {
        string_literal(&text)
    }
}

fn enrich_field(field: &EnrichField) -> String {
    match &field.name {
        Some(name) => format!("{} = {}", name_pattern(name), name_pattern(&field.source)),
        None => name_pattern(&field.source),
    }
}

pub(crate) fn qualified_name(name: &QualifiedName) -> String {
    let segments: Vec<String> = name.segments.iter().map(segment).collect();
    with_qualifier(&name.qualifier, segments.join("."))
}

fn with_qualifier(qualifier: &Option<Qualifier>, body: String) -> String {
    match qualifier {
        Some(Qualifier { name }) => {
            let name = name.as_deref().map(grammar::quote_if_needed).unwrap_or_default();
            format!("[{name}].[{body}]")
        }
        None => body,
    }
}

fn segment(segment: &Segment) -> String {
    match segment {
        Segment::Identifier(name) => grammar::quote_if_needed(name).into_owned(),
        Segment::Param(p) => parameter(p, false),
        Segment::DoubleParam(p) => parameter(p, true),
    }
}

fn name_patterns(patterns: &[NamePattern]) -> String {
    let patterns: Vec<String> = patterns.iter().map(name_pattern).collect();
    patterns.join(", ")
}

fn name_pattern(pattern: &NamePattern) -> String {
    let segments: Vec<String> = pattern
        .segments
        .iter()
        .map(|segment| match segment {
            PatternSegment::Pattern(parts) => {
                let alone = parts.len() == 1;
                parts
                    .iter()
                    .map(|part| match part {
                        PatternPart::Wildcard => "*".to_string(),
                        PatternPart::Literal(text) if grammar::is_bare_pattern_literal(text, alone) => {
                            text.clone()
                        }
                        PatternPart::Literal(text) => grammar::quote(text),
                    })
                    .collect()
            }
            PatternSegment::Param(p) => parameter(p, false),
            PatternSegment::DoubleParam(p) => parameter(p, true),
        })
        .collect();
    with_qualifier(&pattern.qualifier, segments.join("."))
}

fn parameter(parameter: &Parameter, double: bool) -> String {
    let marker = if double { "??" } else { "?" };
    match parameter {
        Parameter::Anonymous => marker.to_string(),
        Parameter::Named(name) => format!("{marker}{name}"),
        Parameter::Positional(index) => format!("{marker}{index}"),
    }
}

fn string_or_parameter(value: &StringOrParameter) -> String {
    match value {
        StringOrParameter::String(s) => string_literal(s),
        StringOrParameter::Parameter(p) => parameter(p, false),
    }
}

fn pattern_arg(pattern: &PatternArg) -> String {
    match pattern {
        PatternArg::Single(value) => string_or_parameter(value),
        PatternArg::List(values) => {
            let values: Vec<String> = values.iter().map(string_or_parameter).collect();
            format!("({})", values.join(", "))
        }
    }
}

fn map_expression(map: &MapExpression) -> String {
    let entries: Vec<String> = map
        .entries
        .iter()
        .map(|entry| {
            let value = match &entry.value {
                MapValue::Literal(value) => literal(value),
                MapValue::Map(map) => map_expression(map),
            };
            format!("{}: {}", string_literal(&entry.key), value)
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

pub(crate) fn literal(value: &Literal) -> String {
    match value {
        Literal::Null => "null".to_string(),
        Literal::Integer(n) => n.to_string(),
        Literal::UnsignedLong(n) => n.to_string(),
        Literal::Decimal(d) => d.to_string(),
        Literal::Boolean(b) => b.to_string(),
        Literal::String(s) => string_literal(s),
        Literal::Parameter(p) => parameter(p, false),
        Literal::Timespan { value, unit } => format!("{value} {unit}"),
        Literal::Array(array) => {
            let items: Vec<String> = match array {
                ArrayLiteral::Numeric(numbers) => numbers.iter().map(number).collect(),
                ArrayLiteral::Boolean(values) => values.iter().map(|b| b.to_string()).collect(),
                ArrayLiteral::String(values) => values.iter().map(|s| string_literal(s)).collect(),
            };
            format!("[{}]", items.join(", "))
        }
    }
}

fn number(value: &Number) -> String {
    match value {
        Number::Integer(n) => n.to_string(),
        Number::UnsignedLong(n) => n.to_string(),
        Number::Decimal(d) => d.to_string(),
    }
}

fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// Convenience functions

/// Canonical single-line query text.
pub fn to_query(statement: &Statement) -> String {
    QueryPrinter::new(false).print(statement)
}

/// Canonical query text with one pipe stage per line.
pub fn to_query_pretty(statement: &Statement) -> String {
    QueryPrinter::new(true).print(statement)
}

/// JSON rendering of the AST.
///
/// Enum variants are externally tagged with snake_case names, so
/// `LIMIT 10` renders its command as `{"limit":{"integer":10}}`.
pub fn to_json(statement: &Statement) -> serde_json::Result<String> {
    serde_json::to_string(statement)
}

/// Like [`to_json`], indented with two spaces.
pub fn to_json_pretty(statement: &Statement) -> serde_json::Result<String> {
    serde_json::to_string_pretty(statement)
}
