// tests/command_tests.rs

use esql_parser::ast::*;
use esql_parser::error::ErrorKind;
use esql_parser::grammar::{Availability, PROCESSING_COMMANDS, SOURCE_COMMANDS};
use esql_parser::{ParseError, ParserConfig, parse, parse_with};
use pretty_assertions::assert_eq;

fn query(input: &str) -> Query {
    parse(input).unwrap_or_else(|e| panic!("{input}: {e}")).query
}

fn experimental(input: &str) -> Query {
    parse_with(input, &ParserConfig::experimental())
        .unwrap_or_else(|e| panic!("{input}: {e}"))
        .query
}

fn err(input: &str) -> ParseError {
    parse(input).expect_err(input)
}

/// The single processing command after `FROM idx |`.
fn command(text: &str) -> ProcessingCommand {
    let mut q = query(&format!("FROM idx | {text}"));
    assert_eq!(q.pipeline.len(), 1);
    q.pipeline.remove(0)
}

fn experimental_command(text: &str) -> ProcessingCommand {
    let mut q = experimental(&format!("FROM idx | {text}"));
    q.pipeline.remove(0)
}

fn pattern(text: &str) -> NamePattern {
    NamePattern::literal(text)
}

fn qn(text: &str) -> QualifiedName {
    QualifiedName::simple(text)
}

// ============================================================================
// Source commands
// ============================================================================

#[test]
fn test_from_patterns() {
    let SourceCommand::From(from) = query("FROM logs-*, remote:metrics-2024.01, \"my index\"").source
    else {
        panic!("expected FROM");
    };
    assert_eq!(
        from.sources,
        vec![
            IndexSource::Pattern(IndexPattern::new("logs-*")),
            IndexSource::Pattern(IndexPattern {
                cluster: Some("remote".into()),
                index: "metrics-2024.01".into(),
                selector: None,
            }),
            IndexSource::Pattern(IndexPattern::new("my index")),
        ]
    );
    assert!(from.metadata.is_empty());
}

#[test]
fn test_from_selector() {
    let SourceCommand::From(from) = query("FROM logs::failures").source else {
        panic!("expected FROM");
    };
    assert_eq!(
        from.sources,
        vec![IndexSource::Pattern(IndexPattern {
            cluster: None,
            index: "logs".into(),
            selector: Some("failures".into()),
        })]
    );
}

#[test]
fn test_from_date_math_keeps_its_colons() {
    let SourceCommand::From(from) = query("FROM \"<logs-{now/d{yyyy.MM.dd|+12:00}}>\"").source
    else {
        panic!("expected FROM");
    };
    assert_eq!(
        from.sources,
        vec![IndexSource::Pattern(IndexPattern::new("<logs-{now/d{yyyy.MM.dd|+12:00}}>"))]
    );

    let SourceCommand::From(from) =
        query("FROM \"remote:<logs-{now/d{HH:mm}}>::failures\"").source
    else {
        panic!("expected FROM");
    };
    assert_eq!(
        from.sources,
        vec![IndexSource::Pattern(IndexPattern {
            cluster: Some("remote".into()),
            index: "<logs-{now/d{HH:mm}}>".into(),
            selector: Some("failures".into()),
        })]
    );
}

#[test]
fn test_from_metadata() {
    let SourceCommand::From(from) = query("from idx metadata _id, _index").source else {
        panic!("expected FROM");
    };
    assert_eq!(from.metadata, vec!["_id".to_string(), "_index".to_string()]);
}

#[test]
fn test_from_pattern_stops_at_whitespace() {
    let err = err("FROM logs -*");
    assert_eq!(err.kind, ErrorKind::UnexpectedToken);
    assert_eq!(err.position.column, 11);
}

#[test]
fn test_from_reserved_word_alone() {
    assert!(parse("FROM metadata").is_err());
    assert!(parse("FROM on-call").is_ok());
}

#[test]
fn test_time_series() {
    assert!(matches!(query("TS metrics-*").source, SourceCommand::TimeSeries(_)));
}

#[test]
fn test_row() {
    let SourceCommand::Row(fields) = query("ROW a = 1, \"x\", c.d = [1, 2]").source else {
        panic!("expected ROW");
    };
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0], Field::named(qn("a"), Expr::integer(1)));
    assert_eq!(fields[1], Field::unnamed(Expr::string("x")));
    assert_eq!(fields[2].name, Some(QualifiedName::dotted(&["c", "d"])));
}

#[test]
fn test_show_info() {
    assert_eq!(query("show info").source, SourceCommand::ShowInfo);
    assert!(parse("SHOW functions").is_err());
}

#[test]
fn test_unknown_source_command() {
    let err = err("SELECT * FROM t");
    assert_eq!(err.kind, ErrorKind::NoViableAlternative);
    assert_eq!(err.to_string(), "line 1:1: no viable alternative at input 'SELECT'");
}

#[test]
fn test_processing_command_cannot_start_query() {
    let err = err("WHERE a > 1");
    assert_eq!(err.kind, ErrorKind::NoViableAlternative);
}

#[test]
fn test_explain_and_external_are_gated() {
    let err = err("EXPLAIN (FROM idx)");
    assert_eq!(err.kind, ErrorKind::PredicateFailed);

    let SourceCommand::Explain(inner) = experimental("EXPLAIN (FROM idx | LIMIT 1)").source else {
        panic!("expected EXPLAIN");
    };
    assert_eq!(inner.len(), 2);

    let SourceCommand::External(external) =
        experimental("EXTERNAL \"s3://bucket/data.parquet\" WITH {\"format\": \"parquet\"}").source
    else {
        panic!("expected EXTERNAL");
    };
    assert_eq!(
        external.location,
        StringOrParameter::String("s3://bucket/data.parquet".into())
    );
    assert!(external.options.is_some());
}

#[test]
fn test_subquery_in_from_is_gated() {
    let err = err("FROM a, (FROM b)");
    assert_eq!(err.kind, ErrorKind::PredicateFailed);
    assert_eq!(err.position.column, 9);
    assert_eq!(err.message, "mismatched input '(' expecting index pattern");

    let SourceCommand::From(from) = experimental("FROM a, (FROM b | WHERE x > 1)").source else {
        panic!("expected FROM");
    };
    let IndexSource::Subquery(sub) = &from.sources[1] else {
        panic!("expected subquery");
    };
    assert_eq!(sub.pipeline.len(), 1);
}

#[test]
fn test_gated_subquery_reports_like_other_bad_sources() {
    let paren = err("FROM (");
    let bracket = err("FROM [");
    assert_eq!(paren.message, "mismatched input '(' expecting index pattern");
    assert_eq!(paren.message, bracket.message);
    assert_eq!(paren.position, bracket.position);
    assert_eq!(paren.kind, ErrorKind::PredicateFailed);
    assert_eq!(bracket.kind, ErrorKind::UnexpectedToken);
}

// ============================================================================
// Processing commands
// ============================================================================

#[test]
fn test_eval() {
    let ProcessingCommand::Eval(fields) = command("EVAL x = a + 1, upper(b)") else {
        panic!("expected EVAL");
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, Some(qn("x")));
    assert!(fields[1].name.is_none());
}

#[test]
fn test_where() {
    assert_eq!(
        command("WHERE a > 1"),
        ProcessingCommand::Where(Expr::comparison(
            ComparisonOp::Gt,
            Expr::name("a"),
            Expr::integer(1)
        ))
    );
}

#[test]
fn test_keep_patterns() {
    let ProcessingCommand::Keep(patterns) = command("KEEP first_*, *name, `a-b`, x.y*") else {
        panic!("expected KEEP");
    };
    assert_eq!(
        patterns,
        vec![
            NamePattern {
                qualifier: None,
                segments: vec![PatternSegment::Pattern(vec![
                    PatternPart::Literal("first_".into()),
                    PatternPart::Wildcard,
                ])],
            },
            NamePattern {
                qualifier: None,
                segments: vec![PatternSegment::Pattern(vec![
                    PatternPart::Wildcard,
                    PatternPart::Literal("name".into()),
                ])],
            },
            pattern("a-b"),
            NamePattern {
                qualifier: None,
                segments: vec![
                    PatternSegment::Pattern(vec![PatternPart::Literal("x".into())]),
                    PatternSegment::Pattern(vec![
                        PatternPart::Literal("y".into()),
                        PatternPart::Wildcard,
                    ]),
                ],
            },
        ]
    );
}

#[test]
fn test_keep_pattern_matching() {
    let ProcessingCommand::Keep(patterns) = command("KEEP emp_*") else {
        panic!("expected KEEP");
    };
    assert!(patterns[0].matches("emp_no"));
    assert!(!patterns[0].matches("name"));
}

#[test]
fn test_keep_reserved_word_needs_quoting() {
    assert!(parse("FROM idx | KEEP by").is_err());
    assert_eq!(
        command("KEEP `by`"),
        ProcessingCommand::Keep(vec![pattern("by")])
    );
    assert!(matches!(command("KEEP by_*"), ProcessingCommand::Keep(_)));
}

#[test]
fn test_drop() {
    assert_eq!(
        command("DROP a, b"),
        ProcessingCommand::Drop(vec![pattern("a"), pattern("b")])
    );
}

#[test]
fn test_limit_and_sample() {
    assert_eq!(command("LIMIT 10"), ProcessingCommand::Limit(Literal::Integer(10)));
    assert_eq!(
        command("LIMIT ?n"),
        ProcessingCommand::Limit(Literal::Parameter(Parameter::Named("n".into())))
    );
    assert!(matches!(
        command("SAMPLE 0.25"),
        ProcessingCommand::Sample(Literal::Decimal(_))
    ));
    assert!(parse("FROM idx | LIMIT a").is_err());
}

#[test]
fn test_stats() {
    let ProcessingCommand::Stats(stats) =
        command("STATS avg = AVG(salary), c = COUNT(*) WHERE active BY dept, year = YEAR(hired)")
    else {
        panic!("expected STATS");
    };
    assert_eq!(stats.aggregates.len(), 2);
    assert!(stats.aggregates[0].filter.is_none());
    assert_eq!(stats.aggregates[1].filter, Some(Expr::name("active")));
    assert_eq!(stats.groupings.len(), 2);
    assert_eq!(stats.groupings[1].name, Some(qn("year")));
}

#[test]
fn test_stats_without_aggregates() {
    let ProcessingCommand::Stats(stats) = command("STATS BY host") else {
        panic!("expected STATS");
    };
    assert!(stats.aggregates.is_empty());
    assert_eq!(stats.groupings, vec![Field::unnamed(Expr::name("host"))]);

    assert_eq!(command("STATS"), ProcessingCommand::Stats(StatsCommand::default()));
}

#[test]
fn test_inline_stats_spellings() {
    let two_words = command("INLINE STATS m = MAX(x) BY g");
    let one_word = command("INLINESTATS m = MAX(x) BY g");
    assert!(matches!(two_words, ProcessingCommand::InlineStats(_)));
    assert_eq!(two_words, one_word);
    assert!(parse("FROM idx | INLINE x").is_err());
}

#[test]
fn test_sort() {
    let ProcessingCommand::Sort(orders) = command("SORT a, b DESC, c ASC NULLS FIRST, d NULLS LAST")
    else {
        panic!("expected SORT");
    };
    assert_eq!(orders.len(), 4);
    assert_eq!((orders[0].direction, orders[0].nulls), (None, None));
    assert_eq!(orders[1].direction, Some(SortDirection::Desc));
    assert_eq!(
        (orders[2].direction, orders[2].nulls),
        (Some(SortDirection::Asc), Some(NullsOrder::First))
    );
    assert_eq!(orders[3].nulls, Some(NullsOrder::Last));
}

#[test]
fn test_sort_nulls_needs_position() {
    let err = err("FROM idx | SORT a NULLS");
    assert!(err.message.contains("{'FIRST', 'LAST'}"));
}

#[test]
fn test_rename_both_forms() {
    assert_eq!(
        command("RENAME a AS b, new = old"),
        ProcessingCommand::Rename(vec![
            RenameClause {
                old: pattern("a"),
                new: pattern("b"),
            },
            RenameClause {
                old: pattern("old"),
                new: pattern("new"),
            },
        ])
    );
}

#[test]
fn test_dissect() {
    let ProcessingCommand::Dissect(dissect) =
        command("DISSECT message \"%{a} %{b}\" append_separator = \"-\"")
    else {
        panic!("expected DISSECT");
    };
    assert_eq!(dissect.input, Expr::name("message"));
    assert_eq!(dissect.pattern, "%{a} %{b}");
    assert_eq!(
        dissect.options,
        vec![CommandOption {
            name: "append_separator".into(),
            value: Literal::String("-".into()),
        }]
    );
}

#[test]
fn test_grok_multiple_patterns() {
    let ProcessingCommand::Grok(grok) = command("GROK msg \"%{IP:ip}\", \"%{WORD:w}\"") else {
        panic!("expected GROK");
    };
    assert_eq!(grok.patterns, vec!["%{IP:ip}".to_string(), "%{WORD:w}".to_string()]);
}

#[test]
fn test_enrich() {
    let ProcessingCommand::Enrich(enrich) =
        command("ENRICH _remote:languages-policy ON code WITH lang = name, region")
    else {
        panic!("expected ENRICH");
    };
    assert_eq!(
        enrich.policy,
        EnrichPolicy {
            mode: Some("_remote".into()),
            name: "languages-policy".into(),
        }
    );
    assert_eq!(enrich.on, Some(pattern("code")));
    assert_eq!(
        enrich.with,
        vec![
            EnrichField {
                name: Some(pattern("lang")),
                source: pattern("name"),
            },
            EnrichField {
                name: None,
                source: pattern("region"),
            },
        ]
    );
}

#[test]
fn test_enrich_minimal() {
    let ProcessingCommand::Enrich(enrich) = command("ENRICH policy") else {
        panic!("expected ENRICH");
    };
    assert_eq!(enrich.policy.text(), "policy");
    assert!(enrich.on.is_none() && enrich.with.is_empty());
}

#[test]
fn test_mv_expand() {
    assert_eq!(
        command("MV_EXPAND tags"),
        ProcessingCommand::MvExpand(qn("tags"))
    );
}

#[test]
fn test_lookup_join() {
    let ProcessingCommand::Join(join) = command("LOOKUP JOIN hosts AS h ON host_id, a == b") else {
        panic!("expected JOIN");
    };
    assert_eq!(join.kind, JoinKind::Lookup);
    assert_eq!(join.target, IndexPattern::new("hosts"));
    assert_eq!(join.alias.as_deref(), Some("h"));
    assert_eq!(join.conditions.len(), 2);
}

#[test]
fn test_outer_joins_are_gated() {
    let err = err("FROM a | LEFT JOIN b ON k");
    assert_eq!(err.kind, ErrorKind::PredicateFailed);
    assert_eq!(err.message, "no viable alternative at input 'LEFT'");

    for (text, kind) in [
        ("LEFT JOIN b ON k", JoinKind::Left),
        ("RIGHT JOIN b ON k", JoinKind::Right),
        ("FULL JOIN b ON k", JoinKind::Full),
    ] {
        let ProcessingCommand::Join(join) = experimental_command(text) else {
            panic!("expected JOIN");
        };
        assert_eq!(join.kind, kind);
    }
}

#[test]
fn test_bare_lookup_is_gated() {
    let err = err("FROM idx | LOOKUP t ON f");
    assert_eq!(err.kind, ErrorKind::PredicateFailed);
    assert_eq!(
        experimental_command("LOOKUP t ON a, b"),
        ProcessingCommand::Lookup(LookupCommand {
            table: IndexPattern::new("t"),
            on: vec![pattern("a"), pattern("b")],
        })
    );
}

#[test]
fn test_change_point() {
    assert_eq!(
        command("CHANGE_POINT count ON @timestamp AS type, pvalue"),
        ProcessingCommand::ChangePoint(ChangePointCommand {
            value: qn("count"),
            key: Some(qn("@timestamp")),
            output: Some(ChangePointOutput {
                type_name: qn("type"),
                pvalue_name: qn("pvalue"),
            }),
        })
    );
}

#[test]
fn test_completion() {
    let ProcessingCommand::Completion(completion) =
        command("COMPLETION answer = question WITH {\"inference_id\": \"my-model\"}")
    else {
        panic!("expected COMPLETION");
    };
    assert_eq!(completion.target, Some(qn("answer")));
    assert_eq!(completion.prompt, Expr::name("question"));
    let options = completion.options.expect("options");
    assert_eq!(
        options.get("inference_id"),
        Some(&MapValue::Literal(Literal::String("my-model".into())))
    );
}

#[test]
fn test_fork() {
    let ProcessingCommand::Fork(branches) =
        command("FORK (WHERE a > 1 | LIMIT 5) (SORT b) (STATS c = COUNT(*))")
    else {
        panic!("expected FORK");
    };
    assert_eq!(branches.len(), 3);
    assert_eq!(branches[0].commands.len(), 2);
    assert!(matches!(branches[1].commands[0], ProcessingCommand::Sort(_)));
}

#[test]
fn test_fork_branch_needs_a_command() {
    assert!(parse("FROM idx | FORK ()").is_err());
    assert!(parse("FROM idx | FORK").is_err());
}

#[test]
fn test_rerank() {
    let ProcessingCommand::Rerank(rerank) =
        command("RERANK score = \"fast cars\" ON title, body = SUBSTRING(body, 0, 100) WITH {}")
    else {
        panic!("expected RERANK");
    };
    assert_eq!(rerank.target, Some(qn("score")));
    assert_eq!(rerank.query, Literal::String("fast cars".into()));
    assert_eq!(rerank.fields[0], Field::unnamed(Expr::name("title")));
    assert_eq!(rerank.fields[1].name, Some(qn("body")));
    assert_eq!(rerank.options, Some(MapExpression { entries: vec![] }));
}

#[test]
fn test_fuse() {
    assert_eq!(
        command("FUSE"),
        ProcessingCommand::Fuse(FuseCommand {
            method: None,
            configuration: vec![],
        })
    );
    let ProcessingCommand::Fuse(fuse) =
        command("FUSE linear SCORE BY s KEY BY a, b GROUP BY g WITH {\"normalizer\": \"minmax\"}")
    else {
        panic!("expected FUSE");
    };
    assert_eq!(fuse.method.as_deref(), Some("linear"));
    assert_eq!(fuse.configuration.len(), 4);
    assert_eq!(
        fuse.configuration[1],
        FuseConfiguration::Key(vec![qn("a"), qn("b")])
    );
}

#[test]
fn test_derived_fields() {
    assert_eq!(
        command("URI_PARTS parts = url"),
        ProcessingCommand::UriParts(DerivedField {
            target: qn("parts"),
            input: Expr::name("url"),
        })
    );
    assert!(matches!(
        command("REGISTERED_DOMAIN d = TO_LOWER(host)"),
        ProcessingCommand::RegisteredDomain(_)
    ));
    assert_eq!(command("METRICS_INFO"), ProcessingCommand::MetricsInfo);
}

#[test]
fn test_insist_is_gated() {
    assert_eq!(err("FROM idx | INSIST f").kind, ErrorKind::PredicateFailed);
    assert_eq!(
        experimental_command("INSIST f, g*").name(),
        "INSIST"
    );
}

#[test]
fn test_gates_follow_command_tables() {
    let sources = SOURCE_COMMANDS.iter().map(|spec| (spec, spec.syntax.to_string(), 1));
    let processing = PROCESSING_COMMANDS
        .iter()
        .map(|spec| (spec, format!("FROM idx | {}", spec.syntax), 12));

    for (spec, text, column) in sources.chain(processing) {
        let result = parse(&text);
        let gated = matches!(
            &result,
            Err(e) if e.kind == ErrorKind::PredicateFailed && e.position.column == column
        );
        assert_eq!(gated, spec.availability == Availability::Experimental, "{text}");
        if let Err(e) = &result {
            assert_ne!(e.kind, ErrorKind::NoViableAlternative, "{text}");
        }
    }
}

#[test]
fn test_two_word_commands_report_missing_second_word() {
    let inline = err("FROM idx | INLINE x = 1");
    assert_eq!(inline.message, "mismatched input 'x' expecting 'STATS'");

    let show = err("SHOW functions");
    assert_eq!(show.kind, ErrorKind::UnexpectedToken);
    assert_eq!(show.message, "mismatched input 'functions' expecting 'INFO'");
}

#[test]
fn test_mmr() {
    assert_eq!(err("FROM idx | MMR ON v LIMIT 5").kind, ErrorKind::PredicateFailed);

    let ProcessingCommand::Mmr(mmr) =
        experimental_command("MMR [0.5, 1.5] ON embedding LIMIT 10 WITH {\"lambda\": 0.7}")
    else {
        panic!("expected MMR");
    };
    assert!(matches!(
        mmr.query_vector,
        Some(Expr::Literal(Literal::Array(ArrayLiteral::Numeric(_))))
    ));
    assert_eq!(mmr.on, qn("embedding"));
    assert_eq!(mmr.limit, Literal::Integer(10));
    assert!(mmr.options.is_some());

    let ProcessingCommand::Mmr(mmr) = experimental_command("MMR ON v LIMIT ?k") else {
        panic!("expected MMR");
    };
    assert!(mmr.query_vector.is_none());
    assert!(
        parse_with("FROM i | MMR ON v LIMIT 1.5", &ParserConfig::experimental()).is_err()
    );
}

#[test]
fn test_unknown_processing_command() {
    let err = err("FROM idx | FILTER a");
    assert_eq!(err.kind, ErrorKind::NoViableAlternative);
    assert_eq!(err.position.column, 12);
}

// ============================================================================
// PROMQL
// ============================================================================

#[test]
fn test_promql_captures_body() {
    let SourceCommand::Promql(promql) =
        query("PROMQL index=metrics step=5m start=?start result=(sum by (job) (rate(http[5m])))")
            .source
    else {
        panic!("expected PROMQL");
    };
    assert_eq!(
        promql.params,
        vec![
            PromqlParam {
                name: "index".into(),
                value: PromqlValue::Text("metrics".into()),
            },
            PromqlParam {
                name: "step".into(),
                value: PromqlValue::Text("5m".into()),
            },
            PromqlParam {
                name: "start".into(),
                value: PromqlValue::Parameter(Parameter::Named("start".into())),
            },
        ]
    );
    assert_eq!(promql.target.as_deref(), Some("result"));
    assert_eq!(promql.query.text, "sum by (job) (rate(http[5m]))");
}

#[test]
fn test_promql_followed_by_pipeline() {
    let q = query("PROMQL (up) | LIMIT 5");
    assert_eq!(q.len(), 2);
}

#[test]
fn test_promql_hash_comment_hides_parens() {
    let SourceCommand::Promql(promql) = query("PROMQL (up # not a ) here\n)").source else {
        panic!("expected PROMQL");
    };
    assert_eq!(promql.query.text, "up # not a ) here\n");
}

#[test]
fn test_promql_hash_comment_hides_quotes() {
    for (input, body) in [
        ("PROMQL (up # it's a comment\n)", "up # it's a comment\n"),
        ("PROMQL (up # say \"hi\n)", "up # say \"hi\n"),
        ("PROMQL (sum(x) # `odd\n) | LIMIT 1", "sum(x) # `odd\n"),
    ] {
        let SourceCommand::Promql(promql) = query(input).source else {
            panic!("expected PROMQL");
        };
        assert_eq!(promql.query.text, body, "{input}");
    }
}

#[test]
fn test_hash_comment_outside_promql_fails() {
    let err = err("FROM idx # note");
    assert_eq!(err.kind, ErrorKind::UnexpectedToken);
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn test_settings_are_recorded() {
    let statement =
        parse("SET time_zone = \"UTC\"; SET opts = {\"a\": 1}; FROM idx").unwrap();
    assert_eq!(
        statement.settings,
        vec![
            Setting {
                name: "time_zone".into(),
                value: MapValue::Literal(Literal::String("UTC".into())),
            },
            Setting {
                name: "opts".into(),
                value: MapValue::Map(MapExpression {
                    entries: vec![MapEntry {
                        key: "a".into(),
                        value: MapValue::Literal(Literal::Integer(1)),
                    }],
                }),
            },
        ]
    );
}

#[test]
fn test_setting_needs_semicolon() {
    let err = err("SET a = 1 FROM idx");
    assert!(err.message.contains("';'"));
}

// ============================================================================
// Command names
// ============================================================================

#[test]
fn test_command_names() {
    let q = query("FROM a | LOOKUP JOIN b ON k | INLINE STATS c = COUNT(*) | MV_EXPAND x");
    let names: Vec<_> = q.commands().map(|c| c.name()).collect();
    assert_eq!(names, vec!["FROM", "LOOKUP JOIN", "INLINE STATS", "MV_EXPAND"]);
}
