use serde::Serialize;

use crate::ast::{Expr, Literal, MapExpression, NamePattern, QualifiedName, Query, StringOrParameter};

/// First stage of a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCommand {
    /// Read from indices
    ///
    /// # Examples
    /// ```text
    /// FROM employees
    /// FROM logs-*, remote:metrics::failures METADATA _id, _index
    /// ```
    From(FromCommand),

    /// Read time series indices, same arguments as FROM
    ///
    /// # Example
    /// ```text
    /// TS metrics-*
    /// ```
    TimeSeries(FromCommand),

    /// Produce a single row of computed fields
    ///
    /// # Example
    /// ```text
    /// ROW a = 1, b = "two"
    /// ```
    Row(Vec<Field>),

    /// `SHOW INFO`
    ShowInfo,

    /// Embedded PromQL query, captured verbatim
    ///
    /// # Example
    /// ```text
    /// PROMQL step=1m result=(sum(rate(http_requests_total[5m])))
    /// ```
    Promql(PromqlCommand),

    /// Experimental `EXPLAIN ( query )`
    Explain(Box<Query>),

    /// Experimental `EXTERNAL "location" [WITH {...}]`
    External(ExternalCommand),
}

/// Stage after a pipe.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingCommand {
    /// # Example
    /// ```text
    /// EVAL height_ft = height * 3.281, doubled = salary * 2
    /// ```
    Eval(Vec<Field>),

    /// # Example
    /// ```text
    /// WHERE salary > 50000 AND NOT is_rehired
    /// ```
    Where(Expr),

    /// # Example
    /// ```text
    /// KEEP first_name, last_*, `a-b`
    /// ```
    Keep(Vec<NamePattern>),

    Drop(Vec<NamePattern>),

    /// # Example
    /// ```text
    /// LIMIT 10
    /// ```
    Limit(Literal),

    /// Aggregate, optionally grouped
    ///
    /// # Example
    /// ```text
    /// STATS avg = AVG(salary) WHERE still_hired, c = COUNT(*) BY languages
    /// ```
    Stats(StatsCommand),

    /// Aggregate and append the result to every input row
    ///
    /// Written `INLINE STATS` or `INLINESTATS`.
    InlineStats(StatsCommand),

    /// # Example
    /// ```text
    /// SORT salary DESC NULLS LAST, emp_no
    /// ```
    Sort(Vec<Order>),

    /// # Example
    /// ```text
    /// RENAME first_name AS name, surname = last_name
    /// ```
    Rename(Vec<RenameClause>),

    /// # Example
    /// ```text
    /// DISSECT message "%{date} %{msg}" append_separator = "-"
    /// ```
    Dissect(DissectCommand),

    /// # Example
    /// ```text
    /// GROK message "%{IP:ip} %{WORD:verb}"
    /// ```
    Grok(GrokCommand),

    /// # Example
    /// ```text
    /// ENRICH _coordinator:languages_policy ON language_code WITH name = language_name
    /// ```
    Enrich(EnrichCommand),

    /// # Example
    /// ```text
    /// MV_EXPAND tags
    /// ```
    MvExpand(QualifiedName),

    /// `LOOKUP JOIN`, and the experimental LEFT/RIGHT/FULL joins
    ///
    /// # Example
    /// ```text
    /// LOOKUP JOIN languages_lookup ON language_code
    /// ```
    Join(JoinCommand),

    /// Experimental `LOOKUP table ON fields`
    Lookup(LookupCommand),

    /// # Example
    /// ```text
    /// CHANGE_POINT count ON @timestamp AS type, pvalue
    /// ```
    ChangePoint(ChangePointCommand),

    /// # Example
    /// ```text
    /// COMPLETION answer = prompt WITH {"inference_id": "my-llm"}
    /// ```
    Completion(CompletionCommand),

    /// # Example
    /// ```text
    /// SAMPLE 0.25
    /// ```
    Sample(Literal),

    /// Run several sub-pipelines over the same input
    ///
    /// # Example
    /// ```text
    /// FORK (WHERE a > 1) (WHERE b > 2 | LIMIT 5)
    /// ```
    Fork(Vec<ForkBranch>),

    /// # Example
    /// ```text
    /// RERANK "query" ON title, summary WITH {"inference_id": "reranker"}
    /// ```
    Rerank(RerankCommand),

    /// Merge the results of FORK branches
    ///
    /// # Example
    /// ```text
    /// FUSE linear SCORE BY _score KEY BY _id GROUP BY _fork
    /// ```
    Fuse(FuseCommand),

    /// `URI_PARTS parts = url`
    UriParts(DerivedField),

    /// `METRICS_INFO`
    MetricsInfo,

    /// `REGISTERED_DOMAIN domain = host`
    RegisteredDomain(DerivedField),

    /// Experimental `INSIST` of unmapped fields
    Insist(Vec<NamePattern>),

    /// Experimental maximal marginal relevance reranking
    ///
    /// # Example
    /// ```text
    /// MMR [0.5, 0.1] ON embedding LIMIT 10 WITH {"lambda": 0.7}
    /// ```
    Mmr(MmrCommand),
}

impl SourceCommand {
    /// Leading keyword(s) as written in queries.
    pub fn name(&self) -> &'static str {
        match self {
            SourceCommand::From(_) => "FROM",
            SourceCommand::TimeSeries(_) => "TS",
            SourceCommand::Row(_) => "ROW",
            SourceCommand::ShowInfo => "SHOW INFO",
            SourceCommand::Promql(_) => "PROMQL",
            SourceCommand::Explain(_) => "EXPLAIN",
            SourceCommand::External(_) => "EXTERNAL",
        }
    }
}

impl ProcessingCommand {
    /// Leading keyword(s) as written in queries.
    pub fn name(&self) -> &'static str {
        match self {
            ProcessingCommand::Eval(_) => "EVAL",
            ProcessingCommand::Where(_) => "WHERE",
            ProcessingCommand::Keep(_) => "KEEP",
            ProcessingCommand::Drop(_) => "DROP",
            ProcessingCommand::Limit(_) => "LIMIT",
            ProcessingCommand::Stats(_) => "STATS",
            ProcessingCommand::InlineStats(_) => "INLINE STATS",
            ProcessingCommand::Sort(_) => "SORT",
            ProcessingCommand::Rename(_) => "RENAME",
            ProcessingCommand::Dissect(_) => "DISSECT",
            ProcessingCommand::Grok(_) => "GROK",
            ProcessingCommand::Enrich(_) => "ENRICH",
            ProcessingCommand::MvExpand(_) => "MV_EXPAND",
            ProcessingCommand::Join(join) => join.kind.syntax(),
            ProcessingCommand::Lookup(_) => "LOOKUP",
            ProcessingCommand::ChangePoint(_) => "CHANGE_POINT",
            ProcessingCommand::Completion(_) => "COMPLETION",
            ProcessingCommand::Sample(_) => "SAMPLE",
            ProcessingCommand::Fork(_) => "FORK",
            ProcessingCommand::Rerank(_) => "RERANK",
            ProcessingCommand::Fuse(_) => "FUSE",
            ProcessingCommand::UriParts(_) => "URI_PARTS",
            ProcessingCommand::MetricsInfo => "METRICS_INFO",
            ProcessingCommand::RegisteredDomain(_) => "REGISTERED_DOMAIN",
            ProcessingCommand::Insist(_) => "INSIST",
            ProcessingCommand::Mmr(_) => "MMR",
        }
    }
}

/// Arguments of FROM and TS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FromCommand {
    pub sources: Vec<IndexSource>,
    /// `METADATA _id, _index`
    pub metadata: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexSource {
    Pattern(IndexPattern),
    /// Experimental `( FROM ... | ... )`
    Subquery(Box<Query>),
}

/// `[cluster:]index[::selector]`
///
/// The same split applies whether the pattern was written bare or as a
/// quoted string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexPattern {
    pub cluster: Option<String>,
    pub index: String,
    pub selector: Option<String>,
}

impl IndexPattern {
    pub fn new(index: &str) -> Self {
        IndexPattern {
            cluster: None,
            index: index.to_string(),
            selector: None,
        }
    }

    /// Split pattern text into its cluster, index and selector parts.
    ///
    /// Colons inside a `<...>` date-math expression belong to the index
    /// name, e.g. `<logs-{now/d{yyyy.MM.dd|+12:00}}>`.
    pub fn parse(text: &str) -> Self {
        let date_math = match (text.find('<'), text.rfind('>')) {
            (Some(open), Some(close)) if open < close => Some((open, close)),
            _ => None,
        };
        let selector_from = date_math.map_or(0, |(_, close)| close + 1);
        let (rest, selector) = match text[selector_from..].rfind("::") {
            Some(i) => {
                let i = selector_from + i;
                (&text[..i], Some(text[i + 2..].to_string()))
            }
            None => (text, None),
        };
        let cluster_until = date_math.map_or(rest.len(), |(open, _)| open);
        let (cluster, index) = match rest[..cluster_until].find(':') {
            Some(i) => (Some(rest[..i].to_string()), &rest[i + 1..]),
            None => (None, rest),
        };
        IndexPattern {
            cluster,
            index: index.to_string(),
            selector,
        }
    }

    /// Text form, the inverse of [`IndexPattern::parse`].
    pub fn text(&self) -> String {
        let mut text = String::new();
        if let Some(cluster) = &self.cluster {
            text.push_str(cluster);
            text.push(':');
        }
        text.push_str(&self.index);
        if let Some(selector) = &self.selector {
            text.push_str("::");
            text.push_str(selector);
        }
        text
    }
}

/// `[name =] expression`, used by ROW, EVAL, STATS groupings and RERANK.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: Option<QualifiedName>,
    pub expr: Expr,
}

impl Field {
    pub fn named(name: QualifiedName, expr: Expr) -> Self {
        Field {
            name: Some(name),
            expr,
        }
    }

    pub fn unnamed(expr: Expr) -> Self {
        Field { name: None, expr }
    }
}

/// Aggregate with an optional per-aggregate filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggField {
    pub field: Field,
    pub filter: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StatsCommand {
    pub aggregates: Vec<AggField>,
    pub groupings: Vec<Field>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NullsOrder {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub expr: Expr,
    pub direction: Option<SortDirection>,
    pub nulls: Option<NullsOrder>,
}

/// `old AS new` or `new = old`; both spellings produce the same clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameClause {
    pub old: NamePattern,
    pub new: NamePattern,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DissectCommand {
    pub input: Expr,
    pub pattern: String,
    pub options: Vec<CommandOption>,
}

/// `name = constant` option of DISSECT.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOption {
    pub name: String,
    pub value: Literal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrokCommand {
    pub input: Expr,
    pub patterns: Vec<String>,
}

/// `[mode:]name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichPolicy {
    pub mode: Option<String>,
    pub name: String,
}

impl EnrichPolicy {
    pub fn parse(text: &str) -> Self {
        match text.split_once(':') {
            Some((mode, name)) => EnrichPolicy {
                mode: Some(mode.to_string()),
                name: name.to_string(),
            },
            None => EnrichPolicy {
                mode: None,
                name: text.to_string(),
            },
        }
    }

    pub fn text(&self) -> String {
        match &self.mode {
            Some(mode) => format!("{mode}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichCommand {
    pub policy: EnrichPolicy,
    pub on: Option<NamePattern>,
    pub with: Vec<EnrichField>,
}

/// `[new =] enrich_field`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichField {
    pub name: Option<NamePattern>,
    pub source: NamePattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    Lookup,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn syntax(self) -> &'static str {
        match self {
            JoinKind::Lookup => "LOOKUP JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinCommand {
    pub kind: JoinKind,
    pub target: IndexPattern,
    pub alias: Option<String>,
    pub conditions: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupCommand {
    pub table: IndexPattern,
    pub on: Vec<NamePattern>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangePointCommand {
    pub value: QualifiedName,
    pub key: Option<QualifiedName>,
    pub output: Option<ChangePointOutput>,
}

/// `AS type_name, pvalue_name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangePointOutput {
    pub type_name: QualifiedName,
    pub pvalue_name: QualifiedName,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionCommand {
    pub target: Option<QualifiedName>,
    pub prompt: Expr,
    pub options: Option<MapExpression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForkBranch {
    pub commands: Vec<ProcessingCommand>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RerankCommand {
    pub target: Option<QualifiedName>,
    pub query: Literal,
    pub fields: Vec<Field>,
    pub options: Option<MapExpression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuseCommand {
    pub method: Option<String>,
    pub configuration: Vec<FuseConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FuseConfiguration {
    /// `SCORE BY name`
    Score(QualifiedName),
    /// `KEY BY a, b`
    Key(Vec<QualifiedName>),
    /// `GROUP BY name`
    Group(QualifiedName),
    /// `WITH { ... }`
    Options(MapExpression),
}

/// `target = input` for URI_PARTS and REGISTERED_DOMAIN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedField {
    pub target: QualifiedName,
    pub input: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MmrCommand {
    pub query_vector: Option<Expr>,
    pub on: QualifiedName,
    pub limit: Literal,
    pub options: Option<MapExpression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalCommand {
    pub location: StringOrParameter,
    pub options: Option<MapExpression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromqlCommand {
    pub params: Vec<PromqlParam>,
    /// `name = ( ... )` names the result column.
    pub target: Option<String>,
    pub query: ForeignQuery,
}

/// `name = value` before the PromQL body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromqlParam {
    pub name: String,
    pub value: PromqlValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromqlValue {
    String(String),
    Parameter(crate::ast::Parameter),
    /// Unquoted value such as `1m` or `2024-01-01T00:00:00Z`, kept as written.
    Text(String),
}

/// Body of an embedded query in another language, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignQuery {
    pub text: String,
}
