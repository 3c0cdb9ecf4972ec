use super::{Parser, Result};
use crate::ast::{
    AggField, ChangePointCommand, ChangePointOutput, CommandOption, CompletionCommand,
    DerivedField, DissectCommand, EnrichCommand, EnrichField, EnrichPolicy, Expr, ExternalCommand,
    Field, ForkBranch, FromCommand, FuseCommand, FuseConfiguration, GrokCommand, IndexSource,
    JoinCommand, JoinKind, Keyword, Literal, LookupCommand, MapExpression, MmrCommand,
    NullsOrder, Order, QualifiedName, Query, RenameClause, RerankCommand, SortDirection,
    SourceCommand, StatsCommand, TokenKind,
};
use crate::error::ParseError;

impl Parser {
    /// `source (, source)* [METADATA id (, id)*]`
    pub(super) fn parse_from_arguments(&mut self) -> Result<FromCommand> {
        let sources = self.parse_comma_sep(Self::parse_index_source)?;
        let metadata = if self.eat_kw(Keyword::Metadata) {
            self.parse_comma_sep(Self::parse_identifier)?
        } else {
            Vec::new()
        };
        Ok(FromCommand { sources, metadata })
    }

    fn parse_index_source(&mut self) -> Result<IndexSource> {
        if !self.check(&TokenKind::LParen) {
            return Ok(IndexSource::Pattern(self.parse_index_pattern()?));
        }
        if !self.config.experimental {
            return Err(ParseError::gated(self.current(), "index pattern"));
        }
        self.advance();
        let query = self.nested(|p| p.parse_subquery())?;
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(IndexSource::Subquery(Box::new(query)))
    }

    // `FROM ... (| processing)*` inside FROM's parentheses.
    fn parse_subquery(&mut self) -> Result<Query> {
        self.expect_kw(Keyword::From)?;
        let mut query = Query::new(SourceCommand::From(self.parse_from_arguments()?));
        while self.eat(&TokenKind::Pipe) {
            query.pipeline.push(self.parse_processing_command()?);
        }
        Ok(query)
    }

    /// `EXPLAIN ( query )`
    pub(super) fn parse_explain(&mut self) -> Result<Query> {
        self.expect(&TokenKind::LParen, "'('")?;
        let query = self.nested(|p| p.parse_query())?;
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(query)
    }

    /// `EXTERNAL location [WITH map]`
    pub(super) fn parse_external(&mut self) -> Result<ExternalCommand> {
        let location = self.parse_string_or_parameter()?;
        let options = self.parse_with_options()?;
        Ok(ExternalCommand { location, options })
    }

    pub(super) fn parse_fields(&mut self) -> Result<Vec<Field>> {
        self.parse_comma_sep(Self::parse_field)
    }

    /// `[name =] booleanExpression`
    fn parse_field(&mut self) -> Result<Field> {
        let name = if self.at_assignment() {
            let name = self.parse_qualified_name()?;
            self.expect(&TokenKind::Assign, "'='")?;
            Some(name)
        } else {
            None
        };
        let expr = self.parse_boolean_expression()?;
        Ok(Field { name, expr })
    }

    // A qualified name followed by `=`.
    fn at_assignment(&self) -> bool {
        self.scan_qualified_name(0)
            .is_some_and(|end| self.peek_nth(end) == &TokenKind::Assign)
    }

    /// `[aggField (, aggField)*] [BY fields]`
    pub(super) fn parse_stats(&mut self) -> Result<StatsCommand> {
        let aggregates = if self.check_kw(Keyword::By) || self.at_command_end() {
            Vec::new()
        } else {
            self.parse_comma_sep(Self::parse_agg_field)?
        };
        let groupings = if self.eat_kw(Keyword::By) {
            self.parse_fields()?
        } else {
            Vec::new()
        };
        Ok(StatsCommand {
            aggregates,
            groupings,
        })
    }

    fn parse_agg_field(&mut self) -> Result<AggField> {
        let field = self.parse_field()?;
        let filter = if self.eat_kw(Keyword::Where) {
            Some(self.parse_boolean_expression()?)
        } else {
            None
        };
        Ok(AggField { field, filter })
    }

    /// `expr [ASC|DESC] [NULLS FIRST|LAST]`
    pub(super) fn parse_order(&mut self) -> Result<Order> {
        let expr = self.parse_boolean_expression()?;
        let direction = if self.eat_kw(Keyword::Asc) {
            Some(SortDirection::Asc)
        } else if self.eat_kw(Keyword::Desc) {
            Some(SortDirection::Desc)
        } else {
            None
        };
        let nulls = if self.eat_kw(Keyword::Nulls) {
            if self.eat_kw(Keyword::First) {
                Some(NullsOrder::First)
            } else if self.eat_kw(Keyword::Last) {
                Some(NullsOrder::Last)
            } else {
                return self.unexpected("{'FIRST', 'LAST'}");
            }
        } else {
            None
        };
        Ok(Order {
            expr,
            direction,
            nulls,
        })
    }

    /// `old AS new` or `new = old`
    pub(super) fn parse_rename_clause(&mut self) -> Result<RenameClause> {
        let first = self.parse_name_pattern()?;
        if self.eat(&TokenKind::Assign) {
            let old = self.parse_name_pattern()?;
            return Ok(RenameClause { old, new: first });
        }
        if !self.eat_kw(Keyword::As) {
            return self.unexpected("{'AS', '='}");
        }
        let new = self.parse_name_pattern()?;
        Ok(RenameClause { old: first, new })
    }

    /// `DISSECT input "pattern" [name = constant (, ...)*]`
    pub(super) fn parse_dissect(&mut self) -> Result<DissectCommand> {
        let input = self.parse_postfix()?;
        let pattern = self.parse_string()?;
        let options = if Self::is_identifier(self.peek()) && self.peek_nth(1) == &TokenKind::Assign
        {
            self.parse_comma_sep(Self::parse_command_option)?
        } else {
            Vec::new()
        };
        Ok(DissectCommand {
            input,
            pattern,
            options,
        })
    }

    fn parse_command_option(&mut self) -> Result<CommandOption> {
        let name = self.parse_identifier()?;
        self.expect(&TokenKind::Assign, "'='")?;
        let value = self.parse_constant()?;
        Ok(CommandOption { name, value })
    }

    /// `GROK input "pattern" (, "pattern")*`
    pub(super) fn parse_grok(&mut self) -> Result<GrokCommand> {
        let input = self.parse_postfix()?;
        let patterns = self.parse_comma_sep(Self::parse_string)?;
        Ok(GrokCommand { input, patterns })
    }

    /// `ENRICH [mode:]policy [ON field] [WITH [name =] field (, ...)*]`
    pub(super) fn parse_enrich(&mut self) -> Result<EnrichCommand> {
        let policy = match self.peek() {
            TokenKind::String(text) => {
                let policy = EnrichPolicy::parse(text);
                self.advance();
                policy
            }
            _ => EnrichPolicy::parse(&self.parse_contiguous_text("enrich policy")?),
        };
        let on = if self.eat_kw(Keyword::On) {
            Some(self.parse_name_pattern()?)
        } else {
            None
        };
        let with = if self.eat_kw(Keyword::With) {
            self.parse_comma_sep(Self::parse_enrich_field)?
        } else {
            Vec::new()
        };
        Ok(EnrichCommand { policy, on, with })
    }

    fn parse_enrich_field(&mut self) -> Result<EnrichField> {
        let first = self.parse_name_pattern()?;
        if self.eat(&TokenKind::Assign) {
            let source = self.parse_name_pattern()?;
            Ok(EnrichField {
                name: Some(first),
                source,
            })
        } else {
            Ok(EnrichField {
                name: None,
                source: first,
            })
        }
    }

    /// `target [AS alias] ON condition (, condition)*`
    pub(super) fn parse_join(&mut self, kind: JoinKind) -> Result<JoinCommand> {
        let target = self.parse_index_pattern()?;
        let alias = if self.eat_kw(Keyword::As) {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        self.expect_kw(Keyword::On)?;
        let conditions = self.parse_comma_sep(Self::parse_boolean_expression)?;
        Ok(JoinCommand {
            kind,
            target,
            alias,
            conditions,
        })
    }

    /// `LOOKUP table ON field (, field)*`
    pub(super) fn parse_lookup(&mut self) -> Result<LookupCommand> {
        let table = self.parse_index_pattern()?;
        self.expect_kw(Keyword::On)?;
        let on = self.parse_comma_sep(Self::parse_name_pattern)?;
        Ok(LookupCommand { table, on })
    }

    /// `CHANGE_POINT value [ON key] [AS type, pvalue]`
    pub(super) fn parse_change_point(&mut self) -> Result<ChangePointCommand> {
        let value = self.parse_qualified_name()?;
        let key = if self.eat_kw(Keyword::On) {
            Some(self.parse_qualified_name()?)
        } else {
            None
        };
        let output = if self.eat_kw(Keyword::As) {
            let type_name = self.parse_qualified_name()?;
            self.expect(&TokenKind::Comma, "','")?;
            let pvalue_name = self.parse_qualified_name()?;
            Some(ChangePointOutput {
                type_name,
                pvalue_name,
            })
        } else {
            None
        };
        Ok(ChangePointCommand { value, key, output })
    }

    /// `COMPLETION [target =] prompt [WITH map]`
    pub(super) fn parse_completion(&mut self) -> Result<CompletionCommand> {
        let target = self.parse_assignment_target()?;
        let prompt = self.parse_postfix()?;
        let options = self.parse_with_options()?;
        Ok(CompletionCommand {
            target,
            prompt,
            options,
        })
    }

    /// One or more `( processing (| processing)* )` branches.
    pub(super) fn parse_fork(&mut self) -> Result<Vec<ForkBranch>> {
        let mut branches = vec![self.parse_fork_branch()?];
        while self.check(&TokenKind::LParen) {
            branches.push(self.parse_fork_branch()?);
        }
        Ok(branches)
    }

    fn parse_fork_branch(&mut self) -> Result<ForkBranch> {
        self.expect(&TokenKind::LParen, "'('")?;
        let commands = self.nested(|p| {
            let mut commands = vec![p.parse_processing_command()?];
            while p.eat(&TokenKind::Pipe) {
                commands.push(p.parse_processing_command()?);
            }
            Ok(commands)
        })?;
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(ForkBranch { commands })
    }

    /// `RERANK [target =] query ON field [= expr] (, ...)* [WITH map]`
    pub(super) fn parse_rerank(&mut self) -> Result<RerankCommand> {
        let target = self.parse_assignment_target()?;
        let query = self.parse_constant()?;
        self.expect_kw(Keyword::On)?;
        let fields = self.parse_comma_sep(Self::parse_rerank_field)?;
        let options = self.parse_with_options()?;
        Ok(RerankCommand {
            target,
            query,
            fields,
            options,
        })
    }

    fn parse_rerank_field(&mut self) -> Result<Field> {
        let name = self.parse_qualified_name()?;
        if self.eat(&TokenKind::Assign) {
            Ok(Field::named(name, self.parse_boolean_expression()?))
        } else {
            Ok(Field::unnamed(Expr::Name(name)))
        }
    }

    /// `FUSE [method] (SCORE BY f | KEY BY f, ... | GROUP BY f | WITH map)*`
    pub(super) fn parse_fuse(&mut self) -> Result<FuseCommand> {
        let method = if Self::is_identifier(self.peek()) && !self.at_fuse_clause() {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        let mut configuration = Vec::new();
        loop {
            if self.at_fuse_clause() {
                let keyword = self.advance();
                self.advance();
                let clause = if keyword.kind.is_keyword(Keyword::Score) {
                    FuseConfiguration::Score(self.parse_qualified_name()?)
                } else if keyword.kind.is_keyword(Keyword::Key) {
                    FuseConfiguration::Key(self.parse_comma_sep(Self::parse_qualified_name)?)
                } else {
                    FuseConfiguration::Group(self.parse_qualified_name()?)
                };
                configuration.push(clause);
            } else if self.check_kw(Keyword::With) {
                self.advance();
                configuration.push(FuseConfiguration::Options(self.parse_map_expression()?));
            } else {
                break;
            }
        }
        Ok(FuseCommand {
            method,
            configuration,
        })
    }

    fn at_fuse_clause(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Keyword(Keyword::Score | Keyword::Key | Keyword::Group)
        ) && self.peek_nth(1).is_keyword(Keyword::By)
    }

    /// `target = input` for URI_PARTS and REGISTERED_DOMAIN.
    pub(super) fn parse_derived_field(&mut self) -> Result<DerivedField> {
        let target = self.parse_qualified_name()?;
        self.expect(&TokenKind::Assign, "'='")?;
        let input = self.parse_postfix()?;
        Ok(DerivedField { target, input })
    }

    /// `MMR [query_vector] ON field LIMIT n [WITH map]`
    pub(super) fn parse_mmr(&mut self) -> Result<MmrCommand> {
        let query_vector = if self.check_kw(Keyword::On) {
            None
        } else {
            Some(self.parse_postfix()?)
        };
        self.expect_kw(Keyword::On)?;
        let on = self.parse_qualified_name()?;
        self.expect_kw(Keyword::Limit)?;
        let limit = match self.peek() {
            TokenKind::Integer(_) => Literal::from(self.parse_number()?),
            TokenKind::Param | TokenKind::NamedParam(_) => self.parse_constant()?,
            _ => return self.unexpected("integer"),
        };
        let options = self.parse_with_options()?;
        Ok(MmrCommand {
            query_vector,
            on,
            limit,
            options,
        })
    }

    // `name =` before COMPLETION's prompt or RERANK's query.
    fn parse_assignment_target(&mut self) -> Result<Option<QualifiedName>> {
        if !self.at_assignment() {
            return Ok(None);
        }
        let target = self.parse_qualified_name()?;
        self.expect(&TokenKind::Assign, "'='")?;
        Ok(Some(target))
    }

    fn parse_with_options(&mut self) -> Result<Option<MapExpression>> {
        if self.eat_kw(Keyword::With) {
            Ok(Some(self.parse_map_expression()?))
        } else {
            Ok(None)
        }
    }
}
