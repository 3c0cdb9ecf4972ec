use serde::Serialize;

use crate::ast::{MapValue, ProcessingCommand, SourceCommand};

/// Everything a single parse produces: leading settings plus the query.
///
/// # Example
/// ```text
/// SET time_zone = "UTC"; FROM logs | LIMIT 10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub settings: Vec<Setting>,
    pub query: Query,
}

/// `SET name = value;` recorded as written. Interpretation is left to the
/// analyzer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Setting {
    pub name: String,
    pub value: MapValue,
}

/// Source command followed by its processing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub source: SourceCommand,

    /// Commands after each `|`, in order
    pub pipeline: Vec<ProcessingCommand>,
}

/// Borrowed view of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandRef<'a> {
    Source(&'a SourceCommand),
    Processing(&'a ProcessingCommand),
}

impl CommandRef<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            CommandRef::Source(command) => command.name(),
            CommandRef::Processing(command) => command.name(),
        }
    }
}

impl Query {
    pub fn new(source: SourceCommand) -> Self {
        Query {
            source,
            pipeline: Vec::new(),
        }
    }

    /// Number of stages, source included.
    pub fn len(&self) -> usize {
        1 + self.pipeline.len()
    }

    /// A query always has its source command.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All stages in order, starting with the source.
    pub fn commands(&self) -> impl Iterator<Item = CommandRef<'_>> {
        std::iter::once(CommandRef::Source(&self.source))
            .chain(self.pipeline.iter().map(CommandRef::Processing))
    }
}
