//! One filter string in, one ready-to-run query out.

use tracing::debug;

use crate::ast::Node;
use crate::catalog::{AttributeCatalog, AttributeResolver};
use crate::config::EngineConfig;
use crate::error::FilterError;
use crate::parser::parse_filter;
use crate::sql_compiler::{CompiledQuery, SqlCompiler};

/// Parses and compiles filter strings against a schema and attribute catalog.
///
/// Holds configuration only. Every call to [`FilterEngine::apply`] builds its
/// own AST and its own select statement, so an engine can be shared freely.
#[derive(Debug, Clone)]
pub struct FilterEngine<R = AttributeCatalog> {
    compiler: SqlCompiler,
    resolver: R,
}

impl FilterEngine<AttributeCatalog> {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(SqlCompiler::from_config(config), config.catalog())
    }
}

impl Default for FilterEngine<AttributeCatalog> {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl<R: AttributeResolver> FilterEngine<R> {
    pub fn new(compiler: SqlCompiler, resolver: R) -> Self {
        Self { compiler, resolver }
    }

    /// Parses `filter` without compiling it.
    pub fn parse(&self, filter: &str) -> Result<Option<Node>, FilterError> {
        parse_filter(filter)
    }

    /// Applies `filter` to a fresh select over the job listings.
    ///
    /// A missing or blank filter yields the unconstrained select. Any error
    /// aborts the whole filter; nothing is partially applied.
    pub fn apply(&self, filter: Option<&str>) -> Result<CompiledQuery, FilterError> {
        let ast = match filter {
            Some(filter) => parse_filter(filter)?,
            None => None,
        };
        self.compile(ast.as_ref())
    }

    /// Compiles an already parsed filter; `None` selects everything.
    pub fn compile(&self, ast: Option<&Node>) -> Result<CompiledQuery, FilterError> {
        if ast.is_none() {
            debug!("no filter given, selecting everything");
        }
        self.compiler.compile(ast, &self.resolver)
    }
}
