//! SQL compiler that turns a filter AST into a sea-query select over the job listings.

use sea_query::{
    Alias, Asterisk, Condition, Expr, MysqlQueryBuilder, PostgresQueryBuilder, Query, SelectStatement,
    SqliteQueryBuilder, Values,
};
use tracing::debug;

use crate::ast::{ComparisonOp, LogicalOp, Node};
use crate::catalog::AttributeResolver;
use crate::compiler::{Column, Compiler, PredicateBuilder};
use crate::config::{Dialect, EngineConfig, SchemaConfig};
use crate::error::FilterError;

/// Builds sea-query conditions against the configured schema.
///
/// Relation predicates become correlated `EXISTS (SELECT 1 ...)` sub-selects in
/// which the related table is aliased by the relation name.
pub struct SqlPredicateBuilder<'a> {
    schema: &'a SchemaConfig,
}

impl<'a> SqlPredicateBuilder<'a> {
    pub fn new(schema: &'a SchemaConfig) -> Self {
        Self { schema }
    }

    fn column(&self, column: Column<'_>) -> Expr {
        let primary = Alias::new(&self.schema.primary_table);
        match column {
            Column::Field(name) => Expr::col((primary, Alias::new(name))),
            Column::RemoteFlag => Expr::col((primary, Alias::new(&self.schema.remote_column))),
            Column::RelatedName(relation) => {
                // an unknown relation is reported by `has`
                let name = self
                    .schema
                    .relation(relation)
                    .map_or("name", |mapping| mapping.name_column.as_str());
                Expr::col((Alias::new(relation), Alias::new(name)))
            }
            Column::Related(relation, name) => Expr::col((Alias::new(relation), Alias::new(name))),
        }
    }
}

impl PredicateBuilder for SqlPredicateBuilder<'_> {
    type Predicate = Condition;

    fn group(&self, operator: LogicalOp, parts: Vec<Condition>) -> Condition {
        let group = match operator {
            LogicalOp::And => Condition::all(),
            LogicalOp::Or => Condition::any(),
        };
        parts.into_iter().fold(group, |group, part| group.add(part))
    }

    fn compare(&self, column: Column<'_>, op: ComparisonOp, value: &str) -> Condition {
        let col = self.column(column);
        let expr = match op {
            ComparisonOp::Eq => col.eq(value),
            ComparisonOp::NotEq | ComparisonOp::LtGt => col.ne(value),
            ComparisonOp::Gt => col.gt(value),
            ComparisonOp::Lt => col.lt(value),
            ComparisonOp::Gte => col.gte(value),
            ComparisonOp::Lte => col.lte(value),
            ComparisonOp::Like => col.like(value),
            ComparisonOp::In => col.is_in([value]),
        };
        Condition::all().add(expr)
    }

    fn is_in(&self, column: Column<'_>, values: &[String]) -> Condition {
        Condition::all().add(self.column(column).is_in(values.iter().cloned()))
    }

    fn flag(&self, column: Column<'_>, value: bool) -> Condition {
        Condition::all().add(self.column(column).eq(value))
    }

    fn id_equals(&self, column: Column<'_>, id: i64) -> Condition {
        Condition::all().add(self.column(column).eq(id))
    }

    fn has(&self, relation: &str, filter: Option<Condition>) -> Result<Condition, FilterError> {
        let mapping = self
            .schema
            .relation(relation)
            .ok_or_else(|| FilterError::UnknownRelation(relation.to_string()))?;

        let related = Alias::new(relation);
        let owner = (Alias::new(&self.schema.primary_table), Alias::new(&self.schema.primary_key));

        let mut sub = Query::select();
        sub.expr(Expr::cust("1")).from_as(Alias::new(&mapping.table), related.clone());

        let link = match &mapping.pivot {
            Some(pivot) => {
                let pivot_table = Alias::new(&pivot.table);
                sub.inner_join(
                    pivot_table.clone(),
                    Expr::col((pivot_table.clone(), Alias::new(&pivot.related_key)))
                        .equals((related, Alias::new(&mapping.key))),
                );
                Expr::col((pivot_table, Alias::new(&mapping.foreign_key))).equals(owner)
            }
            None => Expr::col((related, Alias::new(&mapping.foreign_key))).equals(owner),
        };

        // sea-query refuses to mix and_where with cond_where, so one condition carries both
        let mut condition = Condition::all().add(link);
        if let Some(filter) = filter {
            condition = condition.add(filter);
        }
        sub.cond_where(condition);

        Ok(Condition::all().add(Expr::exists(sub)))
    }
}

/// Result of SQL compilation: a fresh select with every filter predicate applied.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub statement: SelectStatement,
    pub dialect: Dialect,
    /// `false` when the filter was empty or constrained nothing.
    pub filtered: bool,
}

impl CompiledQuery {
    /// SQL with values inlined, for display and logging.
    pub fn sql(&self) -> String {
        match self.dialect {
            Dialect::Postgres => self.statement.to_string(PostgresQueryBuilder),
            Dialect::Mysql => self.statement.to_string(MysqlQueryBuilder),
            Dialect::Sqlite => self.statement.to_string(SqliteQueryBuilder),
        }
    }

    /// Parameterised SQL and its bound values, for execution.
    ///
    /// Filter values are always bound as text (`is_remote = true` binds
    /// `String("true")`). Drivers that send typed parameters may reject a
    /// text value compared against a non-text column.
    pub fn build(&self) -> (String, Values) {
        match self.dialect {
            Dialect::Postgres => self.statement.build(PostgresQueryBuilder),
            Dialect::Mysql => self.statement.build(MysqlQueryBuilder),
            Dialect::Sqlite => self.statement.build(SqliteQueryBuilder),
        }
    }
}

/// SQL Compiler that converts a filter AST to a select statement
#[derive(Debug, Clone, Default)]
pub struct SqlCompiler {
    schema: SchemaConfig,
    dialect: Dialect,
}

impl SqlCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            schema: config.schema.clone(),
            dialect: config.dialect,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Compiles `node` into a brand new select; `None` selects every listing.
    pub fn compile<R: AttributeResolver>(
        &self,
        node: Option<&Node>,
        resolver: R,
    ) -> Result<CompiledQuery, FilterError> {
        let primary = Alias::new(&self.schema.primary_table);
        let mut statement = Query::select();
        statement.column((primary.clone(), Asterisk)).from(primary);

        let condition = match node {
            Some(node) => {
                let builder = SqlPredicateBuilder::new(&self.schema);
                Compiler::new(resolver).compile(&builder, node)?
            }
            None => None,
        };

        let filtered = condition.is_some();
        if let Some(condition) = condition {
            statement.cond_where(condition);
        }

        let compiled = CompiledQuery {
            statement,
            dialect: self.dialect,
            filtered,
        };
        debug!(sql = %compiled.sql(), "compiled filter");
        Ok(compiled)
    }
}
