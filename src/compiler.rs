//! Query compiler: walks an AST and composes predicates through a
//! [`PredicateBuilder`] supplied by the record store.
//!
//! Compilation is depth-first and pre-order. Every child is compiled into a
//! self-contained predicate before the parent groups them, so nesting alone
//! decides precedence and siblings never see each other's narrowing.

use tracing::debug;

use crate::ast::{
    AttributeCondition, ComparisonOp, CompoundNode, FilterValue, LogicalOp, Node, RelationCondition, RelationOp,
};
use crate::catalog::AttributeResolver;
use crate::error::FilterError;

/// Relation whose `IS_ANY` understands the `remote` token.
pub const LOCATIONS_RELATION: &str = "locations";
/// Columns of a location row matched by `locations IS_ANY (...)`.
pub const LOCATION_COLUMNS: [&str; 3] = ["city", "state", "country"];
/// Token routed to the primary record's remote flag, compared case-insensitively.
pub const REMOTE_TOKEN: &str = "remote";
/// Relation holding EAV rows `(job id, attribute_id, value)`.
pub const ATTRIBUTE_VALUES_RELATION: &str = "attribute_values";
pub const ATTRIBUTE_ID_COLUMN: &str = "attribute_id";
pub const ATTRIBUTE_VALUE_COLUMN: &str = "value";

/// A column a predicate can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column<'a> {
    /// Column of the primary record.
    Field(&'a str),
    /// The primary record's remote flag.
    RemoteFlag,
    /// Display-name column of a relation's rows.
    RelatedName(&'a str),
    /// Named column of a relation's rows: `(relation, column)`.
    Related(&'a str, &'a str),
}

/// The predicate-composition surface of a record store.
///
/// Builders are immutable: each call returns a new predicate and nothing is
/// narrowed in place, so one builder may serve any number of compilations.
pub trait PredicateBuilder {
    type Predicate;

    /// Conjunctive (`And`) or disjunctive (`Or`) group of `parts`.
    fn group(&self, operator: LogicalOp, parts: Vec<Self::Predicate>) -> Self::Predicate;

    /// `column <op> value`; `op` is never [`ComparisonOp::In`].
    fn compare(&self, column: Column<'_>, op: ComparisonOp, value: &str) -> Self::Predicate;

    fn is_in(&self, column: Column<'_>, values: &[String]) -> Self::Predicate;

    fn flag(&self, column: Column<'_>, value: bool) -> Self::Predicate;

    fn id_equals(&self, column: Column<'_>, id: i64) -> Self::Predicate;

    /// At least one row of `relation` exists (matching `filter`, if given).
    fn has(&self, relation: &str, filter: Option<Self::Predicate>) -> Result<Self::Predicate, FilterError>;
}

/// Turns AST nodes into predicates, resolving attribute names on the way.
pub struct Compiler<R> {
    resolver: R,
}

impl<R: AttributeResolver> Compiler<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Compiles `node`; `Ok(None)` means the node constrains nothing
    /// (an unknown attribute, or a group made only of those).
    pub fn compile<B: PredicateBuilder>(&self, builder: &B, node: &Node) -> Result<Option<B::Predicate>, FilterError> {
        match node {
            Node::Compound(compound) => self.compile_compound(builder, compound),
            Node::Field(c) => compile_comparison(builder, Column::Field(&c.field), c.operator, &c.value).map(Some),
            Node::Relation(c) => compile_relation(builder, c).map(Some),
            Node::Attribute(c) => self.compile_attribute(builder, c),
        }
    }

    fn compile_compound<B: PredicateBuilder>(
        &self,
        builder: &B,
        compound: &CompoundNode,
    ) -> Result<Option<B::Predicate>, FilterError> {
        let mut parts = Vec::with_capacity(compound.children.len());
        for child in &compound.children {
            if let Some(predicate) = self.compile(builder, child)? {
                parts.push(predicate);
            }
        }

        if parts.is_empty() {
            return Ok(None);
        }
        Ok(Some(builder.group(compound.operator, parts)))
    }

    fn compile_attribute<B: PredicateBuilder>(
        &self,
        builder: &B,
        condition: &AttributeCondition,
    ) -> Result<Option<B::Predicate>, FilterError> {
        let Some(attribute) = self.resolver.resolve(&condition.name)? else {
            debug!(attribute = %condition.name, "unknown attribute, condition ignored");
            return Ok(None);
        };

        // Compared against the raw stored text, whatever the attribute's type.
        let value_column = Column::Related(ATTRIBUTE_VALUES_RELATION, ATTRIBUTE_VALUE_COLUMN);
        let matches_value = builder.group(
            LogicalOp::And,
            vec![
                builder.id_equals(Column::Related(ATTRIBUTE_VALUES_RELATION, ATTRIBUTE_ID_COLUMN), attribute.id),
                compile_comparison(builder, value_column, condition.operator, &condition.value)?,
            ],
        );

        builder.has(ATTRIBUTE_VALUES_RELATION, Some(matches_value)).map(Some)
    }
}

fn compile_comparison<B: PredicateBuilder>(
    builder: &B,
    column: Column<'_>,
    operator: ComparisonOp,
    value: &FilterValue,
) -> Result<B::Predicate, FilterError> {
    match (operator, value) {
        (ComparisonOp::In, FilterValue::Set(values)) => Ok(builder.is_in(column, values)),
        (ComparisonOp::Like, FilterValue::Scalar(value)) => {
            Ok(builder.compare(column, ComparisonOp::Like, &like_pattern(value)))
        }
        (ComparisonOp::In, FilterValue::Scalar(value)) => {
            Err(FilterError::syntax("IN requires a parenthesized value list", value.as_str()))
        }
        (op, FilterValue::Set(_)) => Err(FilterError::syntax(
            format!("Operator {} does not take a value list", op.as_str()),
            value.to_string(),
        )),
        (op, FilterValue::Scalar(value)) => Ok(builder.compare(column, op, value)),
    }
}

fn compile_relation<B: PredicateBuilder>(
    builder: &B,
    condition: &RelationCondition,
) -> Result<B::Predicate, FilterError> {
    let relation = condition.relation.as_str();
    match condition.operator {
        RelationOp::IsAny if relation == LOCATIONS_RELATION => compile_locations(builder, &condition.values),
        RelationOp::HasAny | RelationOp::IsAny => {
            let names = builder.is_in(Column::RelatedName(relation), &condition.values);
            builder.has(relation, Some(names))
        }
        RelationOp::Exists => builder.has(relation, None),
    }
}

/// `remote` tests the primary record's flag; any other token must match the
/// city, state or country of some location. One match of any value suffices.
fn compile_locations<B: PredicateBuilder>(builder: &B, values: &[String]) -> Result<B::Predicate, FilterError> {
    let mut parts = Vec::with_capacity(values.len());
    for value in values {
        if value.eq_ignore_ascii_case(REMOTE_TOKEN) {
            parts.push(builder.flag(Column::RemoteFlag, true));
            continue;
        }

        let place = LOCATION_COLUMNS
            .iter()
            .map(|&column| builder.compare(Column::Related(LOCATIONS_RELATION, column), ComparisonOp::Eq, value))
            .collect();
        parts.push(builder.has(LOCATIONS_RELATION, Some(builder.group(LogicalOp::Or, place)))?);
    }
    Ok(builder.group(LogicalOp::Or, parts))
}

/// Wraps `value` in `%` unless it already starts or ends with one.
pub fn like_pattern(value: &str) -> String {
    if value.starts_with('%') || value.ends_with('%') {
        value.to_string()
    } else {
        format!("%{value}%")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttributeCatalog, AttributeDef, AttributeType};
    use crate::parser::parse_filter;

    /// Renders predicates as plain text so whole trees can be compared.
    struct TextBuilder;

    fn column_name(column: Column<'_>) -> String {
        match column {
            Column::Field(name) => name.to_string(),
            Column::RemoteFlag => "is_remote".to_string(),
            Column::RelatedName(relation) => format!("{relation}.name"),
            Column::Related(relation, name) => format!("{relation}.{name}"),
        }
    }

    impl PredicateBuilder for TextBuilder {
        type Predicate = String;

        fn group(&self, operator: LogicalOp, parts: Vec<String>) -> String {
            let name = match operator {
                LogicalOp::And => "all",
                LogicalOp::Or => "any",
            };
            format!("{name}({})", parts.join(", "))
        }

        fn compare(&self, column: Column<'_>, op: ComparisonOp, value: &str) -> String {
            format!("{} {} {value}", column_name(column), op.as_str())
        }

        fn is_in(&self, column: Column<'_>, values: &[String]) -> String {
            format!("{} IN [{}]", column_name(column), values.join(", "))
        }

        fn flag(&self, column: Column<'_>, value: bool) -> String {
            format!("{} is {value}", column_name(column))
        }

        fn id_equals(&self, column: Column<'_>, id: i64) -> String {
            format!("{} = #{id}", column_name(column))
        }

        fn has(&self, relation: &str, filter: Option<String>) -> Result<String, FilterError> {
            if relation == "skills" {
                return Err(FilterError::UnknownRelation(relation.to_string()));
            }
            Ok(match filter {
                Some(filter) => format!("has {relation}[{filter}]"),
                None => format!("has {relation}"),
            })
        }
    }

    fn catalog() -> AttributeCatalog {
        AttributeCatalog::new()
            .with(1, "years_experience", AttributeType::Number)
            .with(2, "Seniority Level", AttributeType::Select)
    }

    fn compile_text(filter: &str) -> Result<Option<String>, FilterError> {
        let catalog = catalog();
        match parse_filter(filter)? {
            Some(node) => Compiler::new(&catalog).compile(&TextBuilder, &node),
            None => Ok(None),
        }
    }

    #[test]
    fn test_field_and_relation() {
        assert_eq!(
            compile_text("job_type = full-time AND languages HAS_ANY (PHP, Go)").unwrap().unwrap(),
            "all(job_type = full-time, has languages[languages.name IN [PHP, Go]])"
        );
    }

    #[test]
    fn test_nested_groups_stay_nested() {
        assert_eq!(
            compile_text("(job_type = full-time OR job_type = contract) AND is_remote = true").unwrap().unwrap(),
            "all(any(job_type = full-time, job_type = contract), is_remote = true)"
        );
    }

    #[test]
    fn test_in_list() {
        assert_eq!(
            compile_text("job_type = (full-time, part-time)").unwrap().unwrap(),
            "job_type IN [full-time, part-time]"
        );
    }

    #[test]
    fn test_like_wildcards() {
        assert_eq!(compile_text("title LIKE senior").unwrap().unwrap(), "title LIKE %senior%");
        assert_eq!(compile_text("title LIKE senior%").unwrap().unwrap(), "title LIKE senior%");
        assert_eq!(compile_text("title LIKE %senior").unwrap().unwrap(), "title LIKE %senior");
    }

    #[test]
    fn test_not_equal_spellings() {
        assert_eq!(compile_text("status != draft").unwrap().unwrap(), "status != draft");
        assert_eq!(compile_text("status <> draft").unwrap().unwrap(), "status <> draft");
    }

    #[test]
    fn test_locations_is_any() {
        assert_eq!(
            compile_text("locations IS_ANY (Remote, New York)").unwrap().unwrap(),
            concat!(
                "any(is_remote is true, has locations[any(locations.city = New York, ",
                "locations.state = New York, locations.country = New York)])"
            )
        );
    }

    #[test]
    fn test_is_any_on_other_relation_matches_names() {
        assert_eq!(
            compile_text("categories IS_ANY (Web Development)").unwrap().unwrap(),
            "has categories[categories.name IN [Web Development]]"
        );
    }

    #[test]
    fn test_exists() {
        assert_eq!(compile_text("languages EXISTS").unwrap().unwrap(), "has languages");
    }

    #[test]
    fn test_attribute_condition() {
        assert_eq!(
            compile_text("attribute:years_experience >= 3").unwrap().unwrap(),
            "has attribute_values[all(attribute_values.attribute_id = #1, attribute_values.value >= 3)]"
        );
        assert_eq!(
            compile_text("attribute:Seniority Level = (junior, mid)").unwrap().unwrap(),
            "has attribute_values[all(attribute_values.attribute_id = #2, attribute_values.value IN [junior, mid])]"
        );
    }

    #[test]
    fn test_unknown_attribute_is_a_no_op() {
        assert_eq!(compile_text("attribute:nonexistent = 5").unwrap(), None);
        assert_eq!(
            compile_text("job_type = full-time AND attribute:nonexistent = 5").unwrap(),
            compile_text("job_type = full-time").unwrap().map(|p| format!("all({p})"))
        );
        assert_eq!(
            compile_text("(attribute:a = 1 OR attribute:b = 2) AND is_remote = true").unwrap().unwrap(),
            "all(is_remote = true)"
        );
    }

    #[test]
    fn test_unknown_relation_propagates() {
        assert_eq!(
            compile_text("skills HAS_ANY (Rust)").unwrap_err(),
            FilterError::UnknownRelation("skills".to_string())
        );
    }

    /// Resolver whose backing catalog cannot be reached.
    struct UnreachableCatalog;

    impl AttributeResolver for UnreachableCatalog {
        fn resolve(&self, name: &str) -> Result<Option<AttributeDef>, FilterError> {
            Err(FilterError::Catalog(format!("catalog unreachable: {name}")))
        }
    }

    #[test]
    fn test_resolver_failure_aborts_compilation() {
        let filters = [
            "attribute:years_experience >= 3",
            "job_type = full-time OR attribute:years_experience >= 3",
            "(is_remote = true OR attribute:years_experience >= 3) AND languages EXISTS",
        ];
        for filter in filters {
            let node = parse_filter(filter).unwrap().unwrap();
            let err = Compiler::new(UnreachableCatalog).compile(&TextBuilder, &node).unwrap_err();
            assert_eq!(
                err,
                FilterError::Catalog("catalog unreachable: years_experience".to_string()),
                "filter: {filter}"
            );
        }
    }

    #[test]
    fn test_compiling_twice_is_identical() {
        let filter = "(a = 1 OR b LIKE x) AND languages HAS_ANY (Go)";
        assert_eq!(compile_text(filter).unwrap(), compile_text(filter).unwrap());
    }

    #[test]
    fn test_set_value_with_scalar_operator_is_rejected() {
        let node = Node::Field(crate::ast::FieldCondition {
            field: "job_type".to_string(),
            operator: ComparisonOp::Gt,
            value: FilterValue::Set(vec!["a".to_string()]),
        });
        let err = Compiler::new(AttributeCatalog::new()).compile(&TextBuilder, &node).unwrap_err();
        assert!(err.is_syntax());
    }
}
