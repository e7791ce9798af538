//! Parsing of a single leaf clause.
//!
//! ## Classification (first match wins)
//!
//! ```text
//! "<relation> HAS_ANY (v1, v2)"   → RelationCondition { HasAny }
//! "<relation> IS_ANY (v1, v2)"    → RelationCondition { IsAny }
//! "<relation> EXISTS"             → RelationCondition { Exists }
//! "attribute:<name> <op> <value>" → AttributeCondition
//! "<field> <op> <value>"          → FieldCondition
//! "<field> <value>"               → FieldCondition with implicit `=`
//! ```
//!
//! `<op>` must be surrounded by single spaces. Operators are tried in the
//! order of [`COMPARISON_OPERATORS`], so `>=` wins over `>` and `=`.
//! `<field> = (a, b, c)` becomes an `IN` over the listed values.

use crate::ast::{AttributeCondition, ComparisonOp, FieldCondition, FilterValue, Node, RelationCondition, RelationOp};
use crate::error::FilterError;

/// Two-character operators come before their one-character prefixes.
pub const COMPARISON_OPERATORS: [(&str, ComparisonOp); 8] = [
    (">=", ComparisonOp::Gte),
    ("<=", ComparisonOp::Lte),
    ("<>", ComparisonOp::LtGt),
    ("!=", ComparisonOp::NotEq),
    ("=", ComparisonOp::Eq),
    (">", ComparisonOp::Gt),
    ("<", ComparisonOp::Lt),
    ("LIKE", ComparisonOp::Like),
];

pub const ATTRIBUTE_PREFIX: &str = "attribute:";

/// Parses one leaf segment into a field, relation or attribute node.
pub fn parse_condition(segment: &str) -> Result<Node, FilterError> {
    let condition = segment.trim();

    if condition.contains(" HAS_ANY ") {
        return parse_relation_condition(condition, RelationOp::HasAny);
    }
    if condition.contains(" IS_ANY ") {
        return parse_relation_condition(condition, RelationOp::IsAny);
    }
    if condition.contains(" EXISTS") {
        return parse_exists_condition(condition);
    }

    if let Some(rest) = condition.strip_prefix(ATTRIBUTE_PREFIX) {
        let (name, operator, value) = parse_comparison(rest, condition)?;
        return Ok(Node::Attribute(AttributeCondition { name, operator, value }));
    }

    let (field, operator, value) = parse_comparison(condition, condition)?;
    Ok(Node::Field(FieldCondition { field, operator, value }))
}

/// `languages HAS_ANY (PHP, JavaScript)`
fn parse_relation_condition(condition: &str, operator: RelationOp) -> Result<Node, FilterError> {
    let keyword = format!(" {} ", operator.as_str());
    let (relation, values) = condition
        .split_once(keyword.as_str())
        .ok_or_else(|| FilterError::syntax(format!("Invalid {} condition", operator.as_str()), condition))?;

    let relation = relation.trim();
    if relation.is_empty() {
        return Err(FilterError::syntax("Missing relation name", condition));
    }

    let values = parse_value_list(values).ok_or_else(|| {
        FilterError::syntax(
            format!("Invalid format for {} condition, expected a parenthesized list", operator.as_str()),
            condition,
        )
    })??;

    Ok(Node::Relation(RelationCondition {
        relation: relation.to_string(),
        operator,
        values,
    }))
}

/// `categories EXISTS`
fn parse_exists_condition(condition: &str) -> Result<Node, FilterError> {
    let (relation, rest) = condition
        .split_once(" EXISTS")
        .ok_or_else(|| FilterError::syntax("Invalid EXISTS condition", condition))?;

    if !rest.trim().is_empty() {
        return Err(FilterError::syntax("Unexpected text after EXISTS", condition));
    }

    Ok(Node::Relation(RelationCondition {
        relation: relation.trim().to_string(),
        operator: RelationOp::Exists,
        values: Vec::new(),
    }))
}

/// Splits `<name> <op> <value>`; `whole` is only used for error messages.
fn parse_comparison(text: &str, whole: &str) -> Result<(String, ComparisonOp, FilterValue), FilterError> {
    for (token, op) in COMPARISON_OPERATORS {
        let needle = format!(" {token} ");
        let Some((name, value)) = text.split_once(needle.as_str()) else {
            continue;
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(FilterError::syntax("Missing name before operator", whole));
        }

        if op == ComparisonOp::Eq {
            if let Some(values) = parse_in_list(value) {
                return Ok((name.to_string(), ComparisonOp::In, FilterValue::Set(values?)));
            }
        }

        return Ok((name.to_string(), op, FilterValue::Scalar(clean_value(value))));
    }

    // implicit equality: `job_type full-time`
    if let Some((name, value)) = text.trim().split_once(char::is_whitespace) {
        return Ok((
            name.to_string(),
            ComparisonOp::Eq,
            FilterValue::Scalar(clean_value(value)),
        ));
    }

    Err(FilterError::syntax("Invalid condition format", whole))
}

/// Parses `(a, b, c)` into its trimmed, de-quoted elements.
///
/// Returns `None` when `text` is not a parenthesized list at all, and
/// `Some(Err(..))` when it is one but holds an empty element.
fn parse_value_list(text: &str) -> Option<Result<Vec<String>, FilterError>> {
    let text = text.trim();
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;
    Some(split_list(inner, text))
}

/// The value side of `=` holding `(` and `)` is an IN over the first
/// parenthesized group; text around the group is ignored.
///
/// A value wrapped in quotes as a whole stays a scalar.
fn parse_in_list(value: &str) -> Option<Result<Vec<String>, FilterError>> {
    let value = value.trim();
    if unquote(value).is_some() || !(value.contains('(') && value.contains(')')) {
        return None;
    }

    let group = value
        .find('(')
        .and_then(|open| value[open..].find(')').map(|len| &value[open + 1..open + len]));
    match group {
        Some(inner) => Some(split_list(inner, value)),
        None => Some(Err(FilterError::syntax("Invalid format for IN condition", value))),
    }
}

fn split_list(inner: &str, text: &str) -> Result<Vec<String>, FilterError> {
    let values: Vec<String> = inner.split(',').map(clean_value).collect();
    if values.iter().any(String::is_empty) {
        return Err(FilterError::syntax("Empty value in list", text));
    }
    Ok(values)
}

/// The inside of `value` when one pair of matching quotes wraps all of it.
fn unquote(value: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|quote| {
        (value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote)).then(|| &value[1..value.len() - 1])
    })
}

/// Trims `value` and removes one pair of matching outer quotes.
///
/// No escape processing: an embedded quote character is kept as-is.
pub fn clean_value(value: &str) -> String {
    let value = value.trim();
    unquote(value).unwrap_or(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(node: Node) -> FieldCondition {
        match node {
            Node::Field(c) => c,
            other => panic!("Expected field condition, got {other:?}"),
        }
    }

    fn relation(node: Node) -> RelationCondition {
        match node {
            Node::Relation(c) => c,
            other => panic!("Expected relation condition, got {other:?}"),
        }
    }

    fn scalar(s: &str) -> FilterValue {
        FilterValue::Scalar(s.to_string())
    }

    #[test]
    fn test_simple_field_condition() {
        let c = field(parse_condition("job_type = full-time").unwrap());
        assert_eq!(c.field, "job_type");
        assert_eq!(c.operator, ComparisonOp::Eq);
        assert_eq!(c.value, scalar("full-time"));
    }

    #[test]
    fn test_two_character_operators_win() {
        let cases = [
            ("salary_min >= 50000", ComparisonOp::Gte),
            ("salary_max <= 90000", ComparisonOp::Lte),
            ("status <> draft", ComparisonOp::LtGt),
            ("status != archived", ComparisonOp::NotEq),
            ("salary_min > 1", ComparisonOp::Gt),
            ("salary_min < 1", ComparisonOp::Lt),
            ("title LIKE senior", ComparisonOp::Like),
        ];
        for (input, expected) in cases {
            let c = field(parse_condition(input).unwrap());
            assert_eq!(c.operator, expected, "input: {input}");
        }
    }

    #[test]
    fn test_quoted_values_are_cleaned() {
        let single = field(parse_condition("job_type = 'full-time'").unwrap());
        let double = field(parse_condition("job_type = \"full-time\"").unwrap());
        let bare = field(parse_condition("job_type = full-time").unwrap());
        assert_eq!(single, bare);
        assert_eq!(double, bare);
    }

    #[test]
    fn test_embedded_quotes_pass_through() {
        let c = field(parse_condition("company_name = 'O'Reilly'").unwrap());
        assert_eq!(c.value, scalar("O'Reilly"));

        let c = field(parse_condition("company_name = O'Reilly").unwrap());
        assert_eq!(c.value, scalar("O'Reilly"));
    }

    #[test]
    fn test_in_list() {
        let c = field(parse_condition("job_type = ( full-time ,part-time,  'contract' )").unwrap());
        assert_eq!(c.operator, ComparisonOp::In);
        assert_eq!(
            c.value,
            FilterValue::Set(vec!["full-time".into(), "part-time".into(), "contract".into()])
        );
    }

    #[test]
    fn test_in_list_with_empty_element_is_error() {
        assert!(parse_condition("job_type = (a,,b)").unwrap_err().is_syntax());
        assert!(parse_condition("job_type = ()").unwrap_err().is_syntax());
    }

    #[test]
    fn test_in_list_takes_first_group_of_value() {
        let c = field(parse_condition("job_type = (full-time, contract) extra").unwrap());
        assert_eq!(c.operator, ComparisonOp::In);
        assert_eq!(c.value, FilterValue::Set(vec!["full-time".into(), "contract".into()]));

        let c = field(parse_condition("title = Engineer (Senior)").unwrap());
        assert_eq!(c.operator, ComparisonOp::In);
        assert_eq!(c.value, FilterValue::Set(vec!["Senior".into()]));
    }

    #[test]
    fn test_quoted_value_with_parens_stays_scalar() {
        let c = field(parse_condition("title = 'Engineer (Senior)'").unwrap());
        assert_eq!(c.operator, ComparisonOp::Eq);
        assert_eq!(c.value, scalar("Engineer (Senior)"));
    }

    #[test]
    fn test_in_list_closed_before_opened_is_error() {
        let err = parse_condition("title = a) (b").unwrap_err();
        assert_eq!(err, FilterError::syntax("Invalid format for IN condition", "a) (b"));
    }

    #[test]
    fn test_other_operators_keep_parens_in_value() {
        let c = field(parse_condition("title != Engineer (Senior)").unwrap());
        assert_eq!(c.operator, ComparisonOp::NotEq);
        assert_eq!(c.value, scalar("Engineer (Senior)"));
    }

    #[test]
    fn test_implicit_equality() {
        let c = field(parse_condition("job_type full-time").unwrap());
        assert_eq!(c.field, "job_type");
        assert_eq!(c.operator, ComparisonOp::Eq);
        assert_eq!(c.value, scalar("full-time"));
    }

    #[test]
    fn test_single_word_is_error() {
        let err = parse_condition("remote").unwrap_err();
        assert_eq!(
            err,
            FilterError::syntax("Invalid condition format", "remote")
        );
    }

    #[test]
    fn test_has_any() {
        let c = relation(parse_condition("languages HAS_ANY (PHP, JavaScript)").unwrap());
        assert_eq!(c.relation, "languages");
        assert_eq!(c.operator, RelationOp::HasAny);
        assert_eq!(c.values, vec!["PHP".to_string(), "JavaScript".to_string()]);
    }

    #[test]
    fn test_is_any_locations() {
        let c = relation(parse_condition("locations IS_ANY (remote, New York)").unwrap());
        assert_eq!(c.relation, "locations");
        assert_eq!(c.operator, RelationOp::IsAny);
        assert_eq!(c.values, vec!["remote".to_string(), "New York".to_string()]);
    }

    #[test]
    fn test_relation_without_list_is_error() {
        let err = parse_condition("languages HAS_ANY PHP").unwrap_err();
        assert!(err.is_syntax());
        assert!(err.to_string().contains("languages HAS_ANY PHP"));
    }

    #[test]
    fn test_exists() {
        let c = relation(parse_condition("categories EXISTS").unwrap());
        assert_eq!(c.relation, "categories");
        assert_eq!(c.operator, RelationOp::Exists);
        assert!(c.values.is_empty());

        assert!(parse_condition("categories EXISTS now").is_err());
    }

    #[test]
    fn test_attribute_condition() {
        match parse_condition("attribute:years_experience >= 3").unwrap() {
            Node::Attribute(c) => {
                assert_eq!(c.name, "years_experience");
                assert_eq!(c.operator, ComparisonOp::Gte);
                assert_eq!(c.value, scalar("3"));
            }
            other => panic!("Expected attribute condition, got {other:?}"),
        }
    }

    #[test]
    fn test_attribute_name_with_spaces_and_in_list() {
        match parse_condition("attribute:Seniority Level = (junior, mid)").unwrap() {
            Node::Attribute(c) => {
                assert_eq!(c.name, "Seniority Level");
                assert_eq!(c.operator, ComparisonOp::In);
                assert_eq!(c.value, FilterValue::Set(vec!["junior".into(), "mid".into()]));
            }
            other => panic!("Expected attribute condition, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_name_before_operator() {
        assert!(parse_condition("attribute: = 5").is_err());
    }

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value("  'a b'  "), "a b");
        assert_eq!(clean_value("\"x\""), "x");
        assert_eq!(clean_value("'"), "'");
        assert_eq!(clean_value("'mixed\""), "'mixed\"");
    }
}
