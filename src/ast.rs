use std::fmt;

/// AST 的节点, 代表一个已解析的过滤表达式
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// 同一运算符连接的子表达式
    Compound(CompoundNode),
    /// 主记录上直接存储的字段条件
    Field(FieldCondition),
    /// 一对多关联条件
    Relation(RelationCondition),
    /// EAV 扩展属性条件
    Attribute(AttributeCondition),
}

/// Children combined under one logical operator.
///
/// Never empty. Mixing AND and OR requires a nested `CompoundNode`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundNode {
    pub operator: LogicalOp,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// A test against a column of the primary record, e.g. `job_type = full-time`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCondition {
    pub field: String,
    pub operator: ComparisonOp,
    pub value: FilterValue,
}

/// A test over a to-many association, e.g. `languages HAS_ANY (PHP, Go)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationCondition {
    pub relation: String,
    pub operator: RelationOp,
    /// Empty for `EXISTS`.
    pub values: Vec<String>,
}

/// A test against one EAV attribute, e.g. `attribute:years_experience >= 3`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeCondition {
    /// Human-readable attribute name, resolved against the catalog at compile time.
    pub name: String,
    pub operator: ComparisonOp,
    pub value: FilterValue,
}

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,    // =
    NotEq, // !=
    LtGt,  // <>
    Gt,    // >
    Lt,    // <
    Gte,   // >=
    Lte,   // <=
    Like,  // LIKE
    In,    // = (a, b, c)
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "!=",
            ComparisonOp::LtGt => "<>",
            ComparisonOp::Gt => ">",
            ComparisonOp::Lt => "<",
            ComparisonOp::Gte => ">=",
            ComparisonOp::Lte => "<=",
            ComparisonOp::Like => "LIKE",
            ComparisonOp::In => "IN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationOp {
    HasAny,
    IsAny,
    Exists,
}

impl RelationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationOp::HasAny => "HAS_ANY",
            RelationOp::IsAny => "IS_ANY",
            RelationOp::Exists => "EXISTS",
        }
    }
}

/// 字面量值. `Set` only appears together with [`ComparisonOp::In`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(String),
    Set(Vec<String>),
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => f.write_str("AND"),
            LogicalOp::Or => f.write_str("OR"),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Scalar(value) => f.write_str(value),
            FilterValue::Set(values) => write!(f, "({})", values.join(", ")),
        }
    }
}

/// Renders the node back into filter syntax, with every group parenthesised.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Compound(compound) => {
                f.write_str("(")?;
                for (i, child) in compound.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", compound.operator)?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
            Node::Field(c) => write_comparison(f, &c.field, c.operator, &c.value),
            Node::Attribute(c) => {
                f.write_str("attribute:")?;
                write_comparison(f, &c.name, c.operator, &c.value)
            }
            Node::Relation(c) => match c.operator {
                RelationOp::Exists => write!(f, "{} EXISTS", c.relation),
                op => write!(f, "{} {} ({})", c.relation, op.as_str(), c.values.join(", ")),
            },
        }
    }
}

fn write_comparison(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    op: ComparisonOp,
    value: &FilterValue,
) -> fmt::Result {
    // IN is written the way it is typed: `field = (a, b)`
    let op = if op == ComparisonOp::In { "=" } else { op.as_str() };
    write!(f, "{name} {op} {value}")
}
