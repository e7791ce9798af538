//! Filter的语法分析器
//!
//! ## 解析流程图
//!
//! ```text
//! parse()
//!   ├─ 去掉包裹整个输入的一层括号 (只去一次)
//!   ├─ split_top_level() → 顶层片段 + 运算符
//!   │   ├─ 无片段 → None (不过滤)
//!   │   ├─ 单个片段且无运算符 → parse_segment()
//!   │   └─ 多个片段 → CompoundNode { operator, children }
//!   │
//!   └─ parse_segment()
//!        ├─ 整段被括号包裹 → 去掉一层括号, 递归解析该分组
//!        └─ 其他 → condition::parse_condition()
//! ```
//!
//! ## 运算符规则
//!
//! 同一层级只能出现一种逻辑运算符. `A AND B OR C` 是语法错误,
//! 必须写成 `(A AND B) OR C` 或 `A AND (B OR C)`.
//!
//! ## 解析示例
//!
//! ```text
//! job_type = full-time AND languages HAS_ANY (PHP, Go)
//! (job_type = full-time OR job_type = contract) AND is_remote = true
//! locations IS_ANY (remote, New York) AND attribute:years_experience >= 3
//! ```

use tracing::debug;

use crate::ast::{CompoundNode, Node};
use crate::condition::parse_condition;
use crate::error::FilterError;
use crate::lexer::{split_top_level, strip_enclosing_group, Split};

/// Groups nested deeper than this are rejected rather than recursed into.
pub const MAX_NESTING_DEPTH: usize = 64;

pub struct Parser<'a> {
    input: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Parses the whole filter. `Ok(None)` means there is nothing to filter on.
    pub fn parse(&self) -> Result<Option<Node>, FilterError> {
        let text = self.input.trim();
        let text = strip_enclosing_group(text).unwrap_or(text);

        let split = split_top_level(text)?;
        if split.segments.is_empty() {
            debug!("empty filter, nothing to parse");
            return Ok(None);
        }

        let node = self.parse_level(split, 0)?;
        debug!(filter = self.input, ast = %node, "parsed filter");
        Ok(Some(node))
    }

    /// Builds the node for one nesting level.
    fn parse_level(&self, split: Split<'_>, depth: usize) -> Result<Node, FilterError> {
        match split.operator {
            None => self.parse_segment(split.segments[0], depth),
            Some(operator) => {
                let children = split
                    .segments
                    .iter()
                    .map(|segment| self.parse_segment(segment, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::Compound(CompoundNode { operator, children }))
            }
        }
    }

    fn parse_segment(&self, segment: &str, depth: usize) -> Result<Node, FilterError> {
        let Some(inner) = strip_enclosing_group(segment) else {
            return parse_condition(segment);
        };

        if depth + 1 > MAX_NESTING_DEPTH {
            return Err(FilterError::syntax("Filter is nested too deeply", segment));
        }

        let split = split_top_level(inner)?;
        if split.segments.is_empty() {
            return Err(FilterError::syntax("Empty group", segment));
        }
        self.parse_level(split, depth + 1)
    }
}

/// Parses `input` into an AST; `Ok(None)` for an empty filter.
pub fn parse_filter(input: &str) -> Result<Option<Node>, FilterError> {
    Parser::new(input).parse()
}
