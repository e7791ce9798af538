//! Filter expression engine for job listings.
//!
//! ```text
//! filter string ─ lexer::split_top_level ─ parser ─ condition ─▶ ast::Node
//! ast::Node ─ compiler::Compiler + PredicateBuilder ─▶ sea-query select
//! ```

pub mod ast;
pub mod catalog;
pub mod compiler;
pub mod condition;
pub mod config;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod sql_compiler;
pub mod token;

pub use ast::{
    AttributeCondition, ComparisonOp, CompoundNode, FieldCondition, FilterValue, LogicalOp, Node, RelationCondition,
    RelationOp,
};
pub use catalog::{AttributeCatalog, AttributeDef, AttributeResolver, AttributeType};
pub use compiler::{Column, Compiler, PredicateBuilder};
pub use config::{Dialect, EngineConfig};
pub use engine::FilterEngine;
pub use error::{ErrorBody, FilterError};
pub use parser::parse_filter;
pub use sql_compiler::{CompiledQuery, SqlCompiler};
