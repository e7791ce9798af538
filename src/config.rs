//! 配置模块，负责加载JSON配置文件

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::catalog::{AttributeCatalog, AttributeDef};
use crate::compiler::ATTRIBUTE_VALUES_RELATION;

/// 配置错误
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "配置错误: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// SQL dialect used when rendering a compiled query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Mysql,
    Sqlite,
}

/// 引擎配置: 方言, 表结构映射, 属性目录
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dialect: Dialect,
    pub schema: SchemaConfig,
    pub attributes: Vec<AttributeDef>,
}

/// Where the job listings and their relations live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub primary_table: String,
    pub primary_key: String,
    /// Boolean column consulted by `locations IS_ANY (remote, ...)`.
    pub remote_column: String,
    /// 关联名 → 表映射
    pub relations: HashMap<String, RelationMapping>,
}

/// A to-many relation of the primary record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationMapping {
    /// Table holding the related rows.
    pub table: String,
    /// Column holding the primary record's id; on the pivot table when there is one.
    pub foreign_key: String,
    /// Many-to-many relations go through a pivot table.
    #[serde(default)]
    pub pivot: Option<PivotTable>,
    #[serde(default = "default_key")]
    pub key: String,
    /// Column compared by `HAS_ANY` / `IS_ANY`.
    #[serde(default = "default_name_column")]
    pub name_column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    pub table: String,
    /// Pivot column pointing at the related row.
    pub related_key: String,
}

fn default_key() -> String {
    "id".to_string()
}

fn default_name_column() -> String {
    "name".to_string()
}

impl RelationMapping {
    /// One-to-many relation: `table.foreign_key` points at the primary record.
    pub fn direct(table: &str, foreign_key: &str, name_column: &str) -> Self {
        Self {
            table: table.to_string(),
            foreign_key: foreign_key.to_string(),
            pivot: None,
            key: default_key(),
            name_column: name_column.to_string(),
        }
    }

    /// Many-to-many relation through `pivot(foreign_key, related_key)`.
    pub fn through(table: &str, pivot: &str, foreign_key: &str, related_key: &str, name_column: &str) -> Self {
        Self {
            table: table.to_string(),
            foreign_key: foreign_key.to_string(),
            pivot: Some(PivotTable {
                table: pivot.to_string(),
                related_key: related_key.to_string(),
            }),
            key: default_key(),
            name_column: name_column.to_string(),
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        let mut relations = HashMap::new();
        relations.insert(
            "languages".to_string(),
            RelationMapping::through("languages", "job_language", "job_listing_id", "language_id", "name"),
        );
        relations.insert(
            "categories".to_string(),
            RelationMapping::through("categories", "job_category", "job_listing_id", "category_id", "name"),
        );
        relations.insert(
            "locations".to_string(),
            RelationMapping::through("locations", "job_location", "job_listing_id", "location_id", "city"),
        );
        relations.insert(
            ATTRIBUTE_VALUES_RELATION.to_string(),
            RelationMapping::direct("job_attribute_values", "job_listing_id", "value"),
        );

        Self {
            primary_table: "job_listings".to_string(),
            primary_key: "id".to_string(),
            remote_column: "is_remote".to_string(),
            relations,
        }
    }
}

impl SchemaConfig {
    pub fn relation(&self, name: &str) -> Option<&RelationMapping> {
        self.relations.get(name)
    }
}

impl EngineConfig {
    /// 从JSON文件加载配置, 缺省字段使用默认值
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ConfigError::new(format!(
                "配置文件不存在: {}",
                path_ref.display()
            )));
        }

        let content = fs::read_to_string(path_ref).map_err(|e| {
            ConfigError::new(format!("无法读取配置文件 {}: {}", path_ref.display(), e))
        })?;

        Self::from_json_str(&content).map_err(|e| {
            ConfigError::new(format!("无法解析JSON配置文件 {}: {}", path_ref.display(), e.message))
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::new(e.to_string()))
    }

    /// 由配置中的属性定义构建属性目录
    pub fn catalog(&self) -> AttributeCatalog {
        self.attributes.iter().cloned().collect()
    }
}
