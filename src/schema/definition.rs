//! Serializable table definitions.
//!
//! This is the shape schema providers hand over (TOML, JSON or YAML files read
//! by the codegen CLI, or any other serde source). Converting into a [`Table`]
//! validates it.

use serde::{Deserialize, Serialize};

use super::{Column, Index, IndexKind, Table, TableId};
use crate::error::GenerationError;

/// Table definition as read from a schema source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    #[serde(default)]
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

/// Column definition; `ordinal_position` defaults to the position in the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal_position: Option<u32>,
    #[serde(default)]
    pub length: u32,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: IndexKindDefinition,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexKindDefinition {
    #[serde(alias = "unique")]
    Unique,
    #[serde(alias = "key", alias = "INDEX", alias = "index")]
    Key,
}

impl From<IndexKindDefinition> for IndexKind {
    fn from(kind: IndexKindDefinition) -> Self {
        match kind {
            IndexKindDefinition::Unique => IndexKind::Unique,
            IndexKindDefinition::Key => IndexKind::Key,
        }
    }
}

impl TryFrom<TableDefinition> for Table {
    type Error = GenerationError;

    fn try_from(def: TableDefinition) -> Result<Self, Self::Error> {
        let columns = def
            .columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| Column {
                name: c.name,
                type_expression: c.type_expression,
                ordinal_position: c.ordinal_position.unwrap_or(i as u32 + 1),
                length: c.length,
                auto_increment: c.auto_increment,
                nullable: c.nullable,
                comment: c.comment.filter(|s| !s.trim().is_empty()),
            })
            .collect();
        let indexes = def
            .indexes
            .into_iter()
            .map(|i| Index {
                name: i.name,
                kind: i.kind.into(),
                columns: i.columns,
            })
            .collect();
        Table::new(TableId::new(def.schema, def.name), columns, def.primary_key, indexes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_from_json() {
        let json = r#"{
            "schema": "foundation",
            "name": "user_basic",
            "columns": [
                {"name": "id", "type": "bigint unsigned", "auto_increment": true},
                {"name": "username", "type": "varchar(32)", "length": 32},
                {"name": "nickname", "type": "varchar(32)", "nullable": true, "comment": "  "}
            ],
            "primary_key": ["id"],
            "indexes": [
                {"name": "idx_username", "type": "UNIQUE", "columns": ["username"]},
                {"name": "idx_nickname", "type": "key", "columns": ["nickname"]}
            ]
        }"#;
        let def: TableDefinition = serde_json::from_str(json).unwrap();
        let table = Table::try_from(def).unwrap();

        assert_eq!(table.id().qualified(), "`foundation`.`user_basic`");
        assert_eq!(table.columns()[2].ordinal_position, 3);
        assert_eq!(table.columns()[2].comment, None);
        assert_eq!(table.indexes()[1].kind, IndexKind::Key);
        assert!(table.columns()[0].auto_increment);
    }

    #[test]
    fn test_invalid_definition_is_unavailable() {
        let json = r#"{"name": "t", "columns": [{"name": "a", "type": "int"}], "primary_key": ["b"]}"#;
        let def: TableDefinition = serde_json::from_str(json).unwrap();
        let err = Table::try_from(def).unwrap_err();
        assert!(matches!(err, GenerationError::TableUnavailable { .. }));
    }
}
