//! Table metadata consumed by every synthesizer.
//!
//! A [`Table`] is built once per generation run, either directly through
//! [`Table::new`] or from a deserialized [`TableDefinition`], and is immutable
//! afterwards. Construction enforces the model invariants:
//!
//! - column names are unique and columns iterate in ordinal order
//! - the primary key is non-empty and names existing columns
//! - every index member names an existing column
//! - at most one column is auto-increment
//!
//! A violation is reported as [`GenerationError::TableUnavailable`], since a
//! table that breaks these rules came from a faulty schema provider rather than
//! from a generation rule.

mod definition;

pub use definition::{ColumnDefinition, IndexDefinition, TableDefinition};

use std::collections::HashSet;
use std::fmt;

use crate::error::{GenerationError, Result};

/// Identity of a table: optional schema plus table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableId {
    schema: String,
    table: String,
}

impl TableId {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Backtick-quoted name used in statement text: `` `schema`.`table` ``,
    /// or `` `table` `` when no schema is set.
    pub fn qualified(&self) -> String {
        if self.schema.is_empty() {
            format!("`{}`", self.table)
        } else {
            format!("`{}`.`{}`", self.schema, self.table)
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.schema.is_empty() {
            write!(f, "{}", self.table)
        } else {
            write!(f, "{}.{}", self.schema, self.table)
        }
    }
}

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Database type as written in DDL, e.g. `bigint(20) unsigned`
    pub type_expression: String,
    /// 1-based declaration position; defines iteration order
    pub ordinal_position: u32,
    pub length: u32,
    pub auto_increment: bool,
    pub nullable: bool,
    pub comment: Option<String>,
}

impl Column {
    /// Column with the given name and type; remaining attributes default to
    /// non-null, no length, no comment.
    pub fn new(name: impl Into<String>, type_expression: impl Into<String>, ordinal_position: u32) -> Self {
        Self {
            name: name.into(),
            type_expression: type_expression.into(),
            ordinal_position,
            length: 0,
            auto_increment: false,
            nullable: false,
            comment: None,
        }
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Kind of a secondary index as reported by the schema provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Unique,
    /// Non-unique (`KEY`)
    Key,
}

/// A secondary index. The primary key is never modelled as an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub kind: IndexKind,
    /// Member column names in key declaration order
    pub columns: Vec<String>,
}

impl Index {
    pub fn unique(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::with_kind(name, IndexKind::Unique, columns)
    }

    pub fn key(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::with_kind(name, IndexKind::Key, columns)
    }

    fn with_kind(name: impl Into<String>, kind: IndexKind, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Which kind of key a [`KeySet`] was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Primary,
    Unique,
    NonUnique,
}

impl KeyKind {
    /// Whether a lookup by this key matches at most one row
    pub fn is_unique(self) -> bool {
        matches!(self, KeyKind::Primary | KeyKind::Unique)
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeyKind::Primary => "PRIMARY",
            KeyKind::Unique => "UNIQUE",
            KeyKind::NonUnique => "NON_UNIQUE",
        };
        f.write_str(s)
    }
}

/// Ordered column group used as a WHERE-clause key.
///
/// Columns keep key declaration order, which is also the order used when
/// deriving operation names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySet<'t> {
    pub kind: KeyKind,
    /// Index name; `None` for the primary key
    pub index_name: Option<&'t str>,
    pub columns: Vec<&'t Column>,
}

impl<'t> KeySet<'t> {
    pub fn column_names(&self) -> Vec<&'t str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.name == column)
    }
}

/// Immutable view of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    id: TableId,
    columns: Vec<Column>,
    primary_key: Vec<String>,
    indexes: Vec<Index>,
}

impl Table {
    /// Validate and build a table. Columns are re-ordered by ordinal position.
    pub fn new(id: TableId, mut columns: Vec<Column>, primary_key: Vec<String>, indexes: Vec<Index>) -> Result<Self> {
        let name = id.to_string();
        if columns.is_empty() {
            return Err(GenerationError::unavailable(&name, "table has no columns"));
        }

        columns.sort_by_key(|c| c.ordinal_position);

        let mut seen = HashSet::new();
        for column in &columns {
            if column.name.is_empty() {
                return Err(GenerationError::unavailable(&name, "column with an empty name"));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(GenerationError::unavailable(
                    &name,
                    format!("duplicate column `{}`", column.name),
                ));
            }
        }

        let auto_increment: Vec<&str> = columns
            .iter()
            .filter(|c| c.auto_increment)
            .map(|c| c.name.as_str())
            .collect();
        if auto_increment.len() > 1 {
            return Err(GenerationError::unavailable(
                &name,
                format!("more than one auto-increment column: {}", auto_increment.join(", ")),
            ));
        }

        if primary_key.is_empty() {
            return Err(GenerationError::unavailable(&name, "primary key is empty"));
        }
        check_members(&name, "primary key", &primary_key, &seen)?;

        for index in &indexes {
            if index.columns.is_empty() {
                return Err(GenerationError::unavailable(
                    &name,
                    format!("index `{}` has no member columns", index.name),
                ));
            }
            check_members(&name, &format!("index `{}`", index.name), &index.columns, &seen)?;
        }

        Ok(Self {
            id,
            columns,
            primary_key,
            indexes,
        })
    }

    pub fn id(&self) -> &TableId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.table()
    }

    /// Columns in ordinal order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Zero-based position of a column in ordinal order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn auto_increment_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.auto_increment)
    }

    pub fn primary_key(&self) -> KeySet<'_> {
        KeySet {
            kind: KeyKind::Primary,
            index_name: None,
            columns: self.resolve(&self.primary_key),
        }
    }

    pub fn unique_indexes(&self) -> impl Iterator<Item = KeySet<'_>> {
        self.index_keys(IndexKind::Unique, KeyKind::Unique)
    }

    pub fn non_unique_indexes(&self) -> impl Iterator<Item = KeySet<'_>> {
        self.index_keys(IndexKind::Key, KeyKind::NonUnique)
    }

    fn index_keys(&self, index_kind: IndexKind, key_kind: KeyKind) -> impl Iterator<Item = KeySet<'_>> {
        self.indexes
            .iter()
            .filter(move |i| i.kind == index_kind)
            .map(move |i| KeySet {
                kind: key_kind,
                index_name: Some(i.name.as_str()),
                columns: self.resolve(&i.columns),
            })
    }

    // Members were checked in `new`, so every name resolves.
    fn resolve(&self, names: &[String]) -> Vec<&Column> {
        names.iter().filter_map(|n| self.column(n)).collect()
    }
}

fn check_members(table: &str, what: &str, members: &[String], known: &HashSet<&str>) -> Result<()> {
    for member in members {
        if !known.contains(member.as_str()) {
            return Err(GenerationError::unavailable(
                table,
                format!("{} references unknown column `{}`", what, member),
            ));
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_qualified_name() {
        assert_eq!(TableId::new("foundation", "user_basic").qualified(), "`foundation`.`user_basic`");
        assert_eq!(TableId::new("", "user_basic").qualified(), "`user_basic`");
    }

    #[test]
    fn test_columns_sorted_by_ordinal() {
        let table = Table::new(
            TableId::new("", "t"),
            vec![Column::new("b", "int", 2), Column::new("a", "int", 1)],
            vec!["a".to_string()],
            vec![],
        )
        .unwrap();
        let names: Vec<_> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(table.position("b"), Some(1));
    }

    #[test]
    fn test_key_sets() {
        let table = user_basic();
        let pk = table.primary_key();
        assert_eq!(pk.kind, KeyKind::Primary);
        assert_eq!(pk.column_names(), vec!["id"]);

        let unique: Vec<_> = table.unique_indexes().collect();
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].index_name, Some("idx_username"));

        let non_unique: Vec<_> = table.non_unique_indexes().collect();
        assert_eq!(non_unique[0].kind, KeyKind::NonUnique);
        assert_eq!(non_unique[0].column_names(), vec!["nickname"]);

        assert_eq!(table.auto_increment_column().map(|c| c.name.as_str()), Some("id"));
    }

    #[test]
    fn test_composite_key_keeps_declaration_order() {
        let table = Table::new(
            TableId::new("", "t"),
            vec![Column::new("a", "int", 1), Column::new("b", "int", 2)],
            vec!["b".to_string(), "a".to_string()],
            vec![],
        )
        .unwrap();
        assert_eq!(table.primary_key().column_names(), vec!["b", "a"]);
    }

    #[test]
    fn test_rejects_empty_primary_key() {
        let err = Table::new(TableId::new("", "t"), vec![Column::new("a", "int", 1)], vec![], vec![]).unwrap_err();
        assert!(matches!(err, GenerationError::TableUnavailable { .. }));
    }

    #[test]
    fn test_rejects_unknown_index_member() {
        let err = Table::new(
            TableId::new("", "t"),
            vec![Column::new("a", "int", 1)],
            vec!["a".to_string()],
            vec![Index::key("idx_b", &["b"])],
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown column `b`"));
    }

    #[test]
    fn test_rejects_duplicate_columns_and_two_auto_increments() {
        let dup = Table::new(
            TableId::new("", "t"),
            vec![Column::new("a", "int", 1), Column::new("a", "int", 2)],
            vec!["a".to_string()],
            vec![],
        );
        assert!(dup.is_err());

        let two = Table::new(
            TableId::new("", "t"),
            vec![
                Column::new("a", "int", 1).auto_increment(),
                Column::new("b", "int", 2).auto_increment(),
            ],
            vec!["a".to_string()],
            vec![],
        );
        assert!(two.unwrap_err().to_string().contains("more than one auto-increment"));
    }
}
