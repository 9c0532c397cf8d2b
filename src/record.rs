//! Row record synthesis.

use crate::active_model::TableMetaBuf;
use crate::config::DirtyTracking;
use crate::error::{GenerationError, Result};
use crate::naming::{IdentifierDeriver, NamingConvention};
use crate::schema::{Column, Table, TableId};
use crate::types::{HostType, TypeResolver};

/// Extra per-column attributes supplied by the caller.
///
/// Whatever the hook returns is copied into [`RecordField::attributes`]
/// untouched; the emitter decides what to do with it.
pub trait MetadataHook {
    fn attributes(&self, table: &Table, column: &Column) -> Vec<String>;
}

impl<F> MetadataHook for F
where
    F: Fn(&Table, &Column) -> Vec<String>,
{
    fn attributes(&self, table: &Table, column: &Column) -> Vec<String> {
        self(table, column)
    }
}

/// One field of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    pub column: String,
    pub name: String,
    pub host: HostType,
    pub nullable: bool,
    pub auto_increment: bool,
    /// Paired dirty-flag name; `None` when tracking is disabled
    pub dirty_flag: Option<String>,
    pub comment: Option<String>,
    pub attributes: Vec<String>,
}

/// Shape of the row record for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordShape {
    pub table: TableId,
    pub type_name: String,
    /// Name of a record-valued parameter, e.g. `userBasic`
    pub parameter_name: String,
    /// Fields in column order
    pub fields: Vec<RecordField>,
}

impl RecordShape {
    pub fn field(&self, column: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// Metadata the renderer needs, owned
    pub fn meta(&self, table: &Table) -> TableMetaBuf {
        TableMetaBuf {
            table: table.id().qualified(),
            columns: self
                .fields
                .iter()
                .map(|f| (f.column.clone(), f.name.clone()))
                .collect(),
            primary_key: table.primary_key().column_names().iter().map(|c| c.to_string()).collect(),
            auto_increment: table.auto_increment_column().map(|c| c.name.clone()),
        }
    }
}

pub struct RecordSynthesizer<'a> {
    naming: &'a NamingConvention,
    resolver: &'a dyn TypeResolver,
    dirty_tracking: DirtyTracking,
    hook: Option<&'a dyn MetadataHook>,
}

impl<'a> RecordSynthesizer<'a> {
    pub fn new(naming: &'a NamingConvention, resolver: &'a dyn TypeResolver, dirty_tracking: DirtyTracking) -> Self {
        Self {
            naming,
            resolver,
            dirty_tracking,
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: &'a dyn MetadataHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Build the record shape. Any failing column fails the whole table.
    pub fn synthesize(&self, table: &Table) -> Result<RecordShape> {
        let type_name = self.naming.to_type_name(table.name())?;
        let mut deriver = IdentifierDeriver::new(self.naming, table.name());

        let mut fields = Vec::with_capacity(table.columns().len());
        for column in table.columns() {
            let name = deriver.field_name(&column.name)?;
            let host = self
                .resolver
                .resolve(&column.type_expression)
                .ok_or_else(|| GenerationError::UnsupportedColumnType {
                    table: table.id().to_string(),
                    column: column.name.clone(),
                    type_expression: column.type_expression.clone(),
                })?;
            let attributes = self
                .hook
                .map(|h| h.attributes(table, column))
                .unwrap_or_default();
            fields.push(RecordField {
                column: column.name.clone(),
                name,
                host,
                nullable: column.nullable,
                auto_increment: column.auto_increment,
                dirty_flag: None,
                comment: column.comment.clone(),
                attributes,
            });
        }

        // Flags are claimed after every field so a flag colliding with a
        // later column's field is caught as well.
        if self.dirty_tracking == DirtyTracking::Flags {
            for field in &mut fields {
                field.dirty_flag = Some(deriver.dirty_flag_name(&field.name)?);
            }
        }

        log::debug!("record {} for {}: {} fields", type_name, table.id(), fields.len());
        Ok(RecordShape {
            table: table.id().clone(),
            parameter_name: self.naming.to_parameter_name(&type_name),
            type_name,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::user_basic;
    use crate::schema::{Column, TableId};
    use crate::types::MysqlTypeResolver;

    #[test]
    fn test_user_basic_record() {
        let naming = NamingConvention::default();
        let resolver = MysqlTypeResolver::default();
        let record = RecordSynthesizer::new(&naming, &resolver, DirtyTracking::Flags)
            .synthesize(&user_basic())
            .unwrap();

        assert_eq!(record.type_name, "UserBasic");
        assert_eq!(record.parameter_name, "userBasic");
        let names: Vec<_> = record.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "username", "nickname", "status", "createTime"]);

        let id = record.field("id").unwrap();
        assert_eq!(id.host, HostType::U64);
        assert_eq!(id.dirty_flag.as_deref(), Some("idIsSet"));
        assert!(record.field("nickname").unwrap().nullable);
    }

    #[test]
    fn test_dirty_tracking_disabled() {
        let naming = NamingConvention::default();
        let resolver = MysqlTypeResolver::default();
        let record = RecordSynthesizer::new(&naming, &resolver, DirtyTracking::Disabled)
            .synthesize(&user_basic())
            .unwrap();
        assert!(record.fields.iter().all(|f| f.dirty_flag.is_none()));
    }

    #[test]
    fn test_unsupported_type_fails_table() {
        let table = Table::new(
            TableId::new("", "shape"),
            vec![Column::new("id", "int", 1), Column::new("area", "polygon", 2)],
            vec!["id".to_string()],
            vec![],
        )
        .unwrap();
        let naming = NamingConvention::default();
        let resolver = MysqlTypeResolver::default();
        let err = RecordSynthesizer::new(&naming, &resolver, DirtyTracking::Flags)
            .synthesize(&table)
            .unwrap_err();
        assert_eq!(
            err,
            GenerationError::UnsupportedColumnType {
                table: "shape".to_string(),
                column: "area".to_string(),
                type_expression: "polygon".to_string(),
            }
        );
    }

    #[test]
    fn test_dirty_flag_collision() {
        let table = Table::new(
            TableId::new("", "t"),
            vec![Column::new("name", "varchar(8)", 1), Column::new("name_is_set", "bool", 2)],
            vec!["name".to_string()],
            vec![],
        )
        .unwrap();
        let naming = NamingConvention::default();
        let resolver = MysqlTypeResolver::default();
        let synth = RecordSynthesizer::new(&naming, &resolver, DirtyTracking::Flags);
        assert!(matches!(synth.synthesize(&table), Err(GenerationError::NameCollision { .. })));

        let relaxed = RecordSynthesizer::new(&naming, &resolver, DirtyTracking::Disabled);
        assert!(relaxed.synthesize(&table).is_ok());
    }

    #[test]
    fn test_metadata_hook_passes_through() {
        let naming = NamingConvention::default();
        let resolver = MysqlTypeResolver::default();
        let hook = |_: &Table, column: &Column| {
            if column.auto_increment {
                vec!["#[serde(skip_deserializing)]".to_string()]
            } else {
                Vec::new()
            }
        };
        let record = RecordSynthesizer::new(&naming, &resolver, DirtyTracking::Flags)
            .with_hook(&hook)
            .synthesize(&user_basic())
            .unwrap();
        assert_eq!(record.fields[0].attributes, vec!["#[serde(skip_deserializing)]"]);
        assert!(record.fields[1].attributes.is_empty());
    }

    #[test]
    fn test_meta_buf() {
        let naming = NamingConvention::default();
        let resolver = MysqlTypeResolver::default();
        let table = user_basic();
        let record = RecordSynthesizer::new(&naming, &resolver, DirtyTracking::Flags)
            .synthesize(&table)
            .unwrap();
        let meta = record.meta(&table);
        assert_eq!(meta.table, "`foundation`.`user_basic`");
        assert_eq!(meta.columns[4], ("create_time".to_string(), "createTime".to_string()));
        assert_eq!(meta.auto_increment.as_deref(), Some("id"));
    }
}
