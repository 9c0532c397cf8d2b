//! Accessor synthesis: the list of operations one table exposes.
//!
//! Order is fixed:
//!
//! 1. table-level inserts (generated-key variants only with an auto-increment column)
//! 2. primary key: update, delete, select, select for update, batch select
//! 3. each unique index: the same family as the primary key
//! 4. each non-unique index: select (paged list) and count
//! 5. select-one, select-list and count by example

use crate::error::Result;
use crate::naming::{IdentifierDeriver, NamingConvention};
use crate::record::RecordShape;
use crate::schema::{KeySet, Table};
use crate::statement::{Parameter, ReturnShape, StatementKind, StatementSynthesizer, StatementTemplate};

/// A named accessor method bound to its statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub template: StatementTemplate,
}

impl Operation {
    pub fn parameters(&self) -> &[Parameter] {
        &self.template.parameters
    }

    pub fn returns(&self) -> ReturnShape {
        self.template.returns
    }
}

const KEY_FAMILY: [StatementKind; 5] = [
    StatementKind::Update,
    StatementKind::Delete,
    StatementKind::Select,
    StatementKind::SelectForUpdate,
    StatementKind::BatchSelect,
];

const NON_UNIQUE_FAMILY: [StatementKind; 2] = [StatementKind::Select, StatementKind::Count];

const BY_EXAMPLE: [StatementKind; 3] = [
    StatementKind::SelectOneByExample,
    StatementKind::SelectListByExample,
    StatementKind::CountByExample,
];

pub struct AccessorSynthesizer<'a> {
    naming: &'a NamingConvention,
    ordering: bool,
}

impl<'a> AccessorSynthesizer<'a> {
    pub fn new(naming: &'a NamingConvention, ordering: bool) -> Self {
        Self { naming, ordering }
    }

    pub fn synthesize(&self, table: &Table, record: &RecordShape) -> Result<Vec<Operation>> {
        let statements = StatementSynthesizer::new(table, record, self.naming, self.ordering);
        let mut scope = IdentifierDeriver::new(self.naming, table.name());
        let mut operations = Vec::new();
        let pk = table.primary_key();

        let mut push = |key: &KeySet<'_>, kind: StatementKind| -> Result<()> {
            let template = statements.synthesize(key, kind)?;
            let scope_key = (!kind.is_table_level()).then_some(key);
            let name = scope.operation_name(template.name.clone(), &format!("{:?}", kind), scope_key)?;
            operations.push(Operation { name, template });
            Ok(())
        };

        push(&pk, StatementKind::Insert)?;
        if table.auto_increment_column().is_some() {
            push(&pk, StatementKind::InsertUseGeneratedKeys)?;
        }
        push(&pk, StatementKind::BatchInsert)?;
        if table.auto_increment_column().is_some() {
            push(&pk, StatementKind::BatchInsertUseGeneratedKeys)?;
        }

        for kind in KEY_FAMILY {
            push(&pk, kind)?;
        }
        for key in table.unique_indexes() {
            for kind in KEY_FAMILY {
                push(&key, kind)?;
            }
        }
        for key in table.non_unique_indexes() {
            for kind in NON_UNIQUE_FAMILY {
                push(&key, kind)?;
            }
        }
        for kind in BY_EXAMPLE {
            push(&pk, kind)?;
        }

        log::debug!("{}: {} operations", table.id(), operations.len());
        Ok(operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirtyTracking;
    use crate::error::GenerationError;
    use crate::record::RecordSynthesizer;
    use crate::schema::fixtures::{user_basic, user_role};
    use crate::schema::{Column, Index, TableId};
    use crate::types::MysqlTypeResolver;

    fn operations(table: &Table) -> Result<Vec<Operation>> {
        let naming = NamingConvention::default();
        let record = RecordSynthesizer::new(&naming, &MysqlTypeResolver::default(), DirtyTracking::Flags)
            .synthesize(table)?;
        AccessorSynthesizer::new(&naming, true).synthesize(table, &record)
    }

    #[test]
    fn test_user_basic_operations() {
        let ops = operations(&user_basic()).unwrap();
        let names: Vec<_> = ops.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "insert",
                "insertUseGeneratedKeys",
                "batchInsert",
                "batchInsertUseGeneratedKeys",
                "updateByPrimaryKey",
                "deleteByPrimaryKey",
                "selectByPrimaryKey",
                "selectByPrimaryKeyForUpdate",
                "batchSelectByPrimaryKey",
                "updateByUsername",
                "deleteByUsername",
                "selectByUsername",
                "selectByUsernameForUpdate",
                "batchSelectByUsername",
                "selectByNickname",
                "countByNickname",
                "selectOneByExample",
                "selectListByExample",
                "countByExample",
            ]
        );
        let by_nickname = ops.iter().find(|o| o.name == "selectByNickname").unwrap();
        assert_eq!(by_nickname.returns(), ReturnShape::RecordList);
        assert!(by_nickname.template.paging_enabled);
    }

    #[test]
    fn test_no_generated_key_variants_without_auto_increment() {
        let ops = operations(&user_role()).unwrap();
        assert!(ops.iter().all(|o| !o.name.contains("UseGeneratedKeys")));
        assert!(ops.iter().any(|o| o.name == "countByGrantedBy"));
    }

    #[test]
    fn test_duplicate_index_collides() {
        let table = Table::new(
            TableId::new("", "account"),
            vec![Column::new("id", "int", 1), Column::new("email", "varchar(64)", 2)],
            vec!["id".to_string()],
            vec![
                Index::unique("uk_email", &["email"]),
                Index::unique("uk_email_again", &["email"]),
            ],
        )
        .unwrap();
        let err = operations(&table).unwrap_err();
        match err {
            GenerationError::NameCollision { name, second, .. } => {
                assert_eq!(name, "updateByEmail");
                assert!(second.contains("uk_email_again"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
