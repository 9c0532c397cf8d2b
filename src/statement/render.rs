//! Statement rendering for concrete calls.
//!
//! These functions run inside generated accessors: each takes the static
//! [`TableMeta`] of the table plus whatever the call supplied and returns the
//! final statement text. Validation always happens before any text is built,
//! so a failed call never yields a partial statement.
//!
//! Placeholder forms are fixed:
//!
//! | context                     | form                       |
//! |-----------------------------|----------------------------|
//! | key / record field          | `#{field}`                 |
//! | update SET                  | `#{parameter.field}`       |
//! | batch record field          | `#{list[i].field}`         |
//! | single-column batch key     | `#{list[i]}`               |
//! | paging                      | `LIMIT #{offset},#{rowCount}` |

use std::fmt;

use serde::{Deserialize, Serialize};

use super::sql::Sql;
use crate::active_model::{FieldSet, TableMeta, TableRecord};
use crate::error::StatementError;

/// Name of the paging offset parameter
pub const OFFSET: &str = "offset";
/// Name of the paging row-count parameter
pub const ROW_COUNT: &str = "rowCount";
pub const COUNT_STATEMENT: &str = "COUNT(*)";

pub type RenderResult = Result<String, StatementError>;

/// `LIMIT #{offset},#{rowCount}`
pub fn paging_clause() -> String {
    format!("LIMIT #{{{}}},#{{{}}}", OFFSET, ROW_COUNT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("ASC"),
            Direction::Desc => f.write_str("DESC"),
        }
    }
}

/// One ORDER BY term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default)]
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// Arguments of a select by key
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectSpec<'q> {
    pub key: &'q [&'q str],
    pub retrieve: &'q [&'q str],
    pub order_by: &'q [OrderBy],
    pub paging: bool,
    pub for_update: bool,
}

fn placeholder(path: &str) -> String {
    format!("#{{{}}}", path)
}

fn unknown(meta: &TableMeta<'_>, column: &str) -> StatementError {
    StatementError::UnknownColumn {
        table: meta.table.to_string(),
        column: column.to_string(),
    }
}

/// `(column, field)` for every key column, in key order
fn key_fields<'m>(meta: &TableMeta<'m>, key: &[&str]) -> Result<Vec<(&'m str, &'m str)>, StatementError> {
    key.iter()
        .map(|k| {
            meta.column(k)
                .map(|c| (c.name, c.field))
                .ok_or_else(|| unknown(meta, k))
        })
        .collect()
}

fn key_conditions(sql: Sql, keys: &[(&str, &str)]) -> Sql {
    keys.iter()
        .fold(sql, |sql, (column, field)| sql.and_where(format!("{}={}", column, placeholder(field))))
}

/// Reject an empty retrieval list, a lone `*`, and columns the table lacks
fn check_retrieve(meta: &TableMeta<'_>, retrieve: &[&str]) -> Result<(), StatementError> {
    let wildcard = retrieve.len() == 1 && retrieve[0].trim() == "*";
    if retrieve.is_empty() || wildcard {
        return Err(StatementError::NoColumnsRequested {
            table: meta.table.to_string(),
        });
    }
    match retrieve.iter().find(|c| meta.column(c).is_none()) {
        Some(c) => Err(unknown(meta, c)),
        None => Ok(()),
    }
}

fn order_terms(meta: &TableMeta<'_>, order_by: &[OrderBy]) -> Result<Vec<String>, StatementError> {
    order_by
        .iter()
        .map(|o| match meta.column(&o.column) {
            Some(c) => Ok(format!("{} {}", c.name, o.direction)),
            None => Err(unknown(meta, &o.column)),
        })
        .collect()
}

fn with_order_and_paging(mut sql: Sql, terms: Vec<String>, paging: bool) -> Sql {
    for term in terms {
        sql = sql.order_by(term);
    }
    if paging {
        sql = sql.limit(paging_clause());
    }
    sql
}

/// Single-row insert over the assigned fields.
///
/// `INSERT INTO t (c1, c2) VALUES (#{f1}, #{f2})`
pub fn insert(meta: &TableMeta<'_>, assigned: &FieldSet) -> RenderResult {
    let columns: Vec<_> = meta
        .columns
        .iter()
        .enumerate()
        .filter(|(i, _)| assigned.contains(*i))
        .map(|(_, c)| c)
        .collect();
    if columns.is_empty() {
        return Err(StatementError::EmptyRecord {
            table: meta.table.to_string(),
        });
    }
    Ok(Sql::insert_into(meta.table)
        .columns(columns.iter().map(|c| c.name))
        .values(columns.iter().map(|c| placeholder(c.field)))
        .to_string())
}

fn batch_values(sql: Sql, collection: &str, len: usize, fields: &[&str]) -> Sql {
    (0..len).fold(sql, |sql, i| {
        sql.values(
            fields
                .iter()
                .map(|f| placeholder(&format!("{}[{}].{}", collection, i, f))),
        )
    })
}

/// Multi-row insert over every column.
pub fn batch_insert(meta: &TableMeta<'_>, collection: &str, len: usize) -> RenderResult {
    if len == 0 {
        return Err(StatementError::EmptyBatch {
            table: meta.table.to_string(),
        });
    }
    let fields: Vec<&str> = meta.columns.iter().map(|c| c.field).collect();
    let sql = Sql::insert_into(meta.table).columns(meta.columns.iter().map(|c| c.name));
    Ok(batch_values(sql, collection, len, &fields).to_string())
}

/// Multi-row insert that leaves the auto-increment column to the database.
///
/// Every record must leave its auto-increment field null; the first record
/// that does not fails the whole call with
/// [`StatementError::GeneratedKeyConflict`].
pub fn batch_insert_use_generated_keys<R: TableRecord>(
    meta: &TableMeta<'_>,
    collection: &str,
    records: &[R],
) -> RenderResult {
    if records.is_empty() {
        return Err(StatementError::EmptyBatch {
            table: meta.table.to_string(),
        });
    }
    let (auto_column, auto_position) = match (meta.auto_increment, meta.auto_increment_position()) {
        (Some(column), Some(position)) => (column, position),
        (Some(column), None) => return Err(unknown(meta, column)),
        (None, _) => return batch_insert(meta, collection, records.len()),
    };
    if let Some(index) = records.iter().position(|r| !r.is_null(auto_position)) {
        return Err(StatementError::GeneratedKeyConflict {
            table: meta.table.to_string(),
            column: auto_column.to_string(),
            index,
        });
    }

    let columns: Vec<_> = meta.columns.iter().filter(|c| c.name != auto_column).collect();
    let fields: Vec<&str> = columns.iter().map(|c| c.field).collect();
    let sql = Sql::insert_into(meta.table).columns(columns.iter().map(|c| c.name));
    Ok(batch_values(sql, collection, records.len(), &fields).to_string())
}

/// Partial update by key.
///
/// SET covers assigned fields outside `key` and `extra_excluded`; WHERE binds
/// each key column to its own parameter.
pub fn update(
    meta: &TableMeta<'_>,
    assigned: &FieldSet,
    parameter: &str,
    key: &[&str],
    extra_excluded: &[&str],
) -> RenderResult {
    let keys = key_fields(meta, key)?;
    let sets: Vec<String> = meta
        .columns
        .iter()
        .enumerate()
        .filter(|(i, c)| assigned.contains(*i) && !key.contains(&c.name) && !extra_excluded.contains(&c.name))
        .map(|(_, c)| format!("{}={}", c.name, placeholder(&format!("{}.{}", parameter, c.field))))
        .collect();
    if sets.is_empty() {
        return Err(StatementError::EmptyUpdate {
            table: meta.table.to_string(),
        });
    }
    let sql = sets.into_iter().fold(Sql::update(meta.table), Sql::set);
    Ok(key_conditions(sql, &keys).to_string())
}

pub fn delete(meta: &TableMeta<'_>, key: &[&str]) -> RenderResult {
    let keys = key_fields(meta, key)?;
    Ok(key_conditions(Sql::delete_from(meta.table), &keys).to_string())
}

/// Select by key, with optional ordering, paging and row lock
pub fn select(meta: &TableMeta<'_>, spec: &SelectSpec<'_>) -> RenderResult {
    check_retrieve(meta, spec.retrieve)?;
    let keys = key_fields(meta, spec.key)?;
    let terms = order_terms(meta, spec.order_by)?;

    let sql = key_conditions(Sql::select(spec.retrieve.iter().copied()).from(meta.table), &keys);
    let mut sql = with_order_and_paging(sql, terms, spec.paging);
    if spec.for_update {
        sql = sql.for_update();
    }
    Ok(sql.to_string())
}

pub fn count(meta: &TableMeta<'_>, key: &[&str]) -> RenderResult {
    let keys = key_fields(meta, key)?;
    Ok(key_conditions(Sql::select([COUNT_STATEMENT]).from(meta.table), &keys).to_string())
}

/// Select over a batch of keys.
///
/// One key column becomes `k IN (#{list[0]},#{list[1]})`; several become
/// `(k1=#{list[0].f1} AND k2=#{list[0].f2}) OR (...)`, one group per element.
pub fn batch_select(
    meta: &TableMeta<'_>,
    key: &[&str],
    collection: &str,
    len: usize,
    retrieve: &[&str],
) -> RenderResult {
    check_retrieve(meta, retrieve)?;
    let keys = key_fields(meta, key)?;
    if len == 0 {
        return Err(StatementError::EmptyBatch {
            table: meta.table.to_string(),
        });
    }

    let predicate = match keys.as_slice() {
        [(column, _)] => {
            let items: Vec<String> = (0..len)
                .map(|i| placeholder(&format!("{}[{}]", collection, i)))
                .collect();
            format!("{} IN ({})", column, items.join(","))
        }
        _ => {
            let groups: Vec<String> = (0..len)
                .map(|i| {
                    let conjuncts: Vec<String> = keys
                        .iter()
                        .map(|(column, field)| {
                            format!("{}={}", column, placeholder(&format!("{}[{}].{}", collection, i, field)))
                        })
                        .collect();
                    format!("({})", conjuncts.join(" AND "))
                })
                .collect();
            groups.join(" OR ")
        }
    };

    Ok(Sql::select(retrieve.iter().copied())
        .from(meta.table)
        .and_where(predicate)
        .to_string())
}

/// Select with an externally built predicate placed after `FROM` as given
pub fn select_by_example(
    meta: &TableMeta<'_>,
    retrieve: &[&str],
    predicate: &str,
    order_by: &[OrderBy],
    paging: bool,
) -> RenderResult {
    check_retrieve(meta, retrieve)?;
    let terms = order_terms(meta, order_by)?;
    let sql = Sql::select(retrieve.iter().copied())
        .from(meta.table)
        .where_verbatim(predicate);
    Ok(with_order_and_paging(sql, terms, paging).to_string())
}

pub fn count_by_example(meta: &TableMeta<'_>, predicate: &str) -> RenderResult {
    Ok(Sql::select([COUNT_STATEMENT])
        .from(meta.table)
        .where_verbatim(predicate)
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::active_model::ColumnMeta;

    const COLUMNS: &[ColumnMeta<'static>] = &[
        ColumnMeta { name: "id", field: "id" },
        ColumnMeta { name: "username", field: "username" },
        ColumnMeta { name: "nick_name", field: "nickName" },
        ColumnMeta { name: "tenant_id", field: "tenantId" },
    ];

    const META: TableMeta<'static> = TableMeta {
        table: "`app`.`user_basic`",
        columns: COLUMNS,
        primary_key: &["id"],
        auto_increment: Some("id"),
    };

    #[test]
    fn test_insert_uses_assigned_fields_in_declared_order() {
        let assigned: FieldSet = [2, 1].into_iter().collect();
        assert_eq!(
            insert(&META, &assigned).unwrap(),
            "INSERT INTO `app`.`user_basic` (username, nick_name) VALUES (#{username}, #{nickName})"
        );
    }

    #[test]
    fn test_insert_empty_record() {
        assert_eq!(
            insert(&META, &FieldSet::new()),
            Err(StatementError::EmptyRecord {
                table: "`app`.`user_basic`".to_string()
            })
        );
    }

    #[test]
    fn test_batch_insert() {
        let sql = batch_insert(&META, "list", 2).unwrap();
        assert!(sql.starts_with("INSERT INTO `app`.`user_basic` (id, username, nick_name, tenant_id) VALUES "));
        assert!(sql.contains("(#{list[1].id}, #{list[1].username}, #{list[1].nickName}, #{list[1].tenantId})"));
        assert!(matches!(batch_insert(&META, "list", 0), Err(StatementError::EmptyBatch { .. })));
    }

    #[test]
    fn test_batch_insert_generated_keys_excludes_auto_increment() {
        let records = vec![FieldSet::from_iter([1, 2]), FieldSet::from_iter([1])];
        let sql = batch_insert_use_generated_keys(&META, "list", &records).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO `app`.`user_basic` (username, nick_name, tenant_id) VALUES \
             (#{list[0].username}, #{list[0].nickName}, #{list[0].tenantId}), \
             (#{list[1].username}, #{list[1].nickName}, #{list[1].tenantId})"
        );
    }

    #[test]
    fn test_generated_key_conflict_names_first_offender() {
        let records = vec![
            FieldSet::from_iter([1]),
            FieldSet::from_iter([0, 1]),
            FieldSet::from_iter([0]),
        ];
        assert_eq!(
            batch_insert_use_generated_keys(&META, "list", &records),
            Err(StatementError::GeneratedKeyConflict {
                table: "`app`.`user_basic`".to_string(),
                column: "id".to_string(),
                index: 1,
            })
        );
    }

    #[test]
    fn test_update_excludes_key_columns() {
        let assigned = FieldSet::full(4);
        assert_eq!(
            update(&META, &assigned, "userBasic", &["id"], &[]).unwrap(),
            "UPDATE `app`.`user_basic` SET username=#{userBasic.username}, nick_name=#{userBasic.nickName}, \
             tenant_id=#{userBasic.tenantId} WHERE (id=#{id})"
        );
        assert_eq!(
            update(&META, &assigned, "userBasic", &["username"], &["id"]).unwrap(),
            "UPDATE `app`.`user_basic` SET nick_name=#{userBasic.nickName}, tenant_id=#{userBasic.tenantId} \
             WHERE (username=#{username})"
        );
    }

    #[test]
    fn test_update_with_only_key_fields_is_empty() {
        let assigned = FieldSet::from_iter([0]);
        assert!(matches!(
            update(&META, &assigned, "userBasic", &["id"], &[]),
            Err(StatementError::EmptyUpdate { .. })
        ));
    }

    #[test]
    fn test_select_variants() {
        let locked = select(
            &META,
            &SelectSpec {
                key: &["id"],
                retrieve: &["id", "username"],
                for_update: true,
                ..SelectSpec::default()
            },
        )
        .unwrap();
        assert_eq!(locked, "SELECT id, username FROM `app`.`user_basic` WHERE (id=#{id}) FOR UPDATE");

        let order = [OrderBy::desc("id"), OrderBy::asc("username")];
        let paged = select(
            &META,
            &SelectSpec {
                key: &["nick_name"],
                retrieve: &["id"],
                order_by: &order,
                paging: true,
                ..SelectSpec::default()
            },
        )
        .unwrap();
        assert_eq!(
            paged,
            "SELECT id FROM `app`.`user_basic` WHERE (nick_name=#{nickName}) \
             ORDER BY id DESC, username ASC LIMIT #{offset},#{rowCount}"
        );
    }

    #[test]
    fn test_retrieve_validation() {
        let spec = |retrieve: &'static [&'static str]| SelectSpec {
            key: &["id"],
            retrieve,
            ..SelectSpec::default()
        };
        assert!(matches!(select(&META, &spec(&[])), Err(StatementError::NoColumnsRequested { .. })));
        assert!(matches!(select(&META, &spec(&["*"])), Err(StatementError::NoColumnsRequested { .. })));
        assert!(matches!(select(&META, &spec(&["password"])), Err(StatementError::UnknownColumn { .. })));
    }

    #[test]
    fn test_unknown_order_column() {
        let order = [OrderBy::asc("created")];
        let err = select_by_example(&META, &["id"], "", &order, false).unwrap_err();
        assert_eq!(
            err,
            StatementError::UnknownColumn {
                table: "`app`.`user_basic`".to_string(),
                column: "created".to_string(),
            }
        );
    }

    #[test]
    fn test_count_and_delete() {
        assert_eq!(
            count(&META, &["nick_name"]).unwrap(),
            "SELECT COUNT(*) FROM `app`.`user_basic` WHERE (nick_name=#{nickName})"
        );
        assert_eq!(
            delete(&META, &["tenant_id", "username"]).unwrap(),
            "DELETE FROM `app`.`user_basic` WHERE (tenant_id=#{tenantId} AND username=#{username})"
        );
    }

    #[test]
    fn test_batch_select_single_column() {
        assert_eq!(
            batch_select(&META, &["id"], "list", 3, &["id"]).unwrap(),
            "SELECT id FROM `app`.`user_basic` WHERE (id IN (#{list[0]},#{list[1]},#{list[2]}))"
        );
    }

    #[test]
    fn test_batch_select_composite() {
        let sql = batch_select(&META, &["tenant_id", "username"], "list", 2, &["id"]).unwrap();
        assert_eq!(
            sql,
            "SELECT id FROM `app`.`user_basic` WHERE (\
             (tenant_id=#{list[0].tenantId} AND username=#{list[0].username}) OR \
             (tenant_id=#{list[1].tenantId} AND username=#{list[1].username}))"
        );
        assert!(matches!(
            batch_select(&META, &["id"], "list", 0, &["id"]),
            Err(StatementError::EmptyBatch { .. })
        ));
    }

    #[test]
    fn test_by_example() {
        assert_eq!(
            select_by_example(&META, &["id"], "username LIKE #{pattern}", &[OrderBy::asc("id")], true).unwrap(),
            "SELECT id FROM `app`.`user_basic` WHERE username LIKE #{pattern} ORDER BY id ASC LIMIT #{offset},#{rowCount}"
        );
        assert_eq!(count_by_example(&META, "").unwrap(), "SELECT COUNT(*) FROM `app`.`user_basic`");
        assert_eq!(
            count_by_example(&META, "where status = #{status}").unwrap(),
            "SELECT COUNT(*) FROM `app`.`user_basic` WHERE status = #{status}"
        );
    }
}
