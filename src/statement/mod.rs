//! Statement synthesis.
//!
//! [`StatementSynthesizer::synthesize`] turns `(table, key set, kind)` into a
//! [`StatementTemplate`]: operation name, parameter list, return shape and the
//! paging/ordering/locking flags. The text itself is produced per call by the
//! functions in [`render`], which generated accessors invoke with the call's
//! arguments; [`StatementTemplate::render`] dispatches to them for previews.
//!
//! Rules enforced here, at generation time:
//!
//! - lookups by a primary or unique key return at most one row and never page
//! - lookups by a non-unique key return a list and always page
//! - `FOR UPDATE` is only available on primary and unique keys
//! - generated-key inserts need an auto-increment column
//!
//! Rules that depend on call arguments (empty records, empty updates, batch
//! generated-key conflicts, missing retrieval lists) are enforced by
//! [`render`].

pub mod render;
pub mod sql;

use std::fmt;

pub use render::{Direction, OrderBy, RenderResult, SelectSpec};
pub use sql::Sql;

use crate::active_model::{FieldSet, TableMeta};
use crate::error::{GenerationError, Result};
use crate::naming::NamingConvention;
use crate::record::RecordShape;
use crate::schema::{KeyKind, KeySet, Table};
use crate::types::HostType;

/// Which statement to synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Insert,
    InsertUseGeneratedKeys,
    BatchInsert,
    BatchInsertUseGeneratedKeys,
    Update,
    Delete,
    Select,
    SelectForUpdate,
    Count,
    BatchSelect,
    SelectOneByExample,
    SelectListByExample,
    CountByExample,
}

impl StatementKind {
    /// Kinds that ignore the key set
    pub fn is_table_level(self) -> bool {
        matches!(
            self,
            StatementKind::Insert
                | StatementKind::InsertUseGeneratedKeys
                | StatementKind::BatchInsert
                | StatementKind::BatchInsertUseGeneratedKeys
                | StatementKind::SelectOneByExample
                | StatementKind::SelectListByExample
                | StatementKind::CountByExample
        )
    }
}

/// Shape of the statement body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Insert,
    BatchInsert,
    BatchInsertReturnKeys,
    Update,
    Delete,
    SelectOne,
    SelectList,
    SelectCount,
}

/// What the accessor hands back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnShape {
    /// Zero or one record
    Record,
    RecordList,
    /// Number of affected rows
    RowCount,
    /// Result of `COUNT(*)`
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// Value of one key column
    Key { column: String, host: HostType },
    /// One whole record
    Record,
    /// Records of a batch
    RecordList,
    /// Key values of a single-column batch lookup
    KeyList { column: String, host: HostType },
    Offset,
    RowCount,
    RetrieveColumns,
    OrderBy,
    /// Externally built predicate
    Example,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
}

impl Parameter {
    fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Generation-time description of one statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementTemplate {
    pub name: String,
    pub kind: StatementKind,
    pub parameters: Vec<Parameter>,
    pub body_kind: BodyKind,
    pub returns: ReturnShape,
    pub paging_enabled: bool,
    pub ordering_enabled: bool,
    pub locking_enabled: bool,
    pub key_kind: KeyKind,
    /// WHERE columns in key order; empty for table-level statements
    pub key_columns: Vec<String>,
    /// Columns kept out of an update's SET list besides the key columns
    pub excluded_columns: Vec<String>,
    /// Collection parameter name for batch statements
    pub collection: Option<String>,
    /// Auto-increment column whose value the database assigns
    pub generated_key: Option<String>,
    /// Record parameter name used in update SET placeholders
    pub record_parameter: String,
}

/// Call arguments for [`StatementTemplate::render`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderArgs {
    /// Assigned fields of the record (insert, update)
    pub assigned: FieldSet,
    /// One entry per batch element (batch insert, batch select)
    pub batch: Vec<FieldSet>,
    pub retrieve: Vec<String>,
    pub order_by: Vec<OrderBy>,
    /// Predicate of by-example statements
    pub predicate: String,
}

impl RenderArgs {
    /// Arguments that exercise every clause: all fields assigned, a batch of
    /// two records without generated keys, every column retrieved.
    pub fn sample(meta: &TableMeta<'_>) -> Self {
        let mut record = FieldSet::full(meta.columns.len());
        if let Some(position) = meta.auto_increment_position() {
            record.remove(position);
        }
        Self {
            assigned: FieldSet::full(meta.columns.len()),
            batch: vec![record.clone(), record],
            retrieve: meta.columns.iter().map(|c| c.name.to_string()).collect(),
            order_by: meta.primary_key.iter().map(|c| OrderBy::asc(*c)).collect(),
            predicate: String::new(),
        }
    }
}

impl StatementTemplate {
    fn key_refs(&self) -> Vec<&str> {
        self.key_columns.iter().map(String::as_str).collect()
    }

    /// Render the statement text for concrete call arguments
    pub fn render(&self, meta: &TableMeta<'_>, args: &RenderArgs) -> RenderResult {
        let key = self.key_refs();
        let retrieve: Vec<&str> = args.retrieve.iter().map(String::as_str).collect();
        let order_by: &[OrderBy] = if self.ordering_enabled { &args.order_by } else { &[] };
        let collection = self.collection.as_deref().unwrap_or_default();

        match self.kind {
            StatementKind::Insert | StatementKind::InsertUseGeneratedKeys => render::insert(meta, &args.assigned),
            StatementKind::BatchInsert => render::batch_insert(meta, collection, args.batch.len()),
            StatementKind::BatchInsertUseGeneratedKeys => {
                render::batch_insert_use_generated_keys(meta, collection, &args.batch)
            }
            StatementKind::Update => {
                let excluded: Vec<&str> = self.excluded_columns.iter().map(String::as_str).collect();
                render::update(meta, &args.assigned, &self.record_parameter, &key, &excluded)
            }
            StatementKind::Delete => render::delete(meta, &key),
            StatementKind::Select | StatementKind::SelectForUpdate => render::select(
                meta,
                &SelectSpec {
                    key: &key,
                    retrieve: &retrieve,
                    order_by,
                    paging: self.paging_enabled,
                    for_update: self.locking_enabled,
                },
            ),
            StatementKind::Count => render::count(meta, &key),
            StatementKind::BatchSelect => render::batch_select(meta, &key, collection, args.batch.len(), &retrieve),
            StatementKind::SelectOneByExample | StatementKind::SelectListByExample => {
                render::select_by_example(meta, &retrieve, &args.predicate, order_by, self.paging_enabled)
            }
            StatementKind::CountByExample => render::count_by_example(meta, &args.predicate),
        }
    }
}

impl fmt::Display for StatementTemplate {
    /// `name(param, ...) -> shape`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        write!(f, "{}({}) -> {:?}", self.name, params.join(", "), self.returns)
    }
}

/// Builds statement templates for one table
pub struct StatementSynthesizer<'a> {
    table: &'a Table,
    record: &'a RecordShape,
    naming: &'a NamingConvention,
    ordering: bool,
}

impl<'a> StatementSynthesizer<'a> {
    pub fn new(table: &'a Table, record: &'a RecordShape, naming: &'a NamingConvention, ordering: bool) -> Self {
        Self {
            table,
            record,
            naming,
            ordering,
        }
    }

    /// Synthesize one statement. Table-level kinds ignore `key`.
    pub fn synthesize(&self, key: &KeySet<'_>, kind: StatementKind) -> Result<StatementTemplate> {
        if kind == StatementKind::SelectForUpdate && !key.kind.is_unique() {
            return Err(GenerationError::InvalidLockingRequest {
                table: self.table.id().to_string(),
                columns: key.column_names().join(", "),
            });
        }

        let generated_key = match kind {
            StatementKind::InsertUseGeneratedKeys | StatementKind::BatchInsertUseGeneratedKeys => {
                let column = self.table.auto_increment_column().ok_or_else(|| {
                    GenerationError::MissingGeneratedKey {
                        table: self.table.id().to_string(),
                    }
                })?;
                Some(column.name.clone())
            }
            _ => None,
        };

        let mut template = StatementTemplate {
            name: self.operation_name(key, kind)?,
            kind,
            parameters: Vec::new(),
            body_kind: BodyKind::SelectOne,
            returns: ReturnShape::Record,
            paging_enabled: false,
            ordering_enabled: false,
            locking_enabled: false,
            key_kind: key.kind,
            key_columns: Vec::new(),
            excluded_columns: Vec::new(),
            collection: None,
            generated_key,
            record_parameter: self.record.parameter_name.clone(),
        };
        if !kind.is_table_level() {
            template.key_columns = key.column_names().iter().map(|c| c.to_string()).collect();
        }

        let collection = self.naming.collection_name.clone();
        let list_select = !key.kind.is_unique();
        match kind {
            StatementKind::Insert | StatementKind::InsertUseGeneratedKeys => {
                template.body_kind = BodyKind::Insert;
                template.returns = ReturnShape::RowCount;
                template.parameters.push(self.record_param());
            }
            StatementKind::BatchInsert | StatementKind::BatchInsertUseGeneratedKeys => {
                template.body_kind = if kind == StatementKind::BatchInsert {
                    BodyKind::BatchInsert
                } else {
                    BodyKind::BatchInsertReturnKeys
                };
                template.returns = ReturnShape::RowCount;
                template.parameters.push(Parameter::new(&collection, ParameterKind::RecordList));
                template.collection = Some(collection);
            }
            StatementKind::Update => {
                template.body_kind = BodyKind::Update;
                template.returns = ReturnShape::RowCount;
                template.parameters = self.key_params(key)?;
                template.parameters.push(self.record_param());
                // An update by a secondary key never rewrites the primary key.
                if key.kind != KeyKind::Primary {
                    template.excluded_columns = self
                        .table
                        .primary_key()
                        .column_names()
                        .into_iter()
                        .filter(|c| !key.contains(c))
                        .map(str::to_string)
                        .collect();
                }
            }
            StatementKind::Delete => {
                template.body_kind = BodyKind::Delete;
                template.returns = ReturnShape::RowCount;
                template.parameters = self.key_params(key)?;
            }
            StatementKind::Select | StatementKind::SelectForUpdate => {
                template.parameters = self.key_params(key)?;
                if list_select {
                    template.body_kind = BodyKind::SelectList;
                    template.returns = ReturnShape::RecordList;
                    self.add_ordering_and_paging(&mut template);
                } else {
                    template.body_kind = BodyKind::SelectOne;
                    template.returns = ReturnShape::Record;
                    template.locking_enabled = kind == StatementKind::SelectForUpdate;
                }
                template.parameters.push(retrieve_param());
            }
            StatementKind::Count => {
                template.body_kind = BodyKind::SelectCount;
                template.returns = ReturnShape::Count;
                template.parameters = self.key_params(key)?;
            }
            StatementKind::BatchSelect => {
                template.body_kind = BodyKind::SelectList;
                template.returns = ReturnShape::RecordList;
                let param_kind = match key.columns.as_slice() {
                    [column] => ParameterKind::KeyList {
                        column: column.name.clone(),
                        host: self.host_of(&column.name)?,
                    },
                    _ => ParameterKind::RecordList,
                };
                template.parameters.push(Parameter::new(&collection, param_kind));
                template.parameters.push(retrieve_param());
                template.collection = Some(collection);
            }
            StatementKind::SelectOneByExample => {
                template.body_kind = BodyKind::SelectOne;
                template.returns = ReturnShape::Record;
                template.parameters.push(example_param());
                if self.ordering {
                    template.ordering_enabled = true;
                    template.parameters.push(order_param());
                }
                template.parameters.push(retrieve_param());
            }
            StatementKind::SelectListByExample => {
                template.body_kind = BodyKind::SelectList;
                template.returns = ReturnShape::RecordList;
                template.parameters.push(example_param());
                self.add_ordering_and_paging(&mut template);
                template.parameters.push(retrieve_param());
            }
            StatementKind::CountByExample => {
                template.body_kind = BodyKind::SelectCount;
                template.returns = ReturnShape::Count;
                template.parameters.push(example_param());
            }
        }
        Ok(template)
    }

    fn operation_name(&self, key: &KeySet<'_>, kind: StatementKind) -> Result<String> {
        let n = self.naming;
        let keyed = |verb: &str| n.to_operation_name(&key.column_names(), key.kind, verb);
        let by_example = |verb: &str| format!("{}{}{}", verb, n.by_connective, n.example_literal);
        Ok(match kind {
            StatementKind::Insert => "insert".to_string(),
            StatementKind::InsertUseGeneratedKeys => format!("insert{}", n.generated_keys_suffix),
            StatementKind::BatchInsert => n.batch("insert"),
            StatementKind::BatchInsertUseGeneratedKeys => format!("{}{}", n.batch("insert"), n.generated_keys_suffix),
            StatementKind::Update => keyed("update")?,
            StatementKind::Delete => keyed("delete")?,
            StatementKind::Select => keyed("select")?,
            StatementKind::SelectForUpdate => format!("{}{}", keyed("select")?, n.for_update_suffix),
            StatementKind::Count => keyed("count")?,
            StatementKind::BatchSelect => keyed(&n.batch("select"))?,
            StatementKind::SelectOneByExample => by_example("selectOne"),
            StatementKind::SelectListByExample => by_example("selectList"),
            StatementKind::CountByExample => by_example("count"),
        })
    }

    fn add_ordering_and_paging(&self, template: &mut StatementTemplate) {
        if self.ordering {
            template.ordering_enabled = true;
            template.parameters.push(order_param());
        }
        template.paging_enabled = true;
        template
            .parameters
            .push(Parameter::new(render::OFFSET, ParameterKind::Offset));
        template
            .parameters
            .push(Parameter::new(render::ROW_COUNT, ParameterKind::RowCount));
    }

    fn record_param(&self) -> Parameter {
        Parameter::new(&self.record.parameter_name, ParameterKind::Record)
    }

    fn key_params(&self, key: &KeySet<'_>) -> Result<Vec<Parameter>> {
        key.columns
            .iter()
            .map(|column| {
                let field = self.record.field(&column.name).ok_or_else(|| {
                    GenerationError::unavailable(
                        self.table.name(),
                        format!("key column `{}` has no record field", column.name),
                    )
                })?;
                Ok(Parameter::new(
                    &field.name,
                    ParameterKind::Key {
                        column: column.name.clone(),
                        host: field.host,
                    },
                ))
            })
            .collect()
    }

    fn host_of(&self, column: &str) -> Result<HostType> {
        self.record
            .field(column)
            .map(|f| f.host)
            .ok_or_else(|| GenerationError::unavailable(self.table.name(), format!("no record field for `{}`", column)))
    }
}

fn retrieve_param() -> Parameter {
    Parameter::new("retrieveColumns", ParameterKind::RetrieveColumns)
}

fn order_param() -> Parameter {
    Parameter::new("orderBy", ParameterKind::OrderBy)
}

fn example_param() -> Parameter {
    Parameter::new("example", ParameterKind::Example)
}
