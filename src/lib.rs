//! # daoforge
//!
//! Schema-driven synthesis of data-access code: given a table's columns,
//! primary key and indexes, derive a row record, a family of parameterized
//! SQL statement templates and the accessor operations bound to them.
//!
//! Data flows one way:
//!
//! [`schema::Table`] → [`record::RecordSynthesizer`] →
//! [`statement::StatementSynthesizer`] → [`accessor::AccessorSynthesizer`]
//!
//! [`generator::Generator`] drives all of them over a batch of tables. The
//! [`statement::render`] functions and [`active_model`] types are what the
//! generated code calls at runtime.

pub mod accessor;
pub mod active_model;
pub mod config;
pub mod enum_comment;
pub mod error;
pub mod generator;
pub mod naming;
pub mod record;
pub mod schema;
pub mod statement;
pub mod types;

pub use accessor::{AccessorSynthesizer, Operation};
pub use active_model::{ActiveValue, ColumnMeta, FieldSet, TableMeta, TableMetaBuf, TableRecord};
pub use config::{DirtyTracking, GeneratorConfig};
pub use enum_comment::{EnumCodeType, EnumCommentParser, EnumElement, EnumShape};
pub use error::{GenerationError, StatementError};
pub use generator::{GenerationReport, Generator, TableArtifacts, TableFailure};
pub use naming::{IdentifierDeriver, NamingConvention};
pub use record::{MetadataHook, RecordField, RecordShape, RecordSynthesizer};
pub use schema::{Column, Index, IndexKind, KeyKind, KeySet, Table, TableDefinition, TableId};
pub use statement::{
    BodyKind, Direction, OrderBy, Parameter, ParameterKind, RenderArgs, ReturnShape, StatementKind,
    StatementSynthesizer, StatementTemplate,
};
pub use types::{BigIntUnsigned, HostType, MysqlTypeResolver, TypeResolver};
