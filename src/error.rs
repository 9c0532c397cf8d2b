//! Error types for generation and statement rendering.
//!
//! Two families are kept apart:
//! - [`GenerationError`] is raised while turning a table into artifacts. It aborts
//!   that table only; the batch driver collects it and moves on.
//! - [`StatementError`] is raised by the rendering functions that generated
//!   accessors call at runtime. It reports a caller mistake and is never retried.

use thiserror::Error;

/// Structural or configuration failure while synthesizing one table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Identifier starts/ends with the separator or contains a doubled separator
    #[error("malformed identifier `{name}`: {reason}")]
    MalformedIdentifier { name: String, reason: String },

    /// Two derived names would be identical within one table
    #[error("name collision in table `{table}`: `{name}` is derived from both {first} and {second}")]
    NameCollision {
        table: String,
        name: String,
        first: String,
        second: String,
    },

    /// The type resolver has no mapping for a column type
    #[error("unsupported column type `{type_expression}` for column `{column}` in table `{table}`")]
    UnsupportedColumnType {
        table: String,
        column: String,
        type_expression: String,
    },

    /// `FOR UPDATE` requested on a key that can match an unbounded number of rows
    #[error("locking read requested on non-unique key ({columns}) of table `{table}`")]
    InvalidLockingRequest { table: String, columns: String },

    /// Enum-like comment attached to a column whose type cannot carry a code
    #[error("enum code type `{host_type}` of column `{column}` is not supported (integer or long only)")]
    UnsupportedEnumCodeType { column: String, host_type: String },

    /// Enum-like comment accepted by prefix but not parseable
    #[error("invalid enum comment on column `{column}`: {reason}")]
    InvalidEnumComment { column: String, reason: String },

    /// Generated-key operation requested for a table without an auto-increment column
    #[error("table `{table}` has no auto-increment column for generated key retrieval")]
    MissingGeneratedKey { table: String },

    /// The schema provider handed over a table that violates the model invariants
    #[error("table `{table}` unavailable for generation: {reason}")]
    TableUnavailable { table: String, reason: String },
}

impl GenerationError {
    pub(crate) fn malformed(name: &str, reason: impl Into<String>) -> Self {
        GenerationError::MalformedIdentifier {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unavailable(table: &str, reason: impl Into<String>) -> Self {
        GenerationError::TableUnavailable {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}

/// Runtime failure while rendering statement text for a concrete call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    /// Insert with no assigned field
    #[error("record for `{table}` has no assigned field to insert")]
    EmptyRecord { table: String },

    /// Update whose SET list is empty after removing key columns
    #[error("update on `{table}` has no assigned field outside the key columns")]
    EmptyUpdate { table: String },

    /// A generated-key batch insert received a record with its auto-increment field set
    #[error(
        "record #{index} of the batch insert into `{table}` already carries a value for \
         auto-increment column `{column}`; use the plain batch insert to supply keys yourself"
    )]
    GeneratedKeyConflict {
        table: String,
        column: String,
        index: usize,
    },

    /// Select without an explicit retrieval list
    #[error("select on `{table}` must name the columns to retrieve")]
    NoColumnsRequested { table: String },

    /// Batch operation over an empty collection
    #[error("batch statement on `{table}` received no records")]
    EmptyBatch { table: String },

    /// A column referenced at call time does not belong to the table
    #[error("column `{column}` does not exist in `{table}`")]
    UnknownColumn { table: String, column: String },
}

pub type Result<T> = std::result::Result<T, GenerationError>;
