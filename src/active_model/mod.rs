//! Runtime support for generated records.
//!
//! - **Value**: [`ActiveValue`] wraps each record field and records assignment
//! - **Meta**: [`TableMeta`] describes a table to the renderer; [`FieldSet`]
//!   carries the assigned positions of one record
//! - **Traits**: [`TableRecord`] connects a generated record to both
//!
//! Dirty tracking is explicit: a field is part of an INSERT or UPDATE column
//! list exactly when its `ActiveValue` is `Set`. No companion flag fields are
//! needed at runtime.

pub mod meta;
#[doc(inline)]
pub use meta::{ColumnMeta, FieldSet, TableMeta, TableMetaBuf};

pub mod traits;
#[doc(inline)]
pub use traits::TableRecord;

pub mod value;
#[doc(inline)]
pub use value::ActiveValue;
