//! Record trait implemented by generated row types.

use super::meta::FieldSet;

/// A row record whose fields are tracked with [`ActiveValue`](super::ActiveValue).
///
/// Generated records implement this so the renderer can build partial column
/// lists without knowing the concrete type. Positions follow the table's
/// column order.
pub trait TableRecord {
    /// Positions of every field that was assigned
    fn assigned_fields(&self) -> FieldSet;

    /// True when the field at `position` holds no value (unassigned or `NULL`)
    fn is_null(&self, position: usize) -> bool;
}

/// A bare field set stands in for a record whose assigned fields are all
/// non-null. Used for previews and tests.
impl TableRecord for FieldSet {
    fn assigned_fields(&self) -> FieldSet {
        self.clone()
    }

    fn is_null(&self, position: usize) -> bool {
        !self.contains(position)
    }
}

impl<R: TableRecord + ?Sized> TableRecord for &R {
    fn assigned_fields(&self) -> FieldSet {
        (**self).assigned_fields()
    }

    fn is_null(&self, position: usize) -> bool {
        (**self).is_null(position)
    }
}
