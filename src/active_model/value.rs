//! `ActiveValue` records whether a record field was assigned.

/// Field value wrapper that remembers assignment.
///
/// A record built for insert or update holds every field as an
/// `ActiveValue`. Only `Set` fields take part in partial column lists.
/// For nullable columns `T` is an `Option`, so `Set(None)` is an explicit
/// assignment of `NULL` and differs from `NotSet`.
///
/// # Example
///
/// ```
/// use daoforge::ActiveValue;
///
/// let name: ActiveValue<String> = ActiveValue::Set("ada".to_string());
/// let nickname: ActiveValue<Option<String>> = ActiveValue::Set(None);
/// let age: ActiveValue<u8> = ActiveValue::NotSet;
///
/// assert!(name.is_set());
/// assert!(nickname.is_set());
/// assert!(age.is_not_set());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ActiveValue<T> {
    /// Field was assigned
    Set(T),
    /// Field was never assigned
    #[default]
    NotSet,
}

impl<T> ActiveValue<T> {
    #[must_use]
    pub fn is_set(&self) -> bool {
        matches!(self, ActiveValue::Set(_))
    }

    #[must_use]
    pub fn is_not_set(&self) -> bool {
        matches!(self, ActiveValue::NotSet)
    }

    /// Assign a value, replacing any previous one
    pub fn set(&mut self, value: T) {
        *self = ActiveValue::Set(value);
    }

    /// Forget the assignment and return the previous value
    pub fn take(&mut self) -> Option<T> {
        std::mem::take(self).into_value()
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&T> {
        match self {
            ActiveValue::Set(v) => Some(v),
            ActiveValue::NotSet => None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            ActiveValue::Set(v) => Some(v),
            ActiveValue::NotSet => None,
        }
    }
}

impl<T> ActiveValue<Option<T>> {
    /// True when the field holds no value: never assigned, or assigned `None`
    #[must_use]
    pub fn is_null(&self) -> bool {
        !matches!(self, ActiveValue::Set(Some(_)))
    }
}

impl<T> From<T> for ActiveValue<T> {
    fn from(value: T) -> Self {
        ActiveValue::Set(value)
    }
}

impl<T> From<ActiveValue<T>> for Option<T> {
    fn from(value: ActiveValue<T>) -> Self {
        value.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_take() {
        let mut v: ActiveValue<i32> = ActiveValue::default();
        assert!(v.is_not_set());
        v.set(7);
        assert_eq!(v.as_value(), Some(&7));
        assert_eq!(v.take(), Some(7));
        assert!(v.is_not_set());
    }

    #[test]
    fn test_null_assignment_is_an_assignment() {
        let v: ActiveValue<Option<String>> = ActiveValue::Set(None);
        assert!(v.is_set());
        assert!(v.is_null());
        let w: ActiveValue<Option<String>> = ActiveValue::from(Some("x".to_string()));
        assert!(!w.is_null());
    }
}
