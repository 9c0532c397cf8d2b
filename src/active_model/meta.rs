//! Static table metadata read by the statement renderer.
//!
//! Generated code declares one `TableMeta<'static>` constant per table; the
//! same shape can be borrowed from a [`TableMetaBuf`] when rendering previews
//! at generation time.

/// One column and the record field that carries it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMeta<'a> {
    pub name: &'a str,
    pub field: &'a str,
}

/// Everything the renderer needs to know about a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMeta<'a> {
    /// Qualified, quoted table name as it appears in statement text
    pub table: &'a str,
    /// Columns in ordinal order
    pub columns: &'a [ColumnMeta<'a>],
    pub primary_key: &'a [&'a str],
    pub auto_increment: Option<&'a str>,
}

impl<'a> TableMeta<'a> {
    pub fn column(&self, name: &str) -> Option<&ColumnMeta<'a>> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn field_of(&self, column: &str) -> Option<&'a str> {
        self.column(column).map(|c| c.field)
    }

    pub fn auto_increment_position(&self) -> Option<usize> {
        self.auto_increment.and_then(|c| self.position(c))
    }
}

/// Owned counterpart of [`TableMeta`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableMetaBuf {
    pub table: String,
    /// `(column, field)` pairs in ordinal order
    pub columns: Vec<(String, String)>,
    pub primary_key: Vec<String>,
    pub auto_increment: Option<String>,
}

impl TableMetaBuf {
    /// Borrow as a [`TableMeta`] for the duration of `f`
    pub fn with_meta<R>(&self, f: impl FnOnce(&TableMeta<'_>) -> R) -> R {
        let columns: Vec<ColumnMeta<'_>> = self
            .columns
            .iter()
            .map(|(name, field)| ColumnMeta { name, field })
            .collect();
        let primary_key: Vec<&str> = self.primary_key.iter().map(String::as_str).collect();
        let meta = TableMeta {
            table: &self.table,
            columns: &columns,
            primary_key: &primary_key,
            auto_increment: self.auto_increment.as_deref(),
        };
        f(&meta)
    }
}

/// Set of assigned column positions.
///
/// Positions index [`TableMeta::columns`]. Iteration is ascending, which is
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldSet {
    words: Vec<u64>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// All positions below `len`
    pub fn full(len: usize) -> Self {
        (0..len).collect()
    }

    pub fn insert(&mut self, position: usize) {
        let word = position / 64;
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (position % 64);
    }

    pub fn remove(&mut self, position: usize) {
        if let Some(w) = self.words.get_mut(position / 64) {
            *w &= !(1u64 << (position % 64));
        }
    }

    pub fn contains(&self, position: usize) -> bool {
        self.words
            .get(position / 64)
            .map(|w| w & (1u64 << (position % 64)) != 0)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, w)| {
            (0..64).filter(move |b| w & (1u64 << b) != 0).map(move |b| i * 64 + b)
        })
    }
}

impl FromIterator<usize> for FieldSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for position in iter {
            set.insert(position);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_set() {
        let mut set: FieldSet = [3, 0, 70].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 3, 70]);
        assert_eq!(set.len(), 3);
        set.remove(70);
        assert!(!set.contains(70));
        assert!(set.contains(3));
        set.remove(0);
        set.remove(3);
        assert!(set.is_empty());
        assert_eq!(FieldSet::full(2).iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_meta_buf_borrow() {
        let buf = TableMetaBuf {
            table: "`t`".to_string(),
            columns: vec![
                ("id".to_string(), "id".to_string()),
                ("user_name".to_string(), "userName".to_string()),
            ],
            primary_key: vec!["id".to_string()],
            auto_increment: Some("id".to_string()),
        };
        let field = buf.with_meta(|meta| meta.field_of("user_name").map(str::to_string));
        assert_eq!(field.as_deref(), Some("userName"));
        assert_eq!(buf.with_meta(|meta| meta.auto_increment_position()), Some(0));
    }
}
