//! Clause composer for statement text.
//!
//! `Sql` collects clause fragments and lays them out on one line in a fixed
//! order. It knows nothing about tables or placeholders; the render functions
//! decide what goes into each clause.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Verb {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
}

/// Single-statement builder
#[derive(Debug, Clone, Default)]
pub struct Sql {
    verb: Verb,
    table: String,
    select: Vec<String>,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    sets: Vec<String>,
    wheres: Vec<String>,
    raw_where: Option<String>,
    order_by: Vec<String>,
    limit: Option<String>,
    for_update: bool,
}

impl Sql {
    pub fn select<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            verb: Verb::Select,
            select: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn insert_into(table: &str) -> Self {
        Self {
            verb: Verb::Insert,
            table: table.to_string(),
            ..Self::default()
        }
    }

    pub fn update(table: &str) -> Self {
        Self {
            verb: Verb::Update,
            table: table.to_string(),
            ..Self::default()
        }
    }

    pub fn delete_from(table: &str) -> Self {
        Self {
            verb: Verb::Delete,
            table: table.to_string(),
            ..Self::default()
        }
    }

    pub fn from(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// One parenthesized VALUES group
    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn set(mut self, assignment: impl Into<String>) -> Self {
        self.sets.push(assignment.into());
        self
    }

    /// Condition ANDed with the others inside `WHERE (...)`
    pub fn and_where(mut self, condition: impl Into<String>) -> Self {
        self.wheres.push(condition.into());
        self
    }

    /// Pre-built predicate placed after `WHERE` as given. A leading `where`
    /// keyword in any case is dropped. Empty text means no WHERE clause at all.
    pub fn where_verbatim(mut self, predicate: &str) -> Self {
        let predicate = strip_where_keyword(predicate.trim());
        if !predicate.is_empty() {
            self.raw_where = Some(predicate.to_string());
        }
        self
    }

    pub fn order_by(mut self, term: impl Into<String>) -> Self {
        self.order_by.push(term.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<String>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    fn write_where(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.wheres.is_empty() {
            write!(f, " WHERE ({})", self.wheres.join(" AND "))?;
        } else if let Some(raw) = &self.raw_where {
            write!(f, " WHERE {}", raw)?;
        }
        Ok(())
    }
}

impl fmt::Display for Sql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verb {
            Verb::Insert => {
                write!(f, "INSERT INTO {} ({}) VALUES ", self.table, self.columns.join(", "))?;
                let rows: Vec<String> = self.rows.iter().map(|r| format!("({})", r.join(", "))).collect();
                f.write_str(&rows.join(", "))
            }
            Verb::Update => {
                write!(f, "UPDATE {} SET {}", self.table, self.sets.join(", "))?;
                self.write_where(f)
            }
            Verb::Delete => {
                write!(f, "DELETE FROM {}", self.table)?;
                self.write_where(f)
            }
            Verb::Select => {
                write!(f, "SELECT {} FROM {}", self.select.join(", "), self.table)?;
                self.write_where(f)?;
                if !self.order_by.is_empty() {
                    write!(f, " ORDER BY {}", self.order_by.join(", "))?;
                }
                if let Some(limit) = &self.limit {
                    write!(f, " {}", limit)?;
                }
                if self.for_update {
                    f.write_str(" FOR UPDATE")?;
                }
                Ok(())
            }
        }
    }
}

fn strip_where_keyword(predicate: &str) -> &str {
    match predicate.get(..5) {
        Some(head) if head.eq_ignore_ascii_case("where") => {
            let rest = &predicate[5..];
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                rest.trim_start()
            } else {
                predicate
            }
        }
        _ => predicate,
    }
}
