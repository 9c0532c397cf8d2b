//! Identifier derivation.
//!
//! [`NamingConvention`] holds every fixed word the deriver uses and is passed
//! around as a value; there is no global naming state. [`IdentifierDeriver`]
//! adds per-table collision detection on top of it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};
use crate::schema::{KeyKind, KeySet};

/// Fixed words and separators used to derive names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConvention {
    /// Word separator in database names
    pub separator: char,
    pub dirty_flag_suffix: String,
    /// Joins key column names in operation names (`selectByAAndB`)
    pub key_connective: String,
    pub by_connective: String,
    /// Replaces the column list for primary-key operations
    pub primary_key_literal: String,
    pub for_update_suffix: String,
    pub batch_prefix: String,
    pub generated_keys_suffix: String,
    pub example_literal: String,
    /// Parameter name of batch collections in placeholders
    pub collection_name: String,
    pub enum_suffix: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            separator: '_',
            dirty_flag_suffix: "IsSet".to_string(),
            key_connective: "And".to_string(),
            by_connective: "By".to_string(),
            primary_key_literal: "PrimaryKey".to_string(),
            for_update_suffix: "ForUpdate".to_string(),
            batch_prefix: "batch".to_string(),
            generated_keys_suffix: "UseGeneratedKeys".to_string(),
            example_literal: "Example".to_string(),
            collection_name: "list".to_string(),
            enum_suffix: "Enum".to_string(),
        }
    }
}

impl NamingConvention {
    /// `user_basic` -> `UserBasic`
    pub fn to_type_name(&self, table_name: &str) -> Result<String> {
        camel_case(table_name, self.separator, true)
    }

    /// `create_time` -> `createTime`
    pub fn to_field_name(&self, column_name: &str) -> Result<String> {
        camel_case(column_name, self.separator, false)
    }

    pub fn to_dirty_flag_name(&self, field_name: &str) -> String {
        format!("{}{}", field_name, self.dirty_flag_suffix)
    }

    /// `UserBasic` -> `userBasic`
    pub fn to_parameter_name(&self, type_name: &str) -> String {
        lower_first(type_name)
    }

    /// `UserBasic` + `status` -> `UserBasicStatusEnum`
    pub fn to_enum_type_name(&self, type_name: &str, field_name: &str) -> String {
        format!("{}{}{}", type_name, upper_first(field_name), self.enum_suffix)
    }

    /// `verb` + `By` + key fragment.
    ///
    /// The key fragment is the primary-key literal for [`KeyKind::Primary`],
    /// otherwise each key column upper-camel-cased in key order and joined by
    /// the connective.
    pub fn to_operation_name(&self, key_columns: &[&str], kind: KeyKind, verb: &str) -> Result<String> {
        let mut name = format!("{}{}", verb, self.by_connective);
        if kind == KeyKind::Primary {
            name.push_str(&self.primary_key_literal);
            return Ok(name);
        }
        for (i, column) in key_columns.iter().enumerate() {
            if i > 0 {
                name.push_str(&self.key_connective);
            }
            name.push_str(&camel_case(column, self.separator, true)?);
        }
        Ok(name)
    }

    /// `select` -> `batchSelect`
    pub fn batch(&self, verb: &str) -> String {
        format!("{}{}", self.batch_prefix, upper_first(verb))
    }
}

/// Per-table name scope.
///
/// Every derived name is claimed together with a description of where it came
/// from; claiming the same name twice is a [`GenerationError::NameCollision`].
/// A deriver is never shared between tables.
#[derive(Debug)]
pub struct IdentifierDeriver<'c> {
    convention: &'c NamingConvention,
    table: String,
    claimed: HashMap<String, String>,
}

impl<'c> IdentifierDeriver<'c> {
    pub fn new(convention: &'c NamingConvention, table: &str) -> Self {
        Self {
            convention,
            table: table.to_string(),
            claimed: HashMap::new(),
        }
    }

    pub fn convention(&self) -> &'c NamingConvention {
        self.convention
    }

    pub fn claim(&mut self, name: String, origin: impl Into<String>) -> Result<String> {
        let origin = origin.into();
        if let Some(first) = self.claimed.get(&name) {
            return Err(GenerationError::NameCollision {
                table: self.table.clone(),
                name,
                first: first.clone(),
                second: origin,
            });
        }
        self.claimed.insert(name.clone(), origin);
        Ok(name)
    }

    pub fn field_name(&mut self, column: &str) -> Result<String> {
        let name = self.convention.to_field_name(column)?;
        self.claim(name, format!("column `{}`", column))
    }

    pub fn dirty_flag_name(&mut self, field: &str) -> Result<String> {
        let name = self.convention.to_dirty_flag_name(field);
        self.claim(name, format!("dirty flag of field `{}`", field))
    }

    /// Claim an operation name. `key` is `None` for table-level operations.
    pub fn operation_name(&mut self, name: String, operation: &str, key: Option<&KeySet<'_>>) -> Result<String> {
        let origin = match key {
            Some(KeySet {
                index_name: Some(index), ..
            }) => format!("{} on index `{}`", operation, index),
            Some(_) => format!("{} on the primary key", operation),
            None => operation.to_string(),
        };
        self.claim(name, origin)
    }
}

/// Separator-delimited name to camel case.
///
/// Every character is lower-cased except the one following a separator,
/// which is upper-cased. A leading or trailing separator, or two in a row,
/// is malformed.
pub fn camel_case(name: &str, separator: char, upper_first_char: bool) -> Result<String> {
    if name.is_empty() {
        return Err(GenerationError::malformed(name, "empty name"));
    }
    if name.starts_with(separator) || name.ends_with(separator) {
        return Err(GenerationError::malformed(
            name,
            format!("starts or ends with separator `{}`", separator),
        ));
    }

    let mut out = String::with_capacity(name.len());
    let mut after_separator = false;
    for c in name.chars() {
        if c == separator {
            if after_separator {
                return Err(GenerationError::malformed(
                    name,
                    format!("contains consecutive separators `{}{}`", separator, separator),
                ));
            }
            after_separator = true;
            continue;
        }
        if after_separator {
            out.extend(c.to_uppercase());
            after_separator = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }

    if upper_first_char {
        Ok(upper_first(&out))
    } else {
        Ok(out)
    }
}

pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
