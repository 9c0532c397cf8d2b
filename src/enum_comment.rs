//! Enum-like column comments.
//!
//! A column comment such as `enum.ACTIVE(1-active)||LOCKED(2-locked)` lists
//! the values an integer column may hold. Each element is
//! `NAME(code-description)`: the name runs up to the first `(`, the code up to
//! the first `-` after it, and the description up to the first `)` after that.
//! All three parts are trimmed.

use std::collections::HashSet;

use crate::error::{GenerationError, Result};
use crate::naming::NamingConvention;
use crate::record::RecordField;
use crate::types::HostType;

const ELEMENT_DELIMITER: &str = "||";

/// Width of the generated code type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumCodeType {
    /// Fits in `i32`
    Integer,
    /// Fits in `i64`
    Long,
}

impl EnumCodeType {
    /// `None` for host types that cannot carry a code
    pub fn from_host(host: HostType) -> Option<Self> {
        match host {
            HostType::I8 | HostType::U8 | HostType::I16 | HostType::U16 | HostType::I32 => Some(EnumCodeType::Integer),
            HostType::U32 | HostType::I64 => Some(EnumCodeType::Long),
            _ => None,
        }
    }

    pub fn rust_type(self) -> &'static str {
        match self {
            EnumCodeType::Integer => "i32",
            EnumCodeType::Long => "i64",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumElement {
    pub name: String,
    pub code: i64,
    pub description: String,
}

/// Enumerated type derived from one column comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumShape {
    pub type_name: String,
    pub column: String,
    pub field: String,
    pub host: HostType,
    pub code_type: EnumCodeType,
    pub elements: Vec<EnumElement>,
}

#[derive(Debug, Clone)]
pub struct EnumCommentParser {
    prefix: String,
}

impl Default for EnumCommentParser {
    fn default() -> Self {
        Self::new("enum.")
    }
}

impl EnumCommentParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Non-empty and starts with the prefix
    pub fn accept(&self, comment: &str) -> bool {
        !comment.is_empty() && comment.starts_with(&self.prefix)
    }

    /// Parse an accepted comment into elements, in comment order.
    ///
    /// Codes must fit `host`. Duplicate names or codes are rejected since they
    /// cannot both become enum variants.
    pub fn parse(&self, host: HostType, column: &str, comment: &str) -> Result<Vec<EnumElement>> {
        let code_type = EnumCodeType::from_host(host).ok_or_else(|| GenerationError::UnsupportedEnumCodeType {
            column: column.to_string(),
            host_type: host.to_string(),
        })?;
        let invalid = |reason: String| GenerationError::InvalidEnumComment {
            column: column.to_string(),
            reason,
        };

        let body = comment
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| invalid(format!("comment does not start with `{}`", self.prefix)))?;

        let mut elements = Vec::new();
        let mut names = HashSet::new();
        let mut codes = HashSet::new();
        for segment in body.split(ELEMENT_DELIMITER) {
            let element = parse_element(segment).ok_or_else(|| {
                invalid(format!("`{}` is not of the form NAME(code-description)", segment.trim()))
            })?;
            let (name, code, description) = element;
            if name.is_empty() {
                return Err(invalid(format!("element `{}` has no name", segment.trim())));
            }
            let code: i64 = match code_type {
                EnumCodeType::Integer => code.parse::<i32>().map(i64::from),
                EnumCodeType::Long => code.parse::<i64>(),
            }
            .map_err(|e| invalid(format!("code `{}` of `{}`: {}", code, name, e)))?;
            if !fits(host, code) {
                return Err(invalid(format!("code {} of `{}` does not fit {}", code, name, host)));
            }
            if !names.insert(name.to_string()) {
                return Err(invalid(format!("duplicate name `{}`", name)));
            }
            if !codes.insert(code) {
                return Err(invalid(format!("duplicate code {}", code)));
            }
            elements.push(EnumElement {
                name: name.to_string(),
                code,
                description: description.to_string(),
            });
        }
        Ok(elements)
    }

    /// Enum shape for a record field whose comment is accepted; `None` otherwise
    pub fn shape(&self, naming: &NamingConvention, type_name: &str, field: &RecordField) -> Result<Option<EnumShape>> {
        let comment = match field.comment.as_deref() {
            Some(c) if self.accept(c) => c,
            _ => return Ok(None),
        };
        let elements = self.parse(field.host, &field.column, comment)?;
        let code_type = EnumCodeType::from_host(field.host).ok_or_else(|| GenerationError::UnsupportedEnumCodeType {
            column: field.column.clone(),
            host_type: field.host.to_string(),
        })?;
        Ok(Some(EnumShape {
            type_name: naming.to_enum_type_name(type_name, &field.name),
            column: field.column.clone(),
            field: field.name.clone(),
            host: field.host,
            code_type,
            elements,
        }))
    }
}

/// `(name, code, description)` by position, all trimmed
fn parse_element(segment: &str) -> Option<(&str, &str, &str)> {
    let open = segment.find('(')?;
    let dash = open + 1 + segment[open + 1..].find('-')?;
    let close = dash + 1 + segment[dash + 1..].find(')')?;
    Some((
        segment[..open].trim(),
        segment[open + 1..dash].trim(),
        segment[dash + 1..close].trim(),
    ))
}

fn fits(host: HostType, code: i64) -> bool {
    let (min, max) = match host {
        HostType::I8 => (i8::MIN as i64, i8::MAX as i64),
        HostType::U8 => (0, u8::MAX as i64),
        HostType::I16 => (i16::MIN as i64, i16::MAX as i64),
        HostType::U16 => (0, u16::MAX as i64),
        HostType::I32 => (i32::MIN as i64, i32::MAX as i64),
        HostType::U32 => (0, u32::MAX as i64),
        _ => (i64::MIN, i64::MAX),
    };
    (min..=max).contains(&code)
}
