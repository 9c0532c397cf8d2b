//! Database type to host type resolution.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Rust value type a column maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostType {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Decimal,
    String,
    Bytes,
    Date,
    Time,
    DateTime,
    Timestamp,
    Json,
}

impl HostType {
    /// Type path as written in emitted code
    pub fn rust_type(self) -> &'static str {
        match self {
            HostType::Bool => "bool",
            HostType::I8 => "i8",
            HostType::U8 => "u8",
            HostType::I16 => "i16",
            HostType::U16 => "u16",
            HostType::I32 => "i32",
            HostType::U32 => "u32",
            HostType::I64 => "i64",
            HostType::U64 => "u64",
            HostType::F32 => "f32",
            HostType::F64 => "f64",
            HostType::Decimal => "rust_decimal::Decimal",
            HostType::String => "String",
            HostType::Bytes => "Vec<u8>",
            HostType::Date => "chrono::NaiveDate",
            HostType::Time => "chrono::NaiveTime",
            HostType::DateTime => "chrono::NaiveDateTime",
            HostType::Timestamp => "chrono::DateTime<chrono::Utc>",
            HostType::Json => "serde_json::Value",
        }
    }

    pub fn is_copy(self) -> bool {
        !matches!(self, HostType::String | HostType::Bytes | HostType::Json)
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rust_type())
    }
}

/// Mapping chosen for `BIGINT UNSIGNED` columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BigIntUnsigned {
    /// Full range
    #[default]
    U64,
    /// Signed 64-bit; values above `i64::MAX` do not fit
    I64,
}

/// Resolves a column's database type expression to a host type.
///
/// `None` means the type is not supported; callers turn that into
/// [`crate::GenerationError::UnsupportedColumnType`].
pub trait TypeResolver {
    fn resolve(&self, type_expression: &str) -> Option<HostType>;
}

impl<F> TypeResolver for F
where
    F: Fn(&str) -> Option<HostType>,
{
    fn resolve(&self, type_expression: &str) -> Option<HostType> {
        self(type_expression)
    }
}

/// MySQL type names, with optional `(length)` and trailing modifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlTypeResolver {
    pub bigint_unsigned: BigIntUnsigned,
}

static TYPE_EXPRESSION: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\s*(?P<base>[A-Za-z]+)\s*(?:\((?P<args>[^)]*)\))?(?P<modifiers>.*)$").ok());

impl MysqlTypeResolver {
    pub fn new(bigint_unsigned: BigIntUnsigned) -> Self {
        Self { bigint_unsigned }
    }
}

impl TypeResolver for MysqlTypeResolver {
    fn resolve(&self, type_expression: &str) -> Option<HostType> {
        let caps = TYPE_EXPRESSION.as_ref()?.captures(type_expression)?;
        let base = caps.name("base")?.as_str().to_ascii_lowercase();
        let args = caps.name("args").map(|m| m.as_str().trim()).unwrap_or("");
        let unsigned = caps
            .name("modifiers")
            .map(|m| m.as_str().to_ascii_lowercase().split_whitespace().any(|w| w == "unsigned"))
            .unwrap_or(false);

        let host = match base.as_str() {
            "bool" | "boolean" => HostType::Bool,
            "bit" if args.is_empty() || args == "1" => HostType::Bool,
            "bit" => HostType::Bytes,
            "tinyint" if unsigned => HostType::U8,
            "tinyint" => HostType::I8,
            "smallint" if unsigned => HostType::U16,
            "smallint" => HostType::I16,
            "mediumint" | "int" | "integer" if unsigned => HostType::U32,
            "mediumint" | "int" | "integer" => HostType::I32,
            "bigint" if unsigned => match self.bigint_unsigned {
                BigIntUnsigned::U64 => HostType::U64,
                BigIntUnsigned::I64 => HostType::I64,
            },
            "bigint" => HostType::I64,
            "float" => HostType::F32,
            "double" | "real" => HostType::F64,
            "decimal" | "numeric" | "dec" => HostType::Decimal,
            "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "enum" | "set" => {
                HostType::String
            }
            "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => HostType::Bytes,
            "date" => HostType::Date,
            "time" => HostType::Time,
            "datetime" => HostType::DateTime,
            "timestamp" => HostType::Timestamp,
            "year" => HostType::I16,
            "json" => HostType::Json,
            _ => return None,
        };
        Some(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_types() {
        let resolver = MysqlTypeResolver::default();
        assert_eq!(resolver.resolve("tinyint"), Some(HostType::I8));
        assert_eq!(resolver.resolve("tinyint(3) unsigned"), Some(HostType::U8));
        assert_eq!(resolver.resolve("INT(11)"), Some(HostType::I32));
        assert_eq!(resolver.resolve("int(10) UNSIGNED ZEROFILL"), Some(HostType::U32));
        assert_eq!(resolver.resolve("bigint(20)"), Some(HostType::I64));
    }

    #[test]
    fn test_bigint_unsigned_policy() {
        assert_eq!(
            MysqlTypeResolver::default().resolve("bigint(20) unsigned"),
            Some(HostType::U64)
        );
        assert_eq!(
            MysqlTypeResolver::new(BigIntUnsigned::I64).resolve("bigint unsigned"),
            Some(HostType::I64)
        );
    }

    #[test]
    fn test_other_types() {
        let resolver = MysqlTypeResolver::default();
        assert_eq!(resolver.resolve("varchar(32)"), Some(HostType::String));
        assert_eq!(resolver.resolve("decimal(10,2)"), Some(HostType::Decimal));
        assert_eq!(resolver.resolve("datetime"), Some(HostType::DateTime));
        assert_eq!(resolver.resolve("bit(1)"), Some(HostType::Bool));
        assert_eq!(resolver.resolve("json"), Some(HostType::Json));
        assert_eq!(resolver.resolve("geometry"), None);
        assert_eq!(resolver.resolve(""), None);
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |t: &str| if t == "uuid" { Some(HostType::String) } else { None };
        assert_eq!(resolver.resolve("uuid"), Some(HostType::String));
        assert_eq!(HostType::Timestamp.rust_type(), "chrono::DateTime<chrono::Utc>");
        assert!(!HostType::String.is_copy());
    }
}
