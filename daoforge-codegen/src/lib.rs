//! daoforge Codegen Library
//!
//! Reads table definitions from TOML, JSON or YAML files and writes one Rust
//! source file per table: the record struct, its SQL builder, the mapper trait
//! and any enum types derived from column comments.
//! The main entry point is the [`TableWriter`].

pub mod error;
pub mod idents;
pub mod parser;
pub mod writer;

pub use error::{CodegenError, Result};
pub use parser::{load_tables, parse_table_from_file};
pub use writer::TableWriter;
