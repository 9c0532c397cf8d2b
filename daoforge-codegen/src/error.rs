//! Error types for codegen

use std::path::PathBuf;

use daoforge::GenerationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A definition file could not be read as a table definition
    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A synthesized name or attribute is not valid Rust
    #[error("cannot emit `{item}` for table `{table}`: {reason}")]
    Emit {
        table: String,
        item: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, CodegenError>;
