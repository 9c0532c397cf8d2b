//! Input parsing for table definitions
//!
//! Each file holds one [`TableDefinition`] in TOML, JSON or YAML. A file that
//! cannot be read as a definition does not stop the run: it becomes a
//! `TableUnavailable` entry for the batch driver to report.

use std::fs;
use std::path::{Path, PathBuf};

use daoforge::{GenerationError, Table, TableDefinition};
use serde_json::{Map, Number, Value};
use yaml_rust::{Yaml, YamlLoader};

use crate::error::{CodegenError, Result};

const EXTENSIONS: &[&str] = &["toml", "json", "yaml", "yml"];

pub fn parse_table_from_file(path: &Path) -> Result<TableDefinition> {
    let content = fs::read_to_string(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    let parse_error = |reason: String| CodegenError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    match ext {
        "toml" => parse_toml(&content).map_err(parse_error),
        "json" => parse_json(&content).map_err(parse_error),
        "yaml" | "yml" => parse_yaml(&content).map_err(parse_error),
        _ => {
            // Try to detect format from content
            let trimmed = content.trim_start();
            if trimmed.starts_with('{') {
                parse_json(&content).map_err(parse_error)
            } else if content.contains('=') {
                parse_toml(&content).map_err(parse_error)
            } else {
                Err(parse_error(
                    "unknown file format. Supported: .toml, .json, .yaml".to_string(),
                ))
            }
        }
    }
}

fn parse_toml(content: &str) -> std::result::Result<TableDefinition, String> {
    toml::from_str(content).map_err(|e| e.to_string())
}

fn parse_json(content: &str) -> std::result::Result<TableDefinition, String> {
    serde_json::from_str(content).map_err(|e| e.to_string())
}

fn parse_yaml(content: &str) -> std::result::Result<TableDefinition, String> {
    let docs = YamlLoader::load_from_str(content).map_err(|e| e.to_string())?;
    let doc = docs.into_iter().next().ok_or_else(|| "empty YAML document".to_string())?;
    serde_json::from_value(yaml_to_json(doc)).map_err(|e| e.to_string())
}

fn yaml_to_json(yaml: Yaml) -> Value {
    match yaml {
        Yaml::String(s) => Value::String(s),
        Yaml::Integer(i) => Value::Number(i.into()),
        Yaml::Real(s) => s
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::String(s)),
        Yaml::Boolean(b) => Value::Bool(b),
        Yaml::Array(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Hash(hash) => {
            let mut map = Map::new();
            for (key, value) in hash {
                let key = match key {
                    Yaml::String(s) => s,
                    Yaml::Integer(i) => i.to_string(),
                    Yaml::Real(s) => s,
                    Yaml::Boolean(b) => b.to_string(),
                    _ => continue,
                };
                map.insert(key, yaml_to_json(value));
            }
            Value::Object(map)
        }
        Yaml::Alias(_) | Yaml::Null | Yaml::BadValue => Value::Null,
    }
}

/// Definition files under `dir`, sorted by path
fn definition_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        if path.is_file() && EXTENSIONS.contains(&ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every table from a definition file or a directory of them.
///
/// The outer error is for an unusable `input`; per-file problems are returned
/// as `Err` items in file order.
pub fn load_tables(input: &Path) -> Result<Vec<daoforge::error::Result<Table>>> {
    let files = if input.is_file() {
        vec![input.to_path_buf()]
    } else if input.is_dir() {
        definition_files(input)?
    } else {
        return Err(CodegenError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input {} does not exist", input.display()),
        )));
    };

    Ok(files
        .iter()
        .map(|path| match parse_table_from_file(path) {
            Ok(definition) => Table::try_from(definition),
            Err(e) => {
                log::warn!("failed to parse {}: {}", path.display(), e);
                Err(GenerationError::TableUnavailable {
                    table: path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or_default()
                        .to_string(),
                    reason: e.to_string(),
                })
            }
        })
        .collect())
}
