//! Format readers for YAML, JSON and TOML config files

use super::error::{ConfigError, Result};
use super::namespace::RawMapping;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;

/// Extensions recognized by discovery, directory scans and dispatch.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["yaml", "json", "toml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the reader for a path by its (case-insensitive) extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.') {
            "yaml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
            ConfigFormat::Toml => "TOML",
        }
    }

    /// Read and decode `path`. The file must hold a mapping at the top level.
    pub fn read_mapping(self, path: &Path) -> Result<RawMapping> {
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Io { path: path.to_path_buf(), source },
        })?;

        let content = String::from_utf8(bytes).map_err(|e| self.parse_error(path, e))?;
        self.parse_str(&content, path)
    }

    /// Decode already-loaded text. `path` is only used in error messages.
    pub fn parse_str(self, content: &str, path: &Path) -> Result<RawMapping> {
        let value = match self {
            ConfigFormat::Yaml => {
                let mut doc = serde_yaml::from_str::<serde_yaml::Value>(content)
                    .map_err(|e| self.parse_error(path, e))?;
                // Resolve `<<` merge keys before the tree loses YAML semantics.
                doc.apply_merge().map_err(|e| self.parse_error(path, e))?;
                serde_json::to_value(doc).map_err(|e| self.parse_error(path, e))?
            }
            ConfigFormat::Json => {
                serde_json::from_str::<Value>(content).map_err(|e| self.parse_error(path, e))?
            }
            ConfigFormat::Toml => {
                let table =
                    toml::from_str::<toml::Table>(content).map_err(|e| self.parse_error(path, e))?;
                toml_to_json(toml::Value::Table(table), "")
                    .map_err(|e| self.parse_error(path, e))?
            }
        };

        match value {
            Value::Object(map) => Ok(map),
            other => Err(self.parse_error(
                path,
                format!("top-level value must be a mapping, found {}", type_name(&other)),
            )),
        }
    }

    fn parse_error(self, path: &Path, err: impl std::fmt::Display) -> ConfigError {
        ConfigError::Parse {
            path: path.to_path_buf(),
            format: self.name(),
            message: err.to_string(),
        }
    }
}

/// Read a file, choosing the reader by extension.
pub fn read_config_file(path: &Path) -> Result<RawMapping> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default(),
    })?;
    format.read_mapping(path)
}

/// Non-finite floats (`nan`, `inf`) have no JSON form and are rejected with
/// the dotted path of the offending value.
fn toml_to_json(value: toml::Value, at: &str) -> std::result::Result<Value, String> {
    Ok(match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => match serde_json::Number::from_f64(f) {
            Some(n) => Value::Number(n),
            None => return Err(format!("non-finite float {f} at '{at}' is not supported")),
        },
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| toml_to_json(item, &format!("{at}[{i}]")))
                .collect::<std::result::Result<_, _>>()?,
        ),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| {
                    let child = if at.is_empty() { k.clone() } else { format!("{at}.{k}") };
                    toml_to_json(v, &child).map(|v| (k, v))
                })
                .collect::<std::result::Result<_, _>>()?,
        ),
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
