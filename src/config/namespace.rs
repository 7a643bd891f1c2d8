//! Dot-addressable configuration tree
//!
//! A [`Namespace`] is built from decoded mappings. Nested mappings become
//! nested namespaces and are merged key-by-key, everything else is stored as
//! a leaf [`Value`] and overwritten wholesale.

use super::error::{ConfigError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Mapping decoded from a single config file.
pub type RawMapping = Map<String, Value>;

/// A binding in a namespace: either a leaf value or a nested namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Value(Value),
    Namespace(Namespace),
}

impl Entry {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Entry::Value(value) => Some(value),
            Entry::Namespace(_) => None,
        }
    }

    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Entry::Namespace(ns) => Some(ns),
            Entry::Value(_) => None,
        }
    }

    /// Convert back into a plain JSON value (namespaces become objects).
    pub fn to_value(&self) -> Value {
        match self {
            Entry::Value(value) => value.clone(),
            Entry::Namespace(ns) => ns.to_value(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    entries: BTreeMap<String, Entry>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `mapping` onto `existing` (or onto a fresh namespace) and return it.
    pub fn build(existing: Option<Namespace>, mapping: &RawMapping) -> Result<Namespace> {
        let mut namespace = existing.unwrap_or_default();
        namespace.merge(mapping)?;
        Ok(namespace)
    }

    /// Merge a decoded mapping into this namespace in place.
    ///
    /// Every key of `mapping` is checked before anything is written, so an
    /// invalid key leaves the namespace exactly as it was.
    pub fn merge(&mut self, mapping: &RawMapping) -> Result<()> {
        validate_keys(mapping, None)?;
        self.merge_validated(mapping);
        Ok(())
    }

    fn merge_validated(&mut self, mapping: &RawMapping) {
        for (key, value) in mapping {
            match value {
                Value::Object(child) => {
                    let entry = self
                        .entries
                        .entry(key.clone())
                        .or_insert_with(|| Entry::Namespace(Namespace::new()));
                    // A scalar previously bound here is replaced by a branch.
                    if let Entry::Value(_) = entry {
                        *entry = Entry::Namespace(Namespace::new());
                    }
                    if let Entry::Namespace(ns) = entry {
                        ns.merge_validated(child);
                    }
                }
                other => {
                    self.entries.insert(key.clone(), Entry::Value(other.clone()));
                }
            }
        }
    }

    /// Look up a dotted path such as `database.host`.
    pub fn get(&self, path: &str) -> Option<&Entry> {
        let mut segments = path.split('.');
        let mut entry = self.entries.get(segments.next()?)?;
        for segment in segments {
            entry = entry.as_namespace()?.entries.get(segment)?;
        }
        Some(entry)
    }

    /// Leaf value at `path`, `None` if unset or if the path names a branch.
    pub fn value(&self, path: &str) -> Option<&Value> {
        self.get(path)?.as_value()
    }

    /// Like [`Namespace::get`], failing with [`ConfigError::AttributeNotFound`].
    pub fn require(&self, path: &str) -> Result<&Entry> {
        self.get(path).ok_or_else(|| ConfigError::AttributeNotFound(path.to_string()))
    }

    /// Deserialize the leaf or branch at `path` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.require(path)?.to_value();
        serde_json::from_value(value)
            .map_err(|source| ConfigError::Decode { key: path.to_string(), source })
    }

    /// Populate a strongly-typed struct from the whole tree.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_value())
            .map_err(|source| ConfigError::Decode { key: "<root>".to_string(), source })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Top-level keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> =
            self.entries.iter().map(|(k, v)| (k.clone(), v.to_value())).collect();
        Value::Object(map)
    }
}

fn validate_keys(mapping: &RawMapping, parent: Option<&str>) -> Result<()> {
    for (key, value) in mapping {
        let full = match parent {
            Some(parent) => format!("{parent}.{key}"),
            None => key.clone(),
        };
        if key.is_empty() || key.contains('.') {
            return Err(ConfigError::InvalidKey(full));
        }
        if let Value::Object(child) = value {
            validate_keys(child, Some(&full))?;
        }
    }
    Ok(())
}
