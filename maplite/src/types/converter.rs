// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Type converters bridging runtime values and wire-level column types
//!
//! This is the interface boundary to the full language-type registry, which
//! is an external collaborator. The pipeline only needs enough here to honor
//! the descriptor invariant: every parameter descriptor resolves a converter
//! or compilation fails.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CompileError;
use crate::types::Value;

/// Wire-level column types a parameter can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Bigint,
    Double,
    Numeric,
    Varchar,
    Char,
    Boolean,
    Timestamp,
    Blob,
    Cursor,
    Other,
    Null,
}

/// Runtime value families used for converter resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Boolean,
    Integer,
    Double,
    String,
    DateTime,
    Bytes,
    List,
    Map,
    Untyped,
}

impl ValueKind {
    /// Introspect the value family of a runtime value
    pub fn of(value: &Value) -> ValueKind {
        match value {
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Null => ValueKind::Untyped,
        }
    }

    /// Parse the `kind=` descriptor attribute
    pub fn parse(name: &str) -> Option<ValueKind> {
        match name.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Some(ValueKind::Boolean),
            "integer" | "int" | "long" => Some(ValueKind::Integer),
            "double" | "float" => Some(ValueKind::Double),
            "string" => Some(ValueKind::String),
            "datetime" | "timestamp" => Some(ValueKind::DateTime),
            "bytes" | "blob" => Some(ValueKind::Bytes),
            "list" => Some(ValueKind::List),
            "map" => Some(ValueKind::Map),
            "object" => Some(ValueKind::Untyped),
            _ => None,
        }
    }
}

impl ColumnType {
    /// Parse the `column=` descriptor attribute
    pub fn parse(name: &str) -> Option<ColumnType> {
        match name.to_ascii_uppercase().as_str() {
            "INTEGER" => Some(ColumnType::Integer),
            "BIGINT" => Some(ColumnType::Bigint),
            "DOUBLE" => Some(ColumnType::Double),
            "NUMERIC" | "DECIMAL" => Some(ColumnType::Numeric),
            "VARCHAR" => Some(ColumnType::Varchar),
            "CHAR" => Some(ColumnType::Char),
            "BOOLEAN" => Some(ColumnType::Boolean),
            "TIMESTAMP" => Some(ColumnType::Timestamp),
            "BLOB" => Some(ColumnType::Blob),
            "CURSOR" => Some(ColumnType::Cursor),
            "OTHER" => Some(ColumnType::Other),
            "NULL" => Some(ColumnType::Null),
            _ => None,
        }
    }
}

/// Converts a runtime value into its wire form for one column type
pub trait TypeConverter: Send + Sync {
    fn name(&self) -> &str;

    /// Column type this converter targets when the descriptor gives none
    fn default_column_type(&self) -> ColumnType;

    /// Normalize a value for binding. The default passes the value through;
    /// converters may coerce (e.g. integer widening for DOUBLE columns).
    fn to_wire(&self, value: &Value) -> Value {
        value.clone()
    }
}

struct PassThroughConverter {
    name: &'static str,
    column: ColumnType,
}

impl TypeConverter for PassThroughConverter {
    fn name(&self) -> &str {
        self.name
    }

    fn default_column_type(&self) -> ColumnType {
        self.column
    }
}

struct WideningDoubleConverter;

impl TypeConverter for WideningDoubleConverter {
    fn name(&self) -> &str {
        "double"
    }

    fn default_column_type(&self) -> ColumnType {
        ColumnType::Double
    }

    fn to_wire(&self, value: &Value) -> Value {
        match value.as_double() {
            Some(d) => Value::Double(d),
            None => value.clone(),
        }
    }
}

/// Registry resolving converters by value kind or by explicit override name
pub struct ConverterRegistry {
    by_kind: HashMap<ValueKind, Arc<dyn TypeConverter>>,
    by_name: HashMap<String, Arc<dyn TypeConverter>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        let mut registry = ConverterRegistry {
            by_kind: HashMap::new(),
            by_name: HashMap::new(),
        };
        registry.register(ValueKind::Boolean, pass("boolean", ColumnType::Boolean));
        registry.register(ValueKind::Integer, pass("integer", ColumnType::Bigint));
        registry.register(ValueKind::Double, Arc::new(WideningDoubleConverter));
        registry.register(ValueKind::String, pass("string", ColumnType::Varchar));
        registry.register(ValueKind::DateTime, pass("datetime", ColumnType::Timestamp));
        registry.register(ValueKind::Bytes, pass("bytes", ColumnType::Blob));
        registry.register(ValueKind::List, pass("list", ColumnType::Other));
        registry.register(ValueKind::Map, pass("map", ColumnType::Other));
        registry.register(ValueKind::Untyped, pass("untyped", ColumnType::Other));
        registry
    }
}

fn pass(name: &'static str, column: ColumnType) -> Arc<dyn TypeConverter> {
    Arc::new(PassThroughConverter { name, column })
}

impl ConverterRegistry {
    /// Registry preloaded with the pass-through converters for every
    /// value kind.
    pub fn new() -> Self {
        ConverterRegistry::default()
    }

    /// Register (or replace) the converter for a value kind. The converter
    /// also becomes addressable by its name for descriptor overrides.
    pub fn register(&mut self, kind: ValueKind, converter: Arc<dyn TypeConverter>) {
        self.by_name
            .insert(converter.name().to_string(), Arc::clone(&converter));
        self.by_kind.insert(kind, converter);
    }

    /// Register a converter only addressable by override name.
    pub fn register_named(&mut self, converter: Arc<dyn TypeConverter>) {
        self.by_name
            .insert(converter.name().to_string(), converter);
    }

    pub fn for_kind(&self, kind: ValueKind) -> Option<Arc<dyn TypeConverter>> {
        self.by_kind.get(&kind).cloned()
    }

    pub fn named(&self, name: &str) -> Option<Arc<dyn TypeConverter>> {
        self.by_name.get(name).cloned()
    }

    /// Resolve a descriptor's converter: explicit override name first, then
    /// the declared kind, failing compilation when neither resolves.
    pub fn resolve(
        &self,
        property: &str,
        kind: ValueKind,
        override_name: Option<&str>,
    ) -> Result<Arc<dyn TypeConverter>, CompileError> {
        if let Some(name) = override_name {
            return self.by_name.get(name).cloned().ok_or_else(|| {
                CompileError::UnresolvableConverter {
                    property: property.to_string(),
                    detail: format!("no converter named '{}'", name),
                }
            });
        }
        self.by_kind
            .get(&kind)
            .cloned()
            .ok_or_else(|| CompileError::UnresolvableConverter {
                property: property.to_string(),
                detail: format!("no converter registered for {:?}", kind),
            })
    }
}
