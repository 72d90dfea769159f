// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Loosely-typed runtime value model
//!
//! `Value` is the argument-object representation the whole pipeline operates
//! on: expression evaluation, parameter binding, cache keys, and cached
//! results all deal in `Value` trees. Doubles compare and hash by bit
//! pattern so values are usable as cache-key contributions.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value types for statement arguments, bound parameters and cached rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            // Bit comparison keeps NaN-carrying keys stable
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Double(d) => d.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::DateTime(dt) => dt.timestamp_millis().hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::List(items) => items.hash(state),
            Value::Map(entries) => {
                for (k, v) in entries {
                    k.hash(state);
                    v.hash(state);
                }
            }
        }
    }
}

impl Value {
    /// Extract as boolean if possible
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract as integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract as floating point, widening integers
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Extract as string slice if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract as list if possible
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Extract as map if possible
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Number of elements for lists/maps, length for strings
    pub fn size(&self) -> Option<usize> {
        match self {
            Value::List(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            Value::String(s) => Some(s.len()),
            _ => None,
        }
    }

    /// Navigate a dotted property path: `a.b.c`, list indexes `a[0]`,
    /// quoted map keys `a['k']`. Missing segments resolve to `Null`.
    pub fn get_path(&self, path: &str) -> Value {
        let mut current = self.clone();
        for segment in split_path(path) {
            current = match segment {
                PathSegment::Name(name) => match &current {
                    Value::Map(entries) => {
                        entries.get(name.as_str()).cloned().unwrap_or(Value::Null)
                    }
                    _ => Value::Null,
                },
                PathSegment::Index(idx) => match &current {
                    Value::List(items) => items.get(idx).cloned().unwrap_or(Value::Null),
                    _ => Value::Null,
                },
            };
            if current.is_null() {
                break;
            }
        }
        current
    }

    /// Set a top-level property on a map value, used by deferred loads
    /// writing a nested query result back onto a parent object.
    pub fn set_property(&mut self, name: &str, value: Value) {
        if let Value::Map(entries) = self {
            entries.insert(name.to_string(), value);
        }
    }

    /// Render the value as raw SQL text. This is the `${}` splice form:
    /// unescaped and unquoted, see the text-substitution docs.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Double(d) => d.to_string(),
            Value::String(s) => s.clone(),
            Value::DateTime(dt) => dt.to_rfc3339(),
            Value::Bytes(b) => format!("{:?}", b),
            Value::List(items) => items
                .iter()
                .map(Value::to_sql_literal)
                .collect::<Vec<_>>()
                .join(", "),
            Value::Map(_) => String::new(),
        }
    }
}

/// One segment of a navigated property path
enum PathSegment {
    Name(String),
    Index(usize),
}

fn split_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut rest = path;
    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('.') {
            rest = stripped;
            continue;
        }
        if let Some(stripped) = rest.strip_prefix('[') {
            let end = match stripped.find(']') {
                Some(end) => end,
                None => break,
            };
            let inner = &stripped[..end];
            let inner = inner.trim_matches('\'').trim_matches('"');
            if let Ok(idx) = inner.parse::<usize>() {
                segments.push(PathSegment::Index(idx));
            } else {
                segments.push(PathSegment::Name(inner.to_string()));
            }
            rest = &stripped[end + 1..];
            continue;
        }
        let end = rest
            .find(|c| c == '.' || c == '[')
            .unwrap_or(rest.len());
        segments.push(PathSegment::Name(rest[..end].to_string()));
        rest = &rest[end..];
    }
    segments
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Value {
        Value::from(serde_json::json!({
            "name": "ann",
            "age": 41,
            "address": { "city": "oslo" },
            "tags": ["a", "b", "c"]
        }))
    }

    #[test]
    fn path_navigation() {
        let p = person();
        assert_eq!(p.get_path("name"), Value::from("ann"));
        assert_eq!(p.get_path("address.city"), Value::from("oslo"));
        assert_eq!(p.get_path("tags[1]"), Value::from("b"));
        assert_eq!(p.get_path("missing.deep"), Value::Null);
    }

    #[test]
    fn double_equality_is_bitwise() {
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_ne!(Value::Double(0.0), Value::Double(-0.0));
        assert_ne!(Value::Double(1.0), Value::Integer(1));
    }

    #[test]
    fn sql_literal_rendering() {
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
        assert_eq!(Value::Integer(5).to_sql_literal(), "5");
        assert_eq!(Value::from("users").to_sql_literal(), "users");
        let list = Value::List(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(list.to_sql_literal(), "1, 2");
    }
}
