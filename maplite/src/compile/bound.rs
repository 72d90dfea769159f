// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Compiled statement representation

use std::collections::BTreeMap;

use crate::compile::marker::ParamMode;
use crate::sqlnode::PARAMETER_BINDING;
use crate::types::{ColumnType, ConverterRegistry, Value, ValueKind};

/// Fully resolved metadata for one positional parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Property path or expression addressing the bound value.
    pub property: String,
    /// Resolved value kind.
    pub kind: ValueKind,
    /// Explicit wire column type, when the marker declared one.
    pub column: Option<ColumnType>,
    pub mode: ParamMode,
    pub numeric_scale: Option<u32>,
    /// Nested-result reference for cursor parameters.
    pub result_ref: Option<String>,
    /// Name of the resolved converter. Resolution happens at compile time;
    /// a descriptor without a resolvable converter fails the compile.
    pub converter: String,
}

/// One parameter ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct WireParam {
    pub value: Value,
    pub column: ColumnType,
}

/// The compiled form of one statement invocation: final SQL text with
/// positional placeholders, ordered parameter descriptors, the argument
/// object, and the side-table of bindings the render introduced.
///
/// Immutable after construction except for additive side-bindings during
/// the same render pass.
#[derive(Debug, Clone)]
pub struct BoundStatement {
    sql: String,
    descriptors: Vec<ParameterDescriptor>,
    argument: Value,
    side_bindings: BTreeMap<String, Value>,
}

impl BoundStatement {
    pub fn new(
        sql: String,
        descriptors: Vec<ParameterDescriptor>,
        argument: Value,
        side_bindings: BTreeMap<String, Value>,
    ) -> Self {
        BoundStatement {
            sql,
            descriptors,
            argument,
            side_bindings,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn descriptors(&self) -> &[ParameterDescriptor] {
        &self.descriptors
    }

    pub fn argument(&self) -> &Value {
        &self.argument
    }

    pub fn side_binding(&self, name: &str) -> Option<&Value> {
        self.side_bindings.get(name)
    }

    pub fn has_side_binding(&self, name: &str) -> bool {
        self.side_bindings.contains_key(name)
    }

    /// Additive only, and only during the render pass that builds this
    /// statement (loop frames, generated keys).
    pub fn add_side_binding(&mut self, name: impl Into<String>, value: Value) {
        self.side_bindings.insert(name.into(), value);
    }

    /// Resolve a descriptor property to its runtime value: side-table
    /// names shadow the argument object.
    pub fn parameter_value(&self, property: &str) -> Value {
        resolve_property(property, &self.argument, &self.side_bindings)
    }

    /// Materialize the ordered wire parameters for execution, skipping
    /// out-mode descriptors (they carry no inbound value).
    pub fn wire_parameters(&self, registry: &ConverterRegistry) -> Vec<WireParam> {
        self.descriptors
            .iter()
            .filter(|d| d.mode != ParamMode::Out)
            .map(|d| {
                let value = self.parameter_value(&d.property);
                let (value, column) = match registry.named(&d.converter) {
                    Some(converter) => (
                        converter.to_wire(&value),
                        d.column.unwrap_or_else(|| converter.default_column_type()),
                    ),
                    None => (value, d.column.unwrap_or(ColumnType::Other)),
                };
                WireParam { value, column }
            })
            .collect()
    }
}

/// Shared property resolution: the side-table shadows the argument, and
/// `_parameter` always addresses the whole argument object.
pub(crate) fn resolve_property(
    property: &str,
    argument: &Value,
    side_bindings: &BTreeMap<String, Value>,
) -> Value {
    if property == PARAMETER_BINDING {
        return argument.clone();
    }
    let head_len = property
        .find(|c| c == '.' || c == '[')
        .unwrap_or(property.len());
    let (head, rest) = property.split_at(head_len);
    if let Some(bound) = side_bindings.get(head) {
        if rest.is_empty() {
            return bound.clone();
        }
        return bound.get_path(rest);
    }
    argument.get_path(property)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_bindings_shadow_argument_properties() {
        let argument = Value::from(serde_json::json!({ "id": 1 }));
        let mut side = BTreeMap::new();
        side.insert("id".to_string(), Value::Integer(99));
        assert_eq!(
            resolve_property("id", &argument, &side),
            Value::Integer(99)
        );
    }

    #[test]
    fn parameter_binding_addresses_whole_argument() {
        let argument = Value::Integer(7);
        assert_eq!(
            resolve_property("_parameter", &argument, &BTreeMap::new()),
            Value::Integer(7)
        );
    }

    #[test]
    fn side_binding_navigation() {
        let argument = Value::Null;
        let mut side = BTreeMap::new();
        side.insert(
            "__frch_u_0".to_string(),
            Value::from(serde_json::json!({ "id": 4 })),
        );
        assert_eq!(
            resolve_property("__frch_u_0.id", &argument, &side),
            Value::Integer(4)
        );
    }
}
