// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Render context for one dynamic-SQL render pass

use std::collections::BTreeMap;

use crate::types::Value;

/// Name under which the whole argument object is always reachable.
pub const PARAMETER_BINDING: &str = "_parameter";

/// Mutable accumulation bag owned by exactly one render pass.
///
/// Holds the growing SQL buffer and the binding namespace: the argument
/// object's own properties plus names introduced by `<bind>` and foreach
/// iteration frames. Never shared across renders. Sub-renders (trim,
/// foreach bodies) checkpoint the buffer and splice their output back in
/// rather than owning a separate context.
pub struct RenderContext {
    sql: String,
    bindings: Value,
    added: BTreeMap<String, Value>,
    unique: u32,
}

impl RenderContext {
    pub fn new(argument: &Value) -> Self {
        let mut base = match argument {
            Value::Map(entries) => entries.clone(),
            _ => BTreeMap::new(),
        };
        base.insert(PARAMETER_BINDING.to_string(), argument.clone());
        RenderContext {
            sql: String::new(),
            bindings: Value::Map(base),
            added: BTreeMap::new(),
            unique: 0,
        }
    }

    /// Append rendered text verbatim.
    pub fn append(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    /// Append with a single separating space unless the buffer already ends
    /// in whitespace. Used when splicing trimmed sub-renders back in.
    pub fn append_spaced(&mut self, fragment: &str) {
        if !self.sql.is_empty() && !self.sql.ends_with(char::is_whitespace) {
            self.sql.push(' ');
        }
        self.sql.push_str(fragment);
    }

    pub fn len(&self) -> usize {
        self.sql.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Detach everything appended since `checkpoint`, for sub-renders that
    /// post-process their output before forwarding it.
    pub fn split_off(&mut self, checkpoint: usize) -> String {
        self.sql.split_off(checkpoint)
    }

    /// Introduce a named binding visible to subsequent evaluation.
    pub fn bind(&mut self, name: &str, value: Value) {
        if let Value::Map(entries) = &mut self.bindings {
            entries.insert(name.to_string(), value.clone());
        }
        self.added.insert(name.to_string(), value);
    }

    pub fn bindings(&self) -> &Value {
        &self.bindings
    }

    /// Bindings introduced during this render (the side-table carried on
    /// the compiled statement for loop/bind-generated values).
    pub fn added_bindings(&self) -> &BTreeMap<String, Value> {
        &self.added
    }

    /// Monotonic number source for foreach iteration frames.
    pub fn next_unique(&mut self) -> u32 {
        let n = self.unique;
        self.unique += 1;
        n
    }

    /// Final rendered SQL (still containing `#{}` markers) plus the
    /// side-table of render-introduced bindings.
    pub fn into_parts(self) -> (String, BTreeMap<String, Value>) {
        (self.sql.trim().to_string(), self.added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_argument_is_reachable_as_parameter() {
        let ctx = RenderContext::new(&Value::Integer(7));
        assert_eq!(ctx.bindings().get_path("_parameter"), Value::Integer(7));
    }

    #[test]
    fn map_argument_properties_are_top_level() {
        let arg = Value::from(serde_json::json!({ "id": 5 }));
        let ctx = RenderContext::new(&arg);
        assert_eq!(ctx.bindings().get_path("id"), Value::Integer(5));
    }

    #[test]
    fn added_bindings_are_tracked_separately() {
        let arg = Value::from(serde_json::json!({ "id": 5 }));
        let mut ctx = RenderContext::new(&arg);
        ctx.bind("pattern", Value::from("%x%"));
        assert_eq!(ctx.bindings().get_path("pattern"), Value::from("%x%"));
        assert_eq!(ctx.added_bindings().len(), 1);
        assert!(!ctx.added_bindings().contains_key("id"));
    }
}
