// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Variable-bind node

use crate::error::ExprError;
use crate::expr;

use super::{RenderContext, SqlNode};

/// Evaluates an expression once and introduces the result as a named
/// binding for subsequent siblings. Produces no SQL text itself.
pub struct VarBindNode {
    name: String,
    expression: String,
}

impl VarBindNode {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        VarBindNode {
            name: name.into(),
            expression: expression.into(),
        }
    }
}

impl SqlNode for VarBindNode {
    fn apply(&self, ctx: &mut RenderContext) -> Result<bool, ExprError> {
        let value = expr::evaluate_value(&self.expression, ctx.bindings())?;
        ctx.bind(&self.name, value);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn introduces_binding_for_siblings() {
        let arg = Value::from(serde_json::json!({ "name": "ann" }));
        let mut ctx = RenderContext::new(&arg);
        VarBindNode::new("probe", "name").apply(&mut ctx).expect("bind");
        assert_eq!(ctx.bindings().get_path("probe"), Value::from("ann"));
        assert_eq!(
            ctx.added_bindings().get("probe"),
            Some(&Value::from("ann"))
        );
    }
}
