// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Conditional nodes: if and choose/when/otherwise

use std::sync::Arc;

use crate::error::ExprError;
use crate::expr;

use super::{RenderContext, SqlNode};

/// Renders its contents iff the test predicate holds.
pub struct IfNode {
    test: String,
    contents: Arc<dyn SqlNode>,
}

impl IfNode {
    pub fn new(test: impl Into<String>, contents: Arc<dyn SqlNode>) -> Self {
        IfNode {
            test: test.into(),
            contents,
        }
    }
}

impl SqlNode for IfNode {
    fn apply(&self, ctx: &mut RenderContext) -> Result<bool, ExprError> {
        if expr::evaluate_bool(&self.test, ctx.bindings())? {
            self.contents.apply(ctx)?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// First-match selection: renders the first `when` whose test holds,
/// otherwise the `otherwise` branch if present.
pub struct ChooseNode {
    whens: Vec<IfNode>,
    otherwise: Option<Arc<dyn SqlNode>>,
}

impl ChooseNode {
    pub fn new(whens: Vec<IfNode>, otherwise: Option<Arc<dyn SqlNode>>) -> Self {
        ChooseNode { whens, otherwise }
    }
}

impl SqlNode for ChooseNode {
    fn apply(&self, ctx: &mut RenderContext) -> Result<bool, ExprError> {
        for when in &self.whens {
            if when.apply(ctx)? {
                return Ok(true);
            }
        }
        if let Some(otherwise) = &self.otherwise {
            otherwise.apply(ctx)?;
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlnode::StaticTextNode;
    use crate::types::Value;

    fn render(node: &dyn SqlNode, arg: serde_json::Value) -> (String, bool) {
        let mut ctx = RenderContext::new(&Value::from(arg));
        let produced = node.apply(&mut ctx).expect("render");
        (ctx.into_parts().0, produced)
    }

    #[test]
    fn if_renders_only_when_true() {
        let node = IfNode::new(
            "id != null",
            Arc::new(StaticTextNode::new("AND id = #{id}")),
        );
        let (sql, produced) = render(&node, serde_json::json!({ "id": 5 }));
        assert!(produced);
        assert_eq!(sql, "AND id = #{id}");

        let (sql, produced) = render(&node, serde_json::json!({ "id": null }));
        assert!(!produced);
        assert_eq!(sql, "");
    }

    #[test]
    fn choose_takes_first_true_when() {
        let node = ChooseNode::new(
            vec![
                IfNode::new("a != null", Arc::new(StaticTextNode::new("A"))),
                IfNode::new("b != null", Arc::new(StaticTextNode::new("B"))),
            ],
            Some(Arc::new(StaticTextNode::new("OTHER"))),
        );
        let (sql, _) = render(&node, serde_json::json!({ "a": 1, "b": 2 }));
        assert_eq!(sql, "A");
        let (sql, _) = render(&node, serde_json::json!({ "b": 2 }));
        assert_eq!(sql, "B");
        let (sql, _) = render(&node, serde_json::json!({}));
        assert_eq!(sql, "OTHER");
    }

    #[test]
    fn choose_without_otherwise_may_render_nothing() {
        let node = ChooseNode::new(
            vec![IfNode::new("a != null", Arc::new(StaticTextNode::new("A")))],
            None,
        );
        let (sql, produced) = render(&node, serde_json::json!({}));
        assert!(!produced);
        assert_eq!(sql, "");
    }
}
