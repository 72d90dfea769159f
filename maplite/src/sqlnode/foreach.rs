// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Collection iteration node

use std::sync::Arc;

use regex::Captures;

use crate::compile::marker::PARAM_MARKER;
use crate::error::ExprError;
use crate::expr;

use super::{RenderContext, SqlNode};

/// Renders its body once per collection entry.
///
/// Each iteration binds the item (and index) under the declared name and
/// under a frame-qualified synthetic name, then rewrites the body's `#{}`
/// markers to the synthetic names so every iteration's value stays
/// independently addressable after the loop variables are rebound.
///
/// An empty or absent collection renders nothing at all, with no open,
/// close or separator, so the surrounding SQL never ends up malformed.
pub struct ForEachNode {
    collection: String,
    item: Option<String>,
    index: Option<String>,
    open: Option<String>,
    close: Option<String>,
    separator: Option<String>,
    contents: Arc<dyn SqlNode>,
}

impl ForEachNode {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        collection: impl Into<String>,
        item: Option<String>,
        index: Option<String>,
        open: Option<String>,
        close: Option<String>,
        separator: Option<String>,
        contents: Arc<dyn SqlNode>,
    ) -> Self {
        ForEachNode {
            collection: collection.into(),
            item,
            index,
            open,
            close,
            separator,
            contents,
        }
    }
}

fn synthetic(name: &str, frame: u32) -> String {
    format!("__frch_{}_{}", name, frame)
}

/// Qualify `property` with the frame number when it addresses `name`
/// (exactly, or as the head of a longer navigation).
fn qualify(property: &str, name: &str, frame: u32) -> Option<String> {
    if property == name {
        return Some(synthetic(name, frame));
    }
    let rest = property.strip_prefix(name)?;
    if rest.starts_with('.') || rest.starts_with('[') {
        return Some(format!("{}{}", synthetic(name, frame), rest));
    }
    None
}

fn rewrite_markers(body: &str, item: Option<&str>, index: Option<&str>, frame: u32) -> String {
    PARAM_MARKER
        .replace_all(body, |caps: &Captures<'_>| {
            let inner = &caps[1];
            let (property, attrs) = match inner.split_once(',') {
                Some((p, rest)) => (p.trim(), Some(rest)),
                None => (inner.trim(), None),
            };
            let qualified = item
                .and_then(|name| qualify(property, name, frame))
                .or_else(|| index.and_then(|name| qualify(property, name, frame)));
            let property = match qualified {
                Some(q) => q,
                None => property.to_string(),
            };
            match attrs {
                Some(attrs) => format!("#{{{},{}}}", property, attrs),
                None => format!("#{{{}}}", property),
            }
        })
        .into_owned()
}

impl SqlNode for ForEachNode {
    fn apply(&self, ctx: &mut RenderContext) -> Result<bool, ExprError> {
        let entries = expr::evaluate_iterable(&self.collection, ctx.bindings())?;
        if entries.is_empty() {
            return Ok(false);
        }

        if let Some(open) = &self.open {
            ctx.append(open);
        }
        for (i, entry) in entries.into_iter().enumerate() {
            if i > 0 {
                if let Some(separator) = &self.separator {
                    ctx.append(separator);
                }
            }
            let frame = ctx.next_unique();
            if let Some(item) = &self.item {
                ctx.bind(item, entry.item.clone());
                ctx.bind(&synthetic(item, frame), entry.item);
            }
            if let Some(index) = &self.index {
                ctx.bind(index, entry.index.clone());
                ctx.bind(&synthetic(index, frame), entry.index);
            }

            let checkpoint = ctx.len();
            self.contents.apply(ctx)?;
            let body = ctx.split_off(checkpoint);
            let rewritten =
                rewrite_markers(&body, self.item.as_deref(), self.index.as_deref(), frame);
            ctx.append(&rewritten);
        }
        if let Some(close) = &self.close {
            ctx.append(close);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlnode::TextNode;
    use crate::types::Value;

    fn ids_node() -> ForEachNode {
        ForEachNode::new(
            "ids",
            Some("i".to_string()),
            None,
            Some("(".to_string()),
            Some(")".to_string()),
            Some(",".to_string()),
            Arc::new(TextNode::new("#{i}")),
        )
    }

    #[test]
    fn rewrites_markers_per_iteration() {
        let arg = Value::from(serde_json::json!({ "ids": [1, 2, 3] }));
        let mut ctx = RenderContext::new(&arg);
        let produced = ids_node().apply(&mut ctx).expect("render");
        assert!(produced);
        assert_eq!(
            ctx.bindings().get_path("__frch_i_0"),
            Value::Integer(1)
        );
        assert_eq!(
            ctx.bindings().get_path("__frch_i_2"),
            Value::Integer(3)
        );
        let (sql, added) = ctx.into_parts();
        assert_eq!(sql, "(#{__frch_i_0},#{__frch_i_1},#{__frch_i_2})");
        assert_eq!(added.get("__frch_i_1"), Some(&Value::Integer(2)));
    }

    #[test]
    fn empty_collection_renders_nothing() {
        let arg = Value::from(serde_json::json!({ "ids": [] }));
        let mut ctx = RenderContext::new(&arg);
        let produced = ids_node().apply(&mut ctx).expect("render");
        assert!(!produced);
        assert_eq!(ctx.into_parts().0, "");
    }

    #[test]
    fn maps_iterate_as_key_value() {
        let node = ForEachNode::new(
            "filters",
            Some("v".to_string()),
            Some("k".to_string()),
            None,
            None,
            Some(" AND ".to_string()),
            Arc::new(TextNode::new("${k} = #{v}")),
        );
        let arg = Value::from(serde_json::json!({ "filters": { "age": 41, "city": "oslo" } }));
        let mut ctx = RenderContext::new(&arg);
        node.apply(&mut ctx).expect("render");
        let (sql, _) = ctx.into_parts();
        assert_eq!(sql, "age = #{__frch_v_0} AND city = #{__frch_v_1}");
    }

    #[test]
    fn nested_navigation_is_qualified() {
        let node = ForEachNode::new(
            "users",
            Some("u".to_string()),
            None,
            None,
            None,
            Some(",".to_string()),
            Arc::new(TextNode::new("(#{u.id}, #{u.name})")),
        );
        let arg = Value::from(serde_json::json!({
            "users": [ { "id": 1, "name": "a" } ]
        }));
        let mut ctx = RenderContext::new(&arg);
        node.apply(&mut ctx).expect("render");
        let (sql, _) = ctx.into_parts();
        assert_eq!(sql, "(#{__frch_u_0.id}, #{__frch_u_0.name})");
    }
}
