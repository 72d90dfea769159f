// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Trim node and its where/set specializations

use std::sync::Arc;

use crate::error::ExprError;

use super::{RenderContext, SqlNode};

/// Buffers its children's output, strips configured leading/trailing
/// tokens (case-insensitive), applies a prefix/suffix, and forwards the
/// result to the parent context exactly once. An empty body forwards
/// nothing, prefix and suffix included.
pub struct TrimNode {
    contents: Arc<dyn SqlNode>,
    prefix: Option<String>,
    suffix: Option<String>,
    prefix_overrides: Vec<String>,
    suffix_overrides: Vec<String>,
}

impl TrimNode {
    pub fn new(
        contents: Arc<dyn SqlNode>,
        prefix: Option<String>,
        suffix: Option<String>,
        prefix_overrides: Vec<String>,
        suffix_overrides: Vec<String>,
    ) -> Self {
        TrimNode {
            contents,
            prefix,
            suffix,
            prefix_overrides,
            suffix_overrides,
        }
    }

    /// `<where>`: strip leading AND/OR, prefix the remainder with WHERE.
    pub fn where_node(contents: Arc<dyn SqlNode>) -> Self {
        TrimNode::new(
            contents,
            Some("WHERE".to_string()),
            None,
            vec![
                "AND ".to_string(),
                "OR ".to_string(),
                "AND\t".to_string(),
                "OR\t".to_string(),
                "AND\n".to_string(),
                "OR\n".to_string(),
            ],
            Vec::new(),
        )
    }

    /// `<set>`: strip a trailing separator, prefix with SET.
    pub fn set_node(contents: Arc<dyn SqlNode>) -> Self {
        TrimNode::new(
            contents,
            Some("SET".to_string()),
            None,
            Vec::new(),
            vec![",".to_string()],
        )
    }
}

impl SqlNode for TrimNode {
    fn apply(&self, ctx: &mut RenderContext) -> Result<bool, ExprError> {
        let checkpoint = ctx.len();
        let produced = self.contents.apply(ctx)?;
        let body = ctx.split_off(checkpoint);

        let mut trimmed = body.trim();
        for token in &self.prefix_overrides {
            if starts_with_ignore_case(trimmed, token) {
                trimmed = trimmed[token.len()..].trim_start();
                break;
            }
        }
        for token in &self.suffix_overrides {
            if ends_with_ignore_case(trimmed, token) {
                trimmed = trimmed[..trimmed.len() - token.len()].trim_end();
                break;
            }
        }
        if trimmed.is_empty() {
            return Ok(false);
        }

        let mut result = String::new();
        if let Some(prefix) = &self.prefix {
            result.push_str(prefix);
            result.push(' ');
        }
        result.push_str(trimmed);
        if let Some(suffix) = &self.suffix {
            result.push(' ');
            result.push_str(suffix);
        }
        ctx.append_spaced(&result);
        Ok(produced)
    }
}

fn starts_with_ignore_case(text: &str, token: &str) -> bool {
    text.len() >= token.len() && text[..token.len()].eq_ignore_ascii_case(token)
}

fn ends_with_ignore_case(text: &str, token: &str) -> bool {
    text.len() >= token.len() && text[text.len() - token.len()..].eq_ignore_ascii_case(token)
}
