// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Literal and substitution-bearing text nodes

use crate::compile::marker;
use crate::error::ExprError;

use super::{RenderContext, SqlNode};

/// Plain SQL text, appended verbatim.
pub struct StaticTextNode {
    text: String,
}

impl StaticTextNode {
    pub fn new(text: impl Into<String>) -> Self {
        StaticTextNode { text: text.into() }
    }
}

impl SqlNode for StaticTextNode {
    fn apply(&self, ctx: &mut RenderContext) -> Result<bool, ExprError> {
        ctx.append(&self.text);
        Ok(true)
    }

    fn is_dynamic(&self) -> bool {
        false
    }
}

/// Text that may carry inline `${}` substitution markers.
///
/// Markers resolve against the bindings at render time, not parse time.
/// Whether the node is dynamic at all is decided once, at parse time, by
/// scanning for markers; marker-free text degrades to static behavior.
pub struct TextNode {
    text: String,
    dynamic: bool,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let dynamic = marker::contains_substitution(&text);
        TextNode { text, dynamic }
    }
}

impl SqlNode for TextNode {
    fn apply(&self, ctx: &mut RenderContext) -> Result<bool, ExprError> {
        if self.dynamic {
            let substituted = marker::substitute_literals(&self.text, ctx.bindings())?;
            ctx.append(&substituted);
        } else {
            ctx.append(&self.text);
        }
        Ok(true)
    }

    fn is_dynamic(&self) -> bool {
        self.dynamic
    }
}
