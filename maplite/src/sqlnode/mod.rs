// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Dynamic SQL node tree
//!
//! A statement template parses into a closed set of node variants. Nodes
//! are immutable after parse; rendering writes only into the
//! `RenderContext`, so one parsed tree serves concurrent renders.

pub mod bind;
pub mod conditional;
pub mod context;
pub mod foreach;
pub mod text;
pub mod trim;

use std::sync::Arc;

pub use bind::VarBindNode;
pub use conditional::{ChooseNode, IfNode};
pub use context::{RenderContext, PARAMETER_BINDING};
pub use foreach::ForEachNode;
pub use text::{StaticTextNode, TextNode};
pub use trim::TrimNode;

use crate::error::ExprError;

/// One renderable node of the dynamic SQL tree.
pub trait SqlNode: Send + Sync {
    /// Render into the context; returns whether anything was produced.
    fn apply(&self, ctx: &mut RenderContext) -> Result<bool, ExprError>;

    /// Whether rendering can differ between calls. A tree with no dynamic
    /// node takes the compile-once fast path at registration time.
    fn is_dynamic(&self) -> bool {
        true
    }
}

/// Ordered sequence of child nodes.
pub struct MixedNode {
    children: Vec<Arc<dyn SqlNode>>,
}

impl MixedNode {
    pub fn new(children: Vec<Arc<dyn SqlNode>>) -> Self {
        MixedNode { children }
    }
}

impl SqlNode for MixedNode {
    fn apply(&self, ctx: &mut RenderContext) -> Result<bool, ExprError> {
        for child in &self.children {
            child.apply(ctx)?;
        }
        Ok(true)
    }

    fn is_dynamic(&self) -> bool {
        self.children.iter().any(|c| c.is_dynamic())
    }
}
