// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! SQL sources: per-call compilation of rendered templates
//!
//! A `SqlSource` turns an argument object into a `BoundStatement`.
//! `DynamicSqlSource` renders the node tree per call; `StaticSqlSource`
//! holds pre-rendered text (the registration-time fast path for templates
//! with no dynamic node) and only resolves markers per call.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::trace;

use crate::compile::bound::{resolve_property, BoundStatement, ParameterDescriptor};
use crate::compile::marker::{self, MarkerSpec, PARAM_MARKER};
use crate::error::CompileError;
use crate::sqlnode::{RenderContext, SqlNode, PARAMETER_BINDING};
use crate::types::{ConverterRegistry, Value, ValueKind};

/// Compiles an argument object into an executable statement.
pub trait SqlSource: Send + Sync {
    fn bound_statement(
        &self,
        registry: &ConverterRegistry,
        argument: &Value,
    ) -> Result<BoundStatement, CompileError>;
}

/// Scan rendered SQL left-to-right, replacing each `#{...}` with a
/// positional placeholder and emitting one descriptor per occurrence in
/// appearance order.
pub(crate) fn compile_markers(
    rendered: &str,
    argument: &Value,
    side_bindings: &BTreeMap<String, Value>,
    registry: &ConverterRegistry,
) -> Result<(String, Vec<ParameterDescriptor>), CompileError> {
    let mut sql = String::with_capacity(rendered.len());
    let mut descriptors = Vec::new();
    let mut last_end = 0;

    for found in PARAM_MARKER.find_iter(rendered) {
        // marker shape is #{inner}
        let inner = &rendered[found.start() + 2..found.end() - 1];
        let spec = marker::parse_marker(inner)?;

        sql.push_str(&rendered[last_end..found.start()]);
        sql.push('?');
        last_end = found.end();

        let kind = resolve_kind(&spec, argument, side_bindings);
        let converter = registry
            .resolve(&spec.property, kind, spec.converter.as_deref())?
            .name()
            .to_string();
        descriptors.push(ParameterDescriptor {
            property: spec.property,
            kind,
            column: spec.column,
            mode: spec.mode,
            numeric_scale: spec.numeric_scale,
            result_ref: spec.result_ref,
            converter,
        });
    }
    sql.push_str(&rendered[last_end..]);
    Ok((sql, descriptors))
}

/// Target-kind resolution order: explicit declaration, side-bindings from
/// the render, the whole argument for `_parameter`, property introspection
/// on the argument object, untyped default.
fn resolve_kind(
    spec: &MarkerSpec,
    argument: &Value,
    side_bindings: &BTreeMap<String, Value>,
) -> ValueKind {
    if let Some(kind) = spec.kind {
        return kind;
    }
    let resolved = resolve_property(&spec.property, argument, side_bindings);
    if !resolved.is_null() {
        return ValueKind::of(&resolved);
    }
    if spec.property == PARAMETER_BINDING {
        return ValueKind::of(argument);
    }
    ValueKind::Untyped
}

/// Renders a dynamic node tree per call, then compiles the markers.
pub struct DynamicSqlSource {
    root: Arc<dyn SqlNode>,
}

impl DynamicSqlSource {
    pub fn new(root: Arc<dyn SqlNode>) -> Self {
        DynamicSqlSource { root }
    }
}

impl SqlSource for DynamicSqlSource {
    fn bound_statement(
        &self,
        registry: &ConverterRegistry,
        argument: &Value,
    ) -> Result<BoundStatement, CompileError> {
        let mut ctx = RenderContext::new(argument);
        self.root.apply(&mut ctx)?;
        let (rendered, side_bindings) = ctx.into_parts();
        trace!("rendered dynamic statement: {}", rendered);
        let (sql, descriptors) = compile_markers(&rendered, argument, &side_bindings, registry)?;
        Ok(BoundStatement::new(
            sql,
            descriptors,
            argument.clone(),
            side_bindings,
        ))
    }
}

/// Pre-rendered SQL text with markers, compiled once at registration.
/// Marker syntax errors surface when the source is constructed, never at
/// call time; call time only resolves descriptor kinds against the
/// argument.
pub struct StaticSqlSource {
    sql: String,
}

impl StaticSqlSource {
    pub fn new(sql: impl Into<String>) -> Result<Self, CompileError> {
        let sql = sql.into();
        for caps in PARAM_MARKER.captures_iter(&sql) {
            marker::parse_marker(&caps[1])?;
        }
        Ok(StaticSqlSource { sql })
    }
}

impl SqlSource for StaticSqlSource {
    fn bound_statement(
        &self,
        registry: &ConverterRegistry,
        argument: &Value,
    ) -> Result<BoundStatement, CompileError> {
        let side_bindings = BTreeMap::new();
        let (sql, descriptors) = compile_markers(&self.sql, argument, &side_bindings, registry)?;
        Ok(BoundStatement::new(
            sql,
            descriptors,
            argument.clone(),
            side_bindings,
        ))
    }
}
