// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Marker token scanning
//!
//! Two distinct marker syntaxes flow through a statement template:
//!
//! - `#{property, attr=value, ...}`: bind parameters, rewritten to
//!   positional placeholders by the compiler;
//! - `${expression}`: raw literal substitution, spliced into the SQL text
//!   unescaped and unquoted.
//!
//! The `${}` form is an intentional injection surface: its purpose is raw
//! text composition (dynamic identifiers, fragments). It resolves through
//! the same binding namespace as predicate evaluation, so even loop-bound
//! variables can be spliced. Callers must never feed it untrusted input.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::{CompileError, ExprError};
use crate::expr;
use crate::types::{ColumnType, ValueKind, Value};

/// `#{...}` bind-parameter markers
pub static PARAM_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\{([^}]*)\}").expect("static regex"));

/// `${...}` literal-substitution markers
static SUBST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]*)\}").expect("static regex"));

/// Parameter I/O mode; `Out`/`InOut` exist for stored-procedure support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    In,
    Out,
    InOut,
}

/// Parsed content of one `#{...}` marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub property: String,
    pub kind: Option<ValueKind>,
    pub column: Option<ColumnType>,
    pub mode: ParamMode,
    pub numeric_scale: Option<u32>,
    pub result_ref: Option<String>,
    pub converter: Option<String>,
}

/// Parse the comma-separated property-plus-options form inside `#{}`.
pub fn parse_marker(inner: &str) -> Result<MarkerSpec, CompileError> {
    let mut parts = inner.split(',');
    let property = parts
        .next()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if property.is_empty() {
        return Err(CompileError::MalformedMarker(inner.to_string()));
    }

    let mut spec = MarkerSpec {
        property,
        kind: None,
        column: None,
        mode: ParamMode::In,
        numeric_scale: None,
        result_ref: None,
        converter: None,
    };

    for part in parts {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| CompileError::MalformedMarker(inner.to_string()))?;
        let key = key.trim();
        let value = value.trim();
        match key {
            "kind" | "javaType" => {
                spec.kind = Some(ValueKind::parse(value).ok_or_else(|| {
                    CompileError::UnknownAttribute {
                        marker: inner.to_string(),
                        attribute: format!("kind={}", value),
                    }
                })?);
            }
            "column" | "jdbcType" => {
                spec.column = Some(ColumnType::parse(value).ok_or_else(|| {
                    CompileError::UnknownAttribute {
                        marker: inner.to_string(),
                        attribute: format!("column={}", value),
                    }
                })?);
            }
            "mode" => {
                spec.mode = match value.to_ascii_uppercase().as_str() {
                    "IN" => ParamMode::In,
                    "OUT" => ParamMode::Out,
                    "INOUT" => ParamMode::InOut,
                    _ => {
                        return Err(CompileError::UnknownAttribute {
                            marker: inner.to_string(),
                            attribute: format!("mode={}", value),
                        })
                    }
                };
            }
            "numericScale" | "scale" => {
                spec.numeric_scale =
                    Some(value.parse().map_err(|_| CompileError::UnknownAttribute {
                        marker: inner.to_string(),
                        attribute: format!("numericScale={}", value),
                    })?);
            }
            "resultRef" | "resultMap" => {
                spec.result_ref = Some(value.to_string());
            }
            "converter" | "typeHandler" => {
                spec.converter = Some(value.to_string());
            }
            other => {
                return Err(CompileError::UnknownAttribute {
                    marker: inner.to_string(),
                    attribute: other.to_string(),
                })
            }
        }
    }
    Ok(spec)
}

/// Whether the text contains at least one `${}` marker. Computed once at
/// parse time to classify text nodes as dynamic.
pub fn contains_substitution(text: &str) -> bool {
    SUBST_MARKER.is_match(text)
}

/// Resolve every `${expr}` against the binding namespace and splice the
/// stringified result into the text. Raw and unescaped: this is the
/// documented injection surface, never parameterized.
pub fn substitute_literals(text: &str, bindings: &Value) -> Result<String, ExprError> {
    let mut failure: Option<ExprError> = None;
    let substituted = SUBST_MARKER.replace_all(text, |caps: &Captures<'_>| {
        let source = caps[1].trim();
        match expr::evaluate_value(source, bindings) {
            Ok(value) => value.to_sql_literal(),
            Err(e) => {
                if failure.is_none() {
                    failure = Some(e);
                }
                String::new()
            }
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(substituted.into_owned()),
    }
}
