// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! SQL template compilation
//!
//! Takes rendered template text through two passes: `${}` literal
//! substitution happens during rendering (see `sqlnode::text`), then the
//! marker compiler rewrites `#{}` occurrences into positional placeholders
//! with ordered, typed parameter descriptors.

pub mod bound;
pub mod marker;
pub mod source;
pub mod template;

pub use bound::{BoundStatement, ParameterDescriptor, WireParam};
pub use marker::{MarkerSpec, ParamMode};
pub use source::{DynamicSqlSource, SqlSource, StaticSqlSource};
pub use template::{build_sql_source, parse_template};
