// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Runtime value model and type conversion

pub mod converter;
pub mod value;

pub use converter::{ColumnType, ConverterRegistry, TypeConverter, ValueKind};
pub use value::Value;
