// Dweve FLATBIND - Flat Record Data Binding
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bidirectional text ↔ value codecs and their registry.
//!
//! A [`TypeHandler`] converts raw field text into a [`Value`] and back.
//! Handlers are stateless and shared process-wide: the global registry is
//! built once and frozen, and per-stream registries chain to it for
//! stream-local overrides.

mod handlers;
mod registry;

pub use handlers::{
    BoolHandler, CharHandler, DateHandler, DateTimeHandler, DecimalHandler, FloatHandler,
    IntHandler, StringHandler, TimeHandler, UIntHandler, UuidHandler,
};
pub use registry::TypeRegistry;

use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// The target type a handler converts to and from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    Char,
    String,
    Date,
    Time,
    DateTime,
    Uuid,
}

impl ValueType {
    /// The registry name every built-in handler is registered under.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Decimal => "decimal",
            Self::Char => "char",
            Self::String => "string",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Uuid => "uuid",
        }
    }

    /// The next wider type in the assignability chain, if any.
    pub(crate) fn widened(self) -> Option<ValueType> {
        match self {
            Self::I8 => Some(Self::I16),
            Self::I16 => Some(Self::I32),
            Self::I32 => Some(Self::I64),
            Self::U8 => Some(Self::U16),
            Self::U16 => Some(Self::U32),
            Self::U32 => Some(Self::U64),
            Self::F32 => Some(Self::F64),
            Self::Decimal => Some(Self::F64),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A bidirectional text ↔ value codec.
///
/// `parse` and `format` are inverse on the subset of values a handler
/// accepts. Implementations must be stateless and thread-safe; they never
/// hold references to contexts or streams.
pub trait TypeHandler: Send + Sync {
    /// The value type this handler produces.
    fn target(&self) -> ValueType;

    /// Parse field text into a value. The error message becomes a field
    /// error on the unmarshalling context.
    fn parse(&self, text: &str) -> Result<Value, String>;

    /// Format a value into field text.
    fn format(&self, value: &Value) -> Result<String, String>;

    /// Derive a handler bound to a field-level format pattern, for handlers
    /// that support pattern configuration (dates, decimals).
    fn with_pattern(&self, pattern: &str) -> Option<Arc<dyn TypeHandler>> {
        let _ = pattern;
        None
    }
}
