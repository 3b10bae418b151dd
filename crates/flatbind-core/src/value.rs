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

//! Value and record-object types produced by unmarshalling.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use uuid::Uuid;

/// A scalar or composite value bound to a record property.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value. Narrow widths parse into this variant with
    /// range enforcement at the type-handler boundary.
    Int(i64),
    /// Unsigned integer value.
    UInt(u64),
    /// Floating-point value.
    Float(f64),
    /// Single character value.
    Char(char),
    /// String value.
    String(String),
    /// Calendar date without timezone.
    Date(NaiveDate),
    /// Wall-clock time without timezone.
    Time(NaiveTime),
    /// Combined date and time without timezone.
    DateTime(NaiveDateTime),
    /// UUID value.
    Uuid(Uuid),
    /// Repeated values bound from a collection field or segment.
    List(Vec<Value>),
    /// A nested record object.
    Record(Box<Bean>),
}

impl Value {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as a signed integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Try to get the value as an unsigned integer.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Self::UInt(n) => Some(*n),
            Self::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Try to get the value as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            Self::UInt(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Try to get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as a record object.
    pub fn as_record(&self) -> Option<&Bean> {
        match self {
            Self::Record(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get the value as a list of values.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::UInt(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Char(c) => write!(f, "{}", c),
            Self::String(s) => write!(f, "{}", s),
            Self::Date(d) => write!(f, "{}", d),
            Self::Time(t) => write!(f, "{}", t),
            Self::DateTime(dt) => write!(f, "{}", dt),
            Self::Uuid(u) => write!(f, "{}", u),
            Self::List(_) => write!(f, "[list]"),
            Self::Record(b) => write!(f, "[{}]", b.type_name()),
        }
    }
}

/// A dynamic record object with named, insertion-ordered properties.
///
/// The engine never reflects over host types. Applications either consume
/// `Bean` values directly or adapt them through a
/// [`PropertyAccessor`](crate::accessor::PropertyAccessor) registered on the
/// layout.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bean {
    type_name: String,
    properties: IndexMap<String, Value>,
}

impl Bean {
    /// Create an empty record object of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: IndexMap::new(),
        }
    }

    /// The record class name this object was bound to.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Get a property value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Set a property value, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    /// Remove a property value by name.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.properties.shift_remove(name)
    }

    /// Iterate properties in insertion order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties set on the object.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if no properties are set.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Builder-style property assignment.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }
}
