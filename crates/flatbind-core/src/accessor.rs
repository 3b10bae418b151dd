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

//! The property-access seam between the parser tree and record objects.

use crate::value::{Bean, Value};

/// Reads and writes a single property of a record object.
///
/// The engine never introspects host types. Every field and nested segment
/// goes through an accessor; the default [`NamedAccessor`] targets the
/// dynamic [`Bean`] property map, and hosts may register their own
/// implementations on a field layout to adapt richer object models.
///
/// Implementations must be stateless with respect to streams: one accessor
/// instance is shared by every record the stream processes.
pub trait PropertyAccessor: Send + Sync {
    /// Whether a marshalled value belongs to this property. Used on the
    /// write side to dispatch a bean to the first accepting record.
    fn defines(&self, value: &Value) -> bool;

    /// Read the property from a record object.
    fn get(&self, bean: &Bean) -> Option<Value>;

    /// Write the property into a record object.
    fn set(&self, bean: &mut Bean, value: Value);
}

/// Accessor for a named property of a dynamic [`Bean`].
#[derive(Debug, Clone)]
pub struct NamedAccessor {
    getter: String,
    setter: String,
}

impl NamedAccessor {
    /// Accessor reading and writing the same property name.
    pub fn new(property: impl Into<String>) -> Self {
        let property = property.into();
        Self {
            getter: property.clone(),
            setter: property,
        }
    }

    /// Accessor with distinct read and write property names.
    pub fn with_names(getter: impl Into<String>, setter: impl Into<String>) -> Self {
        Self {
            getter: getter.into(),
            setter: setter.into(),
        }
    }
}

impl PropertyAccessor for NamedAccessor {
    fn defines(&self, _value: &Value) -> bool {
        true
    }

    fn get(&self, bean: &Bean) -> Option<Value> {
        bean.get(&self.getter).cloned()
    }

    fn set(&self, bean: &mut Bean, value: Value) {
        bean.set(self.setter.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_accessor_round_trip() {
        let accessor = NamedAccessor::new("age");
        let mut bean = Bean::new("Person");
        accessor.set(&mut bean, Value::Int(30));
        assert_eq!(accessor.get(&bean), Some(Value::Int(30)));
    }

    #[test]
    fn test_named_accessor_missing_property() {
        let accessor = NamedAccessor::new("age");
        let bean = Bean::new("Person");
        assert_eq!(accessor.get(&bean), None);
    }

    #[test]
    fn test_named_accessor_split_names() {
        let accessor = NamedAccessor::with_names("read_name", "write_name");
        let mut bean = Bean::new("Person");
        accessor.set(&mut bean, Value::Bool(true));
        assert_eq!(bean.get("write_name"), Some(&Value::Bool(true)));
        assert_eq!(accessor.get(&bean), None);
    }

    #[test]
    fn test_named_accessor_defines_everything() {
        let accessor = NamedAccessor::new("x");
        assert!(accessor.defines(&Value::Null));
        assert!(accessor.defines(&Value::Int(1)));
    }
}
