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

//! Type handler registry with name, (type, format), and type resolution.

use super::handlers::{
    BoolHandler, CharHandler, DateHandler, DateTimeHandler, DecimalHandler, FloatHandler,
    IntHandler, StringHandler, TimeHandler, UIntHandler, UuidHandler,
};
use super::{TypeHandler, ValueType};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Registry of type handlers.
///
/// Resolution order for a field: explicit handler name, `(type, format)`
/// pair, type alone, then the type's widening chain. A per-stream registry
/// chains to the frozen global registry through its parent link; lookups
/// fall through to the parent when the local registry has no entry.
#[derive(Default)]
pub struct TypeRegistry {
    by_name: HashMap<String, Arc<dyn TypeHandler>>,
    by_type_format: HashMap<(ValueType, String), Arc<dyn TypeHandler>>,
    by_type: HashMap<ValueType, Arc<dyn TypeHandler>>,
    parent: Option<Arc<TypeRegistry>>,
}

impl TypeRegistry {
    /// An empty registry with no built-ins.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry pre-populated with every built-in handler.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.install(Arc::new(BoolHandler));
        for width in [ValueType::I8, ValueType::I16, ValueType::I32, ValueType::I64] {
            registry.install(Arc::new(IntHandler::new(width)));
        }
        for width in [ValueType::U8, ValueType::U16, ValueType::U32, ValueType::U64] {
            registry.install(Arc::new(UIntHandler::new(width)));
        }
        registry.install(Arc::new(FloatHandler::new(ValueType::F32)));
        registry.install(Arc::new(FloatHandler::new(ValueType::F64)));
        registry.install(Arc::new(DecimalHandler::new()));
        registry.install(Arc::new(CharHandler));
        registry.install(Arc::new(StringHandler));
        registry.install(Arc::new(DateHandler::new()));
        registry.install(Arc::new(TimeHandler::new()));
        registry.install(Arc::new(DateTimeHandler::new()));
        registry.install(Arc::new(UuidHandler));
        registry
    }

    /// The process-wide registry of built-ins, constructed once and frozen.
    pub fn global() -> Arc<TypeRegistry> {
        static GLOBAL: OnceLock<Arc<TypeRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Self::builtin())).clone()
    }

    /// An empty per-stream registry chained to a parent.
    pub fn chained(parent: Arc<TypeRegistry>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    /// Register a handler under its target type and canonical type name.
    pub fn install(&mut self, handler: Arc<dyn TypeHandler>) {
        let ty = handler.target();
        self.by_name.insert(ty.name().to_string(), handler.clone());
        self.by_type.insert(ty, handler);
    }

    /// Register a handler under an explicit name only.
    pub fn register_named(&mut self, name: impl Into<String>, handler: Arc<dyn TypeHandler>) {
        self.by_name.insert(name.into(), handler);
    }

    /// Register a handler for a specific (type, format) pair.
    pub fn register_for_format(
        &mut self,
        ty: ValueType,
        format: impl Into<String>,
        handler: Arc<dyn TypeHandler>,
    ) {
        self.by_type_format.insert((ty, format.into()), handler);
    }

    /// Look up a handler by explicit name.
    pub fn by_name(&self, name: &str) -> Option<Arc<dyn TypeHandler>> {
        self.by_name
            .get(name)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|p| p.by_name(name)))
    }

    fn by_type(&self, ty: ValueType) -> Option<Arc<dyn TypeHandler>> {
        self.by_type
            .get(&ty)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|p| p.by_type(ty)))
    }

    fn by_type_format(&self, ty: ValueType, format: &str) -> Option<Arc<dyn TypeHandler>> {
        self.by_type_format
            .get(&(ty, format.to_string()))
            .cloned()
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|p| p.by_type_format(ty, format))
            })
    }

    /// Resolve the handler for a field's declared type and optional format.
    pub fn resolve(&self, ty: ValueType, format: Option<&str>) -> Option<Arc<dyn TypeHandler>> {
        if let Some(pattern) = format {
            if let Some(handler) = self.by_type_format(ty, pattern) {
                return Some(handler);
            }
            // Derive a pattern-bound instance from the plain type handler.
            if let Some(configured) = self
                .by_type(ty)
                .and_then(|base| base.with_pattern(pattern))
            {
                return Some(configured);
            }
        }
        if let Some(handler) = self.by_type(ty) {
            return Some(handler);
        }
        ty.widened().and_then(|wider| self.resolve(wider, format))
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("names", &self.by_name.len())
            .field("types", &self.by_type.len())
            .field("chained", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_builtin_covers_all_names() {
        let registry = TypeRegistry::builtin();
        for name in [
            "bool", "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f32", "f64",
            "decimal", "char", "string", "date", "time", "datetime", "uuid",
        ] {
            assert!(registry.by_name(name).is_some(), "missing handler: {}", name);
        }
    }

    #[test]
    fn test_resolve_by_type() {
        let registry = TypeRegistry::builtin();
        let handler = registry.resolve(ValueType::I32, None).unwrap();
        assert_eq!(handler.parse("41").unwrap(), Value::Int(41));
    }

    #[test]
    fn test_resolve_derives_pattern_instance() {
        let registry = TypeRegistry::builtin();
        let handler = registry.resolve(ValueType::Date, Some("%Y%m%d")).unwrap();
        assert!(handler.parse("20240309").is_ok());
    }

    #[test]
    fn test_resolve_prefers_registered_type_format() {
        let mut registry = TypeRegistry::builtin();
        registry.register_for_format(
            ValueType::Decimal,
            "0.0",
            Arc::new(super::super::DecimalHandler::with_scale_pattern("0.0").unwrap()),
        );
        let handler = registry.resolve(ValueType::Decimal, Some("0.0")).unwrap();
        assert_eq!(handler.format(&Value::Float(2.25)).unwrap(), "2.2");
    }

    #[test]
    fn test_widening_resolution() {
        let mut registry = TypeRegistry::empty();
        registry.install(Arc::new(super::super::IntHandler::new(ValueType::I64)));
        // No i8 handler registered; resolution widens up the chain.
        let handler = registry.resolve(ValueType::I8, None).unwrap();
        assert_eq!(handler.target(), ValueType::I64);
    }

    #[test]
    fn test_chained_lookup_falls_through() {
        let global = TypeRegistry::global();
        let local = TypeRegistry::chained(global);
        assert!(local.by_name("string").is_some());
        assert!(local.resolve(ValueType::Bool, None).is_some());
    }

    #[test]
    fn test_chained_override_wins() {
        let global = TypeRegistry::global();
        let mut local = TypeRegistry::chained(global);
        local.register_named(
            "bool",
            Arc::new(super::super::StringHandler) as Arc<dyn TypeHandler>,
        );
        let handler = local.by_name("bool").unwrap();
        assert_eq!(handler.target(), ValueType::String);
    }

    #[test]
    fn test_global_is_shared() {
        let a = TypeRegistry::global();
        let b = TypeRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_unresolvable_type() {
        let registry = TypeRegistry::empty();
        assert!(registry.resolve(ValueType::Uuid, None).is_none());
    }
}
