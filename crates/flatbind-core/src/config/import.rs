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

//! Mapping resource resolution with import cycle detection.

use super::StreamLayout;
use crate::error::{BindError, BindResult};
use crate::types::TypeHandler;
use std::sync::Arc;
use tracing::debug;

/// One mapping resource: stream layouts, named handlers, and imports of
/// further resources.
#[derive(Default)]
pub struct Mapping {
    /// Resources this mapping imports, scheme-prefixed
    /// (`classpath:` or `file:`).
    pub imports: Vec<String>,
    pub streams: Vec<StreamLayout>,
    pub type_handlers: Vec<(String, Arc<dyn TypeHandler>)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn import(mut self, resource: impl Into<String>) -> Self {
        self.imports.push(resource.into());
        self
    }

    pub fn stream(mut self, stream: StreamLayout) -> Self {
        self.streams.push(stream);
        self
    }

    pub fn type_handler(
        mut self,
        name: impl Into<String>,
        handler: Arc<dyn TypeHandler>,
    ) -> Self {
        self.type_handlers.push((name.into(), handler));
        self
    }
}

/// Resolves a mapping resource name to its mapping.
///
/// The engine does not touch the filesystem itself; hosts supply the
/// resolver and choose what `classpath:` and `file:` mean for them.
pub trait MappingResolver {
    fn resolve(&self, resource: &str) -> BindResult<Mapping>;
}

impl<F> MappingResolver for F
where
    F: Fn(&str) -> BindResult<Mapping>,
{
    fn resolve(&self, resource: &str) -> BindResult<Mapping> {
        self(resource)
    }
}

/// The flattened result of loading a mapping and all of its imports.
#[derive(Default)]
pub struct LoadedMapping {
    pub streams: Vec<StreamLayout>,
    pub type_handlers: Vec<(String, Arc<dyn TypeHandler>)>,
}

impl std::fmt::Debug for LoadedMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedMapping")
            .field("streams", &self.streams)
            .finish_non_exhaustive()
    }
}

impl LoadedMapping {
    /// Find a loaded stream layout by name.
    pub fn stream(&self, name: &str) -> Option<&StreamLayout> {
        self.streams.iter().find(|s| s.name == name)
    }
}

/// Loads mapping resources depth-first, tracking the import stack.
pub struct MappingLoader<R: MappingResolver> {
    resolver: R,
}

impl<R: MappingResolver> MappingLoader<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Load a root resource and everything it imports.
    ///
    /// Imports resolve before the importing resource's own definitions, so
    /// later definitions shadow earlier ones by position. A resource seen
    /// twice on the active import stack fails with a circular-import error;
    /// a resource imported twice along different branches loads once.
    pub fn load(&self, resource: &str) -> BindResult<LoadedMapping> {
        let mut loaded = LoadedMapping::default();
        let mut stack = Vec::new();
        let mut seen = Vec::new();
        self.load_into(resource, &mut stack, &mut seen, &mut loaded)?;
        Ok(loaded)
    }

    fn load_into(
        &self,
        resource: &str,
        stack: &mut Vec<String>,
        seen: &mut Vec<String>,
        loaded: &mut LoadedMapping,
    ) -> BindResult<()> {
        validate_scheme(resource)?;

        if stack.iter().any(|r| r == resource) {
            let mut cycle = stack.clone();
            cycle.push(resource.to_string());
            return Err(BindError::circular_import(format!(
                "circular import of '{}' (import stack: {})",
                resource,
                cycle.join(" -> ")
            )));
        }
        if seen.iter().any(|r| r == resource) {
            return Ok(());
        }

        debug!(resource, depth = stack.len(), "resolving mapping resource");
        let mapping = self.resolver.resolve(resource)?;

        stack.push(resource.to_string());
        for import in &mapping.imports {
            self.load_into(import, stack, seen, loaded)?;
        }
        stack.pop();
        seen.push(resource.to_string());

        loaded.streams.extend(mapping.streams);
        loaded.type_handlers.extend(mapping.type_handlers);
        Ok(())
    }
}

fn validate_scheme(resource: &str) -> BindResult<()> {
    if resource.starts_with("classpath:") || resource.starts_with("file:") {
        Ok(())
    } else {
        Err(BindError::configuration(format!(
            "import '{}' is missing a scheme prefix ('classpath:' or 'file:')",
            resource
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StreamFormat, StreamLayout};
    use crate::error::BindErrorKind;
    use std::collections::HashMap;

    struct MapResolver(HashMap<&'static str, Vec<&'static str>>);

    impl MappingResolver for MapResolver {
        fn resolve(&self, resource: &str) -> BindResult<Mapping> {
            let imports = self
                .0
                .get(resource)
                .ok_or_else(|| BindError::configuration(format!("unresolved '{}'", resource)))?;
            let mut mapping = Mapping::new()
                .stream(StreamLayout::new(resource.to_string(), StreamFormat::Fixed));
            for import in imports {
                mapping = mapping.import(*import);
            }
            Ok(mapping)
        }
    }

    #[test]
    fn test_load_single_resource() {
        let resolver = MapResolver(HashMap::from([("classpath:root", vec![])]));
        let loaded = MappingLoader::new(resolver).load("classpath:root").unwrap();
        assert_eq!(loaded.streams.len(), 1);
        assert!(loaded.stream("classpath:root").is_some());
    }

    #[test]
    fn test_imports_load_before_importer() {
        let resolver = MapResolver(HashMap::from([
            ("classpath:root", vec!["classpath:base"]),
            ("classpath:base", vec![]),
        ]));
        let loaded = MappingLoader::new(resolver).load("classpath:root").unwrap();
        let names: Vec<_> = loaded.streams.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["classpath:base", "classpath:root"]);
    }

    #[test]
    fn test_diamond_import_loads_once() {
        let resolver = MapResolver(HashMap::from([
            ("classpath:root", vec!["classpath:a", "classpath:b"]),
            ("classpath:a", vec!["classpath:shared"]),
            ("classpath:b", vec!["classpath:shared"]),
            ("classpath:shared", vec![]),
        ]));
        let loaded = MappingLoader::new(resolver).load("classpath:root").unwrap();
        let shared = loaded
            .streams
            .iter()
            .filter(|s| s.name == "classpath:shared")
            .count();
        assert_eq!(shared, 1);
        assert_eq!(loaded.streams.len(), 4);
    }

    #[test]
    fn test_direct_cycle_detected() {
        let resolver = MapResolver(HashMap::from([
            ("classpath:a", vec!["classpath:b"]),
            ("classpath:b", vec!["classpath:a"]),
        ]));
        let err = MappingLoader::new(resolver)
            .load("classpath:a")
            .unwrap_err();
        assert_eq!(err.kind, BindErrorKind::CircularImport);
        assert!(err.message.contains("classpath:a -> classpath:b -> classpath:a"));
    }

    #[test]
    fn test_self_cycle_detected() {
        let resolver = MapResolver(HashMap::from([("classpath:a", vec!["classpath:a"])]));
        let err = MappingLoader::new(resolver)
            .load("classpath:a")
            .unwrap_err();
        assert_eq!(err.kind, BindErrorKind::CircularImport);
    }

    #[test]
    fn test_deep_cycle_detected_without_overflow() {
        // A long chain that loops back to its head.
        let mut map: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
        let names: Vec<&'static str> = (0..200)
            .map(|i| Box::leak(format!("classpath:m{}", i).into_boxed_str()) as &'static str)
            .collect();
        for i in 0..names.len() {
            let next = names[(i + 1) % names.len()];
            map.insert(names[i], vec![next]);
        }
        let err = MappingLoader::new(MapResolver(map))
            .load(names[0])
            .unwrap_err();
        assert_eq!(err.kind, BindErrorKind::CircularImport);
    }

    #[test]
    fn test_missing_scheme_is_fatal() {
        let resolver = MapResolver(HashMap::from([("mapping", vec![])]));
        let err = MappingLoader::new(resolver).load("mapping").unwrap_err();
        assert_eq!(err.kind, BindErrorKind::Configuration);
        assert!(err.message.contains("scheme"));
    }

    #[test]
    fn test_unresolved_import_is_fatal() {
        let resolver = MapResolver(HashMap::from([(
            "classpath:root",
            vec!["classpath:missing"],
        )]));
        let err = MappingLoader::new(resolver)
            .load("classpath:root")
            .unwrap_err();
        assert_eq!(err.kind, BindErrorKind::Configuration);
    }

    #[test]
    fn test_closure_resolver() {
        let loader = MappingLoader::new(|resource: &str| {
            Ok(Mapping::new().stream(StreamLayout::new(resource.to_string(), StreamFormat::Xml)))
        });
        let loaded = loader.load("file:only").unwrap();
        assert_eq!(loaded.streams.len(), 1);
    }
}
