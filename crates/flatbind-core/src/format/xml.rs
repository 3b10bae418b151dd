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

//! The element-tree view of one XML record.
//!
//! Record readers materialize one subtree per record; the binding layer
//! addresses attributes and child elements by name, with no ordering
//! requirement among children.

use indexmap::IndexMap;

/// The standard nil attribute carried by nillable elements.
pub const NIL_ATTRIBUTE: &str = "xsi:nil";

/// One XML element with attributes, text content, and child elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute assignment.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder-style text content assignment.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder-style child element append.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Get an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First child element with the given name, in any position.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// The `index`-th child element with the given name.
    pub fn child_at(&self, name: &str, index: usize) -> Option<&XmlElement> {
        self.children.iter().filter(|c| c.name == name).nth(index)
    }

    /// Number of child elements with the given name.
    pub fn child_count(&self, name: &str) -> usize {
        self.children.iter().filter(|c| c.name == name).count()
    }

    /// Whether the element carries the standard nil attribute.
    pub fn is_nil(&self) -> bool {
        matches!(self.attribute(NIL_ATTRIBUTE), Some("true") | Some("1"))
    }

    /// Mark the element nil.
    pub fn set_nil(&mut self) {
        self.attributes
            .insert(NIL_ATTRIBUTE.to_string(), "true".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_builders() {
        let elem = XmlElement::new("person")
            .with_attribute("id", "7")
            .with_text("x")
            .with_child(XmlElement::new("name"));
        assert_eq!(elem.name, "person");
        assert_eq!(elem.attribute("id"), Some("7"));
        assert_eq!(elem.text, "x");
        assert_eq!(elem.children.len(), 1);
    }

    #[test]
    fn test_child_lookup_ignores_position() {
        let elem = XmlElement::new("r")
            .with_child(XmlElement::new("c").with_text("1"))
            .with_child(XmlElement::new("a").with_text("2"))
            .with_child(XmlElement::new("b").with_text("3"));
        assert_eq!(elem.child("a").unwrap().text, "2");
        assert_eq!(elem.child("b").unwrap().text, "3");
        assert_eq!(elem.child("missing"), None);
    }

    #[test]
    fn test_repeated_children() {
        let elem = XmlElement::new("r")
            .with_child(XmlElement::new("item").with_text("first"))
            .with_child(XmlElement::new("other"))
            .with_child(XmlElement::new("item").with_text("second"));
        assert_eq!(elem.child_count("item"), 2);
        assert_eq!(elem.child_at("item", 1).unwrap().text, "second");
        assert_eq!(elem.child_at("item", 2), None);
    }

    #[test]
    fn test_nil_attribute() {
        let mut elem = XmlElement::new("x");
        assert!(!elem.is_nil());
        elem.set_nil();
        assert!(elem.is_nil());
        assert_eq!(elem.attribute(NIL_ATTRIBUTE), Some("true"));
    }

    #[test]
    fn test_nil_accepts_one() {
        let elem = XmlElement::new("x").with_attribute(NIL_ATTRIBUTE, "1");
        assert!(elem.is_nil());
        let elem = XmlElement::new("x").with_attribute(NIL_ATTRIBUTE, "false");
        assert!(!elem.is_nil());
    }
}
