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

//! The immutable mapping model a stream is compiled from.
//!
//! A [`StreamLayout`] describes one configured stream: its format, access
//! mode, and the group/record/segment/field tree. Layouts are plain data
//! with builder-style construction; compiling one into a runtime parser
//! tree (and validating it) happens in [`crate::tree`].

mod import;

pub use import::{LoadedMapping, Mapping, MappingLoader, MappingResolver};

use crate::accessor::PropertyAccessor;
use crate::types::ValueType;
use std::fmt;
use std::sync::Arc;

/// Physical framing of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// Token-delimited records.
    Delimited,
    /// Fixed character positions.
    Fixed,
    /// Delimited profile with quote handling on by default.
    Csv,
    /// One element subtree per record.
    Xml,
}

impl StreamFormat {
    /// Whether field positions index a token list rather than characters.
    pub fn is_delimited(self) -> bool {
        matches!(self, Self::Delimited | Self::Csv)
    }
}

/// Which half of the engine a stream may exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    Read,
    Write,
    #[default]
    ReadWrite,
}

impl AccessMode {
    pub fn can_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// Field justification within its padded length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Left,
    Right,
}

/// How an XML-bound field is carried on its record element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlType {
    /// Text content of a child element with the field's name.
    #[default]
    Element,
    /// Attribute on the record element.
    Attribute,
    /// Text content of the record element itself.
    Text,
}

/// Occurrence bounds. `max` of `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    pub min: usize,
    pub max: Option<usize>,
}

impl Occurs {
    pub const ONCE: Occurs = Occurs {
        min: 1,
        max: Some(1),
    };

    pub fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }

    pub fn unbounded(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Whether these bounds describe a repeating component.
    pub fn repeats(&self) -> bool {
        self.max != Some(1)
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::ONCE
    }
}

/// Tokenization options for delimited and CSV streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedOptions {
    /// Field delimiter character.
    pub delimiter: char,
    /// Quote character enabling quoted-token mode.
    pub quote: Option<char>,
    /// Escape character within tokens.
    pub escape: Option<char>,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: None,
            escape: None,
        }
    }
}

/// XML naming options for a stream's document element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlStreamOptions {
    /// Document element name; defaults to the stream name.
    pub xml_name: Option<String>,
    /// Namespace URI for the document element.
    pub xml_namespace: Option<String>,
    /// Namespace prefix for the document element.
    pub xml_prefix: Option<String>,
}

/// A configured stream definition: the root of the mapping model.
#[derive(Debug, Clone)]
pub struct StreamLayout {
    pub name: String,
    pub format: StreamFormat,
    pub mode: AccessMode,
    /// Whether the root group enforces child ordering.
    pub ordered: bool,
    /// Occurrence bounds of the root group.
    pub occurs: Occurs,
    pub delimited: DelimitedOptions,
    pub xml: XmlStreamOptions,
    /// Children of the implicit root group.
    pub nodes: Vec<NodeLayout>,
}

impl StreamLayout {
    pub fn new(name: impl Into<String>, format: StreamFormat) -> Self {
        let delimited = match format {
            StreamFormat::Csv => DelimitedOptions {
                quote: Some('"'),
                ..Default::default()
            },
            _ => DelimitedOptions::default(),
        };
        Self {
            name: name.into(),
            format,
            mode: AccessMode::ReadWrite,
            ordered: true,
            occurs: Occurs::new(0, Some(1)),
            delimited,
            xml: XmlStreamOptions::default(),
            nodes: Vec::new(),
        }
    }

    pub fn mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn unordered(mut self) -> Self {
        self.ordered = false;
        self
    }

    pub fn occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimited.delimiter = delimiter;
        self
    }

    pub fn record(mut self, record: RecordLayout) -> Self {
        self.nodes.push(NodeLayout::Record(record));
        self
    }

    pub fn group(mut self, group: GroupLayout) -> Self {
        self.nodes.push(NodeLayout::Group(group));
        self
    }
}

/// A selector child: sub-group or record.
#[derive(Debug, Clone)]
pub enum NodeLayout {
    Group(GroupLayout),
    Record(RecordLayout),
}

impl NodeLayout {
    pub fn name(&self) -> &str {
        match self {
            Self::Group(g) => &g.name,
            Self::Record(r) => &r.name,
        }
    }

    pub(crate) fn order(&self) -> Option<usize> {
        match self {
            Self::Group(g) => g.order,
            Self::Record(r) => r.order,
        }
    }
}

/// An ordered or unordered container of records and sub-groups.
#[derive(Debug, Clone)]
pub struct GroupLayout {
    pub name: String,
    /// Sequence rank among siblings; assigned from declaration order when
    /// absent.
    pub order: Option<usize>,
    pub occurs: Occurs,
    pub ordered: bool,
    pub children: Vec<NodeLayout>,
}

impl GroupLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: None,
            occurs: Occurs::ONCE,
            ordered: true,
            children: Vec::new(),
        }
    }

    pub fn order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    pub fn occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    pub fn unordered(mut self) -> Self {
        self.ordered = false;
        self
    }

    pub fn record(mut self, record: RecordLayout) -> Self {
        self.children.push(NodeLayout::Record(record));
        self
    }

    pub fn group(mut self, group: GroupLayout) -> Self {
        self.children.push(NodeLayout::Group(group));
        self
    }
}

/// A single physical record definition.
#[derive(Debug, Clone)]
pub struct RecordLayout {
    pub name: String,
    pub order: Option<usize>,
    pub occurs: Occurs,
    /// Raw record length bounds: token count for delimited streams,
    /// character count for fixed-length streams.
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Record class bound on unmarshal and matched on marshal.
    pub class: Option<String>,
    /// Element name for XML streams; defaults to the record name.
    pub xml_name: Option<String>,
    pub children: Vec<ContentLayout>,
}

impl RecordLayout {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            class: Some(name.clone()),
            name,
            order: None,
            occurs: Occurs::unbounded(0),
            min_length: None,
            max_length: None,
            xml_name: None,
            children: Vec::new(),
        }
    }

    pub fn order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    pub fn occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn length_range(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn xml_name(mut self, name: impl Into<String>) -> Self {
        self.xml_name = Some(name.into());
        self
    }

    pub fn field(mut self, field: FieldLayout) -> Self {
        self.children.push(ContentLayout::Field(field));
        self
    }

    pub fn segment(mut self, segment: SegmentLayout) -> Self {
        self.children.push(ContentLayout::Segment(segment));
        self
    }

    pub fn property(mut self, property: PropertyLayout) -> Self {
        self.children.push(ContentLayout::Property(property));
        self
    }
}

/// Content of a record or segment.
#[derive(Debug, Clone)]
pub enum ContentLayout {
    Field(FieldLayout),
    Segment(SegmentLayout),
    Property(PropertyLayout),
}

/// A logical grouping of fields and nested beans inside a record.
#[derive(Debug, Clone)]
pub struct SegmentLayout {
    pub name: String,
    /// Class of the nested record object; defaults to the segment name.
    pub class: Option<String>,
    pub occurs: Occurs,
    /// Element name for XML streams; defaults to the segment name.
    pub xml_name: Option<String>,
    pub nillable: bool,
    pub children: Vec<ContentLayout>,
}

impl SegmentLayout {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            class: Some(name.clone()),
            name,
            occurs: Occurs::ONCE,
            xml_name: None,
            nillable: false,
            children: Vec::new(),
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    pub fn field(mut self, field: FieldLayout) -> Self {
        self.children.push(ContentLayout::Field(field));
        self
    }

    pub fn segment(mut self, segment: SegmentLayout) -> Self {
        self.children.push(ContentLayout::Segment(segment));
        self
    }

    pub fn property(mut self, property: PropertyLayout) -> Self {
        self.children.push(ContentLayout::Property(property));
        self
    }
}

/// A primitive value bound to a record property.
#[derive(Clone)]
pub struct FieldLayout {
    pub name: String,
    /// Token index (delimited) or character offset (fixed). Assigned from
    /// declaration order when absent.
    pub position: Option<usize>,
    /// Padded length for fixed-length streams.
    pub length: Option<usize>,
    pub padding: char,
    pub justify: Justify,
    pub ty: Option<ValueType>,
    /// Explicit handler name, resolved ahead of the type.
    pub type_handler: Option<String>,
    /// Pattern handed to the type handler (date/decimal patterns).
    pub format: Option<String>,
    pub literal: Option<String>,
    pub regex: Option<String>,
    pub default_value: Option<String>,
    pub required: bool,
    pub trim: bool,
    pub nillable: bool,
    /// Participates in record-type discrimination.
    pub record_identifier: bool,
    /// Parsed and validated but never bound to a property.
    pub ignore: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub occurs: Occurs,
    /// Allow marshalled text longer than `length` to be cut down.
    pub truncate: bool,
    pub xml_type: XmlType,
    /// Custom property accessor; defaults to a named accessor on the
    /// dynamic bean.
    pub accessor: Option<Arc<dyn PropertyAccessor>>,
}

impl FieldLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
            length: None,
            padding: ' ',
            justify: Justify::Left,
            ty: None,
            type_handler: None,
            format: None,
            literal: None,
            regex: None,
            default_value: None,
            required: false,
            trim: false,
            nillable: false,
            record_identifier: false,
            ignore: false,
            min_length: None,
            max_length: None,
            occurs: Occurs::ONCE,
            truncate: false,
            xml_type: XmlType::Element,
            accessor: None,
        }
    }

    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn padding(mut self, padding: char) -> Self {
        self.padding = padding;
        self
    }

    pub fn justify(mut self, justify: Justify) -> Self {
        self.justify = justify;
        self
    }

    pub fn typed(mut self, ty: ValueType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn handler(mut self, name: impl Into<String>) -> Self {
        self.type_handler = Some(name.into());
        self
    }

    pub fn format(mut self, pattern: impl Into<String>) -> Self {
        self.format = Some(pattern.into());
        self
    }

    pub fn literal(mut self, literal: impl Into<String>) -> Self {
        self.literal = Some(literal.into());
        self
    }

    pub fn regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn nillable(mut self) -> Self {
        self.nillable = true;
        self
    }

    /// Mark the field as a record identifier.
    pub fn rid(mut self) -> Self {
        self.record_identifier = true;
        self
    }

    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    pub fn truncate(mut self) -> Self {
        self.truncate = true;
        self
    }

    pub fn xml_type(mut self, xml_type: XmlType) -> Self {
        self.xml_type = xml_type;
        self
    }

    pub fn accessor(mut self, accessor: Arc<dyn PropertyAccessor>) -> Self {
        self.accessor = Some(accessor);
        self
    }
}

impl fmt::Debug for FieldLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldLayout")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("length", &self.length)
            .field("ty", &self.ty)
            .field("literal", &self.literal)
            .field("required", &self.required)
            .field("rid", &self.record_identifier)
            .finish_non_exhaustive()
    }
}

/// A constant record property that never touches the stream.
#[derive(Debug, Clone)]
pub struct PropertyLayout {
    pub name: String,
    pub value: String,
    pub ty: Option<ValueType>,
}

impl PropertyLayout {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ty: None,
        }
    }

    pub fn typed(mut self, ty: ValueType) -> Self {
        self.ty = Some(ty);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== AccessMode tests ====================

    #[test]
    fn test_access_mode_read() {
        assert!(AccessMode::Read.can_read());
        assert!(!AccessMode::Read.can_write());
    }

    #[test]
    fn test_access_mode_write() {
        assert!(!AccessMode::Write.can_read());
        assert!(AccessMode::Write.can_write());
    }

    #[test]
    fn test_access_mode_readwrite_default() {
        assert_eq!(AccessMode::default(), AccessMode::ReadWrite);
        assert!(AccessMode::ReadWrite.can_read());
        assert!(AccessMode::ReadWrite.can_write());
    }

    // ==================== Occurs tests ====================

    #[test]
    fn test_occurs_once() {
        let o = Occurs::ONCE;
        assert_eq!(o.min, 1);
        assert_eq!(o.max, Some(1));
        assert!(!o.repeats());
    }

    #[test]
    fn test_occurs_unbounded_repeats() {
        let o = Occurs::unbounded(0);
        assert!(o.repeats());
        assert_eq!(o.max, None);
    }

    #[test]
    fn test_occurs_bounded_repeats() {
        assert!(Occurs::new(1, Some(3)).repeats());
    }

    // ==================== StreamLayout tests ====================

    #[test]
    fn test_stream_layout_defaults() {
        let layout = StreamLayout::new("orders", StreamFormat::Delimited);
        assert_eq!(layout.name, "orders");
        assert!(layout.ordered);
        assert_eq!(layout.mode, AccessMode::ReadWrite);
        assert_eq!(layout.delimited.delimiter, ',');
        assert_eq!(layout.delimited.quote, None);
    }

    #[test]
    fn test_csv_profile_enables_quoting() {
        let layout = StreamLayout::new("orders", StreamFormat::Csv);
        assert_eq!(layout.delimited.quote, Some('"'));
        assert!(layout.format.is_delimited());
    }

    #[test]
    fn test_stream_builder_chain() {
        let layout = StreamLayout::new("s", StreamFormat::Fixed)
            .mode(AccessMode::Read)
            .unordered()
            .record(RecordLayout::new("r"));
        assert_eq!(layout.mode, AccessMode::Read);
        assert!(!layout.ordered);
        assert_eq!(layout.nodes.len(), 1);
        assert_eq!(layout.nodes[0].name(), "r");
    }

    // ==================== Record and field builder tests ====================

    #[test]
    fn test_record_defaults() {
        let record = RecordLayout::new("header");
        assert_eq!(record.class.as_deref(), Some("header"));
        assert_eq!(record.occurs, Occurs::unbounded(0));
        assert!(record.children.is_empty());
    }

    #[test]
    fn test_field_builder() {
        let field = FieldLayout::new("amount")
            .at(2)
            .length(9)
            .padding('0')
            .justify(Justify::Right)
            .typed(ValueType::I64)
            .required()
            .trim();
        assert_eq!(field.position, Some(2));
        assert_eq!(field.length, Some(9));
        assert_eq!(field.padding, '0');
        assert_eq!(field.justify, Justify::Right);
        assert!(field.required && field.trim);
    }

    #[test]
    fn test_rid_field() {
        let field = FieldLayout::new("type").rid().literal("H");
        assert!(field.record_identifier);
        assert_eq!(field.literal.as_deref(), Some("H"));
    }

    #[test]
    fn test_segment_defaults_class_to_name() {
        let segment = SegmentLayout::new("address");
        assert_eq!(segment.class.as_deref(), Some("address"));
        assert_eq!(segment.occurs, Occurs::ONCE);
    }

    #[test]
    fn test_property_layout() {
        let p = PropertyLayout::new("kind", "detail").typed(ValueType::String);
        assert_eq!(p.name, "kind");
        assert_eq!(p.value, "detail");
        assert_eq!(p.ty, Some(ValueType::String));
    }
}
