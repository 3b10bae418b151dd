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

//! Compiled record content: segments, fields, and constant properties.
//!
//! Content nodes are built once from the layout and reused across records.
//! The unmarshal pipeline accumulates field errors on the context and keeps
//! going, so one pass over a bad record yields the complete report.

use crate::accessor::{NamedAccessor, PropertyAccessor};
use crate::config::{
    ContentLayout, FieldLayout, Justify, Occurs, PropertyLayout, RecordLayout, SegmentLayout,
    StreamFormat, XmlType,
};
use crate::context::{MarshallingContext, UnmarshallingContext};
use crate::error::{BindError, BindErrorKind, BindResult, InvalidRecord};
use crate::format::{delimited, fixed, RawRecord, RecordFraming, XmlElement};
use crate::types::{TypeRegistry, ValueType};
use crate::value::{Bean, Value};
use regex::Regex;
use std::sync::Arc;

/// A borrow of the raw record the current component reads from. Nested XML
/// segments narrow the view to their carrier element.
#[derive(Clone, Copy)]
pub(crate) enum View<'a> {
    Delimited(&'a [String]),
    Fixed(&'a str),
    Xml(&'a XmlElement),
}

impl<'a> View<'a> {
    pub(crate) fn of(raw: &'a RawRecord) -> Self {
        match raw {
            RawRecord::Delimited(tokens) => Self::Delimited(tokens),
            RawRecord::Fixed(line) => Self::Fixed(line),
            RawRecord::Xml(element) => Self::Xml(element),
        }
    }
}

/// What a field found at its position in the raw record.
enum Extracted {
    /// The position does not exist in this record.
    Missing,
    /// An XML carrier element flagged with the standard nil attribute.
    Nil,
    Text(String),
}

/// A compiled field.
pub(crate) struct Field {
    pub name: String,
    pub position: usize,
    pub length: usize,
    pub padding: char,
    pub justify: Justify,
    literal: Option<String>,
    regex: Option<Regex>,
    default_value: Option<Value>,
    required: bool,
    trim: bool,
    nillable: bool,
    pub record_identifier: bool,
    ignore: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pub occurs: Occurs,
    truncate: bool,
    xml_type: XmlType,
    format: StreamFormat,
    handler: Arc<dyn crate::types::TypeHandler>,
    accessor: Arc<dyn PropertyAccessor>,
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

impl Field {
    fn compile(
        layout: &FieldLayout,
        format: StreamFormat,
        registry: &TypeRegistry,
        cursor: &mut usize,
    ) -> BindResult<Self> {
        let handler = match &layout.type_handler {
            Some(name) => registry.by_name(name).ok_or_else(|| {
                BindError::unknown_type_handler(format!(
                    "no type handler named '{}' for field '{}'",
                    name, layout.name
                ))
            })?,
            None => {
                let ty = layout.ty.unwrap_or(ValueType::String);
                registry
                    .resolve(ty, layout.format.as_deref())
                    .ok_or_else(|| {
                        BindError::unknown_type_handler(format!(
                            "no type handler for type '{}' on field '{}'",
                            ty, layout.name
                        ))
                    })?
            }
        };

        let position = match layout.position {
            Some(p) => {
                if p < *cursor {
                    return Err(BindError::configuration(format!(
                        "field '{}' at position {} overlaps the preceding field",
                        layout.name, p
                    )));
                }
                p
            }
            None => *cursor,
        };

        let length = match (format, layout.length) {
            (StreamFormat::Fixed, Some(len)) if len > 0 => len,
            (StreamFormat::Fixed, _) => {
                return Err(BindError::configuration(format!(
                    "fixed-length field '{}' requires a length",
                    layout.name
                )));
            }
            (_, len) => len.unwrap_or(0),
        };

        // Advance the position cursor past this field's span.
        let span = layout.occurs.max.unwrap_or(1).max(1);
        *cursor = match format {
            StreamFormat::Fixed => position + length * span,
            _ => position + span,
        };

        let regex = match &layout.regex {
            Some(pattern) => Some(
                Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                    BindError::configuration(format!(
                        "invalid regex on field '{}': {}",
                        layout.name, e
                    ))
                })?,
            ),
            None => None,
        };

        if layout.record_identifier && layout.literal.is_none() && regex.is_none() {
            return Err(BindError::configuration(format!(
                "record identifier field '{}' requires a literal or regex",
                layout.name
            )));
        }

        if layout.trim {
            if let Some(lit) = &layout.literal {
                if lit.trim() != lit {
                    return Err(BindError::configuration(format!(
                        "field '{}' trims input but its literal has surrounding whitespace",
                        layout.name
                    )));
                }
            }
        }

        let default_value = match &layout.default_value {
            Some(text) => Some(handler.parse(text).map_err(|e| {
                BindError::configuration(format!(
                    "default value for field '{}' does not parse: {}",
                    layout.name, e
                ))
            })?),
            None => None,
        };

        let accessor = layout
            .accessor
            .clone()
            .unwrap_or_else(|| Arc::new(NamedAccessor::new(layout.name.clone())));

        Ok(Self {
            name: layout.name.clone(),
            position,
            length,
            padding: layout.padding,
            justify: layout.justify,
            literal: layout.literal.clone(),
            regex,
            default_value,
            required: layout.required,
            trim: layout.trim,
            nillable: layout.nillable,
            record_identifier: layout.record_identifier,
            ignore: layout.ignore,
            min_length: layout.min_length,
            max_length: layout.max_length,
            occurs: layout.occurs,
            truncate: layout.truncate,
            xml_type: layout.xml_type,
            format,
            handler,
            accessor,
        })
    }

    fn extract(&self, view: View<'_>, index: usize) -> Extracted {
        match view {
            View::Delimited(tokens) => match delimited::token(tokens, self.position + index) {
                Some(text) => Extracted::Text(text.to_string()),
                None => Extracted::Missing,
            },
            View::Fixed(line) => {
                let start = self.position + index * self.length;
                if start >= fixed::char_len(line) {
                    Extracted::Missing
                } else {
                    Extracted::Text(fixed::extract(line, start, self.length))
                }
            }
            View::Xml(element) => match self.xml_type {
                XmlType::Attribute => match element.attribute(&self.name) {
                    Some(text) if index == 0 => Extracted::Text(text.to_string()),
                    _ => Extracted::Missing,
                },
                XmlType::Text => {
                    if index == 0 {
                        Extracted::Text(element.text.clone())
                    } else {
                        Extracted::Missing
                    }
                }
                XmlType::Element => match element.child_at(&self.name, index) {
                    Some(child) if child.is_nil() => Extracted::Nil,
                    Some(child) => Extracted::Text(child.text.clone()),
                    None => Extracted::Missing,
                },
            },
        }
    }

    /// Whether another occurrence exists at `index`, for repeating fields.
    fn present(&self, view: View<'_>, index: usize) -> bool {
        !matches!(self.extract(view, index), Extracted::Missing)
    }

    /// Normalize extracted text: strip fixed-length padding, then trim.
    fn normalize(&self, text: String) -> String {
        let text = if self.format == StreamFormat::Fixed && !text.is_empty() {
            fixed::unpad(&text, self.padding, self.justify)
        } else {
            text
        };
        if self.trim {
            text.trim_matches(|c: char| c.is_ascii_whitespace())
                .to_string()
        } else {
            text
        }
    }

    /// The full unmarshal pipeline for one occurrence. Returns the bound
    /// value, or `None` after recording a field error.
    fn unmarshal(&self, view: View<'_>, index: usize, ctx: &mut UnmarshallingContext) -> Option<Value> {
        let text = match self.extract(view, index) {
            Extracted::Missing => String::new(),
            Extracted::Nil => String::new(),
            Extracted::Text(text) => self.normalize(text),
        };

        if text.is_empty() {
            if self.nillable || !self.required {
                return Some(self.default_value.clone().unwrap_or(Value::Null));
            }
            ctx.add_field_error(&self.name, "required");
            return None;
        }

        if let Some(literal) = &self.literal {
            if text != *literal {
                ctx.add_field_error(&self.name, format!("expected literal '{}'", literal));
                return None;
            }
        }

        if let Some(regex) = &self.regex {
            if !regex.is_match(&text) {
                ctx.add_field_error(
                    &self.name,
                    format!("value does not match pattern '{}'", regex.as_str()),
                );
                return None;
            }
        }

        let text_len = text.chars().count();
        if let Some(min) = self.min_length {
            if text_len < min {
                ctx.add_field_error(&self.name, format!("minimum length is {}", min));
                return None;
            }
        }
        if let Some(max) = self.max_length {
            if text_len > max {
                ctx.add_field_error(&self.name, format!("maximum length is {}", max));
                return None;
            }
        }

        match self.handler.parse(&text) {
            Ok(value) => Some(value),
            Err(message) => {
                ctx.add_field_error(&self.name, format!("type conversion error: {}", message));
                None
            }
        }
    }

    /// Whether this record-identifier field accepts the raw record.
    fn identifies(&self, view: View<'_>) -> bool {
        let text = match self.extract(view, 0) {
            Extracted::Text(text) => self.normalize(text),
            _ => return false,
        };
        if let Some(literal) = &self.literal {
            return text == *literal;
        }
        if let Some(regex) = &self.regex {
            return regex.is_match(&text);
        }
        false
    }

    /// Marshal one occurrence. `item` overrides the accessor for collection
    /// elements.
    fn marshal(
        &self,
        bean: &Bean,
        item: Option<&Value>,
        index: usize,
        ctx: &mut MarshallingContext,
    ) -> BindResult<()> {
        let value = match item {
            Some(v) => v.clone(),
            None if self.ignore => Value::Null,
            None => self.accessor.get(bean).unwrap_or(Value::Null),
        };
        let value = if value.is_null() {
            self.default_value.clone().unwrap_or(Value::Null)
        } else {
            value
        };

        let text = if let Some(literal) = &self.literal {
            literal.clone()
        } else if value.is_null() {
            String::new()
        } else {
            self.handler
                .format(&value)
                .map_err(|message| self.marshal_error(message))?
        };

        match ctx.format() {
            StreamFormat::Delimited | StreamFormat::Csv => {
                ctx.set_token(self.position + index, text);
                Ok(())
            }
            StreamFormat::Fixed => {
                let padded = match fixed::pad(&text, self.length, self.padding, self.justify) {
                    Some(padded) => padded,
                    None if self.truncate => fixed::truncate(&text, self.length, self.justify),
                    None => {
                        return Err(self.marshal_error(format!(
                            "value '{}' exceeds the field length of {}",
                            text, self.length
                        )));
                    }
                };
                ctx.write_at(self.position + index * self.length, &padded);
                Ok(())
            }
            StreamFormat::Xml => {
                match self.xml_type {
                    XmlType::Attribute => {
                        if !value.is_null() || self.literal.is_some() {
                            if let Some(element) = ctx.element_mut() {
                                element.attributes.insert(self.name.clone(), text);
                            }
                        }
                    }
                    XmlType::Text => {
                        if let Some(element) = ctx.element_mut() {
                            element.text = text;
                        }
                    }
                    XmlType::Element => {
                        if value.is_null() && self.literal.is_none() {
                            if self.nillable {
                                let mut child = XmlElement::new(&self.name);
                                child.set_nil();
                                if let Some(element) = ctx.element_mut() {
                                    element.children.push(child);
                                }
                            } else if self.required {
                                if let Some(element) = ctx.element_mut() {
                                    element.children.push(XmlElement::new(&self.name));
                                }
                            }
                            // Optional null fields are omitted entirely.
                        } else {
                            let child = XmlElement::new(&self.name).with_text(text);
                            if let Some(element) = ctx.element_mut() {
                                element.children.push(child);
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }

    fn marshal_error(&self, message: impl Into<String>) -> BindError {
        BindError::new(
            BindErrorKind::InvalidRecord,
            format!("Invalid '{}':  {}", self.name, message.into()),
        )
    }
}

/// A compiled constant property. Produces its value on read without
/// touching the stream; contributes nothing on write.
pub(crate) struct Property {
    name: String,
    value: Value,
    accessor: Arc<dyn PropertyAccessor>,
}

impl Property {
    fn compile(layout: &PropertyLayout, registry: &TypeRegistry) -> BindResult<Self> {
        let ty = layout.ty.unwrap_or(ValueType::String);
        let handler = registry.resolve(ty, None).ok_or_else(|| {
            BindError::unknown_type_handler(format!(
                "no type handler for type '{}' on property '{}'",
                ty, layout.name
            ))
        })?;
        let value = handler.parse(&layout.value).map_err(|e| {
            BindError::configuration(format!(
                "constant property '{}' does not parse: {}",
                layout.name, e
            ))
        })?;
        Ok(Self {
            name: layout.name.clone(),
            value,
            accessor: Arc::new(NamedAccessor::new(layout.name.clone())),
        })
    }
}

/// One node of compiled record content.
pub(crate) enum Content {
    Field(Field),
    Segment(Segment),
    Property(Property),
}

/// A compiled segment: an ordered list of content children, optionally
/// bound to a nested record object or a collection of them.
pub(crate) struct Segment {
    pub name: String,
    /// Class of the nested record object. The record's own inline segment
    /// has no class and binds children directly to the record bean.
    class: Option<String>,
    occurs: Occurs,
    xml_name: String,
    nillable: bool,
    children: Vec<Content>,
    accessor: Arc<dyn PropertyAccessor>,
}

impl Segment {
    /// Compile a record's inline content into an unnamed segment.
    pub(crate) fn compile_inline(
        children: &[ContentLayout],
        format: StreamFormat,
        registry: &TypeRegistry,
    ) -> BindResult<Self> {
        let mut cursor = 0usize;
        Ok(Self {
            name: String::new(),
            class: None,
            occurs: Occurs::ONCE,
            xml_name: String::new(),
            nillable: false,
            children: Self::compile_children(children, format, registry, &mut cursor)?,
            accessor: Arc::new(NamedAccessor::new(String::new())),
        })
    }

    fn compile_nested(
        layout: &SegmentLayout,
        format: StreamFormat,
        registry: &TypeRegistry,
    ) -> BindResult<Self> {
        if format != StreamFormat::Xml {
            return Err(BindError::configuration(format!(
                "segment '{}' is nested, which only XML streams permit",
                layout.name
            )));
        }
        let mut cursor = 0usize;
        Ok(Self {
            name: layout.name.clone(),
            class: Some(
                layout
                    .class
                    .clone()
                    .unwrap_or_else(|| layout.name.clone()),
            ),
            occurs: layout.occurs,
            xml_name: layout
                .xml_name
                .clone()
                .unwrap_or_else(|| layout.name.clone()),
            nillable: layout.nillable,
            children: Self::compile_children(&layout.children, format, registry, &mut 0)?,
            accessor: Arc::new(NamedAccessor::new(layout.name.clone())),
        })
    }

    fn compile_children(
        children: &[ContentLayout],
        format: StreamFormat,
        registry: &TypeRegistry,
        cursor: &mut usize,
    ) -> BindResult<Vec<Content>> {
        let mut compiled = Vec::with_capacity(children.len());
        for child in children {
            compiled.push(match child {
                ContentLayout::Field(f) => {
                    Content::Field(Field::compile(f, format, registry, cursor)?)
                }
                ContentLayout::Segment(s) => {
                    Content::Segment(Segment::compile_nested(s, format, registry)?)
                }
                ContentLayout::Property(p) => Content::Property(Property::compile(p, registry)?),
            });
        }
        Ok(compiled)
    }

    /// All record-identifier fields accept the raw record. Nested segments
    /// participate through their first occurrence.
    pub(crate) fn identifiers_match(&self, view: View<'_>) -> bool {
        for child in &self.children {
            match child {
                Content::Field(field) if field.record_identifier => {
                    if !field.identifies(view) {
                        return false;
                    }
                }
                Content::Segment(segment) => {
                    if let View::Xml(element) = view {
                        if let Some(carrier) = element.child(&segment.xml_name) {
                            if !segment.identifiers_match(View::Xml(carrier)) {
                                return false;
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        true
    }

    /// Unmarshal all children into `bean`, accumulating errors on the
    /// context instead of stopping at the first failure.
    pub(crate) fn unmarshal_into(
        &self,
        view: View<'_>,
        ctx: &mut UnmarshallingContext,
        bean: &mut Bean,
    ) {
        for child in &self.children {
            match child {
                Content::Field(field) => {
                    if field.occurs.repeats() {
                        let mut items = Vec::new();
                        let mut index = 0;
                        loop {
                            if let Some(max) = field.occurs.max {
                                if index >= max {
                                    break;
                                }
                            }
                            if !field.present(view, index) {
                                break;
                            }
                            if let Some(value) = field.unmarshal(view, index, ctx) {
                                items.push(value);
                            }
                            index += 1;
                        }
                        if index < field.occurs.min {
                            ctx.add_field_error(
                                &field.name,
                                format!("expected at least {} occurrences", field.occurs.min),
                            );
                        }
                        if !field.ignore {
                            field.accessor.set(bean, Value::List(items));
                        }
                    } else if let Some(value) = field.unmarshal(view, 0, ctx) {
                        if !field.ignore {
                            field.accessor.set(bean, value);
                        }
                    }
                }
                Content::Property(property) => {
                    property.accessor.set(bean, property.value.clone());
                }
                Content::Segment(segment) => segment.unmarshal_nested(view, ctx, bean),
            }
        }
    }

    fn unmarshal_nested(&self, view: View<'_>, ctx: &mut UnmarshallingContext, bean: &mut Bean) {
        let View::Xml(element) = view else {
            return;
        };
        let class = self.class.as_deref().unwrap_or(&self.name);
        if self.occurs.repeats() {
            let mut items = Vec::new();
            let mut index = 0;
            loop {
                if let Some(max) = self.occurs.max {
                    if index >= max {
                        break;
                    }
                }
                let Some(carrier) = element.child_at(&self.xml_name, index) else {
                    break;
                };
                let mut child_bean = Bean::new(class);
                self.unmarshal_into(View::Xml(carrier), ctx, &mut child_bean);
                items.push(Value::Record(Box::new(child_bean)));
                index += 1;
            }
            if index < self.occurs.min {
                ctx.add_field_error(
                    &self.name,
                    format!("expected at least {} occurrences", self.occurs.min),
                );
            }
            self.accessor.set(bean, Value::List(items));
        } else {
            match element.child(&self.xml_name) {
                Some(carrier) if carrier.is_nil() && self.nillable => {
                    self.accessor.set(bean, Value::Null);
                }
                Some(carrier) => {
                    let mut child_bean = Bean::new(class);
                    self.unmarshal_into(View::Xml(carrier), ctx, &mut child_bean);
                    self.accessor
                        .set(bean, Value::Record(Box::new(child_bean)));
                }
                None => {
                    if self.occurs.min > 0 {
                        ctx.add_field_error(&self.name, "required");
                    }
                }
            }
        }
    }

    /// Marshal all children from `bean` into the context's record buffer.
    pub(crate) fn marshal_from(&self, bean: &Bean, ctx: &mut MarshallingContext) -> BindResult<()> {
        for child in &self.children {
            match child {
                Content::Field(field) => {
                    if field.occurs.repeats() {
                        let items = match field.accessor.get(bean) {
                            Some(Value::List(items)) => items,
                            Some(Value::Null) | None => Vec::new(),
                            Some(single) => vec![single],
                        };
                        let limit = field
                            .occurs
                            .max
                            .map_or(items.len(), |max| items.len().min(max));
                        for (index, item) in items.iter().take(limit).enumerate() {
                            field.marshal(bean, Some(item), index, ctx)?;
                        }
                        // Fixed records keep their declared width; fill the
                        // remaining occurrences up to the minimum.
                        if ctx.format() == StreamFormat::Fixed {
                            for index in limit..field.occurs.min {
                                field.marshal(bean, Some(&Value::Null), index, ctx)?;
                            }
                        }
                    } else {
                        field.marshal(bean, None, 0, ctx)?;
                    }
                }
                Content::Property(_) => {}
                Content::Segment(segment) => segment.marshal_nested(bean, ctx)?,
            }
        }
        Ok(())
    }

    fn marshal_nested(&self, bean: &Bean, ctx: &mut MarshallingContext) -> BindResult<()> {
        if self.occurs.repeats() {
            let items = match self.accessor.get(bean) {
                Some(Value::List(items)) => items,
                Some(Value::Null) | None => Vec::new(),
                Some(single) => vec![single],
            };
            let limit = self
                .occurs
                .max
                .map_or(items.len(), |max| items.len().min(max));
            for item in items.iter().take(limit) {
                if let Value::Record(child) = item {
                    ctx.push_element(&self.xml_name);
                    self.marshal_from(child, ctx)?;
                    ctx.pop_element();
                }
            }
            Ok(())
        } else {
            match self.accessor.get(bean) {
                Some(Value::Record(child)) => {
                    ctx.push_element(&self.xml_name);
                    self.marshal_from(&child, ctx)?;
                    ctx.pop_element();
                    Ok(())
                }
                Some(Value::Null) if self.nillable => {
                    ctx.push_element(&self.xml_name);
                    if let Some(element) = ctx.element_mut() {
                        element.set_nil();
                    }
                    ctx.pop_element();
                    Ok(())
                }
                _ => Ok(()),
            }
        }
    }

}

/// A compiled record definition: framing plus its content segment.
pub(crate) struct RecordNode {
    pub framing: RecordFraming,
    pub class: String,
    pub xml_name: String,
    pub segment: Segment,
}

impl std::fmt::Debug for RecordNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordNode")
            .field("framing", &self.framing)
            .field("class", &self.class)
            .field("xml_name", &self.xml_name)
            .finish_non_exhaustive()
    }
}

impl RecordNode {
    pub(crate) fn compile(
        layout: &RecordLayout,
        format: StreamFormat,
        registry: &TypeRegistry,
    ) -> BindResult<Self> {
        let xml_name = layout
            .xml_name
            .clone()
            .unwrap_or_else(|| layout.name.clone());
        let framing = match format {
            StreamFormat::Delimited | StreamFormat::Csv => RecordFraming::Delimited {
                min_fields: layout.min_length,
                max_fields: layout.max_length,
            },
            StreamFormat::Fixed => RecordFraming::Fixed {
                min_length: layout.min_length,
                max_length: layout.max_length,
            },
            StreamFormat::Xml => RecordFraming::Xml {
                name: xml_name.clone(),
            },
        };
        Ok(Self {
            framing,
            class: layout.class.clone().unwrap_or_else(|| layout.name.clone()),
            xml_name,
            segment: Segment::compile_inline(&layout.children, format, registry)?,
        })
    }

    /// Identification: framing accepts the raw record and every
    /// record-identifier field matches.
    pub(crate) fn matches(&self, raw: &RawRecord) -> bool {
        self.framing.matches(raw) && self.segment.identifiers_match(View::of(raw))
    }

    /// Write-side dispatch: does the bean in the context belong here?
    pub(crate) fn defines(&self, bean: &Value, component: Option<&str>, name: &str) -> bool {
        if let Some(component) = component {
            if component != name {
                return false;
            }
        }
        match bean {
            Value::Record(b) => b.type_name() == self.class,
            _ => false,
        }
    }

    /// Unmarshal the current raw record. Framing errors short-circuit the
    /// segment descent but the record still completes, so the caller always
    /// receives a consistent report.
    pub(crate) fn unmarshal(
        &self,
        name: &str,
        ctx: &mut UnmarshallingContext,
    ) -> (Option<Value>, Option<InvalidRecord>) {
        ctx.record_started(name);
        let Some(raw) = ctx.take_raw() else {
            return (None, ctx.record_completed());
        };

        for error in self.framing.validate(&raw) {
            ctx.add_record_error(error);
        }

        let mut value = None;
        if !ctx.has_record_errors() {
            let mut bean = Bean::new(&self.class);
            self.segment.unmarshal_into(View::of(&raw), ctx, &mut bean);
            value = Some(Value::Record(Box::new(bean)));
        }

        ctx.restore_raw(raw);
        let report = ctx.record_completed();
        if report.is_some() {
            (None, report)
        } else {
            (value, None)
        }
    }

    /// Marshal the context's bean into the record buffer.
    pub(crate) fn marshal(&self, ctx: &mut MarshallingContext) -> BindResult<()> {
        let Some(Value::Record(bean)) = ctx.bean().cloned() else {
            return Err(BindError::configuration(
                "marshalling requires a record value",
            ));
        };
        if ctx.format() == StreamFormat::Xml {
            ctx.begin_xml_record(&self.xml_name);
        }
        self.segment.marshal_from(&bean, ctx)
    }
}
