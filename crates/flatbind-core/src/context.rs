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

//! Per-operation state threaded through the parser tree.
//!
//! One context instance lives for the lifetime of a reader or writer and is
//! borrowed into the tree for one record at a time. Field and record errors
//! accumulate silently during a record and surface atomically as an
//! [`InvalidRecord`] report when the record completes.

use crate::config::StreamFormat;
use crate::error::{BindResult, InvalidRecord};
use crate::format::{delimited, RawRecord, XmlElement};
use crate::transport::RecordWriter;
use crate::value::Value;
use indexmap::IndexMap;

/// Read-side context: the raw record view, positions, and error state.
#[derive(Debug, Default)]
pub struct UnmarshallingContext {
    raw: Option<RawRecord>,
    line_number: usize,
    record_count: usize,
    record_name: Option<String>,
    record_errors: Vec<String>,
    field_errors: IndexMap<String, Vec<String>>,
}

impl UnmarshallingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the next raw record before matching.
    pub fn begin_record(&mut self, raw: RawRecord, line_number: usize) {
        self.raw = Some(raw);
        self.line_number = line_number;
    }

    /// The raw record currently being processed.
    pub fn raw(&self) -> Option<&RawRecord> {
        self.raw.as_ref()
    }

    /// Detach the raw record for borrow-free traversal. The caller restores
    /// it with [`restore_raw`](Self::restore_raw) before the record ends.
    pub fn take_raw(&mut self) -> Option<RawRecord> {
        self.raw.take()
    }

    pub fn restore_raw(&mut self, raw: RawRecord) {
        self.raw = Some(raw);
    }

    /// Line number of the current record (1-based).
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Number of records completed or skipped so far.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Name of the record definition currently in effect.
    pub fn record_name(&self) -> Option<&str> {
        self.record_name.as_deref()
    }

    /// Begin unmarshalling the named record.
    pub fn record_started(&mut self, name: &str) {
        self.record_name = Some(name.to_string());
        self.record_errors.clear();
        self.field_errors.clear();
    }

    /// Finish the record, yielding the accumulated validation report.
    pub fn record_completed(&mut self) -> Option<InvalidRecord> {
        self.record_count += 1;
        self.raw = None;
        if self.record_errors.is_empty() && self.field_errors.is_empty() {
            return None;
        }
        Some(InvalidRecord {
            record_name: self.record_name.clone().unwrap_or_default(),
            line: self.line_number,
            record_errors: std::mem::take(&mut self.record_errors),
            field_errors: std::mem::take(&mut self.field_errors),
        })
    }

    /// Count a record that was matched but not bound.
    pub fn record_skipped(&mut self) {
        self.record_count += 1;
        self.raw = None;
    }

    pub fn add_record_error(&mut self, message: impl Into<String>) {
        self.record_errors.push(message.into());
    }

    pub fn add_field_error(&mut self, field: &str, message: impl Into<String>) {
        self.field_errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn has_record_errors(&self) -> bool {
        !self.record_errors.is_empty()
    }

    pub fn has_field_errors(&self) -> bool {
        !self.field_errors.is_empty()
    }
}

/// Write-side context: the outbound bean and the per-format record buffer.
#[derive(Debug)]
pub struct MarshallingContext {
    format: StreamFormat,
    bean: Option<Value>,
    component_name: Option<String>,
    record_count: usize,
    // Per-format buffers; only the one matching `format` is used.
    tokens: Vec<String>,
    fixed: Vec<char>,
    xml_stack: Vec<XmlElement>,
}

impl MarshallingContext {
    pub fn new(format: StreamFormat) -> Self {
        Self {
            format,
            bean: None,
            component_name: None,
            record_count: 0,
            tokens: Vec::new(),
            fixed: Vec::new(),
            xml_stack: Vec::new(),
        }
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// Install the bean to marshal, optionally targeting a record by name.
    pub fn set_bean(&mut self, bean: Value, component_name: Option<String>) {
        self.bean = Some(bean);
        self.component_name = component_name;
    }

    pub fn bean(&self) -> Option<&Value> {
        self.bean.as_ref()
    }

    pub fn component_name(&self) -> Option<&str> {
        self.component_name.as_deref()
    }

    /// Number of records written so far.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    // ==== Delimited buffer ====

    /// Place a token at a position, growing the record as needed.
    pub fn set_token(&mut self, index: usize, text: String) {
        delimited::set_token(&mut self.tokens, index, text);
    }

    // ==== Fixed buffer ====

    /// Write text at a character position, space-filling any gap.
    pub fn write_at(&mut self, position: usize, text: &str) {
        if self.fixed.len() < position {
            self.fixed.resize(position, ' ');
        }
        for (i, c) in text.chars().enumerate() {
            let at = position + i;
            if at < self.fixed.len() {
                self.fixed[at] = c;
            } else {
                self.fixed.push(c);
            }
        }
    }

    // ==== XML buffer ====

    /// Open the record's root element.
    pub fn begin_xml_record(&mut self, name: &str) {
        self.xml_stack.clear();
        self.xml_stack.push(XmlElement::new(name));
    }

    /// Open a nested element; closed and attached by
    /// [`pop_element`](Self::pop_element).
    pub fn push_element(&mut self, name: &str) {
        self.xml_stack.push(XmlElement::new(name));
    }

    /// Close the innermost element and attach it to its parent.
    pub fn pop_element(&mut self) {
        if self.xml_stack.len() > 1 {
            if let Some(child) = self.xml_stack.pop() {
                if let Some(parent) = self.xml_stack.last_mut() {
                    parent.children.push(child);
                }
            }
        }
    }

    /// The innermost open element.
    pub fn element_mut(&mut self) -> Option<&mut XmlElement> {
        self.xml_stack.last_mut()
    }

    /// Assemble the buffered record without writing it.
    pub fn take_record(&mut self) -> RawRecord {
        match self.format {
            StreamFormat::Delimited | StreamFormat::Csv => {
                RawRecord::Delimited(std::mem::take(&mut self.tokens))
            }
            StreamFormat::Fixed => {
                RawRecord::Fixed(std::mem::take(&mut self.fixed).into_iter().collect())
            }
            StreamFormat::Xml => {
                // Collapse any elements left open.
                while self.xml_stack.len() > 1 {
                    self.pop_element();
                }
                RawRecord::Xml(self.xml_stack.pop().unwrap_or_default())
            }
        }
    }

    /// Flush the buffered record to the writer and clear the buffer.
    pub fn write_record(&mut self, writer: &mut dyn RecordWriter) -> BindResult<()> {
        let record = self.take_record();
        let result = writer.write(&record);
        self.clear();
        if result.is_ok() {
            self.record_count += 1;
        }
        result
    }

    /// Drop the outbound bean and all buffered content.
    pub fn clear(&mut self) {
        self.bean = None;
        self.component_name = None;
        self.tokens.clear();
        self.fixed.clear();
        self.xml_stack.clear();
    }
}
