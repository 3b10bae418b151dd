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

//! XML record transport over `quick-xml` events.
//!
//! The stream document is one wrapper element whose direct children are the
//! records. The reader materializes one child subtree per record; the
//! writer opens the wrapper lazily on the first record and closes it in
//! [`XmlRecordWriter::finish`].
//!
//! XML input has no meaningful line framing, so the position reported for
//! each record is its ordinal in the document.

use crate::error::{StreamError, StreamResult};
use flatbind_core::{BindError, BindResult, RawRecord, RecordReader, RecordWriter, XmlElement};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{BufRead, Write};

fn element_of(start: &BytesStart<'_>) -> StreamResult<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attr in start.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(StreamError::Xml)?
            .into_owned();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

/// Reads one record element subtree at a time from an XML document.
pub struct XmlRecordReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    inside_root: bool,
    finished: bool,
    records_read: usize,
}

impl<R: BufRead> XmlRecordReader<R> {
    pub fn new(reader: R) -> Self {
        let reader = Reader::from_reader(reader);
        Self {
            reader,
            buf: Vec::new(),
            inside_root: false,
            finished: false,
            records_read: 0,
        }
    }

    fn read_subtree(&mut self, root: XmlElement) -> StreamResult<XmlElement> {
        let mut stack = vec![root];
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) => {
                    let element = element_of(&e)?;
                    stack.push(element);
                }
                Ok(Event::Empty(e)) => {
                    let element = element_of(&e)?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(element);
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(StreamError::Xml)?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Ok(Event::End(_)) => {
                    let mut done = match stack.pop() {
                        Some(done) => done,
                        None => {
                            return Err(StreamError::malformed(
                                self.records_read + 1,
                                "unbalanced end tag in record subtree",
                            ));
                        }
                    };
                    done.text = done.text.trim().to_string();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => return Ok(done),
                    }
                }
                Ok(Event::Eof) => {
                    return Err(StreamError::malformed(
                        self.records_read + 1,
                        "unexpected end of document inside a record",
                    ));
                }
                Ok(_) => {}
                Err(e) => return Err(StreamError::Xml(e)),
            }
        }
    }
}

impl<R: BufRead> RecordReader for XmlRecordReader<R> {
    fn read(&mut self) -> BindResult<Option<(usize, RawRecord)>> {
        if self.finished {
            return Ok(None);
        }
        loop {
            self.buf.clear();
            let event = {
                match self.reader.read_event_into(&mut self.buf) {
                    Ok(event) => event.into_owned(),
                    Err(e) => return Err(BindError::from(StreamError::Xml(e))),
                }
            };
            match event {
                Event::Start(e) => {
                    if !self.inside_root {
                        self.inside_root = true;
                        continue;
                    }
                    let root = element_of(&e).map_err(BindError::from)?;
                    let element = self.read_subtree(root).map_err(BindError::from)?;
                    self.records_read += 1;
                    return Ok(Some((self.records_read, RawRecord::Xml(element))));
                }
                Event::Empty(e) => {
                    if !self.inside_root {
                        // A childless document element carries no records.
                        self.finished = true;
                        return Ok(None);
                    }
                    let element = element_of(&e).map_err(BindError::from)?;
                    self.records_read += 1;
                    return Ok(Some((self.records_read, RawRecord::Xml(element))));
                }
                Event::End(_) => {
                    if self.inside_root {
                        self.finished = true;
                        return Ok(None);
                    }
                }
                Event::Eof => {
                    self.finished = true;
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

/// Writes records as child subtrees of one wrapper element.
pub struct XmlRecordWriter<W: Write> {
    writer: Writer<W>,
    root: String,
    root_open: bool,
}

impl<W: Write> XmlRecordWriter<W> {
    pub fn new(writer: W, root: impl Into<String>) -> Self {
        Self {
            writer: Writer::new(writer),
            root: root.into(),
            root_open: false,
        }
    }

    fn open_root(&mut self) -> StreamResult<()> {
        if !self.root_open {
            self.writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(StreamError::Xml)?;
            self.writer
                .write_event(Event::Start(BytesStart::new(self.root.as_str())))
                .map_err(StreamError::Xml)?;
            self.root_open = true;
        }
        Ok(())
    }

    fn write_element(&mut self, element: &XmlElement) -> StreamResult<()> {
        let mut start = BytesStart::new(element.name.as_str());
        for (key, value) in &element.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if element.children.is_empty() && element.text.is_empty() {
            self.writer
                .write_event(Event::Empty(start))
                .map_err(StreamError::Xml)?;
            return Ok(());
        }
        self.writer
            .write_event(Event::Start(start))
            .map_err(StreamError::Xml)?;
        if !element.text.is_empty() {
            self.writer
                .write_event(Event::Text(BytesText::new(element.text.as_str())))
                .map_err(StreamError::Xml)?;
        }
        for child in &element.children {
            self.write_element(child)?;
        }
        self.writer
            .write_event(Event::End(BytesEnd::new(element.name.as_str())))
            .map_err(StreamError::Xml)?;
        Ok(())
    }

    /// Close the wrapper element and return the underlying writer.
    pub fn finish(mut self) -> StreamResult<W> {
        self.open_root()?;
        self.writer
            .write_event(Event::End(BytesEnd::new(self.root.clone().as_str())))
            .map_err(StreamError::Xml)?;
        Ok(self.writer.into_inner())
    }
}

impl<W: Write> RecordWriter for XmlRecordWriter<W> {
    fn write(&mut self, record: &RawRecord) -> BindResult<()> {
        let RawRecord::Xml(element) = record else {
            return Err(BindError::framing(format!(
                "xml writer cannot emit a {} record",
                record.framing_name()
            )));
        };
        self.open_root().map_err(BindError::from)?;
        self.write_element(element).map_err(BindError::from)
    }

    fn flush(&mut self) -> BindResult<()> {
        self.writer
            .get_mut()
            .flush()
            .map_err(StreamError::Io)
            .map_err(BindError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(xml: &str) -> Vec<XmlElement> {
        let mut reader = XmlRecordReader::new(Cursor::new(xml.as_bytes().to_vec()));
        let mut out = Vec::new();
        while let Some((_, record)) = reader.read().unwrap() {
            let RawRecord::Xml(element) = record else {
                panic!("expected xml record");
            };
            out.push(element);
        }
        out
    }

    // ==================== Reader tests ====================

    #[test]
    fn test_reads_one_subtree_per_record() {
        let records = read_all(
            r#"<?xml version="1.0"?><batch><person><name>Alice</name></person><person><name>Bob</name></person></batch>"#,
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "person");
        assert_eq!(records[0].child("name").unwrap().text, "Alice");
        assert_eq!(records[1].child("name").unwrap().text, "Bob");
    }

    #[test]
    fn test_reads_attributes() {
        let records = read_all(r#"<batch><person id="7" dept="ops"/></batch>"#);
        assert_eq!(records[0].attribute("id"), Some("7"));
        assert_eq!(records[0].attribute("dept"), Some("ops"));
    }

    #[test]
    fn test_nested_elements() {
        let records = read_all(
            "<batch><person><address><city>Delft</city></address></person></batch>",
        );
        let address = records[0].child("address").unwrap();
        assert_eq!(address.child("city").unwrap().text, "Delft");
    }

    #[test]
    fn test_pretty_printed_whitespace_is_trimmed() {
        let records = read_all(
            "<batch>\n  <person>\n    <name>\n      Alice\n    </name>\n  </person>\n</batch>",
        );
        assert_eq!(records[0].child("name").unwrap().text, "Alice");
    }

    #[test]
    fn test_empty_document_element() {
        assert!(read_all("<batch/>").is_empty());
        assert!(read_all("<batch></batch>").is_empty());
    }

    #[test]
    fn test_entity_unescaping() {
        let records = read_all("<b><r><v>a &amp; b</v></r></b>");
        assert_eq!(records[0].child("v").unwrap().text, "a & b");
    }

    #[test]
    fn test_nil_attribute_preserved() {
        let records =
            read_all(r#"<b><r><v xsi:nil="true"/></r></b>"#);
        assert!(records[0].child("v").unwrap().is_nil());
    }

    #[test]
    fn test_truncated_document_is_malformed() {
        let mut reader =
            XmlRecordReader::new(Cursor::new(b"<batch><person><name>".to_vec()));
        assert!(reader.read().is_err());
    }

    // ==================== Writer tests ====================

    #[test]
    fn test_writer_wraps_records() {
        let mut writer = XmlRecordWriter::new(Vec::new(), "batch");
        writer
            .write(&RawRecord::Xml(
                XmlElement::new("person").with_child(XmlElement::new("name").with_text("Alice")),
            ))
            .unwrap();
        let bytes = writer.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("<batch>"));
        assert!(text.contains("<person><name>Alice</name></person>"));
        assert!(text.ends_with("</batch>"));
    }

    #[test]
    fn test_writer_empty_stream_still_valid() {
        let writer = XmlRecordWriter::new(Vec::new(), "batch");
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(text.contains("<batch>"));
        assert!(text.contains("</batch>"));
    }

    #[test]
    fn test_writer_rejects_wrong_framing() {
        let mut writer = XmlRecordWriter::new(Vec::new(), "batch");
        let err = writer.write(&RawRecord::Fixed("x".to_string())).unwrap_err();
        assert!(err.message.contains("cannot emit"));
    }

    #[test]
    fn test_writer_escapes_text() {
        let mut writer = XmlRecordWriter::new(Vec::new(), "b");
        writer
            .write(&RawRecord::Xml(
                XmlElement::new("r").with_child(XmlElement::new("v").with_text("a & b")),
            ))
            .unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(text.contains("a &amp; b"));
    }

    // ==================== Round-trip ====================

    #[test]
    fn test_round_trip() {
        let original = XmlElement::new("person")
            .with_attribute("id", "7")
            .with_child(XmlElement::new("name").with_text("Alice"))
            .with_child(XmlElement::new("tag").with_text("a<b"));

        let mut writer = XmlRecordWriter::new(Vec::new(), "batch");
        writer.write(&RawRecord::Xml(original.clone())).unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = XmlRecordReader::new(Cursor::new(bytes));
        let (ordinal, record) = reader.read().unwrap().unwrap();
        assert_eq!(ordinal, 1);
        assert_eq!(record, RawRecord::Xml(original));
        assert!(reader.read().unwrap().is_none());
    }
}
