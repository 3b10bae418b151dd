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

//! Line-oriented fixed-length record transport.
//!
//! Every line is one record; length validation against the record
//! definition happens in the binding layer, not here.

use crate::error::StreamError;
use crate::reader::LineReader;
use flatbind_core::{BindError, BindResult, RawRecord, RecordReader, RecordWriter};
use std::io::{Read, Write};

/// Reads one fixed-length record per line.
pub struct FixedLengthReader<R: Read> {
    lines: LineReader<R>,
}

impl<R: Read> FixedLengthReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: LineReader::new(reader),
        }
    }
}

impl<R: Read> RecordReader for FixedLengthReader<R> {
    fn read(&mut self) -> BindResult<Option<(usize, RawRecord)>> {
        match self.lines.next_line().map_err(BindError::from)? {
            Some((line, text)) => Ok(Some((line, RawRecord::Fixed(text)))),
            None => Ok(None),
        }
    }
}

/// Writes one fixed-length record per line.
pub struct FixedLengthWriter<W: Write> {
    inner: W,
}

impl<W: Write> FixedLengthWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { inner: writer }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> RecordWriter for FixedLengthWriter<W> {
    fn write(&mut self, record: &RawRecord) -> BindResult<()> {
        let RawRecord::Fixed(line) = record else {
            return Err(BindError::framing(format!(
                "fixed-length writer cannot emit a {} record",
                record.framing_name()
            )));
        };
        self.inner
            .write_all(line.as_bytes())
            .and_then(|_| self.inner.write_all(b"\n"))
            .map_err(StreamError::Io)
            .map_err(BindError::from)
    }

    fn flush(&mut self) -> BindResult<()> {
        self.inner
            .flush()
            .map_err(StreamError::Io)
            .map_err(BindError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_each_line_is_a_record() {
        let mut reader = FixedLengthReader::new(Cursor::new("AAA11\nBBB22\n"));
        assert_eq!(
            reader.read().unwrap(),
            Some((1, RawRecord::Fixed("AAA11".to_string())))
        );
        assert_eq!(
            reader.read().unwrap(),
            Some((2, RawRecord::Fixed("BBB22".to_string())))
        );
        assert_eq!(reader.read().unwrap(), None);
    }

    #[test]
    fn test_short_line_passes_through() {
        // The reader frames; the binding layer validates lengths.
        let mut reader = FixedLengthReader::new(Cursor::new("AB\n"));
        assert_eq!(
            reader.read().unwrap(),
            Some((1, RawRecord::Fixed("AB".to_string())))
        );
    }

    #[test]
    fn test_writer_appends_newline() {
        let mut writer = FixedLengthWriter::new(Vec::new());
        writer.write(&RawRecord::Fixed("AAA11".to_string())).unwrap();
        writer.write(&RawRecord::Fixed("BBB22".to_string())).unwrap();
        writer.flush().unwrap();
        let bytes = writer.into_inner();
        assert_eq!(String::from_utf8(bytes).unwrap(), "AAA11\nBBB22\n");
    }

    #[test]
    fn test_writer_rejects_wrong_framing() {
        let mut writer = FixedLengthWriter::new(Vec::new());
        let err = writer
            .write(&RawRecord::Delimited(vec!["a".to_string()]))
            .unwrap_err();
        assert!(err.message.contains("cannot emit"));
    }

    #[test]
    fn test_round_trip() {
        let mut writer = FixedLengthWriter::new(Vec::new());
        writer.write(&RawRecord::Fixed("X  42".to_string())).unwrap();
        let bytes = writer.into_inner();
        let mut reader = FixedLengthReader::new(Cursor::new(bytes));
        assert_eq!(
            reader.read().unwrap(),
            Some((1, RawRecord::Fixed("X  42".to_string())))
        );
    }
}
