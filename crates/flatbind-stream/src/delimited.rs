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

//! Delimited record transport over the `csv` tokenizer.
//!
//! Handles the configured separator, optional quoted-token mode, and the
//! optional escape character. Quoted tokens may span lines; the reported
//! line number is the line the record starts on.

use crate::error::{StreamError, StreamResult};
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use flatbind_core::{BindError, BindResult, DelimitedOptions, RawRecord, RecordReader, RecordWriter};
use std::io::{Read, Write};

fn ascii_byte(c: char, role: &str) -> StreamResult<u8> {
    u8::try_from(c).map_err(|_| {
        StreamError::malformed(0, format!("{} '{}' is not an ASCII character", role, c))
    })
}

/// Reads delimited records, one token list per record.
pub struct DelimitedReader<R: Read> {
    inner: csv::Reader<R>,
}

impl<R: Read> DelimitedReader<R> {
    pub fn new(reader: R, options: &DelimitedOptions) -> StreamResult<Self> {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(ascii_byte(options.delimiter, "delimiter")?)
            .has_headers(false)
            .flexible(true);
        match options.quote {
            Some(quote) => builder.quote(ascii_byte(quote, "quote")?),
            None => builder.quoting(false),
        };
        if let Some(escape) = options.escape {
            builder.escape(Some(ascii_byte(escape, "escape")?));
        }
        Ok(Self {
            inner: builder.from_reader(reader),
        })
    }
}

impl<R: Read> RecordReader for DelimitedReader<R> {
    fn read(&mut self) -> BindResult<Option<(usize, RawRecord)>> {
        let line = self.inner.position().line() as usize;
        let mut record = csv::StringRecord::new();
        let more = self
            .inner
            .read_record(&mut record)
            .map_err(StreamError::Csv)
            .map_err(BindError::from)?;
        if !more {
            return Ok(None);
        }
        let tokens: Vec<String> = record.iter().map(str::to_string).collect();
        Ok(Some((line, RawRecord::Delimited(tokens))))
    }
}

/// Writes delimited records, quoting tokens only when the configuration
/// and content require it.
pub struct DelimitedWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(writer: W, options: &DelimitedOptions) -> StreamResult<Self> {
        let mut builder = WriterBuilder::new();
        builder
            .delimiter(ascii_byte(options.delimiter, "delimiter")?)
            .has_headers(false)
            .flexible(true);
        match options.quote {
            Some(quote) => {
                builder
                    .quote(ascii_byte(quote, "quote")?)
                    .quote_style(QuoteStyle::Necessary);
            }
            None => {
                builder.quote_style(QuoteStyle::Never);
            }
        }
        if let Some(escape) = options.escape {
            builder
                .escape(ascii_byte(escape, "escape")?)
                .double_quote(false);
        }
        Ok(Self {
            inner: builder.from_writer(writer),
        })
    }

    /// Unwrap the underlying writer, flushing buffered output.
    pub fn into_inner(self) -> StreamResult<W> {
        self.inner
            .into_inner()
            .map_err(|e| StreamError::Io(e.into_error()))
    }
}

impl<W: Write> RecordWriter for DelimitedWriter<W> {
    fn write(&mut self, record: &RawRecord) -> BindResult<()> {
        let RawRecord::Delimited(tokens) = record else {
            return Err(BindError::framing(format!(
                "delimited writer cannot emit a {} record",
                record.framing_name()
            )));
        };
        self.inner
            .write_record(tokens)
            .map_err(StreamError::Csv)
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

    fn options() -> DelimitedOptions {
        DelimitedOptions::default()
    }

    fn read_all(input: &str, options: &DelimitedOptions) -> Vec<(usize, Vec<String>)> {
        let mut reader = DelimitedReader::new(Cursor::new(input.to_string()), options).unwrap();
        let mut out = Vec::new();
        while let Some((line, record)) = reader.read().unwrap() {
            let RawRecord::Delimited(tokens) = record else {
                panic!("expected delimited record");
            };
            out.push((line, tokens));
        }
        out
    }

    // ==================== Reader tests ====================

    #[test]
    fn test_read_basic_records() {
        let records = read_all("a,b\nc,d\n", &options());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], (1, vec!["a".to_string(), "b".to_string()]));
        assert_eq!(records[1], (2, vec!["c".to_string(), "d".to_string()]));
    }

    #[test]
    fn test_read_custom_delimiter() {
        let opts = DelimitedOptions {
            delimiter: '|',
            ..Default::default()
        };
        let records = read_all("H|1\nD|a\n", &opts);
        assert_eq!(records[0].1, vec!["H".to_string(), "1".to_string()]);
    }

    #[test]
    fn test_read_ragged_records() {
        let records = read_all("a\nb,c,d\n", &options());
        assert_eq!(records[0].1.len(), 1);
        assert_eq!(records[1].1.len(), 3);
    }

    #[test]
    fn test_read_quoted_tokens() {
        let opts = DelimitedOptions {
            quote: Some('"'),
            ..Default::default()
        };
        let records = read_all("\"a,b\",c\n", &opts);
        assert_eq!(records[0].1, vec!["a,b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_quoting_disabled_by_default() {
        let records = read_all("\"a,b\"\n", &options());
        assert_eq!(records[0].1, vec!["\"a".to_string(), "b\"".to_string()]);
    }

    #[test]
    fn test_multiline_quoted_token_keeps_start_line() {
        let opts = DelimitedOptions {
            quote: Some('"'),
            ..Default::default()
        };
        let records = read_all("\"a\nb\",x\nnext,y\n", &opts);
        assert_eq!(records[0].0, 1);
        assert_eq!(records[0].1[0], "a\nb");
        assert_eq!(records[1].0, 3);
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let opts = DelimitedOptions {
            delimiter: '→',
            ..Default::default()
        };
        assert!(DelimitedReader::new(Cursor::new(String::new()), &opts).is_err());
    }

    // ==================== Writer tests ====================

    #[test]
    fn test_write_basic_records() {
        let mut writer = DelimitedWriter::new(Vec::new(), &options()).unwrap();
        writer
            .write(&RawRecord::Delimited(vec!["a".to_string(), "b".to_string()]))
            .unwrap();
        writer.flush().unwrap();
        let bytes = writer.into_inner().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a,b\n");
    }

    #[test]
    fn test_write_quotes_only_when_needed() {
        let opts = DelimitedOptions {
            quote: Some('"'),
            ..Default::default()
        };
        let mut writer = DelimitedWriter::new(Vec::new(), &opts).unwrap();
        writer
            .write(&RawRecord::Delimited(vec![
                "plain".to_string(),
                "has,comma".to_string(),
            ]))
            .unwrap();
        let bytes = writer.into_inner().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "plain,\"has,comma\"\n");
    }

    #[test]
    fn test_write_rejects_wrong_framing() {
        let mut writer = DelimitedWriter::new(Vec::new(), &options()).unwrap();
        let err = writer.write(&RawRecord::Fixed("x".to_string())).unwrap_err();
        assert!(err.message.contains("cannot emit"));
    }

    #[test]
    fn test_round_trip() {
        let opts = DelimitedOptions {
            quote: Some('"'),
            ..Default::default()
        };
        let original = vec!["a".to_string(), "b,c".to_string(), String::new()];
        let mut writer = DelimitedWriter::new(Vec::new(), &opts).unwrap();
        writer.write(&RawRecord::Delimited(original.clone())).unwrap();
        let bytes = writer.into_inner().unwrap();

        let mut reader = DelimitedReader::new(Cursor::new(bytes), &opts).unwrap();
        let (_, record) = reader.read().unwrap().unwrap();
        assert_eq!(record, RawRecord::Delimited(original));
    }
}
