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

//! Buffered line reader with line-number tracking and peek support.
//!
//! Underpins the line-oriented transports. LF and CRLF line endings are
//! handled transparently; the terminator is never part of the record.

use crate::error::{StreamError, StreamResult};
use std::io::{BufRead, BufReader, Read};

/// Reads input line by line, numbering lines from 1.
pub struct LineReader<R: Read> {
    inner: BufReader<R>,
    line_number: usize,
    pending: Option<(usize, String)>,
}

impl<R: Read> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            line_number: 0,
            pending: None,
        }
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            pending: None,
        }
    }

    /// The number of the line most recently read.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next line with its line number.
    pub fn next_line(&mut self) -> StreamResult<Option<(usize, String)>> {
        if let Some(pending) = self.pending.take() {
            return Ok(Some(pending));
        }
        self.fill()
    }

    /// Look at the next line without consuming it.
    pub fn peek_line(&mut self) -> StreamResult<Option<&(usize, String)>> {
        if self.pending.is_none() {
            self.pending = self.fill()?;
        }
        Ok(self.pending.as_ref())
    }

    /// Hand a line back to be read again next.
    pub fn push_back(&mut self, line_number: usize, line: String) {
        self.pending = Some((line_number, line));
    }

    fn fill(&mut self) -> StreamResult<Option<(usize, String)>> {
        let mut buffer = String::new();
        match self.inner.read_line(&mut buffer) {
            Ok(0) => Ok(None),
            Ok(_) => {
                self.line_number += 1;
                if buffer.ends_with('\n') {
                    buffer.pop();
                    if buffer.ends_with('\r') {
                        buffer.pop();
                    }
                }
                Ok(Some((self.line_number, buffer)))
            }
            Err(e) => Err(StreamError::Io(e)),
        }
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = StreamResult<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_numbered_lines() {
        let mut reader = LineReader::new(Cursor::new("a\nb\nc"));
        assert_eq!(reader.next_line().unwrap(), Some((1, "a".to_string())));
        assert_eq!(reader.next_line().unwrap(), Some((2, "b".to_string())));
        assert_eq!(reader.next_line().unwrap(), Some((3, "c".to_string())));
        assert_eq!(reader.next_line().unwrap(), None);
    }

    #[test]
    fn test_crlf_stripped() {
        let mut reader = LineReader::new(Cursor::new("a\r\nb\r\n"));
        assert_eq!(reader.next_line().unwrap(), Some((1, "a".to_string())));
        assert_eq!(reader.next_line().unwrap(), Some((2, "b".to_string())));
        assert_eq!(reader.next_line().unwrap(), None);
    }

    #[test]
    fn test_empty_input() {
        let mut reader = LineReader::new(Cursor::new(""));
        assert_eq!(reader.next_line().unwrap(), None);
        assert_eq!(reader.line_number(), 0);
    }

    #[test]
    fn test_blank_lines_are_records() {
        let mut reader = LineReader::new(Cursor::new("\n\n"));
        assert_eq!(reader.next_line().unwrap(), Some((1, String::new())));
        assert_eq!(reader.next_line().unwrap(), Some((2, String::new())));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut reader = LineReader::new(Cursor::new("a\nb"));
        assert_eq!(reader.peek_line().unwrap(), Some(&(1, "a".to_string())));
        assert_eq!(reader.peek_line().unwrap(), Some(&(1, "a".to_string())));
        assert_eq!(reader.next_line().unwrap(), Some((1, "a".to_string())));
        assert_eq!(reader.peek_line().unwrap(), Some(&(2, "b".to_string())));
    }

    #[test]
    fn test_push_back_rereads() {
        let mut reader = LineReader::new(Cursor::new("a\nb"));
        let (n, line) = reader.next_line().unwrap().unwrap();
        reader.push_back(n, line);
        assert_eq!(reader.next_line().unwrap(), Some((1, "a".to_string())));
        assert_eq!(reader.next_line().unwrap(), Some((2, "b".to_string())));
    }

    #[test]
    fn test_iterator_surface() {
        let reader = LineReader::new(Cursor::new("x\ny"));
        let lines: Vec<_> = reader.filter_map(|r| r.ok()).map(|(_, l)| l).collect();
        assert_eq!(lines, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_with_capacity() {
        let mut reader = LineReader::with_capacity(Cursor::new("long line content"), 4);
        assert_eq!(
            reader.next_line().unwrap(),
            Some((1, "long line content".to_string()))
        );
    }
}
