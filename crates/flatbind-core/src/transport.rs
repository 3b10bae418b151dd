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

//! The transport seam: raw-record producers and consumers.
//!
//! The engine never opens files or sockets. All I/O happens behind these
//! two traits; the `flatbind-stream` crate supplies implementations for the
//! delimited, fixed-length, and XML framings.

use crate::error::BindResult;
use crate::format::RawRecord;

/// Yields one raw record at a time, with the line number it started on.
pub trait RecordReader {
    /// Read the next raw record, or `None` at end of stream.
    fn read(&mut self) -> BindResult<Option<(usize, RawRecord)>>;
}

/// Consumes one raw record at a time.
pub trait RecordWriter {
    /// Write one raw record downstream.
    fn write(&mut self, record: &RawRecord) -> BindResult<()>;

    /// Flush buffered output to the underlying sink.
    fn flush(&mut self) -> BindResult<()>;
}

/// An in-memory reader over pre-framed records, for tests and replay.
#[derive(Debug, Default)]
pub struct VecReader {
    records: std::collections::VecDeque<(usize, RawRecord)>,
}

impl VecReader {
    pub fn new(records: impl IntoIterator<Item = RawRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .enumerate()
                .map(|(i, r)| (i + 1, r))
                .collect(),
        }
    }
}

impl RecordReader for VecReader {
    fn read(&mut self) -> BindResult<Option<(usize, RawRecord)>> {
        Ok(self.records.pop_front())
    }
}

/// An in-memory writer collecting raw records, for tests and buffering.
#[derive(Debug, Default)]
pub struct VecWriter {
    pub records: Vec<RawRecord>,
}

impl VecWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordWriter for VecWriter {
    fn write(&mut self, record: &RawRecord) -> BindResult<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> BindResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_reader_numbers_records() {
        let mut reader = VecReader::new(vec![
            RawRecord::Fixed("a".to_string()),
            RawRecord::Fixed("b".to_string()),
        ]);
        assert_eq!(
            reader.read().unwrap(),
            Some((1, RawRecord::Fixed("a".to_string())))
        );
        assert_eq!(
            reader.read().unwrap(),
            Some((2, RawRecord::Fixed("b".to_string())))
        );
        assert_eq!(reader.read().unwrap(), None);
    }

    #[test]
    fn test_vec_writer_collects() {
        let mut writer = VecWriter::new();
        writer.write(&RawRecord::Fixed("x".to_string())).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.records.len(), 1);
    }
}
