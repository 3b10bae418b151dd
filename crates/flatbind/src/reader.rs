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

//! The read-side driver: pulls raw records and drives the parser tree.

use flatbind_core::{
    BindError, BindResult, ParserTree, RecordReader, StateMap, StreamLayout,
    UnmarshallingContext, Value,
};
use tracing::debug;

/// One successfully bound record.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRecord {
    /// Name of the record definition that matched.
    pub record_name: String,
    /// Line the raw record started on (record ordinal for XML).
    pub line: usize,
    /// The bound record object.
    pub value: Value,
}

/// Reads a record stream, yielding bound record objects.
///
/// The reader owns the parser tree and the unmarshalling context; raw
/// records come from the injected [`RecordReader`]. Validation failures are
/// returned per record and do not poison the stream: after an `Err` the
/// next call to [`read`](Self::read) continues with the following record.
pub struct StreamReader<R: RecordReader> {
    tree: ParserTree,
    ctx: UnmarshallingContext,
    reader: R,
    eof_checked: bool,
}

impl<R: RecordReader> std::fmt::Debug for StreamReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReader")
            .field("eof_checked", &self.eof_checked)
            .finish_non_exhaustive()
    }
}

impl<R: RecordReader> StreamReader<R> {
    /// Compile the layout and open a reader over the transport.
    pub fn open(layout: &StreamLayout, reader: R) -> BindResult<Self> {
        Self::from_tree(ParserTree::compile(layout)?, reader)
    }

    /// Open a reader over an already compiled tree, for per-stream type
    /// registries or restored checkpoints.
    pub fn from_tree(tree: ParserTree, reader: R) -> BindResult<Self> {
        if !tree.mode().can_read() {
            return Err(BindError::configuration(format!(
                "stream '{}' is not configured for reading",
                tree.name()
            )));
        }
        Ok(Self {
            tree,
            ctx: UnmarshallingContext::new(),
            reader,
            eof_checked: false,
        })
    }

    /// Read and bind the next record.
    ///
    /// Returns `Ok(None)` at a clean end of stream. An end of stream with
    /// unsatisfied selectors, an unexpected record, a maxOccurs breach, or
    /// a record that fails validation each return an error; the stream
    /// position still advances past the offending record.
    pub fn read(&mut self) -> BindResult<Option<BoundRecord>> {
        let Some((line, raw)) = self.reader.read()? else {
            return self.end_of_stream();
        };
        self.ctx.begin_record(raw, line);

        match self.tree.match_next_read(&self.ctx) {
            Ok(Some(id)) => {
                let record_name = self.tree.selector_name(id).to_string();
                debug!(record = %record_name, line, "record matched");
                let (value, report) = self.tree.unmarshal(id, &mut self.ctx);
                match report {
                    Some(report) => Err(BindError::invalid_record(report)),
                    None => Ok(Some(BoundRecord {
                        record_name,
                        line,
                        value: value.unwrap_or(Value::Null),
                    })),
                }
            }
            Ok(None) => {
                let err = self.unexpected_record(line);
                self.ctx.record_skipped();
                Err(err)
            }
            Err(err) => {
                self.ctx.record_skipped();
                Err(err)
            }
        }
    }

    /// Match and count up to `n` records without binding them. Returns the
    /// number actually skipped; the stream may end first.
    pub fn skip(&mut self, n: usize) -> BindResult<usize> {
        let mut skipped = 0;
        while skipped < n {
            let Some((line, raw)) = self.reader.read()? else {
                break;
            };
            self.ctx.begin_record(raw, line);
            match self.tree.match_next_read(&self.ctx) {
                Ok(Some(id)) => {
                    self.tree.skip(id, &mut self.ctx);
                    skipped += 1;
                }
                Ok(None) => {
                    let err = self.unexpected_record(line);
                    self.ctx.record_skipped();
                    return Err(err);
                }
                Err(err) => {
                    self.ctx.record_skipped();
                    return Err(err);
                }
            }
        }
        Ok(skipped)
    }

    fn end_of_stream(&mut self) -> BindResult<Option<BoundRecord>> {
        if !self.eof_checked {
            self.eof_checked = true;
            self.check_satisfied()?;
        }
        Ok(None)
    }

    /// Classify an unmatched record through the relaxed identifier scan.
    fn unexpected_record(&self, line: usize) -> BindError {
        match self.tree.match_any(&self.ctx) {
            Some(id) => {
                let name = self.tree.selector_name(id);
                BindError::unexpected_record(format!(
                    "record '{}' is out of order at line {}",
                    name, line
                ))
                .with_record(name.to_string())
                .with_line(line)
            }
            None => BindError::unexpected_record(format!("unidentifiable record at line {}", line))
                .with_line(line),
        }
    }

    fn check_satisfied(&self) -> BindResult<()> {
        if let Some(unsatisfied) = self.tree.close() {
            let name = self.tree.selector_name(unsatisfied);
            return Err(BindError::unexpected_eof(format!(
                "end of stream before '{}' satisfied its minimum occurrences",
                name
            ))
            .with_record(name.to_string()));
        }
        Ok(())
    }

    /// Finalize the stream: fails when any selector is below its minimum.
    pub fn close(&mut self) -> BindResult<()> {
        self.check_satisfied()
    }

    /// Reset all occurrence counters for an independent re-read.
    pub fn reset(&mut self) {
        self.tree.reset();
        self.ctx = UnmarshallingContext::new();
        self.eof_checked = false;
    }

    /// Line number of the most recent record.
    pub fn line_number(&self) -> usize {
        self.ctx.line_number()
    }

    /// Number of records processed so far, bound or skipped.
    pub fn record_count(&self) -> usize {
        self.ctx.record_count()
    }

    /// The compiled parser tree.
    pub fn tree(&self) -> &ParserTree {
        &self.tree
    }

    /// Snapshot selector counts for an external checkpoint store.
    pub fn update_state(&self, namespace: &str, state: &mut StateMap) {
        self.tree.update_state(namespace, state);
    }

    /// Restore selector counts from a checkpoint snapshot.
    pub fn restore_state(&mut self, namespace: &str, state: &StateMap) -> BindResult<()> {
        self.tree.restore_state(namespace, state)
    }
}
