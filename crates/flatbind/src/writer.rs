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

//! The write-side driver: dispatches beans into the parser tree.

use flatbind_core::{
    BindError, BindResult, MarshallingContext, ParserTree, RecordWriter, StateMap, StreamLayout,
    Value,
};
use tracing::debug;

/// Writes record objects to a record stream.
///
/// Each bean dispatches through the selector state machine to the first
/// record definition whose class accepts it at the current position, then
/// serializes through that record's segment tree into a raw record handed
/// to the injected [`RecordWriter`]. The marshalling context is cleared
/// after every record regardless of outcome.
pub struct StreamWriter<W: RecordWriter> {
    tree: ParserTree,
    ctx: MarshallingContext,
    writer: W,
}

impl<W: RecordWriter> std::fmt::Debug for StreamWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamWriter").finish_non_exhaustive()
    }
}

impl<W: RecordWriter> StreamWriter<W> {
    /// Compile the layout and open a writer over the transport.
    pub fn open(layout: &StreamLayout, writer: W) -> BindResult<Self> {
        Self::from_tree(ParserTree::compile(layout)?, writer)
    }

    /// Open a writer over an already compiled tree.
    pub fn from_tree(tree: ParserTree, writer: W) -> BindResult<Self> {
        if !tree.mode().can_write() {
            return Err(BindError::configuration(format!(
                "stream '{}' is not configured for writing",
                tree.name()
            )));
        }
        let ctx = MarshallingContext::new(tree.format());
        Ok(Self { tree, ctx, writer })
    }

    /// Write a bean to the record its class dispatches to.
    pub fn write(&mut self, value: &Value) -> BindResult<()> {
        self.write_internal(None, value)
    }

    /// Write a bean to the named record, bypassing class-only dispatch
    /// when several records share a class.
    pub fn write_named(&mut self, record_name: &str, value: &Value) -> BindResult<()> {
        self.write_internal(Some(record_name), value)
    }

    fn write_internal(&mut self, component: Option<&str>, value: &Value) -> BindResult<()> {
        self.ctx
            .set_bean(value.clone(), component.map(str::to_string));
        let result = match self.tree.match_next_write(&self.ctx) {
            Ok(Some(id)) => {
                debug!(record = %self.tree.selector_name(id), "bean dispatched");
                self.tree
                    .marshal(id, &mut self.ctx)
                    .and_then(|_| self.ctx.write_record(&mut self.writer))
            }
            Ok(None) => Err(BindError::unexpected_record(match component {
                Some(name) => format!("record '{}' does not accept the bean here", name),
                None => "no record definition accepts the bean at this position".to_string(),
            })),
            Err(err) => Err(err),
        };
        // One cleared context per record, success or not.
        self.ctx.clear();
        result
    }

    /// Flush buffered output through the transport.
    pub fn flush(&mut self) -> BindResult<()> {
        self.writer.flush()
    }

    /// Finalize the stream: flushes, then fails when any selector is below
    /// its minimum occurrences.
    pub fn close(&mut self) -> BindResult<()> {
        self.flush()?;
        if let Some(unsatisfied) = self.tree.close() {
            let name = self.tree.selector_name(unsatisfied);
            return Err(BindError::too_few_records(format!(
                "stream closed before '{}' satisfied its minimum occurrences",
                name
            ))
            .with_record(name.to_string()));
        }
        Ok(())
    }

    /// Number of records written so far.
    pub fn record_count(&self) -> usize {
        self.ctx.record_count()
    }

    /// The compiled parser tree.
    pub fn tree(&self) -> &ParserTree {
        &self.tree
    }

    /// Consume the driver, returning the transport for finalization.
    pub fn into_writer(self) -> W {
        self.writer
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
