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

//! The runtime parser tree: the selector state machine over groups and
//! records.
//!
//! Selectors live in an arena indexed by [`SelectorId`]; a node refers to
//! its children by index, never by owning pointer, so parent and child can
//! be visited in one mutable traversal. The tree is compiled once from a
//! [`StreamLayout`], reused for every record, and reset between independent
//! reads of the same stream.

mod content;

use crate::config::{AccessMode, NodeLayout, Occurs, StreamFormat, StreamLayout};
use crate::context::{MarshallingContext, UnmarshallingContext};
use crate::error::{BindError, BindResult, InvalidRecord};
use crate::format::RawRecord;
use crate::types::TypeRegistry;
use crate::value::Value;
use content::RecordNode;
use std::collections::BTreeMap;

/// Flat checkpoint state: `"<namespace>.<selector>.count"` keys to counts.
///
/// Unknown keys are ignored on restore; missing known keys are fatal.
pub type StateMap = BTreeMap<String, u64>;

/// Index of a selector in the parser tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorId(usize);

struct GroupState {
    ordered: bool,
    children: Vec<usize>,
    /// Sorted distinct child orders; the cursor indexes into this list.
    orders: Vec<usize>,
    cursor: usize,
    /// Whether an iteration is in flight: a child matched and the group's
    /// count has not rolled yet. The count rolls only when every position
    /// of the iteration is satisfied.
    started: bool,
}

enum NodeKind {
    Group(GroupState),
    Record(RecordNode),
}

struct SelectorNode {
    name: String,
    order: usize,
    min_occurs: usize,
    max_occurs: Option<usize>,
    count: usize,
    kind: NodeKind,
}

enum MatchInput<'a> {
    Read(&'a RawRecord),
    Write {
        bean: &'a Value,
        component: Option<&'a str>,
    },
}

/// The compiled parser tree for one configured stream.
pub struct ParserTree {
    name: String,
    format: StreamFormat,
    mode: AccessMode,
    nodes: Vec<SelectorNode>,
    root: usize,
}

impl std::fmt::Debug for ParserTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserTree")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl ParserTree {
    /// Compile a layout against the global type handler registry.
    pub fn compile(layout: &StreamLayout) -> BindResult<Self> {
        Self::compile_with(layout, &TypeRegistry::global())
    }

    /// Compile a layout against an explicit (typically per-stream) registry.
    pub fn compile_with(layout: &StreamLayout, registry: &TypeRegistry) -> BindResult<Self> {
        if layout.nodes.is_empty() {
            return Err(BindError::configuration(format!(
                "stream '{}' defines no records",
                layout.name
            )));
        }
        validate_occurs(&layout.occurs, &layout.name)?;

        let mut tree = Self {
            name: layout.name.clone(),
            format: layout.format,
            mode: layout.mode,
            nodes: Vec::new(),
            root: 0,
        };
        let root = tree.push_group(layout.name.clone(), 1, layout.occurs, layout.ordered);
        tree.root = root;
        tree.build_children(root, &layout.nodes, layout.format, registry)?;

        // Selector names key checkpoint state; they must be unique.
        let mut names: Vec<&str> = tree.nodes.iter().map(|n| n.name.as_str()).collect();
        names.sort_unstable();
        if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(BindError::configuration(format!(
                "duplicate selector name '{}'",
                dup[0]
            )));
        }
        Ok(tree)
    }

    fn push_group(
        &mut self,
        name: String,
        order: usize,
        occurs: Occurs,
        ordered: bool,
    ) -> usize {
        self.nodes.push(SelectorNode {
            name,
            order,
            min_occurs: occurs.min,
            max_occurs: occurs.max,
            count: 0,
            kind: NodeKind::Group(GroupState {
                ordered,
                children: Vec::new(),
                orders: Vec::new(),
                cursor: 0,
                started: false,
            }),
        });
        self.nodes.len() - 1
    }

    fn build_children(
        &mut self,
        parent: usize,
        children: &[NodeLayout],
        format: StreamFormat,
        registry: &TypeRegistry,
    ) -> BindResult<()> {
        let mut ids = Vec::with_capacity(children.len());
        let mut next_order = 0usize;
        for child in children {
            let order = match child.order() {
                Some(0) => {
                    return Err(BindError::configuration(format!(
                        "selector '{}' has an order of 0; orders start at 1",
                        child.name()
                    )));
                }
                Some(order) => order,
                None => next_order + 1,
            };
            next_order = next_order.max(order);
            match child {
                NodeLayout::Record(record) => {
                    validate_occurs(&record.occurs, &record.name)?;
                    let compiled = RecordNode::compile(record, format, registry)?;
                    self.nodes.push(SelectorNode {
                        name: record.name.clone(),
                        order,
                        min_occurs: record.occurs.min,
                        max_occurs: record.occurs.max,
                        count: 0,
                        kind: NodeKind::Record(compiled),
                    });
                    ids.push(self.nodes.len() - 1);
                }
                NodeLayout::Group(group) => {
                    validate_occurs(&group.occurs, &group.name)?;
                    let gid =
                        self.push_group(group.name.clone(), order, group.occurs, group.ordered);
                    self.build_children(gid, &group.children, format, registry)?;
                    ids.push(gid);
                }
            }
        }

        let mut orders: Vec<usize> = ids.iter().map(|&id| self.nodes[id].order).collect();
        orders.sort_unstable();
        orders.dedup();
        if let NodeKind::Group(group) = &mut self.nodes[parent].kind {
            group.children = ids;
            group.orders = orders;
        }
        Ok(())
    }

    // ==== Accessors ====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// The root selector.
    pub fn root(&self) -> SelectorId {
        SelectorId(self.root)
    }

    /// Find a selector by name.
    pub fn find(&self, name: &str) -> Option<SelectorId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(SelectorId)
    }

    pub fn selector_name(&self, id: SelectorId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn count(&self, id: SelectorId) -> usize {
        self.effective_count(id.0)
    }

    pub fn is_max_occurs_reached(&self, id: SelectorId) -> bool {
        self.nodes[id.0]
            .max_occurs
            .is_some_and(|max| self.effective_count(id.0) >= max)
    }

    /// Occurrences including an in-flight group iteration. A record counts
    /// its matches directly; a group mid-iteration counts that iteration as
    /// begun, so occurrence numbers stay stable at record boundaries.
    fn effective_count(&self, id: usize) -> usize {
        let node = &self.nodes[id];
        match &node.kind {
            NodeKind::Group(group) if group.started => node.count + 1,
            _ => node.count,
        }
    }

    /// Completed occurrences against maxOccurs. Only meaningful for
    /// records; a group's repeat limit is checked after its iteration
    /// rolls.
    fn max_reached(&self, id: usize) -> bool {
        let node = &self.nodes[id];
        node.max_occurs.is_some_and(|max| node.count >= max)
    }

    // ==== Matching ====

    /// Advance the state machine one record on the read side. The raw
    /// record must already be installed on the context.
    pub fn match_next_read(
        &mut self,
        ctx: &UnmarshallingContext,
    ) -> BindResult<Option<SelectorId>> {
        let Some(raw) = ctx.raw() else {
            return Ok(None);
        };
        self.match_node(self.root, &MatchInput::Read(raw))
            .map(|found| found.map(SelectorId))
            .map_err(|e| e.with_line(ctx.line_number()))
    }

    /// Dispatch the context's outbound bean to a record on the write side.
    pub fn match_next_write(
        &mut self,
        ctx: &MarshallingContext,
    ) -> BindResult<Option<SelectorId>> {
        let Some(bean) = ctx.bean() else {
            return Ok(None);
        };
        let input = MatchInput::Write {
            bean,
            component: ctx.component_name(),
        };
        self.match_node(self.root, &input)
            .map(|found| found.map(SelectorId))
    }

    /// Relaxed identification for error recovery: any record whose
    /// identifier accepts the raw record, ordering and counts ignored.
    pub fn match_any(&self, ctx: &UnmarshallingContext) -> Option<SelectorId> {
        let raw = ctx.raw()?;
        self.match_any_node(self.root, raw).map(SelectorId)
    }

    fn match_any_node(&self, id: usize, raw: &RawRecord) -> Option<usize> {
        match &self.nodes[id].kind {
            NodeKind::Record(record) => record.matches(raw).then_some(id),
            NodeKind::Group(group) => group
                .children
                .iter()
                .find_map(|&cid| self.match_any_node(cid, raw)),
        }
    }

    fn match_node(&mut self, id: usize, input: &MatchInput<'_>) -> BindResult<Option<usize>> {
        if matches!(self.nodes[id].kind, NodeKind::Group(_)) {
            return self.match_group(id, input);
        }
        if !self.record_would_match(id, input) {
            return Ok(None);
        }
        if self.max_reached(id) {
            return Err(self.too_many_error(id));
        }
        self.nodes[id].count += 1;
        Ok(Some(id))
    }

    /// Match test without mutating counts. Groups report false; only
    /// records answer directly.
    fn record_would_match(&self, id: usize, input: &MatchInput<'_>) -> bool {
        let node = &self.nodes[id];
        let NodeKind::Record(record) = &node.kind else {
            return false;
        };
        match input {
            MatchInput::Read(raw) => record.matches(raw),
            MatchInput::Write { bean, component } => record.defines(bean, *component, &node.name),
        }
    }

    /// Whether any record below `id` would accept the input, ignoring
    /// ordering. Used to decide whether a repeating group should open a
    /// fresh iteration.
    fn would_match_fresh(&self, id: usize, input: &MatchInput<'_>) -> bool {
        match &self.nodes[id].kind {
            NodeKind::Record(_) => self.record_would_match(id, input),
            NodeKind::Group(group) => group
                .children
                .iter()
                .any(|&cid| self.would_match_fresh(cid, input)),
        }
    }

    fn too_many_error(&self, id: usize) -> BindError {
        let name = &self.nodes[id].name;
        BindError::too_many_records(format!("too many occurrences of record '{}'", name))
            .with_record(name.clone())
    }

    fn match_group(&mut self, id: usize, input: &MatchInput<'_>) -> BindResult<Option<usize>> {
        let (ordered, children, orders, start_cursor) = {
            let NodeKind::Group(group) = &self.nodes[id].kind else {
                return Ok(None);
            };
            (
                group.ordered,
                group.children.clone(),
                group.orders.clone(),
                group.cursor,
            )
        };

        // A group at its repeat limit with no iteration in flight has
        // nothing left to match.
        if !self.group_started(id) && self.max_reached(id) {
            return Ok(None);
        }

        let mut pending: Option<BindError> = None;

        if !ordered {
            for &cid in &children {
                match self.match_node(cid, input) {
                    Ok(Some(found)) => {
                        self.note_group_started(id);
                        return Ok(Some(found));
                    }
                    Ok(None) => {}
                    // A child over its maxOccurs; the error stands only
                    // when no other child takes the record.
                    Err(err) => {
                        if pending.is_none() {
                            pending = Some(err);
                        }
                    }
                }
            }
            return pending.map_or(Ok(None), Err);
        }

        let mut cursor = start_cursor;
        let mut repeated = false;
        loop {
            while cursor < orders.len() {
                let order = orders[cursor];
                let at_pos: Vec<usize> = children
                    .iter()
                    .copied()
                    .filter(|&cid| self.nodes[cid].order == order)
                    .collect();
                for &cid in &at_pos {
                    match self.match_node(cid, input) {
                        Ok(Some(found)) => {
                            self.note_group_started(id);
                            self.set_group_cursor(id, cursor);
                            return Ok(Some(found));
                        }
                        Ok(None) => {}
                        // A child over its maxOccurs exhausts the position;
                        // the error stands only when nothing later matches.
                        Err(err) => {
                            if pending.is_none() {
                                pending = Some(err);
                            }
                        }
                    }
                }
                // Advance only once every child at this position has
                // satisfied its minimum.
                let satisfied = at_pos
                    .iter()
                    .all(|&cid| self.effective_count(cid) >= self.nodes[cid].min_occurs);
                if satisfied {
                    cursor += 1;
                } else {
                    return pending.map_or(Ok(None), Err);
                }
            }

            // Every position is satisfied: the in-flight iteration, if
            // any, is complete. Decide about a further iteration before
            // the roll clears the completed iteration's child state.
            let repeat_possible = !repeated
                && {
                    let node = &self.nodes[id];
                    node.max_occurs
                        .map_or(true, |max| self.effective_count(id) < max)
                }
                && self.would_match_fresh(id, input);
            if !repeat_possible && pending.is_none() {
                // No further iteration is possible. A record the input
                // matches while over its own maxOccurs is the breach to
                // report.
                if let Some(blocked) = self.blocked_record(id, input) {
                    pending = Some(self.too_many_error(blocked));
                }
            }
            self.complete_group_iteration(id);
            if repeat_possible {
                cursor = 0;
                repeated = true;
                continue;
            }
            return pending.map_or(Ok(None), Err);
        }
    }

    /// The first record below `id`, in document order, that the input
    /// matches while the record sits at its own maxOccurs.
    fn blocked_record(&self, id: usize, input: &MatchInput<'_>) -> Option<usize> {
        match &self.nodes[id].kind {
            NodeKind::Record(_) => {
                (self.record_would_match(id, input) && self.max_reached(id)).then_some(id)
            }
            NodeKind::Group(group) => group
                .children
                .iter()
                .find_map(|&cid| self.blocked_record(cid, input)),
        }
    }

    fn group_started(&self, id: usize) -> bool {
        match &self.nodes[id].kind {
            NodeKind::Group(group) => group.started,
            NodeKind::Record(_) => false,
        }
    }

    /// Mark that a child matched in the group's current iteration. The
    /// group's own count rolls later, when the iteration completes.
    fn note_group_started(&mut self, id: usize) {
        if let NodeKind::Group(group) = &mut self.nodes[id].kind {
            group.started = true;
        }
    }

    /// Roll the group's occurrence counter once every position of the
    /// in-flight iteration is satisfied, and clear the completed
    /// iteration's child state so the next one starts fresh. Whenever a
    /// group is not started, its children are zeroed; checkpoint restore
    /// relies on that to tell an in-flight iteration from a completed one.
    fn complete_group_iteration(&mut self, id: usize) {
        let children = {
            let node = &mut self.nodes[id];
            let NodeKind::Group(group) = &mut node.kind else {
                return;
            };
            if !group.started {
                return;
            }
            group.started = false;
            group.cursor = 0;
            let children = group.children.clone();
            node.count += 1;
            children
        };
        for cid in children {
            self.reset_node(cid);
        }
    }

    fn set_group_cursor(&mut self, id: usize, cursor: usize) {
        if let NodeKind::Group(group) = &mut self.nodes[id].kind {
            group.cursor = cursor;
        }
    }

    // ==== Record operations ====

    /// Unmarshal the matched record, producing the bound value or the
    /// complete validation report.
    pub fn unmarshal(
        &self,
        id: SelectorId,
        ctx: &mut UnmarshallingContext,
    ) -> (Option<Value>, Option<InvalidRecord>) {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Record(record) => record.unmarshal(&node.name, ctx),
            NodeKind::Group(_) => (None, None),
        }
    }

    /// Marshal the context's bean through the matched record into the
    /// record buffer.
    pub fn marshal(&self, id: SelectorId, ctx: &mut MarshallingContext) -> BindResult<()> {
        match &self.nodes[id.0].kind {
            NodeKind::Record(record) => record.marshal(ctx),
            NodeKind::Group(_) => Ok(()),
        }
    }

    /// Record the event without binding: logical position advances, the
    /// selector count stands as incremented by the match.
    pub fn skip(&self, _id: SelectorId, ctx: &mut UnmarshallingContext) {
        ctx.record_skipped();
    }

    // ==== Lifecycle ====

    /// Finalization check: the first selector in document order whose
    /// minimum occurrences are unsatisfied, if any.
    pub fn close(&self) -> Option<SelectorId> {
        self.close_node(self.root).map(SelectorId)
    }

    fn close_node(&self, id: usize) -> Option<usize> {
        let node = &self.nodes[id];
        match &node.kind {
            NodeKind::Record(_) => (node.count < node.min_occurs).then_some(id),
            NodeKind::Group(group) => {
                if group.started {
                    // An iteration is in flight; it closes cleanly only if
                    // every child reached its own minimum.
                    for &cid in &group.children {
                        if let Some(found) = self.close_node(cid) {
                            return Some(found);
                        }
                    }
                } else if node.count == 0 {
                    return (node.min_occurs > 0).then_some(id);
                }
                (self.effective_count(id) < node.min_occurs).then_some(id)
            }
        }
    }

    /// Zero all occurrence counters depth-first.
    pub fn reset(&mut self) {
        self.reset_node(self.root);
    }

    fn reset_node(&mut self, id: usize) {
        self.nodes[id].count = 0;
        let children = match &mut self.nodes[id].kind {
            NodeKind::Group(group) => {
                group.cursor = 0;
                group.started = false;
                group.children.clone()
            }
            NodeKind::Record(_) => return,
        };
        for cid in children {
            self.reset_node(cid);
        }
    }

    // ==== Checkpoint state ====

    /// Write every selector's count into the state map under
    /// `"<namespace>.<selector>.count"`. Group counts include an in-flight
    /// iteration, matching what [`count`](Self::count) reports.
    pub fn update_state(&self, namespace: &str, state: &mut StateMap) {
        for i in 0..self.nodes.len() {
            state.insert(
                state_key(namespace, &self.nodes[i].name),
                self.effective_count(i) as u64,
            );
        }
    }

    /// Restore selector counts from a state map. Fails fast when any
    /// expected key is absent; unknown keys are ignored.
    pub fn restore_state(&mut self, namespace: &str, state: &StateMap) -> BindResult<()> {
        for i in 0..self.nodes.len() {
            let key = state_key(namespace, &self.nodes[i].name);
            let count = state.get(&key).ok_or_else(|| {
                BindError::missing_state(format!("missing state information for key '{}'", key))
            })?;
            self.nodes[i].count = *count as usize;
        }
        // Re-derive group cursors from the restored counts.
        for i in 0..self.nodes.len() {
            let (children, orders) = match &self.nodes[i].kind {
                NodeKind::Group(group) => (group.children.clone(), group.orders.clone()),
                NodeKind::Record(_) => continue,
            };
            let started = children.iter().any(|&cid| self.nodes[cid].count > 0);
            let cursor = orders
                .iter()
                .rposition(|&order| {
                    children
                        .iter()
                        .any(|&cid| self.nodes[cid].order == order && self.nodes[cid].count > 0)
                })
                .unwrap_or(0);
            if let NodeKind::Group(group) = &mut self.nodes[i].kind {
                group.started = started;
                group.cursor = cursor;
            }
            // Snapshots carry the in-flight iteration in the group count;
            // hand it back to the started flag.
            if started {
                self.nodes[i].count = self.nodes[i].count.saturating_sub(1);
            }
        }
        Ok(())
    }
}

fn state_key(namespace: &str, name: &str) -> String {
    format!("{}.{}.count", namespace, name)
}

fn validate_occurs(occurs: &Occurs, name: &str) -> BindResult<()> {
    if occurs.max == Some(0) {
        return Err(BindError::configuration(format!(
            "selector '{}' has a maxOccurs of 0 and could never match",
            name
        )));
    }
    if let Some(max) = occurs.max {
        if occurs.min > max {
            return Err(BindError::configuration(format!(
                "selector '{}' has minOccurs {} greater than maxOccurs {}",
                name, occurs.min, max
            )));
        }
    }
    Ok(())
}
