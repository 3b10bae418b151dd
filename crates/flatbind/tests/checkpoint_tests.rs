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

//! Checkpoint snapshot and restore over the public drivers.

use flatbind::transport::DelimitedReader;
use flatbind::{
    BindErrorKind, FieldLayout, Occurs, RecordLayout, StateMap, StreamFormat, StreamLayout,
    StreamReader,
};
use std::io::Cursor;

fn layout() -> StreamLayout {
    StreamLayout::new("feed", StreamFormat::Delimited).record(
        RecordLayout::new("entry")
            .occurs(Occurs::new(0, Some(6)))
            .field(FieldLayout::new("tag").at(0).rid().literal("R"))
            .field(FieldLayout::new("n").at(1)),
    )
}

fn reader_over(input: &str) -> StreamReader<DelimitedReader<Cursor<Vec<u8>>>> {
    let layout = layout();
    let transport =
        DelimitedReader::new(Cursor::new(input.as_bytes().to_vec()), &layout.delimited).unwrap();
    StreamReader::open(&layout, transport).unwrap()
}

#[test]
fn test_resume_counts_from_snapshot() {
    // Read five records and snapshot.
    let mut first = reader_over("R,1\nR,2\nR,3\nR,4\nR,5\n");
    for _ in 0..5 {
        first.read().unwrap().unwrap();
    }
    let mut state = StateMap::new();
    first.update_state("feed", &mut state);
    assert_eq!(state.get("feed.entry.count"), Some(&5));

    // A fresh tree restored from the snapshot treats the next entry as the
    // sixth, so the seventh breaches maxOccurs.
    let mut resumed = reader_over("R,6\nR,7\n");
    resumed.restore_state("feed", &state).unwrap();
    let entry = resumed.tree().find("entry").unwrap();
    assert_eq!(resumed.tree().count(entry), 5);

    resumed.read().unwrap().unwrap();
    assert_eq!(resumed.tree().count(entry), 6);
    let err = resumed.read().unwrap_err();
    assert_eq!(err.kind, BindErrorKind::TooManyRecords);
}

#[test]
fn test_snapshot_restore_is_identity_on_counts() {
    let mut reader = reader_over("R,1\nR,2\n");
    reader.read().unwrap();
    reader.read().unwrap();

    let mut state = StateMap::new();
    reader.update_state("ns", &mut state);

    let mut other = reader_over("");
    other.restore_state("ns", &state).unwrap();
    let mut state2 = StateMap::new();
    other.update_state("ns", &mut state2);
    assert_eq!(state, state2);
}

#[test]
fn test_restore_missing_key_is_fatal() {
    let mut reader = reader_over("");
    let mut state = StateMap::new();
    reader.update_state("ns", &mut state);
    state.remove("ns.entry.count");
    let err = reader.restore_state("ns", &state).unwrap_err();
    assert_eq!(err.kind, BindErrorKind::MissingState);
}

#[test]
fn test_restore_ignores_unknown_keys() {
    let mut reader = reader_over("");
    let mut state = StateMap::new();
    reader.update_state("ns", &mut state);
    state.insert("ns.entry.window".to_string(), 9);
    state.insert("other.unrelated.count".to_string(), 3);
    assert!(reader.restore_state("ns", &state).is_ok());
}
