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

//! FLATBIND — declarative data binding for flat textual record streams.
//!
//! FLATBIND reads and writes delimited, fixed-length, and XML record
//! streams, binding them bidirectionally to record objects through an
//! external mapping description. It targets batch and integration
//! pipelines that exchange structured text with legacy or regulated
//! partners.
//!
//! # Features
//!
//! - **Three framings**: delimited/CSV, fixed-length, and XML streams
//! - **Declarative mapping**: streams, groups, records, segments, and
//!   fields described as plain data and compiled once
//! - **Bidirectional**: the same layout drives reading and writing
//! - **Ordering and cardinality**: ordered groups, minOccurs/maxOccurs
//!   enforcement, and structural close checks
//! - **Complete error reports**: all field failures of a record in one
//!   [`InvalidRecord`] report, in declaration order
//! - **Resumable streams**: selector counts snapshot into a flat key map
//!   for external checkpoint stores
//!
//! # Example
//!
//! A delimited header/detail/trailer batch:
//!
//! ```
//! use flatbind::{BoundRecord, StreamReader};
//! use flatbind_core::{FieldLayout, Occurs, RecordLayout, StreamFormat, StreamLayout};
//! use flatbind_stream::DelimitedReader;
//! use std::io::Cursor;
//!
//! let layout = StreamLayout::new("batch", StreamFormat::Delimited)
//!     .delimiter('|')
//!     .record(
//!         RecordLayout::new("header")
//!             .occurs(Occurs::new(1, Some(1)))
//!             .field(FieldLayout::new("tag").at(0).rid().literal("H"))
//!             .field(FieldLayout::new("batch_id").at(1)),
//!     )
//!     .record(
//!         RecordLayout::new("detail")
//!             .occurs(Occurs::unbounded(0))
//!             .field(FieldLayout::new("tag").at(0).rid().literal("D"))
//!             .field(FieldLayout::new("code").at(1)),
//!     );
//!
//! let input = "H|1\nD|a\nD|b\n";
//! let transport = DelimitedReader::new(Cursor::new(input), &layout.delimited).unwrap();
//! let mut reader = StreamReader::open(&layout, transport).unwrap();
//!
//! let mut names = Vec::new();
//! while let Some(BoundRecord { record_name, .. }) = reader.read().unwrap() {
//!     names.push(record_name);
//! }
//! assert_eq!(names, vec!["header", "detail", "detail"]);
//! reader.close().unwrap();
//! ```

mod reader;
mod writer;

pub use reader::{BoundRecord, StreamReader};
pub use writer::StreamWriter;

// The full mapping and engine surface.
pub use flatbind_core::{
    AccessMode, Bean, BindError, BindErrorKind, BindResult, DelimitedOptions, FieldLayout,
    GroupLayout, InvalidRecord, Justify, LoadedMapping, Mapping, MappingLoader, MappingResolver,
    NamedAccessor, NodeLayout, Occurs, ParserTree, PropertyAccessor, PropertyLayout, RawRecord,
    RecordLayout, RecordReader, RecordWriter, SegmentLayout, SelectorId, StateMap, StreamFormat,
    StreamLayout, TypeHandler, TypeRegistry, Value, ValueType, VecReader, VecWriter, XmlElement,
    XmlStreamOptions, XmlType,
};

/// Transport implementations for the three stream framings.
pub mod transport {
    pub use flatbind_stream::{
        DelimitedReader, DelimitedWriter, FixedLengthReader, FixedLengthWriter, LineReader,
        StreamError, StreamResult, XmlRecordReader, XmlRecordWriter,
    };
}
