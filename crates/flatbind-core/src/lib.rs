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

//! Core engine for FLATBIND: declarative data binding for flat textual
//! record streams.
//!
//! This crate holds the parser tree that binds delimited, fixed-length, and
//! XML record streams to record objects: the selector state machine over
//! groups and records, the segment/field composition inside a record, the
//! type handler registry, and the marshalling/unmarshalling contexts.
//!
//! # Architecture
//!
//! A [`config::StreamLayout`] describes a stream declaratively. Compiling
//! it yields a [`tree::ParserTree`], the runtime state machine that decides
//! which record definition matches (or emits) next and transforms raw
//! records to [`Value`]s and back through typed converters.
//!
//! I/O stays behind the [`transport::RecordReader`] and
//! [`transport::RecordWriter`] traits; the engine itself never opens files
//! or sockets, and every operation runs synchronously relative to its
//! caller. A parser tree and its contexts form one logical actor: one
//! stream instance is driven by one thread at a time, while distinct
//! streams may run on distinct threads because type handlers are stateless.
//!
//! # Example
//!
//! ```
//! use flatbind_core::config::{FieldLayout, RecordLayout, StreamFormat, StreamLayout};
//! use flatbind_core::context::UnmarshallingContext;
//! use flatbind_core::format::RawRecord;
//! use flatbind_core::tree::ParserTree;
//!
//! let layout = StreamLayout::new("orders", StreamFormat::Delimited).record(
//!     RecordLayout::new("order")
//!         .field(FieldLayout::new("id").at(0))
//!         .field(FieldLayout::new("item").at(1)),
//! );
//! let mut tree = ParserTree::compile(&layout).unwrap();
//!
//! let mut ctx = UnmarshallingContext::new();
//! ctx.begin_record(
//!     RawRecord::Delimited(vec!["7".to_string(), "widget".to_string()]),
//!     1,
//! );
//! let id = tree.match_next_read(&ctx).unwrap().unwrap();
//! let (value, report) = tree.unmarshal(id, &mut ctx);
//! assert!(report.is_none());
//! let bean = value.unwrap();
//! assert_eq!(
//!     bean.as_record().unwrap().get("item").unwrap().as_str(),
//!     Some("widget")
//! );
//! ```

pub mod accessor;
pub mod config;
pub mod context;
mod error;
pub mod format;
pub mod transport;
pub mod tree;
pub mod types;
mod value;

pub use accessor::{NamedAccessor, PropertyAccessor};
pub use config::{
    AccessMode, DelimitedOptions, FieldLayout, GroupLayout, Justify, LoadedMapping, Mapping,
    MappingLoader, MappingResolver, NodeLayout, Occurs, PropertyLayout, RecordLayout,
    SegmentLayout, StreamFormat, StreamLayout, XmlStreamOptions, XmlType,
};
pub use context::{MarshallingContext, UnmarshallingContext};
pub use error::{BindError, BindErrorKind, BindResult, InvalidRecord};
pub use format::{RawRecord, RecordFraming, XmlElement};
pub use transport::{RecordReader, RecordWriter, VecReader, VecWriter};
pub use tree::{ParserTree, SelectorId, StateMap};
pub use types::{TypeHandler, TypeRegistry, ValueType};
pub use value::{Bean, Value};
