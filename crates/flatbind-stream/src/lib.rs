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

//! Record transports for FLATBIND.
//!
//! Implements the [`flatbind_core::RecordReader`] and
//! [`flatbind_core::RecordWriter`] seams for the three stream framings:
//!
//! - **Delimited / CSV** — tokenization over the `csv` crate, with
//!   configurable separator, quote, and escape characters
//! - **Fixed-length** — one line per record, with line-number tracking
//! - **XML** — one element subtree per record over `quick-xml` events
//!
//! # Examples
//!
//! ```
//! use flatbind_core::{DelimitedOptions, RecordReader};
//! use flatbind_stream::DelimitedReader;
//! use std::io::Cursor;
//!
//! let options = DelimitedOptions {
//!     delimiter: '|',
//!     ..Default::default()
//! };
//! let mut reader = DelimitedReader::new(Cursor::new("H|1\nD|a\n"), &options).unwrap();
//! let (line, record) = reader.read().unwrap().unwrap();
//! assert_eq!(line, 1);
//! ```

mod delimited;
mod error;
mod fixed;
mod reader;
mod xml;

pub use delimited::{DelimitedReader, DelimitedWriter};
pub use error::{StreamError, StreamResult};
pub use fixed::{FixedLengthReader, FixedLengthWriter};
pub use reader::LineReader;
pub use xml::{XmlRecordReader, XmlRecordWriter};
