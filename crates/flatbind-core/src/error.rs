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

//! Error types for record binding.

use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// The kind of error that occurred during binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindErrorKind {
    /// Malformed raw record or record length out of bounds.
    Framing,
    /// No selector accepts the record at the current position.
    UnexpectedRecord,
    /// A selector matched more often than its maxOccurs allows.
    TooManyRecords,
    /// A selector closed before reaching its minOccurs.
    TooFewRecords,
    /// End of stream with unsatisfied selectors.
    UnexpectedEof,
    /// One or more field or record validation failures.
    InvalidRecord,
    /// Malformed mapping, unresolved import, or bad layout.
    Configuration,
    /// Import cycle detected while resolving mapping resources.
    CircularImport,
    /// No type handler registered for a field.
    UnknownTypeHandler,
    /// Checkpoint restore with missing state keys.
    MissingState,
    /// Underlying reader/writer failure. Never recovered.
    Io,
}

impl fmt::Display for BindErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Framing => write!(f, "FramingError"),
            Self::UnexpectedRecord => write!(f, "UnexpectedRecordError"),
            Self::TooManyRecords => write!(f, "TooManyRecordsError"),
            Self::TooFewRecords => write!(f, "TooFewRecordsError"),
            Self::UnexpectedEof => write!(f, "UnexpectedEofError"),
            Self::InvalidRecord => write!(f, "InvalidRecordError"),
            Self::Configuration => write!(f, "ConfigurationError"),
            Self::CircularImport => write!(f, "CircularImportError"),
            Self::UnknownTypeHandler => write!(f, "UnknownTypeHandlerError"),
            Self::MissingState => write!(f, "MissingStateError"),
            Self::Io => write!(f, "IOError"),
        }
    }
}

/// An error raised while reading or writing a record stream.
///
/// Field-level validation failures are not raised through this type one at a
/// time. They accumulate on the unmarshalling context and surface as a single
/// [`InvalidRecord`] report carried by the [`BindErrorKind::InvalidRecord`]
/// variant once the record completes; for those errors `message` holds the
/// report's full rendered text.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BindError {
    /// The kind of error.
    pub kind: BindErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Line number of the offending record (1-based, 0 when unknown).
    pub line: usize,
    /// Name of the record definition in effect, when known.
    pub record_name: Option<String>,
    /// The full validation report for invalid records.
    pub report: Option<InvalidRecord>,
}

impl BindError {
    /// Create a new error.
    pub fn new(kind: BindErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: 0,
            record_name: None,
            report: None,
        }
    }

    /// Attach the line number of the offending record.
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Attach the name of the record definition in effect.
    pub fn with_record(mut self, name: impl Into<String>) -> Self {
        self.record_name = Some(name.into());
        self
    }

    // Convenience constructors for each error kind
    pub fn framing(message: impl Into<String>) -> Self {
        Self::new(BindErrorKind::Framing, message)
    }

    pub fn unexpected_record(message: impl Into<String>) -> Self {
        Self::new(BindErrorKind::UnexpectedRecord, message)
    }

    pub fn too_many_records(message: impl Into<String>) -> Self {
        Self::new(BindErrorKind::TooManyRecords, message)
    }

    pub fn too_few_records(message: impl Into<String>) -> Self {
        Self::new(BindErrorKind::TooFewRecords, message)
    }

    pub fn unexpected_eof(message: impl Into<String>) -> Self {
        Self::new(BindErrorKind::UnexpectedEof, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(BindErrorKind::Configuration, message)
    }

    pub fn circular_import(message: impl Into<String>) -> Self {
        Self::new(BindErrorKind::CircularImport, message)
    }

    pub fn unknown_type_handler(message: impl Into<String>) -> Self {
        Self::new(BindErrorKind::UnknownTypeHandler, message)
    }

    pub fn missing_state(message: impl Into<String>) -> Self {
        Self::new(BindErrorKind::MissingState, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(BindErrorKind::Io, message)
    }

    /// Wrap a completed validation report. The error displays as the
    /// report's stable diagnostic text.
    pub fn invalid_record(report: InvalidRecord) -> Self {
        Self {
            kind: BindErrorKind::InvalidRecord,
            message: report.to_string(),
            line: report.line,
            record_name: Some(report.record_name.clone()),
            report: Some(report),
        }
    }
}

impl From<std::io::Error> for BindError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

/// Result type for binding operations.
pub type BindResult<T> = Result<T, BindError>;

/// The validation report for a single rejected record.
///
/// Record-level errors come first, then field errors in field declaration
/// order. The rendered text layout is stable and consumed by downstream
/// tooling: a header line, then one line per error prefixed with ` ==> `,
/// field errors additionally prefixed with `Invalid '<field>':  `.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecord {
    /// Name of the record definition that rejected the input.
    pub record_name: String,
    /// Line number of the raw record (1-based, 0 when unknown).
    pub line: usize,
    /// Record-level errors (framing, identification).
    pub record_errors: Vec<String>,
    /// Field errors keyed by field name, in declaration order.
    pub field_errors: IndexMap<String, Vec<String>>,
}

impl InvalidRecord {
    /// Create an empty report for the named record.
    pub fn new(record_name: impl Into<String>, line: usize) -> Self {
        Self {
            record_name: record_name.into(),
            line,
            record_errors: Vec::new(),
            field_errors: IndexMap::new(),
        }
    }

    /// Returns true if the report carries no errors at all.
    pub fn is_empty(&self) -> bool {
        self.record_errors.is_empty() && self.field_errors.is_empty()
    }

    /// Total number of errors in the report.
    pub fn len(&self) -> usize {
        self.record_errors.len() + self.field_errors.values().map(Vec::len).sum::<usize>()
    }
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid record '{}'", self.record_name)?;
        for error in &self.record_errors {
            write!(f, "\n ==> {}", error)?;
        }
        for (field, errors) in &self.field_errors {
            for error in errors {
                write!(f, "\n ==> Invalid '{}':  {}", field, error)?;
            }
        }
        Ok(())
    }
}
