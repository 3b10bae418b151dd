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

//! Error types for record transports.

use flatbind_core::BindError;
use thiserror::Error;

/// An error raised while tokenizing or emitting raw records.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tokenization failure in the delimited transport.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Event-level failure in the XML transport.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Structurally invalid input that the transport cannot frame.
    #[error("malformed record at line {line}: {message}")]
    Malformed { line: usize, message: String },
}

impl StreamError {
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }
}

impl From<StreamError> for BindError {
    fn from(err: StreamError) -> Self {
        match &err {
            StreamError::Malformed { .. } => BindError::framing(err.to_string()),
            _ => BindError::io(err.to_string()),
        }
    }
}

/// Result type for transport operations.
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;
    use flatbind_core::BindErrorKind;

    #[test]
    fn test_io_conversion() {
        let err: StreamError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        let bind: BindError = err.into();
        assert_eq!(bind.kind, BindErrorKind::Io);
    }

    #[test]
    fn test_malformed_becomes_framing() {
        let err = StreamError::malformed(3, "unterminated quote");
        let bind: BindError = err.into();
        assert_eq!(bind.kind, BindErrorKind::Framing);
        assert!(bind.message.contains("line 3"));
    }
}
