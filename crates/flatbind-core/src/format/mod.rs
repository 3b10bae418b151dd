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

//! Record-format codecs: how one raw record is framed per stream format.

pub mod delimited;
pub mod fixed;
pub mod xml;

pub use xml::XmlElement;

/// One raw record as produced by a record reader, before binding.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    /// Token list split on the configured delimiter.
    Delimited(Vec<String>),
    /// One line of fixed character positions.
    Fixed(String),
    /// One element subtree.
    Xml(XmlElement),
}

impl RawRecord {
    /// A short description of the framing, for diagnostics.
    pub fn framing_name(&self) -> &'static str {
        match self {
            Self::Delimited(_) => "delimited",
            Self::Fixed(_) => "fixed",
            Self::Xml(_) => "xml",
        }
    }
}

/// Framing constraints a record definition places on the raw record.
///
/// `matches` answers the selector's identification question without touching
/// the context; `validate` repeats the check during unmarshalling and
/// records framing violations as record-level errors.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordFraming {
    Delimited {
        /// Minimum and maximum token counts.
        min_fields: Option<usize>,
        max_fields: Option<usize>,
    },
    Fixed {
        /// Minimum and maximum record lengths in characters.
        min_length: Option<usize>,
        max_length: Option<usize>,
    },
    Xml {
        /// Required element name of the record subtree.
        name: String,
    },
}

impl RecordFraming {
    /// Whether the raw record satisfies the framing constraints.
    pub fn matches(&self, raw: &RawRecord) -> bool {
        match (self, raw) {
            (
                Self::Delimited {
                    min_fields,
                    max_fields,
                },
                RawRecord::Delimited(tokens),
            ) => {
                min_fields.map_or(true, |min| tokens.len() >= min)
                    && max_fields.map_or(true, |max| tokens.len() <= max)
            }
            (
                Self::Fixed {
                    min_length,
                    max_length,
                },
                RawRecord::Fixed(line),
            ) => {
                let len = line.chars().count();
                min_length.map_or(true, |min| len >= min)
                    && max_length.map_or(true, |max| len <= max)
            }
            (Self::Xml { name }, RawRecord::Xml(element)) => element.name == *name,
            _ => false,
        }
    }

    /// Validate framing, returning record-level error messages.
    pub fn validate(&self, raw: &RawRecord) -> Vec<String> {
        let mut errors = Vec::new();
        match (self, raw) {
            (
                Self::Delimited {
                    min_fields,
                    max_fields,
                },
                RawRecord::Delimited(tokens),
            ) => {
                if let Some(min) = min_fields {
                    if tokens.len() < *min {
                        errors.push(format!(
                            "expected at least {} fields, but found {}",
                            min,
                            tokens.len()
                        ));
                    }
                }
                if let Some(max) = max_fields {
                    if tokens.len() > *max {
                        errors.push(format!(
                            "expected at most {} fields, but found {}",
                            max,
                            tokens.len()
                        ));
                    }
                }
            }
            (
                Self::Fixed {
                    min_length,
                    max_length,
                },
                RawRecord::Fixed(line),
            ) => {
                let len = line.chars().count();
                if let Some(min) = min_length {
                    if len < *min {
                        errors.push(format!(
                            "record length {} is less than the minimum of {}",
                            len, min
                        ));
                    }
                }
                if let Some(max) = max_length {
                    if len > *max {
                        errors.push(format!(
                            "record length {} exceeds the maximum of {}",
                            len, max
                        ));
                    }
                }
            }
            (Self::Xml { name }, RawRecord::Xml(element)) => {
                if element.name != *name {
                    errors.push(format!(
                        "expected element '{}', but found '{}'",
                        name, element.name
                    ));
                }
            }
            (framing, raw) => {
                errors.push(format!(
                    "malformed record: {} framing does not accept a {} record",
                    framing.kind_name(),
                    raw.framing_name()
                ));
            }
        }
        errors
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Delimited { .. } => "delimited",
            Self::Fixed { .. } => "fixed",
            Self::Xml { .. } => "xml",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> RawRecord {
        RawRecord::Delimited(items.iter().map(|s| s.to_string()).collect())
    }

    // ==================== Delimited framing tests ====================

    #[test]
    fn test_delimited_field_count_range() {
        let framing = RecordFraming::Delimited {
            min_fields: Some(2),
            max_fields: Some(3),
        };
        assert!(!framing.matches(&tokens(&["a"])));
        assert!(framing.matches(&tokens(&["a", "b"])));
        assert!(framing.matches(&tokens(&["a", "b", "c"])));
        assert!(!framing.matches(&tokens(&["a", "b", "c", "d"])));
    }

    #[test]
    fn test_delimited_validate_messages() {
        let framing = RecordFraming::Delimited {
            min_fields: Some(2),
            max_fields: Some(2),
        };
        let errors = framing.validate(&tokens(&["a"]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("at least 2"));

        let errors = framing.validate(&tokens(&["a", "b", "c"]));
        assert!(errors[0].contains("at most 2"));
    }

    // ==================== Fixed framing tests ====================

    #[test]
    fn test_fixed_length_range() {
        let framing = RecordFraming::Fixed {
            min_length: Some(5),
            max_length: Some(10),
        };
        assert!(!framing.matches(&RawRecord::Fixed("abc".to_string())));
        assert!(framing.matches(&RawRecord::Fixed("abcde".to_string())));
        assert!(!framing.matches(&RawRecord::Fixed("abcdefghijk".to_string())));
    }

    #[test]
    fn test_fixed_length_counts_chars_not_bytes() {
        let framing = RecordFraming::Fixed {
            min_length: Some(3),
            max_length: Some(3),
        };
        assert!(framing.matches(&RawRecord::Fixed("日本語".to_string())));
    }

    #[test]
    fn test_fixed_validate_messages() {
        let framing = RecordFraming::Fixed {
            min_length: Some(5),
            max_length: Some(5),
        };
        let errors = framing.validate(&RawRecord::Fixed("ab".to_string()));
        assert!(errors[0].contains("less than the minimum of 5"));
    }

    // ==================== XML framing tests ====================

    #[test]
    fn test_xml_framing_matches_element_name() {
        let framing = RecordFraming::Xml {
            name: "person".to_string(),
        };
        assert!(framing.matches(&RawRecord::Xml(XmlElement::new("person"))));
        assert!(!framing.matches(&RawRecord::Xml(XmlElement::new("order"))));
    }

    // ==================== Mismatch tests ====================

    #[test]
    fn test_framing_rejects_wrong_raw_kind() {
        let framing = RecordFraming::Fixed {
            min_length: None,
            max_length: None,
        };
        let raw = tokens(&["a"]);
        assert!(!framing.matches(&raw));
        let errors = framing.validate(&raw);
        assert!(errors[0].contains("malformed record"));
    }
}
