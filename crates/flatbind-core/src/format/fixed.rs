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

//! Fixed-length slicing, padding, and unpadding.
//!
//! Positions and lengths count characters, not bytes. Reads past the end of
//! the record yield empty text rather than an error.

use crate::config::Justify;

/// Extract the `length`-character slice starting at `position`.
pub fn extract(record: &str, position: usize, length: usize) -> String {
    record.chars().skip(position).take(length).collect()
}

/// Character length of a fixed record.
pub fn char_len(record: &str) -> usize {
    record.chars().count()
}

/// Strip padding from the pad side of an extracted field.
///
/// Right-justified fields pad on the left, left-justified on the right.
/// A field consisting entirely of a non-space padding character keeps one
/// character, so numeric zero survives zero-padding.
pub fn unpad(text: &str, padding: char, justify: Justify) -> String {
    let stripped = match justify {
        Justify::Left => text.trim_end_matches(padding),
        Justify::Right => text.trim_start_matches(padding),
    };
    if stripped.is_empty() && !text.is_empty() && padding != ' ' {
        padding.to_string()
    } else {
        stripped.to_string()
    }
}

/// Pad `text` out to `length` characters. Returns `None` when the text is
/// already longer than `length`; the caller decides between truncation and
/// a field error.
pub fn pad(text: &str, length: usize, padding: char, justify: Justify) -> Option<String> {
    let text_len = text.chars().count();
    if text_len > length {
        return None;
    }
    let fill: String = std::iter::repeat(padding).take(length - text_len).collect();
    Some(match justify {
        Justify::Left => format!("{}{}", text, fill),
        Justify::Right => format!("{}{}", fill, text),
    })
}

/// Cut `text` down to `length` characters, honoring justification: a
/// right-justified field keeps its rightmost characters.
pub fn truncate(text: &str, length: usize, justify: Justify) -> String {
    let text_len = text.chars().count();
    if text_len <= length {
        return text.to_string();
    }
    match justify {
        Justify::Left => text.chars().take(length).collect(),
        Justify::Right => text.chars().skip(text_len - length).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== extract tests ====================

    #[test]
    fn test_extract_in_bounds() {
        assert_eq!(extract("abcdef", 1, 3), "bcd");
    }

    #[test]
    fn test_extract_past_eol_is_empty() {
        assert_eq!(extract("abc", 5, 2), "");
    }

    #[test]
    fn test_extract_partial_at_eol() {
        assert_eq!(extract("abc", 2, 5), "c");
    }

    #[test]
    fn test_extract_char_positions() {
        assert_eq!(extract("日本語xy", 1, 2), "本語");
    }

    // ==================== pad tests ====================

    #[test]
    fn test_pad_right_justified_zeroes() {
        assert_eq!(pad("42", 5, '0', Justify::Right).unwrap(), "00042");
    }

    #[test]
    fn test_pad_left_justified_spaces() {
        assert_eq!(pad("ab", 5, ' ', Justify::Left).unwrap(), "ab   ");
    }

    #[test]
    fn test_pad_exact_length() {
        assert_eq!(pad("abcde", 5, ' ', Justify::Left).unwrap(), "abcde");
    }

    #[test]
    fn test_pad_overflow_returns_none() {
        assert_eq!(pad("abcdef", 5, ' ', Justify::Left), None);
    }

    // ==================== unpad tests ====================

    #[test]
    fn test_unpad_right_justified() {
        assert_eq!(unpad("00042", '0', Justify::Right), "42");
    }

    #[test]
    fn test_unpad_left_justified() {
        assert_eq!(unpad("ab   ", ' ', Justify::Left), "ab");
    }

    #[test]
    fn test_unpad_all_padding_keeps_one_digit() {
        assert_eq!(unpad("00000", '0', Justify::Right), "0");
    }

    #[test]
    fn test_unpad_all_spaces_is_empty() {
        assert_eq!(unpad("     ", ' ', Justify::Right), "");
    }

    #[test]
    fn test_unpad_empty_input() {
        assert_eq!(unpad("", '0', Justify::Right), "");
    }

    // ==================== truncate tests ====================

    #[test]
    fn test_truncate_left_keeps_prefix() {
        assert_eq!(truncate("abcdef", 4, Justify::Left), "abcd");
    }

    #[test]
    fn test_truncate_right_keeps_suffix() {
        assert_eq!(truncate("abcdef", 4, Justify::Right), "cdef");
    }

    #[test]
    fn test_truncate_noop_when_short() {
        assert_eq!(truncate("ab", 4, Justify::Left), "ab");
    }

    // ==================== round-trip ====================

    #[test]
    fn test_pad_unpad_round_trip() {
        let padded = pad("42", 5, '0', Justify::Right).unwrap();
        assert_eq!(unpad(&padded, '0', Justify::Right), "42");
    }
}
