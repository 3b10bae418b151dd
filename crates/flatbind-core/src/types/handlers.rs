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

//! Built-in type handlers.

use super::{TypeHandler, ValueType};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use uuid::Uuid;

fn type_mismatch(expected: ValueType, value: &Value) -> String {
    format!("cannot format {:?} as {}", value, expected)
}

/// Boolean codec accepting `true`/`false` and `1`/`0`.
#[derive(Debug, Clone, Default)]
pub struct BoolHandler;

impl TypeHandler for BoolHandler {
    fn target(&self) -> ValueType {
        ValueType::Bool
    }

    fn parse(&self, text: &str) -> Result<Value, String> {
        match text {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("invalid boolean '{}'", text)),
        }
    }

    fn format(&self, value: &Value) -> Result<String, String> {
        match value {
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(type_mismatch(ValueType::Bool, other)),
        }
    }
}

/// Signed integer codec for a fixed width.
#[derive(Debug, Clone)]
pub struct IntHandler {
    width: ValueType,
    min: i64,
    max: i64,
}

impl IntHandler {
    pub fn new(width: ValueType) -> Self {
        let (min, max) = match width {
            ValueType::I8 => (i8::MIN as i64, i8::MAX as i64),
            ValueType::I16 => (i16::MIN as i64, i16::MAX as i64),
            ValueType::I32 => (i32::MIN as i64, i32::MAX as i64),
            _ => (i64::MIN, i64::MAX),
        };
        Self { width, min, max }
    }
}

impl TypeHandler for IntHandler {
    fn target(&self) -> ValueType {
        self.width
    }

    fn parse(&self, text: &str) -> Result<Value, String> {
        let n: i64 = text
            .parse()
            .map_err(|_| format!("invalid integer '{}'", text))?;
        if n < self.min || n > self.max {
            return Err(format!("integer '{}' out of range for {}", text, self.width));
        }
        Ok(Value::Int(n))
    }

    fn format(&self, value: &Value) -> Result<String, String> {
        match value.as_int() {
            Some(n) => Ok(n.to_string()),
            None => Err(type_mismatch(self.width, value)),
        }
    }
}

/// Unsigned integer codec for a fixed width.
#[derive(Debug, Clone)]
pub struct UIntHandler {
    width: ValueType,
    max: u64,
}

impl UIntHandler {
    pub fn new(width: ValueType) -> Self {
        let max = match width {
            ValueType::U8 => u8::MAX as u64,
            ValueType::U16 => u16::MAX as u64,
            ValueType::U32 => u32::MAX as u64,
            _ => u64::MAX,
        };
        Self { width, max }
    }
}

impl TypeHandler for UIntHandler {
    fn target(&self) -> ValueType {
        self.width
    }

    fn parse(&self, text: &str) -> Result<Value, String> {
        let n: u64 = text
            .parse()
            .map_err(|_| format!("invalid unsigned integer '{}'", text))?;
        if n > self.max {
            return Err(format!("integer '{}' out of range for {}", text, self.width));
        }
        Ok(Value::UInt(n))
    }

    fn format(&self, value: &Value) -> Result<String, String> {
        match value.as_uint() {
            Some(n) => Ok(n.to_string()),
            None => Err(type_mismatch(self.width, value)),
        }
    }
}

/// Floating-point codec.
#[derive(Debug, Clone)]
pub struct FloatHandler {
    width: ValueType,
}

impl FloatHandler {
    pub fn new(width: ValueType) -> Self {
        Self { width }
    }
}

impl TypeHandler for FloatHandler {
    fn target(&self) -> ValueType {
        self.width
    }

    fn parse(&self, text: &str) -> Result<Value, String> {
        let n: f64 = text
            .parse()
            .map_err(|_| format!("invalid number '{}'", text))?;
        if self.width == ValueType::F32 && n.is_finite() && (n as f32).is_infinite() {
            return Err(format!("number '{}' out of range for f32", text));
        }
        Ok(Value::Float(n))
    }

    fn format(&self, value: &Value) -> Result<String, String> {
        match value.as_float() {
            Some(n) => Ok(n.to_string()),
            None => Err(type_mismatch(self.width, value)),
        }
    }
}

/// Decimal codec with a fixed-fraction pattern such as `0.00`.
///
/// The pattern fixes the number of fraction digits emitted on format.
/// Parsing accepts any plain decimal text.
#[derive(Debug, Clone, Default)]
pub struct DecimalHandler {
    scale: Option<usize>,
}

impl DecimalHandler {
    pub fn new() -> Self {
        Self { scale: None }
    }

    /// Build from a pattern; the scale is the digit count after the point.
    pub fn with_scale_pattern(pattern: &str) -> Result<Self, String> {
        let scale = match pattern.split_once('.') {
            Some((whole, frac)) => {
                if !whole.chars().all(|c| c == '0' || c == '#')
                    || !frac.chars().all(|c| c == '0')
                {
                    return Err(format!("invalid decimal pattern '{}'", pattern));
                }
                frac.len()
            }
            None => 0,
        };
        Ok(Self { scale: Some(scale) })
    }
}

impl TypeHandler for DecimalHandler {
    fn target(&self) -> ValueType {
        ValueType::Decimal
    }

    fn parse(&self, text: &str) -> Result<Value, String> {
        let n: f64 = text
            .parse()
            .map_err(|_| format!("invalid decimal '{}'", text))?;
        Ok(Value::Float(n))
    }

    fn format(&self, value: &Value) -> Result<String, String> {
        let n = value
            .as_float()
            .ok_or_else(|| type_mismatch(ValueType::Decimal, value))?;
        match self.scale {
            Some(scale) => Ok(format!("{:.*}", scale, n)),
            None => Ok(n.to_string()),
        }
    }

    fn with_pattern(&self, pattern: &str) -> Option<Arc<dyn TypeHandler>> {
        DecimalHandler::with_scale_pattern(pattern)
            .ok()
            .map(|h| Arc::new(h) as Arc<dyn TypeHandler>)
    }
}

/// Single-character codec.
#[derive(Debug, Clone, Default)]
pub struct CharHandler;

impl TypeHandler for CharHandler {
    fn target(&self) -> ValueType {
        ValueType::Char
    }

    fn parse(&self, text: &str) -> Result<Value, String> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Value::Char(c)),
            _ => Err(format!("invalid character '{}'", text)),
        }
    }

    fn format(&self, value: &Value) -> Result<String, String> {
        match value {
            Value::Char(c) => Ok(c.to_string()),
            other => Err(type_mismatch(ValueType::Char, other)),
        }
    }
}

/// Identity codec for strings.
#[derive(Debug, Clone, Default)]
pub struct StringHandler;

impl TypeHandler for StringHandler {
    fn target(&self) -> ValueType {
        ValueType::String
    }

    fn parse(&self, text: &str) -> Result<Value, String> {
        Ok(Value::String(text.to_string()))
    }

    fn format(&self, value: &Value) -> Result<String, String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            // Anything scalar renders through Display on the way out.
            Value::Null => Ok(String::new()),
            other => Ok(other.to_string()),
        }
    }
}

/// Calendar date codec with a strftime pattern.
#[derive(Debug, Clone)]
pub struct DateHandler {
    pattern: String,
}

impl DateHandler {
    pub fn new() -> Self {
        Self::with_format("%Y-%m-%d")
    }

    pub fn with_format(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl Default for DateHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeHandler for DateHandler {
    fn target(&self) -> ValueType {
        ValueType::Date
    }

    fn parse(&self, text: &str) -> Result<Value, String> {
        NaiveDate::parse_from_str(text, &self.pattern)
            .map(Value::Date)
            .map_err(|_| format!("invalid date '{}' for pattern '{}'", text, self.pattern))
    }

    fn format(&self, value: &Value) -> Result<String, String> {
        match value {
            Value::Date(d) => Ok(d.format(&self.pattern).to_string()),
            other => Err(type_mismatch(ValueType::Date, other)),
        }
    }

    fn with_pattern(&self, pattern: &str) -> Option<Arc<dyn TypeHandler>> {
        Some(Arc::new(DateHandler::with_format(pattern)))
    }
}

/// Wall-clock time codec with a strftime pattern.
#[derive(Debug, Clone)]
pub struct TimeHandler {
    pattern: String,
}

impl TimeHandler {
    pub fn new() -> Self {
        Self::with_format("%H:%M:%S")
    }

    pub fn with_format(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl Default for TimeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeHandler for TimeHandler {
    fn target(&self) -> ValueType {
        ValueType::Time
    }

    fn parse(&self, text: &str) -> Result<Value, String> {
        NaiveTime::parse_from_str(text, &self.pattern)
            .map(Value::Time)
            .map_err(|_| format!("invalid time '{}' for pattern '{}'", text, self.pattern))
    }

    fn format(&self, value: &Value) -> Result<String, String> {
        match value {
            Value::Time(t) => Ok(t.format(&self.pattern).to_string()),
            other => Err(type_mismatch(ValueType::Time, other)),
        }
    }

    fn with_pattern(&self, pattern: &str) -> Option<Arc<dyn TypeHandler>> {
        Some(Arc::new(TimeHandler::with_format(pattern)))
    }
}

/// Combined date-time codec with a strftime pattern.
#[derive(Debug, Clone)]
pub struct DateTimeHandler {
    pattern: String,
}

impl DateTimeHandler {
    pub fn new() -> Self {
        Self::with_format("%Y-%m-%dT%H:%M:%S")
    }

    pub fn with_format(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl Default for DateTimeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeHandler for DateTimeHandler {
    fn target(&self) -> ValueType {
        ValueType::DateTime
    }

    fn parse(&self, text: &str) -> Result<Value, String> {
        NaiveDateTime::parse_from_str(text, &self.pattern)
            .map(Value::DateTime)
            .map_err(|_| format!("invalid datetime '{}' for pattern '{}'", text, self.pattern))
    }

    fn format(&self, value: &Value) -> Result<String, String> {
        match value {
            Value::DateTime(dt) => Ok(dt.format(&self.pattern).to_string()),
            other => Err(type_mismatch(ValueType::DateTime, other)),
        }
    }

    fn with_pattern(&self, pattern: &str) -> Option<Arc<dyn TypeHandler>> {
        Some(Arc::new(DateTimeHandler::with_format(pattern)))
    }
}

/// UUID codec in hyphenated form.
#[derive(Debug, Clone, Default)]
pub struct UuidHandler;

impl TypeHandler for UuidHandler {
    fn target(&self) -> ValueType {
        ValueType::Uuid
    }

    fn parse(&self, text: &str) -> Result<Value, String> {
        Uuid::parse_str(text)
            .map(Value::Uuid)
            .map_err(|_| format!("invalid UUID '{}'", text))
    }

    fn format(&self, value: &Value) -> Result<String, String> {
        match value {
            Value::Uuid(u) => Ok(u.hyphenated().to_string()),
            other => Err(type_mismatch(ValueType::Uuid, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Bool tests ====================

    #[test]
    fn test_bool_parse() {
        let h = BoolHandler;
        assert_eq!(h.parse("true").unwrap(), Value::Bool(true));
        assert_eq!(h.parse("1").unwrap(), Value::Bool(true));
        assert_eq!(h.parse("false").unwrap(), Value::Bool(false));
        assert_eq!(h.parse("0").unwrap(), Value::Bool(false));
        assert!(h.parse("yes").is_err());
    }

    #[test]
    fn test_bool_format() {
        let h = BoolHandler;
        assert_eq!(h.format(&Value::Bool(true)).unwrap(), "true");
        assert!(h.format(&Value::Int(1)).is_err());
    }

    // ==================== Integer tests ====================

    #[test]
    fn test_int_parse_in_range() {
        let h = IntHandler::new(ValueType::I8);
        assert_eq!(h.parse("-128").unwrap(), Value::Int(-128));
        assert_eq!(h.parse("127").unwrap(), Value::Int(127));
    }

    #[test]
    fn test_int_parse_out_of_range() {
        let h = IntHandler::new(ValueType::I8);
        assert!(h.parse("128").is_err());
        assert!(h.parse("-129").is_err());
    }

    #[test]
    fn test_int_parse_garbage() {
        let h = IntHandler::new(ValueType::I32);
        assert!(h.parse("12a").is_err());
        assert!(h.parse("").is_err());
    }

    #[test]
    fn test_int_format() {
        let h = IntHandler::new(ValueType::I64);
        assert_eq!(h.format(&Value::Int(-42)).unwrap(), "-42");
        assert!(h.format(&Value::String("x".to_string())).is_err());
    }

    #[test]
    fn test_uint_parse() {
        let h = UIntHandler::new(ValueType::U8);
        assert_eq!(h.parse("255").unwrap(), Value::UInt(255));
        assert!(h.parse("256").is_err());
        assert!(h.parse("-1").is_err());
    }

    #[test]
    fn test_uint_format() {
        let h = UIntHandler::new(ValueType::U32);
        assert_eq!(h.format(&Value::UInt(7)).unwrap(), "7");
        assert_eq!(h.format(&Value::Int(7)).unwrap(), "7");
        assert!(h.format(&Value::Int(-7)).is_err());
    }

    // ==================== Float and decimal tests ====================

    #[test]
    fn test_float_parse() {
        let h = FloatHandler::new(ValueType::F64);
        assert_eq!(h.parse("2.5").unwrap(), Value::Float(2.5));
        assert!(h.parse("abc").is_err());
    }

    #[test]
    fn test_f32_overflow_rejected() {
        let h = FloatHandler::new(ValueType::F32);
        assert!(h.parse("1e200").is_err());
        assert!(h.parse("1.5").is_ok());
    }

    #[test]
    fn test_decimal_pattern_scale() {
        let h = DecimalHandler::with_scale_pattern("0.00").unwrap();
        assert_eq!(h.format(&Value::Float(1.5)).unwrap(), "1.50");
        assert_eq!(h.format(&Value::Int(3)).unwrap(), "3.00");
    }

    #[test]
    fn test_decimal_bad_pattern() {
        assert!(DecimalHandler::with_scale_pattern("x.yz").is_err());
    }

    #[test]
    fn test_decimal_with_pattern_derivation() {
        let base = DecimalHandler::new();
        let derived = base.with_pattern("0.000").unwrap();
        assert_eq!(derived.format(&Value::Float(2.0)).unwrap(), "2.000");
    }

    // ==================== Char and string tests ====================

    #[test]
    fn test_char_parse() {
        let h = CharHandler;
        assert_eq!(h.parse("x").unwrap(), Value::Char('x'));
        assert!(h.parse("xy").is_err());
        assert!(h.parse("").is_err());
    }

    #[test]
    fn test_string_identity() {
        let h = StringHandler;
        assert_eq!(
            h.parse("hello").unwrap(),
            Value::String("hello".to_string())
        );
        assert_eq!(
            h.format(&Value::String("hello".to_string())).unwrap(),
            "hello"
        );
    }

    #[test]
    fn test_string_formats_null_as_empty() {
        let h = StringHandler;
        assert_eq!(h.format(&Value::Null).unwrap(), "");
    }

    // ==================== Temporal tests ====================

    #[test]
    fn test_date_round_trip() {
        let h = DateHandler::new();
        let v = h.parse("2024-03-09").unwrap();
        assert_eq!(h.format(&v).unwrap(), "2024-03-09");
    }

    #[test]
    fn test_date_custom_pattern() {
        let h = DateHandler::with_format("%d/%m/%Y");
        let v = h.parse("09/03/2024").unwrap();
        assert_eq!(h.format(&v).unwrap(), "09/03/2024");
        assert!(h.parse("2024-03-09").is_err());
    }

    #[test]
    fn test_time_round_trip() {
        let h = TimeHandler::new();
        let v = h.parse("13:45:09").unwrap();
        assert_eq!(h.format(&v).unwrap(), "13:45:09");
    }

    #[test]
    fn test_datetime_round_trip() {
        let h = DateTimeHandler::new();
        let v = h.parse("2024-03-09T13:45:09").unwrap();
        assert_eq!(h.format(&v).unwrap(), "2024-03-09T13:45:09");
    }

    #[test]
    fn test_date_with_pattern_derivation() {
        let base = DateHandler::new();
        let derived = base.with_pattern("%Y%m%d").unwrap();
        let v = derived.parse("20240309").unwrap();
        assert_eq!(derived.format(&v).unwrap(), "20240309");
    }

    // ==================== UUID tests ====================

    #[test]
    fn test_uuid_round_trip() {
        let h = UuidHandler;
        let text = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let v = h.parse(text).unwrap();
        assert_eq!(h.format(&v).unwrap(), text);
    }

    #[test]
    fn test_uuid_invalid() {
        let h = UuidHandler;
        assert!(h.parse("not-a-uuid").is_err());
    }
}
