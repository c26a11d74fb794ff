//! Cell values and their hashable grouping keys.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::schema::parse_datetime;

/// A single value in a [`Dataset`](super::Dataset) column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value.
    Null,
    /// Floating-point number.
    Number(f64),
    /// Free text, codes and identifiers.
    Text(String),
    /// Date or timestamp.
    Date(NaiveDateTime),
}

impl Cell {
    /// Build a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Build a date cell at midnight.
    pub fn date(date: NaiveDate) -> Self {
        Cell::Date(date.and_time(chrono::NaiveTime::MIN))
    }

    /// True for `Null` and for NaN numbers.
    pub fn is_null(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Number(v) => v.is_nan(),
            _ => false,
        }
    }

    /// True when the cell holds a native number.
    pub fn is_number(&self) -> bool {
        matches!(self, Cell::Number(v) if !v.is_nan())
    }

    /// Coerce to a float, the way `to_numeric(errors="coerce")` would.
    ///
    /// Text is trimmed and parsed; anything unparseable is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if !v.is_nan() => Some(*v),
            Cell::Text(s) => parse_finite(s),
            _ => None,
        }
    }

    /// Coerce to a timestamp, parsing text with the accepted date formats.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Text(s) => parse_datetime(s),
            _ => None,
        }
    }

    /// Render as plain text. Nulls render as the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Number(v) if v.is_nan() => String::new(),
            Cell::Number(v) => format_number(*v),
            Cell::Text(s) => s.clone(),
            Cell::Date(d) => format_datetime(d),
        }
    }

    /// Hashable, totally ordered key used for grouping and counting.
    pub fn key(&self) -> CellKey {
        match self {
            Cell::Null => CellKey::Null,
            Cell::Number(v) if v.is_nan() => CellKey::Null,
            Cell::Number(v) => CellKey::Number(ordered_bits(*v)),
            Cell::Text(s) => CellKey::Text(s.clone()),
            Cell::Date(d) => CellKey::Date(*d),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Null)
    }
}

impl From<&serde_json::Value> for Cell {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Cell::Null,
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            Value::String(s) => Cell::Text(s.clone()),
            Value::Bool(b) => Cell::Text(b.to_string()),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Grouping key for a [`Cell`].
///
/// Numbers are stored as order-preserving bit patterns so the key can be
/// hashed and sorted. NaN maps to `Null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellKey {
    Null,
    Number(i64),
    Text(String),
    Date(NaiveDateTime),
}

impl CellKey {
    /// Convert back to a cell.
    pub fn to_cell(&self) -> Cell {
        match self {
            CellKey::Null => Cell::Null,
            CellKey::Number(bits) => Cell::Number(from_ordered_bits(*bits)),
            CellKey::Text(s) => Cell::Text(s.clone()),
            CellKey::Date(d) => Cell::Date(*d),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellKey::Null)
    }
}

fn ordered_bits(value: f64) -> i64 {
    // -0.0 and 0.0 group together.
    let value = if value == 0.0 { 0.0 } else { value };
    let bits = value.to_bits() as i64;
    bits ^ ((((bits >> 63) as u64) >> 1) as i64)
}

fn from_ordered_bits(key: i64) -> f64 {
    let bits = key ^ ((((key >> 63) as u64) >> 1) as i64);
    f64::from_bits(bits as u64)
}

/// Format a float without a trailing `.0` for integral values.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn format_datetime(value: &NaiveDateTime) -> String {
    if value.time() == chrono::NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Format with `precision` significant digits, like `printf("%.4g")`.
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let precision = precision.max(1);
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= precision as i32 {
        let formatted = format!("{:.*e}", precision - 1, value);
        let (mantissa, exp) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let exp: i32 = exp.parse().unwrap_or(0);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Parse a trimmed decimal, rejecting `inf`, `NaN` and overflowing literals.
pub(crate) fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
