//! Raw readings and interpreted values.
//!
//! A [`RawValue`] is what an instrument or import hands over. A [`TypedValue`]
//! is what interpretation produces: a string, an integer or a decimal rounded
//! to the definition's precision.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A raw reading as received from a sender or a limit column.
///
/// Instruments deliver text; configured limits and already-parsed values
/// arrive as numbers. Both are accepted everywhere a reading is expected.
///
/// # Examples
///
/// ```
/// use getresults_types::RawValue;
/// use rust_decimal::Decimal;
///
/// let reading = RawValue::from(" 750000 ");
/// assert_eq!(reading.to_number(), Some(Decimal::from(750000)));
///
/// let reading = RawValue::from("1.5e3");
/// assert_eq!(reading.to_number(), Some(Decimal::from(1500)));
///
/// assert_eq!(RawValue::from("TND").to_number(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RawValue {
    /// Textual reading, possibly numeric.
    Text(String),
    /// Numeric reading.
    Number(Decimal),
}

impl RawValue {
    /// Returns the textual form of the reading.
    ///
    /// Text is returned unchanged; numbers render with their own scale.
    pub fn as_text(&self) -> String {
        match self {
            RawValue::Text(s) => s.clone(),
            RawValue::Number(d) => d.to_string(),
        }
    }

    /// Returns the reading as a decimal number, if it is one.
    ///
    /// Text is trimmed and parsed as plain decimal notation first, then as
    /// scientific notation (`1.5e3`). Returns `None` for non-numeric text
    /// and for magnitudes a `Decimal` cannot hold.
    pub fn to_number(&self) -> Option<Decimal> {
        match self {
            RawValue::Number(d) => Some(*d),
            RawValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                Decimal::from_str(s)
                    .ok()
                    .or_else(|| Decimal::from_scientific(s).ok())
            }
        }
    }

    /// Returns true if this reading is textual.
    pub fn is_text(&self) -> bool {
        matches!(self, RawValue::Text(_))
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<Decimal> for RawValue {
    fn from(value: Decimal) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(Decimal::from(value))
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Number(Decimal::from(value))
    }
}

impl From<u32> for RawValue {
    fn from(value: u32) -> Self {
        RawValue::Number(Decimal::from(value))
    }
}

/// Floats keep their exact binary value; NaN and infinities become text.
impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        match Decimal::from_f64_retain(value) {
            Some(d) if value.is_finite() => RawValue::Number(d),
            _ => RawValue::Text(value.to_string()),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(s) => f.write_str(s),
            RawValue::Number(d) => write!(f, "{}", d),
        }
    }
}

/// An interpreted value, coerced to a definition's datatype.
///
/// # Examples
///
/// ```
/// use getresults_types::TypedValue;
/// use rust_decimal::Decimal;
///
/// let value = TypedValue::Decimal(Decimal::new(1008, 1));
/// assert_eq!(value.to_string(), "100.8");
/// assert_eq!(value.type_name(), "decimal");
/// assert_eq!(TypedValue::Integer(400).as_number(), Some(Decimal::from(400)));
/// assert_eq!(TypedValue::String("POS".into()).as_number(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", content = "value", rename_all = "lowercase")
)]
pub enum TypedValue {
    /// A textual value.
    String(String),
    /// A whole number.
    Integer(i64),
    /// A decimal carrying exactly the definition's precision as its scale.
    Decimal(Decimal),
}

impl TypedValue {
    /// Returns the value as a string if it is a String variant.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an integer if it is an Integer variant.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TypedValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a decimal if it is a Decimal variant.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            TypedValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the numeric view of the value, used for limit comparisons.
    ///
    /// Strings have no numeric view, even when their text looks numeric.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            TypedValue::String(_) => None,
            TypedValue::Integer(i) => Some(Decimal::from(*i)),
            TypedValue::Decimal(d) => Some(*d),
        }
    }

    /// Returns true if this is a String value.
    pub fn is_string(&self) -> bool {
        matches!(self, TypedValue::String(_))
    }

    /// Returns true if this is an Integer value.
    pub fn is_integer(&self) -> bool {
        matches!(self, TypedValue::Integer(_))
    }

    /// Returns true if this is a Decimal value.
    pub fn is_decimal(&self) -> bool {
        matches!(self, TypedValue::Decimal(_))
    }

    /// Returns the type name as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            TypedValue::String(_) => "string",
            TypedValue::Integer(_) => "integer",
            TypedValue::Decimal(_) => "decimal",
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::String(s) => f.write_str(s),
            TypedValue::Integer(i) => write!(f, "{}", i),
            TypedValue::Decimal(d) => write!(f, "{}", d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_text_is_unchanged() {
        let raw = RawValue::from("  <40 copies ");
        assert!(raw.is_text());
        assert_eq!(raw.as_text(), "  <40 copies ");
        assert_eq!(raw.to_number(), None);
    }

    #[test]
    fn test_raw_value_from_float() {
        let raw = RawValue::from(0.25f64);
        assert_eq!(raw, RawValue::Number(Decimal::new(25, 2)));
        assert_eq!(RawValue::from(-3.0f64).to_number(), Some(Decimal::from(-3)));

        let raw = RawValue::from(f64::NAN);
        assert!(raw.is_text());
        assert_eq!(raw.to_number(), None);
        assert_eq!(RawValue::from(f64::INFINITY).as_text(), "inf");
        assert_eq!(RawValue::from(1e30f64).to_number(), None);
    }

    #[test]
    fn test_raw_value_number_parsing() {
        assert_eq!(
            RawValue::from("100.77").to_number(),
            Some(Decimal::new(10077, 2))
        );
        assert_eq!(RawValue::from("-3").to_number(), Some(Decimal::from(-3)));
        assert_eq!(
            RawValue::from("2.5e-2").to_number(),
            Some(Decimal::new(25, 3))
        );
        assert_eq!(RawValue::from("").to_number(), None);
        assert_eq!(RawValue::from("nan").to_number(), None);
    }

    #[test]
    fn test_raw_value_number_text() {
        let raw = RawValue::from(Decimal::new(4000, 1));
        assert!(!raw.is_text());
        assert_eq!(raw.as_text(), "400.0");
        assert_eq!(RawValue::from(750000i64).as_text(), "750000");
    }

    #[test]
    fn test_typed_value_accessors() {
        let s = TypedValue::String("POS".to_string());
        assert!(s.is_string());
        assert_eq!(s.as_string(), Some("POS"));
        assert_eq!(s.as_integer(), None);

        let i = TypedValue::Integer(101);
        assert!(i.is_integer());
        assert_eq!(i.as_integer(), Some(101));
        assert_eq!(i.as_decimal(), None);

        let d = TypedValue::Decimal(Decimal::new(5875, 3));
        assert!(d.is_decimal());
        assert_eq!(d.as_decimal(), Some(Decimal::new(5875, 3)));
        assert_eq!(d.as_number(), Some(Decimal::new(5875, 3)));
    }

    #[test]
    fn test_typed_value_display() {
        assert_eq!(TypedValue::String("POS".to_string()).to_string(), "POS");
        assert_eq!(TypedValue::Integer(-7).to_string(), "-7");
        assert_eq!(TypedValue::Decimal(Decimal::new(10080, 2)).to_string(), "100.80");
    }
}
