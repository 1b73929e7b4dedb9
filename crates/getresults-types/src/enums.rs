//! Enumeration types for test definitions and interpreted results.
//!
//! Value kinds and data types are stored on a [`TestDefinition`](crate::TestDefinition)
//! as the configuration codes they were imported with. The enums here are the
//! typed view of those codes.

/// How a raw reading becomes a reported value.
///
/// # Examples
///
/// ```
/// use getresults_types::ValueKind;
///
/// assert_eq!(ValueKind::from_code("calculated"), Some(ValueKind::Calculated));
/// assert_eq!(ValueKind::from_code("ABSOLUTE"), Some(ValueKind::Absolute));
/// assert_eq!(ValueKind::from_code("derived"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ValueKind {
    /// Reading is reported as-is, after datatype coercion.
    Absolute,
    /// Reading is passed through a formula before datatype coercion.
    Calculated,
}

impl ValueKind {
    /// Configuration code for absolute values.
    pub const ABSOLUTE_CODE: &'static str = "absolute";
    /// Configuration code for calculated values.
    pub const CALCULATED_CODE: &'static str = "calculated";

    /// Creates a ValueKind from its configuration code (case-insensitive).
    ///
    /// Returns `None` if the code is not recognized.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.eq_ignore_ascii_case(Self::ABSOLUTE_CODE) {
            Some(Self::Absolute)
        } else if code.eq_ignore_ascii_case(Self::CALCULATED_CODE) {
            Some(Self::Calculated)
        } else {
            None
        }
    }

    /// Returns the configuration code for this value kind.
    pub fn code(self) -> &'static str {
        match self {
            Self::Absolute => Self::ABSOLUTE_CODE,
            Self::Calculated => Self::CALCULATED_CODE,
        }
    }
}

/// Target datatype of an interpreted value.
///
/// # Examples
///
/// ```
/// use getresults_types::DataType;
///
/// assert_eq!(DataType::from_code("decimal"), Some(DataType::Decimal));
/// assert_eq!(DataType::Integer.code(), "integer");
/// assert_eq!(DataType::from_code("float"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DataType {
    /// Textual value, no numeric coercion.
    String,
    /// Whole number.
    Integer,
    /// Decimal number rounded to the definition's precision.
    Decimal,
}

impl DataType {
    /// Configuration code for string values.
    pub const STRING_CODE: &'static str = "string";
    /// Configuration code for integer values.
    pub const INTEGER_CODE: &'static str = "integer";
    /// Configuration code for decimal values.
    pub const DECIMAL_CODE: &'static str = "decimal";

    /// Creates a DataType from its configuration code (case-insensitive).
    ///
    /// Returns `None` if the code is not recognized.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        [Self::String, Self::Integer, Self::Decimal]
            .into_iter()
            .find(|dt| code.eq_ignore_ascii_case(dt.code()))
    }

    /// Returns the configuration code for this data type.
    pub fn code(self) -> &'static str {
        match self {
            Self::String => Self::STRING_CODE,
            Self::Integer => Self::INTEGER_CODE,
            Self::Decimal => Self::DECIMAL_CODE,
        }
    }

    /// Returns true if values of this type can be compared against limits.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Decimal)
    }
}

/// Position of a value relative to the limits of detection.
///
/// # Examples
///
/// ```
/// use getresults_types::Quantifier;
///
/// assert_eq!(Quantifier::from_symbol("<"), Some(Quantifier::LessThan));
/// assert_eq!(Quantifier::GreaterThan.to_string(), ">");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Quantifier {
    /// Below the lower limit; the reported value is the lower limit.
    #[cfg_attr(feature = "serde", serde(rename = "<"))]
    LessThan,
    /// Within the limits (or no comparison possible).
    #[cfg_attr(feature = "serde", serde(rename = "="))]
    Equal,
    /// Above the upper limit; the reported value is the upper limit.
    #[cfg_attr(feature = "serde", serde(rename = ">"))]
    GreaterThan,
}

impl Quantifier {
    /// Creates a Quantifier from its symbol.
    ///
    /// Returns `None` for anything other than `<`, `=` or `>`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Self::LessThan),
            "=" => Some(Self::Equal),
            ">" => Some(Self::GreaterThan),
            _ => None,
        }
    }

    /// Returns the symbol for this quantifier.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::Equal => "=",
            Self::GreaterThan => ">",
        }
    }
}

impl std::fmt::Display for Quantifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
