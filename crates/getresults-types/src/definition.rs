//! Test identifier definition.
//!
//! This module provides the `TestDefinition` struct describing how readings
//! for one named laboratory test are interpreted.

use std::fmt;

use rust_decimal::Decimal;

use crate::{DataType, ValueKind};

/// How to interpret readings for one named test.
///
/// The value kind and data type are kept as the configuration codes the
/// definition was imported with; [`value_kind`](Self::value_kind) and
/// [`data_type`](Self::data_type) give the typed view. Limits are exclusive
/// limits of detection in the output domain.
///
/// # Examples
///
/// ```
/// use getresults_types::{DataType, TestDefinition, ValueKind};
/// use rust_decimal::Decimal;
///
/// let vl = TestDefinition::calculated("PMH", DataType::Decimal, "LOG10")
///     .with_precision(2)
///     .with_units("log cp/mL");
///
/// assert_eq!(vl.value_kind(), Some(ValueKind::Calculated));
/// assert_eq!(vl.data_type(), Some(DataType::Decimal));
/// assert!(vl.validate().is_empty());
///
/// let cd4 = TestDefinition::absolute("CD4", DataType::Integer)
///     .with_limits(Decimal::from(400), Decimal::from(750000));
/// assert!(cd4.has_limits());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestDefinition {
    /// Unique short identifier for the test.
    pub name: String,
    /// Human readable description.
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    /// Value kind code (`absolute` or `calculated`).
    pub value_type: String,
    /// Data type code (`string`, `integer` or `decimal`).
    pub value_datatype: String,
    /// Lower limit of detection (exclusive).
    #[cfg_attr(feature = "serde", serde(default))]
    pub lower_limit: Option<Decimal>,
    /// Upper limit of detection (exclusive).
    #[cfg_attr(feature = "serde", serde(default))]
    pub upper_limit: Option<Decimal>,
    /// Fractional digits kept for decimal values.
    #[cfg_attr(feature = "serde", serde(default))]
    pub precision: Option<u32>,
    /// Formula for calculated values: an arithmetic template using
    /// `{value}`, or a function name such as `LOG10`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub formula: Option<String>,
    /// Name of the test whose value the formula is based on.
    #[cfg_attr(feature = "serde", serde(default))]
    pub formula_utestid_name: Option<String>,
    /// Units the value is reported in.
    #[cfg_attr(feature = "serde", serde(default))]
    pub units: Option<String>,
}

impl TestDefinition {
    /// Largest precision a decimal definition can carry.
    pub const MAX_PRECISION: u32 = 28;

    fn new(name: impl Into<String>, kind: ValueKind, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            value_type: kind.code().to_string(),
            value_datatype: data_type.code().to_string(),
            lower_limit: None,
            upper_limit: None,
            precision: None,
            formula: None,
            formula_utestid_name: None,
            units: None,
        }
    }

    /// Creates a definition whose readings are reported as-is.
    pub fn absolute(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, ValueKind::Absolute, data_type)
    }

    /// Creates a definition whose readings pass through `formula` first.
    pub fn calculated(
        name: impl Into<String>,
        data_type: DataType,
        formula: impl Into<String>,
    ) -> Self {
        let mut definition = Self::new(name, ValueKind::Calculated, data_type);
        definition.formula = Some(formula.into());
        definition
    }

    /// Sets the number of fractional digits for decimal values.
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Sets both limits of detection.
    pub fn with_limits(mut self, lower: Decimal, upper: Decimal) -> Self {
        self.lower_limit = Some(lower);
        self.upper_limit = Some(upper);
        self
    }

    /// Sets the lower limit of detection.
    pub fn with_lower_limit(mut self, lower: Decimal) -> Self {
        self.lower_limit = Some(lower);
        self
    }

    /// Sets the upper limit of detection.
    pub fn with_upper_limit(mut self, upper: Decimal) -> Self {
        self.upper_limit = Some(upper);
        self
    }

    /// Sets the reporting units.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the name of the test the formula is based on.
    pub fn with_formula_utestid_name(mut self, name: impl Into<String>) -> Self {
        self.formula_utestid_name = Some(name.into());
        self
    }

    /// Returns the value kind enum value.
    ///
    /// Returns `None` if the value kind code is not recognized.
    pub fn value_kind(&self) -> Option<ValueKind> {
        ValueKind::from_code(&self.value_type)
    }

    /// Returns the data type enum value.
    ///
    /// Returns `None` if the data type code is not recognized.
    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_code(&self.value_datatype)
    }

    /// Returns true if readings are passed through the formula.
    pub fn is_calculated(&self) -> bool {
        self.value_kind() == Some(ValueKind::Calculated)
    }

    /// Returns true if both limits of detection are set.
    pub fn has_limits(&self) -> bool {
        self.lower_limit.is_some() && self.upper_limit.is_some()
    }

    /// Checks the definition for configuration problems.
    ///
    /// Interpretation reports the same problems lazily; this lets a loader
    /// reject a definition before any reading is seen. An empty list means
    /// the definition is usable.
    pub fn validate(&self) -> Vec<DefinitionIssue> {
        let mut issues = Vec::new();

        if self.value_kind().is_none() {
            issues.push(DefinitionIssue::UnknownValueKind(self.value_type.clone()));
        }

        match self.data_type() {
            None => issues.push(DefinitionIssue::UnknownDataType(
                self.value_datatype.clone(),
            )),
            Some(DataType::Decimal) => match self.precision {
                None => issues.push(DefinitionIssue::MissingPrecision),
                Some(precision) if precision > Self::MAX_PRECISION => {
                    issues.push(DefinitionIssue::PrecisionOutOfRange {
                        precision,
                        max: Self::MAX_PRECISION,
                    })
                }
                Some(_) => {}
            },
            _ => {}
        }

        let has_formula = self
            .formula
            .as_deref()
            .is_some_and(|f| !f.trim().is_empty());
        if self.is_calculated() && !has_formula {
            issues.push(DefinitionIssue::MissingFormula);
        }

        if let (Some(lower), Some(upper)) = (self.lower_limit, self.upper_limit) {
            if lower > upper {
                issues.push(DefinitionIssue::InvertedLimits { lower, upper });
            }
        }

        issues
    }
}

impl fmt::Display for TestDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A configuration problem found by [`TestDefinition::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionIssue {
    /// The value kind code is not recognized.
    UnknownValueKind(String),
    /// The data type code is not recognized.
    UnknownDataType(String),
    /// A decimal definition has no precision.
    MissingPrecision,
    /// A decimal definition asks for more places than a decimal can carry.
    PrecisionOutOfRange {
        /// Configured precision.
        precision: u32,
        /// Largest supported precision.
        max: u32,
    },
    /// A calculated definition has no formula.
    MissingFormula,
    /// The lower limit is above the upper limit.
    InvertedLimits {
        /// Configured lower limit.
        lower: Decimal,
        /// Configured upper limit.
        upper: Decimal,
    },
}

impl fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownValueKind(code) => write!(f, "unknown value type '{}'", code),
            Self::UnknownDataType(code) => write!(f, "unknown value datatype '{}'", code),
            Self::MissingPrecision => f.write_str("decimal datatype requires a precision"),
            Self::PrecisionOutOfRange { precision, max } => {
                write!(f, "precision {} exceeds the maximum of {}", precision, max)
            }
            Self::MissingFormula => f.write_str("calculated value requires a formula"),
            Self::InvertedLimits { lower, upper } => {
                write!(f, "lower limit {} is above upper limit {}", lower, upper)
            }
        }
    }
}
