//! Error and configuration types for value interpretation.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::formula::ExprError;

/// Errors from formula evaluation, independent of any test definition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    /// Formula is neither an arithmetic expression nor a known function.
    #[error("Invalid formula for calculated value: '{formula}'")]
    InvalidFormula {
        /// The offending formula template.
        formula: String,
    },

    /// Formula parsed as an expression but could not be evaluated.
    #[error("Formula '{formula}' could not be evaluated: {source}")]
    Expression {
        /// The formula after substituting the reading.
        formula: String,
        /// What went wrong while evaluating.
        #[source]
        source: ExprError,
    },

    /// A named function is undefined for the reading.
    #[error("{function} is undefined for {value}")]
    Domain {
        /// The function name.
        function: String,
        /// The reading the function was applied to.
        value: Decimal,
    },

    /// A named function needs a numeric reading.
    #[error("Reading '{value}' is not numeric")]
    NonNumericReading {
        /// The reading as received.
        value: String,
    },
}

/// Errors that can occur while interpreting a reading.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpretError {
    /// The definition's data type code is not recognized.
    #[error("Invalid value datatype for {test}: got '{data_type}'")]
    InvalidDataType {
        /// The test name.
        test: String,
        /// The unrecognized data type code.
        data_type: String,
    },

    /// A decimal definition has no precision.
    #[error("Missing precision for decimal test {test}")]
    MissingPrecision {
        /// The test name.
        test: String,
    },

    /// A calculated definition has no formula.
    #[error("Missing formula for calculated test {test}")]
    MissingFormula {
        /// The test name.
        test: String,
    },

    /// The formula failed.
    #[error("Formula error for {test}: {source}")]
    Formula {
        /// The test name.
        test: String,
        /// The underlying formula failure.
        #[source]
        source: FormulaError,
    },

    /// A numeric data type was given a non-numeric reading.
    #[error("Reading '{value}' for {test} is not numeric")]
    NonNumericReading {
        /// The test name.
        test: String,
        /// The reading as received.
        value: String,
    },

    /// An integer value does not fit in 64 bits.
    #[error("Value {value} for {test} is out of range for an integer")]
    IntegerOverflow {
        /// The test name.
        test: String,
        /// The rounded value.
        value: Decimal,
    },

    /// A decimal value cannot carry the definition's precision.
    #[error("Value {value} for {test} cannot carry a precision of {precision}")]
    PrecisionOutOfRange {
        /// The test name.
        test: String,
        /// The configured precision.
        precision: u32,
        /// The value being coerced.
        value: Decimal,
    },
}

impl InterpretError {
    /// Returns true if the formula is neither an expression nor a known function.
    pub fn is_invalid_formula(&self) -> bool {
        matches!(
            self,
            InterpretError::Formula {
                source: FormulaError::InvalidFormula { .. },
                ..
            }
        )
    }

    /// Returns the name of the test the error belongs to.
    pub fn test(&self) -> &str {
        match self {
            InterpretError::InvalidDataType { test, .. }
            | InterpretError::MissingPrecision { test }
            | InterpretError::MissingFormula { test }
            | InterpretError::Formula { test, .. }
            | InterpretError::NonNumericReading { test, .. }
            | InterpretError::IntegerOverflow { test, .. }
            | InterpretError::PrecisionOutOfRange { test, .. } => test,
        }
    }
}

/// Result type for interpretation.
pub type InterpretResult<T> = Result<T, InterpretError>;

/// Resource ceilings for formula evaluation.
///
/// Formulas come from imported configuration, so evaluation refuses input
/// beyond these bounds instead of recursing or allocating without limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Maximum length in bytes of a formula after substituting the reading.
    pub max_formula_length: usize,
    /// Maximum nesting of parentheses and unary signs.
    pub max_nesting_depth: usize,
    /// Maximum absolute exponent accepted in a numeric literal (`1e28`).
    pub max_exponent: u32,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_formula_length: 256,
            max_nesting_depth: 32,
            max_exponent: 28,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpreter_config_default() {
        let config = InterpreterConfig::default();
        assert_eq!(config.max_formula_length, 256);
        assert_eq!(config.max_nesting_depth, 32);
        assert_eq!(config.max_exponent, 28);
    }

    #[test]
    fn test_is_invalid_formula() {
        let err = InterpretError::Formula {
            test: "VL".to_string(),
            source: FormulaError::InvalidFormula {
                formula: "1 + log10(100)".to_string(),
            },
        };
        assert!(err.is_invalid_formula());
        assert_eq!(err.test(), "VL");

        let err = InterpretError::Formula {
            test: "VL".to_string(),
            source: FormulaError::Expression {
                formula: "1 / 0".to_string(),
                source: ExprError::DivisionByZero,
            },
        };
        assert!(!err.is_invalid_formula());
    }

    #[test]
    fn test_error_messages_name_the_problem() {
        let err = InterpretError::InvalidDataType {
            test: "CD4".to_string(),
            data_type: "float".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid value datatype for CD4: got 'float'");

        let err = InterpretError::Formula {
            test: "VL".to_string(),
            source: FormulaError::InvalidFormula {
                formula: "SQRT".to_string(),
            },
        };
        assert!(err.to_string().contains("'SQRT'"));
    }
}
