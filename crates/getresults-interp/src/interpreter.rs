//! Value interpretation: formulas, datatype coercion and limits of detection.

use std::sync::LazyLock;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use getresults_types::{DataType, Quantifier, RawValue, TestDefinition, TypedValue, ValueKind};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, trace, warn};

use crate::formula::{self, ExprError};
use crate::functions::{FormulaFn, FunctionRegistry};
use crate::types::{FormulaError, InterpretError, InterpretResult, InterpreterConfig};

/// Placeholder replaced by the raw reading in formula templates.
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// Rounding applied to integer and decimal coercion.
const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

static DEFAULT_INTERPRETER: LazyLock<ValueInterpreter> = LazyLock::new(ValueInterpreter::default);

/// Interprets raw readings against test definitions.
///
/// Holds no per-reading state: one interpreter can be shared across threads
/// and reused for any number of definitions.
///
/// # Example
///
/// ```
/// use getresults_interp::ValueInterpreter;
/// use getresults_types::{DataType, Quantifier, TestDefinition, TypedValue};
/// use rust_decimal::Decimal;
///
/// let interpreter = ValueInterpreter::default();
/// let cd4 = TestDefinition::absolute("CD4", DataType::Integer)
///     .with_limits(Decimal::from(400), Decimal::from(750000));
///
/// assert_eq!(
///     interpreter.classify(&cd4, "399").unwrap(),
///     (Quantifier::LessThan, TypedValue::Integer(400))
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValueInterpreter {
    config: InterpreterConfig,
    functions: FunctionRegistry,
}

impl ValueInterpreter {
    /// Creates an interpreter with the given ceilings and the default functions.
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            config,
            functions: FunctionRegistry::default(),
        }
    }

    /// Creates an interpreter with an explicit function registry.
    pub fn with_functions(config: InterpreterConfig, functions: FunctionRegistry) -> Self {
        Self { config, functions }
    }

    /// Returns the interpreter configuration.
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Returns the function registry.
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Registers an additional named formula function.
    pub fn register_function(&mut self, name: impl Into<String>, function: FormulaFn) {
        self.functions.register(name, function);
    }

    /// Resolves a raw reading to a typed value.
    ///
    /// Calculated definitions pass the reading through their formula first;
    /// the result is then coerced to the definition's datatype. String
    /// definitions return the reading's text unchanged.
    ///
    /// # Errors
    /// Returns an error for an unrecognized datatype, a missing precision or
    /// formula, a failing formula, or a non-numeric reading for a numeric type.
    pub fn resolve(
        &self,
        definition: &TestDefinition,
        raw: impl Into<RawValue>,
    ) -> InterpretResult<TypedValue> {
        let kind = self.value_kind(definition);
        self.resolve_as(definition, &raw.into(), kind)
    }

    /// Resolves a reading and places it relative to the limits of detection.
    ///
    /// With both limits set, a numeric value strictly below the lower limit
    /// reports `<` with the lower limit, strictly above the upper limit
    /// reports `>` with the upper limit. The limit is coerced like a value
    /// but never passed through the formula. Everything else, including
    /// string values that cannot be compared, reports `=` with the value.
    ///
    /// # Errors
    /// Returns the same errors as [`resolve`](Self::resolve).
    pub fn classify(
        &self,
        definition: &TestDefinition,
        raw: impl Into<RawValue>,
    ) -> InterpretResult<(Quantifier, TypedValue)> {
        let value = self.resolve(definition, raw)?;

        if let (Some(lower), Some(upper)) = (definition.lower_limit, definition.upper_limit) {
            match value.as_number() {
                Some(number) if number < lower => {
                    let limit = self.resolve_limit(definition, lower)?;
                    return Ok((Quantifier::LessThan, limit));
                }
                Some(number) if number > upper => {
                    let limit = self.resolve_limit(definition, upper)?;
                    return Ok((Quantifier::GreaterThan, limit));
                }
                Some(_) => {}
                None => debug!(
                    test = %definition.name,
                    value = %value,
                    "value not comparable with limits of detection, reporting as '='"
                ),
            }
        }

        Ok((Quantifier::Equal, value))
    }

    /// Classifies many readings against one definition, preserving order.
    ///
    /// Readings are processed in parallel when the `parallel` feature is on.
    pub fn classify_all(
        &self,
        definition: &TestDefinition,
        readings: &[RawValue],
    ) -> Vec<InterpretResult<(Quantifier, TypedValue)>> {
        #[cfg(feature = "parallel")]
        {
            readings
                .par_iter()
                .map(|raw| self.classify(definition, raw.clone()))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            readings
                .iter()
                .map(|raw| self.classify(definition, raw.clone()))
                .collect()
        }
    }

    /// Evaluates a formula template against a raw reading.
    ///
    /// `{value}` in the template is replaced by the reading's text and the
    /// result evaluated as a restricted arithmetic expression. If that text
    /// is not an expression, the template itself is looked up as a function
    /// name and the function applied to the numeric reading.
    ///
    /// # Errors
    /// [`FormulaError::InvalidFormula`] if the formula is neither; other
    /// variants for evaluation failures.
    pub fn evaluate_formula(&self, formula: &str, raw: &RawValue) -> Result<Decimal, FormulaError> {
        let substituted = formula.replace(VALUE_PLACEHOLDER, &raw.as_text());

        match formula::evaluate(&substituted, &self.config) {
            Ok(value) => {
                trace!(formula, %value, "evaluated literal expression");
                Ok(value)
            }
            Err(err) if err.is_syntax() => self.apply_function(formula, raw, err),
            Err(source) => Err(FormulaError::Expression {
                formula: substituted,
                source,
            }),
        }
    }

    fn apply_function(
        &self,
        formula: &str,
        raw: &RawValue,
        syntax: ExprError,
    ) -> Result<Decimal, FormulaError> {
        let Some(function) = self.functions.get(formula) else {
            trace!(formula, error = %syntax, "formula is neither an expression nor a function");
            return Err(FormulaError::InvalidFormula {
                formula: formula.to_string(),
            });
        };

        let input = raw.to_number().ok_or_else(|| FormulaError::NonNumericReading {
            value: raw.as_text(),
        })?;
        let value = function(input).ok_or_else(|| FormulaError::Domain {
            function: formula.to_string(),
            value: input,
        })?;

        trace!(function = formula, %input, %value, "applied named function");
        Ok(value)
    }

    fn value_kind(&self, definition: &TestDefinition) -> ValueKind {
        definition.value_kind().unwrap_or_else(|| {
            warn!(
                test = %definition.name,
                value_type = %definition.value_type,
                "unrecognized value type, treating as absolute"
            );
            ValueKind::Absolute
        })
    }

    fn resolve_as(
        &self,
        definition: &TestDefinition,
        raw: &RawValue,
        kind: ValueKind,
    ) -> InterpretResult<TypedValue> {
        let data_type = definition
            .data_type()
            .ok_or_else(|| InterpretError::InvalidDataType {
                test: definition.name.clone(),
                data_type: definition.value_datatype.clone(),
            })?;

        let number = match (kind, data_type) {
            (ValueKind::Absolute, DataType::String) => {
                return Ok(TypedValue::String(raw.as_text()));
            }
            (ValueKind::Calculated, _) => self.calculated_number(definition, raw)?,
            (ValueKind::Absolute, _) => {
                raw.to_number()
                    .ok_or_else(|| InterpretError::NonNumericReading {
                        test: definition.name.clone(),
                        value: raw.as_text(),
                    })?
            }
        };

        let value = coerce(definition, data_type, number)?;
        debug!(test = %definition.name, raw = %raw, %value, "resolved reading");
        Ok(value)
    }

    /// Resolves a limit of detection as an absolute value.
    fn resolve_limit(
        &self,
        definition: &TestDefinition,
        limit: Decimal,
    ) -> InterpretResult<TypedValue> {
        self.resolve_as(definition, &RawValue::Number(limit), ValueKind::Absolute)
    }

    fn calculated_number(
        &self,
        definition: &TestDefinition,
        raw: &RawValue,
    ) -> InterpretResult<Decimal> {
        let formula = definition
            .formula
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| InterpretError::MissingFormula {
                test: definition.name.clone(),
            })?;

        self.evaluate_formula(formula, raw)
            .map_err(|source| InterpretError::Formula {
                test: definition.name.clone(),
                source,
            })
    }
}

/// Coerces a number to the definition's datatype.
///
/// Strings render the number as text; integers and decimals are rounded.
fn coerce(
    definition: &TestDefinition,
    data_type: DataType,
    number: Decimal,
) -> InterpretResult<TypedValue> {
    match data_type {
        DataType::String => Ok(TypedValue::String(number.to_string())),
        DataType::Integer => {
            let rounded = number.round_dp_with_strategy(0, ROUNDING);
            rounded
                .to_i64()
                .map(TypedValue::Integer)
                .ok_or_else(|| InterpretError::IntegerOverflow {
                    test: definition.name.clone(),
                    value: rounded,
                })
        }
        DataType::Decimal => {
            let precision = definition
                .precision
                .ok_or_else(|| InterpretError::MissingPrecision {
                    test: definition.name.clone(),
                })?;
            let out_of_range = || InterpretError::PrecisionOutOfRange {
                test: definition.name.clone(),
                precision,
                value: number,
            };
            if precision > TestDefinition::MAX_PRECISION {
                return Err(out_of_range());
            }

            let mut rounded = number.round_dp_with_strategy(precision, ROUNDING);
            if rounded.scale() < precision {
                rounded.rescale(precision);
            }
            // rescale silently stops short when the integer part leaves no room
            if rounded.scale() != precision {
                return Err(out_of_range());
            }
            Ok(TypedValue::Decimal(rounded))
        }
    }
}

/// Resolves a reading with the default interpreter.
///
/// See [`ValueInterpreter::resolve`].
pub fn resolve(
    definition: &TestDefinition,
    raw: impl Into<RawValue>,
) -> InterpretResult<TypedValue> {
    DEFAULT_INTERPRETER.resolve(definition, raw)
}

/// Classifies a reading with the default interpreter.
///
/// See [`ValueInterpreter::classify`].
pub fn classify(
    definition: &TestDefinition,
    raw: impl Into<RawValue>,
) -> InterpretResult<(Quantifier, TypedValue)> {
    DEFAULT_INTERPRETER.classify(definition, raw)
}

/// Evaluates a formula template with the default interpreter.
///
/// See [`ValueInterpreter::evaluate_formula`].
pub fn evaluate_formula(formula: &str, raw: impl Into<RawValue>) -> Result<Decimal, FormulaError> {
    DEFAULT_INTERPRETER.evaluate_formula(formula, &raw.into())
}

/// Interpretation methods on [`TestDefinition`] using the default interpreter.
///
/// ```
/// use getresults_interp::Interpret;
/// use getresults_types::{DataType, TestDefinition, TypedValue};
///
/// let cd4 = TestDefinition::absolute("CD4", DataType::Integer);
/// assert_eq!(cd4.value("100.99").unwrap(), TypedValue::Integer(101));
/// ```
pub trait Interpret {
    /// Resolves a reading to a typed value.
    fn value(&self, raw: impl Into<RawValue>) -> InterpretResult<TypedValue>;

    /// Resolves a reading and pairs it with its quantifier.
    fn value_with_quantifier(
        &self,
        raw: impl Into<RawValue>,
    ) -> InterpretResult<(Quantifier, TypedValue)>;
}

impl Interpret for TestDefinition {
    fn value(&self, raw: impl Into<RawValue>) -> InterpretResult<TypedValue> {
        resolve(self, raw)
    }

    fn value_with_quantifier(
        &self,
        raw: impl Into<RawValue>,
    ) -> InterpretResult<(Quantifier, TypedValue)> {
        classify(self, raw)
    }
}
