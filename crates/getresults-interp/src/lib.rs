//! # getresults-interp
//!
//! Interpretation engine for laboratory test readings.
//!
//! Given a [`TestDefinition`](getresults_types::TestDefinition) and a raw
//! reading, the engine
//!
//! 1. applies the definition's formula when the value is calculated, either a
//!    restricted arithmetic template using `{value}` or a named function such
//!    as `LOG10`,
//! 2. coerces the result to the definition's datatype and precision, and
//! 3. places the value relative to the limits of detection as a
//!    `(quantifier, value)` pair.
//!
//! Everything is pure and synchronous; a [`ValueInterpreter`] can be shared
//! freely between threads.
//!
//! ## Features
//!
//! - `parallel` (default): [`ValueInterpreter::classify_all`] uses rayon.
//!
//! ## Usage
//!
//! ```rust
//! use getresults_interp::{classify, resolve};
//! use getresults_types::{DataType, Quantifier, TestDefinition, TypedValue};
//! use rust_decimal::Decimal;
//!
//! let vl = TestDefinition::calculated("PMH", DataType::Decimal, "LOG10").with_precision(2);
//! assert_eq!(resolve(&vl, "750000").unwrap().to_string(), "5.88");
//!
//! let cd4 = TestDefinition::absolute("CD4", DataType::Integer)
//!     .with_limits(Decimal::from(400), Decimal::from(750000));
//! assert_eq!(
//!     classify(&cd4, "750001").unwrap(),
//!     (Quantifier::GreaterThan, TypedValue::Integer(750000))
//! );
//! ```

#![warn(missing_docs)]

pub mod formula;
mod functions;
mod interpreter;
mod types;

pub use formula::ExprError;
pub use functions::{log10, FormulaFn, FunctionRegistry};
pub use interpreter::{
    classify, evaluate_formula, resolve, Interpret, ValueInterpreter, VALUE_PLACEHOLDER,
};
pub use types::{FormulaError, InterpretError, InterpretResult, InterpreterConfig};

// Re-export getresults-types for convenience
pub use getresults_types;
