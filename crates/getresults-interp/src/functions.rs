//! Named formula functions.
//!
//! A formula that is not an arithmetic expression may name a function
//! applied to the raw reading. The set of names is closed: new behavior is
//! added by registering a function here, never by widening the expression
//! grammar.

use std::collections::HashMap;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// A pure function over a numeric reading.
///
/// Returns `None` when the reading is outside the function's domain.
pub type FormulaFn = fn(Decimal) -> Option<Decimal>;

/// Registry of named formula functions.
///
/// The default registry contains [`LOG10`](Self::LOG10). Names are matched
/// exactly against the whole formula.
///
/// # Examples
///
/// ```
/// use getresults_interp::FunctionRegistry;
/// use rust_decimal::Decimal;
///
/// let mut registry = FunctionRegistry::default();
/// assert!(registry.contains("LOG10"));
///
/// registry.register("HALF", |v| v.checked_div(Decimal::from(2)));
/// let half = registry.get("HALF").unwrap();
/// assert_eq!(half(Decimal::from(9)), Some(Decimal::new(45, 1)));
/// ```
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, FormulaFn>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Self::LOG10, log10);
        registry
    }
}

impl FunctionRegistry {
    /// Name of the base-10 logarithm.
    pub const LOG10: &'static str = "LOG10";

    /// Creates a registry with no functions.
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registers a function, returning the one previously under that name.
    pub fn register(&mut self, name: impl Into<String>, function: FormulaFn) -> Option<FormulaFn> {
        self.functions.insert(name.into(), function)
    }

    /// Looks up a function by exact name.
    pub fn get(&self, name: &str) -> Option<FormulaFn> {
        self.functions.get(name).copied()
    }

    /// Returns true if a function is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Base-10 logarithm.
///
/// Undefined for zero and negative readings.
pub fn log10(value: Decimal) -> Option<Decimal> {
    if value <= Decimal::ZERO {
        return None;
    }
    let result = value.to_f64()?.log10();
    if !result.is_finite() {
        return None;
    }
    Decimal::from_f64(result)
}
