//! # getresults-types
//!
//! Type definitions for laboratory test identifiers and interpreted results.
//!
//! This crate provides the data model shared by the interpretation engine and
//! its callers: test definitions, raw readings, typed values and quantifiers.
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via serde.
//!
//! ## Usage
//!
//! ```rust
//! use getresults_types::{DataType, Quantifier, RawValue, TestDefinition, TypedValue};
//! use rust_decimal::Decimal;
//!
//! let cd4 = TestDefinition::absolute("CD4", DataType::Integer)
//!     .with_limits(Decimal::from(400), Decimal::from(750000))
//!     .with_units("cells/uL");
//!
//! assert_eq!(cd4.data_type(), Some(DataType::Integer));
//!
//! let reading = RawValue::from("399");
//! assert_eq!(reading.to_number(), Some(Decimal::from(399)));
//!
//! let reported = (Quantifier::LessThan, TypedValue::Integer(400));
//! assert_eq!(format!("{}{}", reported.0, reported.1), "<400");
//! ```

#![warn(missing_docs)]

mod definition;
mod enums;
mod value;

// Re-export all public types at crate root
pub use definition::{DefinitionIssue, TestDefinition};
pub use enums::{DataType, Quantifier, ValueKind};
pub use value::{RawValue, TypedValue};

// Re-export the decimal type used throughout the public API
pub use rust_decimal::Decimal;
