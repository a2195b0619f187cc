//! lq Value - runtime values for the lq sequence engine.
//!
//! This crate provides:
//! - The dynamic [`Value`] type that flows through every pipeline
//! - [`ArrayValue`], an insertion-ordered key/value map with
//!   associative-array semantics
//! - The [`Object`] trait through which engine objects (sequences,
//!   groupings, lookups) are carried inside values
//! - The error taxonomy ([`LinqError`], [`LinqErrorKind`]) and its
//!   constructor functions
//! - The JSON boundary (`serde_json` conversion and `Serialize`)
//!
//! # Sharing
//!
//! Heap-backed values are shared through [`Heap<T>`], a single-threaded
//! reference-counted handle. Cloning a value never deep-copies strings,
//! arrays or objects.

mod errors;
mod heap;
mod json;
mod object;
mod value;

pub use errors::{LinqError, LinqErrorKind, LinqResult};
pub use heap::Heap;
pub use json::{from_json_text, from_json_value, to_json_text, to_json_value};
pub use object::Object;
pub use value::{ArrayValue, Value, ValueKind};

// Error constructors (canonical path is `lq_value::<constructor>`)
pub use errors::{
    arity_mismatch, custom_error, division_by_zero, duplicate_key, integer_overflow,
    invalid_argument, invalid_operands, json_error, key_not_found, lambda_parse_error,
    more_than_one_element, no_elements, no_such_method, no_such_property, not_indexable,
    out_of_range, type_mismatch, undefined_function, undefined_variable,
};
