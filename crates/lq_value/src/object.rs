//! Engine objects carried inside values.
//!
//! Sequences, groupings and lookups live in `lq_core`, above this crate.
//! They enter the value world through [`Object`], which gives the
//! micro-lambda evaluator a uniform way to read properties and call
//! methods on them (`$g->key`, `$seq->count()`).

use std::any::Any;
use std::fmt;

use crate::{no_such_method, no_such_property, LinqResult, Value};

/// A shared, identity-compared engine object.
pub trait Object: fmt::Debug {
    /// Type name used in error messages and by `of_type`.
    fn type_name(&self) -> &'static str;

    /// Downcasting hook; see [`Value::downcast_object`].
    fn as_any(&self) -> &dyn Any;

    /// Read a named property. Objects without properties use the default.
    fn property(&self, name: &str) -> LinqResult<Value> {
        Err(no_such_property(name, self.type_name()))
    }

    /// Call a named method with positional arguments.
    fn call_method(&self, name: &str, args: &[Value]) -> LinqResult<Value> {
        let _ = args;
        Err(no_such_method(name, self.type_name()))
    }

    /// Plain-data form of the object (arrays and scalars only), used for
    /// serialization. Sequences are drained to produce it.
    fn materialize(&self) -> LinqResult<Value>;
}
