//! Access to the iteration context from lambda bodies.
//!
//! `$ctx->field` reads and `$ctx->field = v` writes go through
//! [`LambdaContext`]. The sequence engine implements it for its
//! per-invocation context; lambdas invoked outside an operator use
//! [`NoContext`].

use lq_value::{undefined_variable, LinqResult, Value};

/// Field access for `$ctx`.
///
/// Reads take `&mut self` because some fields (`isLast`) are computed on
/// demand by pulling ahead in the source.
pub trait LambdaContext {
    fn read_field(&mut self, field: &str) -> LinqResult<Value>;
    fn write_field(&mut self, field: &str, value: Value) -> LinqResult<()>;
}

/// Context for invocations outside any operator; `$ctx` is undefined.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoContext;

impl LambdaContext for NoContext {
    fn read_field(&mut self, _field: &str) -> LinqResult<Value> {
        Err(undefined_variable("ctx"))
    }

    fn write_field(&mut self, _field: &str, _value: Value) -> LinqResult<()> {
        Err(undefined_variable("ctx"))
    }
}
