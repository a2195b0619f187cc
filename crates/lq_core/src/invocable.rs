//! Callbacks accepted by operators.

use std::fmt;
use std::rc::Rc;

use lq_lambda::LambdaExpression;
use lq_value::{invalid_argument, Heap, LinqResult, Object, Value};

use crate::IterationContext;

type NativeFn = dyn Fn(&[Value], &mut IterationContext<'_>) -> LinqResult<Value>;

/// A callable resolved once, when an operator receives it.
///
/// Operators pass positional arguments: element callbacks get
/// `(value, key)`, `aggregate` gets `(accumulator, value, key)`, comparers
/// get `(a, b)`. Callbacks may ignore trailing arguments.
#[derive(Clone)]
pub enum Invocable {
    /// Rust closure with full access to the iteration context.
    Native(Rc<NativeFn>),
    /// A method of an engine object, called with the operator's arguments.
    Bound {
        receiver: Heap<dyn Object>,
        method: Rc<str>,
    },
    /// Parsed micro-lambda text.
    Lambda(Rc<LambdaExpression>),
}

impl Invocable {
    pub fn native(
        f: impl Fn(&[Value], &mut IterationContext<'_>) -> LinqResult<Value> + 'static,
    ) -> Self {
        Invocable::Native(Rc::new(f))
    }

    /// Closure over the first argument (the element value).
    pub fn unary(f: impl Fn(&Value) -> LinqResult<Value> + 'static) -> Self {
        Invocable::native(move |args, _| f(arg(args, 0)))
    }

    /// Closure over the first two arguments.
    pub fn binary(f: impl Fn(&Value, &Value) -> LinqResult<Value> + 'static) -> Self {
        Invocable::native(move |args, _| f(arg(args, 0), arg(args, 1)))
    }

    /// Parse micro-lambda text.
    pub fn lambda(source: &str) -> LinqResult<Self> {
        LambdaExpression::parse(source).map(|lambda| Invocable::Lambda(Rc::new(lambda)))
    }

    /// Bind `method` on an object value.
    pub fn bound(receiver: &Value, method: &str) -> LinqResult<Self> {
        match receiver {
            Value::Object(object) => Ok(Invocable::Bound {
                receiver: object.clone(),
                method: Rc::from(method),
            }),
            other => Err(invalid_argument(
                "receiver",
                format!("cannot bind method `{method}` on {}", other.type_name()),
            )),
        }
    }

    pub fn call(&self, args: &[Value], ctx: &mut IterationContext<'_>) -> LinqResult<Value> {
        match self {
            Invocable::Native(f) => f(args, ctx),
            Invocable::Bound { receiver, method } => receiver.call_method(method, args),
            Invocable::Lambda(lambda) => lambda.call(args, ctx),
        }
    }

    /// Call outside any traversal.
    pub fn invoke(&self, args: &[Value]) -> LinqResult<Value> {
        self.call(args, &mut IterationContext::detached())
    }
}

fn arg(args: &[Value], i: usize) -> &Value {
    const NULL: &Value = &Value::Null;
    args.get(i).unwrap_or(NULL)
}

impl fmt::Debug for Invocable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocable::Native(_) => f.write_str("Native(..)"),
            Invocable::Bound { receiver, method } => f
                .debug_struct("Bound")
                .field("receiver", &receiver.type_name())
                .field("method", &&**method)
                .finish(),
            Invocable::Lambda(lambda) => write!(f, "Lambda({:?})", lambda.source()),
        }
    }
}

/// Conversion into an [`Invocable`]; text parses as a micro-lambda.
pub trait IntoInvocable {
    fn into_invocable(self) -> LinqResult<Invocable>;
}

impl IntoInvocable for Invocable {
    fn into_invocable(self) -> LinqResult<Invocable> {
        Ok(self)
    }
}

impl IntoInvocable for &Invocable {
    fn into_invocable(self) -> LinqResult<Invocable> {
        Ok(self.clone())
    }
}

impl IntoInvocable for &str {
    fn into_invocable(self) -> LinqResult<Invocable> {
        Invocable::lambda(self)
    }
}

impl IntoInvocable for String {
    fn into_invocable(self) -> LinqResult<Invocable> {
        Invocable::lambda(&self)
    }
}

impl IntoInvocable for &String {
    fn into_invocable(self) -> LinqResult<Invocable> {
        Invocable::lambda(self)
    }
}

impl IntoInvocable for LambdaExpression {
    fn into_invocable(self) -> LinqResult<Invocable> {
        Ok(Invocable::Lambda(Rc::new(self)))
    }
}

/// Accepts a callable argument coming from a micro-lambda (`$seq->where('$x => $x')`).
pub(crate) fn from_value(name: &str, value: &Value) -> LinqResult<Invocable> {
    match value {
        Value::Str(text) => Invocable::lambda(text),
        other => Err(invalid_argument(
            name,
            format!("expected lambda text, got {}", other.type_name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lambda_text_is_parsed_once() {
        let f = "$x => $x * 2".into_invocable().unwrap();
        assert_eq!(f.invoke(&[Value::Int(21)]).unwrap(), Value::Int(42));
        assert!(matches!(f, Invocable::Lambda(_)));
    }

    #[test]
    fn malformed_lambda_is_invalid_argument() {
        let err = "$x => $x +".into_invocable().unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn native_closures_see_arguments() {
        let add = Invocable::binary(|a, b| {
            Ok(Value::Int(a.as_int().unwrap_or(0) + b.as_int().unwrap_or(0)))
        });
        assert_eq!(add.invoke(&[Value::Int(2), Value::Int(3)]).unwrap(), Value::Int(5));
        let first = Invocable::unary(|v| Ok(v.clone()));
        assert_eq!(first.invoke(&[]).unwrap(), Value::Null);
    }

    #[test]
    fn binding_requires_an_object() {
        let err = Invocable::bound(&Value::Int(1), "count").unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
