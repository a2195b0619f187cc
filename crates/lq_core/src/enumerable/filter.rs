//! Filtering and partitioning operators.

use lq_value::{invalid_argument, type_mismatch, LinqResult, Value};

use crate::context::CallSite;
use crate::source::{cursor_fn, Upstream};
use crate::{Enumerable, IntoInvocable};

impl Enumerable {
    /// Elements for which `predicate(value, key)` is truthy.
    ///
    /// A cancelling invocation ends the sequence; its element is still
    /// emitted if it passed.
    pub fn where_(&self, predicate: impl IntoInvocable) -> LinqResult<Enumerable> {
        let predicate = predicate.into_invocable()?;
        let upstream = self.clone();
        Ok(self.node("where", move || {
            let mut up = Upstream::open(&upstream)?;
            let mut site = CallSite::new(predicate.clone());
            let mut stopped = false;
            Ok(cursor_fn(move || {
                while !stopped {
                    let Some((key, value)) = up.pull()? else {
                        return Ok(None);
                    };
                    let out = site.invoke_element(&key, &value, &mut up)?;
                    stopped = out.cancel;
                    if out.value.is_truthy() {
                        return Ok(Some((key, value)));
                    }
                }
                Ok(None)
            }))
        }))
    }

    /// The first `count` elements.
    pub fn take(&self, count: usize) -> Enumerable {
        let upstream = self.clone();
        self.node("take", move || {
            let mut up = Upstream::open(&upstream)?;
            let mut left = count;
            Ok(cursor_fn(move || {
                if left == 0 {
                    return Ok(None);
                }
                left -= 1;
                up.pull()
            }))
        })
    }

    /// Everything after the first `count` elements.
    pub fn skip(&self, count: usize) -> Enumerable {
        let upstream = self.clone();
        self.node("skip", move || {
            let mut up = Upstream::open(&upstream)?;
            let mut pending = count;
            Ok(cursor_fn(move || {
                while pending > 0 {
                    pending -= 1;
                    if up.pull()?.is_none() {
                        return Ok(None);
                    }
                }
                up.pull()
            }))
        })
    }

    /// Elements up to (not including) the first one failing `predicate`.
    pub fn take_while(&self, predicate: impl IntoInvocable) -> LinqResult<Enumerable> {
        let predicate = predicate.into_invocable()?;
        let upstream = self.clone();
        Ok(self.node("take_while", move || {
            let mut up = Upstream::open(&upstream)?;
            let mut site = CallSite::new(predicate.clone());
            let mut stopped = false;
            Ok(cursor_fn(move || {
                if stopped {
                    return Ok(None);
                }
                let Some((key, value)) = up.pull()? else {
                    return Ok(None);
                };
                let out = site.invoke_element(&key, &value, &mut up)?;
                stopped = out.cancel || !out.value.is_truthy();
                Ok(out.value.is_truthy().then_some((key, value)))
            }))
        }))
    }

    /// Elements from the first one failing `predicate` onwards.
    ///
    /// A cancelling invocation ends the skipping phase.
    pub fn skip_while(&self, predicate: impl IntoInvocable) -> LinqResult<Enumerable> {
        let predicate = predicate.into_invocable()?;
        let upstream = self.clone();
        Ok(self.node("skip_while", move || {
            let mut up = Upstream::open(&upstream)?;
            let mut site = CallSite::new(predicate.clone());
            let mut skipping = true;
            Ok(cursor_fn(move || {
                while skipping {
                    let Some((key, value)) = up.pull()? else {
                        return Ok(None);
                    };
                    let out = site.invoke_element(&key, &value, &mut up)?;
                    if out.cancel {
                        skipping = false;
                    }
                    if !out.value.is_truthy() {
                        skipping = false;
                        return Ok(Some((key, value)));
                    }
                }
                up.pull()
            }))
        }))
    }

    /// Elements whose value is of the named type.
    ///
    /// Names: `null`, `bool`, `int`, `float`, `number` (int or float),
    /// `string`, `array`, `object` (any engine object), or an engine type
    /// name such as `Grouping`.
    pub fn of_type(&self, type_name: &str) -> LinqResult<Enumerable> {
        let filter = TypeFilter::parse(type_name)?;
        let upstream = self.clone();
        Ok(self.node("of_type", move || {
            let mut up = Upstream::open(&upstream)?;
            let filter = filter.clone();
            Ok(cursor_fn(move || {
                while let Some((key, value)) = up.pull()? {
                    if filter.matches(&value) {
                        return Ok(Some((key, value)));
                    }
                }
                Ok(None)
            }))
        }))
    }

    /// Convert every value to `null`, `bool`, `int`, `float`, `string` or
    /// `array`. A value that cannot convert is a type mismatch.
    pub fn cast(&self, type_name: &str) -> LinqResult<Enumerable> {
        let target = match TypeFilter::parse(type_name)? {
            TypeFilter::Named(target) => target,
            TypeFilter::Number | TypeFilter::AnyObject | TypeFilter::Object(_) => {
                return Err(invalid_argument(
                    "type_name",
                    format!("cannot cast to `{type_name}`"),
                ))
            }
        };
        let upstream = self.clone();
        Ok(self.node("cast", move || {
            let mut up = Upstream::open(&upstream)?;
            Ok(cursor_fn(move || match up.pull()? {
                Some((key, value)) => Ok(Some((key, convert(&value, target)?))),
                None => Ok(None),
            }))
        }))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Target {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Array,
}

#[derive(Clone, Debug)]
enum TypeFilter {
    Named(Target),
    Number,
    AnyObject,
    Object(String),
}

impl TypeFilter {
    fn parse(name: &str) -> LinqResult<Self> {
        Ok(match name {
            "null" => TypeFilter::Named(Target::Null),
            "bool" | "boolean" => TypeFilter::Named(Target::Bool),
            "int" | "integer" => TypeFilter::Named(Target::Int),
            "float" | "double" => TypeFilter::Named(Target::Float),
            "string" => TypeFilter::Named(Target::Str),
            "array" => TypeFilter::Named(Target::Array),
            "number" | "numeric" => TypeFilter::Number,
            "object" => TypeFilter::AnyObject,
            "" => return Err(invalid_argument("type_name", "empty type name")),
            other => TypeFilter::Object(other.to_string()),
        })
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            TypeFilter::Named(target) => {
                matches!(
                    (target, value),
                    (Target::Null, Value::Null)
                        | (Target::Bool, Value::Bool(_))
                        | (Target::Int, Value::Int(_))
                        | (Target::Float, Value::Float(_))
                        | (Target::Str, Value::Str(_))
                        | (Target::Array, Value::Array(_))
                )
            }
            TypeFilter::Number => matches!(value, Value::Int(_) | Value::Float(_)),
            TypeFilter::AnyObject => matches!(value, Value::Object(_)),
            TypeFilter::Object(name) => {
                matches!(value, Value::Object(_)) && value.type_name() == name
            }
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "float to int cast truncates toward zero and saturates"
)]
fn convert(value: &Value, target: Target) -> LinqResult<Value> {
    let fail = || type_mismatch(target_name(target), value.type_name());
    Ok(match target {
        Target::Null => Value::Null,
        Target::Bool => Value::Bool(value.is_truthy()),
        Target::Int => match value {
            Value::Null => Value::Int(0),
            Value::Bool(b) => Value::Int(i64::from(*b)),
            Value::Int(n) => Value::Int(*n),
            Value::Float(f) if f.is_finite() => Value::Int(f.trunc() as i64),
            Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| fail())?,
            _ => return Err(fail()),
        },
        Target::Float => match value {
            Value::Null => Value::Float(0.0),
            Value::Bool(b) => Value::Float(f64::from(u8::from(*b))),
            Value::Int(_) | Value::Float(_) => Value::Float(value.as_float().ok_or_else(fail)?),
            Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| fail())?,
            _ => return Err(fail()),
        },
        Target::Str => Value::string(value.to_text().ok_or_else(fail)?),
        Target::Array => match value {
            Value::Null => Value::list([]),
            Value::Array(_) => value.clone(),
            Value::Object(object) => object.materialize()?,
            scalar => Value::list([scalar.clone()]),
        },
    })
}

fn target_name(target: Target) -> &'static str {
    match target {
        Target::Null => "null",
        Target::Bool => "bool",
        Target::Int => "int",
        Target::Float => "float",
        Target::Str => "string",
        Target::Array => "array",
    }
}
