//! Built-in functions callable as `name(args)` from lambda bodies.
//!
//! String functions count characters, not bytes.

use lq_value::{
    arity_mismatch, integer_overflow, out_of_range, type_mismatch, undefined_function,
    ArrayValue, LinqResult, Value,
};

/// Names of every builtin, for diagnostics and tests.
pub const BUILTIN_NAMES: &[&str] = &[
    "abs",
    "bool",
    "ceil",
    "contains",
    "count",
    "ends_with",
    "float",
    "floor",
    "implode",
    "int",
    "is_array",
    "is_bool",
    "is_float",
    "is_int",
    "is_null",
    "is_string",
    "keys",
    "lower",
    "max",
    "min",
    "round",
    "sqrt",
    "starts_with",
    "str",
    "strlen",
    "substr",
    "trim",
    "upper",
    "values",
];

pub(crate) fn call_builtin(name: &str, args: &[Value]) -> LinqResult<Value> {
    match name {
        "count" => {
            arity(name, args, 1, 1)?;
            count(&args[0])
        }
        "strlen" => {
            arity(name, args, 1, 1)?;
            Ok(Value::index(expect_str(&args[0])?.chars().count()))
        }
        "abs" => {
            arity(name, args, 1, 1)?;
            match &args[0] {
                Value::Int(n) => n
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or_else(|| integer_overflow("abs")),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                other => Err(type_mismatch("number", other.type_name())),
            }
        }
        "min" => extremum(name, args, std::cmp::Ordering::Less),
        "max" => extremum(name, args, std::cmp::Ordering::Greater),
        "floor" => {
            arity(name, args, 1, 1)?;
            Ok(Value::Float(expect_number(&args[0])?.floor()))
        }
        "ceil" => {
            arity(name, args, 1, 1)?;
            Ok(Value::Float(expect_number(&args[0])?.ceil()))
        }
        "round" => {
            arity(name, args, 1, 2)?;
            round(expect_number(&args[0])?, args.get(1))
        }
        "sqrt" => {
            arity(name, args, 1, 1)?;
            Ok(Value::Float(expect_number(&args[0])?.sqrt()))
        }
        "upper" => {
            arity(name, args, 1, 1)?;
            Ok(Value::string(expect_str(&args[0])?.to_uppercase()))
        }
        "lower" => {
            arity(name, args, 1, 1)?;
            Ok(Value::string(expect_str(&args[0])?.to_lowercase()))
        }
        "trim" => {
            arity(name, args, 1, 1)?;
            Ok(Value::string(expect_str(&args[0])?.trim()))
        }
        "substr" => {
            arity(name, args, 2, 3)?;
            substr(&args[0], &args[1], args.get(2))
        }
        "str" => {
            arity(name, args, 1, 1)?;
            Ok(Value::string(
                args[0].to_text().unwrap_or_else(|| args[0].to_string()),
            ))
        }
        "int" => {
            arity(name, args, 1, 1)?;
            to_int(&args[0])
        }
        "float" => {
            arity(name, args, 1, 1)?;
            to_float(&args[0])
        }
        "bool" => {
            arity(name, args, 1, 1)?;
            Ok(Value::Bool(args[0].is_truthy()))
        }
        "is_null" | "is_int" | "is_float" | "is_string" | "is_bool" | "is_array" => {
            arity(name, args, 1, 1)?;
            let v = &args[0];
            Ok(Value::Bool(match name {
                "is_null" => v.is_null(),
                "is_int" => matches!(v, Value::Int(_)),
                "is_float" => matches!(v, Value::Float(_)),
                "is_string" => matches!(v, Value::Str(_)),
                "is_bool" => matches!(v, Value::Bool(_)),
                _ => matches!(v, Value::Array(_)),
            }))
        }
        "starts_with" => {
            arity(name, args, 2, 2)?;
            let (h, n) = (expect_str(&args[0])?, expect_str(&args[1])?);
            Ok(Value::Bool(h.starts_with(n)))
        }
        "ends_with" => {
            arity(name, args, 2, 2)?;
            let (h, n) = (expect_str(&args[0])?, expect_str(&args[1])?);
            Ok(Value::Bool(h.ends_with(n)))
        }
        "contains" => {
            arity(name, args, 2, 2)?;
            match &args[0] {
                Value::Str(h) => Ok(Value::Bool(h.contains(expect_str(&args[1])?))),
                other => {
                    let array = as_array(other)?;
                    let found = array.values().any(|v| *v == args[1]);
                    Ok(Value::Bool(found))
                }
            }
        }
        "implode" => {
            arity(name, args, 2, 2)?;
            let sep = expect_str(&args[0])?;
            let array = as_array(&args[1])?;
            let mut parts = Vec::with_capacity(array.len());
            for v in array.values() {
                parts.push(v.to_text().ok_or_else(|| type_mismatch("scalar", v.type_name()))?);
            }
            Ok(Value::string(parts.join(sep)))
        }
        "keys" => {
            arity(name, args, 1, 1)?;
            Ok(Value::list(as_array(&args[0])?.keys().cloned()))
        }
        "values" => {
            arity(name, args, 1, 1)?;
            Ok(Value::list(as_array(&args[0])?.values().cloned()))
        }
        _ => Err(undefined_function(name)),
    }
}

fn arity(name: &str, args: &[Value], min: usize, max: usize) -> LinqResult<()> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = if min == max {
        min.to_string()
    } else {
        format!("{min} to {max}")
    };
    Err(arity_mismatch(name, expected, args.len()))
}

fn expect_str(v: &Value) -> LinqResult<&str> {
    v.as_str()
        .ok_or_else(|| type_mismatch("string", v.type_name()))
}

fn expect_number(v: &Value) -> LinqResult<f64> {
    v.as_float()
        .ok_or_else(|| type_mismatch("number", v.type_name()))
}

fn expect_int(v: &Value) -> LinqResult<i64> {
    v.as_int().ok_or_else(|| type_mismatch("int", v.type_name()))
}

/// Array view of an array or a materialized object.
fn as_array(v: &Value) -> LinqResult<ArrayValue> {
    match v {
        Value::Array(a) => Ok((**a).clone()),
        Value::Object(o) => match o.materialize()? {
            Value::Array(a) => Ok((*a).clone()),
            other => Err(type_mismatch("array", other.type_name())),
        },
        other => Err(type_mismatch("array", other.type_name())),
    }
}

fn count(v: &Value) -> LinqResult<Value> {
    match v {
        Value::Array(a) => Ok(Value::index(a.len())),
        Value::Object(o) => o.call_method("count", &[]),
        other => Err(type_mismatch("array", other.type_name())),
    }
}

fn extremum(name: &str, args: &[Value], want: std::cmp::Ordering) -> LinqResult<Value> {
    let candidates: Vec<Value> = match args {
        [single @ (Value::Array(_) | Value::Object(_))] => {
            as_array(single)?.values().cloned().collect()
        }
        _ => args.to_vec(),
    };
    let mut iter = candidates.into_iter();
    let Some(mut best) = iter.next() else {
        return Err(arity_mismatch(name, "at least 1", 0));
    };
    for v in iter {
        if v.compare(&best) == want {
            best = v;
        }
    }
    Ok(best)
}

fn round(n: f64, precision: Option<&Value>) -> LinqResult<Value> {
    let digits = match precision {
        None => 0,
        Some(p) => i32::try_from(expect_int(p)?)
            .map_err(|_| out_of_range("precision", "must fit in 32 bits"))?,
    };
    if digits == 0 {
        return Ok(Value::Float(n.round()));
    }
    let scale = 10f64.powi(digits);
    Ok(Value::Float((n * scale).round() / scale))
}

fn substr(s: &Value, start: &Value, len: Option<&Value>) -> LinqResult<Value> {
    let chars: Vec<char> = expect_str(s)?.chars().collect();
    let total = i64::try_from(chars.len()).unwrap_or(i64::MAX);
    let start = expect_int(start)?;
    let from = if start < 0 {
        (total + start).max(0)
    } else {
        start.min(total)
    };
    let to = match len {
        None | Some(Value::Null) => total,
        Some(v) => {
            let len = expect_int(v)?;
            if len < 0 {
                (total + len).max(from)
            } else {
                from.saturating_add(len).min(total)
            }
        }
    };
    let (from, to) = (
        usize::try_from(from).unwrap_or(0),
        usize::try_from(to).unwrap_or(0),
    );
    Ok(Value::string(chars[from..to.max(from)].iter().collect::<String>()))
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "range-checked before truncating"
)]
fn float_to_int(f: f64) -> LinqResult<Value> {
    if f.is_finite() && f >= -9_223_372_036_854_775_808.0 && f < 9_223_372_036_854_775_808.0 {
        Ok(Value::Int(f.trunc() as i64))
    } else {
        Err(integer_overflow("int conversion"))
    }
}

fn to_int(v: &Value) -> LinqResult<Value> {
    match v {
        Value::Int(_) => Ok(v.clone()),
        Value::Float(f) => float_to_int(*f),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Null => Ok(Value::Int(0)),
        Value::Str(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                Ok(Value::Int(n))
            } else if let Ok(f) = s.parse::<f64>() {
                float_to_int(f)
            } else {
                Ok(Value::Int(0))
            }
        }
        other => Err(type_mismatch("scalar", other.type_name())),
    }
}

fn to_float(v: &Value) -> LinqResult<Value> {
    match v {
        Value::Int(_) | Value::Float(_) => Ok(Value::Float(expect_number(v)?)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Null => Ok(Value::Float(0.0)),
        Value::Str(s) => Ok(Value::Float(s.trim().parse::<f64>().unwrap_or(0.0))),
        other => Err(type_mismatch("scalar", other.type_name())),
    }
}
