//! Sequence methods reachable from micro-lambdas (`$seq->count()`,
//! `$g->where('$x => $x > 1')->sum()`).
//!
//! Callable arguments arrive as lambda text. Lazy operators return the new
//! sequence wrapped in a value.

use std::any::Any;
use std::ops::RangeInclusive;

use lq_value::{
    arity_mismatch, no_such_method, out_of_range, type_mismatch, LinqResult, Object, Value,
};

use crate::invocable::from_value;
use crate::{Enumerable, Invocable};

impl Object for Enumerable {
    fn type_name(&self) -> &'static str {
        "Enumerable"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn call_method(&self, name: &str, args: &[Value]) -> LinqResult<Value> {
        let seq = |e: Enumerable| -> LinqResult<Value> { Ok(Value::object(e)) };
        match name {
            // ── Lazy ────────────────────────────────────────────────
            "where" => {
                expect_arg_count(name, 1..=1, args)?;
                seq(self.where_(from_value(name, &args[0])?)?)
            }
            "select" => {
                expect_arg_count(name, 1..=1, args)?;
                seq(self.select(from_value(name, &args[0])?)?)
            }
            "selectKey" => {
                expect_arg_count(name, 1..=1, args)?;
                seq(self.select_key(from_value(name, &args[0])?)?)
            }
            "selectMany" => {
                expect_arg_count(name, 1..=1, args)?;
                seq(self.select_many(from_value(name, &args[0])?)?)
            }
            "take" => {
                expect_arg_count(name, 1..=1, args)?;
                seq(self.take(count_arg(name, &args[0])?))
            }
            "skip" => {
                expect_arg_count(name, 1..=1, args)?;
                seq(self.skip(count_arg(name, &args[0])?))
            }
            "takeWhile" => {
                expect_arg_count(name, 1..=1, args)?;
                seq(self.take_while(from_value(name, &args[0])?)?)
            }
            "skipWhile" => {
                expect_arg_count(name, 1..=1, args)?;
                seq(self.skip_while(from_value(name, &args[0])?)?)
            }
            "distinct" => {
                expect_arg_count(name, 0..=0, args)?;
                seq(self.distinct(None))
            }
            "orderBy" | "orderByDescending" => {
                expect_arg_count(name, 0..=1, args)?;
                let descending = name == "orderByDescending";
                let ordered = match (optional_lambda(name, args, 0)?, descending) {
                    (Some(selector), false) => self.order_by(selector, None)?,
                    (Some(selector), true) => self.order_by_descending(selector, None)?,
                    (None, false) => self.order(None),
                    (None, true) => self.order_descending(None),
                };
                seq(ordered.into_inner())
            }
            "reverse" => {
                expect_arg_count(name, 0..=0, args)?;
                seq(self.reverse())
            }
            "keys" => {
                expect_arg_count(name, 0..=0, args)?;
                seq(self.keys())
            }
            "values" => {
                expect_arg_count(name, 0..=0, args)?;
                seq(self.values())
            }
            "concat" => {
                expect_arg_count(name, 1..=1, args)?;
                seq(self.concat(&args[0])?)
            }
            "groupBy" => {
                expect_arg_count(name, 1..=1, args)?;
                seq(self.group_by(from_value(name, &args[0])?)?)
            }

            // ── Terminal ────────────────────────────────────────────
            "count" => {
                expect_arg_count(name, 0..=1, args)?;
                let n = match optional_lambda(name, args, 0)? {
                    Some(predicate) => self.count_where(predicate)?,
                    None => self.count()?,
                };
                Ok(Value::index(n))
            }
            "sum" => {
                expect_arg_count(name, 0..=1, args)?;
                self.sum(optional_lambda(name, args, 0)?)
            }
            "average" => {
                expect_arg_count(name, 0..=1, args)?;
                self.average(optional_lambda(name, args, 0)?)
            }
            "min" => {
                expect_arg_count(name, 0..=1, args)?;
                self.min(optional_lambda(name, args, 0)?)
            }
            "max" => {
                expect_arg_count(name, 0..=1, args)?;
                self.max(optional_lambda(name, args, 0)?)
            }
            "first" => {
                expect_arg_count(name, 0..=1, args)?;
                self.first(optional_lambda(name, args, 0)?)
            }
            "last" => {
                expect_arg_count(name, 0..=1, args)?;
                self.last(optional_lambda(name, args, 0)?)
            }
            "single" => {
                expect_arg_count(name, 0..=1, args)?;
                self.single(optional_lambda(name, args, 0)?)
            }
            "firstOrDefault" => {
                expect_arg_count(name, 0..=2, args)?;
                let default = args.first().cloned().unwrap_or_default();
                self.first_or_default(default, optional_lambda(name, args, 1)?)
            }
            "lastOrDefault" => {
                expect_arg_count(name, 0..=2, args)?;
                let default = args.first().cloned().unwrap_or_default();
                self.last_or_default(default, optional_lambda(name, args, 1)?)
            }
            "any" => {
                expect_arg_count(name, 0..=1, args)?;
                Ok(Value::Bool(match optional_lambda(name, args, 0)? {
                    Some(predicate) => self.any_where(predicate)?,
                    None => self.any()?,
                }))
            }
            "all" => {
                expect_arg_count(name, 1..=1, args)?;
                Ok(Value::Bool(self.all(from_value(name, &args[0])?)?))
            }
            "contains" => {
                expect_arg_count(name, 1..=1, args)?;
                Ok(Value::Bool(self.contains(&args[0], None)?))
            }
            "aggregate" => {
                expect_arg_count(name, 1..=2, args)?;
                self.aggregate(from_value(name, &args[0])?, args.get(1).cloned())
            }
            "elementAt" => {
                expect_arg_count(name, 1..=1, args)?;
                self.element_at(&args[0])
            }
            "elementAtOrDefault" => {
                expect_arg_count(name, 1..=2, args)?;
                let default = args.get(1).cloned().unwrap_or_default();
                self.element_at_or_default(&args[0], default)
            }
            "get" => {
                expect_arg_count(name, 1..=1, args)?;
                self.element_at_or_default(&args[0], Value::Null)
            }
            "indexOf" => {
                expect_arg_count(name, 1..=1, args)?;
                Ok(self.index_of(&args[0])?.unwrap_or_default())
            }
            "implode" => {
                expect_arg_count(name, 0..=2, args)?;
                let separator = match args.first() {
                    None => String::new(),
                    Some(sep) => sep
                        .to_text()
                        .ok_or_else(|| type_mismatch("string", sep.type_name()))?,
                };
                let text = self.implode(&separator, optional_lambda(name, args, 1)?)?;
                Ok(Value::string(text))
            }
            "toArray" => {
                expect_arg_count(name, 0..=0, args)?;
                Ok(Value::array(self.to_array()?))
            }
            "toList" => {
                expect_arg_count(name, 0..=0, args)?;
                Ok(Value::list(self.to_list()?))
            }
            "toJson" => {
                expect_arg_count(name, 0..=0, args)?;
                Ok(Value::string(self.to_json()?))
            }
            _ => Err(no_such_method(name, "Enumerable")),
        }
    }

    fn materialize(&self) -> LinqResult<Value> {
        Ok(Value::array(self.to_array()?))
    }
}

fn expect_arg_count(
    name: &str,
    expected: RangeInclusive<usize>,
    args: &[Value],
) -> LinqResult<()> {
    if expected.contains(&args.len()) {
        return Ok(());
    }
    let (lo, hi) = (*expected.start(), *expected.end());
    let expected = if lo == hi {
        lo.to_string()
    } else {
        format!("{lo} to {hi}")
    };
    Err(arity_mismatch(name, expected, args.len()))
}

/// Lambda text at `i`; absent or `null` means none.
fn optional_lambda(name: &str, args: &[Value], i: usize) -> LinqResult<Option<Invocable>> {
    match args.get(i) {
        None | Some(Value::Null) => Ok(None),
        Some(text) => from_value(name, text).map(Some),
    }
}

fn count_arg(name: &str, value: &Value) -> LinqResult<usize> {
    match value {
        Value::Int(n) => usize::try_from(*n)
            .map_err(|_| out_of_range(name, format!("count must not be negative, got {n}"))),
        other => Err(type_mismatch("int", other.type_name())),
    }
}
