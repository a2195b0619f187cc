//! Per-invocation iteration context and the call sites that build it.

use std::fmt;

use lq_lambda::LambdaContext;
use lq_value::{no_such_property, type_mismatch, LinqResult, Value};

use crate::Invocable;

/// One-element lookahead into the cursor driving a callback.
pub trait Lookahead {
    /// True if another element follows. May pull (and buffer) one element.
    fn has_more(&mut self) -> LinqResult<bool>;
}

/// A lookahead whose answer is already known.
pub(crate) struct Known(pub(crate) bool);

impl Lookahead for Known {
    fn has_more(&mut self) -> LinqResult<bool> {
        Ok(self.0)
    }
}

/// More elements follow only while both sides have more.
pub(crate) struct Both<'a>(pub(crate) &'a mut dyn Lookahead, pub(crate) &'a mut dyn Lookahead);

impl Lookahead for Both<'_> {
    fn has_more(&mut self) -> LinqResult<bool> {
        Ok(self.0.has_more()? && self.1.has_more()?)
    }
}

/// The record each operator callback receives.
///
/// Created fresh for every invocation. `cancel`, `next_val` and `tag` are
/// the writable slots: setting `cancel` stops the driving operator,
/// `next_val` shows up as `prev_val` on the next invocation of the same
/// callback, and `tag` persists for the whole traversal.
pub struct IterationContext<'a> {
    /// Ordinal of this invocation within the traversal, from zero.
    pub index: usize,
    pub key: Value,
    pub value: Value,
    pub is_first: bool,
    /// Whatever the previous invocation left in `next_val`; `Null` on the
    /// first call.
    pub prev_val: Value,
    /// Reset to `Null` before every call.
    pub next_val: Value,
    pub cancel: bool,
    pub tag: Value,
    lookahead: Option<&'a mut dyn Lookahead>,
}

impl IterationContext<'_> {
    /// Context for a callback invoked outside any traversal, such as a
    /// comparer or a direct [`Invocable::invoke`](crate::Invocable::invoke).
    pub fn detached() -> IterationContext<'static> {
        IterationContext {
            index: 0,
            key: Value::Null,
            value: Value::Null,
            is_first: true,
            prev_val: Value::Null,
            next_val: Value::Null,
            cancel: false,
            tag: Value::Null,
            lookahead: None,
        }
    }

    /// True if no element follows the current one.
    ///
    /// Asks the driving operator on first use, which may peek one element
    /// ahead; the peeked element is not lost. Every operator callback has
    /// a driver. Only a detached context, which belongs to no traversal,
    /// answers `true` on its own.
    pub fn is_last(&mut self) -> LinqResult<bool> {
        match self.lookahead.as_deref_mut() {
            Some(lookahead) => lookahead.has_more().map(|more| !more),
            None => Ok(true),
        }
    }
}

impl LambdaContext for IterationContext<'_> {
    fn read_field(&mut self, field: &str) -> LinqResult<Value> {
        Ok(match field {
            "index" => Value::index(self.index),
            "key" => self.key.clone(),
            "value" => self.value.clone(),
            "isFirst" => Value::Bool(self.is_first),
            "isLast" => Value::Bool(self.is_last()?),
            "prevVal" => self.prev_val.clone(),
            "nextVal" => self.next_val.clone(),
            "cancel" => Value::Bool(self.cancel),
            "tag" => self.tag.clone(),
            _ => return Err(no_such_property(field, "IterationContext")),
        })
    }

    fn write_field(&mut self, field: &str, value: Value) -> LinqResult<()> {
        match field {
            "cancel" => self.cancel = value.is_truthy(),
            "nextVal" => self.next_val = value,
            "tag" => self.tag = value,
            "key" => self.key = value,
            "index" | "value" | "isFirst" | "isLast" | "prevVal" => {
                return Err(type_mismatch("writable context field", field));
            }
            _ => return Err(no_such_property(field, "IterationContext")),
        }
        Ok(())
    }
}

impl fmt::Debug for IterationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterationContext")
            .field("index", &self.index)
            .field("key", &self.key)
            .field("value", &self.value)
            .field("prev_val", &self.prev_val)
            .field("next_val", &self.next_val)
            .field("cancel", &self.cancel)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// What one invocation produced.
pub(crate) struct Outcome {
    pub(crate) value: Value,
    /// The context key after the call; callbacks may rewrite it.
    pub(crate) key: Value,
    pub(crate) cancel: bool,
}

/// Per-operator, per-traversal invocation state: the ordinal, the `tag`
/// and the `nextVal` carried into the next call's `prevVal`.
pub(crate) struct CallSite {
    callback: Invocable,
    index: usize,
    tag: Value,
    carried: Value,
}

impl CallSite {
    pub(crate) fn new(callback: Invocable) -> Self {
        CallSite {
            callback,
            index: 0,
            tag: Value::Null,
            carried: Value::Null,
        }
    }

    pub(crate) fn invoke(
        &mut self,
        args: &[Value],
        key: &Value,
        value: &Value,
        lookahead: &mut dyn Lookahead,
    ) -> LinqResult<Outcome> {
        let mut ctx = IterationContext {
            index: self.index,
            key: key.clone(),
            value: value.clone(),
            is_first: self.index == 0,
            prev_val: std::mem::take(&mut self.carried),
            next_val: Value::Null,
            cancel: false,
            tag: std::mem::take(&mut self.tag),
            lookahead: Some(lookahead),
        };
        let result = self.callback.call(args, &mut ctx);
        self.index += 1;
        self.carried = ctx.next_val;
        self.tag = ctx.tag;
        Ok(Outcome {
            value: result?,
            key: ctx.key,
            cancel: ctx.cancel,
        })
    }

    /// Invoke with the element calling convention `(value, key)`.
    pub(crate) fn invoke_element(
        &mut self,
        key: &Value,
        value: &Value,
        lookahead: &mut dyn Lookahead,
    ) -> LinqResult<Outcome> {
        self.invoke(&[value.clone(), key.clone()], key, value, lookahead)
    }
}

#[cfg(test)]
mod tests;
