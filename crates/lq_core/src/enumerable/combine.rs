//! Operators that combine or rearrange whole sequences.

use lq_value::{LinqResult, Value};

use crate::context::{Both, CallSite};
use crate::source::{cursor_fn, FnSource, Upstream};
use crate::{Enumerable, IntoEnumerable, IntoInvocable, Pair};

impl Enumerable {
    /// `self` followed by `other`, keys kept from each.
    pub fn concat(&self, other: impl IntoEnumerable) -> LinqResult<Enumerable> {
        let other = other.into_enumerable()?;
        let first = self.clone();
        let restartable = first.is_restartable() && other.is_restartable();
        Ok(Enumerable::from_source(FnSource::new(
            "concat",
            restartable,
            move || {
                let mut current = Upstream::open(&first)?;
                let mut next = Some(other.clone());
                Ok(cursor_fn(move || loop {
                    if let Some(pair) = current.pull()? {
                        return Ok(Some(pair));
                    }
                    match next.take() {
                        Some(seq) => current = Upstream::open(&seq)?,
                        None => return Ok(None),
                    }
                }))
            },
        )))
    }

    /// `self` followed by one element. The key defaults to `Null`.
    pub fn append(&self, value: Value, key: Option<Value>) -> Enumerable {
        let pair = (key.unwrap_or_default(), value);
        let upstream = self.clone();
        self.node("append", move || {
            let mut up = Upstream::open(&upstream)?;
            let mut tail = Some(pair.clone());
            Ok(cursor_fn(move || match up.pull()? {
                Some(pair) => Ok(Some(pair)),
                None => Ok(tail.take()),
            }))
        })
    }

    /// One element followed by `self`. The key defaults to `Null`.
    pub fn prepend(&self, value: Value, key: Option<Value>) -> Enumerable {
        let pair = (key.unwrap_or_default(), value);
        let upstream = self.clone();
        self.node("prepend", move || {
            let mut head = Some(pair.clone());
            let mut up = None;
            let upstream = upstream.clone();
            Ok(cursor_fn(move || {
                if let Some(pair) = head.take() {
                    return Ok(Some(pair));
                }
                if up.is_none() {
                    up = Some(Upstream::open(&upstream)?);
                }
                match up.as_mut() {
                    Some(up) => up.pull(),
                    None => Ok(None),
                }
            }))
        })
    }

    /// Pairwise combination, `result_selector(a, b, key_a, key_b)`, keyed
    /// by the outer key. Ends with the shorter sequence.
    pub fn zip(
        &self,
        other: impl IntoEnumerable,
        result_selector: impl IntoInvocable,
    ) -> LinqResult<Enumerable> {
        let other = other.into_enumerable()?;
        let selector = result_selector.into_invocable()?;
        let first = self.clone();
        let restartable = first.is_restartable() && other.is_restartable();
        Ok(Enumerable::from_source(FnSource::new("zip", restartable, move || {
            let mut left = Upstream::open(&first)?;
            let mut right = Upstream::open(&other)?;
            let mut site = CallSite::new(selector.clone());
            let mut stopped = false;
            Ok(cursor_fn(move || {
                if stopped {
                    return Ok(None);
                }
                let Some((key_a, a)) = left.pull()? else {
                    return Ok(None);
                };
                let Some((key_b, b)) = right.pull()? else {
                    return Ok(None);
                };
                let args = [a.clone(), b, key_a.clone(), key_b];
                let out = site.invoke(&args, &key_a, &a, &mut Both(&mut left, &mut right))?;
                stopped = out.cancel;
                Ok(Some((key_a, out.value)))
            }))
        })))
    }

    /// `self`, or a single `(0, default)` if `self` is empty.
    pub fn default_if_empty(&self, default: Value) -> Enumerable {
        let upstream = self.clone();
        self.node("default_if_empty", move || {
            let mut up = Upstream::open(&upstream)?;
            let mut fallback = Some((Value::Int(0), default.clone()));
            Ok(cursor_fn(move || match up.pull()? {
                Some(pair) => {
                    fallback = None;
                    Ok(Some(pair))
                }
                None => Ok(fallback.take()),
            }))
        })
    }

    /// Elements in reverse order, keys kept. Buffers the whole upstream on
    /// the first pull.
    pub fn reverse(&self) -> Enumerable {
        let upstream = self.clone();
        self.node("reverse", move || {
            let upstream = upstream.clone();
            let mut buffer: Option<Vec<Pair>> = None;
            Ok(cursor_fn(move || {
                if buffer.is_none() {
                    buffer = Some(upstream.collect_pairs()?);
                }
                Ok(buffer.as_mut().and_then(Vec::pop))
            }))
        })
    }
}
