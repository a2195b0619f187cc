//! Projection operators.
//!
//! A cancelling callback still has its element emitted; the sequence ends
//! after it.

use std::collections::VecDeque;

use lq_value::{LinqResult, Value};

use crate::context::{CallSite, Lookahead};
use crate::source::{cursor_fn, Upstream};
use crate::{Enumerable, IntoInvocable, Invocable};

impl Enumerable {
    /// Replace each value with `selector(value, key)`; keys are kept.
    pub fn select(&self, selector: impl IntoInvocable) -> LinqResult<Enumerable> {
        self.map_node("select", selector.into_invocable()?, |key, _, out| (key, out))
    }

    /// Replace each key with `selector(value, key)`; values are kept.
    pub fn select_key(&self, selector: impl IntoInvocable) -> LinqResult<Enumerable> {
        self.map_node("select_key", selector.into_invocable()?, |_, value, out| {
            (out, value)
        })
    }

    /// Run `action(value, key)` for its side effects and pass the element
    /// through unchanged.
    pub fn call(&self, action: impl IntoInvocable) -> LinqResult<Enumerable> {
        self.map_node("call", action.into_invocable()?, |key, value, _| (key, value))
    }

    fn map_node(
        &self,
        name: &'static str,
        callback: Invocable,
        emit: fn(Value, Value, Value) -> (Value, Value),
    ) -> LinqResult<Enumerable> {
        let upstream = self.clone();
        Ok(self.node(name, move || {
            let mut up = Upstream::open(&upstream)?;
            let mut site = CallSite::new(callback.clone());
            let mut stopped = false;
            Ok(cursor_fn(move || {
                if stopped {
                    return Ok(None);
                }
                let Some((key, value)) = up.pull()? else {
                    return Ok(None);
                };
                let out = site.invoke_element(&key, &value, &mut up)?;
                stopped = out.cancel;
                Ok(Some(emit(key, value, out.value)))
            }))
        }))
    }

    /// Flatten `collection_selector(value, key)`, which must return an
    /// array or a sequence. Keys are renumbered `0..`.
    pub fn select_many(&self, collection_selector: impl IntoInvocable) -> LinqResult<Enumerable> {
        Ok(self.flat_map_node(collection_selector.into_invocable()?, None, None))
    }

    /// Flatten with a result selector and an optional key selector.
    ///
    /// Both receive `(inner value, outer value, inner key, outer key)`.
    /// Without a key selector keys are renumbered `0..`.
    pub fn select_many_with(
        &self,
        collection_selector: impl IntoInvocable,
        result_selector: impl IntoInvocable,
        key_selector: Option<Invocable>,
    ) -> LinqResult<Enumerable> {
        let collection = collection_selector.into_invocable()?;
        let result = result_selector.into_invocable()?;
        Ok(self.flat_map_node(collection, Some(result), key_selector))
    }

    fn flat_map_node(
        &self,
        collection: Invocable,
        result: Option<Invocable>,
        key: Option<Invocable>,
    ) -> Enumerable {
        let upstream = self.clone();
        self.node("select_many", move || {
            let mut feed = Expansions::open(&upstream, collection.clone())?;
            let mut result_site = result.clone().map(CallSite::new);
            let mut key_site = key.clone().map(CallSite::new);
            let mut current: Option<Expansion> = None;
            let mut stopped = false;
            let mut position = 0;
            Ok(cursor_fn(move || loop {
                if stopped {
                    return Ok(None);
                }
                if let Some(exp) = current.as_mut() {
                    if let Some((inner_key, inner_value)) = exp.inner.pull()? {
                        let args = [
                            inner_value.clone(),
                            exp.value.clone(),
                            inner_key.clone(),
                            exp.key.clone(),
                        ];
                        let value = match result_site.as_mut() {
                            Some(site) => {
                                let mut ahead = FlatAhead {
                                    inner: &mut exp.inner,
                                    rest: &mut feed,
                                };
                                let out =
                                    site.invoke(&args, &inner_key, &inner_value, &mut ahead)?;
                                stopped |= out.cancel;
                                out.value
                            }
                            None => inner_value,
                        };
                        let key = match key_site.as_mut() {
                            Some(site) => {
                                let mut ahead = FlatAhead {
                                    inner: &mut exp.inner,
                                    rest: &mut feed,
                                };
                                let out = site.invoke(&args, &args[2], &args[0], &mut ahead)?;
                                stopped |= out.cancel;
                                out.value
                            }
                            None => Value::index(position),
                        };
                        position += 1;
                        return Ok(Some((key, value)));
                    }
                    current = None;
                }
                let Some(exp) = feed.next()? else {
                    return Ok(None);
                };
                current = Some(exp);
            }))
        })
    }

    /// Keys as values, keyed `0..`.
    pub fn keys(&self) -> Enumerable {
        self.renumber("keys", |key, _| key)
    }

    /// Values, keyed `0..`.
    pub fn values(&self) -> Enumerable {
        self.renumber("values", |_, value| value)
    }

    fn renumber(&self, name: &'static str, pick: fn(Value, Value) -> Value) -> Enumerable {
        let upstream = self.clone();
        self.node(name, move || {
            let mut up = Upstream::open(&upstream)?;
            let mut position = 0;
            Ok(cursor_fn(move || {
                let Some((key, value)) = up.pull()? else {
                    return Ok(None);
                };
                let pair = (Value::index(position), pick(key, value));
                position += 1;
                Ok(Some(pair))
            }))
        })
    }
}

/// One outer element of `select_many` with a cursor over its collection.
struct Expansion {
    inner: Upstream,
    key: Value,
    value: Value,
}

/// Outer side of `select_many`. A callback asking `is_last` may expand
/// further outer elements ahead of time.
struct Expansions {
    up: Upstream,
    site: CallSite,
    pending: VecDeque<Expansion>,
    ended: bool,
}

impl Expansions {
    fn open(outer: &Enumerable, collection: Invocable) -> LinqResult<Self> {
        Ok(Expansions {
            up: Upstream::open(outer)?,
            site: CallSite::new(collection),
            pending: VecDeque::new(),
            ended: false,
        })
    }

    fn next(&mut self) -> LinqResult<Option<Expansion>> {
        match self.pending.pop_front() {
            Some(exp) => Ok(Some(exp)),
            None => self.fetch(),
        }
    }

    /// A cancelling collection selector keeps its collection and ends the
    /// outer side.
    fn fetch(&mut self) -> LinqResult<Option<Expansion>> {
        if self.ended {
            return Ok(None);
        }
        let Some((key, value)) = self.up.pull()? else {
            self.ended = true;
            return Ok(None);
        };
        let out = self.site.invoke_element(&key, &value, &mut self.up)?;
        self.ended = out.cancel;
        let collection = Enumerable::from_value(&out.value)?;
        Ok(Some(Expansion {
            inner: Upstream::open(&collection)?,
            key,
            value,
        }))
    }

    /// True if a collection still to come has an element.
    fn element_ahead(&mut self) -> LinqResult<bool> {
        for exp in &mut self.pending {
            if exp.inner.has_more()? {
                return Ok(true);
            }
        }
        while let Some(mut exp) = self.fetch()? {
            let hit = exp.inner.has_more()?;
            self.pending.push_back(exp);
            if hit {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

struct FlatAhead<'a> {
    inner: &'a mut Upstream,
    rest: &'a mut Expansions,
}

impl Lookahead for FlatAhead<'_> {
    fn has_more(&mut self) -> LinqResult<bool> {
        Ok(self.inner.has_more()? || self.rest.element_ahead()?)
    }
}
