//! Joins and grouping.

use std::collections::VecDeque;

use lq_value::{LinqResult, Value};

use crate::comparer::KeyIndex;
use crate::context::{CallSite, Known, Lookahead};
use crate::source::{cursor_fn, FnSource, Upstream};
use crate::{
    Enumerable, EqualityComparer, Grouping, IntoEnumerable, IntoInvocable, Invocable, Lookup, Pair,
};

/// Inner elements bucketed by join key.
struct JoinIndex {
    keys: KeyIndex,
    buckets: Vec<Vec<Pair>>,
}

impl JoinIndex {
    fn build(
        seq: &Enumerable,
        key_selector: &Invocable,
        comparer: EqualityComparer,
    ) -> LinqResult<Self> {
        let mut up = Upstream::open(seq)?;
        let mut site = CallSite::new(key_selector.clone());
        let mut index = JoinIndex {
            keys: KeyIndex::new(comparer),
            buckets: Vec::new(),
        };
        while let Some((key, value)) = up.pull()? {
            let out = site.invoke_element(&key, &value, &mut up)?;
            let (slot, is_new) = index.keys.insert(out.value)?;
            if is_new {
                index.buckets.push(Vec::new());
            }
            if let Some(bucket) = index.buckets.get_mut(slot) {
                bucket.push((key, value));
            }
            if out.cancel {
                break;
            }
        }
        Ok(index)
    }

    fn matches(&self, join_key: &Value) -> LinqResult<&[Pair]> {
        Ok(self
            .keys
            .find(join_key)?
            .and_then(|slot| self.buckets.get(slot))
            .map_or(&[][..], Vec::as_slice))
    }
}

struct OuterItem {
    join_key: Value,
    key: Value,
    value: Value,
}

/// Outer side of a join. Join keys are computed as elements are pulled;
/// asking `is_last` may pull and key further outer elements ahead of time.
struct OuterFeed {
    up: Upstream,
    key_site: CallSite,
    pending: VecDeque<OuterItem>,
    ended: bool,
}

impl OuterFeed {
    fn open(outer: &Enumerable, key_selector: Invocable) -> LinqResult<Self> {
        Ok(OuterFeed {
            up: Upstream::open(outer)?,
            key_site: CallSite::new(key_selector),
            pending: VecDeque::new(),
            ended: false,
        })
    }

    fn next(&mut self) -> LinqResult<Option<OuterItem>> {
        match self.pending.pop_front() {
            Some(item) => Ok(Some(item)),
            None => self.fetch(),
        }
    }

    /// A cancelling key selector keeps its element and ends the feed.
    fn fetch(&mut self) -> LinqResult<Option<OuterItem>> {
        if self.ended {
            return Ok(None);
        }
        let Some((key, value)) = self.up.pull()? else {
            self.ended = true;
            return Ok(None);
        };
        let out = self.key_site.invoke_element(&key, &value, &mut self.up)?;
        self.ended = out.cancel;
        Ok(Some(OuterItem {
            join_key: out.value,
            key,
            value,
        }))
    }

    /// True if some outer element still to come has a match.
    fn match_ahead(&mut self, index: &JoinIndex) -> LinqResult<bool> {
        for item in &self.pending {
            if !index.matches(&item.join_key)?.is_empty() {
                return Ok(true);
            }
        }
        while let Some(item) = self.fetch()? {
            let hit = !index.matches(&item.join_key)?.is_empty();
            self.pending.push_back(item);
            if hit {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

struct JoinAhead<'a> {
    index: &'a JoinIndex,
    more_in_bucket: bool,
    feed: &'a mut OuterFeed,
}

impl Lookahead for JoinAhead<'_> {
    fn has_more(&mut self) -> LinqResult<bool> {
        if self.more_in_bucket {
            return Ok(true);
        }
        self.feed.match_ahead(self.index)
    }
}

impl Enumerable {
    /// Inner join on `outer_key(o) == inner_key(i)`.
    ///
    /// Emits `result(o, i, outer key, inner key)` for every matching pair,
    /// outer order first, keyed `0..`.
    pub fn join(
        &self,
        inner: impl IntoEnumerable,
        outer_key: impl IntoInvocable,
        inner_key: impl IntoInvocable,
        result: impl IntoInvocable,
        comparer: Option<EqualityComparer>,
    ) -> LinqResult<Enumerable> {
        let inner = inner.into_enumerable()?;
        let outer_key = outer_key.into_invocable()?;
        let inner_key = inner_key.into_invocable()?;
        let result = result.into_invocable()?;
        let comparer = comparer.unwrap_or_default();
        let outer = self.clone();
        let restartable = outer.is_restartable() && inner.is_restartable();
        Ok(Enumerable::from_source(FnSource::new("join", restartable, move || {
            let index = JoinIndex::build(&inner, &inner_key, comparer.clone())?;
            let mut feed = OuterFeed::open(&outer, outer_key.clone())?;
            let mut result_site = CallSite::new(result.clone());
            let mut current: Option<OuterItem> = None;
            let mut pos = 0;
            let mut position = 0;
            let mut stopped = false;
            Ok(cursor_fn(move || loop {
                if stopped {
                    return Ok(None);
                }
                if let Some(item) = current.as_ref() {
                    let matches = index.matches(&item.join_key)?;
                    if let Some((inner_k, inner_v)) = matches.get(pos) {
                        pos += 1;
                        let args = [
                            item.value.clone(),
                            inner_v.clone(),
                            item.key.clone(),
                            inner_k.clone(),
                        ];
                        let mut ahead = JoinAhead {
                            index: &index,
                            more_in_bucket: pos < matches.len(),
                            feed: &mut feed,
                        };
                        let out = result_site.invoke(&args, &item.key, &item.value, &mut ahead)?;
                        stopped = out.cancel;
                        let pair = (Value::index(position), out.value);
                        position += 1;
                        return Ok(Some(pair));
                    }
                    current = None;
                }
                let Some(item) = feed.next()? else {
                    return Ok(None);
                };
                pos = 0;
                current = Some(item);
            }))
        })))
    }

    /// Per outer element, `result(o, matches, outer key)` where `matches`
    /// is a sequence of the matching inner values (possibly empty). Keyed
    /// by the outer key.
    pub fn group_join(
        &self,
        inner: impl IntoEnumerable,
        outer_key: impl IntoInvocable,
        inner_key: impl IntoInvocable,
        result: impl IntoInvocable,
        comparer: Option<EqualityComparer>,
    ) -> LinqResult<Enumerable> {
        let inner = inner.into_enumerable()?;
        let outer_key = outer_key.into_invocable()?;
        let inner_key = inner_key.into_invocable()?;
        let result = result.into_invocable()?;
        let comparer = comparer.unwrap_or_default();
        let outer = self.clone();
        let restartable = outer.is_restartable() && inner.is_restartable();
        Ok(Enumerable::from_source(FnSource::new("group_join", restartable, move || {
            let index = JoinIndex::build(&inner, &inner_key, comparer.clone())?;
            let mut up = Upstream::open(&outer)?;
            let mut key_site = CallSite::new(outer_key.clone());
            let mut result_site = CallSite::new(result.clone());
            let mut stopped = false;
            Ok(cursor_fn(move || {
                if stopped {
                    return Ok(None);
                }
                let Some((key, value)) = up.pull()? else {
                    return Ok(None);
                };
                let join_key = key_site.invoke_element(&key, &value, &mut up)?;
                let matched: Vec<Value> = index
                    .matches(&join_key.value)?
                    .iter()
                    .map(|(_, v)| v.clone())
                    .collect();
                let args = [
                    value.clone(),
                    Value::object(Enumerable::from_values(matched)),
                    key.clone(),
                ];
                let out = result_site.invoke(&args, &key, &value, &mut up)?;
                stopped = join_key.cancel || out.cancel;
                Ok(Some((key, out.value)))
            }))
        })))
    }

    /// One [`Grouping`] per distinct `key_selector(value, key)`, in
    /// first-seen order, keyed by the group key.
    pub fn group_by(&self, key_selector: impl IntoInvocable) -> LinqResult<Enumerable> {
        self.group_by_with(key_selector, None, None, None)
    }

    /// Grouping with optional element projection, a result selector
    /// receiving `(grouping, group key)` and a key comparer.
    pub fn group_by_with(
        &self,
        key_selector: impl IntoInvocable,
        element_selector: Option<Invocable>,
        result_selector: Option<Invocable>,
        comparer: Option<EqualityComparer>,
    ) -> LinqResult<Enumerable> {
        let key_selector = key_selector.into_invocable()?;
        let comparer = comparer.unwrap_or_default();
        let upstream = self.clone();
        Ok(self.node("group_by", move || {
            let upstream = upstream.clone();
            let key_selector = key_selector.clone();
            let element_selector = element_selector.clone();
            let comparer = comparer.clone();
            let mut result_site = result_selector.clone().map(CallSite::new);
            let mut groups: Option<std::vec::IntoIter<Grouping>> = None;
            let mut stopped = false;
            Ok(cursor_fn(move || {
                if stopped {
                    return Ok(None);
                }
                if groups.is_none() {
                    let lookup = Lookup::build(
                        &upstream,
                        &key_selector,
                        element_selector.as_ref(),
                        comparer.clone(),
                    )?;
                    groups = Some(lookup.groupings().to_vec().into_iter());
                }
                let Some(group) = groups.as_mut().and_then(Iterator::next) else {
                    return Ok(None);
                };
                let key = group.key().clone();
                let grouping = Value::object(group);
                let value = match result_site.as_mut() {
                    Some(site) => {
                        let args = [grouping.clone(), key.clone()];
                        let more = groups.as_ref().is_some_and(|rest| !rest.as_slice().is_empty());
                        let out = site.invoke(&args, &key, &grouping, &mut Known(more))?;
                        stopped = out.cancel;
                        out.value
                    }
                    None => grouping,
                };
                Ok(Some((key, value)))
            }))
        }))
    }
}
