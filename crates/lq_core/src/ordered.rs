//! Stable multi-level ordering.
//!
//! An [`OrderedEnumerable`] records its sort levels and does nothing
//! until pulled. The first pull materializes the base sequence, computes
//! every level's sort key once per element, performs one stable sort and
//! then streams the elements with their original keys. Each new traversal
//! repeats the whole process against a fresh upstream cursor.

use std::cmp::Ordering;
use std::ops::Deref;
use std::rc::Rc;

use lq_value::{LinqResult, Value};
use smallvec::SmallVec;

use crate::context::CallSite;
use crate::source::{cursor_fn, Upstream};
use crate::{Comparer, Enumerable, IntoInvocable, Invocable, Pair};

#[derive(Clone, Debug)]
struct SortLevel {
    /// `None` sorts by the element value itself.
    selector: Option<Invocable>,
    comparer: Comparer,
    descending: bool,
}

/// Sort keys for one element, one per level.
type SortKeys = SmallVec<[Value; 2]>;

/// A sequence ordered by one or more levels.
///
/// Dereferences to the ordered [`Enumerable`], so every operator applies
/// directly; [`then_by`](Self::then_by) and friends add levels.
#[derive(Clone, Debug)]
pub struct OrderedEnumerable {
    base: Enumerable,
    levels: Rc<[SortLevel]>,
    sorted: Enumerable,
}

impl Enumerable {
    /// Ascending by `selector(value, key)`.
    pub fn order_by(
        &self,
        selector: impl IntoInvocable,
        comparer: Option<Comparer>,
    ) -> LinqResult<OrderedEnumerable> {
        Ok(OrderedEnumerable::new(
            self.clone(),
            level(Some(selector.into_invocable()?), comparer, false),
        ))
    }

    /// Descending by `selector(value, key)`.
    pub fn order_by_descending(
        &self,
        selector: impl IntoInvocable,
        comparer: Option<Comparer>,
    ) -> LinqResult<OrderedEnumerable> {
        Ok(OrderedEnumerable::new(
            self.clone(),
            level(Some(selector.into_invocable()?), comparer, true),
        ))
    }

    /// Ascending by value.
    pub fn order(&self, comparer: Option<Comparer>) -> OrderedEnumerable {
        OrderedEnumerable::new(self.clone(), level(None, comparer, false))
    }

    /// Descending by value.
    pub fn order_descending(&self, comparer: Option<Comparer>) -> OrderedEnumerable {
        OrderedEnumerable::new(self.clone(), level(None, comparer, true))
    }
}

fn level(selector: Option<Invocable>, comparer: Option<Comparer>, descending: bool) -> SortLevel {
    SortLevel {
        selector,
        comparer: comparer.unwrap_or_default(),
        descending,
    }
}

impl OrderedEnumerable {
    fn new(base: Enumerable, first: SortLevel) -> Self {
        Self::with_levels(base, Rc::from(vec![first]))
    }

    fn with_levels(base: Enumerable, levels: Rc<[SortLevel]>) -> Self {
        let sorted = {
            let base = base.clone();
            let levels = Rc::clone(&levels);
            base.clone().node("order_by", move || {
                let base = base.clone();
                let levels = Rc::clone(&levels);
                let mut buffer: Option<std::vec::IntoIter<Pair>> = None;
                Ok(cursor_fn(move || {
                    if buffer.is_none() {
                        buffer = Some(sort(&base, &levels)?.into_iter());
                    }
                    Ok(buffer.as_mut().and_then(Iterator::next))
                }))
            })
        };
        OrderedEnumerable {
            base,
            levels,
            sorted,
        }
    }

    fn push(&self, level: SortLevel) -> Self {
        let mut levels = self.levels.to_vec();
        levels.push(level);
        Self::with_levels(self.base.clone(), levels.into())
    }

    /// Ties broken ascending by value.
    pub fn then(&self, comparer: Option<Comparer>) -> Self {
        self.push(level(None, comparer, false))
    }

    /// Ties broken descending by value.
    pub fn then_descending(&self, comparer: Option<Comparer>) -> Self {
        self.push(level(None, comparer, true))
    }

    /// Ties broken ascending by `selector(value, key)`.
    pub fn then_by(
        &self,
        selector: impl IntoInvocable,
        comparer: Option<Comparer>,
    ) -> LinqResult<Self> {
        Ok(self.push(level(Some(selector.into_invocable()?), comparer, false)))
    }

    /// Ties broken descending by `selector(value, key)`.
    pub fn then_by_descending(
        &self,
        selector: impl IntoInvocable,
        comparer: Option<Comparer>,
    ) -> LinqResult<Self> {
        Ok(self.push(level(Some(selector.into_invocable()?), comparer, true)))
    }

    pub fn into_inner(self) -> Enumerable {
        self.sorted
    }
}

impl Deref for OrderedEnumerable {
    type Target = Enumerable;

    fn deref(&self) -> &Enumerable {
        &self.sorted
    }
}

impl From<OrderedEnumerable> for Enumerable {
    fn from(ordered: OrderedEnumerable) -> Self {
        ordered.sorted
    }
}

/// Materialize `base`, compute keys and stable-sort.
///
/// A cancelling selector stops materialization after its element.
fn sort(base: &Enumerable, levels: &[SortLevel]) -> LinqResult<Vec<Pair>> {
    let mut up = Upstream::open(base)?;
    let mut sites: SmallVec<[Option<CallSite>; 2]> = levels
        .iter()
        .map(|level| level.selector.clone().map(CallSite::new))
        .collect();
    let mut rows: Vec<(SortKeys, Pair)> = Vec::new();
    while let Some((key, value)) = up.pull()? {
        let mut keys = SortKeys::new();
        let mut cancelled = false;
        for site in &mut sites {
            match site {
                Some(site) => {
                    let out = site.invoke_element(&key, &value, &mut up)?;
                    cancelled |= out.cancel;
                    keys.push(out.value);
                }
                None => keys.push(value.clone()),
            }
        }
        rows.push((keys, (key, value)));
        if cancelled {
            break;
        }
    }

    let rows = merge_sort(rows, &mut |(a, _), (b, _)| {
        for (i, level) in levels.iter().enumerate() {
            let (Some(ka), Some(kb)) = (a.get(i), b.get(i)) else {
                continue;
            };
            let ord = if level.descending {
                level.comparer.compare(kb, ka)?
            } else {
                level.comparer.compare(ka, kb)?
            };
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Ok(Ordering::Equal)
    })?;
    tracing::debug!(elements = rows.len(), levels = levels.len(), "sorted sequence");
    Ok(rows.into_iter().map(|(_, pair)| pair).collect())
}

/// Stable merge sort with a fallible comparison.
///
/// The first comparison error aborts the sort. A comparison that is not a
/// total order yields some permutation of the input.
fn merge_sort<T>(
    mut items: Vec<T>,
    compare: &mut impl FnMut(&T, &T) -> LinqResult<Ordering>,
) -> LinqResult<Vec<T>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let back = items.split_off(items.len() / 2);
    let front = merge_sort(items, compare)?;
    let back = merge_sort(back, compare)?;
    let mut merged = Vec::with_capacity(front.len() + back.len());
    let mut back = back.into_iter().peekable();
    for item in front {
        while let Some(next) = back.peek() {
            if compare(next, &item)? != Ordering::Less {
                break;
            }
            merged.extend(back.next());
        }
        merged.push(item);
    }
    merged.extend(back);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn merge_sort_is_stable() {
        let items = vec![(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd')];
        let sorted = merge_sort(items, &mut |a, b| Ok(a.0.cmp(&b.0))).unwrap();
        assert_eq!(sorted, vec![(0, 'b'), (0, 'd'), (1, 'a'), (1, 'c')]);
    }

    #[test]
    fn merge_sort_propagates_errors() {
        let err = merge_sort(vec![2, 1], &mut |_, _| Err(lq_value::custom_error("boom")));
        assert!(err.is_err());
    }
}
