//! Iteration sources and the cursors they open.
//!
//! An [`IterSource`] is the immutable half of a sequence: it knows how to
//! open a fresh [`SeqCursor`]. Every operator node is itself a source whose
//! cursor owns a cursor over its upstream.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use lq_stack::ensure_sufficient_stack;
use lq_value::{ArrayValue, LinqResult, Value};

use crate::context::Lookahead;
use crate::Enumerable;

/// A `(key, value)` element.
pub type Pair = (Value, Value);

/// The positional half of a sequence: one traversal.
pub trait SeqCursor {
    /// Pull the next element. `Ok(None)` means exhausted.
    fn next_pair(&mut self) -> LinqResult<Option<Pair>>;
}

/// A sequence producer that can open cursors.
pub trait IterSource {
    fn open(&self) -> LinqResult<Box<dyn SeqCursor>>;

    /// False for one-shot sources; a second `open` yields nothing.
    fn restartable(&self) -> bool {
        true
    }

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

// ── Closure adapters ────────────────────────────────────────────────

/// Source whose `open` is a closure. Operator nodes are built from these.
pub(crate) struct FnSource<F> {
    name: &'static str,
    restartable: bool,
    open: F,
}

impl<F> FnSource<F>
where
    F: Fn() -> LinqResult<Box<dyn SeqCursor>>,
{
    pub(crate) fn new(name: &'static str, restartable: bool, open: F) -> Self {
        FnSource {
            name,
            restartable,
            open,
        }
    }
}

impl<F> IterSource for FnSource<F>
where
    F: Fn() -> LinqResult<Box<dyn SeqCursor>>,
{
    fn open(&self) -> LinqResult<Box<dyn SeqCursor>> {
        (self.open)()
    }

    fn restartable(&self) -> bool {
        self.restartable
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

struct FnCursor<F>(F);

impl<F> SeqCursor for FnCursor<F>
where
    F: FnMut() -> LinqResult<Option<Pair>>,
{
    fn next_pair(&mut self) -> LinqResult<Option<Pair>> {
        (self.0)()
    }
}

/// Box a pull closure as a cursor.
pub(crate) fn cursor_fn(
    pull: impl FnMut() -> LinqResult<Option<Pair>> + 'static,
) -> Box<dyn SeqCursor> {
    Box::new(FnCursor(pull))
}

/// Stops a cursor for good after its first `None` or error.
pub(crate) struct Fuse {
    inner: Box<dyn SeqCursor>,
    done: bool,
}

impl Fuse {
    pub(crate) fn wrap(inner: Box<dyn SeqCursor>) -> Box<dyn SeqCursor> {
        Box::new(Fuse { inner, done: false })
    }
}

impl SeqCursor for Fuse {
    fn next_pair(&mut self) -> LinqResult<Option<Pair>> {
        if self.done {
            return Ok(None);
        }
        let pulled = self.inner.next_pair();
        if !matches!(pulled, Ok(Some(_))) {
            self.done = true;
        }
        pulled
    }
}

// ── Upstream ────────────────────────────────────────────────────────

/// An operator's handle on its upstream cursor.
///
/// Holds a one-slot buffer so that a callback asking `is_last` can peek
/// one element ahead; the peeked element is handed out by the next
/// [`Upstream::pull`]. Pulls run under the stack guard.
pub(crate) struct Upstream {
    cursor: Box<dyn SeqCursor>,
    peeked: Option<Option<Pair>>,
}

impl Upstream {
    pub(crate) fn open(seq: &Enumerable) -> LinqResult<Self> {
        let cursor = ensure_sufficient_stack(|| seq.open())?;
        Ok(Upstream {
            cursor,
            peeked: None,
        })
    }

    pub(crate) fn pull(&mut self) -> LinqResult<Option<Pair>> {
        match self.peeked.take() {
            Some(peeked) => Ok(peeked),
            None => ensure_sufficient_stack(|| self.cursor.next_pair()),
        }
    }
}

impl Lookahead for Upstream {
    fn has_more(&mut self) -> LinqResult<bool> {
        if self.peeked.is_none() {
            let next = ensure_sufficient_stack(|| self.cursor.next_pair())?;
            self.peeked = Some(next);
        }
        Ok(matches!(self.peeked, Some(Some(_))))
    }
}

// ── Backing stores ──────────────────────────────────────────────────

/// Elements of an array, keys preserved.
pub(crate) struct ArraySource {
    array: Rc<ArrayValue>,
}

impl ArraySource {
    pub(crate) fn new(array: Rc<ArrayValue>) -> Self {
        ArraySource { array }
    }
}

impl IterSource for ArraySource {
    fn open(&self) -> LinqResult<Box<dyn SeqCursor>> {
        let array = Rc::clone(&self.array);
        let mut pos = 0;
        Ok(cursor_fn(move || {
            let pair = array
                .get_index(pos)
                .map(|(k, v)| (k.clone(), v.clone()));
            pos += 1;
            Ok(pair)
        }))
    }

    fn name(&self) -> &'static str {
        "array"
    }
}

/// A materialized buffer of pairs.
pub(crate) struct BufferSource {
    pairs: Rc<[Pair]>,
}

impl BufferSource {
    pub(crate) fn new(pairs: Rc<[Pair]>) -> Self {
        BufferSource { pairs }
    }
}

impl IterSource for BufferSource {
    fn open(&self) -> LinqResult<Box<dyn SeqCursor>> {
        let pairs = Rc::clone(&self.pairs);
        let mut pos = 0;
        Ok(cursor_fn(move || {
            let pair = pairs.get(pos).cloned();
            pos += 1;
            Ok(pair)
        }))
    }

    fn name(&self) -> &'static str {
        "buffer"
    }
}

/// A materialized buffer of values, keyed `0..`.
pub(crate) struct ValuesSource {
    values: Rc<[Value]>,
}

impl ValuesSource {
    pub(crate) fn new(values: Rc<[Value]>) -> Self {
        ValuesSource { values }
    }
}

impl IterSource for ValuesSource {
    fn open(&self) -> LinqResult<Box<dyn SeqCursor>> {
        let values = Rc::clone(&self.values);
        let mut pos = 0;
        Ok(cursor_fn(move || {
            let pair = values.get(pos).map(|v| (Value::index(pos), v.clone()));
            pos += 1;
            Ok(pair)
        }))
    }

    fn name(&self) -> &'static str {
        "values"
    }
}

type PairIter = Box<dyn Iterator<Item = Pair>>;

/// An external iterator, consumed by whichever cursor opens it first.
pub(crate) struct OneShotSource {
    iter: RefCell<Option<PairIter>>,
}

impl OneShotSource {
    pub(crate) fn new(iter: PairIter) -> Self {
        OneShotSource {
            iter: RefCell::new(Some(iter)),
        }
    }
}

impl IterSource for OneShotSource {
    fn open(&self) -> LinqResult<Box<dyn SeqCursor>> {
        let taken = self.iter.borrow_mut().take();
        let Some(mut iter) = taken else {
            tracing::warn!("one-shot source reopened after consumption; yielding nothing");
            return Ok(cursor_fn(|| Ok(None)));
        };
        Ok(cursor_fn(move || Ok(iter.next())))
    }

    fn restartable(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "iterator"
    }
}

/// Calls a factory for a fresh iterator on every open.
pub(crate) struct GeneratorSource {
    factory: Rc<dyn Fn() -> PairIter>,
}

impl GeneratorSource {
    pub(crate) fn new(factory: impl Fn() -> PairIter + 'static) -> Self {
        GeneratorSource {
            factory: Rc::new(factory),
        }
    }
}

impl IterSource for GeneratorSource {
    fn open(&self) -> LinqResult<Box<dyn SeqCursor>> {
        let mut iter = (self.factory)();
        Ok(cursor_fn(move || Ok(iter.next())))
    }

    fn name(&self) -> &'static str {
        "generator"
    }
}

impl fmt::Debug for dyn IterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterSource")
            .field("name", &self.name())
            .field("restartable", &self.restartable())
            .finish()
    }
}
