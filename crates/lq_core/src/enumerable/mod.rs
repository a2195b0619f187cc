//! The sequence type and its operator surface.
//!
//! Operators are split by family:
//! - `filter`: `where_`, partitioning, `of_type`/`cast`
//! - `project`: `select*`, `call`, `keys`/`values`
//! - `combine`: `concat`, `append`/`prepend`, `zip`, `reverse`, `default_if_empty`
//! - `sets`: `distinct`, `except`, `intersect`, `union`
//! - `join`: `join`, `group_join`, `group_by`
//! - `terminal`: conversions, aggregates, element access
//! - `methods`: the `Object` face used from micro-lambdas

mod combine;
mod filter;
mod join;
mod methods;
mod project;
mod sets;
mod terminal;

use std::fmt;
use std::rc::Rc;

use lq_value::{type_mismatch, ArrayValue, Heap, LinqResult, Value};

use crate::source::{ArraySource, FnSource, Fuse, SeqCursor};
use crate::{Cursor, Grouping, IterSource, Iter, Lookup, OrderedEnumerable};

/// A lazily evaluated sequence of `(key, value)` pairs.
///
/// Cloning is cheap and shares the pipeline description. Every traversal
/// ([`Enumerable::cursor`], `into_iter`, a terminal) opens its own cursor.
#[derive(Clone)]
pub struct Enumerable {
    source: Rc<dyn IterSource>,
}

impl Enumerable {
    pub fn from_source(source: impl IterSource + 'static) -> Self {
        Enumerable {
            source: Rc::new(source),
        }
    }

    /// Wrap an existing value: arrays iterate their pairs, sequences,
    /// groupings and lookups iterate themselves.
    pub fn from_value(value: &Value) -> LinqResult<Self> {
        match value {
            Value::Array(array) => Ok(Enumerable::from_source(ArraySource::new(Heap::share(
                array,
            )))),
            Value::Object(_) => {
                if let Some(seq) = value.downcast_object::<Enumerable>() {
                    Ok(seq.clone())
                } else if let Some(group) = value.downcast_object::<Grouping>() {
                    Ok(group.elements())
                } else if let Some(lookup) = value.downcast_object::<Lookup>() {
                    Ok(lookup.to_enumerable())
                } else {
                    Err(type_mismatch("array or sequence", value.type_name()))
                }
            }
            other => Err(type_mismatch("array or sequence", other.type_name())),
        }
    }

    /// Operator node over `self`; restartable when `self` is.
    pub(crate) fn node(
        &self,
        name: &'static str,
        open: impl Fn() -> LinqResult<Box<dyn SeqCursor>> + 'static,
    ) -> Enumerable {
        Enumerable::from_source(FnSource::new(name, self.is_restartable(), open))
    }

    /// Open a raw traversal. Every cursor handed out is fused.
    pub(crate) fn open(&self) -> LinqResult<Box<dyn SeqCursor>> {
        tracing::trace!(source = self.source.name(), "open cursor");
        Ok(Fuse::wrap(self.source.open()?))
    }

    /// Open a positioned cursor, primed on the first element.
    pub fn cursor(&self) -> LinqResult<Cursor> {
        Cursor::open(self)
    }

    pub fn iter(&self) -> Iter {
        self.into_iter()
    }

    /// False when backed by a one-shot iterator.
    pub fn is_restartable(&self) -> bool {
        self.source.restartable()
    }

    pub fn name(&self) -> &'static str {
        self.source.name()
    }

    /// True if both handles share one pipeline description.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.source, &b.source)
    }
}

impl fmt::Debug for Enumerable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumerable")
            .field("source", &self.source.name())
            .field("restartable", &self.source.restartable())
            .finish()
    }
}

/// Anything an operator accepts as a second sequence.
pub trait IntoEnumerable {
    fn into_enumerable(self) -> LinqResult<Enumerable>;
}

impl IntoEnumerable for Enumerable {
    fn into_enumerable(self) -> LinqResult<Enumerable> {
        Ok(self)
    }
}

impl IntoEnumerable for &Enumerable {
    fn into_enumerable(self) -> LinqResult<Enumerable> {
        Ok(self.clone())
    }
}

impl IntoEnumerable for OrderedEnumerable {
    fn into_enumerable(self) -> LinqResult<Enumerable> {
        Ok(self.into_inner())
    }
}

impl IntoEnumerable for &OrderedEnumerable {
    fn into_enumerable(self) -> LinqResult<Enumerable> {
        Ok((**self).clone())
    }
}

impl IntoEnumerable for ArrayValue {
    fn into_enumerable(self) -> LinqResult<Enumerable> {
        Ok(Enumerable::from_array(self))
    }
}

impl IntoEnumerable for Vec<Value> {
    fn into_enumerable(self) -> LinqResult<Enumerable> {
        Ok(Enumerable::from_values(self))
    }
}

impl IntoEnumerable for &Value {
    fn into_enumerable(self) -> LinqResult<Enumerable> {
        Enumerable::from_value(self)
    }
}

impl IntoEnumerable for Value {
    fn into_enumerable(self) -> LinqResult<Enumerable> {
        Enumerable::from_value(&self)
    }
}

impl IntoEnumerable for &Lookup {
    fn into_enumerable(self) -> LinqResult<Enumerable> {
        Ok(self.to_enumerable())
    }
}

impl IntoEnumerable for &Grouping {
    fn into_enumerable(self) -> LinqResult<Enumerable> {
        Ok(self.elements())
    }
}
