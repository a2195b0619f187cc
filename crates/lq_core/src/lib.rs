//! Lazy, LINQ-style sequence engine.
//!
//! An [`Enumerable`] is an immutable description of a pipeline. Operators
//! such as [`Enumerable::where_`] or [`Enumerable::select`] wrap the
//! receiver in a new node and return immediately; nothing is pulled and no
//! callback runs until a terminal operation (or a [`Cursor`]) drives it.
//!
//! ```text
//! factory ──> IterSource ──> Enumerable ──op──> Enumerable ──op──> ...
//!                                                   │
//!                                  terminal / cursor() opens a SeqCursor
//!                                  and pulls one (key, value) at a time
//! ```
//!
//! Callbacks are [`Invocable`]s: native closures, methods bound to an
//! engine object, or micro-lambda text (`"$x => $x * 2"`). Every
//! invocation receives an [`IterationContext`] describing the element
//! being visited and carrying the `cancel`, `nextVal` and `tag` slots.
//!
//! Positional state lives in cursors, never in the pipeline, so one
//! pipeline can feed any number of independent traversals.

mod comparer;
mod context;
mod cursor;
mod enumerable;
mod factories;
mod grouping;
mod invocable;
mod ordered;
mod source;

pub use comparer::{Comparer, EqualityComparer};
pub use context::{IterationContext, Lookahead};
pub use cursor::{Cursor, Iter};
pub use enumerable::{Enumerable, IntoEnumerable};
pub use grouping::{Grouping, Lookup};
pub use invocable::{IntoInvocable, Invocable};
pub use ordered::OrderedEnumerable;
pub use source::{IterSource, Pair, SeqCursor};

#[cfg(test)]
mod tests;
