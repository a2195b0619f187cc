//! Stack growth guard.
//!
//! A pipeline of N chained operators pulls through N nested `next` calls,
//! and a micro-lambda body nests one evaluator frame per sub-expression.
//! Both are wrapped in [`ensure_sufficient_stack`] so that a chain of
//! thousands of operators, or a deeply parenthesized lambda, grows the
//! stack instead of overflowing it.
//!
//! On `wasm32` the guard is a plain call.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first switching to a fresh stack segment if the current one
/// is nearly exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
