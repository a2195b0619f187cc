//! Sequence constructors.

use std::rc::Rc;

use lq_value::{from_json_text, out_of_range, ArrayValue, LinqResult, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::context::{CallSite, Known};
use crate::source::{
    cursor_fn, ArraySource, BufferSource, FnSource, GeneratorSource, OneShotSource, ValuesSource,
};
use crate::{Enumerable, IntoInvocable, Pair};

impl Enumerable {
    pub fn empty() -> Self {
        Enumerable::from_source(BufferSource::new(Rc::from(Vec::new())))
    }

    /// The pairs of an array, keys preserved.
    pub fn from_array(array: ArrayValue) -> Self {
        Enumerable::from_source(ArraySource::new(Rc::new(array)))
    }

    /// Values keyed `0..`.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let values: Vec<Value> = values.into_iter().collect();
        Enumerable::from_source(ValuesSource::new(values.into()))
    }

    /// Explicit `(key, value)` pairs; keys may repeat.
    pub fn from_pairs(pairs: impl IntoIterator<Item = Pair>) -> Self {
        let pairs: Vec<Pair> = pairs.into_iter().collect();
        Enumerable::from_source(BufferSource::new(pairs.into()))
    }

    /// A one-shot external iterator, keyed `0..`. Only the first traversal
    /// sees its elements.
    #[allow(
        clippy::should_implement_trait,
        reason = "builds a one-shot source, not a collection"
    )]
    pub fn from_iter(iter: impl Iterator<Item = Value> + 'static) -> Self {
        let pairs = iter.enumerate().map(|(i, v)| (Value::index(i), v));
        Enumerable::from_source(OneShotSource::new(Box::new(pairs)))
    }

    /// A one-shot external iterator of `(key, value)` pairs.
    pub fn from_pair_iter(iter: impl Iterator<Item = Pair> + 'static) -> Self {
        Enumerable::from_source(OneShotSource::new(Box::new(iter)))
    }

    /// Restartable: `factory` supplies a fresh iterator per traversal.
    pub fn generate_with<I>(factory: impl Fn() -> I + 'static) -> Self
    where
        I: Iterator<Item = Value> + 'static,
    {
        Enumerable::from_source(GeneratorSource::new(
            move || -> Box<dyn Iterator<Item = Pair>> {
                Box::new(factory().enumerate().map(|(i, v)| (Value::index(i), v)))
            },
        ))
    }

    /// `seed`, `next(seed)`, `next(next(seed))`, ... keyed `0..`.
    ///
    /// `next` receives `(previous value, previous key)`. If it cancels,
    /// the value it produced is discarded and the sequence ends. Inside
    /// `next`, `isLast` is `false`: the call itself produces the element
    /// that follows.
    pub fn generate(seed: Value, next: impl IntoInvocable) -> LinqResult<Self> {
        let next = next.into_invocable()?;
        Ok(Enumerable::from_source(FnSource::new("generate", true, move || {
            let mut site = CallSite::new(next.clone());
            let mut previous: Option<Pair> = None;
            let mut position = 0;
            let seed = seed.clone();
            Ok(cursor_fn(move || {
                let value = match previous.take() {
                    None => seed.clone(),
                    Some((key, value)) => {
                        let args = [value.clone(), key.clone()];
                        let out = site.invoke(&args, &key, &value, &mut Known(false))?;
                        if out.cancel {
                            return Ok(None);
                        }
                        out.value
                    }
                };
                let pair = (Value::index(position), value);
                position += 1;
                previous = Some(pair.clone());
                Ok(Some(pair))
            }))
        })))
    }

    /// `count` consecutive integers from `start`. Stops early rather than
    /// overflow.
    pub fn range(start: i64, count: i64) -> LinqResult<Self> {
        if count < 0 {
            return Err(out_of_range("count", format!("must not be negative, got {count}")));
        }
        Ok(Enumerable::generate_with(move || {
            (0..count).map_while(move |i| start.checked_add(i).map(Value::Int))
        }))
    }

    /// From `start` towards `end` (exclusive) by `step`. A step pointing
    /// away from `end` yields nothing.
    pub fn range_to(start: i64, end: i64, step: i64) -> LinqResult<Self> {
        if step == 0 {
            return Err(out_of_range("step", "must not be zero"));
        }
        Ok(Enumerable::generate_with(move || {
            let mut next = Some(start);
            std::iter::from_fn(move || {
                let current = next?;
                let more = if step > 0 { current < end } else { current > end };
                if !more {
                    next = None;
                    return None;
                }
                next = current.checked_add(step);
                Some(Value::Int(current))
            })
        }))
    }

    /// `value` repeated `count` times, or forever.
    pub fn repeat(value: Value, count: Option<usize>) -> Self {
        Enumerable::generate_with(move || {
            let value = value.clone();
            limit(std::iter::repeat_with(move || value.clone()), count)
        })
    }

    /// Uniform integers in `min..=max`, `count` of them or forever.
    ///
    /// With a seed every traversal yields the same values; without one
    /// each traversal seeds from the OS.
    pub fn random(
        count: Option<usize>,
        min: i64,
        max: i64,
        seed: Option<u64>,
    ) -> LinqResult<Self> {
        if min > max {
            return Err(out_of_range("min", format!("{min} is greater than max {max}")));
        }
        Ok(Enumerable::generate_with(move || {
            let mut rng = rng_for(seed);
            let items = std::iter::repeat_with(move || Value::Int(rng.random_range(min..=max)));
            limit(items, count)
        }))
    }

    /// Uniform floats in `[0, 1)`.
    pub fn random_float(count: Option<usize>, seed: Option<u64>) -> Self {
        Enumerable::generate_with(move || {
            let mut rng = rng_for(seed);
            let items = std::iter::repeat_with(move || Value::Float(rng.random::<f64>()));
            limit(items, count)
        })
    }

    /// Decode JSON text: arrays and objects yield their entries, a scalar
    /// yields itself at key `0`.
    pub fn from_json(text: &str) -> LinqResult<Self> {
        match from_json_text(text)? {
            array @ Value::Array(_) => Enumerable::from_value(&array),
            scalar => Ok(Enumerable::from_values([scalar])),
        }
    }
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn limit(
    items: impl Iterator<Item = Value> + 'static,
    count: Option<usize>,
) -> Box<dyn Iterator<Item = Value>> {
    match count {
        Some(n) => Box::new(items.take(n)),
        None => Box::new(items),
    }
}

#[cfg(test)]
mod tests;
