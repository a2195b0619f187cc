//! Terminal operations: conversion, aggregation and element access.
//!
//! Each call opens one traversal. A cancelling callback ends the
//! traversal; the result is computed from the elements seen up to and
//! including the cancelling one.

use std::cmp::Ordering;
use std::ops::ControlFlow;

use lq_value::{
    duplicate_key, integer_overflow, key_not_found, more_than_one_element, no_elements,
    to_json_text, type_mismatch, ArrayValue, LinqResult, Value,
};

use crate::comparer::KeyIndex;
use crate::context::CallSite;
use crate::source::Upstream;
use crate::{
    Comparer, Enumerable, EqualityComparer, IntoEnumerable, IntoInvocable, Invocable, Lookup,
    Pair,
};

type Step = LinqResult<ControlFlow<()>>;

const CONTINUE: Step = Ok(ControlFlow::Continue(()));
const BREAK: Step = Ok(ControlFlow::Break(()));

impl Enumerable {
    /// Pull every element, calling `callback(value, key)` when given, and
    /// hand `(key, value, callback result)` to `visit`.
    fn drive(
        &self,
        callback: Option<&Invocable>,
        mut visit: impl FnMut(Value, Value, Value) -> Step,
    ) -> LinqResult<()> {
        let mut up = Upstream::open(self)?;
        let mut site = callback.cloned().map(CallSite::new);
        while let Some((key, value)) = up.pull()? {
            let (result, cancel) = match site.as_mut() {
                Some(site) => {
                    let out = site.invoke_element(&key, &value, &mut up)?;
                    (out.value, out.cancel)
                }
                None => (Value::Null, false),
            };
            if visit(key, value, result)?.is_break() || cancel {
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn collect_pairs(&self) -> LinqResult<Vec<Pair>> {
        let mut pairs = Vec::new();
        self.drive(None, |key, value, _| {
            pairs.push((key, value));
            CONTINUE
        })?;
        Ok(pairs)
    }

    // ── Conversion ──────────────────────────────────────────────────

    /// Keys preserved; a repeated key overwrites the earlier value in place.
    pub fn to_array(&self) -> LinqResult<ArrayValue> {
        let mut array = ArrayValue::new();
        self.drive(None, |key, value, _| {
            array.insert(key, value);
            CONTINUE
        })?;
        Ok(array)
    }

    /// Keys from `key_selector(value, key)`.
    pub fn to_array_with(&self, key_selector: impl IntoInvocable) -> LinqResult<ArrayValue> {
        let selector = key_selector.into_invocable()?;
        let mut array = ArrayValue::new();
        self.drive(Some(&selector), |_, value, key| {
            array.insert(key, value);
            CONTINUE
        })?;
        Ok(array)
    }

    /// Values in order, keys dropped.
    pub fn to_list(&self) -> LinqResult<Vec<Value>> {
        let mut values = Vec::new();
        self.drive(None, |_, value, _| {
            values.push(value);
            CONTINUE
        })?;
        Ok(values)
    }

    /// Keys from `key_selector`, values from `value_selector` (default:
    /// the element). A repeated key is an error.
    pub fn to_dictionary(
        &self,
        key_selector: impl IntoInvocable,
        value_selector: Option<Invocable>,
    ) -> LinqResult<ArrayValue> {
        let key_selector = key_selector.into_invocable()?;
        let mut up = Upstream::open(self)?;
        let mut key_site = CallSite::new(key_selector);
        let mut value_site = value_selector.map(CallSite::new);
        let mut dict = ArrayValue::new();
        while let Some((key, value)) = up.pull()? {
            let dict_key = key_site.invoke_element(&key, &value, &mut up)?;
            let (dict_value, cancel) = match value_site.as_mut() {
                Some(site) => {
                    let out = site.invoke_element(&key, &value, &mut up)?;
                    (out.value, out.cancel)
                }
                None => (value, false),
            };
            if dict.contains_key(&dict_key.value) {
                return Err(duplicate_key(&dict_key.value));
            }
            dict.insert(dict_key.value, dict_value);
            if dict_key.cancel || cancel {
                break;
            }
        }
        Ok(dict)
    }

    /// Distinct values in first-seen order.
    pub fn to_set(&self, comparer: Option<EqualityComparer>) -> LinqResult<Vec<Value>> {
        let mut seen = KeyIndex::new(comparer.unwrap_or_default());
        let mut values = Vec::new();
        self.drive(None, |_, value, _| {
            if seen.insert(value.clone())?.1 {
                values.push(value);
            }
            CONTINUE
        })?;
        Ok(values)
    }

    pub fn to_lookup(&self, key_selector: impl IntoInvocable) -> LinqResult<Lookup> {
        self.to_lookup_with(key_selector, None, None)
    }

    pub fn to_lookup_with(
        &self,
        key_selector: impl IntoInvocable,
        element_selector: Option<Invocable>,
        comparer: Option<EqualityComparer>,
    ) -> LinqResult<Lookup> {
        Lookup::build(
            self,
            &key_selector.into_invocable()?,
            element_selector.as_ref(),
            comparer.unwrap_or_default(),
        )
    }

    /// JSON array when keys are `0..n`, JSON object otherwise.
    pub fn to_json(&self) -> LinqResult<String> {
        to_json_text(&Value::array(self.to_array()?), false)
    }

    pub fn to_json_pretty(&self) -> LinqResult<String> {
        to_json_text(&Value::array(self.to_array()?), true)
    }

    /// Join the text form of each value (or of `selector(value, key)`).
    pub fn implode(&self, separator: &str, selector: Option<Invocable>) -> LinqResult<String> {
        let mut out = String::new();
        let mut first = true;
        self.drive(selector.as_ref(), |_, value, selected| {
            let item = if selector.is_some() { selected } else { value };
            let text = item
                .to_text()
                .ok_or_else(|| type_mismatch("scalar", item.type_name()))?;
            if !first {
                out.push_str(separator);
            }
            first = false;
            out.push_str(&text);
            CONTINUE
        })?;
        Ok(out)
    }

    /// Array of `selector(value, key)` results, each stored under the
    /// context key as the callback left it (`$ctx->key = ...` rekeys).
    pub fn build(&self, selector: impl IntoInvocable) -> LinqResult<ArrayValue> {
        let mut up = Upstream::open(self)?;
        let mut site = CallSite::new(selector.into_invocable()?);
        let mut array = ArrayValue::new();
        while let Some((key, value)) = up.pull()? {
            let out = site.invoke_element(&key, &value, &mut up)?;
            array.insert(out.key, out.value);
            if out.cancel {
                break;
            }
        }
        Ok(array)
    }

    // ── Aggregation ─────────────────────────────────────────────────

    /// Left fold with `f(accumulator, value, key)`.
    ///
    /// Without a seed the first element is the initial accumulator. An
    /// empty sequence returns the seed (`Null` if none) without calling
    /// `f`.
    pub fn aggregate(&self, f: impl IntoInvocable, seed: Option<Value>) -> LinqResult<Value> {
        let mut up = Upstream::open(self)?;
        let mut site = CallSite::new(f.into_invocable()?);
        let mut acc = match seed {
            Some(seed) => seed,
            None => match up.pull()? {
                Some((_, first)) => first,
                None => return Ok(Value::Null),
            },
        };
        while let Some((key, value)) = up.pull()? {
            let args = [acc, value.clone(), key.clone()];
            let out = site.invoke(&args, &key, &value, &mut up)?;
            acc = out.value;
            if out.cancel {
                break;
            }
        }
        Ok(acc)
    }

    pub fn count(&self) -> LinqResult<usize> {
        let mut n = 0;
        self.drive(None, |_, _, _| {
            n += 1;
            CONTINUE
        })?;
        Ok(n)
    }

    pub fn count_where(&self, predicate: impl IntoInvocable) -> LinqResult<usize> {
        let predicate = predicate.into_invocable()?;
        let mut n = 0;
        self.drive(Some(&predicate), |_, _, passed| {
            if passed.is_truthy() {
                n += 1;
            }
            CONTINUE
        })?;
        Ok(n)
    }

    /// Sum of the values (or of `selector(value, key)`); `0` when empty.
    pub fn sum(&self, selector: Option<Invocable>) -> LinqResult<Value> {
        Ok(self.sum_and_count(selector.as_ref())?.0)
    }

    /// Arithmetic mean as a float. Empty sequences have none.
    #[allow(
        clippy::cast_precision_loss,
        reason = "element counts stay far below 2^52"
    )]
    pub fn average(&self, selector: Option<Invocable>) -> LinqResult<Value> {
        let (sum, count) = self.sum_and_count(selector.as_ref())?;
        if count == 0 {
            return Err(no_elements());
        }
        let total = sum.as_float().ok_or_else(|| type_mismatch("number", sum.type_name()))?;
        Ok(Value::Float(total / count as f64))
    }

    fn sum_and_count(&self, selector: Option<&Invocable>) -> LinqResult<(Value, usize)> {
        let mut sum = Value::Int(0);
        let mut count = 0;
        self.drive(selector, |_, value, selected| {
            let item = if selector.is_some() { selected } else { value };
            sum = add(&sum, &item)?;
            count += 1;
            CONTINUE
        })?;
        Ok((sum, count))
    }

    /// Smallest value (or smallest `selector(value, key)`).
    pub fn min(&self, selector: Option<Invocable>) -> LinqResult<Value> {
        self.extreme(selector.as_ref(), &Comparer::Natural, Ordering::Less)
    }

    /// Largest value (or largest `selector(value, key)`).
    pub fn max(&self, selector: Option<Invocable>) -> LinqResult<Value> {
        self.extreme(selector.as_ref(), &Comparer::Natural, Ordering::Greater)
    }

    /// Smallest value under `comparer`; the first wins ties.
    pub fn min_by(&self, comparer: Comparer) -> LinqResult<Value> {
        self.extreme(None, &comparer, Ordering::Less)
    }

    /// Largest value under `comparer`; the first wins ties.
    pub fn max_by(&self, comparer: Comparer) -> LinqResult<Value> {
        self.extreme(None, &comparer, Ordering::Greater)
    }

    fn extreme(
        &self,
        selector: Option<&Invocable>,
        comparer: &Comparer,
        wanted: Ordering,
    ) -> LinqResult<Value> {
        let mut best: Option<Value> = None;
        self.drive(selector, |_, value, selected| {
            let item = if selector.is_some() { selected } else { value };
            best = Some(match best.take() {
                Some(current) if comparer.compare(&item, &current)? != wanted => current,
                _ => item,
            });
            CONTINUE
        })?;
        best.ok_or_else(no_elements)
    }

    /// True if `predicate` holds for every element (vacuously for none).
    pub fn all(&self, predicate: impl IntoInvocable) -> LinqResult<bool> {
        let predicate = predicate.into_invocable()?;
        let mut result = true;
        self.drive(Some(&predicate), |_, _, passed| {
            if passed.is_truthy() {
                CONTINUE
            } else {
                result = false;
                BREAK
            }
        })?;
        Ok(result)
    }

    /// True if there is at least one element. Pulls at most one.
    pub fn any(&self) -> LinqResult<bool> {
        let mut up = Upstream::open(self)?;
        Ok(up.pull()?.is_some())
    }

    pub fn any_where(&self, predicate: impl IntoInvocable) -> LinqResult<bool> {
        Ok(self.find_index(predicate)?.is_some())
    }

    pub fn contains(&self, value: &Value, comparer: Option<EqualityComparer>) -> LinqResult<bool> {
        let comparer = comparer.unwrap_or_default();
        let mut found = false;
        self.drive(None, |_, item, _| {
            if comparer.equals(&item, value)? {
                found = true;
                return BREAK;
            }
            CONTINUE
        })?;
        Ok(found)
    }

    /// Same length and pairwise-equal values; keys are ignored.
    pub fn sequence_equal(
        &self,
        other: impl IntoEnumerable,
        comparer: Option<EqualityComparer>,
    ) -> LinqResult<bool> {
        let other = other.into_enumerable()?;
        let comparer = comparer.unwrap_or_default();
        let mut left = Upstream::open(self)?;
        let mut right = Upstream::open(&other)?;
        loop {
            match (left.pull()?, right.pull()?) {
                (None, None) => return Ok(true),
                (Some((_, a)), Some((_, b))) => {
                    if !comparer.equals(&a, &b)? {
                        return Ok(false);
                    }
                }
                _ => return Ok(false),
            }
        }
    }

    // ── Element access ──────────────────────────────────────────────

    /// First element (matching `predicate`, when given).
    pub fn first(&self, predicate: Option<Invocable>) -> LinqResult<Value> {
        self.find_first(predicate.as_ref())?
            .map(|(_, value)| value)
            .ok_or_else(no_elements)
    }

    pub fn first_or_default(
        &self,
        default: Value,
        predicate: Option<Invocable>,
    ) -> LinqResult<Value> {
        Ok(self
            .find_first(predicate.as_ref())?
            .map_or(default, |(_, value)| value))
    }

    /// Last element (matching `predicate`, when given).
    pub fn last(&self, predicate: Option<Invocable>) -> LinqResult<Value> {
        self.find_last(predicate.as_ref())?.ok_or_else(no_elements)
    }

    pub fn last_or_default(
        &self,
        default: Value,
        predicate: Option<Invocable>,
    ) -> LinqResult<Value> {
        Ok(self.find_last(predicate.as_ref())?.unwrap_or(default))
    }

    /// The only element (matching `predicate`). A second match fails as
    /// soon as it is seen.
    pub fn single(&self, predicate: Option<Invocable>) -> LinqResult<Value> {
        self.find_single(predicate.as_ref())?.ok_or_else(no_elements)
    }

    pub fn single_or_default(
        &self,
        default: Value,
        predicate: Option<Invocable>,
    ) -> LinqResult<Value> {
        Ok(self.find_single(predicate.as_ref())?.unwrap_or(default))
    }

    fn find_first(&self, predicate: Option<&Invocable>) -> LinqResult<Option<Pair>> {
        let mut found = None;
        self.drive(predicate, |key, value, passed| {
            if predicate.is_none() || passed.is_truthy() {
                found = Some((key, value));
                return BREAK;
            }
            CONTINUE
        })?;
        Ok(found)
    }

    fn find_last(&self, predicate: Option<&Invocable>) -> LinqResult<Option<Value>> {
        let mut found = None;
        self.drive(predicate, |_, value, passed| {
            if predicate.is_none() || passed.is_truthy() {
                found = Some(value);
            }
            CONTINUE
        })?;
        Ok(found)
    }

    fn find_single(&self, predicate: Option<&Invocable>) -> LinqResult<Option<Value>> {
        let mut found = None;
        self.drive(predicate, |_, value, passed| {
            if predicate.is_none() || passed.is_truthy() {
                if found.is_some() {
                    return Err(more_than_one_element());
                }
                found = Some(value);
            }
            CONTINUE
        })?;
        Ok(found)
    }

    /// The value stored under `key`.
    pub fn element_at(&self, key: &Value) -> LinqResult<Value> {
        self.value_at(key)?.ok_or_else(|| key_not_found(key))
    }

    pub fn element_at_or_default(&self, key: &Value, default: Value) -> LinqResult<Value> {
        Ok(self.value_at(key)?.unwrap_or(default))
    }

    fn value_at(&self, wanted: &Value) -> LinqResult<Option<Value>> {
        let mut found = None;
        self.drive(None, |key, value, _| {
            if key == *wanted {
                found = Some(value);
                return BREAK;
            }
            CONTINUE
        })?;
        Ok(found)
    }

    /// Key of the first element strictly equal to `value`.
    pub fn index_of(&self, value: &Value) -> LinqResult<Option<Value>> {
        let mut found = None;
        self.drive(None, |key, item, _| {
            if item == *value {
                found = Some(key);
                return BREAK;
            }
            CONTINUE
        })?;
        Ok(found)
    }

    /// Key of the first element matching `predicate`.
    pub fn find_index(&self, predicate: impl IntoInvocable) -> LinqResult<Option<Value>> {
        let predicate = predicate.into_invocable()?;
        Ok(self.find_first(Some(&predicate))?.map(|(key, _)| key))
    }

    /// Call `action(value, key)` for every element.
    pub fn each(&self, action: impl IntoInvocable) -> LinqResult<()> {
        let action = action.into_invocable()?;
        self.drive(Some(&action), |_, _, _| CONTINUE)
    }
}

/// Checked numeric addition; floats are contagious.
fn add(acc: &Value, item: &Value) -> LinqResult<Value> {
    match (acc, item) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("sum")),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            match (acc.as_float(), item.as_float()) {
                (Some(a), Some(b)) => Ok(Value::Float(a + b)),
                _ => Err(type_mismatch("number", item.type_name())),
            }
        }
        _ => Err(type_mismatch("number", item.type_name())),
    }
}
