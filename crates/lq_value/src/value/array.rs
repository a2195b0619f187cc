//! Ordered associative array.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use super::Value;

/// Insertion-ordered key/value map.
///
/// Re-inserting an existing key replaces the value in place and keeps
/// the original position. [`ArrayValue::push`] appends under the next
/// integer key: one past the largest integer key inserted so far, or `0`.
#[derive(Clone, Default)]
pub struct ArrayValue {
    entries: IndexMap<Value, Value, FxBuildHasher>,
    next_index: i64,
}

impl ArrayValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ArrayValue {
            entries: IndexMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            next_index: 0,
        }
    }

    /// Insert or replace, returning the previous value for `key`.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        if let Value::Int(n) = key {
            if n >= self.next_index {
                self.next_index = n.saturating_add(1);
            }
        }
        self.entries.insert(key, value)
    }

    /// Append under the next integer key.
    pub fn push(&mut self, value: Value) {
        let key = Value::Int(self.next_index);
        self.insert(key, value);
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(key)
    }

    /// Entry at a zero-based position.
    pub fn get_index(&self, index: usize) -> Option<(&Value, &Value)> {
        self.entries.get_index(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&Value, &Value)> + '_ {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &Value> + '_ {
        self.entries.keys()
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &Value> + '_ {
        self.entries.values()
    }

    /// True when the keys are exactly `0, 1, .., n-1` in order.
    pub fn is_list(&self) -> bool {
        self.entries
            .keys()
            .enumerate()
            .all(|(i, key)| matches!(key, Value::Int(n) if usize::try_from(*n) == Ok(i)))
    }
}

impl PartialEq for ArrayValue {
    // Order-sensitive, unlike `IndexMap`'s own equality.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.0 == b.0 && a.1 == b.1)
    }
}

impl Eq for ArrayValue {}

impl Hash for ArrayValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for (key, value) in self.iter() {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl FromIterator<Value> for ArrayValue {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut array = ArrayValue::with_capacity(iter.size_hint().0);
        for value in iter {
            array.push(value);
        }
        array
    }
}

impl FromIterator<(Value, Value)> for ArrayValue {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut array = ArrayValue::with_capacity(iter.size_hint().0);
        for (key, value) in iter {
            array.insert(key, value);
        }
        array
    }
}

impl fmt::Debug for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_list() {
            f.write_str("[")?;
            for (i, value) in self.values().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{value}")?;
            }
            f.write_str("]")
        } else {
            f.write_str("{")?;
            for (i, (key, value)) in self.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{key}: {value}")?;
            }
            f.write_str("}")
        }
    }
}
