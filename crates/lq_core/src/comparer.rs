//! Ordering and equality contracts for sorting, sets and grouping.

use std::cmp::Ordering;

use indexmap::IndexSet;
use lq_value::{type_mismatch, LinqResult, Value};
use rustc_hash::FxBuildHasher;

use crate::{IntoInvocable, Invocable};

/// 3-way comparison.
///
/// `Natural` is [`Value::compare`]. A custom callback receives `(a, b)`
/// and returns a number: negative, zero or positive.
#[derive(Clone, Debug, Default)]
pub enum Comparer {
    #[default]
    Natural,
    Custom(Invocable),
}

impl Comparer {
    pub fn custom(f: impl IntoInvocable) -> LinqResult<Self> {
        Ok(Comparer::Custom(f.into_invocable()?))
    }

    /// Wrap a Rust ordering function.
    pub fn from_fn(f: impl Fn(&Value, &Value) -> Ordering + 'static) -> Self {
        Comparer::Custom(Invocable::binary(move |a, b| {
            Ok(Value::Int(match f(a, b) {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            }))
        }))
    }

    pub fn compare(&self, a: &Value, b: &Value) -> LinqResult<Ordering> {
        match self {
            Comparer::Natural => Ok(a.compare(b)),
            Comparer::Custom(f) => normalize(&f.invoke(&[a.clone(), b.clone()])?),
        }
    }
}

fn normalize(result: &Value) -> LinqResult<Ordering> {
    match result {
        Value::Int(n) => Ok(n.cmp(&0)),
        Value::Float(f) => Ok(f.partial_cmp(&0.0).unwrap_or(Ordering::Equal)),
        other => Err(type_mismatch("number from comparer", other.type_name())),
    }
}

/// 2-way equality.
///
/// `Strict` is identity-and-type equality (`Value`'s `Eq`). A custom
/// callback receives `(a, b)`; a truthy result means equal.
#[derive(Clone, Debug, Default)]
pub enum EqualityComparer {
    #[default]
    Strict,
    Custom(Invocable),
}

impl EqualityComparer {
    pub fn custom(f: impl IntoInvocable) -> LinqResult<Self> {
        Ok(EqualityComparer::Custom(f.into_invocable()?))
    }

    pub fn from_fn(f: impl Fn(&Value, &Value) -> bool + 'static) -> Self {
        EqualityComparer::Custom(Invocable::binary(move |a, b| Ok(Value::Bool(f(a, b)))))
    }

    pub fn equals(&self, a: &Value, b: &Value) -> LinqResult<bool> {
        match self {
            EqualityComparer::Strict => Ok(a == b),
            EqualityComparer::Custom(f) => Ok(f.invoke(&[a.clone(), b.clone()])?.is_truthy()),
        }
    }
}

/// Distinct keys in first-seen order, each with a stable slot number.
///
/// Strict equality hashes. A custom comparer keeps keys in a plain list
/// and is the only judge of equality.
#[derive(Clone, Debug)]
pub(crate) struct KeyIndex {
    keys: KeySlots,
}

#[derive(Clone, Debug)]
enum KeySlots {
    Hashed(IndexSet<Value, FxBuildHasher>),
    Scanned(EqualityComparer, Vec<Value>),
}

impl KeyIndex {
    pub(crate) fn new(comparer: EqualityComparer) -> Self {
        let keys = match comparer {
            EqualityComparer::Strict => KeySlots::Hashed(IndexSet::default()),
            custom @ EqualityComparer::Custom(_) => KeySlots::Scanned(custom, Vec::new()),
        };
        KeyIndex { keys }
    }

    pub(crate) fn find(&self, key: &Value) -> LinqResult<Option<usize>> {
        match &self.keys {
            KeySlots::Hashed(set) => Ok(set.get_index_of(key)),
            KeySlots::Scanned(comparer, list) => {
                for (slot, existing) in list.iter().enumerate() {
                    if comparer.equals(existing, key)? {
                        return Ok(Some(slot));
                    }
                }
                Ok(None)
            }
        }
    }

    /// Slot of `key`, adding it if new. The flag is true for new keys.
    pub(crate) fn insert(&mut self, key: Value) -> LinqResult<(usize, bool)> {
        if let Some(slot) = self.find(&key)? {
            return Ok((slot, false));
        }
        Ok(match &mut self.keys {
            KeySlots::Hashed(set) => set.insert_full(key),
            KeySlots::Scanned(_, list) => {
                list.push(key);
                (list.len() - 1, true)
            }
        })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        match &self.keys {
            KeySlots::Hashed(set) => set.len(),
            KeySlots::Scanned(_, list) => list.len(),
        }
    }

    pub(crate) fn key(&self, slot: usize) -> Option<&Value> {
        match &self.keys {
            KeySlots::Hashed(set) => set.get_index(slot),
            KeySlots::Scanned(_, list) => list.get(slot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn custom_comparer_result_is_normalized() {
        let by_len = Comparer::custom("($a, $b) => strlen($a) - strlen($b)").unwrap();
        assert_eq!(
            by_len
                .compare(&Value::string("abc"), &Value::string("z"))
                .unwrap(),
            Ordering::Greater
        );
        let float = Comparer::custom("($a, $b) => -0.5").unwrap();
        assert_eq!(
            float.compare(&Value::Null, &Value::Null).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn non_numeric_comparer_result_is_an_error() {
        let bad = Comparer::custom("($a, $b) => 'x'").unwrap();
        assert!(bad.compare(&Value::Int(1), &Value::Int(2)).is_err());
    }

    #[test]
    fn strict_equality_is_type_sensitive() {
        let eq = EqualityComparer::Strict;
        assert!(!eq.equals(&Value::Int(1), &Value::Float(1.0)).unwrap());
        let loose = EqualityComparer::custom("($a, $b) => $a == $b").unwrap();
        assert!(loose.equals(&Value::Int(1), &Value::Float(1.0)).unwrap());
    }

    #[test]
    fn key_index_with_custom_comparer_scans() {
        let mut index = KeyIndex::new(EqualityComparer::from_fn(|a, b| {
            a.as_str().map(str::to_lowercase) == b.as_str().map(str::to_lowercase)
        }));
        assert_eq!(index.insert(Value::string("A")).unwrap(), (0, true));
        assert_eq!(index.insert(Value::string("b")).unwrap(), (1, true));
        assert_eq!(index.insert(Value::string("a")).unwrap(), (0, false));
        assert_eq!(index.len(), 2);
        assert_eq!(index.key(0), Some(&Value::string("A")));
    }

    #[test]
    fn key_index_never_merges_against_the_custom_comparer() {
        let mut index = KeyIndex::new(EqualityComparer::from_fn(|_, _| false));
        assert_eq!(index.insert(Value::Int(1)).unwrap(), (0, true));
        assert_eq!(index.insert(Value::Int(1)).unwrap(), (1, true));
        assert_eq!(index.find(&Value::Int(1)).unwrap(), None);
        assert_eq!(index.len(), 2);
    }
}
