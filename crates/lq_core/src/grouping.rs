//! Groupings and lookups.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use lq_value::{
    arity_mismatch, no_such_property, type_mismatch, ArrayValue, LinqResult, Object, Value,
};

use crate::comparer::KeyIndex;
use crate::context::CallSite;
use crate::source::{BufferSource, Upstream, ValuesSource};
use crate::{Enumerable, EqualityComparer, Invocable, Pair};

/// A group key with its elements.
///
/// The elements are materialized; [`Grouping::elements`] can be iterated
/// any number of times.
#[derive(Clone)]
pub struct Grouping {
    key: Value,
    elements: Rc<[Value]>,
}

impl Grouping {
    pub fn new(key: Value, elements: Vec<Value>) -> Self {
        Grouping {
            key,
            elements: elements.into(),
        }
    }

    pub fn key(&self) -> &Value {
        &self.key
    }

    /// The elements as a sequence keyed `0..`.
    pub fn elements(&self) -> Enumerable {
        Enumerable::from_source(ValuesSource::new(Rc::clone(&self.elements)))
    }

    pub fn values(&self) -> &[Value] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl fmt::Debug for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grouping")
            .field("key", &self.key)
            .field("elements", &self.elements)
            .finish()
    }
}

impl Object for Grouping {
    fn type_name(&self) -> &'static str {
        "Grouping"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn property(&self, name: &str) -> LinqResult<Value> {
        match name {
            "key" => Ok(self.key.clone()),
            _ => Err(no_such_property(name, "Grouping")),
        }
    }

    fn call_method(&self, name: &str, args: &[Value]) -> LinqResult<Value> {
        match name {
            "key" | "getKey" if args.is_empty() => Ok(self.key.clone()),
            _ => self.elements().call_method(name, args),
        }
    }

    fn materialize(&self) -> LinqResult<Value> {
        Ok(Value::list(self.elements.iter().cloned()))
    }
}

/// Ordered mapping from key to [`Grouping`].
///
/// Keys keep first-occurrence order. Membership uses the lookup's own
/// equality comparer. Cloning shares the groups.
#[derive(Clone)]
pub struct Lookup {
    inner: Rc<LookupInner>,
}

struct LookupInner {
    index: KeyIndex,
    groups: Vec<Grouping>,
}

impl Lookup {
    /// Group `seq` with one traversal.
    ///
    /// `key_selector` and `element_selector` receive `(value, key)`. A
    /// cancelling key selector ends the traversal after its element.
    pub(crate) fn build(
        seq: &Enumerable,
        key_selector: &Invocable,
        element_selector: Option<&Invocable>,
        comparer: EqualityComparer,
    ) -> LinqResult<Self> {
        let mut up = Upstream::open(seq)?;
        let mut key_site = CallSite::new(key_selector.clone());
        let mut element_site = element_selector.cloned().map(CallSite::new);
        let mut index = KeyIndex::new(comparer);
        let mut buckets: Vec<Vec<Value>> = Vec::new();
        while let Some((key, value)) = up.pull()? {
            let group_key = key_site.invoke_element(&key, &value, &mut up)?;
            let element = match element_site.as_mut() {
                Some(site) => site.invoke_element(&key, &value, &mut up)?.value,
                None => value,
            };
            let (slot, is_new) = index.insert(group_key.value)?;
            if is_new {
                buckets.push(Vec::new());
            }
            if let Some(bucket) = buckets.get_mut(slot) {
                bucket.push(element);
            }
            if group_key.cancel {
                break;
            }
        }
        let groups = buckets
            .into_iter()
            .enumerate()
            .map(|(slot, elements)| {
                Grouping::new(index.key(slot).cloned().unwrap_or_default(), elements)
            })
            .collect();
        Ok(Lookup {
            inner: Rc::new(LookupInner { index, groups }),
        })
    }

    pub fn contains_key(&self, key: &Value) -> LinqResult<bool> {
        Ok(self.inner.index.find(key)?.is_some())
    }

    /// The elements for `key`; empty when the key is absent.
    pub fn get(&self, key: &Value) -> LinqResult<Enumerable> {
        Ok(match self.grouping(key)? {
            Some(group) => group.elements(),
            None => Enumerable::empty(),
        })
    }

    pub fn grouping(&self, key: &Value) -> LinqResult<Option<&Grouping>> {
        Ok(self
            .inner
            .index
            .find(key)?
            .and_then(|slot| self.inner.groups.get(slot)))
    }

    /// The `i`-th grouping in key order.
    pub fn at(&self, i: usize) -> Option<&Grouping> {
        self.inner.groups.get(i)
    }

    pub fn len(&self) -> usize {
        self.inner.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.groups.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> + '_ {
        self.inner.groups.iter().map(Grouping::key)
    }

    pub fn groupings(&self) -> &[Grouping] {
        &self.inner.groups
    }

    /// `(group key, element sequence)` pairs. The values are sequences,
    /// not `Grouping`s.
    pub fn to_enumerable(&self) -> Enumerable {
        let pairs: Vec<Pair> = self
            .inner
            .groups
            .iter()
            .map(|g| (g.key.clone(), Value::object(g.elements())))
            .collect();
        Enumerable::from_source(BufferSource::new(pairs.into()))
    }
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.groups.iter()).finish()
    }
}

impl Object for Lookup {
    fn type_name(&self) -> &'static str {
        "Lookup"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn call_method(&self, name: &str, args: &[Value]) -> LinqResult<Value> {
        match name {
            "get" | "offsetGet" => {
                let [key] = args else {
                    return Err(arity_mismatch(name, "1", args.len()));
                };
                Ok(Value::object(self.get(key)?))
            }
            "contains" | "containsKey" | "offsetExists" => {
                let [key] = args else {
                    return Err(arity_mismatch(name, "1", args.len()));
                };
                Ok(Value::Bool(self.contains_key(key)?))
            }
            "count" if args.is_empty() => Ok(Value::index(self.len())),
            "at" => {
                let [position] = args else {
                    return Err(arity_mismatch(name, "1", args.len()));
                };
                let Value::Int(i) = position else {
                    return Err(type_mismatch("int", position.type_name()));
                };
                Ok(usize::try_from(*i)
                    .ok()
                    .and_then(|i| self.at(i))
                    .map_or(Value::Null, |g| Value::object(g.clone())))
            }
            _ => self.to_enumerable().call_method(name, args),
        }
    }

    fn materialize(&self) -> LinqResult<Value> {
        let mut array = ArrayValue::with_capacity(self.len());
        for group in self.groupings() {
            array.insert(group.key.clone(), group.materialize()?);
        }
        Ok(Value::array(array))
    }
}
