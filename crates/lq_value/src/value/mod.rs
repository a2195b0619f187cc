//! Runtime values for the lq sequence engine.
//!
//! # Equality
//!
//! `PartialEq`/`Eq`/`Hash` on [`Value`] implement the strict
//! identity-and-type contract used by every set and grouping operator:
//! values are equal only when they have the same kind and the same
//! content. `Int(1)` and `Float(1.0)` are different values; two arrays are
//! equal only with identical key/value pairs in identical order; objects
//! are equal only when they are the same shared instance. Floats compare
//! by bit pattern so that `Eq` and `Hash` stay consistent.
//!
//! The looser numeric comparison used by the `==` operator of the
//! micro-lambda language is [`Value::loose_equals`].
//!
//! # Ordering
//!
//! [`Value::compare`] is a total order: numbers compare numerically across
//! `Int` and `Float`, strings by bytes, arrays by length then pairwise, and
//! values of different kinds by [`ValueKind`] rank.

mod array;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

pub use array::ArrayValue;

use crate::{Heap, Object};

/// Runtime value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Immutable UTF-8 string.
    Str(Heap<str>),
    /// Ordered key/value map with associative-array semantics.
    Array(Heap<ArrayValue>),
    /// Engine object (sequence, grouping, lookup, ...).
    Object(Heap<dyn Object>),
}

/// Kind of a [`Value`], in cross-kind ordering rank.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    Str,
    Array,
    Object,
}

// Factory Methods (ONLY way to construct heap values)

impl Value {
    /// Create a string value.
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        let s: String = s.into();
        Value::Str(Heap::from_rc(Rc::from(s)))
    }

    /// Create an array value.
    #[inline]
    pub fn array(array: ArrayValue) -> Self {
        Value::Array(Heap::new(array))
    }

    /// Create a list-shaped array (keys `0..n`).
    #[inline]
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::array(items.into_iter().collect())
    }

    /// Wrap an engine object.
    #[inline]
    pub fn object(object: impl Object + 'static) -> Self {
        let rc: Rc<dyn Object> = Rc::new(object);
        Value::Object(Heap::from_rc(rc))
    }

    /// Integer value for a zero-based position.
    ///
    /// Positions beyond `i64::MAX` saturate; no sequence gets that long.
    #[inline]
    pub fn index(n: usize) -> Self {
        Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

// Value Methods

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) | Value::Float(_) => ValueKind::Number,
            Value::Str(_) => ValueKind::Str,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Type name for error messages and `of_type`/`cast` filters.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(o) => o.type_name(),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used by predicates.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(_) => true,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    #[allow(
        clippy::cast_precision_loss,
        reason = "numeric widening for mixed int/float arithmetic"
    )]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&dyn Object> {
        match self {
            Value::Object(o) => Some(&**o),
            _ => None,
        }
    }

    /// Text form used by string concatenation and `implode`: `null` and
    /// `false` become empty, `true` becomes `"1"`. `None` for arrays and
    /// objects.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null | Value::Bool(false) => Some(String::new()),
            Value::Bool(true) => Some("1".to_string()),
            Value::Int(_) | Value::Float(_) | Value::Str(_) => Some(self.to_string()),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Borrow the concrete object type behind an `Object` value.
    pub fn downcast_object<T: 'static>(&self) -> Option<&T> {
        self.as_object()
            .and_then(|object| object.as_any().downcast_ref::<T>())
    }

    /// Total 3-way ordering.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Int(a), Value::Float(b)) => compare_int_float(*a, *b),
            (Value::Float(a), Value::Int(b)) => compare_int_float(*b, *a).reverse(),
            (Value::Str(a), Value::Str(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Array(a), Value::Array(b)) => a.len().cmp(&b.len()).then_with(|| {
                a.iter()
                    .zip(b.iter())
                    .map(|((ka, va), (kb, vb))| ka.compare(kb).then_with(|| va.compare(vb)))
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            }),
            (Value::Object(a), Value::Object(b)) => a.addr().cmp(&b.addr()),
            _ => self.kind().cmp(&other.kind()),
        }
    }

    /// Equality of the `==` operator: numbers compare numerically across
    /// `Int`/`Float`, arrays compare pairwise loosely, everything else is
    /// strict.
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.compare(other) == Ordering::Equal
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka.loose_equals(kb) && va.loose_equals(vb))
            }
            _ => self == other,
        }
    }
}

/// Compare an integer against a float without losing integer precision
/// for in-range values. NaN sorts after every integer.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    reason = "range-checked before the truncating conversion"
)]
fn compare_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return Ordering::Less;
    }
    if f >= 9_223_372_036_854_775_808.0 {
        return Ordering::Less;
    }
    if f < -9_223_372_036_854_775_808.0 {
        return Ordering::Greater;
    }
    let truncated = f.trunc();
    match i.cmp(&(truncated as i64)) {
        Ordering::Equal => {
            let frac = f - truncated;
            if frac > 0.0 {
                Ordering::Less
            } else if frac < 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        ord => ord,
    }
}

// Conversions

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<ArrayValue> for Value {
    fn from(array: ArrayValue) -> Self {
        Value::array(array)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

// Trait Implementations

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(n) => write!(f, "Float({n:?})"),
            Value::Str(s) => write!(f, "Str({:?})", &**s),
            Value::Array(a) => write!(f, "Array({:?})", &**a),
            Value::Object(o) => write!(f, "Object({:?})", &**o),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Array(a) => fmt::Display::fmt(&**a, f),
            Value::Object(o) => write!(f, "<{}>", o.type_name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Heap::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Array(a) => a.hash(state),
            Value::Object(o) => o.addr().hash(state),
        }
    }
}
