//! Set operators. Results are distinct under the comparer and keep the
//! key of the first occurrence.

use lq_value::LinqResult;

use crate::comparer::KeyIndex;
use crate::context::CallSite;
use crate::source::{cursor_fn, FnSource, Upstream};
use crate::{Enumerable, EqualityComparer, IntoEnumerable, IntoInvocable};

impl Enumerable {
    pub fn distinct(&self, comparer: Option<EqualityComparer>) -> Enumerable {
        let upstream = self.clone();
        let comparer = comparer.unwrap_or_default();
        self.node("distinct", move || {
            let mut up = Upstream::open(&upstream)?;
            let mut seen = KeyIndex::new(comparer.clone());
            Ok(cursor_fn(move || {
                while let Some((key, value)) = up.pull()? {
                    if seen.insert(value.clone())?.1 {
                        return Ok(Some((key, value)));
                    }
                }
                Ok(None)
            }))
        })
    }

    /// Distinct by `key_selector(value, key)`.
    pub fn distinct_by(
        &self,
        key_selector: impl IntoInvocable,
        comparer: Option<EqualityComparer>,
    ) -> LinqResult<Enumerable> {
        let selector = key_selector.into_invocable()?;
        let upstream = self.clone();
        let comparer = comparer.unwrap_or_default();
        Ok(self.node("distinct_by", move || {
            let mut up = Upstream::open(&upstream)?;
            let mut site = CallSite::new(selector.clone());
            let mut seen = KeyIndex::new(comparer.clone());
            let mut stopped = false;
            Ok(cursor_fn(move || {
                while !stopped {
                    let Some((key, value)) = up.pull()? else {
                        return Ok(None);
                    };
                    let out = site.invoke_element(&key, &value, &mut up)?;
                    stopped = out.cancel;
                    if seen.insert(out.value)?.1 {
                        return Ok(Some((key, value)));
                    }
                }
                Ok(None)
            }))
        }))
    }

    /// Elements of `self` not in `other`.
    pub fn except(
        &self,
        other: impl IntoEnumerable,
        comparer: Option<EqualityComparer>,
    ) -> LinqResult<Enumerable> {
        let other = other.into_enumerable()?;
        let upstream = self.clone();
        let comparer = comparer.unwrap_or_default();
        let restartable = self.is_restartable() && other.is_restartable();
        Ok(Enumerable::from_source(FnSource::new("except", restartable, move || {
            let mut seen = other.value_index(comparer.clone())?;
            let mut up = Upstream::open(&upstream)?;
            Ok(cursor_fn(move || {
                while let Some((key, value)) = up.pull()? {
                    if seen.insert(value.clone())?.1 {
                        return Ok(Some((key, value)));
                    }
                }
                Ok(None)
            }))
        })))
    }

    /// Elements of `self` also in `other`.
    pub fn intersect(
        &self,
        other: impl IntoEnumerable,
        comparer: Option<EqualityComparer>,
    ) -> LinqResult<Enumerable> {
        let other = other.into_enumerable()?;
        let upstream = self.clone();
        let comparer = comparer.unwrap_or_default();
        let restartable = self.is_restartable() && other.is_restartable();
        Ok(Enumerable::from_source(FnSource::new("intersect", restartable, move || {
            let wanted = other.value_index(comparer.clone())?;
            let mut seen = KeyIndex::new(comparer.clone());
            let mut up = Upstream::open(&upstream)?;
            Ok(cursor_fn(move || {
                while let Some((key, value)) = up.pull()? {
                    if wanted.find(&value)?.is_some() && seen.insert(value.clone())?.1 {
                        return Ok(Some((key, value)));
                    }
                }
                Ok(None)
            }))
        })))
    }

    /// Distinct elements of `self` then `other`.
    pub fn union(
        &self,
        other: impl IntoEnumerable,
        comparer: Option<EqualityComparer>,
    ) -> LinqResult<Enumerable> {
        Ok(self.concat(other)?.distinct(comparer))
    }

    /// Index of every value, traversing once.
    fn value_index(&self, comparer: EqualityComparer) -> LinqResult<KeyIndex> {
        let mut index = KeyIndex::new(comparer);
        let mut up = Upstream::open(self)?;
        while let Some((_, value)) = up.pull()? {
            index.insert(value)?;
        }
        Ok(index)
    }
}
