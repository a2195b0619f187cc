//! Positional traversal of an [`Enumerable`].

use lq_value::{LinqError, LinqResult, Value};

use crate::source::SeqCursor;
use crate::{Enumerable, Pair};

/// Five-point cursor: `is_valid`, `current_value`, `current_key`,
/// `advance`, `reset`.
///
/// A cursor is opened primed on the first element. Once exhausted it stays
/// invalid until [`Cursor::reset`], which reopens the sequence.
pub struct Cursor {
    seq: Enumerable,
    inner: Box<dyn SeqCursor>,
    current: Option<Pair>,
}

impl Cursor {
    pub(crate) fn open(seq: &Enumerable) -> LinqResult<Self> {
        let mut inner = seq.open()?;
        let current = inner.next_pair()?;
        Ok(Cursor {
            seq: seq.clone(),
            inner,
            current,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_value(&self) -> Option<&Value> {
        self.current.as_ref().map(|(_, v)| v)
    }

    pub fn current_key(&self) -> Option<&Value> {
        self.current.as_ref().map(|(k, _)| k)
    }

    /// Move to the next element. A no-op once exhausted.
    pub fn advance(&mut self) -> LinqResult<()> {
        if self.current.is_some() {
            self.current = None;
            self.current = self.inner.next_pair()?;
        }
        Ok(())
    }

    /// Start over from a fresh traversal of the same sequence.
    pub fn reset(&mut self) -> LinqResult<()> {
        tracing::trace!(source = self.seq.name(), "cursor reset");
        self.current = None;
        self.inner = self.seq.open()?;
        self.current = self.inner.next_pair()?;
        Ok(())
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("source", &self.seq.name())
            .field("current", &self.current)
            .finish()
    }
}

/// `Iterator` adapter. Opens lazily on the first `next`; ends after the
/// first error.
pub struct Iter {
    seq: Option<Enumerable>,
    inner: Option<Box<dyn SeqCursor>>,
}

impl Iter {
    pub(crate) fn new(seq: Enumerable) -> Self {
        Iter {
            seq: Some(seq),
            inner: None,
        }
    }

    fn pull(&mut self) -> LinqResult<Option<Pair>> {
        if let Some(seq) = self.seq.take() {
            self.inner = Some(seq.open()?);
        }
        match self.inner.as_mut() {
            Some(inner) => inner.next_pair(),
            None => Ok(None),
        }
    }
}

impl Iterator for Iter {
    type Item = Result<Pair, LinqError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.pull() {
            Ok(Some(pair)) => Some(Ok(pair)),
            Ok(None) => None,
            Err(err) => {
                self.inner = None;
                Some(Err(err))
            }
        }
    }
}

impl IntoIterator for Enumerable {
    type Item = LinqResult<Pair>;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        Iter::new(self)
    }
}

impl IntoIterator for &Enumerable {
    type Item = LinqResult<Pair>;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        Iter::new(self.clone())
    }
}
