//! A tree behind a read-write lock.

use std::path::Path;

use parking_lot::RwLock;

use crate::error::Result;
use crate::tree::Pretree;

/// A [`Pretree`] that many threads can classify with while one of them
/// occasionally trains, prunes or saves.
///
/// Lookups take the read lock; every mutating call takes the write lock for
/// its whole duration, so readers never observe a tree mid-conversion.
#[derive(Debug, Default)]
pub struct SharedPretree {
    inner: RwLock<Pretree>,
}

impl SharedPretree {
    /// Wrap an existing tree.
    pub fn new(tree: Pretree) -> Self {
        Self {
            inner: RwLock::new(tree),
        }
    }

    /// Open a model file and wrap it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Pretree::open(path)?))
    }

    /// Classify `word` under the read lock.
    pub fn classify(&self, word: &str) -> String {
        self.inner.read().classify(word)
    }

    /// Probability of `class` for `word` under the read lock.
    pub fn probability_for_class(&self, word: &str, class: &str) -> f64 {
        self.inner.read().probability_for_class(word, class)
    }

    /// Train one entry under the write lock.
    pub fn train(&self, word: &str, class: &str, count: u64) -> Result<()> {
        self.inner.write().train(word, class, count)
    }

    /// Prune under the write lock.
    pub fn prune(&self) -> Result<()> {
        self.inner.write().prune()
    }

    /// Freeze under the write lock, so later lookups run over the buffer.
    pub fn freeze(&self) -> Result<()> {
        self.inner.write().freeze()
    }

    /// Save under the write lock (saving freezes the tree).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.inner.write().save(path)
    }

    /// Run `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&Pretree) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut Pretree) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Unwrap the tree.
    pub fn into_inner(self) -> Pretree {
        self.inner.into_inner()
    }
}

impl From<Pretree> for SharedPretree {
    fn from(tree: Pretree) -> Self {
        Self::new(tree)
    }
}
