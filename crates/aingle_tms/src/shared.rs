//! Thread-safe handle to a knowledge base.
//!
//! Each mutating call holds the write lock for its whole duration, so a
//! reader never observes a half-finished chaining run or cascade.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::KbConfig;
use crate::error::{Error, Result};
use crate::explain::Explanation;
use crate::item::Item;
use crate::kb::{Answer, AssertOutcome, KbStats, KnowledgeBase, RetractOutcome};
use crate::term::Statement;

/// A cloneable, lock-guarded [`KnowledgeBase`]. Clones share the same base.
#[derive(Debug, Clone, Default)]
pub struct SharedKnowledgeBase {
    inner: Arc<RwLock<KnowledgeBase>>,
}

impl SharedKnowledgeBase {
    /// Creates an empty shared knowledge base.
    pub fn new(config: KbConfig) -> Self {
        Self::from_kb(KnowledgeBase::with_config(config))
    }

    /// Wraps an existing knowledge base.
    pub fn from_kb(kb: KnowledgeBase) -> Self {
        Self {
            inner: Arc::new(RwLock::new(kb)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, KnowledgeBase>> {
        self.inner
            .read()
            .map_err(|e| {
                Error::LockPoisoned(format!("Failed to acquire knowledge base lock: {}", e))
            })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, KnowledgeBase>> {
        self.inner
            .write()
            .map_err(|e| {
                Error::LockPoisoned(format!("Failed to acquire knowledge base lock: {}", e))
            })
    }

    /// See [`KnowledgeBase::assert`].
    pub fn assert(&self, item: impl Into<Item>) -> Result<AssertOutcome> {
        self.write()?.assert(item)
    }

    /// See [`KnowledgeBase::retract`].
    pub fn retract(&self, item: impl Into<Item>) -> Result<RetractOutcome> {
        Ok(self.write()?.retract(item))
    }

    /// See [`KnowledgeBase::try_ask`].
    pub fn ask(&self, query: impl Into<Item>) -> Result<Vec<Answer>> {
        self.read()?.try_ask(query)
    }

    /// See [`KnowledgeBase::explain`].
    pub fn explain(&self, statement: &Statement) -> Result<Option<Explanation>> {
        Ok(self.read()?.explain(statement))
    }

    /// A copy of the current counters.
    pub fn stats(&self) -> Result<KbStats> {
        Ok(self.read()?.stats().clone())
    }

    /// Runs `f` with shared access to the knowledge base.
    pub fn with_read<R>(&self, f: impl FnOnce(&KnowledgeBase) -> R) -> Result<R> {
        Ok(f(&*self.read()?))
    }

    /// Runs `f` with exclusive access to the knowledge base.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut KnowledgeBase) -> R) -> Result<R> {
        Ok(f(&mut *self.write()?))
    }
}

impl From<KnowledgeBase> for SharedKnowledgeBase {
    fn from(kb: KnowledgeBase) -> Self {
        Self::from_kb(kb)
    }
}
