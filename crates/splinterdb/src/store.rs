//! The operations every backend provides.
//!
//! `SplinterDb` (native) and `MemoryDb` (in-process) implement `KvStore`, so
//! code written against the trait runs unchanged on either.

use crate::config::DbConfig;
use crate::error::{SplinterError, SplinterResult};

/// Outcome of a point lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    Found(Vec<u8>),
    NotFound,
}

impl LookupResult {
    pub fn is_found(&self) -> bool {
        matches!(self, LookupResult::Found(_))
    }

    pub fn into_option(self) -> Option<Vec<u8>> {
        match self {
            LookupResult::Found(v) => Some(v),
            LookupResult::NotFound => None,
        }
    }
}

/// Entry under a cursor. Borrowed from the cursor, so it is invalidated by
/// the next `next()`/`prev()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorEntry<'c> {
    pub key: &'c [u8],
    pub value: &'c [u8],
}

/// Bidirectional cursor over a key range.
///
/// Moving off either end leaves the cursor exhausted on that side
/// (`current()` is `None`); moving back in the other direction resumes at the
/// boundary entry.
pub trait KvCursor {
    fn current(&self) -> Option<CursorEntry<'_>>;

    /// Step forward. `Ok(false)` without moving if already past the end,
    /// otherwise moves and reports whether it landed on an entry.
    fn next(&mut self) -> SplinterResult<bool>;

    /// Step backward, mirroring `next()`.
    fn prev(&mut self) -> SplinterResult<bool>;
}

/// Key-value operations shared by all backends.
pub trait KvStore: Send + Sync {
    type Cursor<'a>: KvCursor
    where
        Self: 'a;

    fn insert(&self, key: &[u8], value: &[u8]) -> SplinterResult<()>;

    /// Record `delta` against `key`; folded into older data by `DataFuncs::merge`.
    fn update(&self, key: &[u8], delta: &[u8]) -> SplinterResult<()>;

    fn delete(&self, key: &[u8]) -> SplinterResult<()>;

    fn lookup(&self, key: &[u8]) -> SplinterResult<LookupResult>;

    /// Open a cursor at the first key `>= start`, or the smallest key if `None`.
    fn range(&self, start: Option<&[u8]>) -> SplinterResult<Self::Cursor<'_>>;

    /// Register the calling thread. Idempotent: returns `Ok(true)` only when
    /// this call did the registering, `Ok(false)` if it was already registered.
    ///
    /// A registered thread holds one of `MAX_THREADS` slots until it calls
    /// `deregister_thread`; a thread that exits without doing so keeps its
    /// slot for the lifetime of the handle.
    fn register_thread(&self) -> SplinterResult<bool>;

    /// Release the calling thread's engine state. No-op if not registered.
    fn deregister_thread(&self);

    fn config(&self) -> &DbConfig;

    /// Register the calling thread for the lifetime of the returned guard.
    ///
    /// If the thread was already registered (it opened the handle, or an
    /// outer guard is alive) the guard leaves that registration alone.
    fn thread_guard(&self) -> SplinterResult<ThreadGuard<'_, Self>>
    where
        Self: Sized,
    {
        let registered = self.register_thread()?;
        Ok(ThreadGuard { store: self, registered })
    }
}

/// Deregisters the owning thread on drop, if the guard registered it.
///
/// Hold one for the whole life of a worker thread so its slot is returned
/// when the thread finishes.
#[must_use = "the thread is deregistered as soon as the guard is dropped"]
pub struct ThreadGuard<'a, S: KvStore> {
    store: &'a S,
    registered: bool,
}

impl<S: KvStore> ThreadGuard<'_, S> {
    /// Whether dropping this guard will deregister the thread.
    pub fn owns_registration(&self) -> bool {
        self.registered
    }
}

impl<S: KvStore> Drop for ThreadGuard<'_, S> {
    fn drop(&mut self) {
        if self.registered {
            self.store.deregister_thread();
        }
    }
}

/// Reject keys and values the engine would assert on.
pub(crate) fn check_entry(cfg: &DbConfig, key: &[u8], value: Option<&[u8]>) -> SplinterResult<()> {
    check_key(cfg, key)?;
    if let Some(value) = value {
        if value.len() > cfg.max_value_size {
            return Err(SplinterError::OversizedEntry {
                entry_size: value.len() as u64,
                max_size: cfg.max_value_size as u64,
                component: "value",
            });
        }
    }
    Ok(())
}

pub(crate) fn check_key(cfg: &DbConfig, key: &[u8]) -> SplinterResult<()> {
    if key.is_empty() {
        return Err(SplinterError::EmptyKey);
    }
    if key.len() > cfg.max_key_size {
        return Err(SplinterError::OversizedEntry {
            entry_size: key.len() as u64,
            max_size: cfg.max_key_size as u64,
            component: "key",
        });
    }
    Ok(())
}
