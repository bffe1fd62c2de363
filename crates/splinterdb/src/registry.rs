//! Per-thread registration bookkeeping.
//!
//! The engine keeps per-thread state (I/O contexts, scratch buffers) indexed
//! by a small thread id, and crashes if an unregistered thread issues an
//! operation. The registry catches that on the Rust side and turns it into
//! `SplinterError::ThreadNotRegistered`.

use std::thread::{self, ThreadId};

use hashbrown::HashSet;
use parking_lot::RwLock;

use crate::error::{SplinterError, SplinterResult};

/// Maximum number of threads registered with one handle at a time.
pub const MAX_THREADS: usize = 64;

/// Set of threads currently registered with a handle.
///
/// Entries are keyed by `ThreadId` and only leave through
/// `deregister_current`, called from the thread itself. A thread that exits
/// while registered keeps its slot until the handle is dropped.
#[derive(Debug)]
pub struct ThreadRegistry {
    threads: RwLock<HashSet<ThreadId>>,
    limit: usize,
}

impl ThreadRegistry {
    /// Create a registry with the calling thread already registered, which is
    /// what `splinterdb_create`/`splinterdb_open` do for the opening thread.
    pub fn with_current() -> Self {
        let mut threads = HashSet::new();
        threads.insert(thread::current().id());
        Self {
            threads: RwLock::new(threads),
            limit: MAX_THREADS,
        }
    }

    /// Register the calling thread.
    ///
    /// Returns `Ok(false)` if it was already registered, in which case the
    /// engine must not be told again. The caller must deregister before the
    /// thread exits.
    pub fn register_current(&self) -> SplinterResult<bool> {
        let mut threads = self.threads.write();
        let id = thread::current().id();
        if threads.contains(&id) {
            return Ok(false);
        }
        if threads.len() >= self.limit {
            return Err(SplinterError::TooManyThreads { limit: self.limit });
        }
        threads.insert(id);
        Ok(true)
    }

    /// Deregister the calling thread. Returns whether it was registered.
    pub fn deregister_current(&self) -> bool {
        self.threads.write().remove(&thread::current().id())
    }

    /// Fail unless the calling thread is registered.
    pub fn ensure_current(&self) -> SplinterResult<()> {
        if self.threads.read().contains(&thread::current().id()) {
            Ok(())
        } else {
            Err(SplinterError::ThreadNotRegistered)
        }
    }

    /// Number of registered threads.
    pub fn len(&self) -> usize {
        self.threads.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.read().is_empty()
    }
}
