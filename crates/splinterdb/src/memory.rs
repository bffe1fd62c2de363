//! In-process backend with the same observable behaviour as the native
//! engine.
//!
//! Entries live in a vector kept sorted by `D::key_compare`. Each key holds
//! at most one message: an `Insert`, or an `Update` that has not met an older
//! base yet and is resolved through `merge_final` on read. Deletes remove the
//! entry outright. Nothing is persisted.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::DbConfig;
use crate::data::{self, DataFuncs, DefaultDataFuncs, Message};
use crate::error::{SplinterError, SplinterResult};
use crate::registry::ThreadRegistry;
use crate::store::{self, CursorEntry, KvCursor, KvStore, LookupResult};

/// Ordered in-memory store driven by the data config `D`.
pub struct MemoryDb<D: DataFuncs = DefaultDataFuncs> {
    /// Sorted by key under `D::key_compare`
    entries: RwLock<Vec<(Vec<u8>, Message)>>,
    registry: ThreadRegistry,
    config: DbConfig,
    _funcs: PhantomData<fn() -> D>,
}

impl MemoryDb<DefaultDataFuncs> {
    /// Create a store with byte-order keys and overwrite-on-update.
    pub fn new(config: DbConfig) -> SplinterResult<Self> {
        Self::with_data_funcs(config)
    }
}

impl<D: DataFuncs> MemoryDb<D> {
    /// Create a store using `D` for ordering and merging.
    ///
    /// The calling thread is registered, as with `SplinterDb::create`.
    pub fn with_data_funcs(config: DbConfig) -> SplinterResult<Self> {
        config
            .validate()
            .map_err(|reason| SplinterError::InvalidConfig { reason })?;
        debug!(max_key_size = config.max_key_size, "opened in-memory store");
        Ok(Self {
            entries: RwLock::new(Vec::new()),
            registry: ThreadRegistry::with_current(),
            config,
            _funcs: PhantomData,
        })
    }

    /// Number of live keys, counting unresolved updates.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn search(entries: &[(Vec<u8>, Message)], key: &[u8]) -> Result<usize, usize> {
        entries.binary_search_by(|(k, _)| D::key_compare(k, key))
    }

    fn write_message(&self, key: &[u8], msg: Message) -> SplinterResult<()> {
        let mut entries = self.entries.write();
        match Self::search(&entries, key) {
            Ok(idx) => match data::apply::<D>(key, Some(&entries[idx].1), msg)? {
                Some(merged) => entries[idx].1 = merged,
                None => {
                    entries.remove(idx);
                }
            },
            Err(idx) => {
                if let Some(msg) = data::apply::<D>(key, None, msg)? {
                    entries.insert(idx, (key.to_vec(), msg));
                }
            }
        }
        Ok(())
    }
}

impl<D: DataFuncs> fmt::Debug for MemoryDb<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDb")
            .field("entries", &self.len())
            .field("threads", &self.registry.len())
            .finish()
    }
}

impl<D: DataFuncs> KvStore for MemoryDb<D> {
    type Cursor<'a> = MemoryCursor where Self: 'a;

    fn insert(&self, key: &[u8], value: &[u8]) -> SplinterResult<()> {
        self.registry.ensure_current()?;
        store::check_entry(&self.config, key, Some(value))?;
        self.write_message(key, Message::insert(value))
    }

    fn update(&self, key: &[u8], delta: &[u8]) -> SplinterResult<()> {
        self.registry.ensure_current()?;
        store::check_entry(&self.config, key, Some(delta))?;
        self.write_message(key, Message::update(delta))
    }

    fn delete(&self, key: &[u8]) -> SplinterResult<()> {
        self.registry.ensure_current()?;
        store::check_key(&self.config, key)?;
        self.write_message(key, Message::delete())
    }

    fn lookup(&self, key: &[u8]) -> SplinterResult<LookupResult> {
        self.registry.ensure_current()?;
        store::check_key(&self.config, key)?;
        let entries = self.entries.read();
        let Ok(idx) = Self::search(&entries, key) else {
            return Ok(LookupResult::NotFound);
        };
        Ok(match data::resolve::<D>(key, &entries[idx].1)? {
            Some(value) => LookupResult::Found(value),
            None => LookupResult::NotFound,
        })
    }

    fn range(&self, start: Option<&[u8]>) -> SplinterResult<MemoryCursor> {
        self.registry.ensure_current()?;
        let start = start.filter(|k| !k.is_empty());
        if let Some(start) = start {
            store::check_key(&self.config, start)?;
        }

        let entries = self.entries.read();
        let mut snapshot = Vec::with_capacity(entries.len());
        for (key, msg) in entries.iter() {
            if let Some(value) = data::resolve::<D>(key, msg)? {
                snapshot.push((key.clone(), value));
            }
        }
        drop(entries);

        let first = match start {
            Some(start) => {
                snapshot.partition_point(|(k, _)| D::key_compare(k, start) == Ordering::Less)
            }
            None => 0,
        };
        Ok(MemoryCursor::new(snapshot, first))
    }

    fn register_thread(&self) -> SplinterResult<bool> {
        let registered = self.registry.register_current()?;
        if registered {
            debug!(threads = self.registry.len(), "registered thread");
        }
        Ok(registered)
    }

    fn deregister_thread(&self) {
        if self.registry.deregister_current() {
            debug!(threads = self.registry.len(), "deregistered thread");
        }
    }

    fn config(&self) -> &DbConfig {
        &self.config
    }
}

/// Cursor over a resolved snapshot taken when the cursor was opened.
#[derive(Debug)]
pub struct MemoryCursor {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    /// 0 = before the first entry, `i + 1` = entry `i`, `len + 1` = past the end
    pos: usize,
}

impl MemoryCursor {
    fn new(entries: Vec<(Vec<u8>, Vec<u8>)>, first: usize) -> Self {
        Self { entries, pos: first + 1 }
    }
}

impl KvCursor for MemoryCursor {
    fn current(&self) -> Option<CursorEntry<'_>> {
        let idx = self.pos.checked_sub(1)?;
        self.entries
            .get(idx)
            .map(|(key, value)| CursorEntry { key, value })
    }

    fn next(&mut self) -> SplinterResult<bool> {
        if self.pos > self.entries.len() {
            return Ok(false);
        }
        self.pos += 1;
        Ok(self.current().is_some())
    }

    fn prev(&mut self) -> SplinterResult<bool> {
        if self.pos == 0 {
            return Ok(false);
        }
        self.pos -= 1;
        Ok(self.current().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::Counter;

    fn counter(n: u64) -> Vec<u8> {
        n.to_le_bytes().to_vec()
    }

    #[test]
    fn test_insert_lookup_delete() {
        let db = MemoryDb::new(DbConfig::testing()).unwrap();
        db.insert(b"a", b"1").unwrap();
        db.insert(b"a", b"2").unwrap();
        assert_eq!(db.lookup(b"a").unwrap(), LookupResult::Found(b"2".to_vec()));

        db.delete(b"a").unwrap();
        assert_eq!(db.lookup(b"a").unwrap(), LookupResult::NotFound);
        assert!(db.is_empty());

        // Deleting a missing key is not an error
        db.delete(b"missing").unwrap();
    }

    #[test]
    fn test_updates_merge_through_data_funcs() {
        let db = MemoryDb::<Counter>::with_data_funcs(DbConfig::testing()).unwrap();
        db.update(b"hits", &counter(3)).unwrap();
        db.update(b"hits", &counter(4)).unwrap();
        assert_eq!(db.lookup(b"hits").unwrap(), LookupResult::Found(counter(7)));

        db.insert(b"hits", &counter(100)).unwrap();
        db.update(b"hits", &counter(1)).unwrap();
        assert_eq!(db.lookup(b"hits").unwrap(), LookupResult::Found(counter(101)));

        db.delete(b"hits").unwrap();
        db.update(b"hits", &counter(5)).unwrap();
        assert_eq!(db.lookup(b"hits").unwrap(), LookupResult::Found(counter(5)));
    }

    #[test]
    fn test_failed_merge_leaves_entry_intact() {
        let db = MemoryDb::<Counter>::with_data_funcs(DbConfig::testing()).unwrap();
        db.insert(b"c", b"xy").unwrap();
        assert!(matches!(db.update(b"c", &counter(1)), Err(SplinterError::Merge { .. })));
        assert_eq!(db.lookup(b"c").unwrap(), LookupResult::Found(b"xy".to_vec()));
    }

    #[test]
    fn test_cursor_walks_both_directions() {
        let db = MemoryDb::new(DbConfig::testing()).unwrap();
        for k in [b"b", b"d", b"a", b"c"] {
            db.insert(k, k).unwrap();
        }

        let mut cursor = db.range(Some(b"bb")).unwrap();
        assert_eq!(cursor.current().unwrap().key, b"c");
        assert!(cursor.next().unwrap());
        assert_eq!(cursor.current().unwrap().key, b"d");
        assert!(!cursor.next().unwrap());
        assert!(cursor.current().is_none());
        assert!(!cursor.next().unwrap());

        assert!(cursor.prev().unwrap());
        assert_eq!(cursor.current().unwrap().key, b"d");
        for expected in [b"c", b"b", b"a"] {
            assert!(cursor.prev().unwrap());
            assert_eq!(cursor.current().unwrap().value, expected);
        }
        assert!(!cursor.prev().unwrap());
        assert!(!cursor.prev().unwrap());
        assert!(cursor.next().unwrap());
        assert_eq!(cursor.current().unwrap().key, b"a");
    }

    #[test]
    fn test_cursor_is_a_snapshot() {
        let db = MemoryDb::new(DbConfig::testing()).unwrap();
        db.insert(b"a", b"1").unwrap();
        let cursor = db.range(None).unwrap();
        db.insert(b"a", b"2").unwrap();
        assert_eq!(cursor.current().unwrap().value, b"1");
    }

    #[test]
    fn test_empty_range() {
        let db = MemoryDb::new(DbConfig::testing()).unwrap();
        let mut cursor = db.range(None).unwrap();
        assert!(cursor.current().is_none());
        assert!(!cursor.next().unwrap());
        assert!(!cursor.prev().unwrap());
    }

    #[test]
    fn test_custom_ordering() {
        struct Reverse;
        impl DataFuncs for Reverse {
            fn key_compare(a: &[u8], b: &[u8]) -> Ordering {
                b.cmp(a)
            }
        }

        let db = MemoryDb::<Reverse>::with_data_funcs(DbConfig::testing()).unwrap();
        for k in [b"a", b"c", b"b"] {
            db.insert(k, b"").unwrap();
        }
        let mut cursor = db.range(None).unwrap();
        let mut keys = Vec::new();
        while let Some(entry) = cursor.current() {
            keys.push(entry.key.to_vec());
            cursor.next().unwrap();
        }
        assert_eq!(keys, vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let err = MemoryDb::new(DbConfig::testing().with_max_key_size(0)).unwrap_err();
        assert!(matches!(err, SplinterError::InvalidConfig { .. }));
    }
}
