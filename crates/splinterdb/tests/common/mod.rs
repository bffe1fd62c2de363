//! Checks shared by the memory and native integration suites.

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;

use splinterdb::{
    DataFuncs, KvCursor, KvStore, LookupResult, Message, SplinterError, SplinterResult,
    MAX_THREADS,
};

/// Little-endian u64 counters: updates add.
pub struct Counter;

pub fn counter(n: u64) -> Vec<u8> {
    n.to_le_bytes().to_vec()
}

fn decode(data: &[u8]) -> SplinterResult<u64> {
    let bytes: [u8; 8] = data.try_into().map_err(|_| SplinterError::Merge {
        reason: format!("expected 8 bytes, got {}", data.len()),
    })?;
    Ok(u64::from_le_bytes(bytes))
}

impl DataFuncs for Counter {
    fn merge(_key: &[u8], older: &Message, newer: Message) -> SplinterResult<Message> {
        Ok(Message {
            kind: older.kind,
            data: counter(decode(&older.data)? + decode(&newer.data)?),
        })
    }
}

/// Collect every entry from the cursor's position to the end.
pub fn drain_forward<C: KvCursor>(cursor: &mut C) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut out = Vec::new();
    while let Some(entry) = cursor.current() {
        out.push((entry.key.to_vec(), entry.value.to_vec()));
        if !cursor.next().unwrap() {
            break;
        }
    }
    out
}

pub fn check_point_ops<S: KvStore>(db: &S) {
    db.insert(b"alpha", b"1").unwrap();
    db.insert(b"beta", b"2").unwrap();
    assert_eq!(db.lookup(b"alpha").unwrap(), LookupResult::Found(b"1".to_vec()));
    assert_eq!(db.lookup(b"gamma").unwrap(), LookupResult::NotFound);

    db.insert(b"alpha", b"one").unwrap();
    assert_eq!(db.lookup(b"alpha").unwrap().into_option(), Some(b"one".to_vec()));

    db.delete(b"beta").unwrap();
    assert_eq!(db.lookup(b"beta").unwrap(), LookupResult::NotFound);
}

pub fn check_limits<S: KvStore>(db: &S) {
    let max_key = db.config().max_key_size;
    let long_key = vec![b'k'; max_key + 1];
    assert!(matches!(
        db.insert(&long_key, b"v"),
        Err(SplinterError::OversizedEntry { component: "key", .. })
    ));
    assert_eq!(db.insert(b"", b"v"), Err(SplinterError::EmptyKey));

    let big_value = vec![0u8; db.config().max_value_size + 1];
    assert!(matches!(
        db.insert(b"k", &big_value),
        Err(SplinterError::OversizedEntry { component: "value", .. })
    ));

    let max_key_ok = vec![b'k'; max_key];
    db.insert(&max_key_ok, b"v").unwrap();
    assert!(db.lookup(&max_key_ok).unwrap().is_found());
}

pub fn check_range_scan<S: KvStore>(db: &S) {
    for i in 0..20u32 {
        let key = format!("key-{:03}", i);
        db.insert(key.as_bytes(), &i.to_be_bytes()).unwrap();
    }

    let mut cursor = db.range(None).unwrap();
    let all = drain_forward(&mut cursor);
    assert_eq!(all.len(), 20);
    assert!(all.windows(2).all(|w| w[0].0 < w[1].0));

    let mut cursor = db.range(Some(b"key-010")).unwrap();
    let tail = drain_forward(&mut cursor);
    assert_eq!(tail.len(), 10);
    assert_eq!(tail[0].0, b"key-010");

    // Starting between keys lands on the next one
    let cursor = db.range(Some(b"key-0105")).unwrap();
    assert_eq!(cursor.current().unwrap().key, b"key-011");

    let cursor = db.range(Some(b"zzz")).unwrap();
    assert!(cursor.current().is_none());
}

pub fn check_cursor_reverses<S: KvStore>(db: &S) {
    for key in [b"a", b"b", b"c"] {
        db.insert(key, key).unwrap();
    }

    let mut cursor = db.range(Some(b"b")).unwrap();
    assert_eq!(cursor.current().unwrap().key, b"b");
    assert!(cursor.prev().unwrap());
    assert_eq!(cursor.current().unwrap().key, b"a");
    assert!(cursor.next().unwrap());
    assert!(cursor.next().unwrap());
    assert_eq!(cursor.current().unwrap().value, b"c");

    // Off the end: exhausted, and stays put
    assert!(!cursor.next().unwrap());
    assert!(cursor.current().is_none());
    assert!(!cursor.next().unwrap());
    assert!(cursor.current().is_none());

    assert!(cursor.prev().unwrap());
    assert_eq!(cursor.current().unwrap().key, b"c");

    // Same at the front
    for expected in [b"b", b"a"] {
        assert!(cursor.prev().unwrap());
        assert_eq!(cursor.current().unwrap().key, expected);
    }
    assert!(!cursor.prev().unwrap());
    assert!(cursor.current().is_none());
    assert!(!cursor.prev().unwrap());

    assert!(cursor.next().unwrap());
    assert_eq!(cursor.current().unwrap().key, b"a");
}

pub fn check_counter_updates<S: KvStore>(db: &S) {
    for _ in 0..5 {
        db.update(b"visits", &counter(2)).unwrap();
    }
    assert_eq!(db.lookup(b"visits").unwrap(), LookupResult::Found(counter(10)));

    db.insert(b"visits", &counter(1)).unwrap();
    db.update(b"visits", &counter(1)).unwrap();
    assert_eq!(db.lookup(b"visits").unwrap(), LookupResult::Found(counter(2)));

    db.delete(b"visits").unwrap();
    db.update(b"visits", &counter(7)).unwrap();
    assert_eq!(db.lookup(b"visits").unwrap(), LookupResult::Found(counter(7)));

    // Updates are visible to range scans too
    let cursor = db.range(Some(b"visits")).unwrap();
    assert_eq!(cursor.current().unwrap().value, counter(7));
}

pub fn check_thread_registration<S: KvStore + 'static>(db: Arc<S>) {
    let unregistered = {
        let db = Arc::clone(&db);
        thread::spawn(move || db.insert(b"t", b"x")).join().unwrap()
    };
    assert_eq!(unregistered, Err(SplinterError::ThreadNotRegistered));

    let handles: Vec<_> = (0..4u8)
        .map(|t| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                let _guard = db.thread_guard().unwrap();
                for i in 0..50u8 {
                    db.insert(&[b't', t, i], &[i]).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut cursor = db.range(Some(b"t")).unwrap();
    assert_eq!(drain_forward(&mut cursor).len(), 200);

    // Guards deregistered on drop
    let after = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            db.register_thread().unwrap();
            let res = db.lookup(&[b't', 0, 0]);
            db.deregister_thread();
            (res, db.lookup(&[b't', 0, 0]))
        })
        .join()
        .unwrap()
    };
    assert_eq!(after.0, Ok(LookupResult::Found(vec![0])));
    assert_eq!(after.1, Err(SplinterError::ThreadNotRegistered));
}

pub fn check_guard_keeps_existing_registration<S: KvStore + 'static>(db: Arc<S>) {
    // The opening thread is already registered; a guard must not undo that
    {
        let guard = db.thread_guard().unwrap();
        assert!(!guard.owns_registration());
    }
    db.insert(b"opener", b"still registered").unwrap();

    let nested = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            let outer = db.thread_guard().unwrap();
            assert!(outer.owns_registration());
            {
                let inner = db.thread_guard().unwrap();
                assert!(!inner.owns_registration());
            }
            let res = db.insert(b"nested", b"v");
            drop(outer);
            (res, db.insert(b"nested", b"w"))
        })
        .join()
        .unwrap()
    };
    assert_eq!(nested.0, Ok(()));
    assert_eq!(nested.1, Err(SplinterError::ThreadNotRegistered));
    assert_eq!(db.lookup(b"nested").unwrap(), LookupResult::Found(b"v".to_vec()));
}

/// Guarded threads give their slot back, so the limit only bounds threads
/// alive at the same time.
pub fn check_short_lived_threads<S: KvStore + 'static>(db: Arc<S>) {
    for i in 0..(MAX_THREADS * 2) as u32 {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            let _guard = db.thread_guard().unwrap();
            db.insert(&i.to_be_bytes(), b"x").unwrap();
        })
        .join()
        .unwrap();
    }

    let mut cursor = db.range(None).unwrap();
    assert_eq!(drain_forward(&mut cursor).len(), MAX_THREADS * 2);
}
