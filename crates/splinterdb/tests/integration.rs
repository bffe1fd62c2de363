//! Integration tests: the public API end to end on the in-memory backend.

mod common;

use std::sync::Arc;

use splinterdb::{DbConfig, KvCursor, KvStore, MemoryDb, SplinterError, MAX_THREADS};

use common::Counter;

fn test_db() -> MemoryDb {
    MemoryDb::new(DbConfig::testing()).unwrap()
}

#[test]
fn test_point_ops() {
    common::check_point_ops(&test_db());
}

#[test]
fn test_limits() {
    common::check_limits(&test_db());
}

#[test]
fn test_range_scan() {
    common::check_range_scan(&test_db());
}

#[test]
fn test_cursor_reverses() {
    common::check_cursor_reverses(&test_db());
}

#[test]
fn test_counter_updates() {
    let db = MemoryDb::<Counter>::with_data_funcs(DbConfig::testing()).unwrap();
    common::check_counter_updates(&db);
}

#[test]
fn test_thread_registration() {
    common::check_thread_registration(Arc::new(test_db()));
}

#[test]
fn test_guard_keeps_existing_registration() {
    common::check_guard_keeps_existing_registration(Arc::new(test_db()));
}

#[test]
fn test_short_lived_threads_release_slots() {
    common::check_short_lived_threads(Arc::new(test_db()));
}

#[test]
fn test_thread_limit() {
    let db = Arc::new(test_db());
    let (tx, rx) = std::sync::mpsc::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let release_rx = Arc::new(parking_lot::Mutex::new(release_rx));

    // The opening thread holds one slot
    let workers: Vec<_> = (0..MAX_THREADS)
        .map(|_| {
            let db = Arc::clone(&db);
            let tx = tx.clone();
            let release_rx = Arc::clone(&release_rx);
            std::thread::spawn(move || {
                let res = db.register_thread();
                tx.send(res.clone()).unwrap();
                let _ = release_rx.lock().recv();
                if res.is_ok() {
                    db.deregister_thread();
                }
            })
        })
        .collect();

    let results: Vec<_> = (0..MAX_THREADS).map(|_| rx.recv().unwrap()).collect();
    for _ in 0..MAX_THREADS {
        release_tx.send(()).unwrap();
    }
    for worker in workers {
        worker.join().unwrap();
    }

    let rejected: Vec<_> = results.iter().filter(|r| r.is_err()).collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0], &Err(SplinterError::TooManyThreads { limit: MAX_THREADS }));
}

#[test]
fn test_debug_output() {
    let db = test_db();
    db.insert(b"k", b"v").unwrap();
    let debug = format!("{:?}", db);
    assert!(debug.contains("MemoryDb"));
    assert!(debug.contains("entries: 1"));
}

#[test]
fn test_cursor_outlives_writes() {
    let db = test_db();
    db.insert(b"a", b"1").unwrap();
    db.insert(b"b", b"2").unwrap();

    let mut cursor = db.range(None).unwrap();
    db.delete(b"b").unwrap();
    assert!(cursor.next().unwrap());
    assert_eq!(cursor.current().unwrap().key, b"b");
}
