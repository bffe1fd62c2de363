//! SplinterDB bindings for Rust
//!
//! Safe wrappers around SplinterDB, a log-structured key-value storage
//! engine written in C.
//!
//! # Architecture
//!
//! - **`KvStore` / `KvCursor`**: the operation set (insert, update, delete,
//!   lookup, bidirectional range scans, thread registration)
//! - **`SplinterDb`** (feature `native`): owned handle over libsplinterdb
//! - **`MemoryDb`**: in-process store with the same semantics, for tests and
//!   for machines without the native library
//! - **`DataFuncs`**: key ordering, hashing and update-merge callbacks that the
//!   engine calls back into
//!
//! ```
//! use splinterdb::{DbConfig, KvStore, LookupResult, MemoryDb};
//!
//! let db = MemoryDb::new(DbConfig::testing())?;
//! db.insert(b"key", b"value")?;
//! assert_eq!(db.lookup(b"key")?, LookupResult::Found(b"value".to_vec()));
//! # Ok::<(), splinterdb::SplinterError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod memory;
pub mod registry;
pub mod store;

#[cfg(feature = "native")]
pub mod native;

// Re-export key types for convenience
pub use config::DbConfig;
pub use data::{DataFuncs, DefaultDataFuncs, Message, MessageType};
pub use error::{SplinterError, SplinterResult};
pub use memory::{MemoryCursor, MemoryDb};
pub use registry::MAX_THREADS;
pub use store::{CursorEntry, KvCursor, KvStore, LookupResult, ThreadGuard};

#[cfg(feature = "native")]
pub use native::{SplinterCursor, SplinterDb};
