//! Key ordering and merge behaviour supplied to the engine.
//!
//! SplinterDB never interprets keys or values itself. It asks a *data config*
//! how to order keys, how to hash them, and how to fold an `Update` message
//! into whatever older message exists for the same key. `DataFuncs` is the
//! Rust side of that contract; the native backend exposes an implementation
//! to C through generic trampolines, the memory backend calls it directly.

use std::cmp::Ordering;
use std::fmt::Write as _;

use crate::error::{SplinterError, SplinterResult};

/// Kind of a stored message. Discriminants match the engine's `message_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MessageType {
    Insert = 1,
    Update = 2,
    Delete = 3,
}

impl MessageType {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for MessageType {
    type Error = SplinterError;

    fn try_from(code: i32) -> SplinterResult<Self> {
        match code {
            1 => Ok(MessageType::Insert),
            2 => Ok(MessageType::Update),
            3 => Ok(MessageType::Delete),
            _ => Err(SplinterError::InvalidMessageType { code }),
        }
    }
}

/// A typed payload as seen by merge callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageType,
    pub data: Vec<u8>,
}

impl Message {
    pub fn insert(data: impl Into<Vec<u8>>) -> Self {
        Self { kind: MessageType::Insert, data: data.into() }
    }

    pub fn update(data: impl Into<Vec<u8>>) -> Self {
        Self { kind: MessageType::Update, data: data.into() }
    }

    pub fn delete() -> Self {
        Self { kind: MessageType::Delete, data: Vec::new() }
    }

    pub fn is_update(&self) -> bool {
        self.kind == MessageType::Update
    }
}

/// User-defined key semantics.
///
/// All functions are associated (no `self`) because the engine calls them
/// from its own threads with nothing but the key bytes. Every method has a
/// default, so `impl DataFuncs for MyFuncs {}` yields byte-order keys with
/// last-writer-wins updates.
pub trait DataFuncs: 'static {
    /// Total order over keys. Must be consistent for the lifetime of a database.
    fn key_compare(a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    fn key_hash(key: &[u8], seed: u32) -> u32 {
        crc32c::crc32c_append(seed, key)
    }

    /// Fold `older` into the newer `Update` message `newer`.
    ///
    /// `older` is an insert or an update, never a delete: an update landing on
    /// a deleted key has nothing to fold into and goes to `merge_final`
    /// instead. Returning an `Update` keeps the result open for further
    /// merging with yet older messages.
    fn merge(key: &[u8], older: &Message, newer: Message) -> SplinterResult<Message> {
        let _ = (key, older);
        Ok(Message::insert(newer.data))
    }

    /// Resolve an `Update` that has no older message left to merge with.
    fn merge_final(key: &[u8], oldest: Message) -> SplinterResult<Message> {
        let _ = key;
        Ok(Message::insert(oldest.data))
    }

    fn key_to_string(key: &[u8]) -> String {
        to_hex(key)
    }

    fn message_to_string(msg: &Message) -> String {
        format!("{:?}:{}", msg.kind, to_hex(&msg.data))
    }
}

/// Lexicographic keys, CRC32C hashing, updates overwrite.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDataFuncs;

impl DataFuncs for DefaultDataFuncs {}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Apply `newer` on top of `older` the way the engine does: inserts and
/// deletes shadow everything below them, updates are merged.
pub(crate) fn apply<D: DataFuncs>(
    key: &[u8],
    older: Option<&Message>,
    newer: Message,
) -> SplinterResult<Option<Message>> {
    match newer.kind {
        MessageType::Insert => Ok(Some(newer)),
        MessageType::Delete => Ok(None),
        MessageType::Update => match older {
            Some(older) => merge_update::<D>(key, older, newer).map(Some),
            None => Ok(Some(newer)),
        },
    }
}

/// Merge an `Update` onto an older message. A delete ends the chain, so the
/// update is resolved on its own.
pub(crate) fn merge_update<D: DataFuncs>(
    key: &[u8],
    older: &Message,
    newer: Message,
) -> SplinterResult<Message> {
    match older.kind {
        MessageType::Delete => D::merge_final(key, newer),
        _ => D::merge(key, older, newer),
    }
}

/// Turn a stored message into the value a reader sees.
pub(crate) fn resolve<D: DataFuncs>(key: &[u8], msg: &Message) -> SplinterResult<Option<Vec<u8>>> {
    let msg = if msg.is_update() {
        D::merge_final(key, msg.clone())?
    } else {
        msg.clone()
    };
    match msg.kind {
        MessageType::Insert => Ok(Some(msg.data)),
        MessageType::Delete => Ok(None),
        MessageType::Update => Err(SplinterError::Merge {
            reason: format!("merge_final left key {} unresolved", D::key_to_string(key)),
        }),
    }
}
