//! `extern "C"` trampolines that expose a `DataFuncs` implementation as an
//! engine `data_config`.
//!
//! The engine calls these from its own background threads. A panic must not
//! unwind into C, so every trampoline runs the user function under
//! `catch_unwind` and reports failure through the return value instead.

use std::panic::{self, AssertUnwindSafe};

use libc::{c_char, c_int, c_void, size_t};
use splinterdb_sys as sys;
use tracing::error;

use crate::data::{self, DataFuncs, Message, MessageType};
use crate::error::SplinterResult;

/// Build a `data_config` whose callbacks dispatch to `D`.
pub(crate) fn new_data_config<D: DataFuncs>(max_key_size: usize) -> sys::data_config {
    sys::data_config {
        max_key_size: max_key_size as u64,
        key_compare: Some(key_compare::<D>),
        key_hash: Some(key_hash::<D>),
        merge_tuples: Some(merge_tuples::<D>),
        merge_tuples_final: Some(merge_tuples_final::<D>),
        key_to_string: Some(key_to_string::<D>),
        message_to_string: Some(message_to_string::<D>),
    }
}

/// View an engine slice as bytes.
///
/// # Safety
/// `s` must describe `length` readable bytes that outlive `'a`.
pub(crate) unsafe fn slice_bytes<'a>(s: sys::slice) -> &'a [u8] {
    if s.length == 0 || s.data.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(s.data.cast::<u8>(), s.length as usize)
    }
}

pub(crate) fn create_slice(bytes: &[u8]) -> sys::slice {
    sys::slice {
        length: bytes.len() as u64,
        data: bytes.as_ptr().cast::<c_void>(),
    }
}

fn guarded<T>(callback: &'static str, fallback: T, f: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error!(callback, "data config callback panicked");
            fallback
        }
    }
}

unsafe fn message_from_raw(msg: sys::message) -> SplinterResult<Message> {
    Ok(Message {
        kind: MessageType::try_from(msg.type_)?,
        data: slice_bytes(msg.data).to_vec(),
    })
}

unsafe fn accumulator_message(ma: *const sys::merge_accumulator) -> SplinterResult<Message> {
    Ok(Message {
        kind: MessageType::try_from(sys::merge_accumulator_message_class(ma))?,
        data: slice_bytes(sys::merge_accumulator_to_slice(ma)).to_vec(),
    })
}

unsafe fn store_accumulator(ma: *mut sys::merge_accumulator, msg: &Message) -> bool {
    let raw = sys::message {
        type_: msg.kind.code(),
        data: create_slice(&msg.data),
    };
    sys::merge_accumulator_copy_message(ma, raw)
}

/// Write `text` into a C buffer of `max_len` bytes, truncating and
/// NUL-terminating.
unsafe fn write_c_string(text: &str, dst: *mut c_char, max_len: size_t) {
    if dst.is_null() || max_len == 0 {
        return;
    }
    let n = text.len().min(max_len - 1);
    std::ptr::copy_nonoverlapping(text.as_ptr().cast::<c_char>(), dst, n);
    *dst.add(n) = 0;
}

unsafe extern "C" fn key_compare<D: DataFuncs>(
    _cfg: *const sys::data_config,
    key1: sys::slice,
    key2: sys::slice,
) -> c_int {
    let (a, b) = (slice_bytes(key1), slice_bytes(key2));
    guarded("key_compare", 0, || D::key_compare(a, b) as c_int)
}

unsafe extern "C" fn key_hash<D: DataFuncs>(
    input: *const c_void,
    length: size_t,
    seed: u32,
) -> u32 {
    let key = slice_bytes(sys::slice { length: length as u64, data: input });
    guarded("key_hash", seed, || D::key_hash(key, seed))
}

unsafe extern "C" fn merge_tuples<D: DataFuncs>(
    _cfg: *const sys::data_config,
    key: sys::slice,
    old_message: sys::message,
    new_message: *mut sys::merge_accumulator,
) -> c_int {
    let key = slice_bytes(key);
    let merged = guarded("merge_tuples", None, || {
        let run = || -> SplinterResult<Message> {
            let older = message_from_raw(old_message)?;
            let newer = accumulator_message(new_message)?;
            data::merge_update::<D>(key, &older, newer)
        };
        Some(run())
    });
    match merged {
        Some(Ok(msg)) if store_accumulator(new_message, &msg) => 0,
        Some(Ok(_)) => {
            error!(key = %D::key_to_string(key), "merge result does not fit accumulator");
            -1
        }
        Some(Err(e)) => {
            error!(key = %D::key_to_string(key), error = %e, "merge_tuples failed");
            -1
        }
        None => -1,
    }
}

unsafe extern "C" fn merge_tuples_final<D: DataFuncs>(
    _cfg: *const sys::data_config,
    key: sys::slice,
    oldest_message: *mut sys::merge_accumulator,
) -> c_int {
    let key = slice_bytes(key);
    let resolved = guarded("merge_tuples_final", None, || {
        Some(accumulator_message(oldest_message).and_then(|oldest| D::merge_final(key, oldest)))
    });
    match resolved {
        Some(Ok(msg)) if store_accumulator(oldest_message, &msg) => 0,
        Some(Ok(_)) => {
            error!(key = %D::key_to_string(key), "final merge result does not fit accumulator");
            -1
        }
        Some(Err(e)) => {
            error!(key = %D::key_to_string(key), error = %e, "merge_tuples_final failed");
            -1
        }
        None => -1,
    }
}

unsafe extern "C" fn key_to_string<D: DataFuncs>(
    _cfg: *const sys::data_config,
    key: sys::slice,
    dst: *mut c_char,
    max_len: size_t,
) {
    let key = slice_bytes(key);
    let text = guarded("key_to_string", String::new(), || D::key_to_string(key));
    write_c_string(&text, dst, max_len);
}

unsafe extern "C" fn message_to_string<D: DataFuncs>(
    _cfg: *const sys::data_config,
    msg: sys::message,
    dst: *mut c_char,
    max_len: size_t,
) {
    let text = match message_from_raw(msg) {
        Ok(msg) => guarded("message_to_string", String::new(), || D::message_to_string(&msg)),
        Err(e) => e.to_string(),
    };
    write_c_string(&text, dst, max_len);
}
