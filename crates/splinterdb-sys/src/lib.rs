//! Raw bindings to the SplinterDB C API (`splinterdb/splinterdb.h`,
//! `splinterdb/data.h`).
//!
//! Declarations mirror the installed headers one-to-one. Nothing here is safe
//! to call directly; the `splinterdb` crate wraps these in owned handles.
//!
//! With the `verify-layout` feature the build script runs bindgen over the
//! installed headers and every struct below is checked against the generated
//! one at compile time: size, alignment and field offsets.

#![allow(non_camel_case_types)]

use libc::{c_char, c_int, c_void, size_t};

/// Largest key the engine accepts, in bytes.
pub const SPLINTERDB_MAX_KEY_SIZE: usize = 102;

/// Maximum number of threads that may be registered with one handle.
pub const MAX_THREADS: usize = 64;

/// Size of the opaque lookup result buffer (`6 * sizeof(void *)`).
pub const SPLINTERDB_LOOKUP_BUFSIZE: usize = 6 * std::mem::size_of::<*const c_void>();

/// `O_DIRECT` as the engine expects it in `io_flags` on Linux.
pub const O_DIRECT: c_int = 0x4000;

// message_type
pub type message_type = c_int;
pub const MESSAGE_TYPE_INVALID: message_type = 0;
pub const MESSAGE_TYPE_INSERT: message_type = 1;
pub const MESSAGE_TYPE_UPDATE: message_type = 2;
pub const MESSAGE_TYPE_DELETE: message_type = 3;
pub const MESSAGE_TYPE_MAX_VALID_USER_TYPE: message_type = 4;

/// Borrowed byte range. The engine never takes ownership of `data`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct slice {
    pub length: u64,
    pub data: *const c_void,
}

impl slice {
    pub const fn null() -> Self {
        Self {
            length: 0,
            data: std::ptr::null(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct message {
    pub type_: message_type,
    pub data: slice,
}

/// Engine-owned growable buffer handed to merge callbacks.
#[repr(C)]
pub struct merge_accumulator {
    _private: [u8; 0],
}

pub type key_compare_fn =
    Option<unsafe extern "C" fn(cfg: *const data_config, key1: slice, key2: slice) -> c_int>;

pub type key_hash_fn =
    Option<unsafe extern "C" fn(input: *const c_void, length: size_t, seed: u32) -> u32>;

pub type merge_tuple_fn = Option<
    unsafe extern "C" fn(
        cfg: *const data_config,
        key: slice,
        old_message: message,
        new_message: *mut merge_accumulator,
    ) -> c_int,
>;

pub type merge_tuple_final_fn = Option<
    unsafe extern "C" fn(
        cfg: *const data_config,
        key: slice,
        oldest_message: *mut merge_accumulator,
    ) -> c_int,
>;

pub type key_to_string_fn = Option<
    unsafe extern "C" fn(cfg: *const data_config, key: slice, str_: *mut c_char, max_len: size_t),
>;

pub type message_to_string_fn = Option<
    unsafe extern "C" fn(cfg: *const data_config, msg: message, str_: *mut c_char, max_len: size_t),
>;

/// User-supplied key ordering and merge behaviour.
#[repr(C)]
#[derive(Debug)]
pub struct data_config {
    pub max_key_size: u64,
    pub key_compare: key_compare_fn,
    pub key_hash: key_hash_fn,
    pub merge_tuples: merge_tuple_fn,
    pub merge_tuples_final: merge_tuple_final_fn,
    pub key_to_string: key_to_string_fn,
    pub message_to_string: message_to_string_fn,
}

/// Configuration passed to `splinterdb_create` / `splinterdb_open`.
///
/// Zero-initialised fields fall back to the engine's defaults.
#[repr(C)]
#[derive(Debug)]
pub struct splinterdb_config {
    pub filename: *const c_char,
    pub cache_size: u64,
    pub disk_size: u64,
    pub data_cfg: *mut data_config,
    pub use_shmem: bool,
    pub shmem_size: size_t,
    pub page_size: u64,
    pub extent_size: u64,
    pub io_flags: c_int,
    pub io_perms: u32,
    pub io_async_queue_depth: u64,
    pub cache_use_stats: bool,
    pub cache_logfile: *const c_char,
    pub num_memtable_bg_threads: u64,
    pub num_normal_bg_threads: u64,
    pub btree_rough_count_height: u64,
    pub filter_remainder_size: u64,
    pub filter_index_size: u64,
    pub use_log: bool,
    pub memtable_capacity: u64,
    pub fanout: u64,
    pub max_branches_per_node: u64,
    pub use_stats: u64,
    pub reclaim_threshold: u64,
    pub queue_scale_percent: u64,
}

#[repr(C)]
pub struct splinterdb {
    _private: [u8; 0],
}

#[repr(C)]
pub struct splinterdb_iterator {
    _private: [u8; 0],
}

#[repr(C, align(8))]
pub struct splinterdb_lookup_result {
    pub opaque: [c_char; SPLINTERDB_LOOKUP_BUFSIZE],
}

extern "C" {
    pub fn default_data_config_init(max_key_size: u64, out_cfg: *mut data_config);

    pub fn splinterdb_create(cfg: *const splinterdb_config, kvs: *mut *mut splinterdb) -> c_int;
    pub fn splinterdb_open(cfg: *const splinterdb_config, kvs: *mut *mut splinterdb) -> c_int;
    pub fn splinterdb_close(kvs: *mut *mut splinterdb);

    pub fn splinterdb_register_thread(kvs: *mut splinterdb);
    pub fn splinterdb_deregister_thread(kvs: *mut splinterdb);

    pub fn splinterdb_insert(kvs: *const splinterdb, key: slice, value: slice) -> c_int;
    pub fn splinterdb_update(kvs: *const splinterdb, key: slice, delta: slice) -> c_int;
    pub fn splinterdb_delete(kvs: *const splinterdb, key: slice) -> c_int;

    pub fn splinterdb_lookup_result_init(
        kvs: *const splinterdb,
        result: *mut splinterdb_lookup_result,
        buffer_len: u64,
        buffer: *mut c_char,
    );
    pub fn splinterdb_lookup_result_deinit(result: *mut splinterdb_lookup_result);
    pub fn splinterdb_lookup_found(result: *const splinterdb_lookup_result) -> bool;
    pub fn splinterdb_lookup_result_value(
        result: *const splinterdb_lookup_result,
        value: *mut slice,
    ) -> c_int;
    pub fn splinterdb_lookup(
        kvs: *const splinterdb,
        key: slice,
        result: *mut splinterdb_lookup_result,
    ) -> c_int;

    pub fn splinterdb_iterator_init(
        kvs: *const splinterdb,
        iter: *mut *mut splinterdb_iterator,
        start_key: slice,
    ) -> c_int;
    pub fn splinterdb_iterator_deinit(iter: *mut splinterdb_iterator);
    pub fn splinterdb_iterator_valid(iter: *mut splinterdb_iterator) -> bool;
    pub fn splinterdb_iterator_can_prev(iter: *mut splinterdb_iterator) -> bool;
    pub fn splinterdb_iterator_can_next(iter: *mut splinterdb_iterator) -> bool;
    pub fn splinterdb_iterator_next(iter: *mut splinterdb_iterator);
    pub fn splinterdb_iterator_prev(iter: *mut splinterdb_iterator);
    pub fn splinterdb_iterator_status(iter: *const splinterdb_iterator) -> c_int;
    pub fn splinterdb_iterator_get_current(
        iter: *mut splinterdb_iterator,
        key: *mut slice,
        value: *mut slice,
    );

    pub fn merge_accumulator_message_class(ma: *const merge_accumulator) -> message_type;
    pub fn merge_accumulator_to_slice(ma: *const merge_accumulator) -> slice;
    pub fn merge_accumulator_copy_message(ma: *mut merge_accumulator, msg: message) -> bool;
    pub fn merge_accumulator_resize(ma: *mut merge_accumulator, newsize: u64) -> bool;
    pub fn merge_accumulator_set_class(ma: *mut merge_accumulator, type_: message_type);
    pub fn merge_accumulator_data(ma: *const merge_accumulator) -> *mut c_void;
}

#[cfg(splinterdb_layout)]
mod layout {
    mod generated {
        #![allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code)]
        include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
    }

    use std::mem::{align_of, offset_of, size_of};

    macro_rules! assert_same_layout {
        ($ty:ident { $($field:ident),* $(,)? }) => {
            const _: () = {
                assert!(size_of::<super::$ty>() == size_of::<generated::$ty>());
                assert!(align_of::<super::$ty>() == align_of::<generated::$ty>());
                $(
                    assert!(
                        offset_of!(super::$ty, $field) == offset_of!(generated::$ty, $field)
                    );
                )*
            };
        };
    }

    assert_same_layout!(slice { length, data });
    assert_same_layout!(message { type_, data });
    assert_same_layout!(data_config {
        max_key_size,
        key_compare,
        key_hash,
        merge_tuples,
        merge_tuples_final,
        key_to_string,
        message_to_string,
    });
    // Fields the bindings write; the size check covers the rest
    assert_same_layout!(splinterdb_config {
        filename,
        cache_size,
        disk_size,
        data_cfg,
        io_flags,
        num_memtable_bg_threads,
        num_normal_bg_threads,
    });
    assert_same_layout!(splinterdb_lookup_result { opaque });

    #[test]
    fn test_config_matches_header() {
        assert_eq!(
            size_of::<super::splinterdb_config>(),
            size_of::<generated::splinterdb_config>()
        );
    }
}
