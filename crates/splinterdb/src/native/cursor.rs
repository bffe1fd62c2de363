//! Bidirectional cursor over a native iterator.

use std::fmt;
use std::marker::PhantomData;
use std::ptr;

use splinterdb_sys as sys;

use crate::error::{check_rc, SplinterResult};
use crate::store::{CursorEntry, KvCursor};

use super::callbacks::{create_slice, slice_bytes};
use super::db::SplinterDb;

/// Cursor borrowing a `SplinterDb`. The iterator is released on drop.
///
/// Key and value slices point into engine memory owned by the iterator and
/// stay valid until the cursor moves, which the `&self` borrow on
/// `current()` enforces.
pub struct SplinterCursor<'db> {
    iter: *mut sys::splinterdb_iterator,
    current: Option<(sys::slice, sys::slice)>,
    _db: PhantomData<&'db SplinterDb>,
}

impl<'db> SplinterCursor<'db> {
    pub(crate) fn open(db: &'db SplinterDb, start: Option<&[u8]>) -> SplinterResult<Self> {
        let start = start.map_or_else(sys::slice::null, create_slice);
        let mut iter: *mut sys::splinterdb_iterator = ptr::null_mut();
        let rc = unsafe { sys::splinterdb_iterator_init(db.raw(), &mut iter, start) };
        check_rc("splinterdb_iterator_init", rc)?;

        let mut cursor = Self {
            iter,
            current: None,
            _db: PhantomData,
        };
        cursor.refresh()?;
        Ok(cursor)
    }

    fn status(&self) -> SplinterResult<()> {
        check_rc("splinterdb_iterator_status", unsafe {
            sys::splinterdb_iterator_status(self.iter)
        })
    }

    /// Re-read the entry under the iterator.
    fn refresh(&mut self) -> SplinterResult<()> {
        if !unsafe { sys::splinterdb_iterator_valid(self.iter) } {
            self.current = None;
            return self.status();
        }
        let mut key = sys::slice::null();
        let mut value = sys::slice::null();
        unsafe { sys::splinterdb_iterator_get_current(self.iter, &mut key, &mut value) };
        self.current = Some((key, value));
        Ok(())
    }
}

impl KvCursor for SplinterCursor<'_> {
    fn current(&self) -> Option<CursorEntry<'_>> {
        self.current.map(|(key, value)| {
            // SAFETY: both slices were produced by the iterator and remain
            // valid until it moves, which requires `&mut self`.
            unsafe {
                CursorEntry {
                    key: slice_bytes(key),
                    value: slice_bytes(value),
                }
            }
        })
    }

    fn next(&mut self) -> SplinterResult<bool> {
        if !unsafe { sys::splinterdb_iterator_can_next(self.iter) } {
            self.status()?;
            return Ok(false);
        }
        unsafe { sys::splinterdb_iterator_next(self.iter) };
        self.refresh()?;
        Ok(self.current.is_some())
    }

    fn prev(&mut self) -> SplinterResult<bool> {
        if !unsafe { sys::splinterdb_iterator_can_prev(self.iter) } {
            self.status()?;
            return Ok(false);
        }
        unsafe { sys::splinterdb_iterator_prev(self.iter) };
        self.refresh()?;
        Ok(self.current.is_some())
    }
}

impl Drop for SplinterCursor<'_> {
    fn drop(&mut self) {
        if !self.iter.is_null() {
            unsafe { sys::splinterdb_iterator_deinit(self.iter) };
        }
    }
}

impl fmt::Debug for SplinterCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplinterCursor")
            .field("current", &self.current())
            .finish()
    }
}
