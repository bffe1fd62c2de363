//! Owned handle to a native SplinterDB instance.

use std::ffi::CString;
use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};
use std::ptr;

use splinterdb_sys as sys;
use tracing::{debug, info};

use crate::config::DbConfig;
use crate::data::DataFuncs;
use crate::error::{check_rc, SplinterError, SplinterResult};
use crate::registry::ThreadRegistry;
use crate::store::{self, KvStore, LookupResult};

use super::callbacks::{create_slice, new_data_config, slice_bytes};
use super::cursor::SplinterCursor;

/// A SplinterDB database backed by a file or block device.
///
/// The thread that creates or opens the handle is registered with the
/// engine. Every other thread must call `register_thread` (or hold a
/// `thread_guard`) before issuing operations, and deregister (or drop the
/// guard) before it exits; the engine has room for `MAX_THREADS` at once.
pub struct SplinterDb {
    inner: *mut sys::splinterdb,
    // The engine keeps pointers into these until close; boxed so the
    // addresses stay put when the handle moves.
    _sdb_cfg: Box<sys::splinterdb_config>,
    _data_cfg: Box<sys::data_config>,
    _filename: CString,
    registry: ThreadRegistry,
    config: DbConfig,
    path: PathBuf,
}

// SAFETY: the engine handle is internally synchronized; per-thread state is
// only touched by threads the registry has admitted.
unsafe impl Send for SplinterDb {}
unsafe impl Sync for SplinterDb {}

enum OpenMode {
    Create,
    Open,
}

fn path_to_cstring(path: &Path) -> SplinterResult<CString> {
    let invalid = || SplinterError::InvalidPath { path: path.to_path_buf() };
    let s = path.to_str().ok_or_else(invalid)?;
    CString::new(s).map_err(|_| invalid())
}

impl SplinterDb {
    /// Create a fresh database at `path`, formatting whatever is there.
    pub fn create<D: DataFuncs, P: AsRef<Path>>(path: P, config: &DbConfig) -> SplinterResult<Self> {
        Self::create_or_open::<D>(path.as_ref(), config, OpenMode::Create)
    }

    /// Open an existing database at `path`.
    ///
    /// `D` must order keys exactly as the `D` the database was created with.
    pub fn open<D: DataFuncs, P: AsRef<Path>>(path: P, config: &DbConfig) -> SplinterResult<Self> {
        Self::create_or_open::<D>(path.as_ref(), config, OpenMode::Open)
    }

    fn create_or_open<D: DataFuncs>(
        path: &Path,
        config: &DbConfig,
        mode: OpenMode,
    ) -> SplinterResult<Self> {
        config
            .validate()
            .map_err(|reason| SplinterError::InvalidConfig { reason })?;
        check_path(path, &mode)?;
        let filename = path_to_cstring(path)?;

        let mut data_cfg = Box::new(new_data_config::<D>(config.max_key_size));

        // SAFETY: every field is an integer, bool or raw pointer; all-zero is
        // the engine's "use the default" value for each of them.
        let mut sdb_cfg: Box<sys::splinterdb_config> = Box::new(unsafe { mem::zeroed() });
        sdb_cfg.filename = filename.as_ptr();
        sdb_cfg.cache_size = config.cache_size_bytes as u64;
        sdb_cfg.disk_size = config.disk_size_bytes as u64;
        sdb_cfg.data_cfg = &mut *data_cfg;
        sdb_cfg.num_memtable_bg_threads = config.num_memtable_bg_threads as u64;
        sdb_cfg.num_normal_bg_threads = config.num_normal_bg_threads as u64;
        if config.direct_io {
            sdb_cfg.io_flags |= sys::O_DIRECT;
        }

        let mut inner: *mut sys::splinterdb = ptr::null_mut();
        let (op, rc) = match mode {
            OpenMode::Create => ("splinterdb_create", unsafe {
                sys::splinterdb_create(&*sdb_cfg, &mut inner)
            }),
            OpenMode::Open => ("splinterdb_open", unsafe {
                sys::splinterdb_open(&*sdb_cfg, &mut inner)
            }),
        };
        check_rc(op, rc)?;

        info!(path = %path.display(), op, cache_size = config.cache_size_bytes, "splinterdb ready");

        Ok(Self {
            inner,
            _sdb_cfg: sdb_cfg,
            _data_cfg: data_cfg,
            _filename: filename,
            registry: ThreadRegistry::with_current(),
            config: config.clone(),
            path: path.to_path_buf(),
        })
    }

    /// Get the database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn raw(&self) -> *mut sys::splinterdb {
        self.inner
    }

    /// Copy the value out of an initialised lookup result.
    ///
    /// # Safety
    /// `result` must have been initialised against `self.inner`.
    unsafe fn lookup_into(
        &self,
        key: &[u8],
        result: &mut sys::splinterdb_lookup_result,
    ) -> SplinterResult<LookupResult> {
        check_rc("splinterdb_lookup", sys::splinterdb_lookup(self.inner, create_slice(key), result))?;
        if !sys::splinterdb_lookup_found(result) {
            return Ok(LookupResult::NotFound);
        }
        let mut value = sys::slice::null();
        check_rc(
            "splinterdb_lookup_result_value",
            sys::splinterdb_lookup_result_value(result, &mut value),
        )?;
        Ok(LookupResult::Found(slice_bytes(value).to_vec()))
    }
}

fn check_path(path: &Path, mode: &OpenMode) -> SplinterResult<()> {
    let (target, message) = match mode {
        OpenMode::Create => (
            path.parent().filter(|p| !p.as_os_str().is_empty()),
            "parent directory does not exist",
        ),
        OpenMode::Open => (Some(path), "database file does not exist"),
    };
    match target {
        Some(target) if !target.exists() => Err(SplinterError::Io {
            path: Some(target.to_path_buf()),
            kind: std::io::ErrorKind::NotFound,
            message: message.into(),
        }),
        _ => Ok(()),
    }
}

impl Drop for SplinterDb {
    fn drop(&mut self) {
        if !self.inner.is_null() {
            // SAFETY: `inner` came from create/open and is closed exactly once.
            unsafe { sys::splinterdb_close(&mut self.inner) };
            debug!(path = %self.path.display(), "splinterdb closed");
        }
    }
}

impl fmt::Debug for SplinterDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplinterDb")
            .field("path", &self.path)
            .field("threads", &self.registry.len())
            .finish()
    }
}

impl KvStore for SplinterDb {
    type Cursor<'a> = SplinterCursor<'a>;

    fn insert(&self, key: &[u8], value: &[u8]) -> SplinterResult<()> {
        self.registry.ensure_current()?;
        store::check_entry(&self.config, key, Some(value))?;
        let rc = unsafe { sys::splinterdb_insert(self.inner, create_slice(key), create_slice(value)) };
        check_rc("splinterdb_insert", rc)
    }

    fn update(&self, key: &[u8], delta: &[u8]) -> SplinterResult<()> {
        self.registry.ensure_current()?;
        store::check_entry(&self.config, key, Some(delta))?;
        let rc = unsafe { sys::splinterdb_update(self.inner, create_slice(key), create_slice(delta)) };
        check_rc("splinterdb_update", rc)
    }

    fn delete(&self, key: &[u8]) -> SplinterResult<()> {
        self.registry.ensure_current()?;
        store::check_key(&self.config, key)?;
        let rc = unsafe { sys::splinterdb_delete(self.inner, create_slice(key)) };
        check_rc("splinterdb_delete", rc)
    }

    fn lookup(&self, key: &[u8]) -> SplinterResult<LookupResult> {
        self.registry.ensure_current()?;
        store::check_key(&self.config, key)?;

        // SAFETY: the result is an opaque buffer; init gives it a heap
        // buffer that deinit releases on every path below.
        unsafe {
            let mut result: sys::splinterdb_lookup_result = mem::zeroed();
            sys::splinterdb_lookup_result_init(self.inner, &mut result, 0, ptr::null_mut());
            let found = self.lookup_into(key, &mut result);
            sys::splinterdb_lookup_result_deinit(&mut result);
            found
        }
    }

    fn range(&self, start: Option<&[u8]>) -> SplinterResult<SplinterCursor<'_>> {
        self.registry.ensure_current()?;
        let start = start.filter(|k| !k.is_empty());
        if let Some(start) = start {
            store::check_key(&self.config, start)?;
        }
        SplinterCursor::open(self, start)
    }

    fn register_thread(&self) -> SplinterResult<bool> {
        let registered = self.registry.register_current()?;
        if registered {
            unsafe { sys::splinterdb_register_thread(self.inner) };
            debug!(threads = self.registry.len(), "registered thread");
        }
        Ok(registered)
    }

    fn deregister_thread(&self) {
        if self.registry.deregister_current() {
            unsafe { sys::splinterdb_deregister_thread(self.inner) };
            debug!(threads = self.registry.len(), "deregistered thread");
        }
    }

    fn config(&self) -> &DbConfig {
        &self.config
    }
}
