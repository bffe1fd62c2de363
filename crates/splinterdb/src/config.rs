//! Database configuration
//!
//! Provides sizing presets and builder-style setters. Values are checked by
//! `validate()` before a handle is created, so the engine never sees a
//! configuration it would assert on.

/// Largest key the engine accepts, in bytes.
pub const MAX_KEY_SIZE: usize = 102;

/// Upper bound accepted for `max_value_size`.
pub const MAX_VALUE_SIZE_LIMIT: usize = 128 * 1024 * 1024;

const MIB: usize = 1024 * 1024;
const GIB: usize = 1024 * MIB;

/// SplinterDB handle configuration
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Page cache size (bytes)
    pub cache_size_bytes: usize,
    /// Size of the backing device or file (bytes)
    pub disk_size_bytes: usize,
    /// Maximum key size in bytes
    pub max_key_size: usize,
    /// Maximum value size in bytes
    pub max_value_size: usize,
    /// Background threads dedicated to memtable flushes
    pub num_memtable_bg_threads: usize,
    /// Background threads for compaction and other maintenance
    pub num_normal_bg_threads: usize,
    /// Open the backing file with `O_DIRECT`
    pub direct_io: bool,
}

impl DbConfig {
    /// Small footprint for tests and local tools: 64MB cache, 1GB disk
    pub fn testing() -> Self {
        Self {
            cache_size_bytes: 64 * MIB,
            disk_size_bytes: GIB,
            max_key_size: 32,
            max_value_size: MIB,
            num_memtable_bg_threads: 2,
            num_normal_bg_threads: 2,
            direct_io: true,
        }
    }

    /// Server-class: 1GB cache, 64GB disk
    pub fn server() -> Self {
        Self {
            cache_size_bytes: GIB,
            disk_size_bytes: 64 * GIB,
            max_key_size: MAX_KEY_SIZE,
            max_value_size: 32 * MIB,
            num_memtable_bg_threads: 4,
            num_normal_bg_threads: 8,
            direct_io: true,
        }
    }

    pub fn with_cache_size(mut self, bytes: usize) -> Self {
        self.cache_size_bytes = bytes;
        self
    }

    pub fn with_disk_size(mut self, bytes: usize) -> Self {
        self.disk_size_bytes = bytes;
        self
    }

    pub fn with_max_key_size(mut self, bytes: usize) -> Self {
        self.max_key_size = bytes;
        self
    }

    pub fn with_max_value_size(mut self, bytes: usize) -> Self {
        self.max_value_size = bytes;
        self
    }

    pub fn with_bg_threads(mut self, memtable: usize, normal: usize) -> Self {
        self.num_memtable_bg_threads = memtable;
        self.num_normal_bg_threads = normal;
        self
    }

    /// Some filesystems (tmpfs, overlayfs) reject `O_DIRECT`.
    pub fn with_direct_io(mut self, enabled: bool) -> Self {
        self.direct_io = enabled;
        self
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_size_bytes == 0 {
            return Err("cache_size_bytes must be > 0".into());
        }
        if self.disk_size_bytes <= self.cache_size_bytes {
            return Err("disk_size_bytes must be > cache_size_bytes".into());
        }
        if self.max_key_size == 0 || self.max_key_size > MAX_KEY_SIZE {
            return Err(format!("max_key_size must be in [1, {}]", MAX_KEY_SIZE));
        }
        if self.max_value_size == 0 || self.max_value_size > MAX_VALUE_SIZE_LIMIT {
            return Err("max_value_size must be in [1, 128MB]".into());
        }
        if self.num_memtable_bg_threads == 0 || self.num_normal_bg_threads == 0 {
            return Err("background thread counts must be > 0".into());
        }
        Ok(())
    }
}

impl Default for DbConfig {
    fn default() -> Self { Self::testing() }
}
