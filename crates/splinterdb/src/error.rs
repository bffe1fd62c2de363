//! Error types for SplinterDB operations
//!
//! Every failure surfaced by the bindings is a `SplinterError`. Errors coming
//! out of the native engine keep the name of the call that produced them so a
//! bare errno is never the only clue.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// SplinterDB error types with detailed context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplinterError {
    /// I/O operation failed
    Io {
        /// The file path where the error occurred
        path: Option<PathBuf>,
        /// The underlying I/O error kind
        kind: std::io::ErrorKind,
        /// Human-readable description
        message: String,
    },

    /// The native engine returned a nonzero status code
    Engine {
        /// Name of the C call that failed
        op: &'static str,
        /// errno-style return code
        code: i32,
    },

    /// Configuration rejected before reaching the engine
    InvalidConfig {
        /// Which constraint was violated
        reason: String,
    },

    /// Entry size exceeds maximum allowed
    OversizedEntry {
        /// Size of the oversized entry
        entry_size: u64,
        /// Maximum allowed size
        max_size: u64,
        /// Whether it's the key or value that's oversized
        component: &'static str,
    },

    /// Zero-length keys are reserved by the engine
    EmptyKey,

    /// The calling thread has not been registered with this handle
    ThreadNotRegistered,

    /// The engine's per-handle thread table is full
    TooManyThreads {
        /// Maximum number of concurrently registered threads
        limit: usize,
    },

    /// A user merge callback refused to combine two messages
    Merge {
        /// Description supplied by the callback
        reason: String,
    },

    /// A message carried a type code outside insert/update/delete
    InvalidMessageType {
        /// The raw code
        code: i32,
    },

    /// Database path cannot be passed to C (not UTF-8 or contains NUL)
    InvalidPath {
        /// The offending path
        path: PathBuf,
    },
}

impl fmt::Display for SplinterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplinterError::Io { path, kind, message } => {
                if let Some(path) = path {
                    write!(f, "I/O error in {}: {} ({})", path.display(), message, kind)
                } else {
                    write!(f, "I/O error: {} ({})", message, kind)
                }
            }

            SplinterError::Engine { op, code } => {
                write!(f, "{} failed with code {}: {}",
                       op, code, std::io::Error::from_raw_os_error(*code))
            }

            SplinterError::InvalidConfig { reason } => {
                write!(f, "Invalid configuration: {}", reason)
            }

            SplinterError::OversizedEntry { entry_size, max_size, component } => {
                write!(f, "Entry {} too large: {} bytes exceeds limit of {} bytes",
                       component, entry_size, max_size)
            }

            SplinterError::EmptyKey => write!(f, "Keys must be at least one byte long"),

            SplinterError::ThreadNotRegistered => {
                write!(f, "Calling thread is not registered with this database")
            }

            SplinterError::TooManyThreads { limit } => {
                write!(f, "Cannot register thread: limit of {} threads reached", limit)
            }

            SplinterError::Merge { reason } => write!(f, "Merge failed: {}", reason),

            SplinterError::InvalidMessageType { code } => {
                write!(f, "Invalid message type code {}", code)
            }

            SplinterError::InvalidPath { path } => {
                write!(f, "Path {} cannot be passed to the engine", path.display())
            }
        }
    }
}

impl Error for SplinterError {}

/// Convert std::io::Error to SplinterError::Io
impl From<std::io::Error> for SplinterError {
    fn from(err: std::io::Error) -> Self {
        SplinterError::Io {
            path: None,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for SplinterDB operations
pub type SplinterResult<T> = Result<T, SplinterError>;

/// Map a C return code to a result. Zero means success.
#[cfg_attr(not(feature = "native"), allow(dead_code))]
pub(crate) fn check_rc(op: &'static str, rc: i32) -> SplinterResult<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(SplinterError::Engine { op, code: rc })
    }
}
