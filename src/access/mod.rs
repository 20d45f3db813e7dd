//! Random-access byte sources over candidate game images.
//!
//! Every source implements [`AccessLayer`]. Resilience features are
//! decorators that own exactly one inner layer:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Network Access Chain                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  MemoryCacheAccess          (outermost, held by the caller) │
//! │   └─► DiskCacheAccess       (skipped when headless)         │
//! │        └─► RetryingAccess                                   │
//! │             └─► NetworkAccess ──► RangeTransport            │
//! │                                                             │
//! │  Local paths: LocalAccess (or a registered factory)         │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Read contract
//!
//! `read_at` returns the bytes actually available. It never returns more
//! than requested and returns an empty buffer at or beyond the end of the
//! source. Callers treat a short read as a low-confidence signal, not an
//! error; the cause of a failed read is available from `latest_error`.

mod disk_cache;
mod io;
mod local;
mod memory_cache;
mod network;
mod retry;

pub use disk_cache::DiskCacheAccess;
pub use local::LocalAccess;
pub use memory_cache::MemoryCacheAccess;
pub use network::{NetworkAccess, RangeTransport, TransportError};
pub use retry::RetryingAccess;

#[cfg(test)]
pub(crate) use network::testing as transport_testing;

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::locator::Locator;

/// Owning handle to the outermost layer of a chain.
pub type BoxedAccess = Box<dyn AccessLayer>;

/// A uniform random-access byte source.
///
/// Implementations must tolerate concurrent `read_at` calls: the emulated
/// machine reads disc sectors independently of the control thread.
pub trait AccessLayer: Send + Sync {
    /// Whether the underlying file or directory exists.
    fn exists(&self) -> bool;

    /// Whether the target is a directory.
    fn is_directory(&self) -> bool;

    /// Total size in bytes, `0` when unknown or missing.
    fn size(&self) -> u64;

    /// Read up to `len` bytes starting at `offset`.
    fn read_at(&self, offset: u64, len: usize) -> Vec<u8>;

    /// The locator this layer reads from.
    fn locator(&self) -> &Locator;

    /// Description of the most recent I/O failure, if any.
    fn latest_error(&self) -> Option<String>;

    /// Number of I/O failures recorded so far.
    ///
    /// Comparing the count before and after a call tells whether that call
    /// failed, independent of older failures still held by `latest_error`.
    fn error_count(&self) -> u64 {
        0
    }

    /// Whether a directory target has an entry named `name`.
    ///
    /// Layers that cannot list their target answer `false`.
    fn has_child(&self, _name: &str) -> bool {
        false
    }
}

impl<T: AccessLayer + ?Sized> AccessLayer for Box<T> {
    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn is_directory(&self) -> bool {
        (**self).is_directory()
    }

    fn size(&self) -> u64 {
        (**self).size()
    }

    fn read_at(&self, offset: u64, len: usize) -> Vec<u8> {
        (**self).read_at(offset, len)
    }

    fn locator(&self) -> &Locator {
        (**self).locator()
    }

    fn latest_error(&self) -> Option<String> {
        (**self).latest_error()
    }

    fn error_count(&self) -> u64 {
        (**self).error_count()
    }

    fn has_child(&self, name: &str) -> bool {
        (**self).has_child(name)
    }
}

/// Read exactly `N` bytes, or `None` on a short read.
pub fn read_array<const N: usize>(layer: &dyn AccessLayer, offset: u64) -> Option<[u8; N]> {
    layer.read_at(offset, N).try_into().ok()
}

/// Best-effort little-endian `u32` read; a short read yields `0`.
pub fn read_u32_le(layer: &dyn AccessLayer, offset: u64) -> u32 {
    read_array::<4>(layer, offset).map_or(0, u32::from_le_bytes)
}

// =============================================================================
// Error Slot
// =============================================================================

/// Last-error storage shared by layer implementations.
///
/// Every `set` bumps a counter, so callers can tell a fresh failure from a
/// stale message.
#[derive(Default)]
pub(crate) struct ErrorSlot {
    latest: Mutex<Option<String>>,
    count: AtomicU64,
}

impl ErrorSlot {
    pub(crate) fn set(&self, message: impl Into<String>) {
        *self.latest.lock() = Some(message.into());
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn get(&self) -> Option<String> {
        self.latest.lock().clone()
    }

    pub(crate) fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory layer for unit tests.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Byte-vector layer that counts reads and can fail on demand.
    pub struct FakeAccess {
        pub locator: Locator,
        pub data: Vec<u8>,
        pub directory: bool,
        /// Entry names reported by `has_child` when `directory` is set.
        pub children: Vec<String>,
        pub missing: bool,
        /// Number of upcoming `read_at` calls that return nothing.
        pub failures: AtomicUsize,
        pub reads: AtomicUsize,
        pub error: ErrorSlot,
    }

    impl FakeAccess {
        pub fn new(path: &str, data: impl Into<Vec<u8>>) -> Self {
            Self {
                locator: Locator::parse(path),
                data: data.into(),
                directory: false,
                children: Vec::new(),
                missing: false,
                failures: AtomicUsize::new(0),
                reads: AtomicUsize::new(0),
                error: ErrorSlot::default(),
            }
        }

        pub fn dir(path: &str, children: &[&str]) -> Self {
            let mut layer = Self::new(path, Vec::new());
            layer.directory = true;
            layer.children = children.iter().map(|c| c.to_string()).collect();
            layer
        }

        pub fn failing(self, count: usize) -> Self {
            self.failures.store(count, Ordering::SeqCst);
            self
        }

        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl AccessLayer for FakeAccess {
        fn exists(&self) -> bool {
            !self.missing
        }

        fn is_directory(&self) -> bool {
            self.directory
        }

        fn size(&self) -> u64 {
            self.data.len() as u64
        }

        fn read_at(&self, offset: u64, len: usize) -> Vec<u8> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let failed = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                self.error.set("simulated read failure");
                return Vec::new();
            }
            let start = (offset as usize).min(self.data.len());
            let end = start.saturating_add(len).min(self.data.len());
            self.data[start..end].to_vec()
        }

        fn locator(&self) -> &Locator {
            &self.locator
        }

        fn latest_error(&self) -> Option<String> {
            self.error.get()
        }

        fn error_count(&self) -> u64 {
            self.error.count()
        }

        fn has_child(&self, name: &str) -> bool {
            self.directory && self.children.iter().any(|c| c == name)
        }
    }
}
