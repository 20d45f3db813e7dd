//! Persistent block cache decorator.
//!
//! Blocks fetched from the wrapped layer are written into a sparse data
//! file keyed by the locator, with a small JSON sidecar listing which blocks
//! are present:
//!
//! ```text
//! <cache dir>/
//! ├── 3f2a…e1.blocks   sparse copy of the source, block-aligned
//! └── 3f2a…e1.json     { "locator", "size", "block_size", "blocks": [..] }
//! ```
//!
//! The sidecar is only trusted when locator, size and block size all match,
//! otherwise the entry starts over. Any cache I/O failure degrades to reading
//! the inner layer directly.
//!
//! Chains open at the same time over the same locator share one in-process
//! store, so a block marked present is never overwritten by another chain.
//! The data file is never truncated; blocks absent from the index are
//! simply refetched.

use std::fs::{self, File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use serde_json::{json, Value};

use super::{io, AccessLayer, BoxedAccess};
use crate::locator::Locator;

/// Granularity of the on-disk cache.
pub const DISK_BLOCK_SIZE: u64 = 64 * 1024;

/// Live stores by data file path.
static OPEN_STORES: LazyLock<Mutex<FxHashMap<PathBuf, Weak<BlockStore>>>> =
    LazyLock::new(Default::default);

struct BlockStore {
    data: File,
    locator: Locator,
    index_path: PathBuf,
    size: u64,
    present: RwLock<FxHashSet<u64>>,
    dirty: AtomicBool,
}

/// Caches the wrapped layer's blocks on disk across sessions.
pub struct DiskCacheAccess {
    inner: BoxedAccess,
    store: Option<Arc<BlockStore>>,
}

impl DiskCacheAccess {
    /// Wrap `inner`, storing blocks under `cache_dir`.
    ///
    /// With no directory, or when the entry cannot be opened, the layer
    /// passes reads straight through.
    pub fn new(inner: BoxedAccess, cache_dir: Option<&Path>) -> Self {
        let store = cache_dir.and_then(|dir| match BlockStore::open(dir, inner.as_ref()) {
            Ok(store) => store,
            Err(e) => {
                log::warn!("disk cache disabled for {}: {e}", inner.locator());
                None
            }
        });
        Self { inner, store }
    }

    /// Whether reads are being persisted.
    pub fn is_caching(&self) -> bool {
        self.store.is_some()
    }

    /// Write the block index to disk now instead of on drop.
    pub fn flush(&self) -> std::io::Result<()> {
        match &self.store {
            Some(store) => store.save_index(),
            None => Ok(()),
        }
    }

    fn block(&self, store: &BlockStore, index: u64) -> Vec<u8> {
        let start = index * DISK_BLOCK_SIZE;
        let expected = DISK_BLOCK_SIZE.min(store.size - start) as usize;

        if store.present.read().contains(&index) {
            match io::read_at(&store.data, start, expected) {
                Ok(data) if data.len() == expected => return data,
                Ok(_) | Err(_) => {
                    log::warn!("disk cache block {index} unreadable, refetching");
                    store.present.write().remove(&index);
                }
            }
        }

        let data = self.inner.read_at(start, expected);
        if data.len() == expected {
            match io::write_all_at(&store.data, &data, start) {
                Ok(()) => {
                    store.present.write().insert(index);
                    store.dirty.store(true, Ordering::Release);
                }
                Err(e) => log::warn!("disk cache write failed: {e}"),
            }
        }
        data
    }
}

impl BlockStore {
    fn open(dir: &Path, inner: &dyn AccessLayer) -> std::io::Result<Option<Arc<Self>>> {
        if !inner.exists() || inner.is_directory() {
            return Ok(None);
        }
        let size = inner.size();
        if size == 0 {
            return Ok(None);
        }

        let key = cache_key(inner.locator());
        let data_path = dir.join(format!("{key}.blocks"));
        let index_path = dir.join(format!("{key}.json"));

        let mut stores = OPEN_STORES.lock();
        stores.retain(|_, store| store.strong_count() > 0);
        if let Some(store) = stores.get(&data_path).and_then(Weak::upgrade) {
            if store.size == size {
                return Ok(Some(store));
            }
            // Another chain still reads the old contents from this file.
            log::debug!("disk cache for {} busy with a different size", inner.locator());
            return Ok(None);
        }

        fs::create_dir_all(dir)?;
        let present = load_index(&index_path, inner.locator(), size).unwrap_or_default();
        let data = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&data_path)?;

        log::debug!(
            "disk cache for {} at {} ({} blocks present)",
            inner.locator(),
            data_path.display(),
            present.len()
        );

        let store = Arc::new(Self {
            data,
            locator: inner.locator().clone(),
            index_path,
            size,
            present: RwLock::new(present),
            dirty: AtomicBool::new(false),
        });
        stores.insert(data_path, Arc::downgrade(&store));
        Ok(Some(store))
    }

    fn save_index(&self) -> std::io::Result<()> {
        let mut blocks: Vec<u64> = self.present.read().iter().copied().collect();
        blocks.sort_unstable();
        let index = json!({
            "locator": self.locator.as_str(),
            "size": self.size,
            "block_size": DISK_BLOCK_SIZE,
            "blocks": blocks,
        });
        fs::write(&self.index_path, index.to_string())?;
        self.dirty.store(false, Ordering::Release);
        Ok(())
    }
}

impl Drop for BlockStore {
    fn drop(&mut self) {
        if self.dirty.load(Ordering::Acquire)
            && let Err(e) = self.save_index()
        {
            log::warn!("failed to save disk cache index: {e}");
        }
    }
}

/// Stable file stem for a locator.
fn cache_key(locator: &Locator) -> String {
    let mut hasher = FxHasher::default();
    locator.as_str().hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn load_index(path: &Path, locator: &Locator, size: u64) -> Option<FxHashSet<u64>> {
    let raw = fs::read(path).ok()?;
    let index: Value = serde_json::from_slice(&raw).ok()?;
    let matches = index["locator"].as_str() == Some(locator.as_str())
        && index["size"].as_u64() == Some(size)
        && index["block_size"].as_u64() == Some(DISK_BLOCK_SIZE);
    if !matches {
        return None;
    }
    let last_block = (size - 1) / DISK_BLOCK_SIZE;
    Some(
        index["blocks"]
            .as_array()?
            .iter()
            .filter_map(Value::as_u64)
            .filter(|&b| b <= last_block)
            .collect(),
    )
}

impl AccessLayer for DiskCacheAccess {
    fn exists(&self) -> bool {
        self.inner.exists()
    }

    fn is_directory(&self) -> bool {
        self.inner.is_directory()
    }

    fn size(&self) -> u64 {
        match &self.store {
            Some(store) => store.size,
            None => self.inner.size(),
        }
    }

    fn read_at(&self, offset: u64, len: usize) -> Vec<u8> {
        let Some(store) = &self.store else {
            return self.inner.read_at(offset, len);
        };
        if offset >= store.size || len == 0 {
            return Vec::new();
        }
        let end = offset.saturating_add(len as u64).min(store.size);
        let mut out = Vec::with_capacity((end - offset) as usize);
        for index in offset / DISK_BLOCK_SIZE..=(end - 1) / DISK_BLOCK_SIZE {
            let block = self.block(store, index);
            let block_start = index * DISK_BLOCK_SIZE;
            let from = (offset.max(block_start) - block_start) as usize;
            let to = ((end - block_start) as usize).min(block.len());
            if from >= to {
                break;
            }
            out.extend_from_slice(&block[from..to]);
            if block.len() < DISK_BLOCK_SIZE.min(store.size - block_start) as usize {
                break;
            }
        }
        out
    }

    fn locator(&self) -> &Locator {
        self.inner.locator()
    }

    fn latest_error(&self) -> Option<String> {
        self.inner.latest_error()
    }

    fn error_count(&self) -> u64 {
        self.inner.error_count()
    }

    fn has_child(&self, name: &str) -> bool {
        self.inner.has_child(name)
    }
}
