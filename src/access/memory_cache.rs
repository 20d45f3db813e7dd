//! In-memory block cache decorator.
//!
//! # Caching Strategy
//!
//! ```text
//! MemoryCacheAccess
//! └── RwLock<FxHashMap<block index, CachedBlock>>
//!     └── CachedBlock
//!         ├── data: Arc<[u8]>       (immutable once inserted)
//!         └── last_used: AtomicU64  (generation stamp for eviction)
//! ```
//!
//! Hits only take the read lock. Misses fetch from the inner layer with no
//! lock held and insert afterwards, so a slow fetch never blocks reads of
//! other blocks. Two threads missing the same block may both fetch it; the
//! first insert wins and both return complete data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{AccessLayer, BoxedAccess};
use crate::config::MemoryCachePolicy;
use crate::locator::Locator;

struct CachedBlock {
    data: Arc<[u8]>,
    last_used: AtomicU64,
}

/// Keeps recently read blocks of the wrapped layer in memory.
pub struct MemoryCacheAccess {
    inner: BoxedAccess,
    block_size: u64,
    max_blocks: usize,
    blocks: RwLock<FxHashMap<u64, CachedBlock>>,
    generation: AtomicU64,
    size: OnceLock<u64>,
}

impl MemoryCacheAccess {
    /// Wrap `inner`, taking ownership of it.
    pub fn new(inner: BoxedAccess, policy: MemoryCachePolicy) -> Self {
        Self {
            inner,
            block_size: policy.block_size.max(1) as u64,
            max_blocks: policy.max_blocks.max(1),
            blocks: RwLock::new(FxHashMap::default()),
            generation: AtomicU64::new(0),
            size: OnceLock::new(),
        }
    }

    /// Number of blocks currently held.
    pub fn cached_blocks(&self) -> usize {
        self.blocks.read().len()
    }

    #[inline]
    fn tick(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn block(&self, index: u64, total: u64) -> Option<Arc<[u8]>> {
        if let Some(block) = self.blocks.read().get(&index) {
            block.last_used.store(self.tick(), Ordering::Relaxed);
            return Some(block.data.clone());
        }

        let start = index * self.block_size;
        let expected = self.block_size.min(total - start) as usize;
        let data = self.inner.read_at(start, expected);
        if data.is_empty() {
            return None;
        }
        let data: Arc<[u8]> = data.into();
        if data.len() < expected {
            // Partial fetch: hand it out, but let the next read try again.
            return Some(data);
        }

        log::debug!("memory cache miss: {} block {index}", self.inner.locator());
        let mut blocks = self.blocks.write();
        if !blocks.contains_key(&index) && blocks.len() >= self.max_blocks {
            evict_oldest(&mut blocks);
        }
        let stamp = self.tick();
        let entry = blocks.entry(index).or_insert_with(|| CachedBlock {
            data,
            last_used: AtomicU64::new(stamp),
        });
        Some(entry.data.clone())
    }
}

fn evict_oldest(blocks: &mut FxHashMap<u64, CachedBlock>) {
    let oldest = blocks
        .iter()
        .min_by_key(|(_, block)| block.last_used.load(Ordering::Relaxed))
        .map(|(index, _)| *index);
    if let Some(index) = oldest {
        blocks.remove(&index);
    }
}

impl AccessLayer for MemoryCacheAccess {
    fn exists(&self) -> bool {
        self.inner.exists()
    }

    fn is_directory(&self) -> bool {
        self.inner.is_directory()
    }

    fn size(&self) -> u64 {
        *self.size.get_or_init(|| self.inner.size())
    }

    fn read_at(&self, offset: u64, len: usize) -> Vec<u8> {
        let total = self.size();
        if offset >= total || len == 0 {
            return Vec::new();
        }
        let end = offset.saturating_add(len as u64).min(total);
        let first = offset / self.block_size;
        let last = (end - 1) / self.block_size;

        // Huge reads would only churn the cache.
        if (last - first) as usize >= self.max_blocks {
            return self.inner.read_at(offset, (end - offset) as usize);
        }

        let mut out = Vec::with_capacity((end - offset) as usize);
        for index in first..=last {
            let Some(block) = self.block(index, total) else {
                break;
            };
            let block_start = index * self.block_size;
            let from = (offset.max(block_start) - block_start) as usize;
            let to = ((end - block_start) as usize).min(block.len());
            if from >= to {
                break;
            }
            out.extend_from_slice(&block[from..to]);
            if block.len() < self.block_size.min(total - block_start) as usize {
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
