//! Access chain construction.
//!
//! ```text
//! network locator  ──► MemoryCache(DiskCache?(Retrying(Network)))
//! registered prefix ─► factory(locator)
//! anything else    ──► LocalAccess
//! ```
//!
//! Caching sits above retry so transient failures are retried before they
//! can be cached. The memory cache sits above the disk cache so repeat reads
//! hit memory, then disk, then the network. Headless runs skip the disk
//! cache to avoid state leaking between test runs.

use std::sync::Arc;

use crate::access::{
    BoxedAccess, DiskCacheAccess, LocalAccess, MemoryCacheAccess, NetworkAccess, RangeTransport,
    RetryingAccess,
};
use crate::config::Config;
use crate::locator::Locator;
use crate::registry::FactoryRegistry;

/// Builds the access chain for a locator.
///
/// Borrowed from the session's registry, config and transport; cheap to
/// create and `Sync`, so one builder can serve parallel identification.
#[derive(Clone, Copy)]
pub struct ChainBuilder<'a> {
    registry: &'a FactoryRegistry,
    config: &'a Config,
    transport: Option<&'a Arc<dyn RangeTransport>>,
}

impl<'a> ChainBuilder<'a> {
    /// Create a builder over the given session parts.
    pub fn new(
        registry: &'a FactoryRegistry,
        config: &'a Config,
        transport: Option<&'a Arc<dyn RangeTransport>>,
    ) -> Self {
        Self {
            registry,
            config,
            transport,
        }
    }

    /// Construct the outermost layer for `locator`.
    ///
    /// Every call builds a fresh, independent chain.
    pub fn construct(&self, locator: &Locator) -> BoxedAccess {
        if locator.is_network() {
            return self.network_chain(locator);
        }

        if let Some((prefix, factory)) = self.registry.find(locator) {
            log::debug!("using factory for prefix {prefix:?} to open {locator}");
            return factory.construct(locator);
        }

        Box::new(LocalAccess::new(locator.clone()))
    }

    fn network_chain(&self, locator: &Locator) -> BoxedAccess {
        let base: BoxedAccess = Box::new(NetworkAccess::new(locator.clone(), self.transport.cloned()));
        let mut chain: BoxedAccess = Box::new(RetryingAccess::new(base, self.config.retry));
        if let Some(dir) = self.config.disk_cache_dir() {
            chain = Box::new(DiskCacheAccess::new(chain, Some(dir)));
        }
        Box::new(MemoryCacheAccess::new(chain, self.config.memory_cache))
    }
}
