//! Configuration for psp-loader.
//!
//! This module provides the runtime configuration read while building access
//! chains. Use [`ConfigBuilder`] at session start; the resulting [`Config`] is
//! owned by the [`Session`](crate::Session) rather than stored globally.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Error returned by [`ConfigBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A retry policy must allow at least one attempt.
    #[error("retry policy needs at least one attempt")]
    NoAttempts,

    /// The memory cache needs a positive block size and capacity.
    #[error("memory cache block size and capacity must be non-zero")]
    EmptyMemoryCache,
}

/// Bounded exponential backoff for [`RetryingAccess`](crate::access::RetryingAccess).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt + 1`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(800),
        }
    }
}

/// Sizing for [`MemoryCacheAccess`](crate::access::MemoryCacheAccess).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCachePolicy {
    /// Bytes per cached block.
    pub block_size: usize,
    /// Blocks kept before the least recently used one is evicted.
    pub max_blocks: usize,
}

impl Default for MemoryCachePolicy {
    fn default() -> Self {
        Self {
            block_size: 64 * 1024,
            max_blocks: 256,
        }
    }
}

/// Runtime configuration for psp-loader.
#[derive(Debug, Clone)]
pub struct Config {
    /// Headless/test run: network chains skip the disk cache.
    pub headless: bool,
    /// Where the disk cache keeps its blocks. `None` disables disk caching.
    pub disk_cache_dir: Option<PathBuf>,
    /// Retry behaviour for network reads.
    pub retry: RetryPolicy,
    /// Memory cache sizing for network reads.
    pub memory_cache: MemoryCachePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            headless: false,
            disk_cache_dir: default_cache_dir(),
            retry: RetryPolicy::default(),
            memory_cache: MemoryCachePolicy::default(),
        }
    }
}

impl Config {
    /// Directory for the disk cache, if disk caching applies to this run.
    pub fn disk_cache_dir(&self) -> Option<&Path> {
        if self.headless {
            None
        } else {
            self.disk_cache_dir.as_deref()
        }
    }
}

/// Platform cache directory, e.g. `~/.cache/psp-loader/http` on Linux.
fn default_cache_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "psp-loader", "psp-loader")
        .map(|dirs| dirs.cache_dir().join("http"))
}

/// Configuration builder for fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    headless: Option<bool>,
    disk_cache_dir: Option<Option<PathBuf>>,
    retry: Option<RetryPolicy>,
    memory_cache: Option<MemoryCachePolicy>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the run as headless (tests, batch tools).
    ///
    /// Default: `false`
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = Some(headless);
        self
    }

    /// Store the disk cache under `dir`.
    ///
    /// # Example
    ///
    /// ```
    /// use psp_loader::config::ConfigBuilder;
    ///
    /// let config = ConfigBuilder::new()
    ///     .disk_cache_dir("/tmp/psp-cache")
    ///     .build()
    ///     .unwrap();
    /// assert!(config.disk_cache_dir().is_some());
    /// ```
    pub fn disk_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.disk_cache_dir = Some(Some(dir.into()));
        self
    }

    /// Turn the disk cache off regardless of headless mode.
    pub fn no_disk_cache(mut self) -> Self {
        self.disk_cache_dir = Some(None);
        self
    }

    /// Override the retry policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Override the memory cache sizing.
    pub fn memory_cache(mut self, policy: MemoryCachePolicy) -> Self {
        self.memory_cache = Some(policy);
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let defaults = Config::default();
        let config = Config {
            headless: self.headless.unwrap_or(defaults.headless),
            disk_cache_dir: self.disk_cache_dir.unwrap_or(defaults.disk_cache_dir),
            retry: self.retry.unwrap_or(defaults.retry),
            memory_cache: self.memory_cache.unwrap_or(defaults.memory_cache),
        };
        if config.retry.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        if config.memory_cache.block_size == 0 || config.memory_cache.max_blocks == 0 {
            return Err(ConfigError::EmptyMemoryCache);
        }
        Ok(config)
    }
}
