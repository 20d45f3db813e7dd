//! Bounded-backoff retry decorator.

use std::thread;

use crate::config::RetryPolicy;
use crate::locator::Locator;

use super::{AccessLayer, BoxedAccess};

/// Retries short reads and failed existence checks of the wrapped layer.
///
/// Retry state lives on the stack of each call, so concurrent and
/// unrelated calls never share attempt counters. After the last attempt the
/// partial result is returned and the cause stays visible through
/// [`AccessLayer::latest_error`].
pub struct RetryingAccess {
    inner: BoxedAccess,
    policy: RetryPolicy,
}

impl RetryingAccess {
    /// Wrap `inner`, taking ownership of it.
    pub fn new(inner: BoxedAccess, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    fn backoff(&self, attempt: u32) {
        let delay = self.policy.delay_for(attempt);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    /// Repeat `check` while it comes back empty because of a failure that
    /// happened during that very attempt.
    fn recheck<T>(&self, check: impl Fn(&dyn AccessLayer) -> Option<T>) -> Option<T> {
        for attempt in 0..self.policy.max_attempts {
            let failures = self.inner.error_count();
            if let Some(found) = check(self.inner.as_ref()) {
                return Some(found);
            }
            // A definite "not found" needs no retry; only I/O trouble does.
            if self.inner.error_count() == failures {
                return None;
            }
            if attempt + 1 < self.policy.max_attempts {
                self.backoff(attempt);
            }
        }
        None
    }
}

impl AccessLayer for RetryingAccess {
    fn exists(&self) -> bool {
        self.recheck(|layer| layer.exists().then_some(())).is_some()
    }

    fn is_directory(&self) -> bool {
        self.inner.is_directory()
    }

    fn size(&self) -> u64 {
        self.recheck(|layer| Some(layer.size()).filter(|&size| size > 0))
            .unwrap_or(0)
    }

    fn read_at(&self, offset: u64, len: usize) -> Vec<u8> {
        let size = self.size();
        let mut data = Vec::new();
        for attempt in 0..self.policy.max_attempts {
            let pos = offset + data.len() as u64;
            if data.len() >= len || pos >= size {
                break;
            }
            let chunk = self.inner.read_at(pos, len - data.len());
            let progressed = !chunk.is_empty();
            data.extend_from_slice(&chunk);

            let complete = data.len() >= len || offset + data.len() as u64 >= size;
            if complete {
                break;
            }
            if attempt + 1 < self.policy.max_attempts {
                if !progressed {
                    self.backoff(attempt);
                }
            } else {
                log::warn!(
                    "giving up on {} at offset {pos} after {} attempts",
                    self.inner.locator(),
                    self.policy.max_attempts
                );
            }
        }
        data.truncate(len);
        data
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
