//! Network access over a host-supplied range transport.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use super::{AccessLayer, ErrorSlot};
use crate::locator::Locator;

/// Failure reported by a [`RangeTransport`].
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The server answered with an unexpected status.
    #[error("HTTP status {status} for {url}")]
    Status {
        /// Status code returned by the server.
        status: u16,
        /// Requested address.
        url: String,
    },

    /// The request could not be completed.
    #[error("transport failure: {0}")]
    Failed(String),
}

/// HTTP-style ranged reads, implemented by the host.
///
/// # Example
///
/// ```ignore
/// struct Http(reqwest::blocking::Client);
///
/// impl RangeTransport for Http {
///     fn content_length(&self, url: &str) -> Result<Option<u64>, TransportError> { /* HEAD */ }
///     fn read_range(&self, url: &str, offset: u64, len: usize) -> Result<Vec<u8>, TransportError> {
///         /* GET with `Range: bytes=offset-(offset+len-1)` */
///     }
/// }
/// ```
pub trait RangeTransport: Send + Sync {
    /// Total size of the resource; `Ok(None)` when the resource is missing.
    fn content_length(&self, url: &str) -> Result<Option<u64>, TransportError>;

    /// Fetch `len` bytes starting at `offset`. May return fewer bytes.
    fn read_range(&self, url: &str, offset: u64, len: usize) -> Result<Vec<u8>, TransportError>;
}

/// Innermost layer of a network chain.
///
/// The remote size is asked for lazily. Only a known size is remembered;
/// a missing resource or a failed request is asked again next time.
pub struct NetworkAccess {
    locator: Locator,
    transport: Option<Arc<dyn RangeTransport>>,
    known_size: Mutex<Option<u64>>,
    error: ErrorSlot,
}

impl NetworkAccess {
    /// Create a layer reading `locator` through `transport`.
    ///
    /// Without a transport the layer never exists and says why.
    pub fn new(locator: Locator, transport: Option<Arc<dyn RangeTransport>>) -> Self {
        let error = ErrorSlot::default();
        if transport.is_none() {
            error.set(format!("no network transport configured for {locator}"));
        }
        Self {
            locator,
            transport,
            known_size: Mutex::new(None),
            error,
        }
    }

    fn remote_size(&self) -> Option<u64> {
        if let Some(size) = *self.known_size.lock() {
            return Some(size);
        }
        let transport = self.transport.as_ref()?;
        match transport.content_length(self.locator.as_str()) {
            Ok(Some(size)) => {
                *self.known_size.lock() = Some(size);
                Some(size)
            }
            Ok(None) => None,
            Err(e) => {
                self.error.set(e.to_string());
                None
            }
        }
    }
}

impl AccessLayer for NetworkAccess {
    fn exists(&self) -> bool {
        self.remote_size().is_some()
    }

    fn is_directory(&self) -> bool {
        false
    }

    fn size(&self) -> u64 {
        self.remote_size().unwrap_or(0)
    }

    fn read_at(&self, offset: u64, len: usize) -> Vec<u8> {
        let Some(transport) = &self.transport else {
            return Vec::new();
        };
        let size = self.size();
        if offset >= size || len == 0 {
            return Vec::new();
        }
        let len = len.min((size - offset) as usize);
        match transport.read_range(self.locator.as_str(), offset, len) {
            Ok(mut data) => {
                data.truncate(len);
                data
            }
            Err(e) => {
                self.error.set(e.to_string());
                Vec::new()
            }
        }
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
}
