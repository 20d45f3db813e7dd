//! Prefix-keyed access-layer factories.
//!
//! Hosts register factories for path prefixes they own (e.g. Android
//! `content://` URIs). The registry is owned by the [`Session`](crate::Session),
//! not a process global.

use crate::access::BoxedAccess;
use crate::locator::Locator;

/// Constructs the innermost layer for locators under a prefix.
///
/// Any `Fn(&Locator) -> BoxedAccess` closure is a factory.
pub trait LoaderFactory: Send + Sync {
    /// Build a layer for `locator`.
    fn construct(&self, locator: &Locator) -> BoxedAccess;
}

impl<F> LoaderFactory for F
where
    F: Fn(&Locator) -> BoxedAccess + Send + Sync,
{
    fn construct(&self, locator: &Locator) -> BoxedAccess {
        self(locator)
    }
}

/// Ordered prefix → factory map.
///
/// Lookup scans in registration order and the first matching prefix wins.
/// Re-registering a prefix replaces its factory in place.
#[derive(Default)]
pub struct FactoryRegistry {
    entries: Vec<(String, Box<dyn LoaderFactory>)>,
}

impl FactoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for locators starting with `prefix`.
    pub fn register(&mut self, prefix: impl Into<String>, factory: impl LoaderFactory + 'static) {
        let prefix = prefix.into();
        let factory: Box<dyn LoaderFactory> = Box::new(factory);
        match self.entries.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = factory,
            None => self.entries.push((prefix, factory)),
        }
    }

    /// Find the factory responsible for `locator`.
    pub fn find(&self, locator: &Locator) -> Option<(&str, &dyn LoaderFactory)> {
        self.entries
            .iter()
            .find(|(prefix, _)| locator.starts_with(prefix))
            .map(|(prefix, factory)| (prefix.as_str(), factory.as_ref()))
    }

    /// Number of registered prefixes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over registered prefixes in lookup order.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }
}
