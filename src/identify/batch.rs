//! Parallel identification of many locators.
//!
//! Used by game browsers that classify a whole directory listing at once.
//! Each locator gets its own independent chain, so a slow network source
//! only holds up its own worker.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use super::{GameImageKind, identify};
use crate::chain::ChainBuilder;
use crate::diagnostic::IdentifyError;
use crate::locator::Locator;

/// Identify every locator in parallel.
///
/// Returns results in the same order as `locators`.
pub fn identify_all(
    chain: &ChainBuilder<'_>,
    locators: &[Locator],
) -> Vec<Result<GameImageKind, IdentifyError>> {
    identify_all_each(chain, locators, |_, _| {})
}

/// Like [`identify_all`], invoking `on_each` as every locator finishes.
///
/// The callback sees the locator and the number completed so far, which is
/// enough for a progress indicator.
pub fn identify_all_each<F>(
    chain: &ChainBuilder<'_>,
    locators: &[Locator],
    on_each: F,
) -> Vec<Result<GameImageKind, IdentifyError>>
where
    F: Fn(&Locator, usize) + Sync,
{
    if locators.is_empty() {
        return vec![];
    }

    let done = AtomicUsize::new(0);
    locators
        .par_iter()
        .map(|locator| {
            let layer = chain.construct(locator);
            let result = identify(layer.as_ref());
            on_each(locator, done.fetch_add(1, Ordering::Relaxed) + 1);
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::config::ConfigBuilder;
    use crate::registry::FactoryRegistry;
    use tempfile::TempDir;

    #[test]
    fn test_identify_all_keeps_order() {
        let dir = TempDir::new().unwrap();
        let iso = dir.path().join("game.iso");
        let zip = dir.path().join("game.zip");
        let elf = dir.path().join("boot.elf");
        fs::write(&iso, vec![0u8; 2048]).unwrap();
        fs::write(&zip, b"PK\x03\x04").unwrap();
        fs::write(&elf, b"\x7FELF").unwrap();

        let config = ConfigBuilder::new().headless(true).build().unwrap();
        let registry = FactoryRegistry::new();
        let chain = ChainBuilder::new(&registry, &config, None);
        let locators: Vec<_> = [&iso, &zip, &elf]
            .iter()
            .map(|p| Locator::local(p.to_string_lossy()))
            .chain([Locator::local(dir.path().join("missing.iso").to_string_lossy())])
            .collect();

        let counted = AtomicUsize::new(0);
        let results = identify_all_each(&chain, &locators, |_, _| {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(results[0], Ok(GameImageKind::DiscImage));
        assert_eq!(results[1], Ok(GameImageKind::ZipArchive));
        assert_eq!(results[2], Ok(GameImageKind::Executable));
        assert!(matches!(results[3], Err(IdentifyError::NotFound { .. })));
        assert_eq!(counted.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_identify_all_empty() {
        let config = ConfigBuilder::new().headless(true).build().unwrap();
        let registry = FactoryRegistry::new();
        let chain = ChainBuilder::new(&registry, &config, None);
        assert!(identify_all(&chain, &[]).is_empty());
    }
}
