//! Resolution between game directories and their `EBOOT.PBP`.

use crate::access::BoxedAccess;
use crate::chain::ChainBuilder;
use crate::identify::{GameImageKind, identify};
use crate::locator::{EBOOT_FILENAME, Locator};

/// The directory of an `EBOOT.PBP`, or `locator` unchanged.
pub fn resolve_directory(locator: &Locator) -> Locator {
    if locator.filename() == EBOOT_FILENAME {
        locator.parent()
    } else {
        locator.clone()
    }
}

/// The `EBOOT.PBP` inside a directory, or `locator` unchanged if it already is one.
pub fn resolve_file(locator: &Locator) -> Locator {
    if locator.filename() == EBOOT_FILENAME {
        locator.clone()
    } else {
        locator.join(EBOOT_FILENAME)
    }
}

/// Swap a game-directory layer for one over its `EBOOT.PBP`.
///
/// Any other layer is returned as is. The old layer is dropped before the
/// new chain is built.
pub fn resolve_target(chain: &ChainBuilder<'_>, access: BoxedAccess) -> BoxedAccess {
    if identify(access.as_ref()) != Ok(GameImageKind::ContainerInDirectory) {
        return access;
    }
    let eboot = resolve_file(access.locator());
    if &eboot == access.locator() {
        return access;
    }
    drop(access);
    log::debug!("resolved game directory to {eboot}");
    chain.construct(&eboot)
}
