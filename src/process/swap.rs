//! Disc replacement while a game is running.
//!
//! The swap is best effort: once the replacement is installed it stays
//! installed, even if remapping memory for it fails afterwards. The caller
//! must keep the emulated machine from reading the disc mount during the
//! swap.

use super::resolve::resolve_target;
use super::session::Session;
use crate::diagnostic::SwapError;
use crate::host::DISC_MOUNT;
use crate::identify::{GameImageKind, identify};
use crate::locator::Locator;

impl Session {
    /// Insert a different disc into the running game.
    pub fn replace_disc(&mut self, locator: &Locator) -> Result<(), SwapError> {
        let result = self.swap(locator);
        if let Err(e) = &result {
            log::error!("disc swap to {locator} failed: {e}");
        }
        result
    }

    fn swap(&mut self, locator: &Locator) -> Result<(), SwapError> {
        if !self.vfs.is_mounted(DISC_MOUNT) {
            return Err(SwapError::NoDisc);
        }

        let access = self.open(locator);
        if !access.exists() {
            return Err(SwapError::NotFound {
                path: locator.to_string(),
            });
        }
        let access = resolve_target(&self.chain(), access);
        let disc = self.active_disc.insert(access);

        match identify(&**disc) {
            Ok(kind) if kind.is_disc_image() => {
                if self.mapper.reinit(&**disc) {
                    log::info!("swapped disc to {}", disc.locator());
                    Ok(())
                } else {
                    Err(SwapError::ReinitFailed)
                }
            }
            Ok(kind) => Err(SwapError::Unsupported {
                kind: kind.name().to_owned(),
                diagnostic: kind_note(kind).to_owned(),
            }),
            Err(e) => Err(SwapError::Unsupported {
                kind: "identification error".to_owned(),
                diagnostic: e.to_string(),
            }),
        }
    }
}

fn kind_note(kind: GameImageKind) -> &'static str {
    match kind {
        GameImageKind::Mode2Disc => "ISO in Mode 2: Not a PSP game",
        _ => "",
    }
}
