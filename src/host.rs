//! Collaborators supplied by the emulator host.
//!
//! The boot pipeline decides *what* to load. These traits do the loading
//! and own the emulated machine's state.

use std::fmt;

use crate::access::{AccessLayer, BoxedAccess};

/// Mount point of the game disc.
pub const DISC_MOUNT: &str = "disc0:";

/// Starting directory of every disc boot.
pub const DISC_START_DIR: &str = "disc0:/PSP_GAME/USRDIR";

/// Memory-stick root used to build starting directories of installed games.
pub const MEMSTICK_ROOT: &str = "ms0:/";

/// Boot state of the emulated machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoreState {
    /// Nothing loaded yet.
    #[default]
    Uninitialized,
    /// A boot attempt is in progress.
    Booting,
    /// A delegated loader accepted the image.
    Running,
    /// The last boot attempt failed. Terminal until the next attempt.
    BootError,
}

impl fmt::Display for CoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Booting => "booting",
            Self::Running => "running",
            Self::BootError => "boot error",
        })
    }
}

/// The emulated filesystem, as far as booting needs it.
pub trait VirtualFileSystem: Send {
    /// Set the working directory the game starts in.
    fn set_starting_directory(&mut self, dir: &str);

    /// Whether something is mounted at `mount` (e.g. [`DISC_MOUNT`]).
    fn is_mounted(&self, mount: &str) -> bool;
}

/// Loaders that take over once a kind has been accepted.
///
/// Each method receives exclusive ownership of the layer. An `Err` carries
/// the loader's own diagnostic.
pub trait GameLoader: Send {
    /// Boot a disc image or disc directory.
    fn load_disc_image(&mut self, access: BoxedAccess) -> Result<(), String>;

    /// Boot an executable or a PBP container.
    fn load_executable(&mut self, access: BoxedAccess) -> Result<(), String>;

    /// Replay a recorded graphics trace.
    fn load_trace_dump(&mut self, access: BoxedAccess) -> Result<(), String>;
}

/// Maps disc contents into emulated memory.
pub trait DiscMapper: Send {
    /// Re-initialize memory for a newly inserted disc.
    fn reinit(&mut self, disc: &dyn AccessLayer) -> bool;
}
