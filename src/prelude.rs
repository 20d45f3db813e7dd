//! Prelude module for convenient imports.
//!
//! ```ignore
//! use psp_loader::prelude::*;
//! ```

// Session & boot
pub use crate::process::{Session, SessionBuilder, resolve_directory, resolve_file, resolve_target};

// Identification
pub use crate::identify::{GameImageKind, ParamSfo, PbpHeader, PbpSubFile, SfoValue, identify};
#[cfg(feature = "batch")]
pub use crate::identify::{identify_all, identify_all_each};

// Diagnostics
pub use crate::diagnostic::{BootError, IdentifyError, SwapError};

// Access
pub use crate::access::{
    AccessLayer, BoxedAccess, DiskCacheAccess, LocalAccess, MemoryCacheAccess, NetworkAccess,
    RangeTransport, RetryingAccess, TransportError,
};
pub use crate::chain::ChainBuilder;
pub use crate::locator::{EBOOT_FILENAME, Locator, Scheme};
pub use crate::registry::{FactoryRegistry, LoaderFactory};

// Host
pub use crate::host::{CoreState, DiscMapper, GameLoader, VirtualFileSystem};

// Config
pub use crate::config::{Config, ConfigBuilder, ConfigError, MemoryCachePolicy, RetryPolicy};
