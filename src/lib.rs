//! # psp-loader
//!
//! File access and game image identification for booting PSP software.
//!
//! Given a path or URL, the crate builds a layered access chain, decides what
//! the target is (UMD image, EBOOT container, executable, save data, archive,
//! ...) and hands it to the host's loader, or fails with a message the user
//! can act on:
//!
//! - **Access chains**: local files, registered prefixes (e.g. `content://`),
//!   and network sources wrapped in retry, disk cache and memory cache layers
//! - **Identification**: extension, directory layout and magic based sniffing
//!   that never fails on short reads
//! - **Boot dispatch**: one decision per identified kind, with game directory
//!   resolution to `EBOOT.PBP`
//! - **Disc swap**: best-effort replacement of the mounted disc
//!
//! ## Quick Start
//!
//! ```ignore
//! use psp_loader::prelude::*;
//!
//! let config = ConfigBuilder::new().headless(true).build()?;
//! let mut session = Session::builder(vfs, loader, mapper)
//!     .with_config(config)
//!     .build();
//!
//! let access = session.open(&Locator::parse("/games/demo.iso"));
//! session.load_file(access)?;
//! assert_eq!(session.core_state(), CoreState::Running);
//! ```
//!
//! ## Modules
//!
//! - [`access`]: Access layers and their decorators
//! - [`chain`]: Chain construction per locator
//! - [`identify`]: Game image identification
//! - [`process`]: Session, boot dispatch, disc swap
//! - [`host`]: Traits the emulator host implements
//! - [`diagnostic`]: Error types
//! - [`config`]: Runtime configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod access;
pub mod chain;
pub mod config;
pub mod diagnostic;
pub mod host;
pub mod identify;
pub mod locator;
pub mod prelude;
pub mod process;
pub mod registry;

// =============================================================================
// Boot pipeline
// =============================================================================

pub use process::{Session, SessionBuilder, resolve_directory, resolve_file, resolve_target};

// =============================================================================
// Identification
// =============================================================================

pub use identify::{GameImageKind, identify};

#[cfg(feature = "batch")]
pub use identify::identify_all;

// =============================================================================
// Diagnostics
// =============================================================================

pub use diagnostic::{BootError, IdentifyError, SwapError};

// =============================================================================
// Infrastructure
// =============================================================================

pub use access::{AccessLayer, BoxedAccess, RangeTransport, TransportError};
pub use chain::ChainBuilder;
pub use config::{Config, ConfigBuilder, ConfigError, MemoryCachePolicy, RetryPolicy};
pub use host::{CoreState, DiscMapper, GameLoader, VirtualFileSystem};
pub use locator::{Locator, Scheme};
pub use registry::{FactoryRegistry, LoaderFactory};
