//! Boot pipeline.
//!
//! - [`Session`] - Per-instance context owning config, registry and host collaborators
//! - [`resolve_target`] - Game directory to `EBOOT.PBP` resolution
//! - [`Session::load_file`] - Dispatch an identified image to its loader
//! - [`Session::replace_disc`] - Swap the mounted disc at runtime

mod dispatch;
mod resolve;
mod session;
mod swap;

pub use resolve::{resolve_directory, resolve_file, resolve_target};
pub use session::{Session, SessionBuilder};
