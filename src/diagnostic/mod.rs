//! User-facing failure diagnostics.
//!
//! Identification failures are [`IdentifyError`]. Boot failures are
//! [`BootError`] and are terminal for the attempt. Disc swaps report
//! [`SwapError`]. Archive detections are ordinary, recoverable outcomes: the
//! message names the tool that can extract them.

mod error;

pub use error::{BootError, IdentifyError, SwapError};
