//! Error types for identification, boot and disc replacement.

use thiserror::Error;

use crate::identify::GameImageKind;

/// Identification could not classify the target at all.
///
/// Every variant renders a non-empty message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifyError {
    /// The locator has no path.
    #[error("Invalid filename {path:?}")]
    InvalidPath {
        /// The offending path.
        path: String,
    },

    /// The target does not exist.
    #[error("File doesn't exist: {path}")]
    NotFound {
        /// The missing path.
        path: String,
    },

    /// The leading bytes could not be read.
    #[error("Failed to read identification bytes")]
    Read,
}

/// A boot attempt failed. Terminal for that attempt.
///
/// # Example
///
/// ```ignore
/// match session.load_file(access) {
///     Ok(()) => { /* delegated loader took over */ }
///     Err(BootError::Archive { tool, .. }) => eprintln!("extract it with {tool} first"),
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootError {
    /// A memory-card game directory held no usable `EBOOT.PBP`.
    #[error("No EBOOT.PBP, misidentified game")]
    MisidentifiedGame,

    /// PS1 titles wrapped in a PSP container.
    #[error("PS1 EBOOTs are not supported by this emulator.")]
    Ps1Unsupported,

    /// A third-party archive that must be extracted first.
    #[error("{format} file detected (Require {tool})")]
    Archive {
        /// Archive format name.
        format: &'static str,
        /// External tool that can extract it.
        tool: &'static str,
    },

    /// A raw disc image of some other console.
    #[error("PSX game image detected.")]
    NonPspDisc,

    /// A directory with nothing bootable in it.
    #[error("Just a directory.")]
    PlainDirectory,

    /// An emulator save state.
    #[error("This is a saved state, not a game.")]
    SaveState,

    /// A game's save data directory.
    #[error("This is save data, not a game.")]
    SaveData,

    /// Nothing recognizable.
    #[error("Unknown file type: {path}")]
    UnknownFileType {
        /// Path of the rejected file.
        path: String,
    },

    /// Identification itself failed.
    #[error("{}", join_diagnostics(.identify, .io_error.as_deref()))]
    Identify {
        /// What the sniffer reported.
        identify: IdentifyError,
        /// The layer's last I/O error, if any.
        io_error: Option<String>,
    },

    /// The delegated loader rejected the image.
    #[error("{message}")]
    Loader {
        /// Message from the loader.
        message: String,
    },
}

impl BootError {
    /// Archive failure naming the host's extraction tool, `None` for
    /// kinds that are not archives.
    pub(crate) fn archive(kind: GameImageKind) -> Option<Self> {
        let (format, tool) = match kind {
            GameImageKind::ZipArchive => ("ZIP", rar_tool()),
            GameImageKind::RarArchive => ("RAR", rar_tool()),
            GameImageKind::SevenZipArchive => ("7z", "7-Zip"),
            _ => return None,
        };
        Some(Self::Archive { format, tool })
    }
}

fn rar_tool() -> &'static str {
    if cfg!(windows) { "WINRAR" } else { "UnRAR" }
}

fn join_diagnostics(identify: &IdentifyError, io_error: Option<&str>) -> String {
    let parts: Vec<String> = [Some(identify.to_string()), io_error.map(str::to_owned)]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        "Error reading file".to_owned()
    } else {
        parts.join(": ")
    }
}

/// Swapping the mounted disc failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    /// Nothing is mounted at the disc mount point.
    #[error("has no disc")]
    NoDisc,

    /// The replacement does not exist.
    #[error("{path} doesn't exist")]
    NotFound {
        /// Path of the replacement.
        path: String,
    },

    /// The replacement is not a disc image.
    #[error("Unsupported file type: {kind} {diagnostic}")]
    Unsupported {
        /// What the replacement was identified as.
        kind: String,
        /// Sniffer diagnostic, possibly empty.
        diagnostic: String,
    },

    /// The disc mapper could not remap memory for the new disc.
    ///
    /// The new disc stays mounted.
    #[error("reinit memory failed")]
    ReinitFailed,
}
