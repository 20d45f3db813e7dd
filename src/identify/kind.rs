//! Classification of candidate game images.

use std::fmt;

/// What a file or directory turned out to be.
///
/// Identification failures are not a variant: they are the `Err` side of
/// [`identify`](super::identify).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameImageKind {
    /// PSP UMD image (`.iso` / `.cso`).
    DiscImage,
    /// PSN title packaged as a disc image inside a container.
    NpDiscImage,
    /// Raw 2352-byte-sector image of a non-PSP disc.
    Mode2Disc,
    /// Extracted disc layout (`PSP_GAME/` directory).
    DiscDirectory,
    /// Executable with a name or extension that makes it launchable.
    Executable,
    /// Executable magic without a launchable name.
    UnrecognizedExecutable,
    /// Loose `EBOOT.PBP`-style container.
    Container,
    /// Container inside a memory-card game directory, or that directory itself.
    ContainerInDirectory,
    /// PS1 game wrapped in a PSP container.
    Ps1Container,
    /// Emulator save state.
    SaveState,
    /// Directory holding game save data (`PARAM.SFO`).
    SaveDataDirectory,
    /// Directory with nothing recognizable in it.
    PlainDirectory,
    /// Recorded graphics command trace.
    TraceDump,
    /// ZIP archive.
    ZipArchive,
    /// RAR archive (including split volumes).
    RarArchive,
    /// 7-Zip archive.
    SevenZipArchive,
    /// `.bin` file with no recognizable content.
    UnknownBinary,
    /// Nothing matched.
    Unknown,
}

impl GameImageKind {
    /// Short human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::DiscImage => "PSP disc image",
            Self::NpDiscImage => "PSN disc image",
            Self::Mode2Disc => "Mode 2 disc image",
            Self::DiscDirectory => "disc directory",
            Self::Executable => "executable",
            Self::UnrecognizedExecutable => "unrecognized executable",
            Self::Container => "PBP container",
            Self::ContainerInDirectory => "PBP game directory",
            Self::Ps1Container => "PS1 PBP container",
            Self::SaveState => "save state",
            Self::SaveDataDirectory => "save data directory",
            Self::PlainDirectory => "directory",
            Self::TraceDump => "graphics trace dump",
            Self::ZipArchive => "ZIP archive",
            Self::RarArchive => "RAR archive",
            Self::SevenZipArchive => "7-Zip archive",
            Self::UnknownBinary => "unknown binary",
            Self::Unknown => "unknown",
        }
    }

    /// Kinds that can be mounted as the disc.
    pub fn is_disc_image(self) -> bool {
        matches!(self, Self::DiscImage | Self::NpDiscImage | Self::DiscDirectory)
    }

    /// Third-party archive formats that need an external extractor.
    pub fn is_archive(self) -> bool {
        matches!(self, Self::ZipArchive | Self::RarArchive | Self::SevenZipArchive)
    }
}

impl fmt::Display for GameImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
