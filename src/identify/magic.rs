//! Fixed byte signatures used during identification.

/// Raw CD sector size (sync + header + data + EDC/ECC).
pub const RAW_SECTOR_SIZE: u64 = 2352;

/// Sync pattern opening every raw Mode 2 sector.
pub const MODE2_SYNC: [u8; 12] = [
    0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00,
];

/// Header of a graphics trace dump.
pub const TRACE_DUMP_MAGIC: [u8; 8] = *b"PPSSPPGE";

/// Offset of the data-archive pointer in a PBP header.
pub const PSAR_OFFSET_FIELD: u64 = 0x24;

/// Data archive tag of PSN disc titles.
pub const NP_PSAR_TAG: [u8; 4] = *b"NPUM";

/// Data archive tag of PS1 titles (start of `PSISOIMG0000`).
pub const PS1_PSAR_TAG: [u8; 4] = *b"PSIS";

/// Path segment of installed games on the memory stick.
pub const GAME_DIR_MARKER: &str = "PSP/GAME/";

/// Category value PS1 containers carry in their metadata.
pub const PS1_CATEGORY: &str = "ME";

/// Leading four bytes of a file, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Magic {
    /// `PK` local header, end-of-directory or spanning marker.
    Zip,
    /// `Rar!`
    Rar,
    /// `\0PBP`
    Pbp,
    /// `\x7FELF`
    Elf,
    /// Anything else, or fewer than four bytes.
    None,
}

impl Magic {
    /// Classify the leading bytes of a file.
    pub fn classify(head: &[u8]) -> Self {
        match head {
            [b'P', b'K', 3, 4, ..] | [b'P', b'K', 5, 6, ..] | [b'P', b'K', 7, 8, ..] => Self::Zip,
            [b'R', b'a', b'r', b'!', ..] => Self::Rar,
            [0, b'P', b'B', b'P', ..] => Self::Pbp,
            [0x7F, b'E', b'L', b'F', ..] => Self::Elf,
            _ => Self::None,
        }
    }
}
