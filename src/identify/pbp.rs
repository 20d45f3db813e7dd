//! Minimal PBP container reader.
//!
//! A PBP starts with a fixed header followed by eight sub-files laid out
//! back to back:
//!
//! ```text
//! 0x00  "\0PBP"
//! 0x04  version
//! 0x08  offset[0] PARAM.SFO
//! 0x0C  offset[1] ICON0.PNG
//!  ...
//! 0x24  offset[7] DATA.PSAR
//! ```
//!
//! Sub-file `i` spans `offset[i]..offset[i + 1]`, the last one runs to the
//! end of the file. Offsets come from untrusted input, so every span is
//! checked against the file size and a ceiling before anything is read.

use crate::access::{read_array, AccessLayer};

const HEADER_LEN: usize = 0x28;

/// Largest sub-file extracted during identification.
const MAX_SUB_FILE: u64 = 1024 * 1024;

/// Sub-files of a PBP container, in header order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum PbpSubFile {
    /// Metadata key/value block.
    ParamSfo = 0,
    /// Icon image.
    Icon0,
    /// Animated icon.
    Icon1,
    /// Overlay image.
    Pic0,
    /// Background image.
    Pic1,
    /// Background audio.
    Snd0,
    /// Executable.
    DataPsp,
    /// Data archive.
    DataPsar,
}

/// Parsed PBP header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbpHeader {
    version: u32,
    offsets: [u32; 8],
}

impl PbpHeader {
    /// Read and validate the header, `None` if absent or malformed.
    pub fn read(layer: &dyn AccessLayer) -> Option<Self> {
        let raw: [u8; HEADER_LEN] = read_array(layer, 0)?;
        if raw[..4] != *b"\0PBP" {
            return None;
        }
        let word = |at: usize| u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        let mut offsets = [0u32; 8];
        for (i, offset) in offsets.iter_mut().enumerate() {
            *offset = word(8 + i * 4);
        }
        Some(Self {
            version: word(4),
            offsets,
        })
    }

    /// Container format version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Byte range of a sub-file, if the header describes a sane one.
    pub fn span(&self, which: PbpSubFile, file_size: u64) -> Option<(u64, u64)> {
        let index = which as usize;
        let start = u64::from(self.offsets[index]);
        let end = match self.offsets.get(index + 1) {
            Some(&next) => u64::from(next),
            None => file_size,
        };
        (start >= HEADER_LEN as u64 && start <= end && end <= file_size).then_some((start, end))
    }

    /// Extract a sub-file in full, `None` on bad offsets or a short read.
    pub fn sub_file(&self, layer: &dyn AccessLayer, which: PbpSubFile) -> Option<Vec<u8>> {
        let (start, end) = self.span(which, layer.size())?;
        let len = end - start;
        if len == 0 || len > MAX_SUB_FILE {
            return None;
        }
        let data = layer.read_at(start, len as usize);
        (data.len() as u64 == len).then_some(data)
    }
}
