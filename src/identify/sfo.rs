//! PARAM.SFO key/value reader.
//!
//! Layout: a 20-byte header (`"\0PSF"`, version, key table offset, data
//! table offset, entry count) followed by 16-byte index entries. Only the
//! lookups identification needs are implemented.

const HEADER_LEN: usize = 20;
const ENTRY_LEN: usize = 16;

const FMT_UTF8_SPECIAL: u16 = 0x0004;
const FMT_UTF8: u16 = 0x0204;
const FMT_INT32: u16 = 0x0404;

/// A value stored under a PARAM.SFO key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SfoValue {
    /// UTF-8 text with trailing NULs removed.
    Text(String),
    /// Little-endian 32-bit integer.
    Int(u32),
}

/// Borrowed view over a PARAM.SFO blob.
#[derive(Debug, Clone, Copy)]
pub struct ParamSfo<'a> {
    data: &'a [u8],
    key_table: usize,
    data_table: usize,
    count: usize,
}

impl<'a> ParamSfo<'a> {
    /// Validate the header, `None` if the blob is not a PARAM.SFO.
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        if data.len() < HEADER_LEN || data[..4] != *b"\0PSF" {
            return None;
        }
        let count = u32_at(data, 16)? as usize;
        // Entries that would not fit are dropped, not trusted.
        let count = count.min((data.len() - HEADER_LEN) / ENTRY_LEN);
        Some(Self {
            data,
            key_table: u32_at(data, 8)? as usize,
            data_table: u32_at(data, 12)? as usize,
            count,
        })
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<SfoValue> {
        (0..self.count).find_map(|i| {
            let entry = HEADER_LEN + i * ENTRY_LEN;
            let key_offset = u16_at(self.data, entry)? as usize;
            if self.key_at(self.key_table.checked_add(key_offset)?)? != key.as_bytes() {
                return None;
            }
            let format = u16_at(self.data, entry + 2)?;
            let len = u32_at(self.data, entry + 4)? as usize;
            let start = self.data_table.checked_add(u32_at(self.data, entry + 12)? as usize)?;
            let raw = self.data.get(start..start.checked_add(len)?)?;
            match format {
                FMT_UTF8 | FMT_UTF8_SPECIAL => {
                    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                    Some(SfoValue::Text(String::from_utf8_lossy(&raw[..end]).into_owned()))
                }
                FMT_INT32 => u32_at(raw, 0).map(SfoValue::Int),
                _ => None,
            }
        })
    }

    /// Look up a text value.
    pub fn get_text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            SfoValue::Text(text) => Some(text),
            SfoValue::Int(_) => None,
        }
    }

    /// Look up an integer value.
    pub fn get_int(&self, key: &str) -> Option<u32> {
        match self.get(key)? {
            SfoValue::Int(value) => Some(value),
            SfoValue::Text(_) => None,
        }
    }

    fn key_at(&self, start: usize) -> Option<&'a [u8]> {
        let rest = self.data.get(start..)?;
        let end = rest.iter().position(|&b| b == 0)?;
        Some(&rest[..end])
    }
}

fn u16_at(data: &[u8], at: usize) -> Option<u16> {
    let bytes = data.get(at..at.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn u32_at(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
