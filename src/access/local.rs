//! Local filesystem access.

use std::fs::{self, File};
use std::path::Path;

use super::{io, AccessLayer, ErrorSlot};
use crate::locator::Locator;

/// Reads a file (or inspects a directory) on the local disk.
///
/// The file handle is opened once at construction; a missing file is not an
/// error here, it simply reports `exists() == false`.
pub struct LocalAccess {
    locator: Locator,
    file: Option<File>,
    size: u64,
    exists: bool,
    directory: bool,
    error: ErrorSlot,
}

impl LocalAccess {
    /// Open `locator` for reading.
    pub fn new(locator: Locator) -> Self {
        let error = ErrorSlot::default();
        let path = Path::new(locator.as_str());

        let (exists, directory, size) = match fs::metadata(path) {
            Ok(meta) => (true, meta.is_dir(), if meta.is_dir() { 0 } else { meta.len() }),
            Err(_) => (false, false, 0),
        };

        let file = if exists && !directory {
            File::open(path)
                .map_err(|e| error.set(format!("failed to open {}: {e}", locator)))
                .ok()
        } else {
            None
        };

        Self {
            locator,
            file,
            size,
            exists,
            directory,
            error,
        }
    }
}

impl AccessLayer for LocalAccess {
    fn exists(&self) -> bool {
        self.exists
    }

    fn is_directory(&self) -> bool {
        self.directory
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read_at(&self, offset: u64, len: usize) -> Vec<u8> {
        let Some(file) = &self.file else {
            return Vec::new();
        };
        if offset >= self.size || len == 0 {
            return Vec::new();
        }
        match io::read_at(file, offset, len) {
            Ok(data) => data,
            Err(e) => {
                self.error.set(format!("read of {} at {offset} failed: {e}", self.locator));
                Vec::new()
            }
        }
    }

    fn locator(&self) -> &Locator {
        &self.locator
    }

    fn latest_error(&self) -> Option<String> {
        self.error.get()
    }

    fn error_count(&self) -> u64 {
        self.error.count()
    }

    fn has_child(&self, name: &str) -> bool {
        self.directory && Path::new(self.locator.as_str()).join(name).exists()
    }
}
