//! Typed references to candidate game images.
//!
//! A [`Locator`] pairs a [`Scheme`] with a path string. The scheme decides
//! which access chain is built for it, the path drives extension and
//! filename based identification.

use std::fmt;

/// Filename of the executable container inside a game directory.
pub const EBOOT_FILENAME: &str = "EBOOT.PBP";

/// How a [`Locator`] is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// A path on the local filesystem.
    Local,
    /// An `http://` or `https://` address.
    Network,
    /// A path claimed by a registered factory prefix (e.g. `content://`).
    Custom(String),
}

/// Scheme plus path naming a candidate image or directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    scheme: Scheme,
    path: String,
}

impl Locator {
    /// Parse a user-supplied path, detecting network addresses.
    pub fn parse(path: impl Into<String>) -> Self {
        let path = path.into();
        let lower = path.to_ascii_lowercase();
        let scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
            Scheme::Network
        } else {
            Scheme::Local
        };
        Self { scheme, path }
    }

    /// A local filesystem locator.
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::Local,
            path: path.into(),
        }
    }

    /// A locator owned by a custom factory prefix.
    ///
    /// The full path (including the prefix) is kept so prefix matching
    /// against the registry keeps working after resolution.
    pub fn custom(prefix: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::Custom(prefix.into()),
            path: path.into(),
        }
    }

    /// The addressing scheme.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// The raw path string.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Whether this locator addresses a network resource.
    #[inline]
    pub fn is_network(&self) -> bool {
        self.scheme == Scheme::Network
    }

    /// Length of the path string in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// Whether the path string is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Raw prefix test on the path string.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.path.starts_with(prefix)
    }

    /// Whether the path contains `needle`, with `\` treated as `/`.
    pub fn contains(&self, needle: &str) -> bool {
        self.normalized().contains(needle)
    }

    /// Last path component, ignoring a trailing separator.
    pub fn filename(&self) -> &str {
        let trimmed = self.trimmed();
        match trimmed.rfind(is_separator) {
            Some(pos) => &trimmed[pos + 1..],
            None => trimmed,
        }
    }

    /// Lower-cased extension with its leading dot, or an empty string.
    ///
    /// Dotfiles like `.hidden` have no extension.
    pub fn extension(&self) -> String {
        let name = self.filename();
        match name.rfind('.') {
            Some(0) | None => String::new(),
            Some(pos) => name[pos..].to_ascii_lowercase(),
        }
    }

    /// The locator of the containing directory.
    ///
    /// A locator without a separator is returned unchanged.
    pub fn parent(&self) -> Locator {
        let trimmed = self.trimmed();
        let path = match trimmed.rfind(is_separator) {
            Some(0) => trimmed[..1].to_string(),
            Some(pos) => trimmed[..pos].to_string(),
            None => trimmed.to_string(),
        };
        self.with_path(path)
    }

    /// Append a child component.
    pub fn join(&self, child: &str) -> Locator {
        let trimmed = self.trimmed();
        let path = if trimmed.is_empty() {
            child.to_string()
        } else if trimmed.ends_with(is_separator) {
            // root `/`
            format!("{trimmed}{child}")
        } else {
            format!("{trimmed}/{child}")
        };
        self.with_path(path)
    }

    /// Directory part of the path as a string (everything before the filename).
    pub fn directory(&self) -> String {
        self.parent().path
    }

    /// Path with backslashes normalized to forward slashes.
    pub fn normalized(&self) -> String {
        self.path.replace('\\', "/")
    }

    fn trimmed(&self) -> &str {
        let trimmed = self.path.trim_end_matches(is_separator);
        if trimmed.is_empty() && !self.path.is_empty() {
            &self.path[..1]
        } else {
            trimmed
        }
    }

    fn with_path(&self, path: String) -> Locator {
        Locator {
            scheme: self.scheme.clone(),
            path,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<&str> for Locator {
    fn from(path: &str) -> Self {
        Locator::parse(path)
    }
}

impl From<String> for Locator {
    fn from(path: String) -> Self {
        Locator::parse(path)
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}
