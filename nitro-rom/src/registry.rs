//! Known file type magics
//!
//! Extension repair asks a [`FileTypeRegistry`] whether the first four bytes
//! of a file are a known format tag. Tags are compared after
//! [`normalize_tag`]: ASCII lowercased, trailing spaces and NULs removed.

use hashbrown::HashSet;

/// Lookup of known 4-character format tags.
pub trait FileTypeRegistry: std::fmt::Debug {
    /// Whether `tag` names a known format. Comparison ignores ASCII case.
    fn contains(&self, tag: &str) -> bool;
}

/// Tags of common Nitro formats, as they appear at the start of a file.
pub const DEFAULT_FILE_TYPES: &[&str] = &[
    // Containers
    "narc", "carc", "sdat",
    // 3D (NSBMD/NSBTX/NSBCA/NSBTP/NSBTA/NSBMA/NSBVA)
    "bmd0", "btx0", "bca0", "btp0", "bta0", "bma0", "bva0",
    // 2D graphics, on-disk tag order (NCGR/NCLR/NSCR/NCER/NANR/NMCR/NMAR)
    "rgcn", "rlcn", "rcsn", "recn", "rnan", "rcmn", "ramn",
    // Fonts and messages
    "rtfn", "mesg",
    // Sound archive members
    "sseq", "ssar", "sbnk", "swar", "strm", "swav",
    // Particles
    "spa",
];

/// Default registry backed by a set of normalized tags.
#[derive(Debug, Clone)]
pub struct KnownFileTypes {
    tags: HashSet<String>,
}

impl KnownFileTypes {
    /// Registry with no tags at all.
    pub fn empty() -> Self {
        Self {
            tags: HashSet::new(),
        }
    }

    /// Add a tag. Tags that normalize to nothing are ignored.
    pub fn insert(&mut self, tag: &str) -> bool {
        match normalize_tag(tag.as_bytes()) {
            Some(tag) => self.tags.insert(tag),
            None => false,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.insert(tag.as_ref());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl Default for KnownFileTypes {
    fn default() -> Self {
        Self::empty().with_tags(DEFAULT_FILE_TYPES)
    }
}

impl FileTypeRegistry for KnownFileTypes {
    fn contains(&self, tag: &str) -> bool {
        normalize_tag(tag.as_bytes()).is_some_and(|tag| self.tags.contains(&tag))
    }
}

/// Turn raw magic bytes into a lowercase extension.
///
/// Returns `None` unless every byte is ASCII alphanumeric, or a space or NUL
/// in trailing position, and at least one character remains.
pub fn normalize_tag(bytes: &[u8]) -> Option<String> {
    let trimmed = match bytes.iter().rposition(|&b| b != b' ' && b != 0) {
        Some(last) => &bytes[..=last],
        None => return None,
    };
    if !trimmed.iter().all(u8::is_ascii_alphanumeric) {
        return None;
    }
    Some(trimmed.iter().map(|b| b.to_ascii_lowercase() as char).collect())
}
