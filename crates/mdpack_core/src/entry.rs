//! Dictionary entries produced by the source adapters.

use std::path::{Path, PathBuf};

/// Where an entry's payload lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceRef {
    /// A row of the `mdx_txt` staging table in this SQLite database,
    /// looked up by key.
    Staging(PathBuf),
    /// A byte range of this delimited text file.
    TextRange(PathBuf),
    /// The entire contents of this file.
    Blob(PathBuf),
}

impl SourceRef {
    /// The file backing this source.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Staging(path) | Self::TextRange(path) | Self::Blob(path) => path,
        }
    }

    /// Whether the payload is a whole file copied verbatim.
    #[must_use]
    pub const fn is_blob(&self) -> bool {
        matches!(self, Self::Blob(_))
    }
}

/// One key plus a reference to its payload.
///
/// `size` is the exact byte length of the resolved payload, terminator
/// included for textual sources. Every adapter upholds this; the block
/// assembler checks it again when resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    /// The headword or resource name.
    pub key: String,
    /// Where the payload comes from.
    pub source: SourceRef,
    /// Byte offset of the payload within the source (text ranges only).
    pub position: u64,
    /// Byte length of the resolved payload.
    pub size: u64,
}

impl DictionaryEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(key: impl Into<String>, source: SourceRef, position: u64, size: u64) -> Self {
        Self {
            key: key.into(),
            source,
            position,
            size,
        }
    }
}
