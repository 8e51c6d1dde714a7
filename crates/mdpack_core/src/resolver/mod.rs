//! Lazy record resolution.
//!
//! Payloads are not held in the offset table. The block assembler asks the
//! resolver for each entry's bytes while it fills a block, and drops them
//! once the block is compressed.
//!
//! ## Strategies
//!
//! | source              | payload                                          |
//! |---------------------|--------------------------------------------------|
//! | `Blob(path)`        | the whole file, verbatim                         |
//! | `TextRange(path)`   | `size - 1` bytes at `position`, then one `0x00`  |
//! | `Staging(path)`     | first `mdx_txt` row for the key whose encoded, terminated content is `size` bytes |
//!
//! When several staging rows for one key encode to the same length, the
//! first row SQLite returns wins. Which row that is is not defined.

mod cache;

pub use cache::{ResourceCache, SourceHandle};

use crate::entry::SourceRef;
use crate::error::{CoreError, CoreResult};
use crate::offset_table::{OffsetTableEntry, RecordLocator};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

const STAGING_LOOKUP: &str = "SELECT paraphrase FROM mdx_txt WHERE entry = ?1";

/// Produces entry payloads on demand, reusing one handle per source.
#[derive(Debug, Default)]
pub struct RecordResolver {
    cache: ResourceCache,
}

impl RecordResolver {
    /// Creates a resolver with an empty resource cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns exactly `entry.record_size()` payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SourceResolution`] if the source is missing or
    /// unreadable, or no candidate payload has the declared size.
    pub fn resolve(&mut self, entry: &OffsetTableEntry) -> CoreResult<Vec<u8>> {
        let locator = &entry.locator;
        let key = entry.key_text.as_str();
        match &locator.source {
            SourceRef::Blob(path) => read_blob(key, path, locator.size),
            SourceRef::TextRange(path) => self.read_range(key, path, locator),
            SourceRef::Staging(path) => self.lookup_staging(key, path, locator),
        }
    }

    /// Number of sources currently held open.
    #[must_use]
    pub fn open_sources(&self) -> usize {
        self.cache.len()
    }

    /// Releases every cached handle.
    ///
    /// # Errors
    ///
    /// Returns an error if a staging connection fails to close.
    pub fn close(self) -> CoreResult<()> {
        self.cache.close()
    }

    fn read_range(&mut self, key: &str, path: &Path, locator: &RecordLocator) -> CoreResult<Vec<u8>> {
        let Some(body_len) = locator.size.checked_sub(1) else {
            return Err(CoreError::source_resolution(key, "text record declared with size 0"));
        };

        let file = self
            .cache
            .file(path)
            .map_err(|e| CoreError::source_resolution(key, format!("{}: {e}", path.display())))?;

        file.seek(SeekFrom::Start(locator.position))?;
        let mut payload = Vec::new();
        let read = file.take(body_len).read_to_end(&mut payload)?;
        if read as u64 != body_len {
            return Err(CoreError::source_resolution(
                key,
                format!(
                    "{} ends before byte {}",
                    path.display(),
                    locator.position.saturating_add(body_len)
                ),
            ));
        }
        payload.push(0);

        Ok(payload)
    }

    fn lookup_staging(
        &mut self,
        key: &str,
        path: &Path,
        locator: &RecordLocator,
    ) -> CoreResult<Vec<u8>> {
        let conn = self
            .cache
            .staging(path)
            .map_err(|e| CoreError::source_resolution(key, format!("{}: {e}", path.display())))?;

        let mut stmt = conn.prepare_cached(STAGING_LOOKUP)?;
        let rows = stmt.query_map([key], |row| row.get::<_, String>(0))?;

        let mut candidates = 0usize;
        for row in rows {
            let payload = locator.encoding.encode_terminated(&row?)?;
            if payload.len() as u64 == locator.size {
                return Ok(payload);
            }
            candidates += 1;
        }

        Err(CoreError::source_resolution(
            key,
            format!(
                "none of {candidates} staged rows encodes to {} bytes",
                locator.size
            ),
        ))
    }
}

fn read_blob(key: &str, path: &Path, size: u64) -> CoreResult<Vec<u8>> {
    let unreadable =
        |e: std::io::Error| CoreError::source_resolution(key, format!("{}: {e}", path.display()));
    let len = std::fs::metadata(path).map_err(unreadable)?.len();
    if len != size {
        return Err(CoreError::source_resolution(
            key,
            format!("{} is {len} bytes, expected {size}", path.display()),
        ));
    }
    let payload = std::fs::read(path).map_err(unreadable)?;
    if payload.len() as u64 != size {
        return Err(CoreError::source_resolution(
            key,
            format!("{} changed while reading", path.display()),
        ));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::TextEncoding;
    use rusqlite::Connection;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn table_entry(key: &str, source: SourceRef, position: u64, size: u64) -> OffsetTableEntry {
        let mut key_null = key.as_bytes().to_vec();
        key_null.push(0);
        OffsetTableEntry {
            key_text: key.to_string(),
            key: key.as_bytes().to_vec(),
            key_null,
            key_len: key.len() as u64,
            locator: RecordLocator {
                source,
                position,
                size,
                encoding: TextEncoding::Utf8,
            },
            offset: 0,
        }
    }

    fn staging_db(dir: &Path, rows: &[(&str, &str)]) -> PathBuf {
        let path = dir.join("dict.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE mdx_txt (entry text not null, paraphrase text not null)")
            .unwrap();
        for (entry, paraphrase) in rows {
            conn.execute("INSERT INTO mdx_txt VALUES (?1, ?2)", [entry, paraphrase])
                .unwrap();
        }
        path
    }

    #[test]
    fn text_range_appends_terminator() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dict.txt");
        std::fs::write(&path, b"hello\nworld\n</>\n").unwrap();

        let mut resolver = RecordResolver::new();
        let entry = table_entry("hello", SourceRef::TextRange(path), 6, 6);
        assert_eq!(resolver.resolve(&entry).unwrap(), b"world\0");
    }

    #[test]
    fn text_range_reuses_handle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dict.txt");
        std::fs::write(&path, b"aaaabbbb").unwrap();

        let mut resolver = RecordResolver::new();
        let first = table_entry("a", SourceRef::TextRange(path.clone()), 0, 5);
        let second = table_entry("b", SourceRef::TextRange(path), 4, 5);
        assert_eq!(resolver.resolve(&first).unwrap(), b"aaaa\0");
        assert_eq!(resolver.resolve(&second).unwrap(), b"bbbb\0");
        assert_eq!(resolver.open_sources(), 1);
        resolver.close().unwrap();
    }

    #[test]
    fn text_range_past_end_is_resolution_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dict.txt");
        std::fs::write(&path, b"abc").unwrap();

        let mut resolver = RecordResolver::new();
        let entry = table_entry("a", SourceRef::TextRange(path), 1, 10);
        let result = resolver.resolve(&entry);
        assert!(matches!(result, Err(CoreError::SourceResolution { .. })));
    }

    #[test]
    fn absurd_text_range_size_is_resolution_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dict.txt");
        std::fs::write(&path, b"hello\nworld\n</>\n").unwrap();

        let mut resolver = RecordResolver::new();
        let entry = table_entry("hello", SourceRef::TextRange(path), 6, u64::MAX);
        assert!(matches!(
            resolver.resolve(&entry),
            Err(CoreError::SourceResolution { .. })
        ));
    }

    #[test]
    fn absurd_blob_size_is_resolution_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("img.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let mut resolver = RecordResolver::new();
        let entry = table_entry("\\img.png", SourceRef::Blob(path), 0, u64::MAX);
        assert!(matches!(
            resolver.resolve(&entry),
            Err(CoreError::SourceResolution { .. })
        ));
    }

    #[test]
    fn blob_is_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("img.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let mut resolver = RecordResolver::new();
        let entry = table_entry("\\img.png", SourceRef::Blob(path), 0, 4);
        assert_eq!(resolver.resolve(&entry).unwrap(), vec![0x89, b'P', b'N', b'G']);
        assert_eq!(resolver.open_sources(), 0);
    }

    #[test]
    fn missing_blob_is_resolution_error() {
        let dir = tempdir().unwrap();
        let mut resolver = RecordResolver::new();
        let entry = table_entry("\\gone", SourceRef::Blob(dir.path().join("gone")), 0, 1);
        assert!(matches!(
            resolver.resolve(&entry),
            Err(CoreError::SourceResolution { .. })
        ));
    }

    #[test]
    fn staging_rows_disambiguated_by_size() {
        let dir = tempdir().unwrap();
        let db = staging_db(dir.path(), &[("cat", "feline"), ("cat", "cat-like")]);

        let mut resolver = RecordResolver::new();
        let short = table_entry("cat", SourceRef::Staging(db.clone()), 0, 7);
        let long = table_entry("cat", SourceRef::Staging(db), 0, 9);
        assert_eq!(resolver.resolve(&short).unwrap(), b"feline\0");
        assert_eq!(resolver.resolve(&long).unwrap(), b"cat-like\0");
        assert_eq!(resolver.open_sources(), 1);
        resolver.close().unwrap();
    }

    #[test]
    fn staging_size_mismatch_is_resolution_error() {
        let dir = tempdir().unwrap();
        let db = staging_db(dir.path(), &[("cat", "feline")]);

        let mut resolver = RecordResolver::new();
        let entry = table_entry("cat", SourceRef::Staging(db), 0, 3);
        assert!(matches!(
            resolver.resolve(&entry),
            Err(CoreError::SourceResolution { .. })
        ));
    }
}
