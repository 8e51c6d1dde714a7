//! Entries from a SQLite staging table.

use crate::encoding::TextEncoding;
use crate::entry::{DictionaryEntry, SourceRef};
use crate::error::CoreResult;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::info;

/// Staging table name.
pub const STAGING_TABLE: &str = "mdx_txt";

/// Scans every row of the staging table.
///
/// Rows are not read again until packing, where they are looked up by
/// key and told apart by `size`. A key may own several rows.
///
/// # Errors
///
/// Returns a staging error if the database or table is missing, and
/// [`crate::CoreError::Encoding`] if content cannot be encoded.
pub fn scan_staging(
    path: &Path,
    encoding: TextEncoding,
    progress: &mut dyn FnMut(usize),
) -> CoreResult<Vec<DictionaryEntry>> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare("SELECT entry, paraphrase FROM mdx_txt")?;
    let mut rows = stmt.query([])?;

    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        let key: String = row.get(0)?;
        let content: String = row.get(1)?;
        let size = encoding.encode_terminated(&content)?.len() as u64;
        entries.push(DictionaryEntry::new(
            key,
            SourceRef::Staging(path.to_path_buf()),
            0,
            size,
        ));
        progress(1);
    }

    info!(path = %path.display(), entries = entries.len(), "scanned staging table");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use tempfile::tempdir;

    #[test]
    fn one_entry_per_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dict.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE mdx_txt (entry text not null, paraphrase text not null);
             INSERT INTO mdx_txt VALUES ('cat', 'feline'), ('cat', 'cat-like'), ('日', '太陽');",
        )
        .unwrap();
        drop(conn);

        let entries = scan_staging(&path, TextEncoding::Utf8, &mut |_| {}).unwrap();
        let summary: Vec<(&str, u64)> = entries.iter().map(|e| (e.key.as_str(), e.size)).collect();
        assert_eq!(summary, vec![("cat", 7), ("cat", 9), ("日", 7)]);
        assert!(entries
            .iter()
            .all(|e| e.position == 0 && e.source == SourceRef::Staging(path.clone())));
    }

    #[test]
    fn size_follows_encoding() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dict.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE mdx_txt (entry text not null, paraphrase text not null);
             INSERT INTO mdx_txt VALUES ('k', 'ab');",
        )
        .unwrap();
        drop(conn);

        let entries = scan_staging(&path, TextEncoding::Utf16Le, &mut |_| {}).unwrap();
        assert_eq!(entries[0].size, 6);
    }

    #[test]
    fn missing_table_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE other (x)")
            .unwrap();

        let result = scan_staging(&path, TextEncoding::Utf8, &mut |_| {});
        assert!(matches!(result, Err(CoreError::Staging(_))));
    }
}
