//! Conversion between the delimited text format and the staging table.
//!
//! ## Import
//!
//! `txt_to_staging` recreates `mdx_txt` and inserts records in batches of
//! [`StagingConfig::batch_size`], each batch in its own transaction. A
//! failure surfaces as [`CoreError::StagingIntegrity`]; batches committed
//! before it stay in the table, so a failed import leaves a partial table
//! behind. The `entry_index` index is built once all rows are in.
//!
//! Content lines are trimmed, blank lines dropped, and the rest joined with
//! `\n`, so a staged record can differ from the raw text range.
//!
//! ## Export
//!
//! `staging_to_txt` writes every row as `key\r\n`, `content\r\n`, `</>\r\n`
//! in table order.

use crate::config::StagingConfig;
use crate::encoding::TextEncoding;
use crate::error::{CoreError, CoreResult};
use crate::sources::TextRecordReader;
use rusqlite::{Connection, OpenFlags};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CREATE_TABLE: &str = "DROP TABLE IF EXISTS mdx_txt;
     CREATE TABLE mdx_txt (entry text not null, paraphrase text not null);";
const CREATE_INDEX: &str = "CREATE INDEX entry_index ON mdx_txt (entry)";
const INSERT_ROW: &str = "INSERT INTO mdx_txt VALUES (?1, ?2)";
const SELECT_ROWS: &str = "SELECT entry, paraphrase FROM mdx_txt ORDER BY rowid";

/// Outcome of a text import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingReport {
    /// Records inserted.
    pub records: u64,
    /// Transactions committed.
    pub batches: u64,
}

/// The default staging database path for a text file: `<file>.db`.
#[must_use]
pub fn staging_path_for(text: &Path) -> PathBuf {
    with_suffix(text, ".db")
}

/// The default export path for a staging database: `<file>.txt`.
#[must_use]
pub fn text_path_for(staging: &Path) -> PathBuf {
    with_suffix(staging, ".txt")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Imports a delimited text file into a fresh `mdx_txt` table at `target`.
///
/// `progress` is called once per record read.
///
/// # Errors
///
/// Returns [`CoreError::StagingIntegrity`] if a batch fails to insert or
/// commit, [`CoreError::Encoding`] for undecodable text, and I/O or
/// staging errors for setup failures.
pub fn txt_to_staging(
    source: &Path,
    target: &Path,
    encoding: TextEncoding,
    config: &StagingConfig,
    progress: &mut dyn FnMut(usize),
) -> CoreResult<StagingReport> {
    if !encoding.is_ascii_compatible() {
        return Err(CoreError::encoding(format!(
            "line-oriented input cannot be {encoding}"
        )));
    }
    if config.batch_size == 0 {
        return Err(CoreError::invalid_config("batch size must be positive"));
    }

    let mut conn = Connection::open(target)?;
    conn.execute_batch(CREATE_TABLE)?;

    let reader = TextRecordReader::new(BufReader::new(File::open(source)?));
    let mut batch: Vec<(String, String)> = Vec::new();
    let mut report = StagingReport {
        records: 0,
        batches: 0,
    };

    for record in reader {
        let record = record?;
        let key = encoding.decode(&record.key)?;
        let lines = record
            .lines
            .iter()
            .map(|line| encoding.decode(line))
            .collect::<CoreResult<Vec<_>>>()?;
        batch.push((key, lines.join("\n")));
        progress(1);

        if batch.len() >= config.batch_size {
            commit_batch(&mut conn, &mut batch, &mut report)?;
        }
    }
    if !batch.is_empty() {
        commit_batch(&mut conn, &mut batch, &mut report)?;
    }

    conn.execute_batch(CREATE_INDEX)?;
    info!(
        source = %source.display(),
        target = %target.display(),
        records = report.records,
        batches = report.batches,
        "staged text dictionary"
    );
    Ok(report)
}

fn commit_batch(
    conn: &mut Connection,
    batch: &mut Vec<(String, String)>,
    report: &mut StagingReport,
) -> CoreResult<()> {
    let rows = batch.len() as u64;
    insert_batch(conn, batch)
        .map_err(|e| CoreError::staging_integrity(report.batches, e.to_string()))?;
    batch.clear();

    report.records += rows;
    report.batches += 1;
    debug!(batch = report.batches, rows, "committed staging batch");
    Ok(())
}

fn insert_batch(conn: &mut Connection, batch: &[(String, String)]) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(INSERT_ROW)?;
        for (key, content) in batch {
            stmt.execute([key, content])?;
        }
    }
    tx.commit()
}

/// Exports the `mdx_txt` table at `source` as delimited text at `target`.
///
/// Returns the number of records written.
///
/// # Errors
///
/// Returns staging errors for a missing database or table,
/// [`CoreError::Encoding`] for unencodable rows, and I/O errors.
pub fn staging_to_txt(
    source: &Path,
    target: &Path,
    encoding: TextEncoding,
    progress: &mut dyn FnMut(usize),
) -> CoreResult<u64> {
    let conn = Connection::open_with_flags(source, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare(SELECT_ROWS)?;
    let mut rows = stmt.query([])?;

    let mut out = BufWriter::new(File::create(target)?);
    let mut written = 0u64;
    while let Some(row) = rows.next()? {
        let key: String = row.get(0)?;
        let content: String = row.get(1)?;
        out.write_all(&encoding.encode(&format!("{key}\r\n{content}\r\n</>\r\n"))?)?;
        written += 1;
        progress(1);
    }
    out.flush()?;

    info!(
        source = %source.display(),
        target = %target.display(),
        records = written,
        "exported staging table"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn pairs(db: &Path) -> Vec<(String, String)> {
        let conn = Connection::open(db).unwrap();
        let mut stmt = conn
            .prepare("SELECT entry, paraphrase FROM mdx_txt ORDER BY rowid")
            .unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn failed_batch_keeps_earlier_batches() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("dict.db");
        let mut conn = Connection::open(&db).unwrap();
        conn.execute_batch(CREATE_TABLE).unwrap();

        let mut report = StagingReport {
            records: 0,
            batches: 0,
        };
        let mut batch = vec![
            ("a".to_string(), "alpha".to_string()),
            ("b".to_string(), "beta".to_string()),
        ];
        commit_batch(&mut conn, &mut batch, &mut report).unwrap();
        assert!(batch.is_empty());

        conn.execute_batch(
            "CREATE TRIGGER reject_bad BEFORE INSERT ON mdx_txt WHEN NEW.entry = 'bad'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();
        let mut batch = vec![
            ("c".to_string(), "gamma".to_string()),
            ("bad".to_string(), "oops".to_string()),
        ];
        let result = commit_batch(&mut conn, &mut batch, &mut report);
        assert!(matches!(
            result,
            Err(CoreError::StagingIntegrity {
                committed_batches: 1,
                ..
            })
        ));
        assert_eq!(report.records, 2);
        assert_eq!(report.batches, 1);
        drop(conn);

        assert_eq!(
            pairs(&db),
            vec![
                ("a".to_string(), "alpha".to_string()),
                ("b".to_string(), "beta".to_string()),
            ]
        );
    }

    #[test]
    fn default_paths() {
        assert_eq!(staging_path_for(Path::new("a/dict.txt")), PathBuf::from("a/dict.txt.db"));
        assert_eq!(text_path_for(Path::new("dict.db")), PathBuf::from("dict.db.txt"));
    }

    #[test]
    fn import_batches_and_index() {
        let dir = tempdir().unwrap();
        let txt = dir.path().join("dict.txt");
        std::fs::write(
            &txt,
            "a\nalpha\n</>\nb\nbeta\nsecond line\n</>\n\nc\ngamma\n</>\n",
        )
        .unwrap();
        let db = staging_path_for(&txt);

        let mut ticks = 0;
        let report = txt_to_staging(
            &txt,
            &db,
            TextEncoding::Utf8,
            &StagingConfig::default().batch_size(2),
            &mut |n| ticks += n,
        )
        .unwrap();

        assert_eq!(report, StagingReport { records: 3, batches: 2 });
        assert_eq!(ticks, 3);
        assert_eq!(
            pairs(&db),
            vec![
                ("a".to_string(), "alpha".to_string()),
                ("b".to_string(), "beta\nsecond line".to_string()),
                ("c".to_string(), "gamma".to_string()),
            ]
        );

        let conn = Connection::open(&db).unwrap();
        let index: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'index' AND name = 'entry_index'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn reimport_replaces_table() {
        let dir = tempdir().unwrap();
        let txt = dir.path().join("dict.txt");
        let db = dir.path().join("dict.db");
        std::fs::write(&txt, "a\nalpha\n</>\n").unwrap();

        let config = StagingConfig::default();
        txt_to_staging(&txt, &db, TextEncoding::Utf8, &config, &mut |_| {}).unwrap();
        txt_to_staging(&txt, &db, TextEncoding::Utf8, &config, &mut |_| {}).unwrap();
        assert_eq!(pairs(&db).len(), 1);
    }

    #[test]
    fn export_format() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("dict.db");
        Connection::open(&db)
            .unwrap()
            .execute_batch(
                "CREATE TABLE mdx_txt (entry text not null, paraphrase text not null);
                 INSERT INTO mdx_txt VALUES ('cat', 'feline');",
            )
            .unwrap();

        let txt = text_path_for(&db);
        let written = staging_to_txt(&db, &txt, TextEncoding::Utf8, &mut |_| {}).unwrap();
        assert_eq!(written, 1);
        assert_eq!(std::fs::read_to_string(&txt).unwrap(), "cat\r\nfeline\r\n</>\r\n");
    }

    #[test]
    fn text_staging_text_preserves_pairs() {
        let dir = tempdir().unwrap();
        let txt = dir.path().join("dict.txt");
        std::fs::write(
            &txt,
            "cat\nfeline\n</>\ncat\ncat-like\n</>\n\ndog\ncanine\nloyal\n</>\n",
        )
        .unwrap();

        let db = dir.path().join("dict.db");
        txt_to_staging(&txt, &db, TextEncoding::Utf8, &StagingConfig::default(), &mut |_| {})
            .unwrap();
        let exported = dir.path().join("out.txt");
        staging_to_txt(&db, &exported, TextEncoding::Utf8, &mut |_| {}).unwrap();

        let db2 = dir.path().join("again.db");
        txt_to_staging(&exported, &db2, TextEncoding::Utf8, &StagingConfig::default(), &mut |_| {})
            .unwrap();

        let before: BTreeSet<_> = pairs(&db).into_iter().collect();
        let after: BTreeSet<_> = pairs(&db2).into_iter().collect();
        assert_eq!(before.len(), 3);
        assert_eq!(before, after);
    }

    #[test]
    fn missing_source_leaves_no_rows() {
        let dir = tempdir().unwrap();
        let result = txt_to_staging(
            &dir.path().join("missing.txt"),
            &dir.path().join("dict.db"),
            TextEncoding::Utf8,
            &StagingConfig::default(),
            &mut |_| {},
        );
        assert!(matches!(result, Err(CoreError::Io(_))));
    }
}
