//! The delimited text format.
//!
//! ```text
//! key
//! content line
//! more content
//! </>
//! ```
//!
//! Lines are trimmed of ASCII whitespace; blank lines are skipped
//! everywhere. The first non-blank line of a record is its key, every
//! following line up to `</>` is content. A trailing record without `</>`
//! is dropped with a warning.

use crate::encoding::TextEncoding;
use crate::entry::{DictionaryEntry, SourceRef};
use crate::error::{CoreError, CoreResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::Path;
use tracing::{info, warn};

/// The record terminator line.
pub const END_MARKER: &[u8] = b"</>";

/// One record as raw bytes in the file's encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    /// The trimmed key line.
    pub key: Vec<u8>,
    /// The trimmed content lines.
    pub lines: Vec<Vec<u8>>,
    /// File byte range from the first content byte to the last.
    pub span: Range<u64>,
}

/// Streams [`TextRecord`]s out of a delimited text file.
#[derive(Debug)]
pub struct TextRecordReader<R> {
    inner: R,
    pos: u64,
    line: Vec<u8>,
}

impl<R: BufRead> TextRecordReader<R> {
    /// Wraps a buffered reader positioned at the start of the file.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pos: 0,
            line: Vec::new(),
        }
    }

    /// Reads the next complete record.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the underlying reader.
    pub fn next_record(&mut self) -> CoreResult<Option<TextRecord>> {
        let mut key: Option<Vec<u8>> = None;
        let mut lines = Vec::new();
        let mut span: Option<Range<u64>> = None;
        let mut key_end = self.pos;

        loop {
            self.line.clear();
            let line_start = self.pos;
            let n = self.inner.read_until(b'\n', &mut self.line)?;
            if n == 0 {
                if let Some(key) = key {
                    warn!(
                        key = %String::from_utf8_lossy(&key),
                        "record without end marker at end of input dropped"
                    );
                }
                return Ok(None);
            }
            self.pos += n as u64;

            let (lead, trimmed) = trim(&self.line);
            if trimmed.is_empty() {
                continue;
            }

            if trimmed == END_MARKER {
                match key.take() {
                    Some(key) => {
                        return Ok(Some(TextRecord {
                            key,
                            lines,
                            span: span.unwrap_or(key_end..key_end),
                        }));
                    }
                    None => {
                        warn!(offset = line_start, "end marker without a key skipped");
                        continue;
                    }
                }
            }

            let start = line_start + lead as u64;
            let end = start + trimmed.len() as u64;
            if key.is_none() {
                key = Some(trimmed.to_vec());
                key_end = self.pos;
            } else {
                lines.push(trimmed.to_vec());
                span = Some(span.map_or(start..end, |s| s.start..end));
            }
        }
    }
}

impl<R: BufRead> Iterator for TextRecordReader<R> {
    type Item = CoreResult<TextRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

fn trim(line: &[u8]) -> (usize, &[u8]) {
    let lead = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let tail = line[lead..]
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(lead, |i| lead + i + 1);
    (lead, &line[lead..tail])
}

/// Scans a delimited text file into byte-range entries.
///
/// Each entry's payload is the file bytes from its first content byte to
/// its last, plus a terminator; line breaks between content lines are kept
/// as they appear in the file.
///
/// # Errors
///
/// Returns [`CoreError::Encoding`] if `encoding` is not ASCII compatible or
/// a key does not decode, and I/O errors.
pub fn scan_text(
    path: &Path,
    encoding: TextEncoding,
    progress: &mut dyn FnMut(usize),
) -> CoreResult<Vec<DictionaryEntry>> {
    if !encoding.is_ascii_compatible() {
        return Err(CoreError::encoding(format!(
            "line-oriented input cannot be {encoding}"
        )));
    }

    let reader = TextRecordReader::new(BufReader::new(File::open(path)?));
    let mut entries = Vec::new();
    for record in reader {
        let record = record?;
        let key = encoding.decode(&record.key)?;
        let size = record.span.end - record.span.start + 1;
        entries.push(DictionaryEntry::new(
            key,
            SourceRef::TextRange(path.to_path_buf()),
            record.span.start,
            size,
        ));
        progress(1);
    }

    info!(path = %path.display(), entries = entries.len(), "scanned text dictionary");
    Ok(entries)
}
