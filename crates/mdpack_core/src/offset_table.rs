//! The offset table: entries in collated key order with record offsets.

use crate::collation::KeyCollation;
use crate::encoding::TextEncoding;
use crate::entry::{DictionaryEntry, SourceRef};
use crate::error::{CoreError, CoreResult};

/// Everything the resolver needs to produce one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLocator {
    /// Payload source.
    pub source: SourceRef,
    /// Byte offset within the source (text ranges only).
    pub position: u64,
    /// Declared payload length.
    pub size: u64,
    /// Encoding of textual payloads.
    pub encoding: TextEncoding,
}

impl RecordLocator {
    /// Whether the payload is a whole file.
    #[must_use]
    pub const fn is_blob(&self) -> bool {
        self.source.is_blob()
    }
}

/// One row of the offset table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTableEntry {
    /// The key as text, used for staging lookups.
    pub key_text: String,
    /// The encoded key.
    pub key: Vec<u8>,
    /// The encoded key followed by the encoded terminator.
    pub key_null: Vec<u8>,
    /// Key length in code units of the key encoding.
    pub key_len: u64,
    /// Where the payload comes from.
    pub locator: RecordLocator,
    /// Offset of this record in the concatenation of all records.
    pub offset: u64,
}

impl OffsetTableEntry {
    /// Declared payload length.
    #[must_use]
    pub const fn record_size(&self) -> u64 {
        self.locator.size
    }
}

/// Sorted entries ready for block assembly.
#[derive(Debug, Clone, Default)]
pub struct OffsetTable {
    entries: Vec<OffsetTableEntry>,
    total_record_len: u64,
}

impl OffsetTable {
    /// Sorts `entries` by `collation` and assigns running record offsets.
    ///
    /// The sort is stable: keys that collate equal keep their input order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Encoding`] if a key cannot be encoded
    /// in `key_encoding`, or [`crate::CoreError::SourceResolution`] if the
    /// declared sizes sum past `u64::MAX`. Nothing has been written at that
    /// point.
    pub fn build(
        mut entries: Vec<DictionaryEntry>,
        collation: &KeyCollation,
        key_encoding: TextEncoding,
        record_encoding: TextEncoding,
    ) -> CoreResult<Self> {
        entries.sort_by(|a, b| collation.compare(&a.key, &b.key));

        let mut table = Vec::with_capacity(entries.len());
        let mut offset = 0u64;
        for entry in entries {
            let key = key_encoding.encode(&entry.key)?;
            let mut key_null = key.clone();
            key_null.extend_from_slice(key_encoding.terminator());
            let key_len = (key.len() / key_encoding.unit_width()) as u64;
            let size = entry.size;
            let Some(next) = offset.checked_add(size) else {
                return Err(CoreError::source_resolution(
                    &entry.key,
                    format!("declared size {size} overflows the record section"),
                ));
            };

            table.push(OffsetTableEntry {
                key_text: entry.key,
                key,
                key_null,
                key_len,
                locator: RecordLocator {
                    source: entry.source,
                    position: entry.position,
                    size,
                    encoding: record_encoding,
                },
                offset,
            });
            offset = next;
        }

        Ok(Self {
            entries: table,
            total_record_len: offset,
        })
    }

    /// The sorted entries.
    #[must_use]
    pub fn entries(&self) -> &[OffsetTableEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all declared record sizes.
    #[must_use]
    pub const fn total_record_len(&self) -> u64 {
        self.total_record_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(key: &str, size: u64) -> DictionaryEntry {
        DictionaryEntry::new(key, SourceRef::TextRange(PathBuf::from("dict.txt")), 0, size)
    }

    fn keys(table: &OffsetTable) -> Vec<&str> {
        table.entries().iter().map(|e| e.key_text.as_str()).collect()
    }

    #[test]
    fn sorted_with_running_offsets() {
        let collation = KeyCollation::from_tag("C").unwrap();
        let table = OffsetTable::build(
            vec![entry("pear", 5), entry("apple", 3), entry("fig", 7)],
            &collation,
            TextEncoding::Utf8,
            TextEncoding::Utf8,
        )
        .unwrap();

        assert_eq!(keys(&table), vec!["apple", "fig", "pear"]);
        let offsets: Vec<u64> = table.entries().iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0, 3, 10]);
        assert_eq!(table.total_record_len(), 15);
    }

    #[test]
    fn overflowing_sizes_are_rejected() {
        let collation = KeyCollation::from_tag("C").unwrap();
        let result = OffsetTable::build(
            vec![entry("a", u64::MAX), entry("b", 1)],
            &collation,
            TextEncoding::Utf8,
            TextEncoding::Utf8,
        );
        assert!(matches!(result, Err(CoreError::SourceResolution { .. })));
    }

    #[test]
    fn key_bytes_and_unit_length() {
        let collation = KeyCollation::from_tag("C").unwrap();
        let table = OffsetTable::build(
            vec![entry("ab", 1)],
            &collation,
            TextEncoding::Utf16Le,
            TextEncoding::Utf8,
        )
        .unwrap();

        let row = &table.entries()[0];
        assert_eq!(row.key, vec![b'a', 0, b'b', 0]);
        assert_eq!(row.key_null, vec![b'a', 0, b'b', 0, 0, 0]);
        assert_eq!(row.key_len, 2);
    }

    #[test]
    fn collation_equal_keys_keep_input_order() {
        let collation = KeyCollation::from_tag("und").unwrap();
        let table = OffsetTable::build(
            vec![entry("e\u{301}", 1), entry("d", 1), entry("\u{e9}", 2)],
            &collation,
            TextEncoding::Utf8,
            TextEncoding::Utf8,
        )
        .unwrap();

        assert_eq!(keys(&table), vec!["d", "e\u{301}", "\u{e9}"]);
    }

    #[test]
    fn unencodable_key_fails() {
        let collation = KeyCollation::from_tag("C").unwrap();
        let result = OffsetTable::build(
            vec![entry("😀", 1)],
            &collation,
            TextEncoding::Gbk,
            TextEncoding::Gbk,
        );
        assert!(matches!(result, Err(CoreError::Encoding { .. })));
    }
}
