//! Record section header and index entries.

use crate::error::{CoreError, CoreResult};
use crate::format::FormatVersion;

/// The four integers in front of the record index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordSectionHeader {
    /// Number of record blocks.
    pub num_blocks: u64,
    /// Number of entries across all blocks.
    pub num_entries: u64,
    /// Byte length of the index that follows the header.
    pub index_len: u64,
    /// Byte length of all compressed blocks.
    pub blocks_len: u64,
}

impl RecordSectionHeader {
    /// Encoded size of the header for a version.
    #[must_use]
    pub const fn encoded_len(version: FormatVersion) -> usize {
        4 * version.field_width()
    }

    /// Encoded size of one index entry for a version.
    #[must_use]
    pub const fn index_entry_len(version: FormatVersion) -> usize {
        2 * version.field_width()
    }

    /// Encodes the header.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] if a value overflows a version
    /// 1.2 field.
    pub fn encode(&self, version: FormatVersion) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(Self::encoded_len(version));
        version.put_int(&mut buf, self.num_blocks)?;
        version.put_int(&mut buf, self.num_entries)?;
        version.put_int(&mut buf, self.index_len)?;
        version.put_int(&mut buf, self.blocks_len)?;
        Ok(buf)
    }

    /// Decodes a header.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] if `bytes` is too short or the
    /// index length disagrees with the block count.
    pub fn decode(bytes: &[u8], version: FormatVersion) -> CoreResult<Self> {
        let width = version.field_width();
        if bytes.len() < Self::encoded_len(version) {
            return Err(CoreError::invalid_format("record section header truncated"));
        }

        let header = Self {
            num_blocks: version.get_int(&bytes[0..]),
            num_entries: version.get_int(&bytes[width..]),
            index_len: version.get_int(&bytes[2 * width..]),
            blocks_len: version.get_int(&bytes[3 * width..]),
        };

        let expected = header
            .num_blocks
            .checked_mul(Self::index_entry_len(version) as u64);
        if expected != Some(header.index_len) {
            return Err(CoreError::invalid_format(format!(
                "index length {} does not match {} blocks",
                header.index_len, header.num_blocks
            )));
        }

        Ok(header)
    }
}

/// One `(compressed_length, decompressed_length)` pair of the record index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockIndexEntry {
    /// Bytes the block occupies on disk, prefix included.
    pub compressed_len: u64,
    /// Bytes of concatenated payloads the block expands to.
    pub decompressed_len: u64,
}

impl BlockIndexEntry {
    /// Decodes all index entries.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] if `bytes` is not a whole
    /// number of entries.
    pub fn decode_all(bytes: &[u8], version: FormatVersion) -> CoreResult<Vec<Self>> {
        let entry_len = RecordSectionHeader::index_entry_len(version);
        if bytes.len() % entry_len != 0 {
            return Err(CoreError::invalid_format("record index has a partial entry"));
        }
        let width = version.field_width();
        Ok(bytes
            .chunks_exact(entry_len)
            .map(|chunk| Self {
                compressed_len: version.get_int(chunk),
                decompressed_len: version.get_int(&chunk[width..]),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip_both_versions() {
        for version in [FormatVersion::V1_2, FormatVersion::V2_0] {
            let header = RecordSectionHeader {
                num_blocks: 3,
                num_entries: 40,
                index_len: 3 * 2 * version.field_width() as u64,
                blocks_len: 12345,
            };
            let bytes = header.encode(version).unwrap();
            assert_eq!(bytes.len(), RecordSectionHeader::encoded_len(version));
            assert_eq!(RecordSectionHeader::decode(&bytes, version).unwrap(), header);
        }
    }

    #[test]
    fn inconsistent_index_len_is_rejected() {
        let header = RecordSectionHeader {
            num_blocks: 2,
            num_entries: 2,
            index_len: 8,
            blocks_len: 0,
        };
        let bytes = header.encode(FormatVersion::V2_0).unwrap();
        assert!(RecordSectionHeader::decode(&bytes, FormatVersion::V2_0).is_err());
    }

    #[test]
    fn index_entries_decode() {
        let mut bytes = Vec::new();
        for value in [10u64, 20, 30, 40] {
            FormatVersion::V1_2.put_int(&mut bytes, value).unwrap();
        }
        let entries = BlockIndexEntry::decode_all(&bytes, FormatVersion::V1_2).unwrap();
        assert_eq!(
            entries,
            vec![
                BlockIndexEntry { compressed_len: 10, decompressed_len: 20 },
                BlockIndexEntry { compressed_len: 30, decompressed_len: 40 },
            ]
        );
        assert!(BlockIndexEntry::decode_all(&bytes[..5], FormatVersion::V1_2).is_err());
    }
}
