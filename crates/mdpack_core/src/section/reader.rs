//! Record section reader, used to inspect and verify packed output.

use crate::block::decompress_block;
use crate::error::{CoreError, CoreResult};
use crate::format::FormatVersion;
use crate::section::header::{BlockIndexEntry, RecordSectionHeader};
use std::io::{Read, Seek, SeekFrom};

/// Random access to the blocks of a record section.
#[derive(Debug)]
pub struct RecordSectionReader<R> {
    inner: R,
    version: FormatVersion,
    header: RecordSectionHeader,
    index: Vec<BlockIndexEntry>,
    block_offsets: Vec<u64>,
}

impl<R: Read + Seek> RecordSectionReader<R> {
    /// Parses the header and index of the section starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] if the header or index is
    /// inconsistent, or an I/O error.
    pub fn open(mut inner: R, offset: u64, version: FormatVersion) -> CoreResult<Self> {
        let stream_len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(offset))?;

        let mut header_bytes = vec![0u8; RecordSectionHeader::encoded_len(version)];
        inner.read_exact(&mut header_bytes)?;
        let header = RecordSectionHeader::decode(&header_bytes, version)?;

        let index_start = offset + header_bytes.len() as u64;
        let blocks_start = index_start
            .checked_add(header.index_len)
            .filter(|&end| end <= stream_len)
            .ok_or_else(|| {
                CoreError::invalid_format(format!(
                    "index of {} bytes runs past the end of the stream",
                    header.index_len
                ))
            })?;

        let mut index_bytes = Vec::new();
        (&mut inner)
            .take(header.index_len)
            .read_to_end(&mut index_bytes)?;
        let index = BlockIndexEntry::decode_all(&index_bytes, version)?;

        let mut block_offsets = Vec::with_capacity(index.len());
        let mut cursor = blocks_start;
        for (i, entry) in index.iter().enumerate() {
            block_offsets.push(cursor);
            cursor = cursor
                .checked_add(entry.compressed_len)
                .filter(|&end| end <= stream_len)
                .ok_or_else(|| {
                    CoreError::invalid_format(format!(
                        "block {i} of {} bytes runs past the end of the stream",
                        entry.compressed_len
                    ))
                })?;
        }
        let total = cursor - blocks_start;
        if total != header.blocks_len {
            return Err(CoreError::invalid_format(format!(
                "index covers {total} block bytes, header declares {}",
                header.blocks_len
            )));
        }

        Ok(Self {
            inner,
            version,
            header,
            index,
            block_offsets,
        })
    }

    /// The section header.
    #[must_use]
    pub const fn header(&self) -> &RecordSectionHeader {
        &self.header
    }

    /// The block index.
    #[must_use]
    pub fn index(&self) -> &[BlockIndexEntry] {
        &self.index
    }

    /// Format version the section was opened with.
    #[must_use]
    pub const fn version(&self) -> FormatVersion {
        self.version
    }

    /// Reads and decompresses block `i`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] for an out-of-range block or a
    /// length that disagrees with the index, and checksum or I/O errors.
    pub fn read_block(&mut self, i: usize) -> CoreResult<Vec<u8>> {
        let (Some(entry), Some(&offset)) = (self.index.get(i), self.block_offsets.get(i)) else {
            return Err(CoreError::invalid_format(format!(
                "block {i} out of range ({} blocks)",
                self.index.len()
            )));
        };

        self.inner.seek(SeekFrom::Start(offset))?;
        let mut block = Vec::new();
        (&mut self.inner)
            .take(entry.compressed_len)
            .read_to_end(&mut block)?;
        if block.len() as u64 != entry.compressed_len {
            return Err(CoreError::invalid_format(format!(
                "block {i} truncated at {} of {} bytes",
                block.len(),
                entry.compressed_len
            )));
        }

        let data = decompress_block(&block)?;
        if data.len() as u64 != entry.decompressed_len {
            return Err(CoreError::invalid_format(format!(
                "block {i} expands to {} bytes, index says {}",
                data.len(),
                entry.decompressed_len
            )));
        }
        Ok(data)
    }

    /// Decompresses every block in order and returns the total payload bytes.
    ///
    /// # Errors
    ///
    /// Returns the first block that fails [`RecordSectionReader::read_block`].
    pub fn verify(&mut self) -> CoreResult<u64> {
        let mut total = 0u64;
        for i in 0..self.index.len() {
            total += self.read_block(i)?.len() as u64;
        }
        Ok(total)
    }
}

/// Splits concatenated payloads at the given record sizes.
///
/// # Errors
///
/// Returns [`CoreError::InvalidFormat`] if the sizes do not add up to
/// `data.len()`.
pub fn split_payloads(data: &[u8], sizes: &[u64]) -> CoreResult<Vec<Vec<u8>>> {
    let mut records = Vec::with_capacity(sizes.len());
    let mut rest = data;
    for &size in sizes {
        let size = size as usize;
        if size > rest.len() {
            return Err(CoreError::invalid_format("record sizes exceed block data"));
        }
        let (record, tail) = rest.split_at(size);
        records.push(record.to_vec());
        rest = tail;
    }
    if !rest.is_empty() {
        return Err(CoreError::invalid_format(format!(
            "{} trailing bytes after the last record",
            rest.len()
        )));
    }
    Ok(records)
}
