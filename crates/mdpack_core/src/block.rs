//! Record blocks: grouping, resolving and compressing payloads.
//!
//! ## Block Format
//!
//! ```text
//! | compression_type (4, LE) | adler32 of uncompressed bytes (4, BE) | data (N) |
//! ```
//!
//! ## Boundaries
//!
//! Entries are taken in table order. A new block starts before an entry
//! whose declared size would push the running total past the block size.
//! An entry is never split, so an entry at or above the limit sits alone
//! in its block.

use crate::error::{CoreError, CoreResult};
use crate::format::{CompressionType, FormatVersion};
use crate::offset_table::{OffsetTable, OffsetTableEntry};
use crate::resolver::RecordResolver;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use std::ops::Range;
use tracing::debug;

/// Bytes in front of every compressed block.
pub const BLOCK_PREFIX_SIZE: usize = 8;

/// Compresses one block's worth of concatenated payloads.
///
/// # Errors
///
/// Returns [`CoreError::InvalidConfig`] for LZO, or an I/O error from the
/// encoder.
pub fn compress_block(data: &[u8], compression: CompressionType) -> CoreResult<Vec<u8>> {
    let mut out = Vec::with_capacity(BLOCK_PREFIX_SIZE + data.len() / 2);
    out.extend_from_slice(&compression.tag().to_le_bytes());
    out.extend_from_slice(&adler::adler32_slice(data).to_be_bytes());

    match compression {
        CompressionType::None => out.extend_from_slice(data),
        CompressionType::Zlib => {
            let mut encoder = ZlibEncoder::new(out, Compression::default());
            encoder.write_all(data)?;
            out = encoder.finish()?;
        }
        CompressionType::Lzo => {
            return Err(CoreError::invalid_config("LZO compression is not supported"));
        }
    }

    Ok(out)
}

/// Reverses [`compress_block`], verifying the Adler-32 checksum.
///
/// # Errors
///
/// Returns [`CoreError::InvalidFormat`] for a truncated block or unknown
/// tag, and [`CoreError::ChecksumMismatch`] if the payload is corrupt.
pub fn decompress_block(block: &[u8]) -> CoreResult<Vec<u8>> {
    if block.len() < BLOCK_PREFIX_SIZE {
        return Err(CoreError::invalid_format("record block shorter than its prefix"));
    }
    let tag = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
    let expected = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
    let body = &block[BLOCK_PREFIX_SIZE..];

    let data = match CompressionType::from_tag(tag)? {
        CompressionType::None => body.to_vec(),
        CompressionType::Zlib => {
            let mut data = Vec::new();
            ZlibDecoder::new(body).read_to_end(&mut data)?;
            data
        }
        CompressionType::Lzo => {
            return Err(CoreError::invalid_format("LZO blocks are not supported"));
        }
    };

    let actual = adler::adler32_slice(&data);
    if actual != expected {
        return Err(CoreError::ChecksumMismatch { expected, actual });
    }
    Ok(data)
}

/// Splits the table into contiguous index ranges by declared record size.
#[must_use]
pub fn split_blocks(entries: &[OffsetTableEntry], block_size: u64) -> Vec<Range<usize>> {
    let mut blocks = Vec::new();
    let mut start = 0usize;
    let mut current = 0u64;

    for (i, entry) in entries.iter().enumerate() {
        let size = entry.record_size();
        if i > start && current.saturating_add(size) > block_size {
            blocks.push(start..i);
            start = i;
            current = 0;
        }
        current = current.saturating_add(size);
    }
    if start < entries.len() {
        blocks.push(start..entries.len());
    }

    blocks
}

/// A contiguous slice of the offset table destined for one compressed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBlock {
    range: Range<usize>,
    compression: CompressionType,
    version: FormatVersion,
}

impl RecordBlock {
    /// Partitions `table` into blocks of at most `block_size` declared bytes.
    #[must_use]
    pub fn plan(
        table: &OffsetTable,
        block_size: u64,
        compression: CompressionType,
        version: FormatVersion,
    ) -> Vec<Self> {
        split_blocks(table.entries(), block_size)
            .into_iter()
            .map(|range| Self {
                range,
                compression,
                version,
            })
            .collect()
    }

    /// Position of this block's entries in the table.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Number of entries in the block.
    #[must_use]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Whether the block holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// The block's entries.
    #[must_use]
    pub fn entries<'a>(&self, table: &'a OffsetTable) -> &'a [OffsetTableEntry] {
        &table.entries()[self.range.clone()]
    }

    /// Resolves every payload, concatenates and compresses.
    ///
    /// The uncompressed buffer is dropped before this returns; the result
    /// holds only the compressed bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SourceResolution`] if a payload cannot be
    /// produced or its length differs from the declared size.
    pub fn prepare(
        &self,
        table: &OffsetTable,
        resolver: &mut RecordResolver,
    ) -> CoreResult<PreparedBlock> {
        let entries = self.entries(table);

        let mut buffer = Vec::new();
        for entry in entries {
            let payload = resolver.resolve(entry)?;
            if payload.len() as u64 != entry.record_size() {
                return Err(CoreError::source_resolution(
                    &entry.key_text,
                    format!(
                        "resolved {} bytes, declared {}",
                        payload.len(),
                        entry.record_size()
                    ),
                ));
            }
            buffer.extend_from_slice(&payload);
        }

        let data = compress_block(&buffer, self.compression)?;
        debug!(
            entries = entries.len(),
            decompressed = buffer.len(),
            compressed = data.len(),
            "prepared record block"
        );

        Ok(PreparedBlock {
            data,
            decompressed_len: buffer.len() as u64,
            entry_count: entries.len(),
            version: self.version,
        })
    }
}

/// A compressed block waiting to be written. Dropping it releases the bytes.
#[derive(Debug)]
pub struct PreparedBlock {
    data: Vec<u8>,
    decompressed_len: u64,
    entry_count: usize,
    version: FormatVersion,
}

impl PreparedBlock {
    /// The compressed block bytes, prefix included.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Length of the compressed block.
    #[must_use]
    pub fn compressed_len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Length of the concatenated payloads.
    #[must_use]
    pub const fn decompressed_len(&self) -> u64 {
        self.decompressed_len
    }

    /// Number of entries packed into this block.
    #[must_use]
    pub const fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// The `(compressed_length, decompressed_length)` index entry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] if a length overflows a
    /// version 1.2 field.
    pub fn index_entry(&self) -> CoreResult<Vec<u8>> {
        let mut entry = Vec::with_capacity(2 * self.version.field_width());
        self.version.put_int(&mut entry, self.compressed_len())?;
        self.version.put_int(&mut entry, self.decompressed_len)?;
        Ok(entry)
    }
}
