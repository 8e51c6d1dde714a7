//! Record section writer.
//!
//! Seekable sinks use reserve-then-patch: [`begin_section`] appends a
//! zeroed header and index and returns a [`SectionToken`], blocks are
//! streamed straight to the sink, and [`finish_section`] overwrites the
//! reserved bytes. Append-only sinks cannot be patched, so the block
//! stream is spilled to an anonymous temporary file and the section is
//! emitted in order once the header is known.
//!
//! If a write fails midway, a patched sink is left with a zeroed header.
//! Such output is corrupt and must be discarded.

use crate::block::RecordBlock;
use crate::config::PackConfig;
use crate::error::CoreResult;
use crate::format::FormatVersion;
use crate::offset_table::OffsetTable;
use crate::resolver::RecordResolver;
use crate::section::header::RecordSectionHeader;
use mdpack_storage::OutputSink;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use tracing::{debug, info};

const SPILL_CHUNK: usize = 64 * 1024;

/// Marks the reserved header and index of a section awaiting its patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a reserved section must be finished"]
pub struct SectionToken {
    offset: u64,
    num_blocks: usize,
    version: FormatVersion,
}

impl SectionToken {
    /// Sink offset of the reserved header.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

/// Appends a zeroed header plus `num_blocks` zeroed index slots.
///
/// # Errors
///
/// Returns an error if the sink write fails.
pub fn begin_section(
    sink: &mut dyn OutputSink,
    num_blocks: usize,
    version: FormatVersion,
) -> CoreResult<SectionToken> {
    let reserved = RecordSectionHeader::encoded_len(version)
        + num_blocks * RecordSectionHeader::index_entry_len(version);
    let offset = sink.append(&vec![0u8; reserved])?;
    Ok(SectionToken {
        offset,
        num_blocks,
        version,
    })
}

/// Overwrites the reserved bytes with the real header and index.
///
/// The sink keeps appending after the last block.
///
/// # Errors
///
/// Returns an error if the header does not fit the reservation or the
/// sink cannot be patched.
pub fn finish_section(
    sink: &mut dyn OutputSink,
    token: SectionToken,
    header: &RecordSectionHeader,
    index: &[u8],
) -> CoreResult<()> {
    debug_assert_eq!(header.num_blocks, token.num_blocks as u64);
    debug_assert_eq!(
        index.len(),
        token.num_blocks * RecordSectionHeader::index_entry_len(token.version)
    );

    let mut patch = header.encode(token.version)?;
    patch.extend_from_slice(index);
    sink.write_at(token.offset, &patch)?;
    Ok(())
}

/// Where and how large a written section is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSummary {
    /// The header as written.
    pub header: RecordSectionHeader,
    /// Sink offset of the section's first byte.
    pub offset: u64,
    /// Total section length: header, index and blocks.
    pub len: u64,
}

struct Streamed {
    index: Vec<u8>,
    blocks_len: u64,
}

/// Writes the record section for an offset table.
#[derive(Debug)]
pub struct RecordSectionWriter<'a> {
    table: &'a OffsetTable,
    blocks: Vec<RecordBlock>,
    version: FormatVersion,
}

impl<'a> RecordSectionWriter<'a> {
    /// Plans the blocks for `table` according to `config`.
    #[must_use]
    pub fn new(table: &'a OffsetTable, config: &PackConfig) -> Self {
        let blocks = RecordBlock::plan(
            table,
            config.block_size,
            config.compression,
            config.format_version,
        );
        Self {
            table,
            blocks,
            version: config.format_version,
        }
    }

    /// The planned blocks.
    #[must_use]
    pub fn blocks(&self) -> &[RecordBlock] {
        &self.blocks
    }

    /// Writes header, index and blocks to `sink`.
    ///
    /// `progress` receives the entry count of each block once it is written.
    ///
    /// # Errors
    ///
    /// Returns the first resolution, compression or I/O failure. Nothing
    /// is retried.
    pub fn write(
        &self,
        sink: &mut dyn OutputSink,
        resolver: &mut RecordResolver,
        progress: &mut dyn FnMut(usize),
    ) -> CoreResult<SectionSummary> {
        let summary = if sink.supports_patch() {
            self.write_patched(sink, resolver, progress)?
        } else {
            self.write_spilled(sink, resolver, progress)?
        };

        info!(
            blocks = summary.header.num_blocks,
            entries = summary.header.num_entries,
            bytes = summary.len,
            "record section written"
        );
        Ok(summary)
    }

    fn write_patched(
        &self,
        sink: &mut dyn OutputSink,
        resolver: &mut RecordResolver,
        progress: &mut dyn FnMut(usize),
    ) -> CoreResult<SectionSummary> {
        let token = begin_section(sink, self.blocks.len(), self.version)?;

        let streamed = self.stream_blocks(resolver, progress, &mut |bytes| {
            sink.append(bytes)?;
            Ok(())
        })?;

        let header = self.header(&streamed);
        finish_section(sink, token, &header, &streamed.index)?;

        Ok(SectionSummary {
            header,
            offset: token.offset(),
            len: sink.size()? - token.offset(),
        })
    }

    fn write_spilled(
        &self,
        sink: &mut dyn OutputSink,
        resolver: &mut RecordResolver,
        progress: &mut dyn FnMut(usize),
    ) -> CoreResult<SectionSummary> {
        debug!("sink cannot be patched, spilling record blocks");
        let mut spill = BufWriter::new(tempfile::tempfile()?);

        let streamed = self.stream_blocks(resolver, progress, &mut |bytes| {
            spill.write_all(bytes)?;
            Ok(())
        })?;

        let header = self.header(&streamed);
        let offset = sink.append(&header.encode(self.version)?)?;
        sink.append(&streamed.index)?;

        let mut spill = spill.into_inner().map_err(|e| e.into_error())?;
        spill.seek(SeekFrom::Start(0))?;
        let mut chunk = vec![0u8; SPILL_CHUNK];
        loop {
            let n = spill.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            sink.append(&chunk[..n])?;
        }

        Ok(SectionSummary {
            header,
            offset,
            len: sink.size()? - offset,
        })
    }

    fn stream_blocks(
        &self,
        resolver: &mut RecordResolver,
        progress: &mut dyn FnMut(usize),
        emit: &mut dyn FnMut(&[u8]) -> CoreResult<()>,
    ) -> CoreResult<Streamed> {
        let mut index =
            Vec::with_capacity(self.blocks.len() * RecordSectionHeader::index_entry_len(self.version));
        let mut blocks_len = 0u64;

        for block in &self.blocks {
            let prepared = block.prepare(self.table, resolver)?;
            index.extend_from_slice(&prepared.index_entry()?);
            emit(prepared.bytes())?;
            blocks_len += prepared.compressed_len();
            progress(prepared.entry_count());
        }

        Ok(Streamed { index, blocks_len })
    }

    fn header(&self, streamed: &Streamed) -> RecordSectionHeader {
        RecordSectionHeader {
            num_blocks: self.blocks.len() as u64,
            num_entries: self.table.len() as u64,
            index_len: streamed.index.len() as u64,
            blocks_len: streamed.blocks_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::KeyCollation;
    use crate::encoding::TextEncoding;
    use crate::entry::{DictionaryEntry, SourceRef};
    use mdpack_storage::{AppendOnlySink, InMemorySink};
    use tempfile::tempdir;

    #[test]
    fn begin_then_finish_patches_in_place() {
        let mut sink = InMemorySink::new();
        sink.append(b"preamble").unwrap();

        let token = begin_section(&mut sink, 1, FormatVersion::V1_2).unwrap();
        assert_eq!(token.offset(), 8);
        assert_eq!(sink.size().unwrap(), 8 + 16 + 8);

        sink.append(b"BLOCK").unwrap();
        let header = RecordSectionHeader {
            num_blocks: 1,
            num_entries: 2,
            index_len: 8,
            blocks_len: 5,
        };
        let mut index = Vec::new();
        FormatVersion::V1_2.put_int(&mut index, 5).unwrap();
        FormatVersion::V1_2.put_int(&mut index, 9).unwrap();
        finish_section(&mut sink, token, &header, &index).unwrap();

        let data = sink.data();
        assert_eq!(&data[..8], b"preamble");
        assert_eq!(
            RecordSectionHeader::decode(&data[8..], FormatVersion::V1_2).unwrap(),
            header
        );
        assert_eq!(&data[24..32], &index[..]);
        assert_eq!(&data[32..], b"BLOCK");
    }

    fn fixture(dir: &std::path::Path) -> OffsetTable {
        let path = dir.join("dict.txt");
        std::fs::write(&path, b"alpha one\nbeta two\n").unwrap();
        let entries = vec![
            DictionaryEntry::new("beta", SourceRef::TextRange(path.clone()), 15, 4),
            DictionaryEntry::new("alpha", SourceRef::TextRange(path), 6, 4),
        ];
        let collation = KeyCollation::from_tag("C").unwrap();
        OffsetTable::build(entries, &collation, TextEncoding::Utf8, TextEncoding::Utf8).unwrap()
    }

    #[test]
    fn patched_and_spilled_output_match() {
        let dir = tempdir().unwrap();
        let table = fixture(dir.path());
        let config = PackConfig::new().block_size(4);
        let writer = RecordSectionWriter::new(&table, &config);
        assert_eq!(writer.blocks().len(), 2);

        let mut patched = InMemorySink::new();
        let mut ticks = Vec::new();
        let summary = writer
            .write(&mut patched, &mut RecordResolver::new(), &mut |n| ticks.push(n))
            .unwrap();
        assert_eq!(ticks, vec![1, 1]);
        assert_eq!(summary.header.num_blocks, 2);
        assert_eq!(summary.header.num_entries, 2);
        assert_eq!(summary.header.index_len, 32);

        let mut spilled = AppendOnlySink::new(Vec::new());
        let spilled_summary = writer
            .write(&mut spilled, &mut RecordResolver::new(), &mut |_| {})
            .unwrap();

        assert_eq!(summary, spilled_summary);
        assert_eq!(patched.into_inner(), spilled.into_inner());
    }

    #[test]
    fn failed_resolution_leaves_header_zeroed() {
        let dir = tempdir().unwrap();
        let entries = vec![DictionaryEntry::new(
            "ghost",
            SourceRef::TextRange(dir.path().join("missing.txt")),
            0,
            4,
        )];
        let collation = KeyCollation::from_tag("C").unwrap();
        let table =
            OffsetTable::build(entries, &collation, TextEncoding::Utf8, TextEncoding::Utf8)
                .unwrap();

        let mut sink = InMemorySink::new();
        let writer = RecordSectionWriter::new(&table, &PackConfig::new());
        assert!(writer
            .write(&mut sink, &mut RecordResolver::new(), &mut |_| {})
            .is_err());
        assert!(sink.data().iter().all(|&b| b == 0));
    }
}
