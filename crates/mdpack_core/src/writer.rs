//! Dictionary writer: offset table, preamble, record section.

use crate::collation::KeyCollation;
use crate::config::PackConfig;
use crate::entry::DictionaryEntry;
use crate::error::CoreResult;
use crate::offset_table::OffsetTable;
use crate::resolver::RecordResolver;
use crate::section::{RecordSectionWriter, SectionSummary};
use mdpack_storage::{FileSink, OutputSink};
use std::path::Path;
use tracing::{info, warn};

/// Writes whatever precedes the record section (header and key index).
///
/// Implementations see the final sorted table, so keys and record offsets
/// are known before the first record byte is produced. The pack
/// configuration carries the title, description and encodings a dictionary
/// header records.
pub trait KeySectionEncoder {
    /// Appends the preamble for `table` to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the preamble cannot be encoded or written.
    fn write_preamble(
        &mut self,
        table: &OffsetTable,
        config: &PackConfig,
        sink: &mut dyn OutputSink,
    ) -> CoreResult<()>;
}

/// Writes no preamble; the output is the bare record section.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordsOnly;

impl KeySectionEncoder for RecordsOnly {
    fn write_preamble(
        &mut self,
        _: &OffsetTable,
        _: &PackConfig,
        _: &mut dyn OutputSink,
    ) -> CoreResult<()> {
        Ok(())
    }
}

/// Outcome of a pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackReport {
    /// Entries packed.
    pub entries: u64,
    /// Total uncompressed record bytes.
    pub record_bytes: u64,
    /// Bytes written before the record section.
    pub preamble_len: u64,
    /// The record section as written.
    pub section: SectionSummary,
}

/// Packs a list of dictionary entries.
#[derive(Debug)]
pub struct DictionaryWriter {
    table: OffsetTable,
    config: PackConfig,
}

impl DictionaryWriter {
    /// Validates `config` and builds the offset table.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidConfig`] for a bad configuration
    /// or collation tag, and [`crate::CoreError::Encoding`] if a key cannot
    /// be encoded.
    pub fn new(entries: Vec<DictionaryEntry>, config: &PackConfig) -> CoreResult<Self> {
        config.validate()?;
        let collation = KeyCollation::from_tag(&config.collation)?;
        let table = OffsetTable::build(
            entries,
            &collation,
            config.key_encoding(),
            config.encoding,
        )?;
        Ok(Self {
            table,
            config: config.clone(),
        })
    }

    /// The sorted offset table.
    #[must_use]
    pub const fn table(&self) -> &OffsetTable {
        &self.table
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Writes the preamble and record section to `sink`.
    ///
    /// Every source opened while resolving records is closed before this
    /// returns, on success or failure.
    ///
    /// # Errors
    ///
    /// Returns the first preamble, resolution or sink error. Output written
    /// before a failure is corrupt.
    pub fn write(
        &self,
        sink: &mut dyn OutputSink,
        preamble: &mut dyn KeySectionEncoder,
        progress: &mut dyn FnMut(usize),
    ) -> CoreResult<PackReport> {
        let start = sink.size()?;
        preamble.write_preamble(&self.table, &self.config, sink)?;
        let preamble_len = sink.size()? - start;

        let mut resolver = RecordResolver::new();
        let written = RecordSectionWriter::new(&self.table, &self.config).write(
            sink,
            &mut resolver,
            progress,
        );
        let closed = resolver.close();
        let section = match (written, closed) {
            (Ok(section), Ok(())) => section,
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "failed to close sources after write error");
                }
                return Err(e);
            }
            (Ok(_), Err(e)) => return Err(e),
        };
        sink.flush()?;

        let report = PackReport {
            entries: self.table.len() as u64,
            record_bytes: self.table.total_record_len(),
            preamble_len,
            section,
        };
        info!(
            entries = report.entries,
            record_bytes = report.record_bytes,
            section_bytes = report.section.len,
            "dictionary packed"
        );
        Ok(report)
    }
}

/// Packs `entries` into a new file at `target` with no preamble.
///
/// Parent directories are created. The file is synced before returning.
///
/// # Errors
///
/// See [`DictionaryWriter::new`] and [`DictionaryWriter::write`].
pub fn pack(
    target: &Path,
    entries: Vec<DictionaryEntry>,
    config: &PackConfig,
    progress: &mut dyn FnMut(usize),
) -> CoreResult<PackReport> {
    let writer = DictionaryWriter::new(entries, config)?;
    let mut sink = FileSink::create_with_dirs(target)?;
    let report = writer.write(&mut sink, &mut RecordsOnly, progress)?;
    sink.sync()?;
    Ok(report)
}
