//! # mdpack Core
//!
//! Record packing for MDict-style dictionaries.
//!
//! This crate provides:
//! - Source adapters that turn delimited text, a staging database, or a
//!   file tree into [`DictionaryEntry`] lists
//! - The [`OffsetTable`], sorted by locale collation
//! - Lazy record resolution with a per-pack [`ResourceCache`]
//! - Record block assembly and compression
//! - The record section writer and reader
//! - The text/staging [`bridge`]
//!
//! ## Example
//!
//! ```no_run
//! use mdpack_core::{pack, scan_text, PackConfig};
//! use std::path::Path;
//!
//! let config = PackConfig::new().title("Example");
//! let entries = scan_text(Path::new("dict.txt"), config.encoding, &mut |_| {})?;
//! let report = pack(Path::new("dict.mdx"), entries, &config, &mut |_| {})?;
//! println!("{} entries", report.entries);
//! # Ok::<(), mdpack_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod block;
pub mod bridge;
mod collation;
mod config;
mod encoding;
mod entry;
mod error;
mod format;
mod offset_table;
mod resolver;
pub mod section;
mod sources;
mod writer;

pub use block::{
    compress_block, decompress_block, split_blocks, PreparedBlock, RecordBlock, BLOCK_PREFIX_SIZE,
};
pub use bridge::{staging_to_txt, txt_to_staging, StagingReport};
pub use collation::KeyCollation;
pub use config::{PackConfig, StagingConfig};
pub use encoding::TextEncoding;
pub use entry::{DictionaryEntry, SourceRef};
pub use error::{CoreError, CoreResult};
pub use format::{CompressionType, FormatVersion};
pub use offset_table::{OffsetTable, OffsetTableEntry, RecordLocator};
pub use resolver::{RecordResolver, ResourceCache, SourceHandle};
pub use section::{RecordSectionHeader, RecordSectionReader, RecordSectionWriter, SectionSummary};
pub use sources::{
    resource_key, scan_resources, scan_staging, scan_text, TextRecord, TextRecordReader,
    END_MARKER, RESOURCE_SEPARATOR, STAGING_TABLE,
};
pub use writer::{pack, DictionaryWriter, KeySectionEncoder, PackReport, RecordsOnly};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
