//! The record section: header, block index and compressed record blocks.
//!
//! ## Layout
//!
//! All integers are big-endian, 8 bytes wide for format 2.0 and 4 bytes
//! for format 1.2.
//!
//! ```text
//! | num_blocks | num_entries | index_len | blocks_len |
//! | compressed_len | decompressed_len |   x num_blocks
//! | block 0 | block 1 | ... |                 (sorted key order)
//! ```
//!
//! ## Invariants
//!
//! - `index_len == num_blocks * 2 * field_width`
//! - `blocks_len` is the sum of all `compressed_len`
//! - The sum of all `decompressed_len` is the offset table's total record length
//! - Block `k` holds the `k`-th contiguous run of the sorted offset table

mod header;
mod reader;
mod writer;

pub use header::{BlockIndexEntry, RecordSectionHeader};
pub use reader::{split_payloads, RecordSectionReader};
pub use writer::{begin_section, finish_section, RecordSectionWriter, SectionSummary, SectionToken};
