//! Inspect command implementation.

use mdpack_core::{FormatVersion, RecordSectionReader};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Record section inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// File path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Section offset within the file.
    pub offset: u64,
    /// Format version used to read the section.
    pub format_version: String,
    /// Number of record blocks.
    pub num_blocks: u64,
    /// Number of records.
    pub num_entries: u64,
    /// Record index length in bytes.
    pub index_len: u64,
    /// Total compressed block bytes.
    pub blocks_len: u64,
    /// Total uncompressed record bytes, from the index.
    pub records_len: u64,
    /// Uncompressed bytes actually decoded (with `--verify`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_len: Option<u64>,
    /// Per-block lengths.
    pub blocks: Vec<BlockStats>,
}

/// Lengths of a single block.
#[derive(Debug, Serialize)]
pub struct BlockStats {
    /// Block number.
    pub block: usize,
    /// Bytes on disk, prefix included.
    pub compressed_len: u64,
    /// Payload bytes.
    pub decompressed_len: u64,
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    offset: u64,
    version: FormatVersion,
    verify: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path, offset, version, verify)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn inspect(
    path: &Path,
    offset: u64,
    version: FormatVersion,
    verify: bool,
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No file found at {}", path.display()).into());
    }
    let file_size = std::fs::metadata(path)?.len();
    let mut reader = RecordSectionReader::open(BufReader::new(File::open(path)?), offset, version)?;

    let header = *reader.header();
    let blocks: Vec<BlockStats> = reader
        .index()
        .iter()
        .enumerate()
        .map(|(block, entry)| BlockStats {
            block,
            compressed_len: entry.compressed_len,
            decompressed_len: entry.decompressed_len,
        })
        .collect();
    let records_len = blocks.iter().map(|b| b.decompressed_len).sum();

    let verified_len = if verify {
        Some(reader.verify()?)
    } else {
        None
    };

    Ok(InspectResult {
        path: path.display().to_string(),
        file_size,
        offset,
        format_version: version.to_string(),
        num_blocks: header.num_blocks,
        num_entries: header.num_entries,
        index_len: header.index_len,
        blocks_len: header.blocks_len,
        records_len,
        verified_len,
        blocks,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("Record Section: {}", result.path);
    println!("================{}", "=".repeat(result.path.len()));
    println!();
    println!("File size:       {} bytes", result.file_size);
    println!("Offset:          {}", result.offset);
    println!("Format version:  {}", result.format_version);
    println!();
    println!("Blocks:          {}", result.num_blocks);
    println!("Entries:         {}", result.num_entries);
    println!("Index length:    {} bytes", result.index_len);
    println!("Blocks length:   {} bytes", result.blocks_len);
    println!("Records length:  {} bytes", result.records_len);

    if let Some(verified) = result.verified_len {
        println!();
        println!("Verified:        {verified} bytes decompressed, all checksums OK");
    }

    if !result.blocks.is_empty() {
        println!();
        println!("{:>8}  {:>14}  {:>14}", "block", "compressed", "decompressed");
        for block in &result.blocks {
            println!(
                "{:>8}  {:>14}  {:>14}",
                block.block, block.compressed_len, block.decompressed_len
            );
        }
    }
}
