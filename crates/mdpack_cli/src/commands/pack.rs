//! Pack command implementation.

use super::progress_bar;
use clap::ValueEnum;
use mdpack_core::{
    pack, scan_resources, scan_staging, scan_text, CompressionType, DictionaryEntry,
    FormatVersion, PackConfig, TextEncoding,
};
use std::path::{Path, PathBuf};

/// What a pack source is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Delimited text dictionary.
    Txt,
    /// SQLite staging database.
    Db,
    /// Resource file or directory tree.
    Resource,
}

impl SourceKind {
    /// Guesses the kind from the path: directories are resources, `.db`
    /// and `.sqlite` files are staging databases, `.txt` files are text.
    pub fn infer(path: &Path) -> Self {
        if path.is_dir() {
            return Self::Resource;
        }
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("txt") => Self::Txt,
            Some("db" | "sqlite" | "sqlite3") => Self::Db,
            _ => Self::Resource,
        }
    }
}

/// Pack flags; each one set overrides the config file.
#[derive(Debug, Default)]
pub struct PackOptions {
    pub kind: Option<SourceKind>,
    pub config: Option<PathBuf>,
    pub format_version: Option<FormatVersion>,
    pub compression: Option<CompressionType>,
    pub block_size: Option<u64>,
    pub encoding: Option<TextEncoding>,
    pub collation: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl PackOptions {
    /// Loads the config file, if any, and applies the flags on top.
    pub fn resolve(self, kind: SourceKind) -> Result<PackConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => PackConfig::default(),
        };

        if let Some(version) = self.format_version {
            config = config.format_version(version);
        }
        if let Some(compression) = self.compression {
            config = config.compression(compression);
        }
        if let Some(size) = self.block_size {
            config = config.block_size(size);
        }
        if let Some(encoding) = self.encoding {
            config = config.encoding(encoding);
        }
        if let Some(tag) = self.collation {
            config = config.collation(tag);
        }
        if let Some(title) = self.title {
            config = config.title(title);
        }
        if let Some(description) = self.description {
            config = config.description(description);
        }
        if kind == SourceKind::Resource {
            config = config.resource_mode(true);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Runs the pack command.
pub fn run(
    source: &Path,
    target: &Path,
    options: PackOptions,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind = options.kind.unwrap_or_else(|| SourceKind::infer(source));
    let config = options.resolve(kind)?;

    let scan_bar = progress_bar("Scanning", 0, quiet);
    let mut tick = |n: usize| scan_bar.inc(n as u64);
    let entries: Vec<DictionaryEntry> = match kind {
        SourceKind::Txt => scan_text(source, config.encoding, &mut tick)?,
        SourceKind::Db => scan_staging(source, config.encoding, &mut tick)?,
        SourceKind::Resource => scan_resources(source, &mut tick)?,
    };
    scan_bar.finish();

    let pack_bar = progress_bar("Packing", entries.len() as u64, quiet);
    let report = pack(target, entries, &config, &mut |n| pack_bar.inc(n as u64))?;
    pack_bar.finish();

    println!("Packed {} entries into {}", report.entries, target.display());
    println!("  Format version:  {}", config.format_version);
    println!("  Record bytes:    {}", report.record_bytes);
    println!("  Blocks:          {}", report.section.header.num_blocks);
    println!("  Section bytes:   {}", report.section.len);

    Ok(())
}
