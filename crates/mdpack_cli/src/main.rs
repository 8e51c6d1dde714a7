//! mdpack CLI
//!
//! Command-line tools for building MDict-style dictionaries.
//!
//! # Commands
//!
//! - `pack` - Pack a text file, staging database or resource tree
//! - `txt2sqlite` - Import a text dictionary into a staging database
//! - `sqlite2txt` - Export a staging database as a text dictionary
//! - `inspect` - Display the record section of a packed file

mod commands;

use clap::{Parser, Subcommand};
use commands::pack::{PackOptions, SourceKind};
use mdpack_core::{CompressionType, FormatVersion, TextEncoding};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// MDict-style dictionary packer.
#[derive(Parser)]
#[command(name = "mdpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Hide progress bars
    #[arg(global = true, short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a dictionary source into a record section
    Pack {
        /// Text file, staging database, resource file or directory
        source: PathBuf,

        /// Output file
        target: PathBuf,

        /// Source kind (inferred from the source if omitted)
        #[arg(short, long, value_enum)]
        kind: Option<SourceKind>,

        /// JSON file with pack settings; flags override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Format version (1.2, 2.0)
        #[arg(long)]
        format_version: Option<FormatVersion>,

        /// Block compression (none, zlib)
        #[arg(long)]
        compression: Option<CompressionType>,

        /// Maximum uncompressed bytes per block
        #[arg(long)]
        block_size: Option<u64>,

        /// Text encoding (UTF-8, UTF-16, GBK, GB18030, BIG5)
        #[arg(short, long)]
        encoding: Option<TextEncoding>,

        /// Collation locale, "C" for code-point order
        #[arg(long)]
        collation: Option<String>,

        /// Dictionary title
        #[arg(long)]
        title: Option<String>,

        /// Dictionary description
        #[arg(long)]
        description: Option<String>,
    },

    /// Import a text dictionary into a staging database
    Txt2sqlite {
        /// Text dictionary
        source: PathBuf,

        /// Staging database (default: <source>.db)
        target: Option<PathBuf>,

        /// Text encoding
        #[arg(short, long, default_value = "UTF-8")]
        encoding: TextEncoding,

        /// Records per committed transaction
        #[arg(short, long, default_value = "10240")]
        batch_size: usize,
    },

    /// Export a staging database as a text dictionary
    Sqlite2txt {
        /// Staging database
        source: PathBuf,

        /// Text dictionary (default: <source>.txt)
        target: Option<PathBuf>,

        /// Text encoding
        #[arg(short, long, default_value = "UTF-8")]
        encoding: TextEncoding,
    },

    /// Display the record section of a packed file
    Inspect {
        /// Packed file
        path: PathBuf,

        /// Byte offset of the record section
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Format version the file was written with
        #[arg(long, default_value = "2.0")]
        format_version: FormatVersion,

        /// Decompress and check every block
        #[arg(long)]
        verify: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Pack {
            source,
            target,
            kind,
            config,
            format_version,
            compression,
            block_size,
            encoding,
            collation,
            title,
            description,
        } => {
            let options = PackOptions {
                kind,
                config,
                format_version,
                compression,
                block_size,
                encoding,
                collation,
                title,
                description,
            };
            commands::pack::run(&source, &target, options, cli.quiet)?;
        }
        Commands::Txt2sqlite {
            source,
            target,
            encoding,
            batch_size,
        } => {
            commands::staging::import(&source, target, encoding, batch_size, cli.quiet)?;
        }
        Commands::Sqlite2txt {
            source,
            target,
            encoding,
        } => {
            commands::staging::export(&source, target, encoding, cli.quiet)?;
        }
        Commands::Inspect {
            path,
            offset,
            format_version,
            verify,
            format,
        } => {
            commands::inspect::run(&path, offset, format_version, verify, &format)?;
        }
        Commands::Version => {
            println!("mdpack CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("mdpack Core v{}", mdpack_core::VERSION);
        }
    }

    Ok(())
}
