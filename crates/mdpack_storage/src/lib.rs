//! # mdpack Storage
//!
//! Output sinks for mdpack.
//!
//! A sink is an **opaque byte store** the dictionary writer appends to.
//! Sinks know nothing about record sections, key sections or compression;
//! `mdpack_core` owns all format interpretation.
//!
//! ## Design Principles
//!
//! - Sinks are simple byte stores (append, patch, flush)
//! - Patching (`write_at`) only overwrites bytes that were already appended
//! - A sink that cannot patch says so through [`OutputSink::supports_patch`]
//!   and the writer falls back to a sequential strategy
//!
//! ## Available Sinks
//!
//! - [`InMemorySink`] - For testing and in-process packing
//! - [`FileSink`] - For writing dictionary files to disk
//! - [`AppendOnlySink`] - Wraps any [`std::io::Write`] (pipes, stdout)
//!
//! ## Example
//!
//! ```rust
//! use mdpack_storage::{OutputSink, InMemorySink};
//!
//! let mut sink = InMemorySink::new();
//! let offset = sink.append(&[0u8; 4]).unwrap();
//! sink.write_at(offset, b"head").unwrap();
//! assert_eq!(sink.data(), b"head");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod append;
mod error;
mod file;
mod memory;
mod sink;

pub use append::AppendOnlySink;
pub use error::{StorageError, StorageResult};
pub use file::FileSink;
pub use memory::InMemorySink;
pub use sink::OutputSink;
