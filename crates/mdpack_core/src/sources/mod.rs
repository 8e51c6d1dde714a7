//! Source adapters: producers of [`DictionaryEntry`] lists.
//!
//! Every adapter guarantees that an entry's `size` equals the length of
//! the payload the resolver will later produce for it.
//!
//! | adapter             | source kind   | payload                         |
//! |---------------------|---------------|---------------------------------|
//! | [`scan_text`]       | `TextRange`   | content byte range + `0x00`     |
//! | [`scan_staging`]    | `Staging`     | encoded row content + NUL       |
//! | [`scan_resources`]  | `Blob`        | whole file                      |
//!
//! [`DictionaryEntry`]: crate::DictionaryEntry

mod files;
mod staging;
mod text;

pub use files::{resource_key, scan_resources, RESOURCE_SEPARATOR};
pub use staging::{scan_staging, STAGING_TABLE};
pub use text::{scan_text, TextRecord, TextRecordReader, END_MARKER};
