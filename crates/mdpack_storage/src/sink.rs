//! Output sink trait definition.

use crate::error::StorageResult;

/// A byte sink the dictionary writer emits its sections into.
///
/// Sinks are **opaque byte stores**. They append bytes, optionally
/// overwrite bytes they already hold, and flush. The writer owns all
/// interpretation of what the bytes mean.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `write_at` never changes the size of the sink
/// - After `append` returns, the next `append` writes at `size()`
/// - Sinks are `Send` so a packing run can be moved to a worker thread
///
/// # Implementors
///
/// - [`super::InMemorySink`] - For testing
/// - [`super::FileSink`] - For dictionary files
/// - [`super::AppendOnlySink`] - For streams that cannot seek
pub trait OutputSink: Send {
    /// Appends data to the end of the sink.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Overwrites previously appended bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The sink does not support patching
    /// - `offset + data.len()` extends past the current size
    /// - An I/O error occurs
    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()>;

    /// Returns whether [`OutputSink::write_at`] is available.
    fn supports_patch(&self) -> bool {
        true
    }

    /// Returns the current size of the sink in bytes.
    ///
    /// This is the offset where the next `append` will write.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Flushes buffered writes to the underlying target.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// This is a stronger guarantee than `flush`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;
}
