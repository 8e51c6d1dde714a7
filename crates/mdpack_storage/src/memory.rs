//! In-memory sink for testing.

use crate::error::{StorageError, StorageResult};
use crate::sink::OutputSink;

/// An in-memory sink.
///
/// Suitable for unit tests, integration tests and packing small
/// dictionaries that are handed off as a byte buffer.
///
/// # Example
///
/// ```rust
/// use mdpack_storage::{OutputSink, InMemorySink};
///
/// let mut sink = InMemorySink::new();
/// let offset = sink.append(b"test data").unwrap();
/// assert_eq!(offset, 0);
/// assert_eq!(sink.size().unwrap(), 9);
/// ```
#[derive(Debug, Default)]
pub struct InMemorySink {
    data: Vec<u8>,
}

impl InMemorySink {
    /// Creates a new empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all data in the sink.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Consumes the sink and returns its bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl OutputSink for InMemorySink {
    fn append(&mut self, new_data: &[u8]) -> StorageResult<u64> {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(new_data);
        Ok(offset)
    }

    fn write_at(&mut self, offset: u64, patch: &[u8]) -> StorageResult<()> {
        let size = self.data.len() as u64;
        let end = offset.saturating_add(patch.len() as u64);
        if end > size {
            return Err(StorageError::PatchPastEnd {
                offset,
                len: patch.len(),
                size,
            });
        }

        let start = offset as usize;
        self.data[start..start + patch.len()].copy_from_slice(patch);
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.len() as u64)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let sink = InMemorySink::new();
        assert_eq!(sink.size().unwrap(), 0);
        assert!(sink.data().is_empty());
    }

    #[test]
    fn memory_append_returns_correct_offset() {
        let mut sink = InMemorySink::new();

        assert_eq!(sink.append(b"hello").unwrap(), 0);
        assert_eq!(sink.append(b" world").unwrap(), 5);
        assert_eq!(sink.size().unwrap(), 11);
    }

    #[test]
    fn memory_write_at_overwrites_in_place() {
        let mut sink = InMemorySink::new();
        sink.append(b"hello world").unwrap();

        sink.write_at(6, b"WORLD").unwrap();
        assert_eq!(sink.data(), b"hello WORLD");
        assert_eq!(sink.size().unwrap(), 11);
    }

    #[test]
    fn memory_write_at_extending_past_end_fails() {
        let mut sink = InMemorySink::new();
        sink.append(b"hello").unwrap();

        let result = sink.write_at(3, b"long patch");
        assert!(matches!(result, Err(StorageError::PatchPastEnd { .. })));
        assert_eq!(sink.data(), b"hello");
    }

    #[test]
    fn memory_empty_append() {
        let mut sink = InMemorySink::new();
        assert_eq!(sink.append(b"").unwrap(), 0);
        assert_eq!(sink.size().unwrap(), 0);
    }

    #[test]
    fn memory_into_inner() {
        let mut sink = InMemorySink::new();
        sink.append(b"abc").unwrap();
        assert!(sink.flush().is_ok());
        assert!(sink.sync().is_ok());
        assert_eq!(sink.into_inner(), b"abc");
    }
}
