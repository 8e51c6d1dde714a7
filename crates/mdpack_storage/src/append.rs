//! Append-only sink over an arbitrary writer.

use crate::error::{StorageError, StorageResult};
use crate::sink::OutputSink;
use std::io::Write;

/// A sink over any [`Write`] target that cannot seek, such as stdout or a pipe.
///
/// Bytes are counted as they are written so offsets stay meaningful, but
/// [`OutputSink::write_at`] always fails with
/// [`StorageError::PatchUnsupported`]. Writers that see
/// `supports_patch() == false` must lay out their output sequentially.
#[derive(Debug)]
pub struct AppendOnlySink<W: Write + Send> {
    inner: W,
    written: u64,
}

impl<W: Write + Send> AppendOnlySink<W> {
    /// Wraps a writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            written: 0,
        }
    }

    /// Consumes the sink and returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> OutputSink for AppendOnlySink<W> {
    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.written;
        self.inner.write_all(data)?;
        self.written += data.len() as u64;
        Ok(offset)
    }

    fn write_at(&mut self, _offset: u64, _data: &[u8]) -> StorageResult<()> {
        Err(StorageError::PatchUnsupported)
    }

    fn supports_patch(&self) -> bool {
        false
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.written)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_only_counts_offsets() {
        let mut sink = AppendOnlySink::new(Vec::new());
        assert_eq!(sink.append(b"abc").unwrap(), 0);
        assert_eq!(sink.append(b"de").unwrap(), 3);
        assert_eq!(sink.size().unwrap(), 5);
        assert_eq!(sink.into_inner(), b"abcde");
    }

    #[test]
    fn append_only_rejects_patch() {
        let mut sink = AppendOnlySink::new(Vec::new());
        sink.append(b"abc").unwrap();

        assert!(!sink.supports_patch());
        let result = sink.write_at(0, b"x");
        assert!(matches!(result, Err(StorageError::PatchUnsupported)));
    }
}
