//! File-based sink for dictionary output.

use crate::error::{StorageError, StorageResult};
use crate::sink::OutputSink;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A file-based sink.
///
/// Appends go through a [`BufWriter`]; a patch flushes the buffer, seeks
/// to the patch offset, writes, and seeks back to the end so the next
/// append continues where the data ends.
///
/// # Durability
///
/// - `flush()` pushes buffered bytes to the OS
/// - `sync()` additionally calls `File::sync_all()`
///
/// # Example
///
/// ```no_run
/// use mdpack_storage::{OutputSink, FileSink};
/// use std::path::Path;
///
/// let mut sink = FileSink::create(Path::new("out.mdx")).unwrap();
/// sink.append(b"record bytes").unwrap();
/// sink.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: BufWriter<File>,
    size: u64,
}

impl FileSink {
    /// Creates a new file sink at the given path, truncating any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::new(file),
            size: 0,
        })
    }

    /// Creates a file sink, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or file cannot be created.
    pub fn create_with_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::create(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for FileSink {
    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.size;
        if data.is_empty() {
            return Ok(offset);
        }

        self.file.write_all(data)?;
        self.size += data.len() as u64;

        Ok(offset)
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()> {
        let size = self.size;
        let end = offset.saturating_add(data.len() as u64);
        if end > size {
            return Err(StorageError::PatchPastEnd {
                offset,
                len: data.len(),
                size,
            });
        }

        self.file.flush()?;
        let inner = self.file.get_mut();
        inner.seek(SeekFrom::Start(offset))?;
        inner.write_all(data)?;
        inner.seek(SeekFrom::End(0))?;

        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.size)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file.flush()?;
        self.file.get_ref().sync_all()?;
        Ok(())
    }
}
