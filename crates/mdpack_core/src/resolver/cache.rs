//! Open handles to payload sources, one per source path.

use crate::error::{CoreError, CoreResult};
use rusqlite::{Connection, OpenFlags};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An open source.
#[derive(Debug)]
pub enum SourceHandle {
    /// A delimited text file read by byte range.
    File(File),
    /// A read-only staging database connection.
    Staging(Connection),
}

/// Lazily opened handles keyed by source path.
///
/// However many entries point at a path, it is opened once and the same
/// handle is reused until [`ResourceCache::close`] (or drop). The cache is
/// owned by one resolver for the duration of one packing run.
#[derive(Debug, Default)]
pub struct ResourceCache {
    handles: HashMap<PathBuf, SourceHandle>,
}

impl ResourceCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the open file for `path`, opening it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or `path` is already
    /// open as a staging database.
    pub fn file(&mut self, path: &Path) -> CoreResult<&mut File> {
        let handle = match self.handles.entry(path.to_path_buf()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                debug!(path = %path.display(), "opening text source");
                slot.insert(SourceHandle::File(File::open(path)?))
            }
        };
        match handle {
            SourceHandle::File(file) => Ok(file),
            SourceHandle::Staging(_) => Err(CoreError::invalid_config(format!(
                "{} is open as a staging database",
                path.display()
            ))),
        }
    }

    /// Returns the staging connection for `path`, opening it read-only on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or `path` is
    /// already open as a text file.
    pub fn staging(&mut self, path: &Path) -> CoreResult<&Connection> {
        let handle = match self.handles.entry(path.to_path_buf()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                debug!(path = %path.display(), "opening staging database");
                let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
                slot.insert(SourceHandle::Staging(conn))
            }
        };
        match handle {
            SourceHandle::Staging(conn) => Ok(conn),
            SourceHandle::File(_) => Err(CoreError::invalid_config(format!(
                "{} is open as a text file",
                path.display()
            ))),
        }
    }

    /// Number of open handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no handle is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Closes every handle, reporting the first connection that fails to close.
    ///
    /// # Errors
    ///
    /// Returns the SQLite error of a connection that could not be closed.
    pub fn close(self) -> CoreResult<()> {
        let mut first_error = None;
        for (path, handle) in self.handles {
            if let SourceHandle::Staging(conn) = handle {
                if let Err((_, e)) = conn.close() {
                    debug!(path = %path.display(), error = %e, "staging connection failed to close");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
