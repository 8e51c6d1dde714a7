//! Entries from a single file or a directory tree (resource dictionaries).
//!
//! Resource keys are `\` followed by the path relative to the tree root,
//! with `\` separators on every platform. A single file is keyed by its
//! file name.

use crate::entry::{DictionaryEntry, SourceRef};
use crate::error::{CoreError, CoreResult};
use std::path::{Component, Path};
use tracing::info;
use walkdir::WalkDir;

/// Resource key separator.
pub const RESOURCE_SEPARATOR: char = '\\';

/// Builds the resource key for a path relative to the tree root.
///
/// # Errors
///
/// Returns [`CoreError::Encoding`] if a component is not valid Unicode.
pub fn resource_key(relative: &Path) -> CoreResult<String> {
    let mut key = String::new();
    for component in relative.components() {
        let Component::Normal(name) = component else {
            continue;
        };
        let name = name.to_str().ok_or_else(|| {
            CoreError::encoding(format!("file name {name:?} is not valid Unicode"))
        })?;
        key.push(RESOURCE_SEPARATOR);
        key.push_str(name);
    }
    Ok(key)
}

/// Scans a file, or every file below a directory, into blob entries.
///
/// Directory entries are visited in file-name order.
///
/// # Errors
///
/// Returns I/O errors from the walk and [`CoreError::Encoding`] for file
/// names that are not valid Unicode.
pub fn scan_resources(
    source: &Path,
    progress: &mut dyn FnMut(usize),
) -> CoreResult<Vec<DictionaryEntry>> {
    let root = std::path::absolute(source)?;
    let metadata = std::fs::metadata(&root)?;

    let mut entries = Vec::new();
    if metadata.is_file() {
        let name = root
            .file_name()
            .ok_or_else(|| CoreError::invalid_config(format!("{} has no file name", root.display())))?;
        let key = resource_key(Path::new(name))?;
        entries.push(DictionaryEntry::new(key, SourceRef::Blob(root.clone()), 0, metadata.len()));
        progress(1);
    } else {
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&root)
                .map_err(|e| CoreError::invalid_config(e.to_string()))?;
            let key = resource_key(relative)?;
            let size = entry.metadata().map_err(std::io::Error::from)?.len();
            entries.push(DictionaryEntry::new(
                key,
                SourceRef::Blob(entry.path().to_path_buf()),
                0,
                size,
            ));
            progress(1);
        }
    }

    info!(path = %root.display(), entries = entries.len(), "scanned resources");
    Ok(entries)
}
