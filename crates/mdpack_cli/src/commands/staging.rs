//! Text/staging conversion commands.

use super::progress_bar;
use mdpack_core::bridge::{staging_path_for, text_path_for};
use mdpack_core::{staging_to_txt, txt_to_staging, StagingConfig, TextEncoding};
use std::path::{Path, PathBuf};

/// Runs the txt2sqlite command.
pub fn import(
    source: &Path,
    target: Option<PathBuf>,
    encoding: TextEncoding,
    batch_size: usize,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = target.unwrap_or_else(|| staging_path_for(source));
    let config = StagingConfig::default().batch_size(batch_size);

    let bar = progress_bar("Importing", 0, quiet);
    let report = txt_to_staging(source, &target, encoding, &config, &mut |n| {
        bar.inc(n as u64);
    })?;
    bar.finish();

    println!(
        "Imported {} records into {} ({} batches)",
        report.records,
        target.display(),
        report.batches
    );
    Ok(())
}

/// Runs the sqlite2txt command.
pub fn export(
    source: &Path,
    target: Option<PathBuf>,
    encoding: TextEncoding,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = target.unwrap_or_else(|| text_path_for(source));

    let bar = progress_bar("Exporting", 0, quiet);
    let written = staging_to_txt(source, &target, encoding, &mut |n| bar.inc(n as u64))?;
    bar.finish();

    println!("Exported {written} records to {}", target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn import_then_export_with_default_paths() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("dict.txt");
        std::fs::write(&source, "cat\nfeline\n</>\n").unwrap();

        import(&source, None, TextEncoding::Utf8, 10, true).unwrap();
        let db = dir.path().join("dict.txt.db");
        assert!(db.exists());

        export(&db, None, TextEncoding::Utf8, true).unwrap();
        let text = std::fs::read_to_string(dir.path().join("dict.txt.db.txt")).unwrap();
        assert_eq!(text, "cat\r\nfeline\r\n</>\r\n");
    }
}
