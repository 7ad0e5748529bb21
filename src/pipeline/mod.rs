//! Batch pipeline: input discovery, per-image processing, coordination.

pub mod cache;
mod coordinator;
mod processor;

pub use coordinator::{BatchOutcome, process_batch, process_batch_with_cache};
pub use processor::{process_decoded, process_image};

use crate::constants::IMAGE_EXTENSIONS;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Collect image files from paths (files and directories).
///
/// Directories are walked recursively. Explicit file paths with unsupported
/// extensions are silently ignored; non-existent paths are warned about and
/// skipped.
pub fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_image_file(path) {
                files.push(path.clone());
            }
        } else if path.is_dir() {
            collect_image_files_recursive(path, &mut files)?;
        } else {
            warn!("Skipping non-existent path: {}", path.display());
        }
    }

    Ok(files)
}

/// Recursively collect image files from a directory.
fn collect_image_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_image_files_recursive(&path, files)?;
        } else if is_image_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

/// Check if a file has a supported image extension.
fn is_image_file(path: &Path) -> bool {
    use std::ffi::OsStr;

    // Compare extensions as OsStr to handle non-UTF-8 filenames
    path.extension().is_some_and(|ext| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|supported| ext.eq_ignore_ascii_case(OsStr::new(supported)))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("trap01.jpg")));
        assert!(is_image_file(Path::new("trap01.JPEG")));
        assert!(is_image_file(Path::new("trap01.webp")));
        assert!(!is_image_file(Path::new("trap01.txt")));
        assert!(!is_image_file(Path::new("trap01")));
    }

    #[test]
    fn test_is_image_file_with_unicode() {
        assert!(is_image_file(Path::new("hirvi_kuva.jpg")));
        assert!(is_image_file(Path::new("räkättirastas.png")));
        assert!(is_image_file(Path::new("テスト.jpeg"))); // Japanese
    }

    #[test]
    fn test_collect_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("station_a");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::write(nested.join("b.PNG"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let mut files = collect_input_files(&[dir.path().to_path_buf()]).unwrap();
        files.sort();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.jpg"));
        assert!(files[1].ends_with("station_a/b.PNG"));
    }

    #[test]
    fn test_collect_skips_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.jpg");
        std::fs::write(&real, b"x").unwrap();

        let files =
            collect_input_files(&[real.clone(), dir.path().join("missing.jpg")]).unwrap();
        assert_eq!(files, vec![real]);
    }
}
