//! Model label file loading.

use crate::error::{Error, Result};
use std::path::Path;

/// Load a labels file: one label per line, blank lines ignored.
pub fn load_labels(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::LabelsRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let labels: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect();

    if labels.is_empty() {
        return Err(Error::LabelsEmpty {
            path: path.to_path_buf(),
        });
    }

    Ok(labels)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_labels_skips_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "deer\n\n  red fox  \nwild boar\n").unwrap();

        let labels = load_labels(file.path()).unwrap();
        assert_eq!(labels, vec!["deer", "red fox", "wild boar"]);
    }

    #[test]
    fn test_load_empty_labels_fails() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "\n\n  \n").unwrap();

        let result = load_labels(file.path());
        assert!(matches!(result, Err(Error::LabelsEmpty { .. })));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = load_labels(Path::new("/nonexistent/labels.txt"));
        assert!(matches!(result, Err(Error::LabelsRead { .. })));
    }
}
