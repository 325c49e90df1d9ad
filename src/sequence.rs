use std::path::{Path, PathBuf};

use crate::{Error, Result};

const HEADER_LINES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceEntry {
    pub timestamp: f64,
    /// Image path joined onto the sequence directory.
    pub image_path: PathBuf,
}

/// Reads a TUM-style association list: three header lines, then
/// `timestamp relative/image.png` per line.
pub fn load_sequence(list: &Path, sequence_dir: &Path) -> Result<Vec<SequenceEntry>> {
    let raw = std::fs::read_to_string(list).map_err(|source| Error::io(list, source))?;
    let mut entries = Vec::new();
    for (index, line) in raw.lines().enumerate().skip(HEADER_LINES) {
        let mut fields = line.split_whitespace();
        let (Some(timestamp), Some(image)) = (fields.next(), fields.next()) else {
            if line.trim().is_empty() {
                continue;
            }
            return Err(Error::Parse {
                path: list.to_path_buf(),
                line: index + 1,
                field: line.to_string(),
            });
        };
        let timestamp = timestamp.parse::<f64>().map_err(|_| Error::Parse {
            path: list.to_path_buf(),
            line: index + 1,
            field: timestamp.to_string(),
        })?;
        entries.push(SequenceEntry {
            timestamp,
            image_path: sequence_dir.join(image),
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_header_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("rgb.txt");
        std::fs::write(
            &list,
            "# color images\n# file: 'seq.bag'\n# timestamp filename\n\
             1305031102.175304 images/1305031102.175304.png\n\n\
             1305031102.211214 images/1305031102.211214.png\n",
        )
        .unwrap();

        let entries = load_sequence(&list, dir.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp, 1305031102.175304);
        assert_eq!(
            entries[1].image_path,
            dir.path().join("images/1305031102.211214.png")
        );
    }

    #[test]
    fn bad_timestamp_names_the_line() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("rgb.txt");
        std::fs::write(&list, "#\n#\n#\nnoon images/a.png\n").unwrap();
        let err = load_sequence(&list, dir.path()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 4, .. }));
    }
}
