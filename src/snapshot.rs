//! Snapshot artifact access.
//!
//! Snapshots are versioned files produced by the dataset build. They may be
//! stored plain or gzip-compressed; the format is chosen by extension
//! (`pincodes.csv.gz` is CSV, `pincodes.compressed.json` is JSON).

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// A snapshot could not be used
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read snapshot {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid JSON in snapshot {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid CSV in snapshot {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("unsupported snapshot format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Csv,
}

impl SnapshotFormat {
    /// Detect the format from the file name, ignoring a trailing `.gz`
    pub fn detect(path: &Path) -> Option<Self> {
        let inner = if is_gzip(path) {
            Path::new(path.file_stem()?)
        } else {
            path
        };
        match inner.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(SnapshotFormat::Json),
            "csv" => Some(SnapshotFormat::Csv),
            _ => None,
        }
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "gz")
}

/// Open a snapshot for reading, decompressing `.gz` files on the fly
pub fn open(path: &Path) -> Result<Box<dyn Read>, SnapshotError> {
    let file = File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => SnapshotError::Missing(path.to_path_buf()),
        _ => SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let reader = BufReader::new(file);
    if is_gzip(path) {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Open and deserialize a JSON snapshot
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SnapshotError> {
    let reader = open(path)?;
    serde_json::from_reader(reader).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_detect_format() {
        assert_eq!(
            SnapshotFormat::detect(Path::new("data/pincodes.csv")),
            Some(SnapshotFormat::Csv)
        );
        assert_eq!(
            SnapshotFormat::detect(Path::new("data/pincodes.compressed.json")),
            Some(SnapshotFormat::Json)
        );
        assert_eq!(
            SnapshotFormat::detect(Path::new("pincodes.CSV.gz")),
            Some(SnapshotFormat::Csv)
        );
        assert_eq!(SnapshotFormat::detect(Path::new("pincodes.sqlite")), None);
        assert_eq!(SnapshotFormat::detect(Path::new("pincodes")), None);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(open(&path), Err(SnapshotError::Missing(_))));
    }

    #[test]
    fn test_read_gzip_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.json.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"[1, 2, 3]").unwrap();
        encoder.finish().unwrap();

        let values: Vec<u32> = read_json(&path).unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_corrupt_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let result: Result<Vec<u32>, _> = read_json(&path);
        assert!(matches!(result, Err(SnapshotError::Json { .. })));
    }
}
