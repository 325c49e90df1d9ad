use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid multi-byte sequence in {} at byte {offset}", path.display())]
    Encoding { path: PathBuf, offset: usize },

    #[error("{}:{line}: cannot parse {field:?} as a score", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        field: String,
    },

    #[error("{}:{line}: malformed detection, {reason}", path.display())]
    MalformedDetection {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("{}:{line}: no separator in {content:?}", path.display())]
    MissingSeparator {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("{frame}: {detections} detections but {texts} recognition results")]
    Consistency {
        frame: String,
        detections: usize,
        texts: usize,
    },

    #[error("cannot derive text paths from {}", path.display())]
    UnmappedPath { path: PathBuf },

    #[error("invalid config {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
