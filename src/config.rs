use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result};

/// What to do when part of the input cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    #[default]
    Abort,
    /// Log the problem and carry on without the offending input.
    Skip,
}

/// Layout of the `_mean` recognition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeanFormat {
    /// `word,score` per line.
    #[default]
    Scored,
    /// Only the first whitespace-delimited token of each line, no score.
    WordsOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    pub format: MeanFormat,
    /// `Skip` decodes an invalid lead byte as a one-byte U+FFFD.
    pub on_invalid_encoding: ErrorPolicy,
    /// `Skip` drops records whose score does not parse.
    pub on_bad_record: ErrorPolicy,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            format: MeanFormat::Scored,
            on_invalid_encoding: ErrorPolicy::Abort,
            on_bad_record: ErrorPolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    pub round_coordinates: bool,
    pub image_dir: String,
    /// Segment that replaces `image_dir` to reach the text files.
    pub text_dir: String,
    pub image_extension: String,
    pub text_extension: String,
    /// `Skip` logs a frame that fails to load and leaves it out of the run.
    pub on_bad_frame: ErrorPolicy,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            round_coordinates: true,
            image_dir: "images".to_string(),
            text_dir: "text".to_string(),
            image_extension: "png".to_string(),
            text_extension: "txt".to_string(),
            on_bad_frame: ErrorPolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    /// Largest edit distance at which a word still joins an existing sign.
    pub max_edit_distance: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            max_edit_distance: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reader: ReaderOptions,
    pub loader: LoaderOptions,
    pub cluster: ClusterOptions,
}

impl Config {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::io(path, source))?;
        Self::from_toml(&raw).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}
