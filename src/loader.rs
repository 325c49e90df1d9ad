use std::{
    ffi::OsStr,
    path::{Component, Path, PathBuf},
};

use tracing::instrument;

use crate::{
    polygon::POINTS_PER_DETECTION, Detection, Error, LoaderOptions, PolygonAssembler, Result,
    TextInfo, TextReader,
};

const NUMBERS_PER_LINE: usize = 2 * POINTS_PER_DETECTION;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionPaths {
    /// Corner coordinates, eight comma-separated numbers per detection.
    pub detections: PathBuf,
    /// Recognized `word,score` records, one per detection.
    pub texts: PathBuf,
}

pub trait PathMapper: Send + Sync {
    fn companion_paths(&self, image: &Path) -> Result<CompanionPaths>;
}

impl<F> PathMapper for F
where
    F: Fn(&Path) -> Result<CompanionPaths> + Send + Sync,
{
    fn companion_paths(&self, image: &Path) -> Result<CompanionPaths> {
        self(image)
    }
}

/// Maps `seq/images/0001.png` to `seq/text/0001_dete.txt` and
/// `seq/text/0001_mean.txt` by swapping a directory segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPathMapper {
    pub image_dir: String,
    pub text_dir: String,
    pub image_extension: String,
    pub text_extension: String,
}

impl SegmentPathMapper {
    pub fn from_options(options: &LoaderOptions) -> Self {
        Self {
            image_dir: options.image_dir.clone(),
            text_dir: options.text_dir.clone(),
            image_extension: options.image_extension.clone(),
            text_extension: options.text_extension.clone(),
        }
    }
}

impl Default for SegmentPathMapper {
    fn default() -> Self {
        Self::from_options(&LoaderOptions::default())
    }
}

impl PathMapper for SegmentPathMapper {
    fn companion_paths(&self, image: &Path) -> Result<CompanionPaths> {
        let unmapped = || Error::UnmappedPath {
            path: image.to_path_buf(),
        };
        if image.extension() != Some(OsStr::new(&self.image_extension)) {
            return Err(unmapped());
        }
        let stem = image.file_stem().ok_or_else(unmapped)?;

        let mut swapped = false;
        let mut base = PathBuf::new();
        for component in image.components() {
            match component {
                Component::Normal(segment)
                    if !swapped && segment == OsStr::new(&self.image_dir) =>
                {
                    base.push(&self.text_dir);
                    swapped = true;
                }
                other => base.push(other),
            }
        }
        if !swapped {
            return Err(unmapped());
        }

        let companion = |suffix: &str| {
            let mut name = stem.to_os_string();
            name.push(format!("_{suffix}.{}", self.text_extension));
            base.with_file_name(name)
        };
        Ok(CompanionPaths {
            detections: companion("dete"),
            texts: companion("mean"),
        })
    }
}

/// Detections and recognized words loaded for one image, paired by index.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameText {
    pub detections: Vec<Detection>,
    pub texts: Vec<TextInfo>,
}

pub struct DetectionLoader {
    mapper: Box<dyn PathMapper>,
    assembler: PolygonAssembler,
    reader: TextReader,
}

impl DetectionLoader {
    pub fn new(
        mapper: Box<dyn PathMapper>,
        assembler: PolygonAssembler,
        reader: TextReader,
    ) -> Self {
        Self {
            mapper,
            assembler,
            reader,
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, image: &Path) -> Result<FrameText> {
        let paths = self.mapper.companion_paths(image)?;
        let detections = self.read_detections(&paths.detections)?;
        let texts = self.reader.read(&paths.texts)?.into_text_infos();

        if detections.len() != texts.len() {
            return Err(Error::Consistency {
                frame: image.display().to_string(),
                detections: detections.len(),
                texts: texts.len(),
            });
        }
        log::debug!(
            "Loaded {} text detections for {}",
            detections.len(),
            image.display()
        );
        Ok(FrameText { detections, texts })
    }

    #[instrument(level = "trace", skip(self))]
    pub fn read_detections(&self, path: &Path) -> Result<Vec<Detection>> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::io(path, source))?;
        let malformed = |line: usize, reason: String| Error::MalformedDetection {
            path: path.to_path_buf(),
            line,
            reason,
        };

        let mut points = Vec::new();
        for (index, line) in raw.lines().enumerate() {
            let line_no = index + 1;
            if line.trim().is_empty() {
                continue;
            }
            let numbers = line
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| {
                    token
                        .parse::<f64>()
                        .map_err(|_| malformed(line_no, format!("{token:?} is not a number")))
                })
                .collect::<Result<Vec<_>>>()?;
            if numbers.len() != NUMBERS_PER_LINE {
                return Err(malformed(
                    line_no,
                    format!(
                        "expected {NUMBERS_PER_LINE} numbers, found {}",
                        numbers.len()
                    ),
                ));
            }
            points.extend(
                numbers
                    .chunks_exact(2)
                    .map(|xy| self.assembler.point(xy[0], xy[1])),
            );
        }
        self.assembler.assemble(&points, path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn segment_mapper_swaps_directory_and_strips_extension() {
        let paths = SegmentPathMapper::default()
            .companion_paths(Path::new("/data/seq/images/1305031102.175304.png"))
            .unwrap();
        assert_eq!(
            paths.detections,
            PathBuf::from("/data/seq/text/1305031102.175304_dete.txt")
        );
        assert_eq!(
            paths.texts,
            PathBuf::from("/data/seq/text/1305031102.175304_mean.txt")
        );
    }

    #[test]
    fn segment_mapper_only_swaps_first_match() {
        let paths = SegmentPathMapper::default()
            .companion_paths(Path::new("images/day/images/0001.png"))
            .unwrap();
        assert_eq!(paths.texts, PathBuf::from("text/day/images/0001_mean.txt"));
    }

    #[test]
    fn segment_mapper_requires_segment_and_extension() {
        let mapper = SegmentPathMapper::default();
        assert!(matches!(
            mapper.companion_paths(Path::new("seq/rgb/0001.png")),
            Err(Error::UnmappedPath { .. })
        ));
        assert!(matches!(
            mapper.companion_paths(Path::new("seq/images/0001.jpg")),
            Err(Error::UnmappedPath { .. })
        ));
    }

    #[test]
    fn closures_are_path_mappers() {
        let mapper = |image: &Path| -> Result<CompanionPaths> {
            Ok(CompanionPaths {
                detections: image.with_extension("boxes"),
                texts: image.with_extension("words"),
            })
        };
        let paths = mapper.companion_paths(Path::new("a/b.png")).unwrap();
        assert_eq!(paths.texts, PathBuf::from("a/b.words"));
    }

    #[test]
    fn reads_eight_numbers_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0001_dete.txt");
        fs::write(&path, "10.4,20.6,30,20,30,40,10,40\n\n1,2,3,4,5,6,7,8,\n").unwrap();

        let loader = DetectionLoader::new(
            Box::new(SegmentPathMapper::default()),
            PolygonAssembler::default(),
            TextReader::default(),
        );
        let detections = loader.read_detections(&path).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].points()[0].x, 10.0);
        assert_eq!(detections[0].points()[0].y, 21.0);
        assert_eq!(detections[1].points()[3].y, 8.0);
    }

    #[test]
    fn wrong_number_count_names_the_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0001_dete.txt");
        fs::write(&path, "1,2,3,4,5,6,7,8\n1,2,3,4,5,6\n").unwrap();

        let loader = DetectionLoader::new(
            Box::new(SegmentPathMapper::default()),
            PolygonAssembler::default(),
            TextReader::default(),
        );
        let err = loader.read_detections(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedDetection { line: 2, .. }));

        fs::write(&path, "1,2,3,4,x,6,7,8\n").unwrap();
        let err = loader.read_detections(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedDetection { line: 1, .. }));
    }

    #[test]
    fn missing_detection_file_is_io_error() {
        let loader = DetectionLoader::new(
            Box::new(SegmentPathMapper::default()),
            PolygonAssembler::default(),
            TextReader::default(),
        );
        let err = loader
            .load(Path::new("/nonexistent/images/0001.png"))
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
