use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::instrument;

mod cluster;
mod config;
mod error;
mod loader;
mod polygon;
mod report;
mod result;
mod sequence;
mod text_reader;
mod tracker;
pub mod util;

pub use cluster::*;
pub use config::*;
pub use error::*;
pub use loader::*;
pub use polygon::PolygonAssembler;
pub use report::*;
pub use result::*;
pub use sequence::*;
pub use text_reader::*;
pub use tracker::*;

pub struct SignMapBuilder {
    reader: ReaderOptions,
    loader: LoaderOptions,
    cluster: ClusterOptions,
    mapper: Option<Box<dyn PathMapper>>,
}

impl SignMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            reader: config.reader,
            loader: config.loader,
            cluster: config.cluster,
            mapper: None,
        }
    }

    pub fn reader_options(mut self, options: ReaderOptions) -> Self {
        self.reader = options;
        self
    }

    pub fn round_coordinates(mut self, round: bool) -> Self {
        self.loader.round_coordinates = round;
        self
    }

    /// What happens to a frame whose text files fail to load.
    pub fn frame_policy(mut self, policy: ErrorPolicy) -> Self {
        self.loader.on_bad_frame = policy;
        self
    }

    pub fn max_edit_distance(mut self, distance: usize) -> Self {
        self.cluster.max_edit_distance = distance;
        self
    }

    /// Replaces the default `images` -> `text` directory swap.
    pub fn path_mapper(mut self, mapper: impl PathMapper + 'static) -> Self {
        self.mapper = Some(Box::new(mapper));
        self
    }

    #[instrument(skip(self))]
    pub fn build(self) -> SignMap {
        let mapper = self.mapper.unwrap_or_else(|| {
            Box::new(SegmentPathMapper::from_options(&self.loader)) as Box<dyn PathMapper>
        });
        let loader = DetectionLoader::new(
            mapper,
            PolygonAssembler::new(self.loader.round_coordinates),
            TextReader::new(self.reader),
        );
        SignMap {
            loader,
            frame_policy: self.loader.on_bad_frame,
            frames: Mutex::new(Vec::new()),
            clusterer: Mutex::new(SignClusterer::new(self.cluster)),
        }
    }
}

impl Default for SignMapBuilder {
    fn default() -> Self {
        Self::from_config(Config::default())
    }
}

/// Loads text detections frame by frame and folds them into prominent signs.
///
/// The frame log and the sign registry sit behind separate locks, always taken
/// registry first. A frame is clustered and logged under both, so readers see
/// either all of a frame or none of it.
pub struct SignMap {
    loader: DetectionLoader,
    frame_policy: ErrorPolicy,
    frames: Mutex<Vec<Arc<TextFrame>>>,
    clusterer: Mutex<SignClusterer>,
}

impl SignMap {
    /// Loads the text files for `image_path` and ingests them as one frame.
    ///
    /// Returns `Ok(None)` when the frame could not be loaded and the frame
    /// policy is [`ErrorPolicy::Skip`]. Earlier frames are never affected by a
    /// failed load.
    #[instrument(skip(self))]
    pub fn ingest_image(
        &self,
        image_path: &Path,
        timestamp: f64,
    ) -> Result<Option<Arc<TextFrame>>> {
        let text = match self.loader.load(image_path) {
            Ok(text) => text,
            Err(err) => match self.frame_policy {
                ErrorPolicy::Abort => return Err(err),
                ErrorPolicy::Skip => {
                    log::warn!("Skipping frame {}: {err}", image_path.display());
                    return Ok(None);
                }
            },
        };

        let frame = Arc::new(TextFrame::new(
            TextFrame::name_for_timestamp(timestamp),
            text.detections,
            text.texts,
        )?);
        self.ingest_frame(Arc::clone(&frame));
        Ok(Some(frame))
    }

    /// Clusters an already loaded frame and appends it to the log.
    pub fn ingest_frame(&self, frame: Arc<TextFrame>) -> Vec<Assignment> {
        let assignments = {
            let mut clusterer = lock(&self.clusterer);
            let assignments = clusterer.ingest(&frame);
            lock(&self.frames).push(Arc::clone(&frame));
            assignments
        };
        log::debug!(
            "Frame {} added {} new signs",
            frame.name(),
            assignments.iter().filter(|it| it.created).count()
        );
        assignments
    }

    /// Runs the tracker against the frame log and registry. Ingestion from
    /// other threads waits until the tracker returns.
    pub fn track(&self, tracker: &mut dyn FrameTracker, input: FrameInput<'_>) {
        let clusterer = lock(&self.clusterer);
        let frames = lock(&self.frames);
        tracker.track(input, &frames, clusterer.signs());
    }

    pub fn frame_count(&self) -> usize {
        lock(&self.frames).len()
    }

    pub fn sign_count(&self) -> usize {
        lock(&self.clusterer).signs().len()
    }

    /// Ends ingestion and hands over the accumulated state.
    pub fn finish(self) -> SignRegistry {
        let frames = self
            .frames
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let signs = self
            .clusterer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_signs();
        SignRegistry { frames, signs }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
