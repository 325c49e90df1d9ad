use std::sync::Arc;

use float_ord::FloatOrd;
use geo::{Coord, LineString, Polygon};

use crate::{Error, Result};

pub type Point2D = Coord<f64>;

/// Quadrilateral around one detected text region, corners in the order the
/// detector emitted them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    points: [Point2D; 4],
}

impl Detection {
    pub fn new(points: [Point2D; 4]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point2D; 4] {
        &self.points
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(LineString::from(self.points.to_vec()), vec![])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextInfo {
    pub word: String,
    pub score: f64,
}

impl TextInfo {
    /// Score carried by words that came without recognition confidence.
    pub const UNSET_SCORE: f64 = f64::MAX;

    pub fn new(word: impl Into<String>, score: f64) -> Self {
        Self {
            word: word.into(),
            score,
        }
    }

    pub fn unscored(word: impl Into<String>) -> Self {
        Self::new(word, Self::UNSET_SCORE)
    }

    pub fn has_score(&self) -> bool {
        self.score != Self::UNSET_SCORE
    }
}

/// Detections and recognized words of one processed image. `detections[i]`
/// and `texts[i]` describe the same text region.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFrame {
    name: String,
    detections: Vec<Detection>,
    texts: Vec<TextInfo>,
}

impl TextFrame {
    pub fn new(
        name: impl Into<String>,
        detections: Vec<Detection>,
        texts: Vec<TextInfo>,
    ) -> Result<Self> {
        let name = name.into();
        if detections.len() != texts.len() {
            return Err(Error::Consistency {
                frame: name,
                detections: detections.len(),
                texts: texts.len(),
            });
        }
        Ok(Self {
            name,
            detections,
            texts,
        })
    }

    /// Timestamp with microsecond digits, e.g. `1305031102.175304`.
    pub fn name_for_timestamp(timestamp: f64) -> String {
        format!("{timestamp:.6}")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn texts(&self) -> &[TextInfo] {
        &self.texts
    }

    /// Score of the first word, `None` when it carries the unset sentinel.
    pub fn first_score(&self) -> Option<f64> {
        self.texts
            .first()
            .filter(|text| text.has_score())
            .map(|text| text.score)
    }
}

/// All sightings judged to show the same physical sign.
#[derive(Debug, Clone)]
pub struct ProminentSign {
    canonical: String,
    frames: Vec<Arc<TextFrame>>,
}

impl ProminentSign {
    pub(crate) fn new(canonical: impl Into<String>, frame: Arc<TextFrame>) -> Self {
        Self {
            canonical: canonical.into(),
            frames: vec![frame],
        }
    }

    pub(crate) fn push(&mut self, frame: Arc<TextFrame>) {
        self.frames.push(frame);
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn frames(&self) -> &[Arc<TextFrame>] {
        &self.frames
    }

    /// Frame with the highest first score, ignoring unscored frames.
    pub fn best_sighting(&self) -> Option<&Arc<TextFrame>> {
        self.frames
            .iter()
            .filter_map(|frame| Some((frame, frame.first_score()?)))
            .max_by_key(|(_, score)| FloatOrd(*score))
            .map(|(frame, _)| frame)
    }
}
